//! Coefficients (the data a form depends on) and arguments (the test and trial functions a form
//! is linear in).
use crate::expr::Expr;
use crate::space::{Family, FunctionSpace, ValueShape};
use eyre::eyre;
use nalgebra::DVector;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static NEXT_COEFFICIENT_ID: AtomicUsize = AtomicUsize::new(0);

/// A process-wide unique identifier of a coefficient.
///
/// Symbolic differentiation with respect to a coefficient is keyed by its identifier, so that
/// a clone of a coefficient is the same coefficient while a freshly constructed one with equal
/// values is not.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoefficientId(usize);

impl CoefficientId {
    fn next() -> Self {
        Self(NEXT_COEFFICIENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A finite element function, given by its degrees of freedom in a function space.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    id: CoefficientId,
    space: Arc<FunctionSpace>,
    values: DVector<f64>,
}

impl Function {
    /// The zero function in the given space.
    pub fn new(space: &Arc<FunctionSpace>) -> Self {
        Self {
            id: CoefficientId::next(),
            space: Arc::clone(space),
            values: DVector::zeros(space.dim()),
        }
    }

    pub fn from_values(space: &Arc<FunctionSpace>, values: DVector<f64>) -> eyre::Result<Self> {
        if values.len() != space.dim() {
            return Err(eyre!(
                "function space has dimension {} but {} values were given",
                space.dim(),
                values.len()
            ));
        }
        Ok(Self {
            id: CoefficientId::next(),
            space: Arc::clone(space),
            values,
        })
    }

    /// Interpolates the given function at the vertices of a Lagrange space.
    pub fn interpolate(space: &Arc<FunctionSpace>, f: impl Fn(&DVector<f64>) -> f64) -> eyre::Result<Self> {
        match space.family() {
            Family::Lagrange => {
                let mesh = space.mesh();
                let values = (0..mesh.num_vertices()).map(|i| f(&mesh.vertex(i)));
                Self::from_values(space, DVector::from_iterator(space.dim(), values))
            }
            Family::Real(_) => Err(eyre!("interpolation is only supported for Lagrange spaces")),
        }
    }

    pub fn id(&self) -> CoefficientId {
        self.id
    }

    pub fn space(&self) -> &Arc<FunctionSpace> {
        &self.space
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }
}

/// A value that is constant over the whole domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    id: CoefficientId,
    shape: ValueShape,
    values: DVector<f64>,
}

impl Constant {
    pub fn scalar(value: f64) -> Self {
        Self {
            id: CoefficientId::next(),
            shape: ValueShape::Scalar,
            values: DVector::from_element(1, value),
        }
    }

    pub fn vector(values: DVector<f64>) -> Self {
        Self {
            id: CoefficientId::next(),
            shape: ValueShape::Vector(values.len()),
            values,
        }
    }

    pub fn from_values(shape: ValueShape, values: DVector<f64>) -> eyre::Result<Self> {
        if values.len() != shape.size() {
            return Err(eyre!(
                "constant of shape {:?} needs {} values but {} were given",
                shape,
                shape.size(),
                values.len()
            ));
        }
        Ok(Self {
            id: CoefficientId::next(),
            shape,
            values,
        })
    }

    pub fn id(&self) -> CoefficientId {
        self.id
    }

    pub fn shape(&self) -> ValueShape {
        self.shape
    }

    /// The components of the constant. Scalars have exactly one component.
    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    /// The value of a scalar constant.
    pub fn value(&self) -> Option<f64> {
        match self.shape {
            ValueShape::Scalar => Some(self.values[0]),
            ValueShape::Vector(_) => None,
        }
    }
}

type ExpressionFn = dyn Fn(&DVector<f64>, &DVector<f64>) -> f64 + Send + Sync;

/// A scalar analytic function of the spatial coordinate and a set of numeric parameters.
///
/// Expressions can be evaluated in forms, but forms can not be differentiated with respect to
/// them.
#[derive(Clone)]
pub struct Expression {
    id: CoefficientId,
    parameters: DVector<f64>,
    function: Arc<ExpressionFn>,
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("id", &self.id)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl Expression {
    /// Creates an expression `x -> f(x, parameters)`.
    pub fn new<F>(parameters: DVector<f64>, function: F) -> Self
    where
        F: Fn(&DVector<f64>, &DVector<f64>) -> f64 + Send + Sync + 'static,
    {
        Self {
            id: CoefficientId::next(),
            parameters,
            function: Arc::new(function),
        }
    }

    /// A new expression with the same function but different parameters.
    pub fn with_parameters(&self, parameters: DVector<f64>) -> eyre::Result<Self> {
        if parameters.len() != self.parameters.len() {
            return Err(eyre!(
                "expression has {} parameters but {} were given",
                self.parameters.len(),
                parameters.len()
            ));
        }
        Ok(Self {
            id: CoefficientId::next(),
            parameters,
            function: Arc::clone(&self.function),
        })
    }

    pub fn id(&self) -> CoefficientId {
        self.id
    }

    pub fn parameters(&self) -> &DVector<f64> {
        &self.parameters
    }

    pub fn evaluate(&self, x: &DVector<f64>) -> f64 {
        (self.function)(x, &self.parameters)
    }
}

/// Any of the coefficient kinds a form can depend on.
#[derive(Debug, Clone)]
pub enum Coefficient {
    Function(Function),
    Constant(Constant),
    Expression(Expression),
}

impl Coefficient {
    pub fn id(&self) -> CoefficientId {
        match self {
            Self::Function(function) => function.id(),
            Self::Constant(constant) => constant.id(),
            Self::Expression(expression) => expression.id(),
        }
    }

    /// A human-readable name of the coefficient kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Function(_) => "Function",
            Self::Constant(_) => "Constant",
            Self::Expression(_) => "Expression",
        }
    }

    /// The shape of the values of the coefficient at a point.
    pub fn value_shape(&self) -> ValueShape {
        match self {
            Self::Function(function) => function.space().value_shape(),
            Self::Constant(constant) => constant.shape(),
            Self::Expression(_) => ValueShape::Scalar,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Self::Constant(constant) => Some(constant),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Self::Expression(expression) => Some(expression),
            _ => None,
        }
    }
}

impl From<Function> for Coefficient {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<Constant> for Coefficient {
    fn from(constant: Constant) -> Self {
        Self::Constant(constant)
    }
}

impl From<Expression> for Coefficient {
    fn from(expression: Expression) -> Self {
        Self::Expression(expression)
    }
}

/// A basis function placeholder in a function space.
///
/// Argument number 0 is the test function and number 1 the trial function. A form with `r`
/// distinct arguments assembles to a tensor of rank `r`.
#[derive(Debug, Clone)]
pub struct Argument {
    number: usize,
    space: Arc<FunctionSpace>,
}

impl PartialEq for Argument {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number && Arc::ptr_eq(&self.space, &other.space)
    }
}

impl Argument {
    pub fn new(number: usize, space: &Arc<FunctionSpace>) -> Self {
        Self {
            number,
            space: Arc::clone(space),
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn space(&self) -> &Arc<FunctionSpace> {
        &self.space
    }
}

/// The test function (argument number 0) of the given space.
pub fn test_function(space: &Arc<FunctionSpace>) -> Expr {
    Expr::Argument(Argument::new(0, space))
}

/// The trial function (argument number 1) of the given space.
pub fn trial_function(space: &Arc<FunctionSpace>) -> Expr {
    Expr::Argument(Argument::new(1, space))
}
