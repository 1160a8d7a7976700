//! Assembly of forms into scalars, vectors and dense matrices.
use crate::coefficient::{Argument, Coefficient};
use crate::derivative::expand_derivatives;
use crate::element::QuadraturePoint;
use crate::expr::{Expr, MathFunction};
use crate::form::{Form, Integral};
use crate::mesh::Mesh;
use crate::space::{Family, ValueShape};
use eyre::eyre;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

/// Upper bound for quadrature strengths estimated from integrands.
///
/// Integrands containing non-polynomial functions quickly produce very large estimates.
/// Set the quadrature degree on the measure explicitly to exceed this bound.
pub const MAX_ESTIMATED_QUADRATURE_DEGREE: usize = 8;

/// The result of assembling a form of rank 0, 1 or 2.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
    Scalar(f64),
    Vector(DVector<f64>),
    Matrix(DMatrix<f64>),
}

impl Assembled {
    pub fn rank(&self) -> usize {
        match self {
            Self::Scalar(_) => 0,
            Self::Vector(_) => 1,
            Self::Matrix(_) => 2,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Vector(_) => "vector",
            Self::Matrix(_) => "matrix",
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&DVector<f64>> {
        match self {
            Self::Vector(vector) => Some(vector),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&DMatrix<f64>> {
        match self {
            Self::Matrix(matrix) => Some(matrix),
            _ => None,
        }
    }
}

/// Assembles a form of rank at most 2.
///
/// Derivatives recorded in the form are expanded before assembly. The rows of an assembled
/// vector or matrix correspond to the degrees of freedom of the test function space, and the
/// columns of a matrix to those of the trial function space. An empty form assembles to zero of
/// the appropriate size.
pub fn assemble(form: &Form) -> eyre::Result<Assembled> {
    let arguments = form.arguments()?;
    if arguments.len() > 2 {
        return Err(eyre!("cannot assemble form of rank {}", arguments.len()));
    }
    let expanded = expand_derivatives(form);
    debug!(
        "Assembling form of rank {} with {} integrals ({} before expansion)",
        arguments.len(),
        expanded.integrals().len(),
        form.integrals().len()
    );

    let mut output = match arguments.as_slice() {
        [] => Assembled::Scalar(0.0),
        [test] => Assembled::Vector(DVector::zeros(test.space().dim())),
        [test, trial] => Assembled::Matrix(DMatrix::zeros(test.space().dim(), trial.space().dim())),
        _ => unreachable!("rank is checked above"),
    };

    for integral in expanded.integrals() {
        assemble_integral_into(&mut output, integral, &arguments)?;
    }
    Ok(output)
}

fn same_mesh(a: &Arc<Mesh>, b: &Arc<Mesh>) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

fn check_integral_compatibility(integral: &Integral, arguments: &[Argument]) -> eyre::Result<()> {
    let domain = integral.domain();
    let integrand = integral.integrand();

    let integral_arguments = integrand.arguments();
    if integral_arguments.len() != arguments.len() {
        return Err(eyre!(
            "integral has {} arguments, but the form has {}",
            integral_arguments.len(),
            arguments.len()
        ));
    }
    for argument in arguments {
        if !same_mesh(argument.space().mesh(), domain) {
            return Err(eyre!(
                "argument {} is defined on a different mesh than the integration domain",
                argument.number()
            ));
        }
    }

    let mut result = Ok(());
    integrand.visit(&mut |node| {
        if let Expr::Coefficient(Coefficient::Function(function)) = node {
            let space = function.space();
            if space.family() == Family::Lagrange && !same_mesh(space.mesh(), domain) && result.is_ok() {
                result = Err(eyre!(
                    "function {:?} is defined on a different mesh than the integration domain",
                    function.id()
                ));
            }
        }
    });
    result
}

fn assemble_integral_into(output: &mut Assembled, integral: &Integral, arguments: &[Argument]) -> eyre::Result<()> {
    check_integral_compatibility(integral, arguments)?;
    let mesh = integral.domain();
    let integrand = integral.integrand();
    let strength = match integral.measure().quadrature_degree() {
        Some(degree) => degree,
        None => {
            let estimated = estimate_degree(integrand);
            if estimated > MAX_ESTIMATED_QUADRATURE_DEGREE {
                warn!(
                    "Estimated quadrature degree {} exceeds maximum {}, using {} instead",
                    estimated, MAX_ESTIMATED_QUADRATURE_DEGREE, MAX_ESTIMATED_QUADRATURE_DEGREE
                );
            }
            estimated.min(MAX_ESTIMATED_QUADRATURE_DEGREE)
        }
    };

    let mut test_dofs = Vec::new();
    let mut trial_dofs = Vec::new();
    for cell_index in 0..mesh.num_cells() {
        let element = mesh
            .element(cell_index)
            .ok_or_else(|| eyre!("cell {} is out of bounds", cell_index))?;
        let quadrature_points = element.quadrature_points(strength)?;
        if let Some(test) = arguments.get(0) {
            test.space().populate_cell_dofs(&mut test_dofs, cell_index);
        }
        if let Some(trial) = arguments.get(1) {
            trial.space().populate_cell_dofs(&mut trial_dofs, cell_index);
        }

        for point in &quadrature_points {
            let mut context = PointContext {
                point,
                cell_vertices: mesh.cell_vertices(cell_index),
                local_indices: [0, 0],
            };
            match output {
                Assembled::Scalar(value) => {
                    *value += point.weight * context.evaluate_scalar(integrand)?;
                }
                Assembled::Vector(vector) => {
                    for (a, &dof_a) in test_dofs.iter().enumerate() {
                        context.local_indices[0] = a;
                        vector[dof_a] += point.weight * context.evaluate_scalar(integrand)?;
                    }
                }
                Assembled::Matrix(matrix) => {
                    for (a, &dof_a) in test_dofs.iter().enumerate() {
                        for (b, &dof_b) in trial_dofs.iter().enumerate() {
                            context.local_indices = [a, b];
                            matrix[(dof_a, dof_b)] += point.weight * context.evaluate_scalar(integrand)?;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Estimates the polynomial degree of an integrand on an affine cell.
pub fn estimate_degree(expr: &Expr) -> usize {
    match expr {
        Expr::Zero | Expr::Literal(_) => 0,
        Expr::SpatialCoordinate => 1,
        Expr::Coefficient(Coefficient::Function(function)) => match function.space().family() {
            Family::Lagrange => 1,
            Family::Real(_) => 0,
        },
        Expr::Coefficient(Coefficient::Constant(_)) => 0,
        Expr::Coefficient(Coefficient::Expression(_)) => 2,
        Expr::Argument(argument) => match argument.space().family() {
            Family::Lagrange => 1,
            Family::Real(_) => 0,
        },
        Expr::Grad(a) => estimate_degree(a).saturating_sub(1),
        Expr::Neg(a) | Expr::Component(a, _) => estimate_degree(a),
        Expr::Sum(a, b) => estimate_degree(a).max(estimate_degree(b)),
        Expr::Product(a, b) | Expr::Inner(a, b) | Expr::Division(a, b) => estimate_degree(a) + estimate_degree(b),
        Expr::Power(a, b) => {
            let base = estimate_degree(a);
            match b.as_literal() {
                Some(p) if p >= 0.0 && p.fract() == 0.0 => base.saturating_mul(p as usize),
                _ => base + 2,
            }
        }
        Expr::Math(_, a) => estimate_degree(a) + 2,
        Expr::CoefficientDerivative { operand, .. } => estimate_degree(operand),
    }
}

/// The value of an expression at a point.
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Scalar(f64),
    Vector(DVector<f64>),
}

impl Value {
    fn from_shape(shape: ValueShape, values: &DVector<f64>) -> Self {
        match shape {
            ValueShape::Scalar => Self::Scalar(values[0]),
            ValueShape::Vector(_) => Self::Vector(values.clone()),
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Vector(v) => v.len(),
        }
    }

    fn scalar(&self) -> eyre::Result<f64> {
        match self {
            Self::Scalar(value) => Ok(*value),
            Self::Vector(v) => Err(eyre!("expected scalar value, found vector of length {}", v.len())),
        }
    }

    fn into_column(self) -> DVector<f64> {
        match self {
            Self::Scalar(value) => DVector::from_element(1, value),
            Self::Vector(v) => v,
        }
    }
}

/// Evaluation state at a single quadrature point of a cell.
struct PointContext<'a> {
    point: &'a QuadraturePoint,
    cell_vertices: &'a [usize],
    /// The local basis function currently selected for each argument number.
    local_indices: [usize; 2],
}

impl<'a> PointContext<'a> {
    fn geometry_dim(&self) -> usize {
        self.point.point.len()
    }

    fn evaluate_scalar(&self, expr: &Expr) -> eyre::Result<f64> {
        self.evaluate(expr)?
            .scalar()
            .map_err(|err| err.wrap_err("integrand must be scalar-valued"))
    }

    fn evaluate(&self, expr: &Expr) -> eyre::Result<Value> {
        use Value::{Scalar, Vector};
        Ok(match expr {
            Expr::Zero => Scalar(0.0),
            Expr::Literal(value) => Scalar(*value),
            Expr::SpatialCoordinate => Vector(self.point.point.clone()),
            Expr::Coefficient(coefficient) => self.evaluate_coefficient(coefficient),
            Expr::Argument(argument) => self.evaluate_argument(argument)?,
            Expr::Grad(a) => {
                let jacobian = self.jacobian(a)?;
                if jacobian.nrows() != 1 {
                    return Err(eyre!("gradient of a vector-valued expression is not supported"));
                }
                Vector(jacobian.row(0).transpose())
            }
            Expr::Neg(a) => match self.evaluate(a)? {
                Scalar(a) => Scalar(-a),
                Vector(a) => Vector(-a),
            },
            Expr::Sum(a, b) => match (self.evaluate(a)?, self.evaluate(b)?) {
                (Scalar(a), Scalar(b)) => Scalar(a + b),
                (Vector(a), Vector(b)) if a.len() == b.len() => Vector(a + b),
                (a, b) => return Err(eyre!("cannot add values of size {} and {}", a.size(), b.size())),
            },
            Expr::Product(a, b) => match (self.evaluate(a)?, self.evaluate(b)?) {
                (Scalar(a), Scalar(b)) => Scalar(a * b),
                (Scalar(s), Vector(v)) | (Vector(v), Scalar(s)) => Vector(v * s),
                (Vector(_), Vector(_)) => {
                    return Err(eyre!("product of two vectors is ambiguous, use inner or dot instead"))
                }
            },
            Expr::Division(a, b) => {
                let denominator = self
                    .evaluate(b)?
                    .scalar()
                    .map_err(|err| err.wrap_err("denominator must be scalar"))?;
                match self.evaluate(a)? {
                    Scalar(a) => Scalar(a / denominator),
                    Vector(a) => Vector(a / denominator),
                }
            }
            Expr::Power(a, b) => Scalar(self.evaluate(a)?.scalar()?.powf(self.evaluate(b)?.scalar()?)),
            Expr::Inner(a, b) => match (self.evaluate(a)?, self.evaluate(b)?) {
                (Scalar(a), Scalar(b)) => Scalar(a * b),
                (Vector(a), Vector(b)) if a.len() == b.len() => Scalar(a.dot(&b)),
                (a, b) => {
                    return Err(eyre!(
                        "inner product of values of size {} and {} is undefined",
                        a.size(),
                        b.size()
                    ))
                }
            },
            Expr::Component(a, index) => match self.evaluate(a)? {
                Vector(v) if *index < v.len() => Scalar(v[*index]),
                value => return Err(eyre!("component {} out of bounds for value of size {}", index, value.size())),
            },
            Expr::Math(function, a) => Scalar(function.apply(self.evaluate(a)?.scalar()?)),
            Expr::CoefficientDerivative { .. } => return Err(eyre!("cannot evaluate unexpanded derivative")),
        })
    }

    fn evaluate_coefficient(&self, coefficient: &Coefficient) -> Value {
        match coefficient {
            Coefficient::Function(function) => match function.space().family() {
                Family::Lagrange => {
                    let values = function.values();
                    let value = self
                        .cell_vertices
                        .iter()
                        .zip(self.point.basis.iter())
                        .map(|(&vertex, phi)| values[vertex] * phi)
                        .sum();
                    Value::Scalar(value)
                }
                Family::Real(shape) => Value::from_shape(shape, function.values()),
            },
            Coefficient::Constant(constant) => Value::from_shape(constant.shape(), constant.values()),
            Coefficient::Expression(expression) => Value::Scalar(expression.evaluate(&self.point.point)),
        }
    }

    fn evaluate_argument(&self, argument: &Argument) -> eyre::Result<Value> {
        let local = *self
            .local_indices
            .get(argument.number())
            .ok_or_else(|| eyre!("argument number {} is not supported", argument.number()))?;
        Ok(match argument.space().family() {
            Family::Lagrange => Value::Scalar(self.point.basis[local]),
            Family::Real(ValueShape::Scalar) => Value::Scalar(1.0),
            Family::Real(ValueShape::Vector(n)) => {
                let mut e = DVector::zeros(n);
                e[local] = 1.0;
                Value::Vector(e)
            }
        })
    }

    /// The Jacobian of an expression with respect to the spatial coordinate, with one row per
    /// component of its value.
    fn jacobian(&self, expr: &Expr) -> eyre::Result<DMatrix<f64>> {
        let gdim = self.geometry_dim();
        Ok(match expr {
            Expr::Zero | Expr::Literal(_) => DMatrix::zeros(1, gdim),
            Expr::SpatialCoordinate => DMatrix::identity(gdim, gdim),
            Expr::Coefficient(coefficient) => match coefficient {
                Coefficient::Function(function) => match function.space().family() {
                    Family::Lagrange => {
                        let values = function.values();
                        let mut gradient = DVector::zeros(gdim);
                        for (k, &vertex) in self.cell_vertices.iter().enumerate() {
                            gradient += values[vertex] * self.point.gradients.column(k);
                        }
                        DMatrix::from_row_slice(1, gdim, gradient.as_slice())
                    }
                    Family::Real(shape) => DMatrix::zeros(shape.size(), gdim),
                },
                Coefficient::Constant(constant) => DMatrix::zeros(constant.shape().size(), gdim),
                Coefficient::Expression(_) => {
                    return Err(eyre!("gradients of Expression coefficients are not supported"))
                }
            },
            Expr::Argument(argument) => match argument.space().family() {
                Family::Lagrange => {
                    let local = self.local_indices[argument.number()];
                    DMatrix::from_iterator(1, gdim, self.point.gradients.column(local).iter().copied())
                }
                Family::Real(shape) => DMatrix::zeros(shape.size(), gdim),
            },
            // Piecewise affine expressions have vanishing second derivatives on each cell
            Expr::Grad(a) if is_piecewise_affine(a) => DMatrix::zeros(gdim, gdim),
            Expr::Grad(_) => return Err(eyre!("second derivatives are not supported")),
            Expr::Neg(a) => -self.jacobian(a)?,
            Expr::Sum(a, b) => {
                let (ja, jb) = (self.jacobian(a)?, self.jacobian(b)?);
                if ja.shape() != jb.shape() {
                    return Err(eyre!("cannot add values of size {} and {}", ja.nrows(), jb.nrows()));
                }
                ja + jb
            }
            Expr::Product(a, b) => {
                // (s v)' = v s' + s v', where s is scalar and v may be a vector
                let (va, vb) = (self.evaluate(a)?, self.evaluate(b)?);
                let (ja, jb) = (self.jacobian(a)?, self.jacobian(b)?);
                match (va, vb) {
                    (Value::Scalar(sa), vb) => vb.into_column() * ja + jb * sa,
                    (va, Value::Scalar(sb)) => va.into_column() * jb + ja * sb,
                    _ => return Err(eyre!("product of two vectors is ambiguous, use inner or dot instead")),
                }
            }
            Expr::Division(a, b) => {
                let denominator = self.evaluate(b)?.scalar()?;
                let (ja, jb) = (self.jacobian(a)?, self.jacobian(b)?);
                let numerator = self.evaluate(a)?.into_column();
                (ja * denominator - numerator * jb) / (denominator * denominator)
            }
            Expr::Power(a, b) => {
                let (base, exponent) = (self.evaluate(a)?.scalar()?, self.evaluate(b)?.scalar()?);
                let (ja, jb) = (self.jacobian(a)?, self.jacobian(b)?);
                let mut jacobian = ja * (exponent * base.powf(exponent - 1.0));
                if jb.iter().any(|x| *x != 0.0) {
                    jacobian += jb * (base.powf(exponent) * base.ln());
                }
                jacobian
            }
            Expr::Inner(a, b) => {
                let (va, vb) = (self.evaluate(a)?.into_column(), self.evaluate(b)?.into_column());
                let (ja, jb) = (self.jacobian(a)?, self.jacobian(b)?);
                if va.len() != vb.len() {
                    return Err(eyre!(
                        "inner product of values of size {} and {} is undefined",
                        va.len(),
                        vb.len()
                    ));
                }
                let gradient = ja.tr_mul(&vb) + jb.tr_mul(&va);
                DMatrix::from_row_slice(1, gdim, gradient.as_slice())
            }
            Expr::Component(a, index) => {
                let jacobian = self.jacobian(a)?;
                if *index >= jacobian.nrows() {
                    return Err(eyre!(
                        "component {} out of bounds for value of size {}",
                        index,
                        jacobian.nrows()
                    ));
                }
                jacobian.rows(*index, 1).into_owned()
            }
            Expr::Math(function, a) => {
                let x = self.evaluate(a)?.scalar()?;
                let derivative = match function {
                    MathFunction::Sin => x.cos(),
                    MathFunction::Cos => -x.sin(),
                    MathFunction::Exp => x.exp(),
                    MathFunction::Ln => 1.0 / x,
                    MathFunction::Sqrt => 0.5 / x.sqrt(),
                };
                self.jacobian(a)? * derivative
            }
            Expr::CoefficientDerivative { .. } => return Err(eyre!("cannot evaluate unexpanded derivative")),
        })
    }
}

fn is_piecewise_affine(expr: &Expr) -> bool {
    let mut affine = true;
    expr.visit(&mut |node| match node {
        Expr::Zero
        | Expr::Literal(_)
        | Expr::SpatialCoordinate
        | Expr::Argument(_)
        | Expr::Coefficient(Coefficient::Function(_))
        | Expr::Coefficient(Coefficient::Constant(_))
        | Expr::Neg(_)
        | Expr::Sum(..)
        | Expr::Component(..) => {}
        _ => affine = false,
    });
    affine
}
