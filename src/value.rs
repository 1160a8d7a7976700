use fenris_form::{Assembled, Coefficient, Form};

/// A dynamically typed value returned by a wrapped assembly function.
///
/// Wrapped functions must return `FemValue::Tuple(vec![scalar, form])`, typically through the
/// `From<(A, B)>` conversion:
///
/// ```
/// # use fenris_autodiff::FemValue;
/// # use fenris_form::{assemble, dx, Mesh, Expr};
/// # use std::sync::Arc;
/// # fn main() -> eyre::Result<()> {
/// let mesh = Arc::new(Mesh::unit_interval(4));
/// let form = Expr::literal(2.0) * dx(&mesh);
/// let value = FemValue::from((assemble(&form)?, form));
/// assert_eq!(value.type_name(), "Tuple");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub enum FemValue {
    Assembled(Assembled),
    Form(Form),
    Coefficient(Coefficient),
    Tuple(Vec<FemValue>),
}

impl FemValue {
    /// A short description of the kind of value, used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Self::Assembled(Assembled::Scalar(_)) => "scalar".to_string(),
            Self::Assembled(Assembled::Vector(v)) => format!("vector of length {}", v.len()),
            Self::Assembled(Assembled::Matrix(m)) => format!("{}x{} matrix", m.nrows(), m.ncols()),
            Self::Form(_) => "Form".to_string(),
            Self::Coefficient(c) => c.kind_name().to_string(),
            Self::Tuple(_) => "Tuple".to_string(),
        }
    }
}

impl From<Assembled> for FemValue {
    fn from(assembled: Assembled) -> Self {
        Self::Assembled(assembled)
    }
}

impl From<f64> for FemValue {
    fn from(value: f64) -> Self {
        Self::Assembled(Assembled::Scalar(value))
    }
}

impl From<Form> for FemValue {
    fn from(form: Form) -> Self {
        Self::Form(form)
    }
}

impl From<Coefficient> for FemValue {
    fn from(coefficient: Coefficient) -> Self {
        Self::Coefficient(coefficient)
    }
}

impl From<Vec<FemValue>> for FemValue {
    fn from(values: Vec<FemValue>) -> Self {
        Self::Tuple(values)
    }
}

impl<A, B> From<(A, B)> for FemValue
where
    A: Into<FemValue>,
    B: Into<FemValue>,
{
    fn from((a, b): (A, B)) -> Self {
        Self::Tuple(vec![a.into(), b.into()])
    }
}
