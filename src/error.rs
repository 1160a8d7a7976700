use crate::primitive::PrimitiveId;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Errors produced when evaluating or differentiating wrapped assembly functions.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The number or shapes of the arguments do not match the templates, or a cotangent
    /// does not have the shape of the output.
    TypeCheck(String),
    /// The wrapped function did not return a `(scalar, form)` pair.
    ContractViolation { expected: String, found: String },
    /// Sensitivities with respect to this kind of input can not be computed.
    NotImplemented(String),
    /// Batched evaluation was requested with batch axes that are not supported.
    InvalidBatchAxes(String),
    /// No primitive is registered under the given identifier.
    UnknownPrimitive(PrimitiveId),
    /// An error reported by the wrapped function or the finite element library.
    Fem(eyre::Report),
}

impl Error {
    pub(crate) fn contract_violation(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ContractViolation {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeCheck(msg) => write!(f, "Type check failed: {}", msg),
            Self::ContractViolation { expected, found } => {
                write!(
                    f,
                    "Wrapped function must return {}, but returned {}",
                    expected, found
                )
            }
            Self::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Self::InvalidBatchAxes(msg) => write!(f, "Invalid batch axes: {}", msg),
            Self::UnknownPrimitive(id) => write!(f, "No primitive registered with id {}", id),
            Self::Fem(report) => write!(f, "Finite element error: {}", report),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fem(report) => Some(&**report),
            _ => None,
        }
    }
}

impl From<eyre::Report> for Error {
    fn from(report: eyre::Report) -> Self {
        Self::Fem(report)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
