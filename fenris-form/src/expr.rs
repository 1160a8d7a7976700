//! Symbolic expressions for integrands of variational forms.
//!
//! Expressions are trees of [`Expr`] nodes. All compound nodes should be built through the
//! constructor functions on [`Expr`] (or the operator overloads, which use them), since these
//! eliminate structural zeros. Zero elimination is what makes derivatives of forms that do not
//! depend on a coefficient collapse to empty forms.
use crate::coefficient::{Argument, Coefficient, CoefficientId, Constant, Expression, Function};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Elementary scalar functions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MathFunction {
    Sin,
    Cos,
    Exp,
    Ln,
    Sqrt,
}

impl MathFunction {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Exp => x.exp(),
            Self::Ln => x.ln(),
            Self::Sqrt => x.sqrt(),
        }
    }
}

/// A node in a symbolic integrand.
#[derive(Debug, Clone)]
pub enum Expr {
    /// The zero of any shape.
    Zero,
    Literal(f64),
    /// The physical coordinate `x`, a vector of the geometry dimension.
    SpatialCoordinate,
    Coefficient(Coefficient),
    Argument(Argument),
    Grad(Box<Expr>),
    Neg(Box<Expr>),
    Sum(Box<Expr>, Box<Expr>),
    Product(Box<Expr>, Box<Expr>),
    Division(Box<Expr>, Box<Expr>),
    Power(Box<Expr>, Box<Expr>),
    Inner(Box<Expr>, Box<Expr>),
    Component(Box<Expr>, usize),
    Math(MathFunction, Box<Expr>),
    /// The Gateaux derivative of `operand` with respect to `coefficient` in the given
    /// direction, not yet expanded.
    CoefficientDerivative {
        operand: Box<Expr>,
        coefficient: CoefficientId,
        direction: Box<Expr>,
    },
}

impl Expr {
    pub fn literal(value: f64) -> Self {
        if value == 0.0 {
            Self::Zero
        } else {
            Self::Literal(value)
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Zero)
    }

    /// The numeric value of the expression if it is a literal (or zero).
    pub fn as_literal(&self) -> Option<f64> {
        match self {
            Self::Zero => Some(0.0),
            Self::Literal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn neg(operand: Expr) -> Self {
        match operand {
            Self::Zero => Self::Zero,
            Self::Literal(value) => Self::Literal(-value),
            Self::Neg(inner) => *inner,
            operand => Self::Neg(Box::new(operand)),
        }
    }

    pub fn sum(a: Expr, b: Expr) -> Self {
        match (a, b) {
            (Self::Zero, b) => b,
            (a, Self::Zero) => a,
            (Self::Literal(a), Self::Literal(b)) => Self::literal(a + b),
            (a, b) => Self::Sum(Box::new(a), Box::new(b)),
        }
    }

    pub fn difference(a: Expr, b: Expr) -> Self {
        Self::sum(a, Self::neg(b))
    }

    pub fn product(a: Expr, b: Expr) -> Self {
        match (a, b) {
            (Self::Zero, _) | (_, Self::Zero) => Self::Zero,
            (Self::Literal(a), Self::Literal(b)) => Self::literal(a * b),
            (Self::Literal(one), b) if one == 1.0 => b,
            (a, Self::Literal(one)) if one == 1.0 => a,
            (a, b) => Self::Product(Box::new(a), Box::new(b)),
        }
    }

    pub fn division(numerator: Expr, denominator: Expr) -> Self {
        match (numerator, denominator) {
            (Self::Zero, _) => Self::Zero,
            (numerator, Self::Literal(one)) if one == 1.0 => numerator,
            (numerator, denominator) => Self::Division(Box::new(numerator), Box::new(denominator)),
        }
    }

    pub fn power(base: Expr, exponent: Expr) -> Self {
        match (base, exponent) {
            (_, Self::Zero) => Self::Literal(1.0),
            (base, Self::Literal(one)) if one == 1.0 => base,
            (Self::Zero, Self::Literal(p)) if p > 0.0 => Self::Zero,
            (Self::Literal(a), Self::Literal(p)) => Self::literal(a.powf(p)),
            (base, exponent) => Self::Power(Box::new(base), Box::new(exponent)),
        }
    }

    pub fn inner(a: Expr, b: Expr) -> Self {
        match (a, b) {
            (Self::Zero, _) | (_, Self::Zero) => Self::Zero,
            (a, b) => Self::Inner(Box::new(a), Box::new(b)),
        }
    }

    pub fn grad(operand: Expr) -> Self {
        match operand {
            Self::Zero | Self::Literal(_) => Self::Zero,
            operand => Self::Grad(Box::new(operand)),
        }
    }

    pub fn component(operand: Expr, index: usize) -> Self {
        match operand {
            Self::Zero => Self::Zero,
            operand => Self::Component(Box::new(operand), index),
        }
    }

    pub fn math(function: MathFunction, operand: Expr) -> Self {
        match operand.as_literal() {
            Some(value) => Self::literal(function.apply(value)),
            None => Self::Math(function, Box::new(operand)),
        }
    }

    pub fn coefficient_derivative(operand: Expr, coefficient: CoefficientId, direction: Expr) -> Self {
        if operand.is_zero() || direction.is_zero() {
            Self::Zero
        } else {
            Self::CoefficientDerivative {
                operand: Box::new(operand),
                coefficient,
                direction: Box::new(direction),
            }
        }
    }

    pub fn sin(self) -> Self {
        Self::math(MathFunction::Sin, self)
    }

    pub fn cos(self) -> Self {
        Self::math(MathFunction::Cos, self)
    }

    pub fn exp(self) -> Self {
        Self::math(MathFunction::Exp, self)
    }

    pub fn ln(self) -> Self {
        Self::math(MathFunction::Ln, self)
    }

    pub fn sqrt(self) -> Self {
        Self::math(MathFunction::Sqrt, self)
    }

    pub fn powf(self, exponent: f64) -> Self {
        Self::power(self, Self::literal(exponent))
    }

    pub fn pow(self, exponent: impl Into<Expr>) -> Self {
        Self::power(self, exponent.into())
    }

    /// The `index`-th component of a vector-valued expression.
    pub fn at(self, index: usize) -> Self {
        Self::component(self, index)
    }

    /// Visits every node of the expression tree in pre-order.
    pub fn visit<'a>(&'a self, visitor: &mut impl FnMut(&'a Expr)) {
        visitor(self);
        match self {
            Self::Zero | Self::Literal(_) | Self::SpatialCoordinate | Self::Coefficient(_) | Self::Argument(_) => {}
            Self::Grad(a) | Self::Neg(a) | Self::Component(a, _) | Self::Math(_, a) => a.visit(visitor),
            Self::Sum(a, b) | Self::Product(a, b) | Self::Division(a, b) | Self::Power(a, b) | Self::Inner(a, b) => {
                a.visit(visitor);
                b.visit(visitor);
            }
            Self::CoefficientDerivative { operand, direction, .. } => {
                operand.visit(visitor);
                direction.visit(visitor);
            }
        }
    }

    /// The arguments appearing in the expression, including in derivative directions.
    pub fn arguments(&self) -> Vec<&Argument> {
        let mut arguments: Vec<&Argument> = Vec::new();
        self.visit(&mut |node| {
            if let Self::Argument(argument) = node {
                if !arguments.contains(&argument) {
                    arguments.push(argument);
                }
            }
        });
        arguments
    }

    /// Whether the given coefficient appears in the expression.
    pub fn depends_on(&self, coefficient: CoefficientId) -> bool {
        let mut found = false;
        self.visit(&mut |node| {
            if let Self::Coefficient(c) = node {
                found |= c.id() == coefficient;
            }
        });
        found
    }
}

/// The spatial coordinate `x`.
pub fn spatial_coordinate() -> Expr {
    Expr::SpatialCoordinate
}

/// The gradient of a scalar expression.
pub fn grad(operand: impl Into<Expr>) -> Expr {
    Expr::grad(operand.into())
}

/// The inner product of two expressions of the same shape.
pub fn inner(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    Expr::inner(a.into(), b.into())
}

/// The dot product of two vectors, or the product of two scalars.
pub fn dot(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    Expr::inner(a.into(), b.into())
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::literal(value)
    }
}

impl From<Coefficient> for Expr {
    fn from(coefficient: Coefficient) -> Self {
        Expr::Coefficient(coefficient)
    }
}

impl From<&Coefficient> for Expr {
    fn from(coefficient: &Coefficient) -> Self {
        Expr::Coefficient(coefficient.clone())
    }
}

impl From<Argument> for Expr {
    fn from(argument: Argument) -> Self {
        Expr::Argument(argument)
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

macro_rules! impl_from_coefficient_kind {
    ($kind:ty) => {
        impl From<$kind> for Expr {
            fn from(coefficient: $kind) -> Self {
                Expr::Coefficient(Coefficient::from(coefficient))
            }
        }

        impl From<&$kind> for Expr {
            fn from(coefficient: &$kind) -> Self {
                Expr::Coefficient(Coefficient::from(coefficient.clone()))
            }
        }
    };
}

impl_from_coefficient_kind!(Function);
impl_from_coefficient_kind!(Constant);
impl_from_coefficient_kind!(Expression);

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $constructor:expr) => {
        impl $trait<Expr> for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                $constructor(self, rhs)
            }
        }

        impl $trait<f64> for Expr {
            type Output = Expr;

            fn $method(self, rhs: f64) -> Expr {
                $constructor(self, Expr::literal(rhs))
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                $constructor(Expr::literal(self), rhs)
            }
        }
    };
}

impl_binary_operator!(Add, add, Expr::sum);
impl_binary_operator!(Sub, sub, Expr::difference);
impl_binary_operator!(Mul, mul, Expr::product);
impl_binary_operator!(Div, div, Expr::division);

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::neg(self)
    }
}
