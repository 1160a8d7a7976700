//! Symbolic Gateaux derivatives of expressions and forms.
//!
//! Derivatives are first recorded lazily as [`Expr::CoefficientDerivative`] nodes by
//! [`derivative`], and only applied by [`expand_derivatives`]. Assembly always expands
//! derivatives first, so expansion is only needed explicitly when inspecting the result.
use crate::coefficient::{Coefficient, CoefficientId};
use crate::expr::{Expr, MathFunction};
use crate::form::Form;
use log::trace;

/// The Gateaux derivative of `form` with respect to `coefficient` in the given direction.
///
/// The direction is typically a test or trial function when linearizing, or another
/// coefficient of the same shape when computing a directional derivative. Integrals whose
/// derivative is structurally zero are dropped when the derivative is expanded.
pub fn derivative(form: &Form, coefficient: &Coefficient, direction: impl Into<Expr>) -> Form {
    let direction = direction.into();
    let id = coefficient.id();
    trace!(
        "Recording derivative of form with {} integrals with respect to {} {:?}",
        form.integrals().len(),
        coefficient.kind_name(),
        id
    );
    form.map_integrands(|integrand| Expr::coefficient_derivative(integrand.clone(), id, direction.clone()))
}

/// Applies all derivatives recorded in the form, dropping integrals that vanish.
pub fn expand_derivatives(form: &Form) -> Form {
    form.map_integrands(expand)
}

/// Applies all derivatives recorded in the expression.
pub fn expand(expr: &Expr) -> Expr {
    match expr {
        Expr::Zero | Expr::Literal(_) | Expr::SpatialCoordinate | Expr::Coefficient(_) | Expr::Argument(_) => {
            expr.clone()
        }
        Expr::Grad(a) => Expr::grad(expand(a)),
        Expr::Neg(a) => Expr::neg(expand(a)),
        Expr::Sum(a, b) => Expr::sum(expand(a), expand(b)),
        Expr::Product(a, b) => Expr::product(expand(a), expand(b)),
        Expr::Division(a, b) => Expr::division(expand(a), expand(b)),
        Expr::Power(a, b) => Expr::power(expand(a), expand(b)),
        Expr::Inner(a, b) => Expr::inner(expand(a), expand(b)),
        Expr::Component(a, index) => Expr::component(expand(a), *index),
        Expr::Math(function, a) => Expr::math(*function, expand(a)),
        Expr::CoefficientDerivative {
            operand,
            coefficient,
            direction,
        } => gateaux(&expand(operand), *coefficient, &expand(direction)),
    }
}

/// The Gateaux derivative
///
/// $$ \frac{d}{d \epsilon} e(w + \epsilon v) \Big|_{\epsilon = 0} $$
///
/// of the expression `e` with respect to the coefficient `w` in direction `v`.
pub fn gateaux(expr: &Expr, coefficient: CoefficientId, direction: &Expr) -> Expr {
    let d = |e: &Expr| gateaux(e, coefficient, direction);
    match expr {
        Expr::Zero | Expr::Literal(_) | Expr::SpatialCoordinate | Expr::Argument(_) => Expr::Zero,
        Expr::Coefficient(c) if c.id() == coefficient => direction.clone(),
        Expr::Coefficient(_) => Expr::Zero,
        Expr::Grad(a) => Expr::grad(d(a)),
        Expr::Neg(a) => Expr::neg(d(a)),
        Expr::Sum(a, b) => Expr::sum(d(a), d(b)),
        Expr::Product(a, b) => {
            let (a, b) = (a.as_ref(), b.as_ref());
            Expr::sum(Expr::product(d(a), b.clone()), Expr::product(a.clone(), d(b)))
        }
        Expr::Division(a, b) => {
            // (a / b)' = a' / b - a b' / b^2
            let (a, b) = (a.as_ref(), b.as_ref());
            let da_over_b = Expr::division(d(a), b.clone());
            let a_db = Expr::product(a.clone(), d(b));
            Expr::difference(da_over_b, Expr::division(a_db, Expr::power(b.clone(), Expr::literal(2.0))))
        }
        Expr::Power(a, b) => {
            // (a^b)' = b a^(b - 1) a' + a^b ln(a) b'
            let (a, b) = (a.as_ref(), b.as_ref());
            let da = d(a);
            let db = d(b);
            let base_term = Expr::product(
                Expr::product(b.clone(), Expr::power(a.clone(), Expr::difference(b.clone(), Expr::literal(1.0)))),
                da,
            );
            if db.is_zero() {
                base_term
            } else {
                let exponent_term = Expr::product(
                    Expr::product(Expr::power(a.clone(), b.clone()), Expr::math(MathFunction::Ln, a.clone())),
                    db,
                );
                Expr::sum(base_term, exponent_term)
            }
        }
        Expr::Inner(a, b) => {
            let (a, b) = (a.as_ref(), b.as_ref());
            Expr::sum(Expr::inner(d(a), b.clone()), Expr::inner(a.clone(), d(b)))
        }
        Expr::Component(a, index) => Expr::component(d(a), *index),
        Expr::Math(function, a) => {
            let a = a.as_ref();
            let da = d(a);
            if da.is_zero() {
                return Expr::Zero;
            }
            let outer = match function {
                MathFunction::Sin => Expr::math(MathFunction::Cos, a.clone()),
                MathFunction::Cos => Expr::neg(Expr::math(MathFunction::Sin, a.clone())),
                MathFunction::Exp => Expr::math(MathFunction::Exp, a.clone()),
                MathFunction::Ln => Expr::division(Expr::literal(1.0), a.clone()),
                MathFunction::Sqrt => {
                    Expr::division(Expr::literal(1.0), Expr::product(Expr::literal(2.0), Expr::math(MathFunction::Sqrt, a.clone())))
                }
            };
            Expr::product(outer, da)
        }
        Expr::CoefficientDerivative { .. } => gateaux(&expand(expr), coefficient, direction),
    }
}
