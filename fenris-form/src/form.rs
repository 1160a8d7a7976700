use crate::coefficient::Argument;
use crate::expr::Expr;
use crate::mesh::Mesh;
use eyre::eyre;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

/// An integration measure over the cells of a mesh.
#[derive(Debug, Clone)]
pub struct Measure {
    domain: Arc<Mesh>,
    quadrature_degree: Option<usize>,
}

/// The cell integration measure over the given mesh.
///
/// Multiplying an expression by a measure produces a [`Form`]:
///
/// ```
/// # use fenris_form::{dx, Mesh, Expr};
/// # use std::sync::Arc;
/// let mesh = Arc::new(Mesh::unit_square(2));
/// let area = Expr::literal(1.0) * dx(&mesh);
/// ```
pub fn dx(mesh: &Arc<Mesh>) -> Measure {
    Measure {
        domain: Arc::clone(mesh),
        quadrature_degree: None,
    }
}

impl Measure {
    /// Integrate with a quadrature rule of the given polynomial strength instead of one
    /// estimated from the integrand.
    ///
    /// Triangle rules are available up to strength 23. Assembling with a higher strength on a
    /// triangle mesh fails.
    pub fn with_quadrature_degree(self, degree: usize) -> Self {
        Self {
            quadrature_degree: Some(degree),
            ..self
        }
    }

    pub fn domain(&self) -> &Arc<Mesh> {
        &self.domain
    }

    pub fn quadrature_degree(&self) -> Option<usize> {
        self.quadrature_degree
    }
}

#[derive(Debug, Clone)]
pub struct Integral {
    integrand: Expr,
    measure: Measure,
}

impl Integral {
    pub fn integrand(&self) -> &Expr {
        &self.integrand
    }

    pub fn measure(&self) -> &Measure {
        &self.measure
    }

    pub fn domain(&self) -> &Arc<Mesh> {
        &self.measure.domain
    }
}

/// A symbolic variational form: a sum of integrals.
///
/// The form is linear in each of its arguments. Integrals with an identically zero integrand are
/// never stored, so an empty form is the zero form.
#[derive(Debug, Clone, Default)]
pub struct Form {
    integrals: Vec<Integral>,
}

impl Form {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn integrals(&self) -> &[Integral] {
        &self.integrals
    }

    pub fn is_empty(&self) -> bool {
        self.integrals.is_empty()
    }

    /// The mesh of the first integral, if any.
    pub fn domain(&self) -> Option<&Arc<Mesh>> {
        self.integrals.first().map(Integral::domain)
    }

    /// The arguments of the form, sorted by argument number.
    ///
    /// Returns an error if two distinct arguments share a number, or if the argument numbers are
    /// not `0, 1, ..., r - 1`.
    pub fn arguments(&self) -> eyre::Result<Vec<Argument>> {
        let mut arguments: Vec<Argument> = Vec::new();
        for integral in &self.integrals {
            for argument in integral.integrand.arguments() {
                match arguments.iter().find(|a| a.number() == argument.number()) {
                    Some(existing) if existing != argument => {
                        return Err(eyre!(
                            "form contains different arguments with the same number {}",
                            argument.number()
                        ));
                    }
                    Some(_) => {}
                    None => arguments.push(argument.clone()),
                }
            }
        }
        arguments.sort_by_key(Argument::number);
        if let Some((expected, argument)) = arguments
            .iter()
            .enumerate()
            .find(|(expected, argument)| argument.number() != *expected)
        {
            return Err(eyre!(
                "form has argument number {} but no argument number {}",
                argument.number(),
                expected
            ));
        }
        Ok(arguments)
    }

    /// The number of arguments of the form.
    pub fn rank(&self) -> eyre::Result<usize> {
        Ok(self.arguments()?.len())
    }

    /// Applies the given transformation to every integrand, keeping measures and dropping
    /// integrals whose new integrand is zero.
    pub fn map_integrands(&self, mut f: impl FnMut(&Expr) -> Expr) -> Self {
        let integrals = self
            .integrals
            .iter()
            .map(|integral| Integral {
                integrand: f(&integral.integrand),
                measure: integral.measure.clone(),
            })
            .filter(|integral| !integral.integrand.is_zero())
            .collect();
        Self { integrals }
    }

    /// Sets the quadrature degree of every integral in the form.
    pub fn with_quadrature_degree(mut self, degree: usize) -> Self {
        for integral in &mut self.integrals {
            integral.measure.quadrature_degree = Some(degree);
        }
        self
    }
}

impl Mul<Measure> for Expr {
    type Output = Form;

    fn mul(self, measure: Measure) -> Form {
        if self.is_zero() {
            Form::empty()
        } else {
            Form {
                integrals: vec![Integral {
                    integrand: self,
                    measure,
                }],
            }
        }
    }
}

impl Mul<Measure> for f64 {
    type Output = Form;

    fn mul(self, measure: Measure) -> Form {
        Expr::literal(self) * measure
    }
}

impl Add<Form> for Form {
    type Output = Form;

    fn add(mut self, rhs: Form) -> Form {
        self.integrals.extend(rhs.integrals);
        self
    }
}

impl Neg for Form {
    type Output = Form;

    fn neg(self) -> Form {
        self.map_integrands(|integrand| Expr::neg(integrand.clone()))
    }
}

impl Sub<Form> for Form {
    type Output = Form;

    fn sub(self, rhs: Form) -> Form {
        self + (-rhs)
    }
}

impl Mul<Form> for f64 {
    type Output = Form;

    fn mul(self, form: Form) -> Form {
        form.map_integrands(|integrand| Expr::product(Expr::literal(self), integrand.clone()))
    }
}

impl Mul<f64> for Form {
    type Output = Form;

    fn mul(self, scale: f64) -> Form {
        scale * self
    }
}
