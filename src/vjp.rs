//! Reverse-mode sensitivities (vector-Jacobian products).
use crate::array::Array;
use crate::convert::template_shape;
use crate::error::{Error, Result};
use crate::eval::{assemble_eval, Evaluation};
use crate::value::FemValue;
use eyre::eyre;
use fenris_form::{assemble, derivative, expand_derivatives, test_function, Coefficient, Form, FunctionSpace};
use log::{debug, trace};
use std::sync::Arc;

/// Inputs that a form can be differentiated with respect to.
pub trait DifferentiableInput {
    /// Fails with [`Error::NotImplemented`] if derivatives with respect to this input are not
    /// supported.
    fn ensure_differentiable(&self) -> Result<()>;

    /// The function space whose test function gives the sensitivity of `form` with respect to
    /// this input, one degree of freedom per array entry.
    ///
    /// Returns `None` if the form has no integrals, in which case there is no sensitivity.
    fn resolve_test_space(&self, form: &Form) -> Result<Option<Arc<FunctionSpace>>>;
}

impl DifferentiableInput for Coefficient {
    fn ensure_differentiable(&self) -> Result<()> {
        match self {
            Coefficient::Function(_) | Coefficient::Constant(_) => Ok(()),
            Coefficient::Expression(_) => Err(Error::NotImplemented(format!(
                "sensitivities with respect to {} inputs are not supported",
                self.kind_name()
            ))),
        }
    }

    fn resolve_test_space(&self, form: &Form) -> Result<Option<Arc<FunctionSpace>>> {
        self.ensure_differentiable()?;
        Ok(match self {
            Coefficient::Function(function) => Some(Arc::clone(function.space())),
            Coefficient::Constant(constant) => form
                .domain()
                .map(|mesh| FunctionSpace::real(mesh, constant.shape())),
            Coefficient::Expression(_) => None,
        })
    }
}

fn scalar_cotangent(g: &Array) -> Result<f64> {
    g.to_scalar().ok_or_else(|| {
        Error::TypeCheck(format!(
            "cotangent of a scalar output must have shape [], got shape {:?}",
            g.shape()
        ))
    })
}

/// The sensitivity of the assembled form with respect to a single input, scaled by `g`.
///
/// Returns `None` if the form does not depend on the input.
fn sensitivity(g: f64, form: &Form, input: &Coefficient) -> Result<Option<Array>> {
    let space = match input.resolve_test_space(form)? {
        Some(space) => space,
        None => return Ok(None),
    };
    let derivative_form = expand_derivatives(&derivative(form, input, test_function(&space)));
    if derivative_form.is_empty() {
        trace!("Form does not depend on {} input {:?}", input.kind_name(), input.id());
        return Ok(None);
    }

    let assembled = assemble(&derivative_form)?;
    let gradient = assembled
        .as_vector()
        .ok_or_else(|| eyre!("sensitivity form assembled to a {} instead of a vector", assembled.kind_name()))?;
    trace!(
        "Assembled sensitivity of length {} for {} input {:?}",
        gradient.len(),
        input.kind_name(),
        input.id()
    );
    Ok(Some(Array::from_vector(gradient * g).reshape(template_shape(input))?))
}

/// Lazily computes the sensitivities of the assembled form with respect to each input, in input
/// order, scaled by the scalar cotangent `g`.
///
/// Each item is `None` if the form does not depend on the corresponding input. Fails immediately
/// if `g` is not scalar-shaped.
pub fn vjp_assemble_impl<'a>(
    g: &Array,
    form: &'a Form,
    inputs: &'a [Coefficient],
) -> Result<impl Iterator<Item = Result<Option<Array>>> + 'a> {
    let g = scalar_cotangent(g)?;
    Ok(inputs.iter().map(move |input| sensitivity(g, form, input)))
}

/// The cotangent map of an evaluated assembly function.
#[derive(Debug, Clone)]
pub struct Vjp {
    form: Form,
    inputs: Vec<Coefficient>,
}

impl Vjp {
    pub fn new(form: Form, inputs: Vec<Coefficient>) -> Self {
        Self { form, inputs }
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Maps the cotangent of the scalar output to one cotangent per input.
    ///
    /// Inputs the form does not depend on receive zero cotangents of their own shape, so the
    /// result always has one array per input.
    pub fn apply(&self, g: &Array) -> Result<Vec<Array>> {
        debug!("Computing sensitivities with respect to {} inputs", self.inputs.len());
        vjp_assemble_impl(g, &self.form, &self.inputs)?
            .zip(&self.inputs)
            .map(|(sensitivity, input)| {
                Ok(sensitivity?.unwrap_or_else(|| Array::zeros(template_shape(input))))
            })
            .collect()
    }
}

impl From<Evaluation> for Vjp {
    fn from(evaluation: Evaluation) -> Self {
        Self::new(evaluation.form, evaluation.inputs)
    }
}

/// Evaluates the wrapped function and returns its output together with the cotangent map.
pub fn vjp_assemble_eval<F>(function: &F, templates: &[Coefficient], args: &[Array]) -> Result<(Array, Vjp)>
where
    F: Fn(&[Coefficient]) -> eyre::Result<FemValue> + ?Sized,
{
    let evaluation = assemble_eval(function, templates, args)?;
    let output = evaluation.output.clone();
    Ok((output, Vjp::from(evaluation)))
}
