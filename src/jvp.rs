//! Forward-mode sensitivities (Jacobian-vector products).
use crate::array::Array;
use crate::convert::convert_all;
use crate::error::Result;
use crate::eval::{assemble_eval, Evaluation};
use crate::value::FemValue;
use crate::vjp::DifferentiableInput;
use eyre::eyre;
use fenris_form::{assemble, derivative, expand_derivatives, Coefficient, Expr, Form};
use itertools::izip;
use log::{debug, trace};

/// Evaluates the wrapped function at `primals` and the directional derivative of its output
/// along `tangents`.
///
/// The tangents are converted into coefficients using the primal coefficients as templates, so
/// each tangent must have the shape of its primal. Returns the primal output and the tangent
/// output, both of shape `[]`.
pub fn jvp_assemble_eval<F>(
    function: &F,
    templates: &[Coefficient],
    primals: &[Array],
    tangents: &[Array],
) -> Result<(Array, Array)>
where
    F: Fn(&[Coefficient]) -> eyre::Result<FemValue> + ?Sized,
{
    let Evaluation { output, form, inputs } = assemble_eval(function, templates, primals)?;
    let tangent_coefficients = convert_all(&inputs, tangents)?;
    debug!("Computing directional derivative along {} tangents", tangents.len());

    // None stands for the literal zero, which needs no assembly
    let mut tangent_form: Option<Form> = None;
    for (primal, tangent) in izip!(&inputs, tangent_coefficients) {
        primal.ensure_differentiable()?;
        trace!("Adding derivative with respect to {} input {:?}", primal.kind_name(), primal.id());
        let directional = derivative(&form, primal, Expr::from(tangent));
        tangent_form = Some(match tangent_form {
            Some(total) => total + directional,
            None => directional,
        });
    }

    let tangent_output = match tangent_form {
        None => 0.0,
        Some(total) => {
            let assembled = assemble(&expand_derivatives(&total))?;
            assembled
                .as_scalar()
                .ok_or_else(|| eyre!("tangent form assembled to a {} instead of a scalar", assembled.kind_name()))?
        }
    };
    Ok((output, Array::scalar(tangent_output)))
}
