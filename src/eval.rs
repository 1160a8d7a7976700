//! Forward evaluation of wrapped assembly functions.
use crate::array::Array;
use crate::convert::convert_all;
use crate::error::{Error, Result};
use crate::value::FemValue;
use fenris_form::{Assembled, Coefficient, Form};
use log::debug;

const OUTPUT_CONTRACT: &str = "a pair (scalar, Form)";

/// The result of evaluating a wrapped function.
///
/// Besides the scalar output, the evaluation keeps the form and the coefficients that produced
/// it, which is all that is needed to compute sensitivities afterwards.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// The scalar output as an array of shape `[]`.
    pub output: Array,
    /// The form whose assembly produced the output.
    pub form: Form,
    /// The coefficients the wrapped function was called with, in argument order.
    pub inputs: Vec<Coefficient>,
}

/// Converts the arguments into coefficients, calls the wrapped function and checks that it
/// returned a single scalar together with the form it was assembled from.
pub fn assemble_eval<F>(function: &F, templates: &[Coefficient], args: &[Array]) -> Result<Evaluation>
where
    F: Fn(&[Coefficient]) -> eyre::Result<FemValue> + ?Sized,
{
    debug!("Evaluating wrapped function with {} arguments", args.len());
    let inputs = convert_all(templates, args)?;
    let returned = function(&inputs)?;
    let (output, form) = split_output(returned)?;
    Ok(Evaluation {
        output: Array::scalar(output),
        form,
        inputs,
    })
}

fn split_output(returned: FemValue) -> Result<(f64, Form)> {
    let mut elements = match returned {
        FemValue::Tuple(elements) => elements,
        other => return Err(Error::contract_violation(OUTPUT_CONTRACT, other.type_name())),
    };
    if let Some(FemValue::Tuple(_)) = elements.first() {
        return Err(Error::contract_violation(
            "a single output, but multiple outputs are not supported",
            "a tuple of outputs",
        ));
    }
    if elements.len() != 2 {
        return Err(Error::contract_violation(
            OUTPUT_CONTRACT,
            format!("a tuple of length {}", elements.len()),
        ));
    }

    let form = elements.pop();
    let output = elements.pop();
    match (output, form) {
        (Some(FemValue::Assembled(Assembled::Scalar(value))), Some(FemValue::Form(form))) => Ok((value, form)),
        (Some(FemValue::Assembled(Assembled::Scalar(_))), Some(other)) => Err(Error::contract_violation(
            "a Form as the second element",
            other.type_name(),
        )),
        (Some(other), _) => Err(Error::contract_violation(
            "a scalar as the first element",
            other.type_name(),
        )),
        (None, _) => Err(Error::contract_violation(OUTPUT_CONTRACT, "an empty tuple")),
    }
}
