//! Conversion between host arrays and finite element coefficients.
//!
//! Every wrapped function is described by a list of template coefficients. A template fixes the
//! kind of an input and the shape of the array that represents it:
//!
//! | Template                        | Array shape |
//! |---------------------------------|-------------|
//! | `Function` in a space `V`       | `[dim V]`   |
//! | scalar `Constant`               | `[]`        |
//! | vector `Constant` of size `n`   | `[n]`       |
//! | `Expression` with `k` parameters| `[k]`       |
use crate::array::Array;
use crate::error::{Error, Result};
use fenris_form::{Coefficient, Constant, Function, ValueShape};
use itertools::izip;
use log::trace;

/// The shape of the arrays that represent inputs described by the given template.
pub fn template_shape(template: &Coefficient) -> Vec<usize> {
    match template {
        Coefficient::Function(function) => vec![function.space().dim()],
        Coefficient::Constant(constant) => constant.shape().dims(),
        Coefficient::Expression(expression) => vec![expression.parameters().len()],
    }
}

/// Checks that an array has the shape required by a template.
pub fn check_input(template: &Coefficient, array: &Array) -> Result<()> {
    let expected = template_shape(template);
    if array.shape() != expected.as_slice() {
        return Err(Error::TypeCheck(format!(
            "{} template expects an array of shape {:?}, got shape {:?}",
            template.kind_name(),
            expected,
            array.shape()
        )));
    }
    Ok(())
}

/// Creates a new coefficient of the template's kind, with values taken from the array.
///
/// The new coefficient has a fresh identity, so it is never confused with the template or with
/// coefficients created in other calls.
pub fn array_to_coefficient(array: &Array, template: &Coefficient) -> Result<Coefficient> {
    check_input(template, array)?;
    let values = array.data().clone();
    let coefficient = match template {
        Coefficient::Function(function) => Function::from_values(function.space(), values)?.into(),
        Coefficient::Constant(constant) => Constant::from_values(constant.shape(), values)?.into(),
        Coefficient::Expression(expression) => expression.with_parameters(values)?.into(),
    };
    Ok(coefficient)
}

/// The array representation of a coefficient. The inverse of [`array_to_coefficient`].
pub fn coefficient_to_array(coefficient: &Coefficient) -> Array {
    match coefficient {
        Coefficient::Function(function) => Array::from_vector(function.values().clone()),
        Coefficient::Constant(constant) => match constant.shape() {
            ValueShape::Scalar => Array::scalar(constant.values()[0]),
            ValueShape::Vector(_) => Array::from_vector(constant.values().clone()),
        },
        Coefficient::Expression(expression) => Array::from_vector(expression.parameters().clone()),
    }
}

/// Converts all arrays into coefficients according to their templates.
pub fn convert_all(templates: &[Coefficient], args: &[Array]) -> Result<Vec<Coefficient>> {
    if templates.len() != args.len() {
        return Err(Error::TypeCheck(format!(
            "expected {} arguments, got {}",
            templates.len(),
            args.len()
        )));
    }
    trace!("Converting {} arrays to coefficients", args.len());
    izip!(templates, args)
        .map(|(template, array)| array_to_coefficient(array, template))
        .collect()
}
