//! Differentiable finite element assembly for array-based automatic differentiation.
//!
//! `fenris-autodiff` turns functions that assemble a scalar from a variational form into
//! differentiable primitives. A wrapped function receives finite element coefficients (created
//! from plain arrays according to a list of templates) and returns the assembled scalar together
//! with the [`Form`](fenris_form::Form) it was assembled from. Sensitivities are then obtained by
//! symbolically differentiating the form and assembling the result:
//!
//! - reverse mode ([`vjp_assemble_eval`]): one gradient array per input, scaled by the output
//!   cotangent;
//! - forward mode ([`jvp_assemble_eval`]): the directional derivative along a set of tangents.
//!
//! Wrapped functions are registered as [`Primitive`]s in a [`PrimitiveRegistry`] with
//! [`register_assemble`].

pub mod array;
pub mod convert;
pub mod error;
pub mod eval;
pub mod jvp;
pub mod primitive;
pub mod value;
pub mod vjp;

pub use array::{Array, DType, ShapedArray};
pub use convert::{array_to_coefficient, check_input, coefficient_to_array, convert_all, template_shape};
pub use error::{Error, Result};
pub use eval::{assemble_eval, Evaluation};
pub use jvp::jvp_assemble_eval;
pub use primitive::{register_assemble, AssemblePrimitive, Primitive, PrimitiveId, PrimitiveRegistry};
pub use value::FemValue;
pub use vjp::{vjp_assemble_eval, vjp_assemble_impl, DifferentiableInput, Vjp};

pub extern crate fenris_form;
pub extern crate nalgebra;
