//! Symbolic variational forms over low-order finite element spaces.
//!
//! Forms are built from expressions of coefficients ([`Function`], [`Constant`], [`Expression`]),
//! arguments (test and trial functions) and the spatial coordinate, integrated over the cells of
//! a [`Mesh`] with the measure [`dx`]. Forms can be differentiated symbolically with respect to
//! any coefficient with [`derivative`] and assembled into scalars, vectors or dense matrices with
//! [`assemble`].
//!
//! ```
//! # use fenris_form::{assemble, dx, grad, inner, Function, FunctionSpace, Mesh};
//! # use std::sync::Arc;
//! # fn main() -> eyre::Result<()> {
//! let mesh = Arc::new(Mesh::unit_square(4));
//! let space = FunctionSpace::lagrange(&mesh);
//! let u = Function::interpolate(&space, |x| x[0])?;
//!
//! // The Dirichlet energy of u(x) = x_1 over the unit square is 1/2
//! let energy = 0.5 * inner(grad(&u), grad(&u)) * dx(&mesh);
//! let value = assemble(&energy)?.as_scalar().unwrap();
//! assert!((value - 0.5).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```

pub mod assembly;
pub mod coefficient;
pub mod derivative;
pub mod element;
pub mod expr;
pub mod form;
pub mod mesh;
pub mod quadrature;
pub mod space;

pub use assembly::{assemble, Assembled};
pub use coefficient::{
    test_function, trial_function, Argument, Coefficient, CoefficientId, Constant, Expression, Function,
};
pub use derivative::{derivative, expand_derivatives};
pub use expr::{dot, grad, inner, spatial_coordinate, Expr, MathFunction};
pub use form::{dx, Form, Integral, Measure};
pub use mesh::{CellType, Mesh};
pub use space::{Family, FunctionSpace, ValueShape};

pub extern crate nalgebra;
