use eyre::eyre;
use fenris_autodiff::{register_assemble, Array, FemValue, PrimitiveId, PrimitiveRegistry};
use fenris_form::{
    assemble, dx, grad, inner, spatial_coordinate, Coefficient, Constant, Expr, Function, FunctionSpace, Mesh,
};
use nalgebra::DVector;
use std::sync::Arc;

mod batching;
mod sensitivities;

/// Number of degrees of freedom of the P1 space on the unit square with 2x2 cells.
pub const NUM_DOFS: usize = 9;

/// Total number of scalar parameters of the energy: the function values, the scalar
/// stiffness and the two components of the drift vector.
pub const NUM_PARAMETERS: usize = NUM_DOFS + 3;

pub fn energy_templates() -> Vec<Coefficient> {
    let mesh = Arc::new(Mesh::unit_square(2));
    let space = FunctionSpace::lagrange(&mesh);
    vec![
        Function::new(&space).into(),
        Constant::scalar(1.0).into(),
        Constant::vector(DVector::zeros(2)).into(),
    ]
}

/// A nonlinear energy in a scalar field `u`, a stiffness `k` and a drift vector `b`.
pub fn energy(inputs: &[Coefficient]) -> eyre::Result<FemValue> {
    let function = inputs[0]
        .as_function()
        .ok_or_else(|| eyre!("first input must be a Function"))?;
    let mesh = function.space().mesh();
    let u = Expr::from(function);
    let k = Expr::from(&inputs[1]);
    let b = Expr::from(&inputs[2]);
    let x = spatial_coordinate();

    let integrand = 0.5 * k * (1.0 + u.clone() * u.clone()) * inner(grad(&u), grad(&u))
        + inner(b, grad(&u))
        + u.clone().sin()
        - x.at(0) * u;
    let form = integrand * dx(mesh).with_quadrature_degree(6);
    Ok(FemValue::from((assemble(&form)?, form)))
}

pub fn register_energy(registry: &mut PrimitiveRegistry) -> PrimitiveId {
    register_assemble(registry, energy_templates(), energy)
}

/// Splits a flat parameter vector into the arguments of the energy.
pub fn split_parameters(parameters: &DVector<f64>) -> Vec<Array> {
    assert_eq!(parameters.len(), NUM_PARAMETERS);
    vec![
        Array::from_vector(parameters.rows(0, NUM_DOFS).into_owned()),
        Array::scalar(parameters[NUM_DOFS]),
        Array::from_vector(parameters.rows(NUM_DOFS + 1, 2).into_owned()),
    ]
}

/// Concatenates per-input arrays into a flat vector, the inverse of [`split_parameters`].
pub fn join_arrays(arrays: &[Array]) -> DVector<f64> {
    DVector::from_iterator(
        NUM_PARAMETERS,
        arrays.iter().flat_map(|array| array.as_slice().iter().copied()),
    )
}

pub fn sample_parameters() -> DVector<f64> {
    let mut parameters = DVector::from_fn(NUM_PARAMETERS, |i, _| 0.1 * (i as f64) - 0.4);
    parameters[NUM_DOFS] = 1.3;
    parameters
}
