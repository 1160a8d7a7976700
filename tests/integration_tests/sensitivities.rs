use super::{join_arrays, register_energy, sample_parameters, split_parameters, NUM_DOFS, NUM_PARAMETERS};
use fenris_autodiff::{Array, PrimitiveId, PrimitiveRegistry};
use fenris_optimize::calculus::approximate_gradient_fd;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::DVector;
use proptest::collection::vec;
use proptest::prelude::*;

fn energy_at(registry: &PrimitiveRegistry, id: PrimitiveId, parameters: &DVector<f64>) -> f64 {
    registry
        .bind(id, &split_parameters(parameters))
        .unwrap()
        .to_scalar()
        .unwrap()
}

fn energy_gradient_fd(registry: &PrimitiveRegistry, id: PrimitiveId, parameters: &DVector<f64>) -> DVector<f64> {
    let mut x = parameters.clone();
    approximate_gradient_fd(|p| energy_at(registry, id, &p.clone_owned()), &mut x, 1e-6)
}

#[test]
fn vjp_matches_finite_difference_gradient() {
    let mut registry = PrimitiveRegistry::new();
    let id = register_energy(&mut registry);
    let parameters = sample_parameters();

    let (output, vjp) = registry.vjp(id, &split_parameters(&parameters)).unwrap();
    assert_scalar_eq!(
        output.to_scalar().unwrap(),
        energy_at(&registry, id, &parameters),
        comp = abs,
        tol = 1e-14
    );

    let cotangents = vjp.apply(&Array::scalar(1.0)).unwrap();
    assert_eq!(cotangents[0].shape(), &[NUM_DOFS]);
    assert!(cotangents[1].is_scalar());
    assert_eq!(cotangents[2].shape(), &[2]);

    let gradient = join_arrays(&cotangents);
    let gradient_fd = energy_gradient_fd(&registry, id, &parameters);
    assert_matrix_eq!(gradient, gradient_fd, comp = abs, tol = 1e-7);
}

#[test]
fn jvp_matches_finite_difference_directional_derivative() {
    let mut registry = PrimitiveRegistry::new();
    let id = register_energy(&mut registry);
    let parameters = sample_parameters();
    let direction = DVector::from_fn(NUM_PARAMETERS, |i, _| ((i * 7) % 5) as f64 - 2.0);

    let (_, tangent) = registry
        .jvp(id, &split_parameters(&parameters), &split_parameters(&direction))
        .unwrap();
    let tangent_fd = energy_gradient_fd(&registry, id, &parameters).dot(&direction);
    assert_scalar_eq!(tangent.to_scalar().unwrap(), tangent_fd, comp = abs, tol = 1e-6);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn jvp_agrees_with_vjp(
        primals in vec(-1.0..1.0f64, NUM_PARAMETERS),
        tangents in vec(-1.0..1.0f64, NUM_PARAMETERS),
        g in -2.0..2.0f64,
    ) {
        let mut registry = PrimitiveRegistry::new();
        let id = register_energy(&mut registry);
        let primals = split_parameters(&DVector::from_vec(primals));
        let tangents = split_parameters(&DVector::from_vec(tangents));

        let (jvp_output, tangent) = registry.jvp(id, &primals, &tangents).unwrap();
        let (vjp_output, vjp) = registry.vjp(id, &primals).unwrap();
        prop_assert_eq!(&jvp_output, &vjp_output);

        // <g, J t> = <J^T g, t>
        let cotangents = vjp.apply(&Array::scalar(g)).unwrap();
        let mut pairing = 0.0;
        for (cotangent, tangent) in cotangents.iter().zip(&tangents) {
            pairing += cotangent.dot(tangent).unwrap();
        }
        let expected = g * tangent.to_scalar().unwrap();
        prop_assert!((pairing - expected).abs() < 1e-10 * (1.0 + expected.abs()),
            "pairing {} differs from {}", pairing, expected);
    }
}
