use super::{register_energy, split_parameters, NUM_PARAMETERS};
use fenris_autodiff::{Array, PrimitiveRegistry};
use nalgebra::DVector;
use proptest::collection::vec;
use proptest::prelude::*;

/// Stacks the arguments of each batch element into batched arguments.
fn stack_arguments(elements: &[Vec<Array>]) -> Vec<Array> {
    let num_args = elements[0].len();
    (0..num_args)
        .map(|j| {
            let column: Vec<Array> = elements.iter().map(|args| args[j].clone()).collect();
            Array::stack(&column).unwrap()
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn batched_evaluation_matches_independent_evaluations(
        parameters in vec(vec(-1.0..1.0f64, NUM_PARAMETERS), 1..4)
    ) {
        let mut registry = PrimitiveRegistry::new();
        let id = register_energy(&mut registry);

        let elements: Vec<Vec<Array>> = parameters
            .into_iter()
            .map(|p| split_parameters(&DVector::from_vec(p)))
            .collect();
        let batched_args = stack_arguments(&elements);
        let batch_axes = vec![Some(0); batched_args.len()];

        let (output, axis) = registry.batch(id, &batched_args, &batch_axes).unwrap();
        prop_assert_eq!(axis, 0);
        prop_assert_eq!(output.shape(), &[elements.len()]);

        for (i, args) in elements.iter().enumerate() {
            let expected = registry.bind(id, args).unwrap().to_scalar().unwrap();
            prop_assert_eq!(output.as_slice()[i], expected);
        }
    }
}
