use fenris_autodiff::{Array, DType, Error, ShapedArray};
use matrixcompare::assert_scalar_eq;
use nalgebra::DVector;
use proptest::prelude::*;

#[test]
fn scalar_array_has_empty_shape() {
    let a = Array::scalar(2.5);
    assert!(a.is_scalar());
    assert_eq!(a.shape(), &[] as &[usize]);
    assert_eq!(a.len(), 1);
    assert_eq!(a.to_scalar(), Some(2.5));
    assert_eq!(Array::from(2.5), a);
    assert_eq!(a.shaped(), ShapedArray::scalar());
    assert_eq!(a.shaped().dtype, DType::F64);
}

#[test]
fn vector_array_is_not_scalar() {
    let a = Array::from_vector(DVector::from_column_slice(&[1.0]));
    assert_eq!(a.shape(), &[1]);
    assert!(!a.is_scalar());
    assert_eq!(a.to_scalar(), None);
}

#[test]
fn from_shape_vec_checks_number_of_elements() {
    let a = Array::from_shape_vec(vec![2, 3], (0..6).map(f64::from).collect()).unwrap();
    assert_eq!(a.shape(), &[2, 3]);
    assert_eq!(a.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

    let result = Array::from_shape_vec(vec![2, 3], vec![0.0; 5]);
    assert!(matches!(result, Err(Error::TypeCheck(_))));
}

#[test]
fn reshape_preserves_data() {
    let a = Array::from_vector(DVector::from_column_slice(&[7.0]));
    let b = a.clone().reshape(Vec::new()).unwrap();
    assert_eq!(b.to_scalar(), Some(7.0));
    assert!(matches!(a.reshape(vec![2]), Err(Error::TypeCheck(_))));
}

#[test]
fn zeros_like_matches_shape() {
    let a = Array::from_shape_vec(vec![3, 1], vec![1.0, 2.0, 3.0]).unwrap();
    let z = a.zeros_like();
    assert_eq!(z.shape(), a.shape());
    assert!(z.as_slice().iter().all(|x| *x == 0.0));
}

#[test]
fn dot_and_scale() {
    let a = Array::from_vector(DVector::from_column_slice(&[1.0, 2.0, 3.0]));
    let b = Array::from_vector(DVector::from_column_slice(&[4.0, -1.0, 0.5]));
    assert_scalar_eq!(a.dot(&b).unwrap(), 3.5, comp = abs, tol = 1e-15);
    assert_scalar_eq!(a.clone().scale(2.0).dot(&b).unwrap(), 7.0, comp = abs, tol = 1e-15);
    assert!(a.dot(&Array::scalar(1.0)).is_err());
}

#[test]
fn stack_scalars_into_vector() {
    let stacked = Array::stack(&[Array::scalar(1.0), Array::scalar(2.0), Array::scalar(3.0)]).unwrap();
    assert_eq!(stacked.shape(), &[3]);
    assert_eq!(stacked.as_slice(), &[1.0, 2.0, 3.0]);
}

#[test]
fn stack_rejects_mismatched_or_empty_input() {
    let a = Array::zeros(vec![2]);
    let b = Array::zeros(vec![3]);
    assert!(matches!(Array::stack(&[a, b]), Err(Error::TypeCheck(_))));
    assert!(matches!(Array::stack(&[]), Err(Error::TypeCheck(_))));
}

#[test]
fn unstack_scalar_fails() {
    assert!(matches!(Array::scalar(1.0).unstack(), Err(Error::TypeCheck(_))));
}

proptest! {
    #[test]
    fn unstack_inverts_stack(rows in 1usize..5, cols in 0usize..4, seed in -100.0..100.0f64) {
        let arrays: Vec<Array> = (0..rows)
            .map(|i| {
                let data = (0..cols).map(|j| seed + (i * cols + j) as f64).collect();
                Array::from_shape_vec(vec![cols], data).unwrap()
            })
            .collect();
        let stacked = Array::stack(&arrays).unwrap();
        prop_assert_eq!(stacked.shape(), &[rows, cols]);
        prop_assert_eq!(stacked.unstack().unwrap(), arrays);
    }
}
