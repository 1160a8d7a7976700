use super::{linear_functional, linear_templates};
use eyre::eyre;
use fenris_autodiff::{assemble_eval, Array, Error, FemValue};
use fenris_form::{assemble, dx, Assembled, Coefficient, Expr, Mesh};
use matrixcompare::assert_scalar_eq;
use nalgebra::DVector;
use std::sync::Arc;

fn linear_args() -> Vec<Array> {
    vec![Array::from_vector(DVector::from_element(3, 1.0)), Array::scalar(2.0)]
}

fn unit_form() -> fenris_form::Form {
    Expr::literal(1.0) * dx(&Arc::new(Mesh::unit_interval(1)))
}

fn assert_contract_violation(function: impl Fn(&[Coefficient]) -> eyre::Result<FemValue>) {
    let result = assemble_eval(&function, &linear_templates(), &linear_args());
    assert!(
        matches!(result, Err(Error::ContractViolation { .. })),
        "expected contract violation, got {:?}",
        result
    );
}

#[test]
fn assemble_eval_returns_scalar_output_and_inputs() {
    let evaluation = assemble_eval(&linear_functional, &linear_templates(), &linear_args()).unwrap();
    assert!(evaluation.output.is_scalar());
    assert_scalar_eq!(evaluation.output.to_scalar().unwrap(), 2.0, comp = abs, tol = 1e-14);
    assert_eq!(evaluation.inputs.len(), 2);
    assert_eq!(evaluation.inputs[1].as_constant().unwrap().value(), Some(2.0));
    assert!(!evaluation.form.is_empty());
}

#[test]
fn non_tuple_output_is_rejected() {
    assert_contract_violation(|_| Ok(FemValue::from(1.0)));
    assert_contract_violation(|_| Ok(FemValue::from(unit_form())));
}

#[test]
fn two_scalars_are_rejected() {
    assert_contract_violation(|_| Ok(FemValue::from((1.0, 2.0))));
}

#[test]
fn multiple_outputs_are_rejected() {
    assert_contract_violation(|_| {
        let form = unit_form();
        Ok(FemValue::from(((1.0, 2.0), form)))
    });
}

#[test]
fn tuples_of_other_lengths_are_rejected() {
    assert_contract_violation(|_| {
        let form = unit_form();
        Ok(FemValue::Tuple(vec![1.0.into(), form.clone().into(), form.into()]))
    });
    assert_contract_violation(|_| Ok(FemValue::Tuple(vec![1.0.into()])));
    assert_contract_violation(|_| Ok(FemValue::Tuple(Vec::new())));
}

#[test]
fn non_scalar_first_element_is_rejected() {
    let result = assemble_eval(
        &|_: &[Coefficient]| {
            let vector = Assembled::Vector(DVector::zeros(2));
            Ok(FemValue::from((vector, unit_form())))
        },
        &[],
        &[],
    );
    match result {
        Err(Error::ContractViolation { found, .. }) => assert_eq!(found, "vector of length 2"),
        other => panic!("expected contract violation, got {:?}", other),
    }
}

#[test]
fn non_form_second_element_is_rejected() {
    let result = assemble_eval(
        &|inputs: &[Coefficient]| Ok(FemValue::from((1.0, inputs[0].clone()))),
        &linear_templates(),
        &linear_args(),
    );
    match result {
        Err(Error::ContractViolation { found, .. }) => assert_eq!(found, "Function"),
        other => panic!("expected contract violation, got {:?}", other),
    }
}

#[test]
fn errors_from_wrapped_function_are_propagated() {
    let result = assemble_eval(
        &|_: &[Coefficient]| -> eyre::Result<FemValue> { Err(eyre!("solver diverged")) },
        &[],
        &[],
    );
    match result {
        Err(Error::Fem(report)) => assert!(report.to_string().contains("solver diverged")),
        other => panic!("expected finite element error, got {:?}", other),
    }
}

#[test]
fn wrong_argument_count_is_a_type_error() {
    let result = assemble_eval(&linear_functional, &linear_templates(), &[Array::scalar(2.0)]);
    assert!(matches!(result, Err(Error::TypeCheck(_))));
}

#[test]
fn evaluation_uses_assembled_value_of_returned_form() {
    let result = assemble_eval(
        &|_: &[Coefficient]| {
            let form = unit_form();
            Ok(FemValue::from((assemble(&form)?, form)))
        },
        &[],
        &[],
    )
    .unwrap();
    assert_eq!(result.output, Array::scalar(1.0));
}
