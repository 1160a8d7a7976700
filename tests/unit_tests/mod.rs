use eyre::eyre;
use fenris_autodiff::FemValue;
use fenris_form::{assemble, dx, Coefficient, Constant, Expr, Function, FunctionSpace, Mesh};
use std::sync::Arc;

mod array;
mod eval;

/// Templates for a P1 function on a unit interval with two cells, and a scalar constant.
pub fn linear_templates() -> Vec<Coefficient> {
    let mesh = Arc::new(Mesh::unit_interval(2));
    let space = FunctionSpace::lagrange(&mesh);
    vec![Function::new(&space).into(), Constant::scalar(0.0).into()]
}

/// `F(u, c) = int c u dx`, which is linear in each of its inputs.
pub fn linear_functional(inputs: &[Coefficient]) -> eyre::Result<FemValue> {
    let u = inputs[0]
        .as_function()
        .ok_or_else(|| eyre!("first input must be a Function"))?;
    let c = &inputs[1];
    let form = Expr::from(c) * Expr::from(u) * dx(u.space().mesh());
    Ok(FemValue::from((assemble(&form)?, form)))
}
