use fenris_form::derivative::gateaux;
use fenris_form::{
    assemble, derivative, dx, expand_derivatives, grad, inner, spatial_coordinate, test_function, trial_function,
    Coefficient, Constant, Expr, Form, Function, FunctionSpace, Mesh, ValueShape,
};
use fenris_optimize::calculus::{approximate_gradient_fd, approximate_jacobian_fd};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DVector, DVectorSlice};
use std::sync::Arc;

fn nonlinear_energy(u: &Function, mesh: &Arc<Mesh>) -> Form {
    let x = spatial_coordinate();
    let f = x.clone().at(0).sin() + x.at(1);
    let u = Expr::from(u);
    let integrand = 0.5 * inner(grad(&u), grad(&u)) + 0.25 * u.clone().powf(4.0) - f * u.clone()
        + (1.0 + u.clone() * u.clone()).sqrt()
        + u.clone().exp() / (2.0 + u.clone().cos());
    integrand * dx(mesh).with_quadrature_degree(6)
}

fn initial_values(space: &Arc<FunctionSpace>) -> Function {
    Function::interpolate(space, |x| 0.3 * x[0] - 0.7 * x[1] * x[1] + 0.1).unwrap()
}

fn assemble_energy_at(space: &Arc<FunctionSpace>, mesh: &Arc<Mesh>, values: &DVector<f64>) -> f64 {
    let u = Function::from_values(space, values.clone()).unwrap();
    assemble(&nonlinear_energy(&u, mesh)).unwrap().as_scalar().unwrap()
}

#[test]
fn derivative_of_energy_matches_finite_differences() {
    let mesh = Arc::new(Mesh::unit_square(2));
    let space = FunctionSpace::lagrange(&mesh);
    let u = initial_values(&space);

    let energy = nonlinear_energy(&u, &mesh);
    let residual = derivative(&energy, &Coefficient::from(u.clone()), test_function(&space));
    let residual = assemble(&residual).unwrap().as_vector().unwrap().clone();

    let mut x = u.values().clone();
    let residual_fd = approximate_gradient_fd(|x| assemble_energy_at(&space, &mesh, &x.clone_owned()), &mut x, 1e-6);
    assert_matrix_eq!(residual, residual_fd, comp = abs, tol = 1e-7);
}

#[test]
fn second_derivative_of_energy_matches_finite_differences() {
    let mesh = Arc::new(Mesh::unit_square(2));
    let space = FunctionSpace::lagrange(&mesh);
    let u = initial_values(&space);
    let u_coefficient = Coefficient::from(u.clone());

    let energy = nonlinear_energy(&u, &mesh);
    let residual = derivative(&energy, &u_coefficient, test_function(&space));
    let jacobian = derivative(&residual, &u_coefficient, trial_function(&space));
    let jacobian = assemble(&jacobian).unwrap().as_matrix().unwrap().clone();

    let n = space.dim();
    let jacobian_fd = approximate_jacobian_fd(
        n,
        |x, mut r| {
            let u = Function::from_values(&space, x.clone_owned()).unwrap();
            let form = derivative(&nonlinear_energy(&u, &mesh), &Coefficient::from(u), test_function(&space));
            r.copy_from(assemble(&form).unwrap().as_vector().unwrap());
        },
        &mut u.values().clone(),
        1e-6,
    );
    assert_matrix_eq!(jacobian, jacobian_fd, comp = abs, tol = 1e-6);
    assert_matrix_eq!(jacobian, jacobian.transpose(), comp = abs, tol = 1e-10);
}

#[test]
fn directional_derivative_with_respect_to_constant() {
    let mesh = Arc::new(Mesh::unit_interval(4));
    let space = FunctionSpace::lagrange(&mesh);
    let u = Function::interpolate(&space, |x| 1.0 + x[0]).unwrap();
    let c = Constant::scalar(1.5);

    // d/dc int u^c dx = int u^c ln(u) dx
    let form = Expr::from(&u).pow(&c) * dx(&mesh).with_quadrature_degree(8);
    let real_space = FunctionSpace::real(&mesh, ValueShape::Scalar);
    let df = derivative(&form, &Coefficient::from(c.clone()), test_function(&real_space));
    let df = assemble(&df).unwrap().as_vector().unwrap().clone();
    assert_eq!(df.len(), 1);

    let f_at = |c: DVectorSlice<f64>| {
        let c = Constant::scalar(c[0]);
        let form = Expr::from(&u).pow(&c) * dx(&mesh).with_quadrature_degree(8);
        assemble(&form).unwrap().as_scalar().unwrap()
    };
    let df_fd = approximate_gradient_fd(f_at, &mut c.values().clone(), 1e-6);
    assert_matrix_eq!(df, df_fd, comp = abs, tol = 1e-8);
}

#[test]
fn derivative_with_respect_to_vector_constant() {
    let mesh = Arc::new(Mesh::unit_square(2));
    let k = Constant::vector(DVector::from_column_slice(&[2.0, -1.0]));
    let x = spatial_coordinate();
    // int (k . x)^2 dx, whose gradient with respect to k is int 2 (k . x) x dx
    let form = inner(&k, x.clone()).powf(2.0) * dx(&mesh);

    let real_space = FunctionSpace::real(&mesh, ValueShape::Vector(2));
    let df = derivative(&form, &Coefficient::from(k.clone()), test_function(&real_space));
    let df = assemble(&df).unwrap().as_vector().unwrap().clone();

    // int x^2 = int y^2 = 1/3, int xy = 1/4 over the unit square
    let expected = DVector::from_column_slice(&[
        2.0 * (2.0 / 3.0 - 1.0 / 4.0),
        2.0 * (2.0 / 4.0 - 1.0 / 3.0),
    ]);
    assert_matrix_eq!(df, expected, comp = abs, tol = 1e-12);
}

#[test]
fn derivative_of_independent_form_vanishes() {
    let mesh = Arc::new(Mesh::unit_square(2));
    let space = FunctionSpace::lagrange(&mesh);
    let u = Function::new(&space);
    let c = Constant::scalar(2.0);

    let form = Expr::from(&c) * spatial_coordinate().at(0) * dx(&mesh);
    let df = derivative(&form, &Coefficient::from(u), test_function(&space));
    // The derivative is recorded lazily, but vanishes on expansion
    assert!(!df.is_empty());
    assert!(expand_derivatives(&df).is_empty());

    let assembled = assemble(&df).unwrap();
    assert_eq!(assembled.as_vector().unwrap(), &DVector::zeros(space.dim()));
}

#[test]
fn derivative_in_zero_direction_is_empty() {
    let mesh = Arc::new(Mesh::unit_interval(2));
    let u = Function::new(&FunctionSpace::lagrange(&mesh));
    let form = Expr::from(&u) * dx(&mesh);
    assert!(derivative(&form, &Coefficient::from(u), Expr::Zero).is_empty());
}

#[test]
fn directional_derivative_along_function() {
    let mesh = Arc::new(Mesh::unit_interval(3));
    let space = FunctionSpace::lagrange(&mesh);
    let u = Function::interpolate(&space, |x| x[0]).unwrap();
    let w = Function::interpolate(&space, |_| 1.0).unwrap();

    // d/du int u^2 dx in direction w = int 2 u w dx = 1
    let form = Expr::from(&u).powf(2.0) * dx(&mesh);
    let df = derivative(&form, &Coefficient::from(u), &w);
    let value = assemble(&df).unwrap().as_scalar().unwrap();
    assert_scalar_eq!(value, 1.0, comp = abs, tol = 1e-13);
}

#[test]
fn gateaux_eliminates_structural_zeros() {
    let mesh = Arc::new(Mesh::unit_interval(1));
    let space = FunctionSpace::lagrange(&mesh);
    let u = Function::new(&space);
    let v = test_function(&space);

    assert!(gateaux(&Expr::literal(3.0), u.id(), &v).is_zero());
    assert!(gateaux(&spatial_coordinate(), u.id(), &v).is_zero());
    assert!(gateaux(&(spatial_coordinate().at(0).sin() * 2.0), u.id(), &v).is_zero());

    let du = gateaux(&Expr::from(&u), u.id(), &v);
    assert_eq!(du.arguments().len(), 1);
    assert!(!du.depends_on(u.id()));
}
