//! Quadrature rules for the reference segment and the reference triangle.
//!
//! The rules are provided by `fenris-quadrature` and converted to `nalgebra` points here. The
//! reference segment is `[-1, 1]` and the reference triangle has corners `(-1, -1)`, `(1, -1)`
//! and `(-1, 1)`, matching the reference elements used by `fenris`.
use fenris_quadrature::{polyquad, univariate, Rule};
use nalgebra::{Point1, Point2};

pub type QuadraturePair1d = (Vec<f64>, Vec<Point1<f64>>);
pub type QuadraturePair2d = (Vec<f64>, Vec<Point2<f64>>);

fn convert_rule<const D: usize>((weights, points): Rule<D>) -> (Vec<f64>, Vec<nalgebra::Point<f64, D>>) {
    let points = points.into_iter().map(nalgebra::Point::from).collect();
    (weights, points)
}

/// A Gauss rule on the reference segment that integrates polynomials of degree `strength`
/// exactly.
pub fn segment(strength: usize) -> QuadraturePair1d {
    convert_rule(univariate::gauss(strength / 2 + 1))
}

/// A rule on the reference triangle that integrates polynomials of total degree `strength`
/// exactly.
///
/// Returns an error if no rule of the given strength is available.
pub fn triangle(strength: usize) -> eyre::Result<QuadraturePair2d> {
    Ok(convert_rule(polyquad::triangle(strength)?))
}
