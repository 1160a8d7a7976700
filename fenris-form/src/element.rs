//! Linear Lagrange elements on segments and triangles.
use crate::quadrature;
use eyre::eyre;
use fenris::element::{FiniteElement, FixedNodesReferenceFiniteElement, Segment2d1Element, Tri3d2Element};
use itertools::izip;
use nalgebra::{DMatrix, DVector};

/// Basis data evaluated at a single quadrature point of a physical element.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraturePoint {
    /// The quadrature weight multiplied by the absolute Jacobian determinant.
    pub weight: f64,
    /// The quadrature point mapped to physical coordinates.
    pub point: DVector<f64>,
    /// Basis function values, one per element node.
    pub basis: DVector<f64>,
    /// Physical basis gradients, stored column-wise (geometry dim x nodes).
    pub gradients: DMatrix<f64>,
}

/// Evaluates basis data at the points of a reference quadrature rule.
///
/// Both element types have the same reference and geometry dimension, so the physical gradients
/// are obtained from `J^{-T} G` with `G` the reference gradients.
macro_rules! quadrature_points_for_element {
    ($element:expr, $rule:expr) => {{
        let element = $element;
        let (weights, points) = $rule;
        izip!(weights, points)
            .map(|(w, xi)| -> eyre::Result<QuadraturePoint> {
                let jacobian = element.reference_jacobian(&xi);
                let jacobian_inv_t = jacobian
                    .try_inverse()
                    .ok_or_else(|| eyre!("Singular element Jacobian encountered"))?
                    .transpose();
                let gradients = jacobian_inv_t * element.gradients(&xi);
                Ok(QuadraturePoint {
                    weight: w * jacobian.determinant().abs(),
                    point: DVector::from_column_slice(element.map_reference_coords(&xi).coords.as_slice()),
                    basis: DVector::from_row_slice(element.evaluate_basis(&xi).as_slice()),
                    gradients: DMatrix::from_column_slice(gradients.nrows(), gradients.ncols(), gradients.as_slice()),
                })
            })
            .collect()
    }};
}

/// The geometric element of a mesh cell.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CellElement {
    Segment(Segment2d1Element<f64>),
    Triangle(Tri3d2Element<f64>),
}

impl CellElement {
    /// Basis data at the points of a quadrature rule which is exact for polynomials of degree
    /// `strength` on the reference element.
    pub fn quadrature_points(&self, strength: usize) -> eyre::Result<Vec<QuadraturePoint>> {
        match self {
            Self::Segment(segment) => quadrature_points_for_element!(segment, quadrature::segment(strength)),
            Self::Triangle(triangle) => quadrature_points_for_element!(triangle, quadrature::triangle(strength)?),
        }
    }
}
