use crate::element::CellElement;
use eyre::eyre;
use fenris::connectivity::{Connectivity, Segment2d1Connectivity, Tri3d2Connectivity};
use fenris::element::ElementConnectivity;
use fenris::mesh::procedural::{create_rectangular_uniform_quad_mesh_2d, create_unit_square_uniform_tri_mesh_2d};
use fenris::mesh::TriangleMesh2d;
use itertools::Itertools;
use nalgebra::{DVector, Point1, Point2, Vector2, U1};
use serde::{Deserialize, Serialize};

/// The type of the cells in a [`Mesh`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    /// Line segments in one dimension.
    Segment,
    /// Triangles in two dimensions.
    Triangle,
}

impl CellType {
    pub fn vertices_per_cell(&self) -> usize {
        match self {
            Self::Segment => 2,
            Self::Triangle => 3,
        }
    }

    pub fn geometry_dim(&self) -> usize {
        match self {
            Self::Segment => 1,
            Self::Triangle => 2,
        }
    }
}

/// A mesh of line segments in one dimension.
pub type SegmentMesh1d = fenris::mesh::Mesh<f64, U1, Segment2d1Connectivity>;

/// A conforming simplicial mesh of segments or triangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mesh {
    Segment(SegmentMesh1d),
    Triangle(TriangleMesh2d<f64>),
}

impl Mesh {
    /// Construct a mesh from vertices and flat connectivity, with
    /// [`CellType::vertices_per_cell`] consecutive vertex indices per cell.
    ///
    /// Unlike many other places, the connectivity is always checked here: every vertex must
    /// have the dimension of the cell type, the connectivity must consist of whole cells and
    /// every index must be in bounds.
    pub fn from_vertices_and_connectivity(
        cell_type: CellType,
        vertices: Vec<DVector<f64>>,
        connectivity: Vec<usize>,
    ) -> eyre::Result<Self> {
        let dim = cell_type.geometry_dim();
        if let Some(vertex) = vertices.iter().find(|v| v.len() != dim) {
            return Err(eyre!(
                "vertex of dimension {} in a mesh of {:?} cells (expected dimension {})",
                vertex.len(),
                cell_type,
                dim
            ));
        }
        if connectivity.len() % cell_type.vertices_per_cell() != 0 {
            return Err(eyre!(
                "connectivity of length {} does not describe whole {:?} cells",
                connectivity.len(),
                cell_type
            ));
        }
        if let Some(index) = connectivity.iter().find(|&&idx| idx >= vertices.len()) {
            return Err(eyre!(
                "connectivity references vertex {} but the mesh only has {} vertices",
                index,
                vertices.len()
            ));
        }

        let mesh = match cell_type {
            CellType::Segment => {
                let vertices = vertices.iter().map(|v| Point1::new(v[0])).collect();
                let cells = connectivity
                    .into_iter()
                    .tuples()
                    .map(|(a, b)| Segment2d1Connectivity([a, b]))
                    .collect();
                Self::Segment(SegmentMesh1d::from_vertices_and_connectivity(vertices, cells))
            }
            CellType::Triangle => {
                let vertices = vertices.iter().map(|v| Point2::new(v[0], v[1])).collect();
                let cells = connectivity
                    .into_iter()
                    .tuples()
                    .map(|(a, b, c)| Tri3d2Connectivity([a, b, c]))
                    .collect();
                Self::Triangle(TriangleMesh2d::from_vertices_and_connectivity(vertices, cells))
            }
        };
        Ok(mesh)
    }

    /// A uniform mesh of the unit interval `[0, 1]` with `cells` segments.
    pub fn unit_interval(cells: usize) -> Self {
        Self::interval(cells, 0.0, 1.0)
    }

    /// A uniform mesh of the interval `[a, b]` with `cells` segments.
    pub fn interval(cells: usize, a: f64, b: f64) -> Self {
        if cells == 0 {
            return Self::Segment(SegmentMesh1d::from_vertices_and_connectivity(Vec::new(), Vec::new()));
        }
        let h = (b - a) / cells as f64;
        let vertices = (0..=cells).map(|i| Point1::new(a + h * i as f64)).collect();
        let cells = (0..cells)
            .map(|i| Segment2d1Connectivity([i, i + 1]))
            .collect();
        Self::Segment(SegmentMesh1d::from_vertices_and_connectivity(vertices, cells))
    }

    /// A uniform triangle mesh of the unit square `[0, 1]^2` with `cells_per_dim` quads in each
    /// direction, each split into two triangles.
    pub fn unit_square(cells_per_dim: usize) -> Self {
        Self::Triangle(create_unit_square_uniform_tri_mesh_2d(cells_per_dim))
    }

    /// A uniform triangle mesh of the axis-aligned rectangle spanned by `min` and `max`.
    ///
    /// The rectangle is divided into `cells_x * cells_y` quads which are each split into two
    /// counter-clockwise triangles. Vertices are ordered row by row, starting from the corner
    /// `(min.x, max.y)`.
    pub fn rectangle(cells_x: usize, cells_y: usize, min: &Vector2<f64>, max: &Vector2<f64>) -> Self {
        // Unit quads covering [0, cells_x] x [0, cells_y], scaled and translated into place
        let top_left = Vector2::new(0.0, cells_y as f64);
        let mut mesh = create_rectangular_uniform_quad_mesh_2d(1.0, cells_x, cells_y, 1, &top_left);
        let extents = max - min;
        let h = Vector2::new(extents.x / cells_x as f64, extents.y / cells_y as f64);
        mesh.transform_vertices(|v| v.coords = min + v.coords.component_mul(&h));
        Self::Triangle(mesh.split_into_triangles())
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            Self::Segment(_) => CellType::Segment,
            Self::Triangle(_) => CellType::Triangle,
        }
    }

    pub fn geometry_dim(&self) -> usize {
        self.cell_type().geometry_dim()
    }

    /// The coordinates of the given vertex.
    ///
    /// # Panics
    ///
    /// Panics if the vertex index is out of bounds.
    pub fn vertex(&self, index: usize) -> DVector<f64> {
        match self {
            Self::Segment(mesh) => DVector::from_column_slice(mesh.vertices()[index].coords.as_slice()),
            Self::Triangle(mesh) => DVector::from_column_slice(mesh.vertices()[index].coords.as_slice()),
        }
    }

    pub fn num_vertices(&self) -> usize {
        match self {
            Self::Segment(mesh) => mesh.vertices().len(),
            Self::Triangle(mesh) => mesh.vertices().len(),
        }
    }

    pub fn num_cells(&self) -> usize {
        match self {
            Self::Segment(mesh) => mesh.connectivity().len(),
            Self::Triangle(mesh) => mesh.connectivity().len(),
        }
    }

    /// The vertex indices of the given cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell index is out of bounds.
    pub fn cell_vertices(&self, cell_index: usize) -> &[usize] {
        match self {
            Self::Segment(mesh) => mesh.connectivity()[cell_index].vertex_indices(),
            Self::Triangle(mesh) => mesh.connectivity()[cell_index].vertex_indices(),
        }
    }

    /// The geometric element associated with the given cell, or `None` if the cell index is out
    /// of bounds.
    pub fn element(&self, cell_index: usize) -> Option<CellElement> {
        match self {
            Self::Segment(mesh) => mesh
                .connectivity()
                .get(cell_index)?
                .element(mesh.vertices())
                .map(CellElement::Segment),
            Self::Triangle(mesh) => mesh
                .connectivity()
                .get(cell_index)?
                .element(mesh.vertices())
                .map(CellElement::Triangle),
        }
    }
}
