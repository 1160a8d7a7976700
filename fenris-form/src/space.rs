use crate::mesh::Mesh;
use std::sync::Arc;

/// The value shape of a function space or a constant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueShape {
    Scalar,
    Vector(usize),
}

impl ValueShape {
    /// The number of components of a value of this shape.
    pub fn size(&self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector(n) => *n,
        }
    }

    /// The shape as an array shape, i.e. `[]` for scalars and `[n]` for vectors.
    pub fn dims(&self) -> Vec<usize> {
        match self {
            Self::Scalar => Vec::new(),
            Self::Vector(n) => vec![*n],
        }
    }
}

/// The family of finite elements that a [`FunctionSpace`] is built from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Family {
    /// Continuous, piecewise linear scalar functions with one degree of freedom per vertex.
    Lagrange,
    /// Functions which are constant over the whole domain, with one degree of freedom per
    /// component of the value shape.
    Real(ValueShape),
}

/// A finite element function space over a mesh.
///
/// Spaces are shared through [`Arc`], and two spaces are considered the same space only if they
/// are the same allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpace {
    mesh: Arc<Mesh>,
    family: Family,
}

impl FunctionSpace {
    /// The space of continuous piecewise linear functions on the given mesh.
    pub fn lagrange(mesh: &Arc<Mesh>) -> Arc<Self> {
        Arc::new(Self {
            mesh: Arc::clone(mesh),
            family: Family::Lagrange,
        })
    }

    /// The space of global constants of the given shape on the given mesh.
    pub fn real(mesh: &Arc<Mesh>, shape: ValueShape) -> Arc<Self> {
        Arc::new(Self {
            mesh: Arc::clone(mesh),
            family: Family::Real(shape),
        })
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn value_shape(&self) -> ValueShape {
        match self.family {
            Family::Lagrange => ValueShape::Scalar,
            Family::Real(shape) => shape,
        }
    }

    /// The number of global degrees of freedom.
    pub fn dim(&self) -> usize {
        match self.family {
            Family::Lagrange => self.mesh.num_vertices(),
            Family::Real(shape) => shape.size(),
        }
    }

    /// The global degrees of freedom associated with a cell, in local order.
    pub fn populate_cell_dofs(&self, output: &mut Vec<usize>, cell_index: usize) {
        output.clear();
        match self.family {
            Family::Lagrange => output.extend_from_slice(self.mesh.cell_vertices(cell_index)),
            Family::Real(shape) => output.extend(0..shape.size()),
        }
    }
}
