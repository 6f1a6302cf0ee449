//! Mesh data structures and functionality

use crate::color::Rgba;
use crate::point::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A quad face as four vertex indices in winding order
pub type QuadFace = [usize; 4];

/// A mesh over a regular vertex grid with quad faces
///
/// Faces are shared behind an [`Arc`] so the same topology can back many
/// frames' worth of vertex positions without being copied.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMesh {
    pub width: usize,
    pub height: usize,
    pub vertices: Vec<Point3f>,
    pub faces: Arc<[QuadFace]>,
    pub colors: Option<Vec<Rgba>>,
}

/// A triangle mesh with vertices and faces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub colors: Option<Vec<Rgba>>,
}

impl GridMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            vertices: Vec::new(),
            faces: Arc::from(Vec::new()),
            colors: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Split every quad into two triangles keeping the winding order
    pub fn to_triangle_mesh(&self) -> TriangleMesh {
        let faces = self
            .faces
            .iter()
            .flat_map(|&[a, b, c, d]| [[a, b, c], [a, c, d]])
            .collect();

        TriangleMesh {
            vertices: self.vertices.clone(),
            faces,
            colors: self.colors.clone(),
        }
    }
}

impl Default for GridMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            colors: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Calculate face normals
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];

                let edge1 = v1 - v0;
                let edge2 = v2 - v0;

                edge1.cross(&edge2).normalize()
            })
            .collect()
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}
