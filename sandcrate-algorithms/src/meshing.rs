//! Grid meshing with cached topology

use crate::grid::SceneGrid;
use sandcrate_core::{ColoredPoint3f, ColoredPointCloud3f, Error, GridMesh, QuadFace, Result, Rgba};
use std::sync::Arc;

/// Number of faces a `width` x `height` grid mesh carries
pub fn expected_face_count(width: usize, height: usize) -> usize {
    width.saturating_sub(2) * height.saturating_sub(2)
}

/// Face list of a grid mesh, valid for one pair of dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTopology {
    width: usize,
    height: usize,
    faces: Arc<[QuadFace]>,
}

impl MeshTopology {
    /// Connect each interior cell to the row above and the column before
    ///
    /// Every face winds `(x-1, y-1) -> (x, y-1) -> (x, y) -> (x-1, y)`, which
    /// gives normals pointing towards +Z once columns and rows are mapped
    /// to decreasing X and Y.
    ///
    /// # Arguments
    /// * `width` - Columns of the cropped scene grid
    /// * `height` - Rows of the cropped scene grid
    ///
    /// # Returns
    /// * `MeshTopology` - `(width - 2) * (height - 2)` quads, none for grids
    ///   narrower than three cells
    ///
    /// # Example
    /// ```rust
    /// use sandcrate_algorithms::MeshTopology;
    ///
    /// let topology = MeshTopology::build(4, 3);
    /// assert_eq!(topology.face_count(), 2);
    /// assert_eq!(topology.faces()[0], [0, 1, 5, 4]);
    /// assert_eq!(MeshTopology::build(2, 9).face_count(), 0);
    /// ```
    pub fn build(width: usize, height: usize) -> Self {
        let mut faces = Vec::with_capacity(expected_face_count(width, height));
        for y in 1..height.saturating_sub(1) {
            for x in 1..width.saturating_sub(1) {
                let i = y * width + x;
                let j = (y - 1) * width + x;
                faces.push([j - 1, j, i, i - 1]);
            }
        }

        Self {
            width,
            height,
            faces: faces.into(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn faces(&self) -> &Arc<[QuadFace]> {
        &self.faces
    }

    pub fn matches(&self, width: usize, height: usize) -> bool {
        self.width == width && self.height == height && self.faces.len() == expected_face_count(width, height)
    }
}

/// Turns scene grids into meshes or point clouds
///
/// Owns the topology cache of one pipeline instance. Topology is rebuilt
/// only when the grid dimensions change; otherwise vertices are rewritten in
/// place.
#[derive(Debug, Clone, Default)]
pub struct GeometryBuilder {
    topology: Option<MeshTopology>,
    rebuilds: usize,
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topology(&self) -> Option<&MeshTopology> {
        self.topology.as_ref()
    }

    /// Number of topology builds so far
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Topology for the given dimensions, rebuilt only if the cache differs
    pub fn rebuild_topology(&mut self, width: usize, height: usize) -> &MeshTopology {
        let topology = match self.topology.take() {
            Some(topology) if topology.matches(width, height) => topology,
            _ => {
                self.rebuilds += 1;
                log::debug!("Face remeshing for {}x{} grid", width, height);
                MeshTopology::build(width, height)
            }
        };
        self.topology.insert(topology)
    }

    /// Rewrite positions (and colors) of `mesh` without touching its faces
    ///
    /// Fails when the mesh, the cached topology and the grid do not all agree
    /// on dimensions; [`GeometryBuilder::update_mesh`] recovers from that by
    /// rebuilding.
    pub fn update_vertices(&self, mesh: &mut GridMesh, grid: &SceneGrid, with_colors: bool) -> Result<()> {
        let dims = (grid.width, grid.height);
        let topology = match &self.topology {
            Some(topology) if topology.matches(grid.width, grid.height) => topology,
            Some(topology) => {
                return Err(Error::TopologyMismatch {
                    expected: (topology.width, topology.height),
                    actual: dims,
                })
            }
            None => {
                return Err(Error::TopologyMismatch {
                    expected: (0, 0),
                    actual: dims,
                })
            }
        };

        if (mesh.width, mesh.height) != dims
            || !Arc::ptr_eq(&mesh.faces, &topology.faces)
            || grid.points.len() != grid.width * grid.height
        {
            return Err(Error::TopologyMismatch {
                expected: (mesh.width, mesh.height),
                actual: dims,
            });
        }

        mesh.vertices.clear();
        mesh.vertices.extend_from_slice(&grid.points);
        write_colors(mesh, grid, with_colors);
        Ok(())
    }

    /// Bring `mesh` up to date with `grid`, returning whether the topology
    /// had to be rebuilt
    pub fn update_mesh(&mut self, mesh: &mut GridMesh, grid: &SceneGrid, with_colors: bool) -> bool {
        match self.update_vertices(mesh, grid, with_colors) {
            Ok(()) => false,
            Err(e) => {
                log::debug!("Rebuilding mesh: {}", e);
                let faces = Arc::clone(self.rebuild_topology(grid.width, grid.height).faces());
                mesh.width = grid.width;
                mesh.height = grid.height;
                mesh.faces = faces;
                mesh.vertices.clear();
                mesh.vertices.extend_from_slice(&grid.points);
                write_colors(mesh, grid, with_colors);
                true
            }
        }
    }

    /// Build a fresh mesh for `grid`, reusing the cached topology if it fits
    pub fn build_mesh(&mut self, grid: &SceneGrid, with_colors: bool) -> GridMesh {
        let mut mesh = GridMesh::new();
        self.update_mesh(&mut mesh, grid, with_colors);
        mesh
    }

    /// Write one point per grid cell into `cloud`, reusing its allocation
    ///
    /// Cells without a color come out white.
    pub fn write_point_cloud(cloud: &mut ColoredPointCloud3f, grid: &SceneGrid) {
        cloud.clear();
        cloud.extend(grid.points.iter().enumerate().map(|(i, &position)| {
            let color = grid.colors.get(i).copied().unwrap_or(Rgba::WHITE);
            ColoredPoint3f::new(position, color)
        }));
    }

    pub fn build_point_cloud(grid: &SceneGrid) -> ColoredPointCloud3f {
        let mut cloud = ColoredPointCloud3f::with_capacity(grid.len());
        Self::write_point_cloud(&mut cloud, grid);
        cloud
    }
}

fn write_colors(mesh: &mut GridMesh, grid: &SceneGrid, with_colors: bool) {
    if with_colors && grid.colors.len() == grid.points.len() {
        let colors = mesh.colors.get_or_insert_with(Vec::new);
        colors.clear();
        colors.extend_from_slice(&grid.colors);
    } else {
        mesh.colors = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sandcrate_core::Point3f;

    fn flat_grid(width: usize, height: usize, z: f32) -> SceneGrid {
        let mut points = Vec::new();
        for y in 0..height {
            for x in 0..width {
                points.push(Point3f::new(-(x as f32), -(y as f32), z));
            }
        }
        SceneGrid {
            width,
            height,
            depths: vec![1000.0; width * height],
            colors: vec![Rgba::rgb(1, 2, 3); width * height],
            points,
        }
    }

    #[test]
    fn test_face_count_matches_dimensions() {
        for (w, h) in [(4, 4), (5, 3), (512, 424), (2, 9), (1, 1), (0, 0)] {
            let topology = MeshTopology::build(w, h);
            assert_eq!(topology.face_count(), expected_face_count(w, h));
        }
        assert_eq!(MeshTopology::build(4, 4).face_count(), 4);
        assert_eq!(MeshTopology::build(0, 7).face_count(), 0);
    }

    #[test]
    fn test_face_indices() {
        let topology = MeshTopology::build(4, 3);
        assert_eq!(&topology.faces()[..], &[[0, 1, 5, 4], [1, 2, 6, 5]]);
    }

    #[test]
    fn test_winding_faces_up() {
        let mut builder = GeometryBuilder::new();
        let mesh = builder.build_mesh(&flat_grid(6, 5, 2.0), false);
        assert_eq!(mesh.vertex_count(), 30);
        assert_eq!(mesh.face_count(), 12);

        for normal in mesh.to_triangle_mesh().calculate_face_normals() {
            assert_relative_eq!(normal.z, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_topology_reused_while_dimensions_hold() {
        let mut builder = GeometryBuilder::new();
        let mut mesh = GridMesh::new();

        assert!(builder.update_mesh(&mut mesh, &flat_grid(8, 6, 0.0), true));
        let faces = Arc::clone(&mesh.faces);
        let capacity = mesh.vertices.capacity();

        assert!(!builder.update_mesh(&mut mesh, &flat_grid(8, 6, 5.0), true));
        assert!(Arc::ptr_eq(&faces, &mesh.faces));
        assert_eq!(mesh.vertices.capacity(), capacity);
        assert_eq!(mesh.vertices[0].z, 5.0);
        assert_eq!(builder.rebuilds(), 1);
    }

    #[test]
    fn test_dimension_change_forces_rebuild() {
        let mut builder = GeometryBuilder::new();
        let mut mesh = builder.build_mesh(&flat_grid(8, 6, 0.0), true);

        let smaller = flat_grid(7, 6, 0.0);
        assert!(matches!(
            builder.update_vertices(&mut mesh, &smaller, true),
            Err(Error::TopologyMismatch { expected: (8, 6), actual: (7, 6) })
        ));

        assert!(builder.update_mesh(&mut mesh, &smaller, true));
        assert_eq!(mesh.face_count(), 20);
        assert_eq!(mesh.vertex_count(), 42);
        assert_eq!(builder.rebuilds(), 2);
    }

    #[test]
    fn test_foreign_mesh_is_rebuilt_not_patched() {
        let mut builder = GeometryBuilder::new();
        builder.rebuild_topology(4, 4);

        let mut stale = GridMesh {
            width: 4,
            height: 4,
            vertices: vec![Point3f::origin(); 16],
            faces: Arc::from(vec![[0, 1, 5, 4]]),
            colors: None,
        };
        assert!(builder.update_vertices(&mut stale, &flat_grid(4, 4, 0.0), false).is_err());
        builder.update_mesh(&mut stale, &flat_grid(4, 4, 0.0), false);
        assert_eq!(stale.face_count(), 4);
        assert_eq!(builder.rebuilds(), 1);
    }

    #[test]
    fn test_colors_follow_output_style() {
        let mut builder = GeometryBuilder::new();
        let colored = builder.build_mesh(&flat_grid(3, 3, 0.0), true);
        assert_eq!(colored.colors.as_ref().map(Vec::len), Some(9));

        let plain = builder.build_mesh(&flat_grid(3, 3, 0.0), false);
        assert!(plain.colors.is_none());
    }

    #[test]
    fn test_point_cloud_skips_topology() {
        let grid = flat_grid(5, 4, 1.0);
        let cloud = GeometryBuilder::build_point_cloud(&grid);
        assert_eq!(cloud.len(), 20);
        assert_eq!(cloud[7].position, grid.points[7]);
        assert_eq!(cloud[7].color, Rgba::rgb(1, 2, 3));

        let mut uncolored = grid.clone();
        uncolored.colors.clear();
        let cloud = GeometryBuilder::build_point_cloud(&uncolored);
        assert!(cloud.iter().all(|p| p.color == Rgba::WHITE));
    }
}
