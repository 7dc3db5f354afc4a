//! CPU-side scene graph: at most one heightmap mesh, one reference grid and
//! the camera. The GPU side mirrors whatever is here.

use glam::{Mat4, Vec3};
use tracing::{info, warn};

use crate::config::Params;
use crate::mesh::HeightMesh;
use crate::renderer::Camera;

/// Width in world units of a mesh placed without a `Scale` parameter.
pub const DEFAULT_MESH_EXTENT: f32 = 10.0;
/// Height of a fully white pixel when placed without a `Scale` parameter.
pub const DEFAULT_HEIGHT_SCALE: f32 = 0.5;
/// Grid extent used while no mesh is loaded.
pub const DEFAULT_GRID_EXTENT: u32 = 10;

/// Model transform of the heightmap mesh.
///
/// Vertices stay in pixel space; the placement centers the grid of pixels on
/// the origin and scales it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshPlacement {
    pub horizontal: f32,
    pub vertical: f32,
    /// Offset in pixel units applied before scaling.
    pub center: Vec3,
}

impl MeshPlacement {
    pub fn for_mesh(mesh: &HeightMesh, params: &Params) -> Self {
        let (horizontal, vertical) = match params.scale() {
            Some(scale) => (scale, scale),
            None => (
                DEFAULT_MESH_EXTENT / mesh.width.max(1) as f32,
                DEFAULT_HEIGHT_SCALE,
            ),
        };

        Self {
            horizontal,
            vertical,
            center: Vec3::new(-(mesh.width as f32) / 2.0, 0.0, -(mesh.height as f32) / 2.0),
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale(Vec3::new(self.horizontal, self.vertical, self.horizontal))
            * Mat4::from_translation(self.center)
    }

    /// Normal transform for a diagonal scale: inverse transpose.
    pub fn normal_matrix(&self) -> Mat4 {
        self.model_matrix().inverse().transpose()
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.model_matrix().transform_point3(p)
    }

    pub fn transform_normal(&self, n: Vec3) -> Vec3 {
        self.normal_matrix().transform_vector3(n).normalize_or(Vec3::Y)
    }
}

#[derive(Clone, Debug)]
pub struct SceneMesh {
    pub mesh: HeightMesh,
    pub placement: MeshPlacement,
}

impl SceneMesh {
    /// World-space copy of the mesh, the way it is drawn.
    pub fn world_mesh(&self) -> HeightMesh {
        let mut out = self.mesh.clone();
        for chunk in out.vertices.chunks_exact_mut(3) {
            let p = self.placement.transform_point(Vec3::from_slice(chunk));
            chunk.copy_from_slice(&p.to_array());
        }
        for chunk in out.normals.chunks_exact_mut(3) {
            let n = self.placement.transform_normal(Vec3::from_slice(chunk));
            chunk.copy_from_slice(&n.to_array());
        }
        out
    }

    /// Horizontal world extent of the source raster.
    pub fn world_size(&self) -> (f32, f32) {
        (
            self.mesh.width as f32 * self.placement.horizontal,
            self.mesh.height as f32 * self.placement.horizontal,
        )
    }
}

/// Square line grid on the XZ plane, centered at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub size: f32,
    pub divisions: u32,
}

impl Grid {
    pub fn new(size: f32, divisions: u32) -> Self {
        Self {
            size,
            divisions: divisions.max(1),
        }
    }

    /// Sizes the grid from the cell-size control (thousandths of a unit).
    ///
    /// The extent is the loaded mesh's larger side rounded up to whole units,
    /// or [`DEFAULT_GRID_EXTENT`] without a mesh.
    pub fn for_cell_size(cell_size: u32, mesh: Option<&SceneMesh>) -> Self {
        let cell = cell_size.max(1) as f32 * 0.001;
        let extent = mesh
            .map(|m| {
                let (w, h) = m.world_size();
                w.max(h).ceil()
            })
            .filter(|e| *e > 0.0)
            .unwrap_or(DEFAULT_GRID_EXTENT as f32);

        Self::new(extent, (extent / cell).ceil() as u32)
    }

    /// Line-list vertices, two per line, three floats per vertex.
    pub fn vertices(&self) -> Vec<f32> {
        generate_grid_vertices(self.size, self.divisions)
    }
}

pub fn generate_grid_vertices(size: f32, divisions: u32) -> Vec<f32> {
    let divisions = divisions.max(1);
    let mut vertices = Vec::with_capacity((divisions as usize + 1) * 12);
    let half = size / 2.0;
    let step = size / divisions as f32;

    for i in 0..=divisions {
        let pos = -half + i as f32 * step;
        vertices.extend_from_slice(&[pos, 0.0, -half, pos, 0.0, half]);
        vertices.extend_from_slice(&[-half, 0.0, pos, half, 0.0, pos]);
    }

    vertices
}

pub struct Scene {
    mesh: Option<SceneMesh>,
    grid: Option<Grid>,
    pub camera: Camera,
    generation: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            mesh: None,
            grid: None,
            camera: Camera::default(),
            generation: 0,
        }
    }

    pub fn mesh(&self) -> Option<&SceneMesh> {
        self.mesh.as_ref()
    }

    pub fn grid(&self) -> Option<Grid> {
        self.grid
    }

    /// Bumped on every mesh or grid change so the GPU side knows to re-upload.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Detaches the current mesh, if any, then attaches `mesh`.
    pub fn replace_mesh(&mut self, mesh: HeightMesh, placement: MeshPlacement) {
        self.remove_mesh();
        info!(
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "mesh attached"
        );
        self.mesh = Some(SceneMesh { mesh, placement });
        self.generation += 1;
    }

    pub fn remove_mesh(&mut self) -> Option<SceneMesh> {
        let old = self.mesh.take();
        if old.is_some() {
            info!("previous mesh detached");
            self.generation += 1;
        }
        old
    }

    /// Re-places the current mesh, e.g. after the parameters change.
    pub fn set_placement(&mut self, placement: MeshPlacement) {
        match &mut self.mesh {
            Some(m) => {
                m.placement = placement;
                self.generation += 1;
            }
            None => warn!("no mesh to place"),
        }
    }

    /// Replaces any existing grid.
    pub fn create_grid(&mut self, size: f32, divisions: u32) {
        self.grid = Some(Grid::new(size, divisions));
        self.generation += 1;
    }

    pub fn update_camera(&mut self, position: Vec3, look_at: Vec3) {
        self.camera.position = position;
        self.camera.look_at = look_at;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width as f32, height as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshBuilder, RasterImage};

    fn sample_mesh(w: u32, h: u32) -> HeightMesh {
        MeshBuilder::new().build(&RasterImage::from_fn(w, h, |_, _| [255, 255, 255, 255]))
    }

    #[test]
    fn replacing_keeps_one_mesh() {
        let mut scene = Scene::new();
        let params = Params::default();

        let first = sample_mesh(2, 2);
        let placement = MeshPlacement::for_mesh(&first, &params);
        scene.replace_mesh(first, placement);

        let second = sample_mesh(3, 3);
        let placement = MeshPlacement::for_mesh(&second, &params);
        scene.replace_mesh(second, placement);

        assert_eq!(scene.mesh().unwrap().mesh.width, 3);
        assert!(scene.remove_mesh().is_some());
        assert!(scene.mesh().is_none());
        assert!(scene.remove_mesh().is_none());
    }

    #[test]
    fn default_placement_is_ten_units_wide_and_centered() {
        let mesh = sample_mesh(20, 10);
        let placement = MeshPlacement::for_mesh(&mesh, &Params::default());

        let corner = placement.transform_point(Vec3::new(0.0, 1.0, 0.0));
        assert!((corner - Vec3::new(-5.0, 0.5, -2.5)).length() < 1e-5);

        let far = placement.transform_point(Vec3::new(20.0, 0.0, 10.0));
        assert!((far - Vec3::new(5.0, 0.0, 2.5)).length() < 1e-5);
    }

    #[test]
    fn scale_param_is_uniform() {
        let mesh = sample_mesh(4, 4);
        let params = Params::from_json(r#"{"Scale": 2}"#).unwrap();
        let placement = MeshPlacement::for_mesh(&mesh, &params);

        assert_eq!(placement.horizontal, 2.0);
        assert_eq!(placement.vertical, 2.0);
        let p = placement.transform_point(Vec3::new(4.0, 1.0, 4.0));
        assert!((p - Vec3::new(4.0, 2.0, 4.0)).length() < 1e-5);
    }

    #[test]
    fn world_mesh_keeps_topology() {
        let mesh = sample_mesh(3, 3);
        let scene_mesh = SceneMesh {
            placement: MeshPlacement::for_mesh(&mesh, &Params::default()),
            mesh,
        };
        let world = scene_mesh.world_mesh();

        assert_eq!(world.indices, scene_mesh.mesh.indices);
        assert_eq!(world.vertex_count(), scene_mesh.mesh.vertex_count());
        let n = world.normal(0);
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn grid_line_count() {
        let vertices = generate_grid_vertices(10.0, 4);
        // (divisions + 1) lines per axis, two vertices of three floats each
        assert_eq!(vertices.len(), 5 * 2 * 2 * 3);
        assert_eq!(&vertices[..6], &[-5.0, 0.0, -5.0, -5.0, 0.0, 5.0]);
    }

    #[test]
    fn create_grid_replaces_previous() {
        let mut scene = Scene::new();
        scene.create_grid(10.0, 10);
        let before = scene.generation();
        scene.create_grid(4.0, 0);

        assert_eq!(scene.grid(), Some(Grid::new(4.0, 1)));
        assert!(scene.generation() > before);
    }

    #[test]
    fn grid_from_cell_size() {
        assert_eq!(Grid::for_cell_size(1000, None), Grid::new(10.0, 10));
        assert_eq!(Grid::for_cell_size(500, None), Grid::new(10.0, 20));

        let mesh = sample_mesh(30, 15);
        let params = Params::from_json(r#"{"Scale": 0.5}"#).unwrap();
        let scene_mesh = SceneMesh {
            placement: MeshPlacement::for_mesh(&mesh, &params),
            mesh,
        };
        assert_eq!(Grid::for_cell_size(2000, Some(&scene_mesh)), Grid::new(15.0, 8));
    }

    #[test]
    fn resize_updates_aspect() {
        let mut scene = Scene::new();
        scene.resize(800, 400);
        assert_eq!(scene.camera.aspect, 2.0);
        scene.resize(800, 0);
        assert_eq!(scene.camera.aspect, 2.0);
    }
}
