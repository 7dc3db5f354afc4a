//! Frame-driven viewer state: persisted inputs, the decode worker, the orbit
//! camera and the scene, without any window or GPU.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::config::{Params, ViewerConfig};
use crate::export::{self, ExportFormat};
use crate::mesh::{LoaderResult, MeshBuilder, MeshLoader, RasterImage};
use crate::renderer::{KeyState, OrbitController};
use crate::scene::{Grid, MeshPlacement, Scene};
use crate::storage::{IMAGE_KEY, Storage};
use crate::ui::MeshStats;

pub struct Viewer {
    storage: Option<Storage>,
    config: ViewerConfig,
    params: Params,
    orbit: OrbitController,
    scene: Scene,
    builder: MeshBuilder,
    loader: MeshLoader,

    image_size: Option<(u32, u32)>,
    pending: usize,
    camera_dirty: bool,
    status: Option<String>,
    error: Option<String>,
}

impl Viewer {
    /// Loads the config and params, then queues the saved image for decoding.
    pub fn new(storage: Option<Storage>) -> Self {
        let config = storage
            .as_ref()
            .map(ViewerConfig::load)
            .unwrap_or_default();

        let mut viewer = Self {
            orbit: OrbitController::new(config.orbit),
            builder: MeshBuilder::new().with_empty_color(config.empty_color),
            storage,
            config,
            params: Params::default(),
            scene: Scene::new(),
            loader: MeshLoader::new(),

            image_size: None,
            pending: 0,
            camera_dirty: true,
            status: None,
            error: None,
        };

        viewer.regrid();
        viewer.load_saved(true);
        viewer
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Latest storage or export error, else the last failed decode.
    pub fn error(&self) -> Option<String> {
        self.error.clone().or_else(|| self.loader.last_error())
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
        self.error = None;
    }

    /// Re-reads params and the saved image.
    pub fn reload(&mut self) {
        self.load_saved(false);
    }

    fn load_saved(&mut self, initial: bool) {
        let Some(storage) = &self.storage else {
            warn!("no data directory, nothing to load");
            return;
        };

        self.params = Params::load(storage);
        let image = storage.get(IMAGE_KEY);

        if initial {
            if let Some(scale) = self.params.scale() {
                self.orbit.scale_radius(scale.sqrt());
                self.camera_dirty = true;
            }
        }
        self.place_mesh();

        match image {
            Ok(Some(data_url)) => {
                self.loader.request(data_url);
                self.pending += 1;
                self.set_status("Decoding saved image");
            }
            Ok(None) => {
                warn!("No image data found");
                self.set_status("No image data found");
            }
            Err(e) => {
                error!("failed to read saved image: {e}");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Re-places the current mesh for the current params.
    fn place_mesh(&mut self) {
        let Some(current) = self.scene.mesh() else {
            return;
        };
        let placement = MeshPlacement::for_mesh(&current.mesh, &self.params);
        if placement != current.placement {
            self.scene.set_placement(placement);
            self.regrid();
        }
    }

    fn regrid(&mut self) {
        let grid = Grid::for_cell_size(self.config.cell_size, self.scene.mesh());
        self.scene.create_grid(grid.size, grid.divisions);
    }

    fn attach_image(&mut self, image: RasterImage) {
        let mesh = self.builder.build(&image);
        if mesh.is_empty() {
            warn!(
                width = image.width(),
                height = image.height(),
                "image produced no triangles"
            );
        }

        let placement = MeshPlacement::for_mesh(&mesh, &self.params);
        let triangles = mesh.triangle_count();
        self.scene.replace_mesh(mesh, placement);
        self.image_size = Some((image.width(), image.height()));
        self.regrid();
        self.set_status(format!("Mesh ready: {triangles} triangles"));
    }

    pub fn set_cell_size(&mut self, cell_size: u32) {
        self.config.cell_size = cell_size;
        self.regrid();
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.vsync = enabled;
    }

    pub fn remove_mesh(&mut self) -> bool {
        if self.scene.remove_mesh().is_none() {
            return false;
        }
        self.image_size = None;
        self.regrid();
        self.set_status("Mesh removed");
        true
    }

    pub fn export(&mut self, format: ExportFormat) -> Option<PathBuf> {
        match export::export(&self.scene, format, &self.config.export_dir) {
            Ok(Some(path)) => {
                self.set_status(format!("{} export done", format.label()));
                Some(path)
            }
            Ok(None) => {
                self.set_status("No mesh to export");
                None
            }
            Err(e) => {
                error!("{} export failed: {e}", format.label());
                self.error = Some(e.to_string());
                None
            }
        }
    }

    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.orbit.apply_drag(dx, dy);
        self.camera_dirty = true;
    }

    pub fn zoom(&mut self, delta_y: f32) {
        self.orbit.apply_zoom(delta_y);
        self.camera_dirty = true;
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        let on = self.orbit.toggle_auto_rotate();
        info!(auto_rotate = on, "auto-rotate toggled");
        on
    }

    /// One frame: takes decoded images, applies held keys, and pushes the
    /// camera to the scene. Returns whether the camera was pushed.
    pub fn tick(&mut self, keys: &KeyState) -> bool {
        while let Some(result) = self.loader.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            match result {
                LoaderResult::Decoded(image) => self.attach_image(image),
                LoaderResult::Error(_) => {
                    self.status = Some("Saved image could not be decoded".to_owned());
                }
            }
        }

        if self.orbit.apply_key_state(keys) {
            self.camera_dirty = true;
        }

        if !self.camera_dirty {
            return false;
        }
        self.scene
            .update_camera(self.orbit.current_camera_position(), self.orbit.target);
        self.camera_dirty = false;
        true
    }

    pub fn stats(&self) -> MeshStats {
        let mesh = self.scene.mesh();
        MeshStats {
            image_size: self.image_size,
            vertices: mesh.map_or(0, |m| m.mesh.vertex_count()),
            triangles: mesh.map_or(0, |m| m.mesh.triangle_count()),
            world_size: mesh.map(|m| m.world_size()),
            scale: self.params.scale(),
            amplitude: self.params.amplitude(),
            camera_position: self.scene.camera.position.to_array(),
            radius: self.orbit.radius,
            loading: self.is_loading(),
            status: self.status.clone(),
            error: self.error(),
        }
    }

    /// Stops the decode worker and persists the config.
    pub fn shutdown(&mut self) {
        self.loader.stop();
        if let Some(storage) = &self.storage {
            if let Err(e) = self.config.save(storage) {
                warn!("failed to save config: {e}");
            }
        }
    }
}
