pub mod gltf;
pub mod obj;
pub mod stl;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, ViewerError};
use crate::scene::Scene;

pub use gltf::to_gltf;
pub use obj::to_obj;
pub use stl::to_stl;

const OBJECT_NAME: &str = "heightmap";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Obj,
    Gltf,
    Stl,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Obj, ExportFormat::Gltf, ExportFormat::Stl];

    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Obj => "mesh.obj",
            ExportFormat::Gltf => "mesh.gltf",
            ExportFormat::Stl => "mesh.stl",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Obj => "OBJ",
            ExportFormat::Gltf => "GLTF",
            ExportFormat::Stl => "STL",
        }
    }
}

/// Serializes the scene's current mesh in world space.
pub fn render(scene: &Scene, format: ExportFormat) -> Result<String> {
    let mesh = scene.mesh().ok_or(ViewerError::NoMesh)?.world_mesh();

    Ok(match format {
        ExportFormat::Obj => to_obj(&mesh, OBJECT_NAME),
        ExportFormat::Gltf => serde_json::to_string(&to_gltf(&mesh, OBJECT_NAME))?,
        ExportFormat::Stl => to_stl(&mesh, OBJECT_NAME),
    })
}

/// Writes the current mesh to `dir/<fixed name>`.
///
/// Without a mesh this logs a warning and returns `Ok(None)`.
pub fn export(scene: &Scene, format: ExportFormat, dir: &Path) -> Result<Option<PathBuf>> {
    let payload = match render(scene, format) {
        Ok(p) => p,
        Err(ViewerError::NoMesh) => {
            warn!("no mesh to export");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    std::fs::create_dir_all(dir)?;
    let path = dir.join(format.file_name());
    std::fs::write(&path, payload).map_err(|source| ViewerError::Write {
        path: path.clone(),
        source,
    })?;

    info!(format = format.label(), path = %path.display(), "mesh exported");
    Ok(Some(path))
}

pub fn export_obj(scene: &Scene, dir: &Path) -> Result<Option<PathBuf>> {
    export(scene, ExportFormat::Obj, dir)
}

pub fn export_gltf(scene: &Scene, dir: &Path) -> Result<Option<PathBuf>> {
    export(scene, ExportFormat::Gltf, dir)
}

pub fn export_stl(scene: &Scene, dir: &Path) -> Result<Option<PathBuf>> {
    export(scene, ExportFormat::Stl, dir)
}
