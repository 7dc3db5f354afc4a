use std::collections::BTreeMap;
use std::f32::consts::PI;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::mesh::DEFAULT_EMPTY_COLOR;
use crate::storage::{PARAMS_KEY, Storage};

pub const CONFIG_KEY: &str = "config.json";

/// Tuning for the orbit controller. Angles are radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub radius: f32,
    pub polar: f32,
    pub azimuth: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub key_zoom_in: f32,
    pub key_zoom_out: f32,
    pub key_zoom_min: f32,
    pub key_zoom_max: f32,
    pub key_step: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            radius: 200.0,
            polar: PI / 4.0,
            azimuth: PI / 2.0,
            min_polar: 0.1,
            max_polar: PI - 0.1,
            sensitivity: 0.005,
            zoom_speed: 0.001,
            zoom_min: 3.0,
            zoom_max: 50.0,
            key_zoom_in: 0.98,
            key_zoom_out: 1.02,
            key_zoom_min: 2.0,
            key_zoom_max: 1000.0,
            key_step: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub orbit: OrbitConfig,
    /// RGB of pixels that produce no geometry.
    pub empty_color: [u8; 3],
    /// Grid cell size in thousandths of a world unit.
    pub cell_size: u32,
    pub export_dir: PathBuf,
    pub vsync: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            orbit: OrbitConfig::default(),
            empty_color: DEFAULT_EMPTY_COLOR,
            cell_size: 1000,
            export_dir: PathBuf::from("."),
            vsync: true,
        }
    }
}

impl ViewerConfig {
    /// Reads `config.json` from the store; absent or malformed means defaults.
    pub fn load(storage: &Storage) -> Self {
        match storage.get(CONFIG_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("ignoring malformed {CONFIG_KEY}: {e}");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("failed to read {CONFIG_KEY}: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &Storage) -> Result<()> {
        storage.set(CONFIG_KEY, &serde_json::to_string_pretty(self)?)
    }
}

/// Free-form numeric parameters persisted next to the heightmap image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    fields: BTreeMap<String, serde_json::Value>,
}

impl Params {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Absent blob yields empty params; malformed JSON is logged and ignored.
    pub fn load(storage: &Storage) -> Self {
        match storage.get(PARAMS_KEY) {
            Ok(Some(json)) => Self::from_json(&json).unwrap_or_else(|e| {
                warn!("ignoring malformed parameters: {e}");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("failed to read parameters: {e}");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(serde_json::Value::as_f64)
    }

    pub fn scale(&self) -> Option<f32> {
        self.get("Scale")
            .map(|s| s as f32)
            .filter(|s| s.is_finite() && *s > 0.0)
    }

    pub fn min(&self) -> Option<f64> {
        self.get("min")
    }

    pub fn max(&self) -> Option<f64> {
        self.get("max")
    }

    pub fn amplitude(&self) -> Option<f64> {
        Some(self.max()? - self.min()?)
    }
}
