use std::path::PathBuf;

use crate::config::ViewerConfig;

/// Smallest and largest values accepted by the cell-size control.
pub const CELL_SIZE_RANGE: (u32, u32) = (10, 10_000);

pub struct UiState {
    pub cell_size: u32,
    pub auto_rotate: bool,
    pub vsync_enabled: bool,
    pub show_help: bool,

    pub last_export: Option<PathBuf>,
}

impl UiState {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            cell_size: config
                .cell_size
                .clamp(CELL_SIZE_RANGE.0, CELL_SIZE_RANGE.1),
            vsync_enabled: config.vsync,
            ..Self::default()
        }
    }

}

impl Default for UiState {
    fn default() -> Self {
        Self {
            cell_size: 1000,
            auto_rotate: false,
            vsync_enabled: true,
            show_help: true,

            last_export: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_size_from_config_is_clamped() {
        let config = ViewerConfig {
            cell_size: 0,
            ..ViewerConfig::default()
        };
        assert_eq!(UiState::from_config(&config).cell_size, CELL_SIZE_RANGE.0);
    }

}
