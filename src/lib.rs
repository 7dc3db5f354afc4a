pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod mesh;
pub mod renderer;
pub mod scene;
pub mod storage;
pub mod ui;
pub mod viewer;

pub use error::{Result, ViewerError};
