pub mod camera;
pub mod gpu;

pub use camera::{Camera, CameraUniform, KeyState, OrbitController};
pub use gpu::GpuState;
