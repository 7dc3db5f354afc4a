pub mod builder;
pub mod loader;
pub mod raster;
pub mod surface;

pub use builder::{DEFAULT_EMPTY_COLOR, MeshBuilder, luminance};
pub use loader::{LoaderResult, MeshLoader};
pub use raster::{RasterImage, encode_data_url};
pub use surface::HeightMesh;
