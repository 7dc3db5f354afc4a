use tracing::debug;

use crate::mesh::raster::RasterImage;
use crate::mesh::surface::HeightMesh;

/// Default "no geometry here" color: pure magenta.
pub const DEFAULT_EMPTY_COLOR: [u8; 3] = [255, 0, 255];

const MISSING: u32 = u32::MAX;
const UNVISITED: u32 = u32::MAX - 1;

/// Height of a pixel: unweighted mean of its color channels, in `[0, 1]`.
pub fn luminance(rgba: [u8; 4]) -> f32 {
    (rgba[0] as f32 + rgba[1] as f32 + rgba[2] as f32) / 3.0 / 255.0
}

/// Turns a raster into a triangulated height field.
///
/// Pixels are visited quad by quad. A corner gets a vertex the first time a
/// quad touches it; the `slots` arena maps each pixel to that dense index, or
/// to `MISSING` when the pixel carries the empty color. A quad with any
/// missing corner is dropped whole.
#[derive(Clone, Copy, Debug)]
pub struct MeshBuilder {
    empty_color: [u8; 3],
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self {
            empty_color: DEFAULT_EMPTY_COLOR,
        }
    }
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_empty_color(mut self, rgb: [u8; 3]) -> Self {
        self.empty_color = rgb;
        self
    }

    pub fn empty_color(&self) -> [u8; 3] {
        self.empty_color
    }

    pub fn is_empty_pixel(&self, rgba: [u8; 4]) -> bool {
        rgba[..3] == self.empty_color
    }

    pub fn build(&self, image: &RasterImage) -> HeightMesh {
        let width = image.width();
        let height = image.height();

        let mut state = BuildState {
            builder: self,
            image,
            slots: vec![UNVISITED; width as usize * height as usize],
            mesh: HeightMesh {
                width,
                height,
                ..HeightMesh::default()
            },
        };

        if width >= 2 && height >= 2 {
            for y in 0..height - 1 {
                for x in 0..width - 1 {
                    let tl = state.vertex(x, y);
                    let tr = state.vertex(x + 1, y);
                    let bl = state.vertex(x, y + 1);
                    let br = state.vertex(x + 1, y + 1);

                    if [tl, tr, bl, br].contains(&MISSING) {
                        continue;
                    }

                    state.mesh.indices.extend_from_slice(&[tl, tr, bl]);
                    state.mesh.indices.extend_from_slice(&[tr, br, bl]);
                }
            }
        }

        let mut mesh = state.mesh;
        mesh.compute_vertex_normals();

        debug!(
            width,
            height,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "built height mesh"
        );
        mesh
    }
}

struct BuildState<'a> {
    builder: &'a MeshBuilder,
    image: &'a RasterImage,
    slots: Vec<u32>,
    mesh: HeightMesh,
}

impl BuildState<'_> {
    fn vertex(&mut self, x: u32, y: u32) -> u32 {
        let width = self.image.width();
        let slot = y as usize * width as usize + x as usize;
        if self.slots[slot] != UNVISITED {
            return self.slots[slot];
        }

        let rgba = self.image.pixel(x, y);
        if self.builder.is_empty_pixel(rgba) {
            self.slots[slot] = MISSING;
            return MISSING;
        }

        let h = luminance(rgba);
        let index = self.mesh.vertex_count() as u32;

        self.mesh
            .vertices
            .extend_from_slice(&[x as f32, h, y as f32]);
        self.mesh.colors.extend_from_slice(&[h, 0.3, 0.8]);
        self.mesh.uvs.extend_from_slice(&[
            x as f32 / width as f32,
            1.0 - y as f32 / self.image.height() as f32,
        ]);

        self.slots[slot] = index;
        index
    }
}
