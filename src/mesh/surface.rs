use glam::Vec3;

/// Flat, GPU-ready triangle mesh built from a heightmap.
///
/// Attributes are stored as packed `f32` arrays (`vertices`/`normals`/`colors`
/// hold three floats per vertex, `uvs` two) so they can be uploaded with
/// `bytemuck::cast_slice` without repacking.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeightMesh {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub colors: Vec<f32>,
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
    /// Source raster dimensions.
    pub width: u32,
    pub height: u32,
}

impl HeightMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.vertices[index * 3..index * 3 + 3])
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.normals[index * 3..index * 3 + 3])
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Axis-aligned bounds of all vertices, `None` for a vertex-less mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for chunk in self.vertices.chunks_exact(3) {
            let p = Vec3::from_slice(chunk);
            min = min.min(p);
            max = max.max(p);
        }
        Some((min, max))
    }

    /// Recomputes per-vertex normals from the current triangle set.
    ///
    /// Face normals are accumulated unnormalized, so larger faces weigh more.
    /// Vertices referenced by no triangle point straight up.
    pub fn compute_vertex_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertex_count()];

        for [a, b, c] in self.triangles() {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let pa = self.position(a);
            let pb = self.position(b);
            let pc = self.position(c);

            let face = (pc - pb).cross(pa - pb);
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }

        self.normals.clear();
        self.normals.reserve(accum.len() * 3);
        for n in accum {
            self.normals
                .extend_from_slice(&n.normalize_or(Vec3::Y).to_array());
        }
    }
}
