use std::fmt::Write;

use crate::mesh::HeightMesh;

/// Wavefront OBJ text. Faces reference position, UV and normal by the same
/// 1-based index.
pub fn to_obj(mesh: &HeightMesh, name: &str) -> String {
    let mut out = String::with_capacity(mesh.vertex_count() * 64 + mesh.triangle_count() * 32);

    let _ = writeln!(out, "# heightview");
    let _ = writeln!(out, "# vertices: {}", mesh.vertex_count());
    let _ = writeln!(out, "# triangles: {}", mesh.triangle_count());
    let _ = writeln!(out, "o {name}");

    for v in mesh.vertices.chunks_exact(3) {
        let _ = writeln!(out, "v {} {} {}", v[0], v[1], v[2]);
    }
    for uv in mesh.uvs.chunks_exact(2) {
        let _ = writeln!(out, "vt {} {}", uv[0], uv[1]);
    }
    for n in mesh.normals.chunks_exact(3) {
        let _ = writeln!(out, "vn {} {} {}", n[0], n[1], n[2]);
    }

    for [a, b, c] in mesh.triangles() {
        let (a, b, c) = (a + 1, b + 1, c + 1);
        let _ = writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshBuilder, RasterImage};

    #[test]
    fn one_quad() {
        let mesh = MeshBuilder::new().build(&RasterImage::from_fn(2, 2, |_, _| [0, 0, 0, 255]));
        let obj = to_obj(&mesh, "heightmap");

        assert!(obj.contains("o heightmap\n"));
        assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert_eq!(obj.lines().filter(|l| l.starts_with("vt ")).count(), 4);
        assert_eq!(obj.lines().filter(|l| l.starts_with("vn ")).count(), 4);
        assert!(obj.contains("f 1/1/1 2/2/2 3/3/3\n"));
        assert!(obj.contains("f 2/2/2 4/4/4 3/3/3\n"));
    }
}
