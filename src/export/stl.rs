use std::fmt::Write;

use glam::Vec3;

use crate::mesh::HeightMesh;

/// ASCII STL. Facet normals come from the triangle winding.
pub fn to_stl(mesh: &HeightMesh, name: &str) -> String {
    let mut out = String::with_capacity(mesh.triangle_count() * 256);

    let _ = writeln!(out, "solid {name}");
    for [a, b, c] in mesh.triangles() {
        let v0 = mesh.position(a as usize);
        let v1 = mesh.position(b as usize);
        let v2 = mesh.position(c as usize);
        let n = (v1 - v0).cross(v2 - v0).normalize_or(Vec3::ZERO);

        let _ = writeln!(out, "\tfacet normal {} {} {}", n.x, n.y, n.z);
        let _ = writeln!(out, "\t\touter loop");
        for v in [v0, v1, v2] {
            let _ = writeln!(out, "\t\t\tvertex {} {} {}", v.x, v.y, v.z);
        }
        let _ = writeln!(out, "\t\tendloop");
        let _ = writeln!(out, "\tendfacet");
    }
    let _ = writeln!(out, "endsolid {name}");

    out
}
