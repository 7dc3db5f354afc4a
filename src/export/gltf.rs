use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

use crate::mesh::HeightMesh;

/// glTF component types
const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;

/// glTF buffer view targets
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

const GENERATOR: &str = concat!("heightview ", env!("CARGO_PKG_VERSION"));

struct View {
    offset: usize,
    length: usize,
    target: u32,
}

/// Builds a glTF 2.0 JSON document with a single embedded base64 buffer.
///
/// Buffer layout, each section 4-byte aligned: positions, normals, colors,
/// UVs, indices.
pub fn to_gltf(mesh: &HeightMesh, name: &str) -> Value {
    let mut doc = json!({
        "asset": { "version": "2.0", "generator": GENERATOR },
        "scene": 0,
        "scenes": [{ "nodes": [] }],
    });

    if mesh.vertex_count() == 0 || mesh.indices.is_empty() {
        return doc;
    }

    let mut bin: Vec<u8> = Vec::new();
    let mut push = |bytes: &[u8], target: u32| -> View {
        let offset = bin.len();
        bin.extend_from_slice(bytes);
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        View {
            offset,
            length: bytes.len(),
            target,
        }
    };

    let views = [
        push(bytemuck::cast_slice(&mesh.vertices), ARRAY_BUFFER),
        push(bytemuck::cast_slice(&mesh.normals), ARRAY_BUFFER),
        push(bytemuck::cast_slice(&mesh.colors), ARRAY_BUFFER),
        push(bytemuck::cast_slice(&mesh.uvs), ARRAY_BUFFER),
        push(bytemuck::cast_slice(&mesh.indices), ELEMENT_ARRAY_BUFFER),
    ];

    let buffer_views: Vec<Value> = views
        .iter()
        .map(|v| {
            json!({
                "buffer": 0,
                "byteOffset": v.offset,
                "byteLength": v.length,
                "target": v.target,
            })
        })
        .collect();

    let (min, max) = mesh.bounds().unwrap_or_default();
    let count = mesh.vertex_count();

    let accessors = json!([
        {
            "bufferView": 0,
            "componentType": FLOAT,
            "count": count,
            "type": "VEC3",
            "min": min.to_array(),
            "max": max.to_array(),
        },
        { "bufferView": 1, "componentType": FLOAT, "count": count, "type": "VEC3" },
        { "bufferView": 2, "componentType": FLOAT, "count": count, "type": "VEC3" },
        { "bufferView": 3, "componentType": FLOAT, "count": count, "type": "VEC2" },
        {
            "bufferView": 4,
            "componentType": UNSIGNED_INT,
            "count": mesh.indices.len(),
            "type": "SCALAR",
        },
    ]);

    doc["scenes"] = json!([{ "nodes": [0] }]);
    doc["nodes"] = json!([{ "name": name, "mesh": 0 }]);
    doc["meshes"] = json!([{
        "name": name,
        "primitives": [{
            "attributes": { "POSITION": 0, "NORMAL": 1, "COLOR_0": 2, "TEXCOORD_0": 3 },
            "indices": 4,
            "material": 0,
        }],
    }]);
    doc["materials"] = json!([{
        "pbrMetallicRoughness": { "metallicFactor": 0.0, "roughnessFactor": 1.0 },
        "doubleSided": true,
    }]);
    doc["accessors"] = accessors;
    doc["bufferViews"] = Value::Array(buffer_views);
    doc["buffers"] = json!([{
        "byteLength": bin.len(),
        "uri": format!("data:application/octet-stream;base64,{}", STANDARD.encode(&bin)),
    }]);

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshBuilder, RasterImage};

    #[test]
    fn embeds_all_attributes() {
        let mesh = MeshBuilder::new().build(&RasterImage::from_fn(3, 2, |x, _| {
            [x as u8 * 60, 0, 0, 255]
        }));
        let doc = to_gltf(&mesh, "heightmap");

        assert_eq!(doc["asset"]["version"], "2.0");
        assert_eq!(doc["accessors"][0]["count"], 6);
        assert_eq!(doc["accessors"][4]["count"], 12);

        let uri = doc["buffers"][0]["uri"].as_str().unwrap();
        let payload = uri.split_once(',').unwrap().1;
        let bin = STANDARD.decode(payload).unwrap();
        assert_eq!(doc["buffers"][0]["byteLength"], bin.len());

        let idx_view = &doc["bufferViews"][4];
        let offset = idx_view["byteOffset"].as_u64().unwrap() as usize;
        let length = idx_view["byteLength"].as_u64().unwrap() as usize;
        let indices: Vec<u32> = bin[offset..offset + length]
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(indices, mesh.indices);
    }

    #[test]
    fn empty_mesh_has_empty_scene() {
        let doc = to_gltf(&HeightMesh::default(), "heightmap");
        assert_eq!(doc["scenes"][0]["nodes"], json!([]));
        assert!(doc.get("meshes").is_none());
    }
}
