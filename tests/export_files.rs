use heightview::config::Params;
use heightview::export::{self, ExportFormat};
use heightview::mesh::{MeshBuilder, RasterImage};
use heightview::scene::{MeshPlacement, Scene};

fn scene_with_mesh(w: u32, h: u32, params: &Params) -> Scene {
    let image = RasterImage::from_fn(w, h, |x, y| {
        let v = ((x + y) * 20) as u8;
        [v, v, v, 255]
    });
    let mesh = MeshBuilder::new().build(&image);
    let placement = MeshPlacement::for_mesh(&mesh, params);

    let mut scene = Scene::new();
    scene.replace_mesh(mesh, placement);
    scene
}

#[test]
fn writes_each_format_under_its_fixed_name() {
    let dir = tempfile::tempdir().unwrap();
    let scene = scene_with_mesh(4, 3, &Params::default());

    for format in ExportFormat::ALL {
        let path = export::export(&scene, format, dir.path()).unwrap().unwrap();
        assert_eq!(path, dir.path().join(format.file_name()));
        assert!(path.is_file());
    }

    let obj = std::fs::read_to_string(dir.path().join("mesh.obj")).unwrap();
    assert_eq!(obj.lines().filter(|l| l.starts_with("f ")).count(), 12);

    let stl = std::fs::read_to_string(dir.path().join("mesh.stl")).unwrap();
    assert_eq!(stl.matches("facet normal").count(), 12);

    let gltf: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("mesh.gltf")).unwrap())
            .unwrap();
    assert_eq!(gltf["asset"]["version"], "2.0");
    assert_eq!(gltf["accessors"][0]["count"], 12);
    assert_eq!(gltf["accessors"][4]["count"], 36);
}

#[test]
fn exported_vertices_are_in_world_space() {
    let scene = scene_with_mesh(4, 4, &Params::default());
    let obj = export::render(&scene, ExportFormat::Obj).unwrap();

    let xs: Vec<f32> = obj
        .lines()
        .filter_map(|l| l.strip_prefix("v "))
        .map(|l| l.split_whitespace().next().unwrap().parse().unwrap())
        .collect();

    // 10 units across four pixels, centered on the origin
    let min = xs.iter().cloned().fold(f32::MAX, f32::min);
    let max = xs.iter().cloned().fold(f32::MIN, f32::max);
    assert!((min + 5.0).abs() < 1e-4);
    assert!((max - 2.5).abs() < 1e-4);
}

#[test]
fn scale_param_is_applied_uniformly() {
    let params = Params::from_json(r#"{"Scale": 2}"#).unwrap();
    let scene = scene_with_mesh(2, 2, &params);
    let world = scene.mesh().unwrap().world_mesh();

    assert_eq!(world.position(0).x, -2.0);
    assert_eq!(world.position(3).x, 0.0);
    assert_eq!(world.position(3).z, 0.0);
}

#[test]
fn missing_mesh_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let scene = Scene::new();

    for format in ExportFormat::ALL {
        assert!(export::export(&scene, format, dir.path()).unwrap().is_none());
        assert!(!dir.path().join(format.file_name()).exists());
    }
}

#[test]
fn export_replaces_previous_file() {
    let dir = tempfile::tempdir().unwrap();

    let first = scene_with_mesh(2, 2, &Params::default());
    export::export_stl(&first, dir.path()).unwrap();

    let second = scene_with_mesh(3, 3, &Params::default());
    export::export_stl(&second, dir.path()).unwrap();

    let stl = std::fs::read_to_string(dir.path().join("mesh.stl")).unwrap();
    assert_eq!(stl.matches("facet normal").count(), 8);
}
