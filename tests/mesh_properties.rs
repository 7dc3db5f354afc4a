//! Property tests for mesh construction and the orbit controller.

use heightview::config::OrbitConfig;
use heightview::mesh::{DEFAULT_EMPTY_COLOR, MeshBuilder, RasterImage};
use heightview::renderer::{KeyState, OrbitController};
use proptest::prelude::*;

const SENTINEL: [u8; 4] = [
    DEFAULT_EMPTY_COLOR[0],
    DEFAULT_EMPTY_COLOR[1],
    DEFAULT_EMPTY_COLOR[2],
    255,
];

/// Images up to 12x12 where each pixel is either the sentinel or a gray that
/// never collides with it.
fn image_strategy() -> impl Strategy<Value = (u32, u32, Vec<Option<u8>>)> {
    (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
        let cells = (w * h) as usize;
        (
            Just(w),
            Just(h),
            prop::collection::vec(prop::option::weighted(0.8, 0u8..=254), cells),
        )
    })
}

fn to_raster(w: u32, h: u32, cells: &[Option<u8>]) -> RasterImage {
    RasterImage::from_fn(w, h, |x, y| match cells[(y * w + x) as usize] {
        Some(v) => [v, v, v, 255],
        None => SENTINEL,
    })
}

proptest! {
    #[test]
    fn full_images_have_two_triangles_per_quad(w in 2u32..16, h in 2u32..16, gray in 0u8..=254) {
        let mesh = MeshBuilder::new().build(&RasterImage::from_fn(w, h, |_, _| [gray, gray, gray, 255]));

        prop_assert_eq!(mesh.triangle_count(), (2 * (w - 1) * (h - 1)) as usize);
        prop_assert_eq!(mesh.vertex_count(), (w * h) as usize);
    }

    #[test]
    fn triangles_only_cover_complete_quads((w, h, cells) in image_strategy()) {
        let mesh = MeshBuilder::new().build(&to_raster(w, h, &cells));

        let mut complete = 0usize;
        if w >= 2 && h >= 2 {
            for y in 0..h - 1 {
                for x in 0..w - 1 {
                    let corners = [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)];
                    if corners.iter().all(|&(cx, cy)| cells[(cy * w + cx) as usize].is_some()) {
                        complete += 1;
                    }
                }
            }
        }

        prop_assert_eq!(mesh.triangle_count(), complete * 2);
        prop_assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
        prop_assert!(mesh.vertex_count() <= cells.iter().filter(|c| c.is_some()).count());
    }

    #[test]
    fn shared_corners_are_not_duplicated((w, h, cells) in image_strategy()) {
        let mesh = MeshBuilder::new().build(&to_raster(w, h, &cells));

        let mut positions: Vec<(i64, i64)> = (0..mesh.vertex_count())
            .map(|i| {
                let p = mesh.position(i);
                (p.x.round() as i64, p.z.round() as i64)
            })
            .collect();
        positions.sort_unstable();
        let before = positions.len();
        positions.dedup();
        prop_assert_eq!(positions.len(), before);
    }

    #[test]
    fn all_sentinel_images_are_empty(w in 0u32..10, h in 0u32..10) {
        let mesh = MeshBuilder::new().build(&RasterImage::from_fn(w, h, |_, _| SENTINEL));

        prop_assert_eq!(mesh.vertex_count(), 0);
        prop_assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn polar_stays_clamped(drags in prop::collection::vec((-2000.0f32..2000.0, -2000.0f32..2000.0), 0..64)) {
        let config = OrbitConfig::default();
        let mut orbit = OrbitController::new(config);

        for (dx, dy) in drags {
            orbit.apply_drag(dx, dy);
            prop_assert!(orbit.polar >= config.min_polar && orbit.polar <= config.max_polar);
        }
    }

    #[test]
    fn wheel_zoom_stays_in_bounds(deltas in prop::collection::vec(-5000.0f32..5000.0, 1..64)) {
        let config = OrbitConfig::default();
        let mut orbit = OrbitController::new(config);

        for delta in deltas {
            orbit.apply_zoom(delta);
            prop_assert!(orbit.radius >= config.zoom_min && orbit.radius <= config.zoom_max);
        }
    }

    #[test]
    fn key_zoom_stays_in_bounds(steps in prop::collection::vec(any::<bool>(), 0..2000)) {
        let config = OrbitConfig::default();
        let mut orbit = OrbitController::new(config);

        for zoom_in in steps {
            let keys = KeyState {
                zoom_in,
                zoom_out: !zoom_in,
                ..KeyState::default()
            };
            orbit.apply_key_state(&keys);
            prop_assert!(orbit.radius >= config.key_zoom_min && orbit.radius <= config.key_zoom_max);
        }
    }
}
