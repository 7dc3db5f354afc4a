use glam::{Mat4, Vec3};

use crate::config::OrbitConfig;

/// Keys currently held down, sampled once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
}

/// Spherical orbit around a look-at target.
///
/// `polar` is measured from +Y and kept inside `[min_polar, max_polar]` so the
/// view never flips over the pole. `azimuth` is unclamped.
#[derive(Clone, Debug)]
pub struct OrbitController {
    pub radius: f32,
    pub polar: f32,
    pub azimuth: f32,
    pub target: Vec3,
    pub auto_rotate: bool,
    config: OrbitConfig,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(OrbitConfig::default())
    }
}

impl OrbitController {
    pub fn new(config: OrbitConfig) -> Self {
        Self {
            radius: config.radius,
            polar: config.polar.clamp(config.min_polar, config.max_polar),
            azimuth: config.azimuth,
            target: Vec3::ZERO,
            auto_rotate: false,
            config,
        }
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn apply_drag(&mut self, dx: f32, dy: f32) {
        self.azimuth += dx * self.config.sensitivity;
        self.polar = (self.polar - dy * self.config.sensitivity)
            .clamp(self.config.min_polar, self.config.max_polar);
    }

    pub fn apply_zoom(&mut self, delta_y: f32) {
        self.radius = (self.radius * (1.0 + delta_y * self.config.zoom_speed))
            .clamp(self.config.zoom_min, self.config.zoom_max);
    }

    /// Applies one tick of held keys and auto-rotation. Returns whether the
    /// camera moved.
    pub fn apply_key_state(&mut self, keys: &KeyState) -> bool {
        let mut moved = false;
        let step = self.config.key_step;

        if keys.zoom_in {
            self.radius = (self.radius * self.config.key_zoom_in).max(self.config.key_zoom_min);
            moved = true;
        }
        if keys.zoom_out {
            self.radius = (self.radius * self.config.key_zoom_out).min(self.config.key_zoom_max);
            moved = true;
        }

        if keys.left {
            self.target.x -= step;
            moved = true;
        }
        if keys.right {
            self.target.x += step;
            moved = true;
        }
        if keys.forward {
            self.target.z -= step;
            moved = true;
        }
        if keys.back {
            self.target.z += step;
            moved = true;
        }

        if self.auto_rotate {
            self.azimuth += self.config.sensitivity;
            moved = true;
        }

        moved
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.auto_rotate = !self.auto_rotate;
        self.auto_rotate
    }

    /// Scales the orbit distance once, e.g. by `sqrt(Scale)` after params load.
    pub fn scale_radius(&mut self, factor: f32) {
        self.radius *= factor;
    }

    pub fn current_camera_position(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();

        self.target
            + Vec3::new(
                self.radius * sin_p * cos_a,
                self.radius * cos_p,
                self.radius * sin_p * sin_a,
            )
    }
}

/// Perspective camera placed by the orbit controller.
pub struct Camera {
    pub position: Vec3,
    pub look_at: Vec3,

    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, -10.0),
            look_at: Vec3::ZERO,

            fov: 75.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = width / height;
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.position.to_array(),
            _padding: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn drag_right_turns_azimuth_only() {
        let mut orbit = OrbitController::default();
        let (azimuth, polar) = (orbit.azimuth, orbit.polar);

        orbit.apply_drag(100.0, 0.0);

        assert!((orbit.azimuth - azimuth - 0.5).abs() < EPS);
        assert_eq!(orbit.polar, polar);
    }

    #[test]
    fn drag_clamps_polar() {
        let mut orbit = OrbitController::default();
        let cfg = *orbit.config();

        orbit.apply_drag(0.0, 1.0e6);
        assert_eq!(orbit.polar, cfg.min_polar);

        orbit.apply_drag(0.0, -1.0e6);
        assert_eq!(orbit.polar, cfg.max_polar);
    }

    #[test]
    fn scroll_doubles_then_clamps() {
        let mut orbit = OrbitController::default();
        orbit.radius = 10.0;

        orbit.apply_zoom(1000.0);
        assert!((orbit.radius - 20.0).abs() < EPS);

        orbit.apply_zoom(1000.0);
        assert_eq!(orbit.radius, 40.0);

        orbit.apply_zoom(1000.0);
        assert_eq!(orbit.radius, orbit.config().zoom_max);
    }

    #[test]
    fn initial_radius_is_clamped_by_first_zoom() {
        let mut orbit = OrbitController::default();
        assert_eq!(orbit.radius, 200.0);
        orbit.apply_zoom(0.0);
        assert_eq!(orbit.radius, orbit.config().zoom_max);
    }

    #[test]
    fn key_zoom_uses_wider_bounds() {
        let mut orbit = OrbitController::default();
        orbit.radius = 2.01;
        let keys = KeyState {
            zoom_in: true,
            ..KeyState::default()
        };
        assert!(orbit.apply_key_state(&keys));
        assert_eq!(orbit.radius, 2.0);

        orbit.radius = 999.0;
        let keys = KeyState {
            zoom_out: true,
            ..KeyState::default()
        };
        orbit.apply_key_state(&keys);
        assert_eq!(orbit.radius, 1000.0);
    }

    #[test]
    fn keys_pan_target() {
        let mut orbit = OrbitController::default();
        let keys = KeyState {
            right: true,
            forward: true,
            ..KeyState::default()
        };
        orbit.apply_key_state(&keys);
        assert!((orbit.target - Vec3::new(0.3, 0.0, -0.3)).length() < EPS);
    }

    #[test]
    fn idle_tick_does_not_move() {
        let mut orbit = OrbitController::default();
        assert!(!orbit.apply_key_state(&KeyState::default()));
    }

    #[test]
    fn auto_rotate_moves_every_tick() {
        let mut orbit = OrbitController::default();
        assert!(orbit.toggle_auto_rotate());
        let azimuth = orbit.azimuth;

        assert!(orbit.apply_key_state(&KeyState::default()));
        assert!((orbit.azimuth - azimuth - orbit.config().sensitivity).abs() < EPS);

        assert!(!orbit.toggle_auto_rotate());
    }

    #[test]
    fn position_is_spherical_around_target() {
        let mut orbit = OrbitController::default();
        orbit.radius = 10.0;
        orbit.polar = std::f32::consts::FRAC_PI_2;
        orbit.azimuth = 0.0;
        orbit.target = Vec3::new(1.0, 2.0, 3.0);

        let p = orbit.current_camera_position();
        assert!((p - Vec3::new(11.0, 2.0, 3.0)).length() < 1e-4);

        orbit.azimuth = std::f32::consts::FRAC_PI_2;
        let p = orbit.current_camera_position();
        assert!((p - Vec3::new(1.0, 2.0, 13.0)).length() < 1e-4);
        assert!(((p - orbit.target).length() - orbit.radius).abs() < 1e-4);
    }
}
