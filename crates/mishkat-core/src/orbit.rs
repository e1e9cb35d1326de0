//! Orbit camera controller
//!
//! Spherical coordinates around a focus point, Y up. Input moves target
//! values; [`OrbitController::update`] eases the current values toward them
//! so the camera glides to a stop.

use glam::{Vec2, Vec3};

use crate::viewer::ViewerConfig;

pub const MIN_DISTANCE: f32 = 2.0;
pub const MAX_DISTANCE: f32 = 10.0;
/// Keeps the camera off the poles
pub const ELEVATION_LIMIT: f32 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitConfig {
    pub home_position: Vec3,
    pub home_target: Vec3,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians per pixel of drag
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
    /// Radians per second while auto-rotating
    pub auto_rotate_rate: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            home_position: Vec3::splat(3.0),
            home_target: Vec3::ZERO,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            min_distance: MIN_DISTANCE,
            max_distance: MAX_DISTANCE,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: 0.15,
            auto_rotate_rate: 2.0 * std::f32::consts::PI / 30.0,
        }
    }
}

impl OrbitConfig {
    /// Manual rotation is only offered alongside zoom or pan
    pub fn from_viewer(config: &ViewerConfig) -> Self {
        Self {
            home_position: Vec3::from(config.camera_position),
            enable_rotate: config.enable_zoom || config.enable_pan,
            enable_zoom: config.enable_zoom,
            enable_pan: config.enable_pan,
            auto_rotate_rate: config.auto_rotate_rate(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrbitController {
    config: OrbitConfig,
    pub distance: f32,
    pub target_distance: f32,
    pub azimuth: f32,
    pub target_azimuth: f32,
    pub elevation: f32,
    pub target_elevation: f32,
    pub target: Vec3,
    pub target_focus: Vec3,
}

impl OrbitController {
    pub fn new(config: OrbitConfig) -> Self {
        let mut controller = Self {
            config,
            distance: 0.0,
            target_distance: 0.0,
            azimuth: 0.0,
            target_azimuth: 0.0,
            elevation: 0.0,
            target_elevation: 0.0,
            target: Vec3::ZERO,
            target_focus: Vec3::ZERO,
        };
        controller.reset();
        controller
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    /// Jump back to the configured camera position and focus
    pub fn reset(&mut self) {
        let offset = self.config.home_position - self.config.home_target;
        let distance = offset.length();
        let (azimuth, elevation) = if distance > f32::EPSILON {
            (
                offset.x.atan2(offset.z),
                (offset.y / distance)
                    .clamp(-1.0, 1.0)
                    .asin()
                    .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT),
            )
        } else {
            (0.0, 0.0)
        };
        let distance = self.clamp_distance(distance);

        self.distance = distance;
        self.target_distance = distance;
        self.azimuth = azimuth;
        self.target_azimuth = azimuth;
        self.elevation = elevation;
        self.target_elevation = elevation;
        self.target = self.config.home_target;
        self.target_focus = self.config.home_target;
    }

    fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.config.min_distance, self.config.max_distance)
    }

    /// Drag to orbit; returns false when rotation is disabled
    pub fn orbit(&mut self, delta: Vec2) -> bool {
        if !self.config.enable_rotate {
            return false;
        }
        self.target_azimuth -= delta.x * self.config.sensitivity;
        self.target_elevation = (self.target_elevation + delta.y * self.config.sensitivity)
            .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        true
    }

    /// Drag to move the focus point in the view plane
    pub fn pan(&mut self, delta: Vec2) -> bool {
        if !self.config.enable_pan {
            return false;
        }
        let right = Vec3::new(self.azimuth.cos(), 0.0, -self.azimuth.sin());
        let pan_speed = self.distance * 0.002;
        self.target_focus -= right * delta.x * pan_speed;
        self.target_focus += Vec3::Y * delta.y * pan_speed;
        true
    }

    /// Wheel zoom; positive `scroll` moves closer
    pub fn zoom(&mut self, scroll: f32) -> bool {
        if !self.config.enable_zoom {
            return false;
        }
        let factor = 1.0 - scroll * self.config.zoom_speed * 0.3;
        self.target_distance = self.clamp_distance(self.target_distance * factor);
        true
    }

    /// Pinch zoom by the ratio of previous to current finger spread
    pub fn pinch(&mut self, ratio: f32) -> bool {
        if !self.config.enable_zoom || !ratio.is_finite() || ratio <= 0.0 {
            return false;
        }
        self.target_distance = self.clamp_distance(self.target_distance * ratio);
        true
    }

    /// Advance the automatic turntable
    pub fn auto_rotate(&mut self, dt: f32) {
        self.target_azimuth += self.config.auto_rotate_rate * dt;
    }

    /// Ease toward the targets and return the camera position
    pub fn update(&mut self, dt: f32) -> Vec3 {
        let lerp = 1.0 - (-self.config.smooth_factor * 60.0 * dt).exp();
        self.distance += (self.target_distance - self.distance) * lerp;
        self.azimuth += (self.target_azimuth - self.azimuth) * lerp;
        self.elevation += (self.target_elevation - self.elevation) * lerp;
        self.target += (self.target_focus - self.target) * lerp;
        self.camera_position()
    }

    pub fn camera_position(&self) -> Vec3 {
        let (sin_el, cos_el) = self.elevation.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        self.target + self.distance * Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az)
    }

    /// Whether the camera is still gliding
    pub fn is_settling(&self) -> bool {
        (self.target_distance - self.distance).abs() > 1e-4
            || (self.target_azimuth - self.azimuth).abs() > 1e-4
            || (self.target_elevation - self.elevation).abs() > 1e-4
            || self.target_focus.distance(self.target) > 1e-4
    }
}
