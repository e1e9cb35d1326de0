//! Orbit camera driven by mouse, wheel and touch input

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use mishkat_core::{OrbitConfig, OrbitController};

use crate::types::{ViewerAction, ViewerSettings, ViewerStatus};

/// Wheel pixels per line of scroll
const PIXELS_PER_LINE: f32 = 100.0;

/// Orbit state of the main camera
#[derive(Resource, Debug, Clone, Deref, DerefMut)]
pub struct OrbitCamera(pub OrbitController);

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Plugin for camera controls
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera)
            .add_systems(Update, (reset_view, update_camera).chain());
    }
}

fn setup_camera(mut commands: Commands, settings: Res<ViewerSettings>) {
    let orbit = OrbitController::new(OrbitConfig::from_viewer(&settings));
    let position = orbit.camera_position();
    let target = orbit.target;

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 45f32.to_radians(),
            near: 0.01,
            far: 1000.0,
            ..default()
        }),
        Transform::from_translation(position).looking_at(target, Vec3::Y),
        MainCamera,
    ));
    commands.insert_resource(OrbitCamera(orbit));
}

fn reset_view(mut actions: MessageReader<ViewerAction>, mut orbit: ResMut<OrbitCamera>) {
    for action in actions.read() {
        if *action == ViewerAction::ResetView {
            orbit.reset();
            tracing::debug!("Camera reset to home position");
        }
    }
}

/// Normalize wheel input to lines
fn scroll_lines(event: &MouseWheel) -> f32 {
    match event.unit {
        MouseScrollUnit::Line => event.y,
        MouseScrollUnit::Pixel => event.y / PIXELS_PER_LINE,
    }
}

/// Previous-to-current finger spread; above 1 when fingers close in
fn pinch_ratio(a: (Vec2, Vec2), b: (Vec2, Vec2)) -> f32 {
    let (a_pos, a_delta) = a;
    let (b_pos, b_delta) = b;
    let current = a_pos.distance(b_pos);
    let previous = (a_pos - a_delta).distance(b_pos - b_delta);
    previous / current.max(1.0)
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    orbit: Option<ResMut<OrbitCamera>>,
    status: Res<ViewerStatus>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    time: Res<Time>,
    mut contexts: bevy_egui::EguiContexts,
) {
    let Some(mut orbit) = orbit else { return };

    // Check if egui wants the mouse - if so, don't process camera controls
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input() || ctx.is_pointer_over_area())
        .unwrap_or(false);

    let total_motion: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let scroll: f32 = mouse_wheel.read().map(scroll_lines).sum();

    if !egui_wants_pointer {
        if mouse_button.pressed(MouseButton::Left) {
            orbit.orbit(total_motion);
        }
        if mouse_button.pressed(MouseButton::Right) || mouse_button.pressed(MouseButton::Middle) {
            orbit.pan(total_motion);
        }
        if scroll != 0.0 {
            orbit.zoom(scroll);
        }

        let touches: Vec<_> = touch_input.iter().collect();
        match touches.as_slice() {
            [touch] => {
                let delta = touch.delta();
                if delta != Vec2::ZERO {
                    orbit.orbit(delta);
                }
            }
            [t1, t2] => {
                orbit.pinch(pinch_ratio(
                    (t1.position(), t1.delta()),
                    (t2.position(), t2.delta()),
                ));
            }
            _ => {}
        }
    }

    let dt = time.delta_secs();
    if status.is_auto_rotating {
        orbit.auto_rotate(dt);
    }

    let position = orbit.update(dt);
    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = position;
        transform.look_at(orbit.target, Vec3::Y);
    }
}
