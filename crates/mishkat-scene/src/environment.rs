//! Studio lighting and HDRI environment application
//!
//! The studio rig is always spawned. When an HDRI is ready and enabled, the
//! rig is hidden and the main camera receives the environment as image-based
//! lighting and, unless suppressed, as a skybox. Turning HDRI off or losing
//! it brings the rig back at the neutral preset.

use bevy::asset::RenderAssetUsages;
use bevy::core_pipeline::Skybox;
use bevy::light::EnvironmentMapLight;
use bevy::prelude::*;
use bevy::render::render_resource::{
    Extent3d, TextureDimension, TextureFormat, TextureViewDescriptor, TextureViewDimension,
};
use mishkat_core::environment::cubemap::CubeMap;
use mishkat_core::{EnvironmentPhase, HdriEnvironment, StudioPreset};
use std::sync::Arc;

use crate::camera::MainCamera;
use crate::types::{EnvironmentResolved, ViewerSettings, ViewerStatus};

/// Skybox luminance at intensity 1.0
const SKYBOX_BRIGHTNESS: f32 = 1000.0;
/// Image-based lighting luminance at intensity 1.0
const ENVIRONMENT_LIGHT_INTENSITY: f32 = 900.0;

/// Environment phase and the GPU images uploaded for it
#[derive(Resource, Debug)]
pub struct SceneEnvironment {
    pub phase: EnvironmentPhase,
    maps: Option<EnvironmentMaps>,
}

#[derive(Debug, Clone)]
struct EnvironmentMaps {
    lighting: Handle<Image>,
    background: Option<Handle<Image>>,
    intensity: f32,
}

impl SceneEnvironment {
    pub fn new(phase: EnvironmentPhase) -> Self {
        Self { phase, maps: None }
    }

    /// Whether an HDRI is available to toggle
    pub fn has_hdri(&self) -> bool {
        self.maps.is_some()
    }
}

/// A light of the built-in studio rig
#[derive(Component, Debug, Clone, Copy)]
pub struct StudioLight {
    /// Illuminance (directional) or luminous power (point) at preset 1.0
    pub base: f32,
}

/// How the scene should be lit right now
#[derive(Debug, Clone)]
pub enum LightingMode {
    Studio(StudioPreset),
    Hdri(Arc<HdriEnvironment>),
}

impl LightingMode {
    pub fn select(phase: &EnvironmentPhase, hdri_enabled: bool) -> Self {
        match (phase, hdri_enabled) {
            (EnvironmentPhase::Ready(env), true) => LightingMode::Hdri(env.clone()),
            (EnvironmentPhase::Ready(_), false) => LightingMode::Studio(StudioPreset::NEUTRAL),
            (phase, _) => LightingMode::Studio(phase.studio().unwrap_or(StudioPreset::NEUTRAL)),
        }
    }
}

/// Plugin for lights and environment maps
pub struct EnvironmentPlugin;

impl Plugin for EnvironmentPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_studio_lights)
            .add_systems(Update, (apply_resolved_environment, sync_lighting).chain());
    }
}

fn spawn_studio_lights(mut commands: Commands) {
    // Key light from above and in front
    commands.spawn((
        DirectionalLight {
            illuminance: 5000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 6.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
        StudioLight { base: 5000.0 },
    ));

    // Cool rim from behind
    commands.spawn((
        DirectionalLight {
            illuminance: 1500.0,
            color: Color::srgb(0.9, 0.95, 1.0),
            ..default()
        },
        Transform::from_xyz(-3.0, 2.0, -4.0).looking_at(Vec3::ZERO, Vec3::Y),
        StudioLight { base: 1500.0 },
    ));

    // Warm fill
    commands.spawn((
        PointLight {
            intensity: 200_000.0,
            shadows_enabled: false,
            color: Color::srgb(1.0, 0.95, 0.9),
            ..default()
        },
        Transform::from_xyz(-3.0, 1.5, 3.0),
        StudioLight { base: 200_000.0 },
    ));
}

/// Equirect-projected cube faces as a cube texture
pub fn cubemap_image(map: &CubeMap) -> Image {
    let size = map.face_size();
    let mut image = Image::new(
        Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 6,
        },
        TextureDimension::D2,
        map.to_rgba16f(1.0),
        TextureFormat::Rgba16Float,
        RenderAssetUsages::RENDER_WORLD,
    );
    image.texture_view_descriptor = Some(TextureViewDescriptor {
        dimension: Some(TextureViewDimension::Cube),
        ..default()
    });
    image
}

fn apply_resolved_environment(
    mut resolved: MessageReader<EnvironmentResolved>,
    mut environment: ResMut<SceneEnvironment>,
    mut images: ResMut<Assets<Image>>,
) {
    let Some(EnvironmentResolved(phase)) = resolved.read().last() else {
        return;
    };

    environment.maps = match phase {
        EnvironmentPhase::Ready(env) => {
            let lighting = images.add(cubemap_image(&env.lighting));
            let background = env.background.as_ref().map(|map| {
                if Arc::ptr_eq(map, &env.lighting) {
                    lighting.clone()
                } else {
                    images.add(cubemap_image(map))
                }
            });
            Some(EnvironmentMaps {
                lighting,
                background,
                intensity: env.intensity,
            })
        }
        _ => None,
    };
    environment.phase = phase.clone();
}

fn sync_lighting(
    mut commands: Commands,
    environment: Res<SceneEnvironment>,
    status: Res<ViewerStatus>,
    settings: Res<ViewerSettings>,
    camera: Query<Entity, With<MainCamera>>,
    mut directional: Query<(&StudioLight, &mut DirectionalLight, &mut Visibility), Without<PointLight>>,
    mut point: Query<(&StudioLight, &mut PointLight, &mut Visibility), Without<DirectionalLight>>,
) {
    if !environment.is_changed() && !status.is_changed() {
        return;
    }
    let Ok(camera) = camera.single() else { return };

    let mode = LightingMode::select(&environment.phase, status.hdri_enabled);
    let (preset, studio_visibility) = match (&mode, &environment.maps) {
        (LightingMode::Hdri(_), Some(maps)) => {
            let mut entity = commands.entity(camera);
            entity.insert(EnvironmentMapLight {
                diffuse_map: maps.lighting.clone(),
                specular_map: maps.lighting.clone(),
                intensity: ENVIRONMENT_LIGHT_INTENSITY * maps.intensity,
                ..default()
            });
            match (&maps.background, settings.show_background) {
                (Some(background), true) => {
                    entity.insert(Skybox {
                        image: background.clone(),
                        brightness: SKYBOX_BRIGHTNESS * maps.intensity,
                        ..default()
                    });
                }
                _ => {
                    entity.remove::<Skybox>();
                }
            }
            (StudioPreset::NEUTRAL, Visibility::Hidden)
        }
        (LightingMode::Studio(preset), _) => {
            commands
                .entity(camera)
                .remove::<(EnvironmentMapLight, Skybox)>();
            (*preset, Visibility::Inherited)
        }
        // HDRI reported ready but never uploaded
        (LightingMode::Hdri(_), None) => (StudioPreset::NEUTRAL, Visibility::Inherited),
    };

    for (light, mut directional, mut visibility) in &mut directional {
        directional.illuminance = light.base * preset.intensity;
        *visibility = studio_visibility;
    }
    for (light, mut point, mut visibility) in &mut point {
        point.intensity = light.base * preset.intensity;
        *visibility = studio_visibility;
    }
}
