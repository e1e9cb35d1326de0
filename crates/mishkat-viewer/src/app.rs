//! Bevy application setup

use bevy::prelude::*;
use bevy::winit::{UpdateMode, WinitSettings};
use bevy_egui::EguiPlugin;
use mishkat_scene::{MishkatScenePlugin, Mounted, UiLayout, ViewerStatus};
use std::time::Duration;

use crate::callbacks::CallbacksPlugin;
use crate::file_loader::{FileLoaderPlugin, Session};
use crate::fullscreen::{FullscreenPlugin, FullscreenTarget};
use crate::host::{HostPlugin, MountRequest};

pub const DEFAULT_CANVAS: &str = "#viewer-canvas";

/// Run the page's viewer on `canvas`, starting with the first mount
pub fn run(canvas: &str, request: MountRequest) {
    let MountRequest { config, callbacks, session } = request;
    tracing::info!(url = %config.model_url, canvas, "Starting viewer");

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.15))) // Dark blue-gray background
        .insert_resource(WinitSettings::default())
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Mishkat Viewer".to_string(),
                canvas: Some(canvas.to_string()),
                fit_canvas_to_parent: true,
                prevent_default_event_handling: true,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin::default())
        .insert_resource(Session(session))
        .insert_resource(FullscreenTarget(canvas.to_string()))
        .insert_non_send_resource(callbacks)
        .add_plugins(MishkatScenePlugin::new(config))
        .add_plugins(HostPlugin)
        .add_plugins(FileLoaderPlugin)
        .add_plugins(FullscreenPlugin)
        .add_plugins(CallbacksPlugin)
        .add_systems(Update, adjust_power_settings)
        .run();
}

/// Reactive rendering on mobile unless the turntable is spinning; idle
/// while nothing is mounted
fn adjust_power_settings(
    layout: Res<UiLayout>,
    status: Res<ViewerStatus>,
    mounted: Res<Mounted>,
    mut winit_settings: ResMut<WinitSettings>,
) {
    if !layout.is_changed() && !status.is_changed() && !mounted.is_changed() {
        return;
    }

    if !**mounted {
        winit_settings.focused_mode = UpdateMode::reactive_low_power(Duration::from_millis(500));
        winit_settings.unfocused_mode = UpdateMode::reactive_low_power(Duration::from_secs(1));
    } else if layout.is_mobile && !status.is_auto_rotating {
        winit_settings.focused_mode = UpdateMode::reactive_low_power(Duration::from_millis(100)); // 10 FPS max when idle
        winit_settings.unfocused_mode = UpdateMode::reactive_low_power(Duration::from_millis(500)); // 2 FPS when unfocused
    } else {
        *winit_settings = WinitSettings::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mishkat_core::ViewerConfig;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(WinitSettings::default())
            .insert_resource(ViewerStatus::new(&ViewerConfig::new("/m.glb", "glb")))
            .init_resource::<UiLayout>()
            .init_resource::<Mounted>()
            .add_systems(Update, adjust_power_settings);
        app
    }

    #[test]
    fn test_idle_while_unmounted() {
        let mut app = app();
        app.update();
        assert_eq!(
            app.world().resource::<WinitSettings>().focused_mode,
            WinitSettings::default().focused_mode
        );

        app.world_mut().resource_mut::<Mounted>().0 = false;
        app.update();
        assert_eq!(
            app.world().resource::<WinitSettings>().focused_mode,
            UpdateMode::reactive_low_power(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_mobile_is_reactive_unless_rotating() {
        let mut app = app();
        app.world_mut().resource_mut::<UiLayout>().update_from_window(390.0, 844.0);
        app.update();
        assert_eq!(
            app.world().resource::<WinitSettings>().focused_mode,
            UpdateMode::reactive_low_power(Duration::from_millis(100))
        );

        app.world_mut().resource_mut::<ViewerStatus>().toggle_auto_rotate();
        app.update();
        assert_eq!(
            app.world().resource::<WinitSettings>().focused_mode,
            WinitSettings::default().focused_mode
        );
    }
}
