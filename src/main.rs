//! Application entry point: loads the tuning file, opens the window it describes, and hands the
//! rest to `MoonTripPlugin`.

mod app;
mod audio;
mod camera;
mod config;
mod enemy;
mod fx;
mod level;
mod physics;
mod pickup;
mod player;
mod scene;
mod sprites;
mod state;
mod title;
mod ui;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod wasm;

use app::MoonTripPlugin;
use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::render::texture::ImagePlugin;
use bevy::window::{Window, WindowResizeConstraints, WindowResolution};
use config::{ConfigPlugin, GameConfig, CONFIG_PATH};

fn main() {
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    wasm::set_panic_hook();

    // Logging is not up yet; ConfigPlugin reports the outcome at startup.
    let (config, report) = GameConfig::load_or_default(CONFIG_PATH);

    let primary_window = Window {
        title: config.window.title.clone(),
        resolution: WindowResolution::new(config.window.width, config.window.height),
        resizable: true,
        resize_constraints: WindowResizeConstraints {
            min_width: config.window.width * 0.5,
            min_height: config.window.height * 0.5,
            max_width: f32::INFINITY,
            max_height: f32::INFINITY,
        },
        canvas: cfg!(all(target_arch = "wasm32", feature = "web"))
            .then(|| "#bevy-canvas".to_owned()),
        ..default()
    };

    // Nearest sampling keeps the generated pixel art crisp when scaled up.
    let mut default_plugins = DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(primary_window),
            ..default()
        })
        .set(ImagePlugin::default_nearest());

    #[cfg(not(target_arch = "wasm32"))]
    {
        default_plugins = default_plugins.set(AssetPlugin {
            file_path: "assets".to_owned(),
            watch_for_changes_override: Some(false),
            ..default()
        });
    }

    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    {
        default_plugins = default_plugins.set(AssetPlugin {
            file_path: "assets".to_owned(),
            meta_check: bevy::asset::AssetMetaCheck::Never,
            ..default()
        });
    }

    App::new()
        .insert_resource(ClearColor(Color::BLACK))
        .add_plugins(default_plugins)
        .add_plugins(ConfigPlugin { config, report })
        .add_plugins(MoonTripPlugin)
        .run();
}
