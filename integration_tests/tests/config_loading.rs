mod common;

use std::time::Duration;

use bevy::prelude::*;
use rewind_core::{
    build_headless_app, load_game_config_from_env, run_fixed_tick, GameConfigHandle, PlayerBundle,
    RewindPlugin, RewindSettings,
};

use common::controller;

#[test]
fn env_config_drives_the_fixed_rate_and_history() {
    common::ensure_test_config();
    let config = load_game_config_from_env();
    assert_eq!(config.fixed_hz, 10.0);
    assert_eq!(config.audio.duck_factor, 0.5);
    assert_eq!(config.player.move_speed, 10.0);

    let settings = config.rewind;
    let mut app = App::new();
    app.insert_resource(GameConfigHandle::new(config))
        .add_plugins(MinimalPlugins)
        .add_plugins(RewindPlugin);
    assert_eq!(
        app.world.resource::<Time<Fixed>>().timestep(),
        Duration::from_millis(100)
    );

    let player = app
        .world
        .spawn((PlayerBundle::new(settings, Vec2::splat(0.5)), Transform::default()))
        .id();
    for _ in 0..30 {
        run_fixed_tick(&mut app);
    }

    let history = controller(&app, player).history();
    assert_eq!(history.capacity().get(), 20);
    assert_eq!(history.len(), 20);
}

#[test]
fn headless_app_defaults_to_the_builtin_config() {
    let app = build_headless_app();
    let config = app.world.resource::<GameConfigHandle>().get();
    assert_eq!(config.fixed_hz, 50.0);
    assert_eq!(config.rewind, RewindSettings::default());
}
