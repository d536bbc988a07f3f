#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use bevy::prelude::*;
use rewind_core::{
    build_headless_app, run_fixed_tick, run_frame, Body2d, RewindController, RewindRequest,
    RewindSettings, TimeBody,
};

pub const TICK_SECONDS: f64 = 0.1;

static INIT: Once = Once::new();

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("test_backtrack_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test backtrack config at {}",
            config_path.display()
        );

        std::env::set_var("BACKTRACK_CONFIG_PATH", &config_path);
    });
}

/// Headless app stepping the fixed schedule at [`TICK_SECONDS`].
pub fn rewind_app() -> App {
    let mut app = build_headless_app();
    app.insert_resource(Time::<Fixed>::from_seconds(TICK_SECONDS));
    app
}

/// A body that only moves when the test writes its transform.
pub fn spawn_still_body(app: &mut App, settings: RewindSettings) -> Entity {
    let mut body = Body2d::new(Vec2::splat(0.5));
    body.gravity_scale = 0.0;
    app.world
        .spawn((Transform::default(), body, Sprite::default(), TimeBody::new(settings)))
        .id()
}

pub fn set_x(app: &mut App, entity: Entity, x: f32) {
    if let Some(mut transform) = app.world.get_mut::<Transform>(entity) {
        transform.translation.x = x;
    }
}

pub fn x_of(app: &App, entity: Entity) -> f32 {
    app.world
        .get::<Transform>(entity)
        .map(|transform| transform.translation.x)
        .unwrap_or(f32::NAN)
}

/// Record ticks `1..=count`, placing the body at `x = tick` before each.
pub fn record_positions(app: &mut App, entity: Entity, count: usize) {
    for tick in 1..=count {
        set_x(app, entity, tick as f32);
        run_fixed_tick(app);
    }
}

pub fn request(app: &mut App, request: RewindRequest) {
    app.world.send_event(request);
    run_frame(app, 0.0);
}

pub fn controller(app: &App, entity: Entity) -> &RewindController {
    app.world
        .get::<TimeBody>(entity)
        .and_then(TimeBody::controller)
        .expect("time body configured")
}

pub fn is_kinematic(app: &App, entity: Entity) -> bool {
    app.world
        .get::<Body2d>(entity)
        .map(|body| body.kinematic)
        .unwrap_or(false)
}
