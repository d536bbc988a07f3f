use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::sprite::Anchor;
use tracing::info;

use rewind_core::{
    load_game_config_from_env, Body2d, EnergyBar, FinishPoint, GameConfigHandle, Hazard,
    Platform, PlayerBundle, RewindOverlay, RewindPlugin, TimeBody, VictoryBanner,
};

const PIXELS_PER_UNIT: f32 = 32.0;
const PLAYER_HALF_EXTENTS: Vec2 = Vec2::new(0.4, 0.5);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_game_config_from_env();
    info!(
        target: "backtrack::config",
        fixed_hz = config.fixed_hz,
        record_seconds = config.rewind.record_seconds,
        "Backtrack starting"
    );

    App::new()
        .insert_resource(GameConfigHandle::new(config))
        .insert_resource(ClearColor(Color::rgb(0.08, 0.09, 0.12)))
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Backtrack".into(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .add_plugins(RewindPlugin)
        .add_systems(Startup, spawn_level)
        .run();
}

fn block(color: Color, center: Vec2, half_extents: Vec2, z: f32) -> SpriteBundle {
    SpriteBundle {
        sprite: Sprite {
            color,
            custom_size: Some(half_extents * 2.0),
            ..default()
        },
        transform: Transform::from_translation(center.extend(z)),
        ..default()
    }
}

fn spawn_level(mut commands: Commands, config: Res<GameConfigHandle>) {
    let settings = config.get().rewind;

    let mut camera = Camera2dBundle::default();
    camera.projection.scale = 1.0 / PIXELS_PER_UNIT;
    camera.transform.translation.x = 4.0;
    commands.spawn(camera);

    let platforms = [
        (Vec2::new(4.0, -5.0), Vec2::new(14.0, 0.5)),
        (Vec2::new(1.0, -1.5), Vec2::new(2.0, 0.25)),
        (Vec2::new(8.0, -0.5), Vec2::new(2.5, 0.25)),
    ];
    for (center, half_extents) in platforms {
        commands.spawn((
            block(Color::rgb(0.35, 0.38, 0.45), center, half_extents, 0.0),
            Platform { half_extents },
        ));
    }

    let spikes = Vec2::new(1.5, 0.25);
    commands.spawn((
        block(Color::rgb(0.85, 0.2, 0.2), Vec2::new(4.5, -4.25), spikes, 0.0),
        Hazard {
            half_extents: spikes,
        },
    ));

    let flag = Vec2::new(0.5, 1.0);
    commands.spawn((
        block(Color::rgb(0.95, 0.85, 0.3), Vec2::new(15.0, -3.5), flag, 0.0),
        FinishPoint { half_extents: flag },
    ));

    let crate_half = Vec2::splat(0.5);
    commands.spawn((
        block(Color::rgb(0.6, 0.45, 0.25), Vec2::new(8.0, 2.0), crate_half, 0.5),
        Body2d::new(crate_half),
        TimeBody::new(settings),
    ));

    let player = commands
        .spawn((
            block(Color::WHITE, Vec2::new(-6.0, -3.0), PLAYER_HALF_EXTENTS, 1.0),
            PlayerBundle::new(settings, PLAYER_HALF_EXTENTS),
        ))
        .id();

    commands.spawn((
        block(
            Color::rgba(0.35, 0.55, 1.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(20.0, 12.0),
            10.0,
        ),
        RewindOverlay::new(player, 0.35),
    ));

    let bar_height = 0.3;
    commands.spawn((
        SpriteBundle {
            sprite: Sprite {
                color: Color::rgb(0.4, 0.8, 1.0),
                custom_size: Some(Vec2::new(0.0, bar_height)),
                anchor: Anchor::CenterLeft,
                ..default()
            },
            transform: Transform::from_xyz(-14.0, 10.5, 11.0),
            ..default()
        },
        EnergyBar::new(player, 8.0, bar_height),
    ));

    let mut banner = block(
        Color::rgba(0.95, 0.85, 0.3, 0.85),
        Vec2::new(4.0, 3.0),
        Vec2::new(6.0, 1.5),
        12.0,
    );
    banner.visibility = Visibility::Hidden;
    commands.spawn((banner, VictoryBanner));

    info!(target: "backtrack::level", ?player, "level.spawned");
}
