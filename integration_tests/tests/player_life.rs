mod common;

use bevy::prelude::*;
use rewind_core::{
    run_fixed_tick, Body2d, FinishPoint, Hazard, LevelOutcome, LifeState, Platform, PlayerBundle,
    PlayerMotor, RewindRequest, RewindSettings,
};

use common::{controller, is_kinematic, request, rewind_app, x_of};

fn death_tint() -> Color {
    Color::rgba(1.0, 0.35, 0.35, 1.0)
}

fn spawn_floor(app: &mut App) {
    app.world.spawn((
        Transform::from_xyz(0.0, -1.0, 0.0),
        Platform {
            half_extents: Vec2::new(20.0, 0.5),
        },
    ));
}

/// Player standing on the floor at the origin, running right.
fn spawn_runner(app: &mut App) -> Entity {
    let player = app
        .world
        .spawn((
            PlayerBundle::new(RewindSettings::default(), Vec2::splat(0.5)),
            Transform::default(),
            Sprite::default(),
        ))
        .id();
    if let Some(mut motor) = app.world.get_mut::<PlayerMotor>(player) {
        motor.move_input = 1.0;
    }
    player
}

fn life(app: &App, player: Entity) -> LifeState {
    app.world
        .get::<LifeState>(player)
        .copied()
        .unwrap_or_default()
}

fn tint(app: &App, player: Entity) -> Option<Color> {
    app.world.get::<Sprite>(player).map(|sprite| sprite.color)
}

#[test]
fn runner_stays_on_the_floor() {
    let mut app = rewind_app();
    spawn_floor(&mut app);
    let player = spawn_runner(&mut app);

    for _ in 0..3 {
        run_fixed_tick(&mut app);
    }

    assert!((x_of(&app, player) - 3.0).abs() < 1e-4);
    let y = app.world.get::<Transform>(player).map(|t| t.translation.y);
    assert_eq!(y, Some(0.0));
    assert!(app.world.get::<Body2d>(player).is_some_and(|body| body.grounded));
}

#[test]
fn rewind_revives_a_player_killed_by_a_hazard() {
    let mut app = rewind_app();
    spawn_floor(&mut app);
    app.world.spawn((
        Transform::from_xyz(4.8, 0.0, 0.0),
        Hazard {
            half_extents: Vec2::splat(0.5),
        },
    ));
    let player = spawn_runner(&mut app);

    for _ in 0..4 {
        run_fixed_tick(&mut app);
    }
    assert!(life(&app, player).is_dead());
    assert!(is_kinematic(&app, player));
    assert_eq!(tint(&app, player), Some(death_tint()));

    // Dead bodies keep recording where they fell.
    run_fixed_tick(&mut app);
    assert!((x_of(&app, player) - 4.0).abs() < 1e-4);
    assert_eq!(controller(&app, player).history().len(), 5);

    request(&mut app, RewindRequest::Start);
    let state = life(&app, player);
    assert!(!state.is_dead());
    assert!(state.control_locked());

    run_fixed_tick(&mut app);
    assert_eq!(tint(&app, player), Some(death_tint()));
    run_fixed_tick(&mut app);
    assert!((x_of(&app, player) - 3.0).abs() < 1e-4);
    assert_eq!(tint(&app, player), Some(Color::WHITE));

    request(&mut app, RewindRequest::Stop);
    assert!(life(&app, player).can_act());
    assert!(!is_kinematic(&app, player));
    let velocity = app.world.get::<Body2d>(player).map(|body| body.linear_velocity);
    assert_eq!(velocity, Some(Vec2::new(10.0, 0.0)));
}

#[test]
fn hazards_are_ignored_while_rewinding() {
    let mut app = rewind_app();
    spawn_floor(&mut app);
    let player = spawn_runner(&mut app);
    for _ in 0..3 {
        run_fixed_tick(&mut app);
    }

    request(&mut app, RewindRequest::Start);
    app.world.spawn((
        Transform::from_xyz(2.0, 0.0, 0.0),
        Hazard {
            half_extents: Vec2::splat(0.5),
        },
    ));
    run_fixed_tick(&mut app);

    assert!(!life(&app, player).is_dead());
}

#[test]
fn reaching_the_finish_completes_the_level() {
    let mut app = rewind_app();
    spawn_floor(&mut app);
    app.world.spawn((
        Transform::from_xyz(3.0, 0.5, 0.0),
        FinishPoint {
            half_extents: Vec2::new(0.5, 1.0),
        },
    ));
    let player = spawn_runner(&mut app);

    for _ in 0..6 {
        run_fixed_tick(&mut app);
    }

    let outcome = *app.world.resource::<LevelOutcome>();
    assert_eq!(outcome.completed_at, Some(1));
    assert!(is_kinematic(&app, player));
    assert!((x_of(&app, player) - 2.0).abs() < 1e-4);
}
