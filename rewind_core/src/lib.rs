//! Time-rewind engine for the Backtrack side-scroller.
//!
//! Every body carrying a [`TimeBody`] records a [`Snapshot`] per fixed tick
//! into a bounded history and, while a rewind is held, replays that history
//! newest-first. [`RewindPlugin`] wires the engine, the player controller, the
//! level rules and the audio mixer into a Bevy [`App`].

pub mod audio;
mod components;
pub mod config;
pub mod controller;
mod energy;
pub mod history;
mod level;
mod physics;
mod player;
mod smoothing;
mod snapshot;
mod systems;
mod time_body;

use std::time::Duration;

use bevy::prelude::*;

pub use audio::{
    read_audio_input, AudioChannel, AudioClips, AudioMixer, AudioRequest, Cue, MixLevels,
};
pub use components::{
    overlaps, Body2d, BodyHandle, EnergyBar, FinishPoint, Hazard, LifeState, Platform, Player,
    RewindOverlay,
};
pub use config::{
    load_game_config_from_env, GameConfig, GameConfigError, GameConfigHandle, RewindError,
    RewindSettings,
};
pub use controller::{
    push_feedback, AudioCues, Collaborators, FillGauge, IntensityWeight, LifeSignals,
    PhysicsBody, RewindController, RewindMode, TickOutcome, TintSurface,
};
pub use energy::energy_fill;
pub use history::HistoryBuffer;
pub use level::{
    detect_finish, detect_hazards, reveal_victory_banner, LevelOutcome, VictoryBanner,
};
pub use physics::integrate_bodies;
pub use player::{drive_players, read_player_input, PlayerBundle, PlayerMotor};
pub use smoothing::EffectSmoother;
pub use snapshot::Snapshot;
pub use systems::{
    advance_fixed_tick, advance_rewind_effects, advance_time_bodies, apply_rewind_requests,
    push_rewind_feedback, read_rewind_input, FixedTick, RewindRequest,
};
pub use time_body::TimeBody;

/// Registers the rewind resources and schedules.
///
/// Simulation runs in `FixedUpdate` (player drive, rewind tick, physics, level
/// rules); input, rewind requests, effect smoothing, feedback and audio run in
/// `Update`. An existing [`GameConfigHandle`] or [`AudioMixer`] is respected;
/// otherwise the mixer starts from the configured volumes.
pub struct RewindPlugin;

impl Plugin for RewindPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameConfigHandle>()
            .init_resource::<AudioClips>()
            .init_resource::<LevelOutcome>()
            .init_resource::<FixedTick>()
            .add_event::<RewindRequest>();

        let config = app.world.resource::<GameConfigHandle>().get();
        if !app.world.contains_resource::<AudioMixer>() {
            app.insert_resource(AudioMixer::from_config(&config.audio));
        }

        let fixed_hz = config.fixed_hz;
        if fixed_hz.is_finite() && fixed_hz > 0.0 {
            app.insert_resource(Time::<Fixed>::from_hz(fixed_hz));
        } else {
            tracing::error!(
                target: "backtrack::config",
                fixed_hz,
                "config.fixed_hz.invalid"
            );
        }

        app.add_systems(
            Startup,
            (audio::load_audio_clips, audio::start_background_music).chain(),
        )
        .add_systems(
            FixedUpdate,
            (
                drive_players,
                advance_time_bodies,
                integrate_bodies,
                detect_hazards,
                detect_finish,
                advance_fixed_tick,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                read_player_input,
                read_rewind_input,
                apply_rewind_requests,
                advance_rewind_effects,
                push_rewind_feedback,
                reveal_victory_banner,
                read_audio_input,
                audio::apply_audio_requests,
            )
                .chain(),
        );
    }
}

/// Construct a windowless [`App`] running the rewind pipeline on the builtin
/// configuration.
pub fn build_headless_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(RewindPlugin);
    app
}

/// Execute exactly one fixed simulation tick.
pub fn run_fixed_tick(app: &mut App) {
    app.world.run_schedule(FixedUpdate);
}

/// Advance frame time by `seconds` and run the per-frame systems once.
pub fn run_frame(app: &mut App, seconds: f32) {
    app.world
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(seconds.max(0.0)));
    app.world.run_schedule(Update);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_app_uses_configured_fixed_rate() {
        let app = build_headless_app();
        let timestep = app.world.resource::<Time<Fixed>>().timestep();
        assert_eq!(timestep, Duration::from_millis(20));
    }

    #[test]
    fn headless_app_records_on_fixed_ticks() {
        let mut app = build_headless_app();
        let player = app
            .world
            .spawn((
                PlayerBundle::new(RewindSettings::default(), Vec2::splat(0.5)),
                Transform::default(),
            ))
            .id();

        for _ in 0..4 {
            run_fixed_tick(&mut app);
        }

        assert_eq!(app.world.resource::<FixedTick>().0, 4);
        let history = app
            .world
            .get::<TimeBody>(player)
            .and_then(TimeBody::controller)
            .map(|controller| controller.history().len());
        assert_eq!(history, Some(4));
    }
}
