use bevy::prelude::*;

use crate::{
    audio::{AudioMixer, Cue},
    components::{overlaps, Body2d, FinishPoint, Hazard, LifeState, Player},
    config::GameConfigHandle,
    controller::AudioCues,
    systems::FixedTick,
    time_body::TimeBody,
};

/// Set once the player reaches a finish point.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LevelOutcome {
    pub completed_at: Option<u64>,
}

impl LevelOutcome {
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

pub fn detect_hazards(
    config: Res<GameConfigHandle>,
    tick: Res<FixedTick>,
    mut mixer: Option<ResMut<AudioMixer>>,
    mut players: Query<
        (
            Entity,
            &Transform,
            &mut Body2d,
            &mut LifeState,
            Option<&mut Sprite>,
            Option<&TimeBody>,
        ),
        With<Player>,
    >,
    hazards: Query<(&Transform, &Hazard), Without<Player>>,
) {
    let death_tint = config.get().death_color();

    for (entity, transform, mut body, mut life, sprite, time_body) in &mut players {
        if time_body.is_some_and(TimeBody::is_rewinding) {
            continue;
        }
        let position = transform.translation.truncate();
        let touching = hazards.iter().any(|(hazard_transform, hazard)| {
            overlaps(
                position,
                body.half_extents,
                hazard_transform.translation.truncate(),
                hazard.half_extents,
            )
        });
        if !touching || !life.die() {
            continue;
        }

        body.linear_velocity = Vec2::ZERO;
        body.angular_velocity = 0.0;
        body.kinematic = true;
        if let Some(mut sprite) = sprite {
            sprite.color = death_tint;
        }
        if let Some(mixer) = mixer.as_deref_mut() {
            mixer.play_one_shot(Cue::Death);
        }
        tracing::info!(
            target: "backtrack::level",
            ?entity,
            tick = tick.0,
            x = position.x,
            y = position.y,
            "player.died"
        );
    }
}

pub fn detect_finish(
    tick: Res<FixedTick>,
    mut outcome: ResMut<LevelOutcome>,
    mut mixer: Option<ResMut<AudioMixer>>,
    mut players: Query<(Entity, &Transform, &mut Body2d, &LifeState), With<Player>>,
    finishes: Query<(&Transform, &FinishPoint), Without<Player>>,
) {
    if outcome.is_complete() {
        return;
    }

    for (entity, transform, mut body, life) in &mut players {
        if !life.can_act() {
            continue;
        }
        let position = transform.translation.truncate();
        let reached = finishes.iter().any(|(finish_transform, finish)| {
            overlaps(
                position,
                body.half_extents,
                finish_transform.translation.truncate(),
                finish.half_extents,
            )
        });
        if !reached {
            continue;
        }

        outcome.completed_at = Some(tick.0);
        body.linear_velocity = Vec2::ZERO;
        body.kinematic = true;
        if let Some(mixer) = mixer.as_deref_mut() {
            mixer.play_one_shot(Cue::Victory);
        }
        tracing::info!(target: "backtrack::level", ?entity, tick = tick.0, "level.completed");
        return;
    }
}

/// Marks the "level complete" UI, kept hidden until [`LevelOutcome`] is set.
#[derive(Component, Debug, Default)]
pub struct VictoryBanner;

pub fn reveal_victory_banner(
    outcome: Res<LevelOutcome>,
    mut banners: Query<&mut Visibility, With<VictoryBanner>>,
) {
    if !outcome.is_changed() {
        return;
    }
    let visibility = if outcome.is_complete() {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
    for mut banner in &mut banners {
        banner.set_if_neq(visibility);
    }
}
