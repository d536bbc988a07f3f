use bevy::prelude::*;

use crate::{
    audio::AudioMixer,
    components::{BodyHandle, Body2d, EnergyBar, LifeState, RewindOverlay},
    config::GameConfigHandle,
    controller::{push_feedback, Collaborators, FillGauge, IntensityWeight, TickOutcome},
    time_body::TimeBody,
};

/// Start or stop rewinding every time body.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewindRequest {
    Start,
    Stop,
}

/// Fixed ticks elapsed since the app started.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTick(pub u64);

type RewindParts<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static mut TimeBody,
        &'static mut Transform,
        &'static mut Body2d,
        Option<&'static mut Sprite>,
        Option<&'static mut LifeState>,
    ),
>;

fn sync_time_body(
    entity: Entity,
    time_body: &mut TimeBody,
    tick_seconds: f64,
    duck_factor: f32,
) {
    match time_body.sync(tick_seconds, duck_factor) {
        Ok(Some(capacity)) => {
            tracing::debug!(
                target: "backtrack::rewind",
                ?entity,
                capacity = capacity.get(),
                tick_seconds,
                "rewind.configured"
            );
        }
        Ok(None) => {}
        Err(err) => {
            tracing::error!(
                target: "backtrack::rewind",
                ?entity,
                error = %err,
                "rewind.misconfigured"
            );
        }
    }
}

pub fn read_rewind_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut requests: EventWriter<RewindRequest>,
) {
    let Some(keys) = keys else {
        return;
    };
    if keys.just_pressed(KeyCode::Enter) {
        requests.send(RewindRequest::Start);
    }
    if keys.just_released(KeyCode::Enter) {
        requests.send(RewindRequest::Stop);
    }
}

pub fn apply_rewind_requests(
    mut requests: EventReader<RewindRequest>,
    fixed: Res<Time<Fixed>>,
    config: Res<GameConfigHandle>,
    tick: Res<FixedTick>,
    mut mixer: Option<ResMut<AudioMixer>>,
    mut bodies: RewindParts,
) {
    let tick_seconds = fixed.timestep().as_secs_f64();
    let duck_factor = config.get().audio.duck_factor;

    for request in requests.read() {
        for (entity, mut time_body, mut transform, mut body, mut sprite, mut life) in
            &mut bodies
        {
            sync_time_body(entity, &mut time_body, tick_seconds, duck_factor);

            if *request == RewindRequest::Start && !time_body.can_start_rewind() {
                tracing::warn!(
                    target: "backtrack::rewind",
                    ?entity,
                    error = ?time_body.fault(),
                    "rewind.refused"
                );
                continue;
            }
            let Some(controller) = time_body.controller_mut() else {
                continue;
            };

            let mut handle = BodyHandle::new(&mut transform, &mut body);
            let mut collaborators = Collaborators::new(&mut handle)
                .with_tint(sprite.as_deref_mut())
                .with_life(life.as_deref_mut())
                .with_audio(mixer.as_deref_mut());
            let changed = match request {
                RewindRequest::Start => controller.start_rewind(&mut collaborators),
                RewindRequest::Stop => controller.stop_rewind(&mut collaborators),
            };
            if !changed {
                continue;
            }
            let history = controller.history().len();
            match request {
                RewindRequest::Start => tracing::info!(
                    target: "backtrack::rewind",
                    ?entity,
                    tick = tick.0,
                    history,
                    "rewind.started"
                ),
                RewindRequest::Stop => tracing::info!(
                    target: "backtrack::rewind",
                    ?entity,
                    tick = tick.0,
                    history,
                    "rewind.stopped"
                ),
            }
        }
    }
}

pub fn advance_time_bodies(
    fixed: Res<Time<Fixed>>,
    config: Res<GameConfigHandle>,
    tick: Res<FixedTick>,
    mut mixer: Option<ResMut<AudioMixer>>,
    mut bodies: RewindParts,
) {
    let tick_seconds = fixed.timestep().as_secs_f64();
    let duck_factor = config.get().audio.duck_factor;

    for (entity, mut time_body, mut transform, mut body, mut sprite, mut life) in &mut bodies
    {
        sync_time_body(entity, &mut time_body, tick_seconds, duck_factor);
        let Some(controller) = time_body.controller_mut() else {
            continue;
        };

        let mut handle = BodyHandle::new(&mut transform, &mut body);
        let mut collaborators = Collaborators::new(&mut handle)
            .with_tint(sprite.as_deref_mut())
            .with_life(life.as_deref_mut())
            .with_audio(mixer.as_deref_mut());
        if controller.fixed_tick(&mut collaborators) == TickOutcome::Exhausted {
            tracing::info!(
                target: "backtrack::rewind",
                ?entity,
                tick = tick.0,
                "rewind.exhausted"
            );
        }
    }
}

pub fn advance_fixed_tick(mut tick: ResMut<FixedTick>) {
    tick.0 += 1;
}

pub fn advance_rewind_effects(time: Res<Time>, mut bodies: Query<&mut TimeBody>) {
    let frame_seconds = time.delta_seconds();
    for mut time_body in &mut bodies {
        if let Some(controller) = time_body.controller_mut() {
            controller.frame_tick(frame_seconds);
        }
    }
}

pub fn push_rewind_feedback(
    bodies: Query<&TimeBody>,
    mut overlays: Query<(&mut RewindOverlay, Option<&mut Sprite>), Without<EnergyBar>>,
    mut bars: Query<(&mut EnergyBar, Option<&mut Sprite>), Without<RewindOverlay>>,
) {
    for (mut overlay, sprite) in &mut overlays {
        let Some(controller) = bodies.get(overlay.source).ok().and_then(TimeBody::controller)
        else {
            continue;
        };
        push_feedback(
            controller,
            Some(&mut *overlay as &mut dyn IntensityWeight),
            None,
        );
        if let Some(mut sprite) = sprite {
            sprite.color.set_a(overlay.alpha());
        }
    }

    for (mut bar, sprite) in &mut bars {
        let Some(controller) = bodies.get(bar.source).ok().and_then(TimeBody::controller) else {
            continue;
        };
        push_feedback(controller, None, Some(&mut *bar as &mut dyn FillGauge));
        if let Some(mut sprite) = sprite {
            sprite.custom_size = Some(bar.size());
        }
    }
}
