use bevy::prelude::*;

use crate::{
    audio::{AudioMixer, Cue},
    components::{Body2d, LifeState, Player},
    config::{GameConfigHandle, RewindSettings},
    controller::AudioCues,
    time_body::TimeBody,
};

/// Latched input plus the jump forgiveness timers.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct PlayerMotor {
    /// Horizontal intent in `[-1, 1]`.
    pub move_input: f32,
    pub jump_requested: bool,
    pub jump_held: bool,
    pub jump_buffer: f32,
    pub coyote: f32,
}

#[derive(Bundle)]
pub struct PlayerBundle {
    pub player: Player,
    pub body: Body2d,
    pub life: LifeState,
    pub motor: PlayerMotor,
    pub time_body: TimeBody,
}

impl PlayerBundle {
    pub fn new(settings: RewindSettings, half_extents: Vec2) -> Self {
        Self {
            player: Player,
            body: Body2d::new(half_extents),
            life: LifeState::default(),
            motor: PlayerMotor::default(),
            time_body: TimeBody::new(settings),
        }
    }
}

pub fn read_player_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut motors: Query<&mut PlayerMotor, With<Player>>,
) {
    let Some(keys) = keys else {
        return;
    };
    let left = keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]);
    let right = keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]);
    let move_input = match (left, right) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    };

    for mut motor in &mut motors {
        motor.move_input = move_input;
        motor.jump_held = keys.pressed(KeyCode::Space);
        if keys.just_pressed(KeyCode::Space) {
            motor.jump_requested = true;
        }
    }
}

pub fn drive_players(
    fixed: Res<Time<Fixed>>,
    config: Res<GameConfigHandle>,
    mut mixer: Option<ResMut<AudioMixer>>,
    mut players: Query<
        (
            Entity,
            &mut PlayerMotor,
            &mut Body2d,
            &LifeState,
            Option<&mut Sprite>,
        ),
        With<Player>,
    >,
) {
    let dt = fixed.timestep().as_secs_f32();
    let cfg = config.get();
    let tuning = &cfg.player;

    for (entity, mut motor, mut body, life, sprite) in &mut players {
        if std::mem::take(&mut motor.jump_requested) {
            motor.jump_buffer = tuning.jump_buffer_seconds;
        } else {
            motor.jump_buffer = (motor.jump_buffer - dt).max(0.0);
        }
        if body.grounded {
            motor.coyote = tuning.coyote_seconds;
        } else {
            motor.coyote = (motor.coyote - dt).max(0.0);
        }

        if !life.can_act() || body.kinematic {
            motor.jump_buffer = 0.0;
            continue;
        }

        body.linear_velocity.x = motor.move_input * tuning.move_speed;
        if let Some(mut sprite) = sprite {
            if motor.move_input < 0.0 {
                sprite.flip_x = true;
            } else if motor.move_input > 0.0 {
                sprite.flip_x = false;
            }
        }

        if motor.jump_buffer > 0.0 && motor.coyote > 0.0 {
            body.linear_velocity.y = tuning.jump_speed;
            body.grounded = false;
            motor.jump_buffer = 0.0;
            motor.coyote = 0.0;
            if let Some(mixer) = mixer.as_deref_mut() {
                mixer.play_one_shot(Cue::Jump);
            }
            tracing::debug!(target: "backtrack::level", ?entity, "player.jumped");
        }

        body.gravity_scale = if body.linear_velocity.y < 0.0 {
            tuning.fall_multiplier
        } else if body.linear_velocity.y > 0.0 && !motor.jump_held {
            tuning.low_jump_multiplier
        } else {
            1.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioRequest;
    use bevy::prelude::World;
    use bevy_ecs::system::RunSystemOnce;

    fn player_world() -> (World, Entity) {
        let mut world = World::default();
        world.insert_resource(Time::<Fixed>::from_seconds(0.02));
        world.insert_resource(GameConfigHandle::default());
        world.insert_resource(AudioMixer::default());
        let entity = world
            .spawn(PlayerBundle::new(RewindSettings::default(), Vec2::splat(0.5)))
            .id();
        (world, entity)
    }

    fn motor(world: &mut World, entity: Entity) -> Mut<'_, PlayerMotor> {
        world.get_mut::<PlayerMotor>(entity).unwrap()
    }

    fn set_grounded(world: &mut World, entity: Entity, grounded: bool) {
        world.get_mut::<Body2d>(entity).unwrap().grounded = grounded;
    }

    #[test]
    fn grounded_player_runs_and_jumps() {
        let (mut world, entity) = player_world();
        set_grounded(&mut world, entity, true);
        {
            let mut motor = motor(&mut world, entity);
            motor.move_input = 1.0;
            motor.jump_requested = true;
            motor.jump_held = true;
        }

        world.run_system_once(drive_players);

        let body = world.get::<Body2d>(entity).unwrap();
        assert_eq!(body.linear_velocity, Vec2::new(10.0, 16.0));
        assert!(!body.grounded);
        assert_eq!(body.gravity_scale, 1.0);
        assert_eq!(
            world.resource::<AudioMixer>().pending(),
            &[AudioRequest::PlayOneShot(Cue::Jump)]
        );
    }

    #[test]
    fn coyote_window_allows_a_late_jump() {
        let (mut world, entity) = player_world();
        set_grounded(&mut world, entity, true);
        world.run_system_once(drive_players);

        set_grounded(&mut world, entity, false);
        motor(&mut world, entity).jump_requested = true;
        world.run_system_once(drive_players);

        assert_eq!(world.get::<Body2d>(entity).unwrap().linear_velocity.y, 16.0);
    }

    #[test]
    fn expired_coyote_window_blocks_the_jump() {
        let (mut world, entity) = player_world();
        set_grounded(&mut world, entity, true);
        world.run_system_once(drive_players);

        set_grounded(&mut world, entity, false);
        for _ in 0..6 {
            world.run_system_once(drive_players);
        }
        motor(&mut world, entity).jump_requested = true;
        world.run_system_once(drive_players);

        assert_eq!(world.get::<Body2d>(entity).unwrap().linear_velocity.y, 0.0);
        assert!(world.resource::<AudioMixer>().pending().is_empty());
    }

    #[test]
    fn buffered_jump_fires_on_landing() {
        let (mut world, entity) = player_world();
        motor(&mut world, entity).jump_requested = true;
        world.run_system_once(drive_players);
        assert_eq!(world.get::<Body2d>(entity).unwrap().linear_velocity.y, 0.0);

        set_grounded(&mut world, entity, true);
        world.run_system_once(drive_players);
        assert_eq!(world.get::<Body2d>(entity).unwrap().linear_velocity.y, 16.0);
    }

    #[test]
    fn released_jump_and_falling_raise_gravity() {
        let (mut world, entity) = player_world();
        world.get_mut::<Body2d>(entity).unwrap().linear_velocity.y = 5.0;
        world.run_system_once(drive_players);
        assert_eq!(world.get::<Body2d>(entity).unwrap().gravity_scale, 2.0);

        world.get_mut::<Body2d>(entity).unwrap().linear_velocity.y = -5.0;
        world.run_system_once(drive_players);
        assert_eq!(world.get::<Body2d>(entity).unwrap().gravity_scale, 2.5);
    }

    #[test]
    fn dead_or_locked_player_ignores_input() {
        let (mut world, entity) = player_world();
        set_grounded(&mut world, entity, true);
        world.get_mut::<LifeState>(entity).unwrap().die();
        {
            let mut motor = motor(&mut world, entity);
            motor.move_input = -1.0;
            motor.jump_requested = true;
        }

        world.run_system_once(drive_players);

        assert_eq!(world.get::<Body2d>(entity).unwrap().linear_velocity, Vec2::ZERO);
        assert_eq!(world.get::<PlayerMotor>(entity).unwrap().jump_buffer, 0.0);
        assert!(world.resource::<AudioMixer>().pending().is_empty());
    }

    #[test]
    fn sprite_faces_the_direction_of_travel() {
        let (mut world, entity) = player_world();
        world.entity_mut(entity).insert(Sprite::default());
        motor(&mut world, entity).move_input = -1.0;
        world.run_system_once(drive_players);
        assert!(world.get::<Sprite>(entity).unwrap().flip_x);

        motor(&mut world, entity).move_input = 1.0;
        world.run_system_once(drive_players);
        assert!(!world.get::<Sprite>(entity).unwrap().flip_x);
    }
}
