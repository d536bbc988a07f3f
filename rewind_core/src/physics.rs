use bevy::prelude::*;

use crate::{
    components::{Body2d, Platform},
    config::GameConfigHandle,
};

const LANDING_TOLERANCE: f32 = 0.05;

/// Semi-implicit Euler step for every dynamic [`Body2d`], landing on
/// platform tops when falling through them.
pub fn integrate_bodies(
    fixed: Res<Time<Fixed>>,
    config: Res<GameConfigHandle>,
    mut bodies: Query<(&mut Transform, &mut Body2d)>,
    platforms: Query<(&Transform, &Platform), Without<Body2d>>,
) {
    let dt = fixed.timestep().as_secs_f32();
    let gravity = config.get().physics.gravity;

    for (mut transform, mut body) in &mut bodies {
        if body.kinematic {
            continue;
        }
        body.linear_velocity.y -= gravity * body.gravity_scale * dt;

        let previous_bottom = transform.translation.y - body.half_extents.y;
        transform.translation += (body.linear_velocity * dt).extend(0.0);
        if body.angular_velocity != 0.0 {
            transform.rotate_z(body.angular_velocity * dt);
        }

        body.grounded = false;
        if body.linear_velocity.y > 0.0 {
            continue;
        }
        for (platform_transform, platform) in &platforms {
            let top = platform_transform.translation.y + platform.half_extents.y;
            let horizontal_gap =
                (transform.translation.x - platform_transform.translation.x).abs();
            if horizontal_gap > platform.half_extents.x + body.half_extents.x {
                continue;
            }
            let bottom = transform.translation.y - body.half_extents.y;
            if previous_bottom >= top - LANDING_TOLERANCE && bottom <= top {
                transform.translation.y = top + body.half_extents.y;
                body.linear_velocity.y = 0.0;
                body.grounded = true;
                break;
            }
        }
    }
}
