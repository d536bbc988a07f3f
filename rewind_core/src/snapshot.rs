use bevy::prelude::*;

use crate::controller::PhysicsBody;

/// Physical and visual state of one body at one fixed tick.
///
/// Fields are only readable; a recorded snapshot is copied in and out of the
/// history by value and never edited in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    position: Vec3,
    rotation: Quat,
    linear_velocity: Vec2,
    angular_velocity: f32,
    tint: Color,
}

impl Snapshot {
    pub fn new(
        position: Vec3,
        rotation: Quat,
        linear_velocity: Vec2,
        angular_velocity: f32,
        tint: Color,
    ) -> Self {
        Self {
            position,
            rotation,
            linear_velocity,
            angular_velocity,
            tint,
        }
    }

    /// Capture the live state of `body` together with its current tint.
    pub fn capture(body: &dyn PhysicsBody, tint: Color) -> Self {
        Self::new(
            body.position(),
            body.rotation(),
            body.linear_velocity(),
            body.angular_velocity(),
            tint,
        )
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn tint(&self) -> Color {
        self.tint
    }
}
