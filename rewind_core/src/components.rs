use bevy::prelude::*;

use crate::controller::{FillGauge, IntensityWeight, LifeSignals, PhysicsBody, TintSurface};

/// Minimal 2D rigid body integrated by [`crate::physics::integrate_bodies`].
#[derive(Component, Debug, Clone)]
pub struct Body2d {
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    /// Kinematic bodies are moved only by direct writes.
    pub kinematic: bool,
    pub gravity_scale: f32,
    pub half_extents: Vec2,
    pub grounded: bool,
}

impl Body2d {
    pub fn new(half_extents: Vec2) -> Self {
        Self {
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            kinematic: false,
            gravity_scale: 1.0,
            half_extents,
            grounded: false,
        }
    }
}

/// Adapts an entity's `Transform` and `Body2d` to the rewind engine.
pub struct BodyHandle<'a> {
    transform: &'a mut Transform,
    body: &'a mut Body2d,
}

impl<'a> BodyHandle<'a> {
    pub fn new(transform: &'a mut Transform, body: &'a mut Body2d) -> Self {
        Self { transform, body }
    }
}

impl PhysicsBody for BodyHandle<'_> {
    fn position(&self) -> Vec3 {
        self.transform.translation
    }

    fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    fn linear_velocity(&self) -> Vec2 {
        self.body.linear_velocity
    }

    fn angular_velocity(&self) -> f32 {
        self.body.angular_velocity
    }

    fn set_position(&mut self, position: Vec3) {
        self.transform.translation = position;
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }

    fn set_kinematic(&mut self, kinematic: bool) {
        self.body.kinematic = kinematic;
    }

    fn set_velocity(&mut self, linear: Vec2, angular: f32) {
        self.body.linear_velocity = linear;
        self.body.angular_velocity = angular;
    }
}

impl TintSurface for Sprite {
    fn tint(&self) -> Color {
        self.color
    }

    fn set_tint(&mut self, tint: Color) {
        self.color = tint;
    }
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Alive/dead status plus the control lock held while a rewind is running.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifeState {
    dead: bool,
    control_locked: bool,
}

impl LifeState {
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn control_locked(&self) -> bool {
        self.control_locked
    }

    pub fn can_act(&self) -> bool {
        !self.dead && !self.control_locked
    }

    /// Returns `false` if the body is already dead or being rewound.
    pub fn die(&mut self) -> bool {
        if !self.can_act() {
            return false;
        }
        self.dead = true;
        true
    }
}

impl LifeSignals for LifeState {
    fn on_rewind_started(&mut self) {
        self.dead = false;
        self.control_locked = true;
    }

    fn on_rewind_stopped(&mut self) {
        self.control_locked = false;
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Platform {
    pub half_extents: Vec2,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Hazard {
    pub half_extents: Vec2,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct FinishPoint {
    pub half_extents: Vec2,
}

/// Full-screen tint whose alpha follows a time body's rewind effect weight.
#[derive(Component, Debug, Clone, Copy)]
pub struct RewindOverlay {
    pub source: Entity,
    pub max_alpha: f32,
    pub intensity_weight: f32,
}

impl RewindOverlay {
    pub fn new(source: Entity, max_alpha: f32) -> Self {
        Self {
            source,
            max_alpha,
            intensity_weight: 0.0,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.max_alpha * self.intensity_weight
    }
}

impl IntensityWeight for RewindOverlay {
    fn set_intensity_weight(&mut self, weight: f32) {
        self.intensity_weight = weight.clamp(0.0, 1.0);
    }
}

/// Horizontal gauge showing how much history a time body has banked.
#[derive(Component, Debug, Clone, Copy)]
pub struct EnergyBar {
    pub source: Entity,
    pub full_width: f32,
    pub height: f32,
    pub fill_ratio: f32,
}

impl EnergyBar {
    pub fn new(source: Entity, full_width: f32, height: f32) -> Self {
        Self {
            source,
            full_width,
            height,
            fill_ratio: 0.0,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.full_width * self.fill_ratio, self.height)
    }
}

impl FillGauge for EnergyBar {
    fn set_fill_ratio(&mut self, ratio: f32) {
        self.fill_ratio = ratio.clamp(0.0, 1.0);
    }
}

pub fn overlaps(a_center: Vec2, a_half: Vec2, b_center: Vec2, b_half: Vec2) -> bool {
    let gap = (a_center - b_center).abs();
    gap.x <= a_half.x + b_half.x && gap.y <= a_half.y + b_half.y
}
