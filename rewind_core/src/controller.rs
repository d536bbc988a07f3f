//! Record/rewind state machine for a single body.
//!
//! The controller owns its [`HistoryBuffer`] and talks to everything else
//! through the narrow collaborator traits below. Only the physics body is
//! required; every other collaborator is optional and skipped when absent.

use bevy::prelude::*;

use crate::{
    audio::Cue,
    config::{RewindError, RewindSettings},
    energy::energy_fill,
    history::HistoryBuffer,
    smoothing::EffectSmoother,
    snapshot::Snapshot,
};

/// Share of the ambient mix kept while rewinding unless configured otherwise.
pub const DEFAULT_DUCK_FACTOR: f32 = 0.3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RewindMode {
    #[default]
    Recording,
    Rewinding,
}

impl RewindMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewindMode::Recording => "recording",
            RewindMode::Rewinding => "rewinding",
        }
    }
}

/// What a fixed tick did to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Recorded,
    Rewound,
    /// History ran dry; the full stop sequence has already run.
    Exhausted,
}

pub trait PhysicsBody {
    fn position(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    fn linear_velocity(&self) -> Vec2;
    fn angular_velocity(&self) -> f32;
    fn set_position(&mut self, position: Vec3);
    fn set_rotation(&mut self, rotation: Quat);
    /// Kinematic bodies ignore gravity and collision response.
    fn set_kinematic(&mut self, kinematic: bool);
    fn set_velocity(&mut self, linear: Vec2, angular: f32);
}

/// Renderer color that reflects life-state feedback.
pub trait TintSurface {
    fn tint(&self) -> Color;
    fn set_tint(&mut self, tint: Color);
}

pub trait LifeSignals {
    /// Control is handed to the rewind; death visuals and locks must not apply.
    fn on_rewind_started(&mut self);
    fn on_rewind_stopped(&mut self) {}
}

pub trait AudioCues {
    fn play_one_shot(&mut self, cue: Cue);
    fn start_loop(&mut self, cue: Cue);
    fn stop_loop(&mut self);
    fn duck(&mut self, mix_factor: f32);
    fn restore_mix(&mut self);
}

/// Post-process weight driven by the smoothed rewind effect.
pub trait IntensityWeight {
    fn set_intensity_weight(&mut self, weight: f32);
}

/// UI gauge showing banked history.
pub trait FillGauge {
    fn set_fill_ratio(&mut self, ratio: f32);
}

/// Borrowed collaborators for one transition or tick.
pub struct Collaborators<'a> {
    body: &'a mut dyn PhysicsBody,
    tint: Option<&'a mut dyn TintSurface>,
    life: Option<&'a mut dyn LifeSignals>,
    audio: Option<&'a mut dyn AudioCues>,
}

impl<'a> Collaborators<'a> {
    pub fn new(body: &'a mut dyn PhysicsBody) -> Self {
        Self {
            body,
            tint: None,
            life: None,
            audio: None,
        }
    }

    pub fn with_tint<T: TintSurface + 'a>(mut self, tint: Option<&'a mut T>) -> Self {
        self.tint = tint.map(|surface| surface as &mut dyn TintSurface);
        self
    }

    pub fn with_life<L: LifeSignals + 'a>(mut self, life: Option<&'a mut L>) -> Self {
        self.life = life.map(|state| state as &mut dyn LifeSignals);
        self
    }

    pub fn with_audio<A: AudioCues + 'a>(mut self, audio: Option<&'a mut A>) -> Self {
        self.audio = audio.map(|cues| cues as &mut dyn AudioCues);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RewindController {
    mode: RewindMode,
    history: HistoryBuffer,
    effect: EffectSmoother,
    settings: RewindSettings,
    tick_seconds: f64,
    duck_factor: f32,
    /// Last snapshot applied during the current rewind; its velocity resumes motion on stop.
    carried: Option<Snapshot>,
}

impl RewindController {
    pub fn new(settings: RewindSettings, tick_seconds: f64) -> Result<Self, RewindError> {
        settings.validate()?;
        let capacity = HistoryBuffer::capacity_for(settings.record_seconds, tick_seconds)?;
        Ok(Self {
            mode: RewindMode::Recording,
            history: HistoryBuffer::new(capacity),
            effect: EffectSmoother::new(settings.transition_rate as f32),
            settings,
            tick_seconds,
            duck_factor: DEFAULT_DUCK_FACTOR,
            carried: None,
        })
    }

    /// Apply new settings, keeping as much history as the new capacity allows.
    /// A different tick length discards the history, since its entries were
    /// spaced for the old tick. On error the controller is left untouched.
    pub fn reconfigure(
        &mut self,
        settings: RewindSettings,
        tick_seconds: f64,
    ) -> Result<(), RewindError> {
        settings.validate()?;
        let capacity = HistoryBuffer::capacity_for(settings.record_seconds, tick_seconds)?;
        if tick_seconds != self.tick_seconds {
            self.history.clear();
            self.carried = None;
        }
        self.history.set_capacity(capacity);
        self.effect.set_rate(settings.transition_rate as f32);
        self.settings = settings;
        self.tick_seconds = tick_seconds;
        Ok(())
    }

    pub fn set_duck_factor(&mut self, duck_factor: f32) {
        self.duck_factor = duck_factor.clamp(0.0, 1.0);
    }

    pub fn mode(&self) -> RewindMode {
        self.mode
    }

    pub fn is_rewinding(&self) -> bool {
        self.mode == RewindMode::Rewinding
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn settings(&self) -> RewindSettings {
        self.settings
    }

    pub fn tick_seconds(&self) -> f64 {
        self.tick_seconds
    }

    pub fn effect_target(&self) -> f32 {
        self.effect.target()
    }

    pub fn effect_intensity(&self) -> f32 {
        self.effect.current()
    }

    pub fn fill_ratio(&self) -> f32 {
        energy_fill(&self.history)
    }

    /// Returns `false` when already rewinding.
    pub fn start_rewind(&mut self, collaborators: &mut Collaborators<'_>) -> bool {
        if self.mode == RewindMode::Rewinding {
            return false;
        }
        self.mode = RewindMode::Rewinding;
        self.carried = None;

        if let Some(life) = collaborators.life.as_deref_mut() {
            life.on_rewind_started();
        }
        collaborators.body.set_kinematic(true);
        self.effect.set_target(1.0);
        if let Some(audio) = collaborators.audio.as_deref_mut() {
            audio.duck(self.duck_factor);
            audio.start_loop(Cue::RewindLoop);
            audio.play_one_shot(Cue::RewindStart);
        }
        true
    }

    /// Returns `false` when already recording.
    pub fn stop_rewind(&mut self, collaborators: &mut Collaborators<'_>) -> bool {
        if self.mode == RewindMode::Recording {
            return false;
        }
        self.finish_rewind(collaborators);
        true
    }

    pub fn fixed_tick(&mut self, collaborators: &mut Collaborators<'_>) -> TickOutcome {
        match self.mode {
            RewindMode::Recording => {
                let tint = collaborators
                    .tint
                    .as_deref()
                    .map(|surface| surface.tint())
                    .unwrap_or(Color::WHITE);
                self.history
                    .record(Snapshot::capture(&*collaborators.body, tint));
                TickOutcome::Recorded
            }
            RewindMode::Rewinding => match self.history.pop_newest() {
                Some(snapshot) => {
                    collaborators.body.set_position(snapshot.position());
                    collaborators.body.set_rotation(snapshot.rotation());
                    if let Some(surface) = collaborators.tint.as_deref_mut() {
                        surface.set_tint(snapshot.tint());
                    }
                    self.carried = Some(snapshot);
                    TickOutcome::Rewound
                }
                None => {
                    self.finish_rewind(collaborators);
                    TickOutcome::Exhausted
                }
            },
        }
    }

    /// Advance the effect weight by one rendered frame.
    pub fn frame_tick(&mut self, frame_seconds: f32) -> f32 {
        self.effect.advance(frame_seconds)
    }

    fn finish_rewind(&mut self, collaborators: &mut Collaborators<'_>) {
        self.mode = RewindMode::Recording;

        collaborators.body.set_kinematic(false);
        let resume = self
            .carried
            .take()
            .or_else(|| self.history.peek_newest().copied());
        match resume {
            Some(snapshot) => collaborators
                .body
                .set_velocity(snapshot.linear_velocity(), snapshot.angular_velocity()),
            None => collaborators.body.set_velocity(Vec2::ZERO, 0.0),
        }
        self.effect.set_target(0.0);
        if let Some(audio) = collaborators.audio.as_deref_mut() {
            audio.stop_loop();
            audio.play_one_shot(Cue::RewindStop);
            audio.restore_mix();
        }
        if let Some(life) = collaborators.life.as_deref_mut() {
            life.on_rewind_stopped();
        }
    }
}

/// Push the controller's per-frame outputs to whichever feedback surfaces exist.
pub fn push_feedback(
    controller: &RewindController,
    effect: Option<&mut dyn IntensityWeight>,
    gauge: Option<&mut dyn FillGauge>,
) {
    if let Some(effect) = effect {
        effect.set_intensity_weight(controller.effect_intensity());
    }
    if let Some(gauge) = gauge {
        gauge.set_fill_ratio(controller.fill_ratio());
    }
}
