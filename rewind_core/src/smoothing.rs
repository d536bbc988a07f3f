/// Eases the rewind effect weight toward its target once per rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSmoother {
    current: f32,
    target: f32,
    rate: f32,
}

impl EffectSmoother {
    pub fn new(rate: f32) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            rate,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target.clamp(0.0, 1.0);
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    /// Step toward the target by `frame_seconds` worth of exponential smoothing.
    pub fn advance(&mut self, frame_seconds: f32) -> f32 {
        let blend = (frame_seconds.max(0.0) * self.rate).min(1.0);
        self.current += (self.target - self.current) * blend;
        self.current = self.current.clamp(0.0, 1.0);
        self.current
    }
}
