use std::num::NonZeroUsize;

use bevy::prelude::*;

use crate::{
    config::{RewindError, RewindSettings},
    controller::RewindController,
};

/// Per-entity owner of a [`RewindController`].
///
/// The controller is built lazily once the fixed tick length is known and
/// rebuilt in place whenever the settings or the tick change. A body whose
/// settings are invalid keeps the fault and refuses to start rewinding.
#[derive(Component, Debug)]
pub struct TimeBody {
    settings: RewindSettings,
    controller: Option<RewindController>,
    fault: Option<RewindError>,
    dirty: bool,
    /// Tick length of the last sync attempt, successful or not.
    synced_tick: Option<f64>,
}

impl TimeBody {
    pub fn new(settings: RewindSettings) -> Self {
        Self {
            settings,
            controller: None,
            fault: None,
            dirty: true,
            synced_tick: None,
        }
    }

    pub fn settings(&self) -> RewindSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: RewindSettings) {
        if settings != self.settings {
            self.settings = settings;
            self.dirty = true;
        }
    }

    pub fn controller(&self) -> Option<&RewindController> {
        self.controller.as_ref()
    }

    pub fn controller_mut(&mut self) -> Option<&mut RewindController> {
        self.controller.as_mut()
    }

    pub fn fault(&self) -> Option<&RewindError> {
        self.fault.as_ref()
    }

    pub fn is_rewinding(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(RewindController::is_rewinding)
    }

    /// Whether a start request may be honoured.
    pub fn can_start_rewind(&self) -> bool {
        self.controller.is_some() && self.fault.is_none()
    }

    /// Build or reconfigure the controller if anything changed.
    ///
    /// Returns the new capacity when the controller was (re)built and the
    /// fault when the settings were rejected. A rejected reconfiguration keeps
    /// the previous controller so an ongoing rewind can still be stopped.
    pub fn sync(
        &mut self,
        tick_seconds: f64,
        duck_factor: f32,
    ) -> Result<Option<NonZeroUsize>, RewindError> {
        let tick_changed = self.synced_tick != Some(tick_seconds);
        if !self.dirty && !tick_changed {
            if let Some(controller) = self.controller.as_mut() {
                controller.set_duck_factor(duck_factor);
            }
            return Ok(None);
        }
        self.dirty = false;
        self.synced_tick = Some(tick_seconds);

        let result = if let Some(controller) = self.controller.as_mut() {
            controller
                .reconfigure(self.settings, tick_seconds)
                .map(|()| controller.history().capacity())
        } else {
            match RewindController::new(self.settings, tick_seconds) {
                Ok(controller) => {
                    let capacity = controller.history().capacity();
                    self.controller = Some(controller);
                    Ok(capacity)
                }
                Err(err) => Err(err),
            }
        };
        if let Some(controller) = self.controller.as_mut() {
            controller.set_duck_factor(duck_factor);
        }

        match result {
            Ok(capacity) => {
                self.fault = None;
                Ok(Some(capacity))
            }
            Err(err) => {
                self.fault = Some(err.clone());
                Err(err)
            }
        }
    }
}

impl Default for TimeBody {
    fn default() -> Self {
        Self::new(RewindSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::DEFAULT_DUCK_FACTOR;

    #[test]
    fn first_sync_builds_controller() {
        let mut body = TimeBody::default();
        assert!(body.controller().is_none());

        let capacity = body.sync(0.02, DEFAULT_DUCK_FACTOR).expect("valid settings");
        assert_eq!(capacity.map(NonZeroUsize::get), Some(250));
        assert!(body.can_start_rewind());

        assert_eq!(body.sync(0.02, DEFAULT_DUCK_FACTOR), Ok(None));
    }

    #[test]
    fn invalid_settings_fault_without_controller() {
        let mut body = TimeBody::new(RewindSettings {
            record_seconds: -1.0,
            transition_rate: 5.0,
        });
        assert!(body.sync(0.02, DEFAULT_DUCK_FACTOR).is_err());
        assert!(body.controller().is_none());
        assert!(!body.can_start_rewind());
        assert_eq!(
            body.fault(),
            Some(&RewindError::NonPositiveRecordSeconds(-1.0))
        );
    }

    #[test]
    fn zero_tick_is_a_fault() {
        let mut body = TimeBody::default();
        assert_eq!(
            body.sync(0.0, DEFAULT_DUCK_FACTOR),
            Err(RewindError::NonPositiveTick(0.0))
        );
        assert!(!body.can_start_rewind());
    }

    #[test]
    fn valid_tick_after_a_bad_one_builds_the_controller() {
        let mut body = TimeBody::default();
        assert!(body.sync(0.0, DEFAULT_DUCK_FACTOR).is_err());
        assert!(body.controller().is_none());

        // Same bad tick again is not retried.
        assert_eq!(body.sync(0.0, DEFAULT_DUCK_FACTOR), Ok(None));

        let capacity = body.sync(0.1, DEFAULT_DUCK_FACTOR).expect("valid tick");
        assert_eq!(capacity.map(NonZeroUsize::get), Some(50));
        assert!(body.fault().is_none());
        assert!(body.can_start_rewind());
    }

    #[test]
    fn settings_change_recomputes_capacity() {
        let mut body = TimeBody::default();
        body.sync(0.1, DEFAULT_DUCK_FACTOR).expect("valid settings");

        body.set_settings(RewindSettings {
            record_seconds: 2.0,
            transition_rate: 5.0,
        });
        let capacity = body.sync(0.1, DEFAULT_DUCK_FACTOR).expect("valid settings");
        assert_eq!(capacity.map(NonZeroUsize::get), Some(20));
    }

    #[test]
    fn tick_change_recomputes_capacity() {
        let mut body = TimeBody::default();
        body.sync(0.1, DEFAULT_DUCK_FACTOR).expect("valid settings");
        let capacity = body.sync(0.05, DEFAULT_DUCK_FACTOR).expect("valid settings");
        assert_eq!(capacity.map(NonZeroUsize::get), Some(100));
    }

    #[test]
    fn rejected_reconfiguration_keeps_old_controller_but_refuses_start() {
        let mut body = TimeBody::default();
        body.sync(0.1, DEFAULT_DUCK_FACTOR).expect("valid settings");

        body.set_settings(RewindSettings {
            record_seconds: 0.0,
            transition_rate: 5.0,
        });
        assert!(body.sync(0.1, DEFAULT_DUCK_FACTOR).is_err());
        assert_eq!(
            body.controller().map(|c| c.history().capacity().get()),
            Some(50)
        );
        assert!(!body.can_start_rewind());
    }
}
