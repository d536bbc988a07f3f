use crate::history::HistoryBuffer;

/// Fill level of the rewind energy gauge: how much history is banked.
pub fn energy_fill(history: &HistoryBuffer) -> f32 {
    history.occupancy_ratio() as f32
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use bevy::prelude::*;

    use super::*;
    use crate::snapshot::Snapshot;

    #[test]
    fn fill_tracks_banked_history() {
        let mut history = HistoryBuffer::new(NonZeroUsize::new(4).unwrap());
        assert_eq!(energy_fill(&history), 0.0);
        for _ in 0..3 {
            history.record(Snapshot::new(
                Vec3::ZERO,
                Quat::IDENTITY,
                Vec2::ZERO,
                0.0,
                Color::WHITE,
            ));
        }
        assert_eq!(energy_fill(&history), 0.75);
        history.pop_newest();
        assert_eq!(energy_fill(&history), 0.5);
    }
}
