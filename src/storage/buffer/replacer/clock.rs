use crate::common::types::FrameId;
use crate::storage::buffer::descriptor::FrameDescriptor;

/// Clock (second-chance) page replacement policy.
///
/// The hand sweeps circularly over the descriptor table. Invalid frames are
/// taken immediately; a set reference bit defers a frame once per sweep;
/// pinned frames are skipped indefinitely. A sweep is bounded at twice the
/// pool capacity, since a reference bit can defer a frame at most once; if
/// nothing is selected by then, every frame is pinned.
pub(crate) struct ClockReplacer {
    hand: usize,
    pool_size: usize,
}

impl ClockReplacer {
    pub(crate) fn new(pool_size: usize) -> Self {
        // Start on the last frame so the first advance lands on frame 0.
        Self {
            hand: pool_size.saturating_sub(1),
            pool_size,
        }
    }

    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.pool_size;
    }

    /// Select a victim frame, clearing reference bits along the way.
    /// Returns `None` when no frame becomes eligible within the sweep
    /// bound. The caller is responsible for writing back a dirty victim
    /// and resetting its descriptor.
    pub(crate) fn victim(&mut self, descriptors: &mut [FrameDescriptor]) -> Option<FrameId> {
        for _ in 0..2 * self.pool_size {
            self.advance();
            let desc = &mut descriptors[self.hand];

            if !desc.valid {
                return Some(self.hand as FrameId);
            } else if desc.ref_bit {
                // Second chance
                desc.ref_bit = false;
            } else if desc.pin_count > 0 {
                continue;
            } else {
                return Some(self.hand as FrameId);
            }
        }

        None
    }
}
