//! Single-slot storage used by the boundary detector.

/// Lossless one-element delay buffer.
///
/// Holds exactly one pending element together with a flag recording whether
/// it was the first element of its packet. Every capture overwrites the slot.
#[derive(Debug, Clone, Default)]
pub struct DelayBuffer<T> {
    slot: Option<T>,
    first: bool,
}

impl<T: Copy + Default> DelayBuffer<T> {
    pub fn new() -> Self {
        Self {
            slot: None,
            first: false,
        }
    }

    /// Store `value`, replacing whatever was buffered.
    pub fn capture(&mut self, value: T, first: bool) {
        self.slot = Some(value);
        self.first = first;
    }

    /// The buffered element, or `T::default()` when empty.
    pub fn payload(&self) -> T {
        self.slot.unwrap_or_default()
    }

    /// Whether the buffered element opened its packet.
    pub fn is_first(&self) -> bool {
        self.first
    }

    pub fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }

    /// Empty the slot and clear the first flag.
    pub fn reset(&mut self) {
        self.slot = None;
        self.first = false;
    }
}

/// A level latched with OR semantics until explicitly cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StickyFlag(bool);

impl StickyFlag {
    /// OR `level` into the flag.
    pub fn accumulate(&mut self, level: bool) {
        self.0 |= level;
    }

    pub fn get(self) -> bool {
        self.0
    }

    pub fn clear(&mut self) {
        self.0 = false;
    }

    /// Read the flag and clear it.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_reads_default() {
        let buffer = DelayBuffer::<u8>::new();
        assert!(!buffer.is_occupied());
        assert!(!buffer.is_first());
        assert_eq!(buffer.payload(), 0);
    }

    #[test]
    fn capture_overwrites_slot_and_flag() {
        let mut buffer = DelayBuffer::new();
        buffer.capture(0xAAu8, true);
        assert_eq!((buffer.payload(), buffer.is_first()), (0xAA, true));

        buffer.capture(0xBB, false);
        assert_eq!((buffer.payload(), buffer.is_first()), (0xBB, false));
        assert!(buffer.is_occupied());
    }

    #[test]
    fn reset_empties_slot() {
        let mut buffer = DelayBuffer::new();
        buffer.capture(7u8, true);
        buffer.reset();
        assert!(!buffer.is_occupied());
        assert!(!buffer.is_first());
    }

    #[test]
    fn sticky_flag_latches_until_cleared() {
        let mut flag = StickyFlag::default();
        flag.accumulate(false);
        assert!(!flag.get());
        flag.accumulate(true);
        flag.accumulate(false);
        assert!(flag.get());
        flag.clear();
        assert!(!flag.get());
    }

    #[test]
    fn sticky_take_clears() {
        let mut flag = StickyFlag::default();
        flag.accumulate(true);
        assert!(flag.take());
        assert!(!flag.take());
    }
}
