//! Configuration for the bounded command ring.

/// Configuration for [`crate::ring::Ring`] and [`crate::device::DeviceStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    /// Number of retained commands (`K` in the design doc).
    capacity: usize,
}

impl RingConfig {
    /// Creates a new configuration with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub const fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be non-zero");
        Self { capacity }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RingConfig {
    /// The reference `/dev/aesdchar` retains the last 10 write commands.
    fn default() -> Self {
        Self::new(AESD_RING_CAPACITY)
    }
}

/// Number of commands `/dev/aesdchar` retains (`K` in the design doc).
pub const AESD_RING_CAPACITY: usize = 10;
