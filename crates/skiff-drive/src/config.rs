//! Drive configuration.

/// Configuration for a [`Drive`](crate::Drive).
#[derive(Clone, Debug)]
pub struct DriveConfig {
    /// Capacity of each watch subscriber's event channel. A subscriber that
    /// falls further behind than this skips the missed events.
    pub watch_capacity: usize,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            watch_capacity: 1024,
        }
    }
}
