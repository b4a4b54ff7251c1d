//! Running-minimum SLD accumulator.

/// Tracks the nadir of one patient's SLD over visits in ascending order.
///
/// Visit 0 resets the accumulator to that visit's SLD. A visit without an SLD
/// carries the previous nadir forward.
#[derive(Debug, Clone, Copy, Default)]
pub struct NadirTracker {
    current: Option<f64>,
}

impl NadirTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next visit and return its nadir.
    pub fn observe(&mut self, event_num: u32, sum_of_lesions: Option<f64>) -> Option<f64> {
        self.current = if event_num == 0 {
            sum_of_lesions
        } else {
            match (sum_of_lesions, self.current) {
                (Some(s), Some(n)) => Some(s.min(n)),
                (s, n) => s.or(n),
            }
        };
        self.current
    }
}
