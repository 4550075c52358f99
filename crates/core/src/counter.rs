/// Monotonic index for diagnostic artifact names (`FAIL_WinWait_<n>.png`).
///
/// Starts at zero; the first call to [`FailureCounter::next`] yields 1.
#[derive(Debug, Clone, Default)]
pub struct FailureCounter {
    value: u64,
}

impl FailureCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and return the new value.
    pub fn next(&mut self) -> u64 {
        self.value += 1;
        self.value
    }

    /// The last value handed out (zero before the first failure).
    pub fn current(&self) -> u64 {
        self.value
    }
}
