use crate::core::Component;

/// Sample-rate divider.
///
/// Counts bus clock cycles and fires once every `period` cycles: the tick
/// happens on the cycle the counter sits at `period - 1`, and the counter
/// returns to 0 on that same cycle. The owner decides when to clock it; a
/// timer that is not clocked simply holds its count.
#[derive(Debug)]
pub struct SampleTimer {
    counter: u16,
    period: u16,
}

impl SampleTimer {
    pub fn new(period: u16) -> Self {
        Self {
            counter: 0,
            period: period.max(1),
        }
    }

    pub fn reset(&mut self, period: u16) {
        self.counter = 0;
        self.period = period.max(1);
    }

    /// Restart the count from zero, keeping the period.
    pub fn restart(&mut self) {
        self.counter = 0;
    }

    /// Change the period. A counter already past the new terminal count is
    /// wrapped into range so the timer cannot stall waiting for a value it
    /// will never reach.
    pub fn set_period(&mut self, period: u16) {
        self.period = period.max(1);
        self.counter %= self.period;
    }

    pub fn period(&self) -> u16 {
        self.period
    }

    pub fn counter(&self) -> u16 {
        self.counter
    }

    /// True on the cycle the next `clock()` will fire.
    pub fn is_terminal(&self) -> bool {
        self.counter >= self.period - 1
    }

    /// Advance one cycle. Returns true if this cycle is a tick.
    pub fn clock(&mut self) -> bool {
        if self.is_terminal() {
            self.counter = 0;
            true
        } else {
            self.counter += 1;
            false
        }
    }
}

impl Default for SampleTimer {
    fn default() -> Self {
        Self::new(super::config_reg::DEFAULT_PERIOD)
    }
}

impl Component for SampleTimer {
    fn tick(&mut self) -> bool {
        self.clock()
    }
}
