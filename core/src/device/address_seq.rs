/// Circular word-address counter over `0..limit`.
///
/// `limit` is the exclusive bound from the configuration word. With a limit
/// of zero there is no valid address; the controller never asks for one in
/// that case.
#[derive(Debug, Default)]
pub struct AddressSequencer {
    current: u8,
    limit: u8,
}

impl AddressSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart at address 0 with a new bound.
    pub fn rearm(&mut self, limit: u8) {
        self.current = 0;
        self.limit = limit;
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn limit(&self) -> u8 {
        self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }

    /// Address that follows `current`, wrapping at the bound.
    pub fn next(&self) -> u8 {
        match self.current.checked_add(1) {
            Some(next) if next < self.limit => next,
            _ => 0,
        }
    }

    pub fn advance(&mut self) -> u8 {
        self.current = self.next();
        self.current
    }

    /// Change the bound while running. Returns true if the current address
    /// fell outside the new range and was clamped back to 0.
    pub fn set_limit(&mut self, limit: u8) -> bool {
        self.limit = limit;
        if self.current >= limit && self.current != 0 {
            self.current = 0;
            true
        } else {
            false
        }
    }
}
