/// 8-bit DAC input register. Only the digital code is modeled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DacRegister {
    /// Code most recently driven by the output stage (0-255 unsigned).
    value: u8,
}

impl DacRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, data: u8) {
        self.value = data;
    }

    pub fn code(&self) -> u8 {
        self.value
    }

    /// Return current output as a signed 16-bit PCM sample.
    /// Maps 0x00 → -32768, 0x80 → 0, 0xFF → +32512.
    pub fn sample_i16(&self) -> i16 {
        ((self.value as i16) - 128) * 256
    }
}
