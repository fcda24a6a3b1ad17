use super::dac::DacRegister;

/// Unpacks fetched words into byte samples, least-significant byte first.
///
/// `byte_index` is the byte the next emit will drive. After byte 3 has been
/// driven it wraps back to 0 and the stage reports itself exhausted until
/// the next word is loaded.
#[derive(Debug, Default)]
pub struct OutputStage {
    word: u32,
    byte_index: u8,
    loaded: bool,
    dac: DacRegister,
}

impl OutputStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Forget the current word without touching the DAC, which keeps
    /// holding its last code.
    pub fn rearm(&mut self) {
        self.word = 0;
        self.byte_index = 0;
        self.loaded = false;
    }

    pub fn load(&mut self, word: u32) {
        self.word = word;
        self.byte_index = 0;
        self.loaded = true;
    }

    /// True once every byte of the current word has been driven.
    pub fn is_exhausted(&self) -> bool {
        !self.loaded
    }

    /// Drive the next byte of the current word to the DAC.
    pub fn emit(&mut self) -> u8 {
        let code = self.word.to_le_bytes()[self.byte_index as usize];
        self.dac.write(code);
        self.byte_index = (self.byte_index + 1) % 4;
        if self.byte_index == 0 {
            self.loaded = false;
        }
        code
    }

    pub fn word(&self) -> u32 {
        self.word
    }

    pub fn byte_index(&self) -> u8 {
        self.byte_index
    }

    pub fn dac(&self) -> &DacRegister {
        &self.dac
    }
}
