/// Playback configuration register
///
/// A single 32-bit register on the controller's slave port. The whole word
/// is replaced by one bus write; there are no partial-field updates.
///
/// # Bit layout
///
/// | Bits  | Name          | Reset | Description                                |
/// |-------|---------------|-------|--------------------------------------------|
/// | 15:0  | `period`      | 8     | Bus clock cycles between output updates    |
/// | 23:16 | `max_address` | 0     | Exclusive upper bound on RAM word address  |
/// | 24    | `run`         | 0     | 1 = playing, 0 = idle                      |
/// | 31:25 | reserved      | 0     | Ignored on write, read back as zero        |
///
/// Reads return the packed form of the last written word, never the live
/// sequencer position. Every 32-bit value is a legal write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigWord {
    pub period: u16,
    pub max_address: u8,
    pub run: bool,
}

const PERIOD_MASK: u32 = 0x0000_FFFF;
const MAX_ADDRESS_SHIFT: u32 = 16;
const MAX_ADDRESS_MASK: u32 = 0xFF;
const RUN_BIT: u32 = 1 << 24;

/// Reset value of the period field.
pub const DEFAULT_PERIOD: u16 = 8;

impl ConfigWord {
    pub const RESET: Self = Self {
        period: DEFAULT_PERIOD,
        max_address: 0,
        run: false,
    };

    pub fn new(period: u16, max_address: u8, run: bool) -> Self {
        Self {
            period,
            max_address,
            run,
        }
    }

    /// Decode a bus word. Reserved bits are dropped.
    pub fn from_bits(bits: u32) -> Self {
        Self {
            period: (bits & PERIOD_MASK) as u16,
            max_address: ((bits >> MAX_ADDRESS_SHIFT) & MAX_ADDRESS_MASK) as u8,
            run: bits & RUN_BIT != 0,
        }
    }

    pub fn to_bits(self) -> u32 {
        let run = if self.run { RUN_BIT } else { 0 };
        run | ((self.max_address as u32) << MAX_ADDRESS_SHIFT) | self.period as u32
    }

    /// Period the sample timer actually divides by. A zero period behaves as 1.
    pub fn effective_period(self) -> u16 {
        self.period.max(1)
    }

    /// True when `run` is set but there is no address to play from.
    pub fn is_degenerate(self) -> bool {
        self.run && self.max_address == 0
    }
}

impl Default for ConfigWord {
    fn default() -> Self {
        Self::RESET
    }
}

impl From<u32> for ConfigWord {
    fn from(bits: u32) -> Self {
        Self::from_bits(bits)
    }
}

impl From<ConfigWord> for u32 {
    fn from(word: ConfigWord) -> Self {
        word.to_bits()
    }
}

/// Bus-facing holder of the configuration word.
///
/// The register only stores; the controller picks up a new value on its
/// next clock evaluation.
#[derive(Debug, Default)]
pub struct ConfigRegister {
    word: ConfigWord,
}

impl ConfigRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.word = ConfigWord::RESET;
    }

    pub fn read(&self) -> u32 {
        self.word.to_bits()
    }

    pub fn write(&mut self, data: u32) {
        self.word = ConfigWord::from_bits(data);
    }

    pub fn word(&self) -> ConfigWord {
        self.word
    }
}
