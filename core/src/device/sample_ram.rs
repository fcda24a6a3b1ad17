use crate::core::{Bus, BusMaster, BusOp, BusRequest};

/// Number of 32-bit words; the configuration word addresses at most 255.
pub const SAMPLE_RAM_WORDS: usize = 256;

/// Word-addressed sample memory with a request/acknowledge port.
///
/// Each request is held for `latency` wait edges and acknowledged on the
/// next one, so a latency of 0 acknowledges on the first edge the strobe is
/// seen. Dropping the strobe restarts the wait count. Addresses are masked
/// to 8 bits.
pub struct SampleRam {
    data: [u32; SAMPLE_RAM_WORDS],
    latency: u32,
    waited: u32,
}

impl SampleRam {
    /// Create a zeroed RAM that acknowledges after `latency` wait edges.
    pub fn new(latency: u32) -> Self {
        Self {
            data: [0; SAMPLE_RAM_WORDS],
            latency,
            waited: 0,
        }
    }

    pub fn latency(&self) -> u32 {
        self.latency
    }

    pub fn set_latency(&mut self, latency: u32) {
        self.latency = latency;
    }

    pub fn read_word(&self, addr: u32) -> u32 {
        self.data[(addr & 0xFF) as usize]
    }

    pub fn write_word(&mut self, addr: u32, value: u32) {
        self.data[(addr & 0xFF) as usize] = value;
    }

    /// Pack bytes little-endian into consecutive words starting at word 0.
    ///
    /// A trailing partial word is zero-padded. Bytes beyond the RAM size
    /// are ignored.
    pub fn load_bytes(&mut self, bytes: &[u8]) {
        for (slot, chunk) in self.data.iter_mut().zip(bytes.chunks(4)) {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            *slot = u32::from_le_bytes(word);
        }
    }

    pub fn load_words(&mut self, words: &[u32]) {
        let len = words.len().min(SAMPLE_RAM_WORDS);
        self.data[..len].copy_from_slice(&words[..len]);
    }

    pub fn snapshot(&self) -> &[u32; SAMPLE_RAM_WORDS] {
        &self.data
    }
}

impl Default for SampleRam {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Bus for SampleRam {
    type Address = u32;
    type Data = u32;

    fn cycle(&mut self, _master: BusMaster, request: Option<BusRequest<u32, u32>>) -> Option<u32> {
        let Some(request) = request else {
            self.waited = 0;
            return None;
        };
        if self.waited < self.latency {
            self.waited += 1;
            return None;
        }
        self.waited = 0;
        match request.op {
            BusOp::Read => Some(self.read_word(request.addr)),
            BusOp::Write(value) => {
                self.write_word(request.addr, value);
                Some(value)
            }
        }
    }
}
