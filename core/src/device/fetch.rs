use tracing::trace;

use crate::core::{Bus, BusMaster, BusRequest};

/// Memory-port read sequencer
///
/// Fetches one 32-bit sample word at a time over a request/acknowledge
/// bus. At most one transaction is ever outstanding.
///
/// # Handshake
///
/// `start()` latches a word address. From then on every call to `step()`
/// presents the same read request to the bus until the responder
/// acknowledges it; the acknowledge may land on the very first edge or
/// never. There is no timeout and no retry: an unacknowledged request stays
/// asserted, which stalls the owner.
///
/// A transfer can be abandoned (playback stopped or the target address is
/// no longer wanted). Its request is still held until acknowledged so the
/// bus never sees a dropped strobe, and the returned data is thrown away.
/// A new transfer cannot start until the abandoned one has drained.
///
/// # Port signals
///
/// | Accessor   | Meaning                                              |
/// |------------|------------------------------------------------------|
/// | `strobe()` | Address currently requested, `None` when deasserted  |
/// | `address()`| Address register; holds the last driven address      |
#[derive(Debug, Default)]
pub struct FetchEngine {
    in_flight: Option<Transfer>,
    address: u32,
    waited: u32,
    completed: u64,
}

#[derive(Clone, Copy, Debug)]
struct Transfer {
    addr: u8,
    stale: bool,
}

/// A word returned by the memory, tagged with the address it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchedWord {
    pub addr: u8,
    pub word: u32,
}

/// Outcome of one `step()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchEvent {
    /// No transfer outstanding; strobe deasserted.
    Idle,
    /// Request asserted, no acknowledge on this edge.
    Waiting,
    /// Acknowledged; the word is ready for use.
    Fetched(FetchedWord),
    /// An abandoned transfer finally drained; its data was dropped.
    Discarded(u8),
}

impl FetchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Latch a new read. Returns false (and does nothing) if a transfer is
    /// still outstanding.
    pub fn start(&mut self, addr: u8) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        trace!(addr, "fetch issued");
        self.in_flight = Some(Transfer { addr, stale: false });
        self.address = addr as u32;
        self.waited = 0;
        true
    }

    /// Mark the outstanding transfer, if any, as unwanted.
    pub fn abandon(&mut self) {
        if let Some(transfer) = self.in_flight.as_mut() {
            transfer.stale = true;
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Address of the outstanding transfer whose data will be kept.
    pub fn wanted(&self) -> Option<u8> {
        self.in_flight.filter(|t| !t.stale).map(|t| t.addr)
    }

    pub fn strobe(&self) -> Option<u32> {
        self.in_flight.map(|t| t.addr as u32)
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    /// Edges the outstanding transfer has been waiting for its acknowledge.
    pub fn waited(&self) -> u32 {
        self.waited
    }

    /// Words delivered since reset (discarded transfers not counted).
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Present this edge's request to the memory bus.
    pub fn step(
        &mut self,
        bus: &mut dyn Bus<Address = u32, Data = u32>,
        master: BusMaster,
    ) -> FetchEvent {
        let Some(transfer) = self.in_flight else {
            bus.cycle(master, None);
            return FetchEvent::Idle;
        };

        let Some(word) = bus.cycle(master, Some(BusRequest::read(transfer.addr as u32))) else {
            self.waited += 1;
            return FetchEvent::Waiting;
        };

        trace!(addr = transfer.addr, word, waited = self.waited, "fetch acknowledged");
        self.in_flight = None;
        self.waited = 0;
        if transfer.stale {
            return FetchEvent::Discarded(transfer.addr);
        }
        self.completed += 1;
        FetchEvent::Fetched(FetchedWord {
            addr: transfer.addr,
            word,
        })
    }
}
