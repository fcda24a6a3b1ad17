/// Identifies who is driving a bus cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusMaster {
    Host,      // External master on the configuration port
    Sequencer, // The playback controller fetching sample words
}

/// Direction of a bus request. Writes carry their data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusOp<D> {
    Read,
    Write(D),
}

/// Address and operation a master holds on the bus while its strobe is asserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusRequest<A, D> {
    pub addr: A,
    pub op: BusOp<D>,
}

impl<A, D> BusRequest<A, D> {
    pub fn read(addr: A) -> Self {
        Self {
            addr,
            op: BusOp::Read,
        }
    }

    pub fn write(addr: A, data: D) -> Self {
        Self {
            addr,
            op: BusOp::Write(data),
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self.op, BusOp::Write(_))
    }
}

/// Request/acknowledge bus, evaluated one clock edge at a time.
///
/// The master calls [`Bus::cycle`] on every edge. While it has a transaction
/// outstanding it passes the same request each time; with the strobe
/// deasserted it passes `None`. The responder returns `Some(data)` on the edge
/// it acknowledges (read data, or the written data echoed back) and `None`
/// while it is still waiting. How many edges pass before the acknowledge is
/// entirely up to the responder, and it may never come.
pub trait Bus {
    type Address: Copy + Into<u64>;
    type Data: Copy;

    fn cycle(
        &mut self,
        master: BusMaster,
        request: Option<BusRequest<Self::Address, Self::Data>>,
    ) -> Option<Self::Data>;
}

/// A bus with nothing attached. Strobes are never acknowledged.
#[derive(Clone, Copy, Debug, Default)]
pub struct FloatingBus;

impl Bus for FloatingBus {
    type Address = u32;
    type Data = u32;

    fn cycle(&mut self, _master: BusMaster, _request: Option<BusRequest<u32, u32>>) -> Option<u32> {
        None
    }
}
