use tracing::debug;

use super::address_seq::AddressSequencer;
use super::config_reg::{ConfigRegister, ConfigWord};
use super::dac::DacRegister;
use super::fetch::{FetchEngine, FetchEvent, FetchedWord};
use super::output::OutputStage;
use super::sample_timer::SampleTimer;
use crate::core::{Bus, BusMaster, BusMasterComponent, BusOp, BusRequest, Component, FloatingBus};

/// Bus-attached waveform playback controller
///
/// Plays a table of 8-bit samples stored four to a word in an external RAM,
/// driving one DAC code per sample period.
///
/// # Ports
///
/// - **Configuration (slave)**: one 32-bit register, see [`ConfigWord`].
///   Driven through this type's [`Bus`] impl. The register is mirrored
///   across the whole port window; address decoding belongs to the board.
/// - **Memory (master)**: word reads at `0..max_address`, driven through
///   [`BusMasterComponent::tick_with_bus`].
/// - **Output**: [`WavePlayer::dac`].
/// - **Reset**: [`WavePlayer::set_reset`], active high, synchronous.
///
/// # Clock edge
///
/// Each `tick_with_bus()` evaluates, in order:
///
/// 1. Reset. While asserted, everything is held at its default and the
///    memory strobe is dropped.
/// 2. Configuration. A word written on an earlier edge is compared with
///    the settings in force and applied: arm, disarm, or retarget.
/// 3. Fetch issue. While running with no word buffered and no transfer
///    outstanding, a read is latched for the word that will be needed next.
/// 4. Memory edge. The outstanding request is presented to the bus.
/// 5. Output. The first word after arming is driven as soon as it lands;
///    afterwards one byte is driven per timer tick.
///
/// # Word boundaries
///
/// The word after the one being played is fetched as soon as the current
/// word is loaded, so a responder has until the word boundary (just under
/// four sample periods) to answer.
/// If it is slower than that, the timer holds at its terminal count and the
/// first byte of the next word is driven on the edge the word arrives.
pub struct WavePlayer {
    config: ConfigRegister,
    active: ConfigWord,
    state: PlayerState,
    reset_line: bool,
    timer: SampleTimer,
    sequencer: AddressSequencer,
    fetch: FetchEngine,
    prefetched: Option<FetchedWord>,
    output: OutputStage,
    primed: bool,
    stall_cycles: u64,
    cycles: u64,
}

/// Top-level controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Reset,
    Idle,
    Running,
}

/// Snapshot of the transient playback state. Not visible on the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub state: PlayerState,
    pub current_address: u8,
    pub byte_index: u8,
    pub current_word: u32,
    pub tick_counter: u16,
}

impl WavePlayer {
    pub fn new() -> Self {
        Self {
            config: ConfigRegister::new(),
            active: ConfigWord::RESET,
            state: PlayerState::Reset,
            reset_line: false,
            timer: SampleTimer::default(),
            sequencer: AddressSequencer::new(),
            fetch: FetchEngine::new(),
            prefetched: None,
            output: OutputStage::new(),
            primed: false,
            stall_cycles: 0,
            cycles: 0,
        }
    }

    /// Drive the reset input. Takes effect on the next clock edge.
    pub fn set_reset(&mut self, asserted: bool) {
        self.reset_line = asserted;
    }

    pub fn reset_asserted(&self) -> bool {
        self.reset_line
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Last word written to the configuration register.
    pub fn config(&self) -> ConfigWord {
        self.config.word()
    }

    /// Settings the controller is currently evaluating against.
    pub fn active_config(&self) -> ConfigWord {
        self.active
    }

    /// Current DAC code.
    pub fn dac(&self) -> u8 {
        self.output.dac().code()
    }

    pub fn dac_register(&self) -> &DacRegister {
        self.output.dac()
    }

    /// Memory port address register (holds the last driven address).
    pub fn memory_address(&self) -> u32 {
        self.fetch.address()
    }

    /// Address currently requested on the memory port, if the strobe is up.
    pub fn memory_strobe(&self) -> Option<u32> {
        self.fetch.strobe()
    }

    /// Edges spent at a word boundary waiting for the next word.
    pub fn stall_cycles(&self) -> u64 {
        self.stall_cycles
    }

    /// Words fetched and kept since reset.
    pub fn words_fetched(&self) -> u64 {
        self.fetch.completed()
    }

    /// Clock edges seen since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn snapshot(&self) -> PlaybackState {
        PlaybackState {
            state: self.state,
            current_address: self.sequencer.current(),
            byte_index: self.output.byte_index(),
            current_word: self.output.word(),
            tick_counter: self.timer.counter(),
        }
    }

    fn hold_reset(&mut self) {
        self.config.reset();
        self.active = ConfigWord::RESET;
        self.state = PlayerState::Reset;
        self.timer.reset(self.active.period);
        self.sequencer = AddressSequencer::new();
        self.fetch.reset();
        self.prefetched = None;
        self.output.reset();
        self.primed = false;
        self.stall_cycles = 0;
    }

    fn sync_config(&mut self) {
        let word = self.config.word();
        if word == self.active {
            return;
        }
        let previous = std::mem::replace(&mut self.active, word);
        if word.period != previous.period {
            self.timer.set_period(word.period);
        }

        match self.state {
            PlayerState::Running if !word.run || word.max_address == 0 => self.disarm(),
            PlayerState::Running => self.retarget(),
            PlayerState::Idle if word.run => self.arm(),
            _ => {}
        }
    }

    fn arm(&mut self) {
        if self.active.max_address == 0 {
            debug!("run set with max_address 0; staying idle");
            return;
        }
        debug!(
            period = self.active.period,
            max_address = self.active.max_address,
            "playback armed"
        );
        self.sequencer.rearm(self.active.max_address);
        self.output.rearm();
        self.timer.reset(self.active.period);
        self.fetch.abandon();
        self.prefetched = None;
        self.primed = false;
        self.state = PlayerState::Running;
    }

    fn disarm(&mut self) {
        debug!(
            address = self.sequencer.current(),
            byte_index = self.output.byte_index(),
            dac = self.dac(),
            "playback stopped"
        );
        self.fetch.abandon();
        self.prefetched = None;
        self.state = PlayerState::Idle;
    }

    /// Apply a new bound while running, dropping any buffered or in-flight
    /// word that is no longer the one playback needs next.
    fn retarget(&mut self) {
        if self.sequencer.set_limit(self.active.max_address) {
            debug!(max_address = self.active.max_address, "current address clamped to 0");
        }
        let target = self.fetch_target();
        if self.prefetched.is_some_and(|w| w.addr != target) {
            self.prefetched = None;
        }
        if self.fetch.wanted().is_some_and(|addr| addr != target) {
            self.fetch.abandon();
        }
    }

    fn fetch_target(&self) -> u8 {
        if self.primed {
            self.sequencer.next()
        } else {
            self.sequencer.current()
        }
    }

    fn issue_fetch(&mut self) {
        if self.prefetched.is_none() && !self.fetch.is_busy() {
            let addr = self.fetch_target();
            self.fetch.start(addr);
        }
    }

    fn advance_output(&mut self) -> bool {
        if !self.primed {
            let Some(first) = self.prefetched.take() else {
                return false;
            };
            self.output.load(first.word);
            self.output.emit();
            self.timer.restart();
            self.primed = true;
            return true;
        }

        let starved = self.output.is_exhausted() && self.prefetched.is_none();
        if starved && self.timer.is_terminal() {
            self.stall_cycles += 1;
            return false;
        }
        if !self.timer.clock() {
            return false;
        }

        if self.output.is_exhausted()
            && let Some(next) = self.prefetched.take()
        {
            debug_assert_eq!(next.addr, self.sequencer.next());
            self.sequencer.advance();
            self.output.load(next.word);
        }
        self.output.emit();
        true
    }
}

impl Default for WavePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for WavePlayer {
    /// Advance with the memory port left unconnected. Any fetch stalls.
    fn tick(&mut self) -> bool {
        self.tick_with_bus(&mut FloatingBus, BusMaster::Sequencer)
    }
}

impl BusMasterComponent for WavePlayer {
    type Bus = dyn Bus<Address = u32, Data = u32>;

    /// Returns true on edges that drive a new sample to the DAC.
    fn tick_with_bus(&mut self, bus: &mut Self::Bus, master_id: BusMaster) -> bool {
        self.cycles += 1;

        if self.reset_line {
            self.hold_reset();
            bus.cycle(master_id, None);
            return false;
        }
        if self.state == PlayerState::Reset {
            self.state = PlayerState::Idle;
        }

        self.sync_config();
        if self.state == PlayerState::Running {
            self.issue_fetch();
        }

        match self.fetch.step(bus, master_id) {
            FetchEvent::Fetched(word) => self.prefetched = Some(word),
            FetchEvent::Discarded(addr) => debug!(addr, "abandoned fetch drained"),
            FetchEvent::Idle | FetchEvent::Waiting => {}
        }

        if self.state != PlayerState::Running {
            return false;
        }
        self.advance_output()
    }
}

/// Configuration port (slave role).
impl Bus for WavePlayer {
    type Address = u32;
    type Data = u32;

    fn cycle(&mut self, _master: BusMaster, request: Option<BusRequest<u32, u32>>) -> Option<u32> {
        let request = request?;
        if self.reset_line {
            return None;
        }
        match request.op {
            BusOp::Read => Some(self.config.read()),
            BusOp::Write(data) => {
                self.config.write(data);
                Some(data)
            }
        }
    }
}
