pub mod address_seq;
pub mod config_reg;
pub mod dac;
pub mod fetch;
pub mod output;
pub mod sample_ram;
pub mod sample_timer;
pub mod wave_player;

pub use address_seq::AddressSequencer;
pub use config_reg::{ConfigRegister, ConfigWord};
pub use dac::DacRegister;
pub use fetch::{FetchEngine, FetchEvent, FetchedWord};
pub use output::OutputStage;
pub use sample_ram::SampleRam;
pub use sample_timer::SampleTimer;
pub use wave_player::{PlaybackState, PlayerState, WavePlayer};
