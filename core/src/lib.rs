pub mod core;
pub mod device;

pub mod prelude {
    pub use crate::core::{Bus, BusMaster, BusMasterComponent, BusOp, BusRequest, Component};
    pub use crate::device::{ConfigWord, PlayerState, SampleRam, WavePlayer};
}
