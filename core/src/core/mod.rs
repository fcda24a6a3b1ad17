pub mod bus;
pub mod component;

pub use bus::{Bus, BusMaster, BusOp, BusRequest, FloatingBus};
pub use component::{BusMasterComponent, Component};
