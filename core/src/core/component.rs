use super::bus::BusMaster;

/// Anything that advances by discrete clock edges (timers, sequencers, controllers)
pub trait Component {
    /// Advance one clock cycle in this component's clock domain.
    /// Returns true if a "significant event" occurred (e.g., timer tick, sample driven).
    fn tick(&mut self) -> bool;
}

/// Extension for components that act as bus masters (fetch sequencers, DMA engines)
pub trait BusMasterComponent: Component {
    type Bus: super::bus::Bus + ?Sized;

    /// Execute one cycle with bus access. Returns true when the cycle produced
    /// the component's significant event.
    fn tick_with_bus(&mut self, bus: &mut Self::Bus, master_id: BusMaster) -> bool;
}
