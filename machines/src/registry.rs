//! Waveform pattern registry.
//!
//! Each pattern self-registers via [`inventory::submit!`] with a
//! [`PatternEntry`] containing its CLI name, a one-line description and a
//! generator. The front-end lists and selects patterns at runtime without
//! any central table.

/// Describes a named waveform generator.
pub struct PatternEntry {
    /// CLI name used to select this pattern (e.g., "triangle").
    pub name: &'static str,
    /// Shown by `--list-patterns`.
    pub description: &'static str,
    /// Produce `len` 8-bit samples making up one period of the waveform.
    pub generate: fn(usize) -> Vec<u8>,
}

impl PatternEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        generate: fn(usize) -> Vec<u8>,
    ) -> Self {
        Self {
            name,
            description,
            generate,
        }
    }
}

inventory::collect!(PatternEntry);

/// Return all registered patterns, sorted by name.
pub fn all() -> Vec<&'static PatternEntry> {
    let mut entries: Vec<_> = inventory::iter::<PatternEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up a pattern by its CLI name.
pub fn find(name: &str) -> Option<&'static PatternEntry> {
    inventory::iter::<PatternEntry>
        .into_iter()
        .find(|e| e.name == name)
}
