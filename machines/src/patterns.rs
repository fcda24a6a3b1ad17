//! Built-in waveform tables.
//!
//! Every generator returns exactly `len` unsigned samples with 0x80 as the
//! midpoint. Periodic shapes span one full cycle over `len` samples.

use std::f64::consts::TAU;

use crate::registry::PatternEntry;

fn ramp(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}

fn saw_down(len: usize) -> Vec<u8> {
    (0..len).map(|i| !(i as u8)).collect()
}

fn triangle(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| {
            let phase = i * 512 / len;
            if phase < 256 { phase as u8 } else { (511 - phase) as u8 }
        })
        .collect()
}

fn square(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| if i < len.div_ceil(2) { 0xFF } else { 0x00 })
        .collect()
}

fn sine(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| {
            let v = 128.0 + 127.0 * (TAU * i as f64 / len as f64).sin();
            v.round() as u8
        })
        .collect()
}

fn silence(len: usize) -> Vec<u8> {
    vec![0x80; len]
}

inventory::submit! {
    PatternEntry::new("ramp", "rising sawtooth, one step per sample, wraps at 256", ramp)
}

inventory::submit! {
    PatternEntry::new("saw-down", "falling sawtooth from 0xFF, wraps at 256", saw_down)
}

inventory::submit! {
    PatternEntry::new("triangle", "full-scale triangle, one cycle per table", triangle)
}

inventory::submit! {
    PatternEntry::new("square", "50% duty square wave between 0x00 and 0xFF", square)
}

inventory::submit! {
    PatternEntry::new("sine", "sine centred on 0x80, amplitude 127", sine)
}

inventory::submit! {
    PatternEntry::new("silence", "constant mid-scale (0x80)", silence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_honour_length() {
        for len in [0, 1, 3, 60, 1020] {
            for generate in [ramp, saw_down, triangle, square, sine, silence] {
                assert_eq!(generate(len).len(), len);
            }
        }
    }

    #[test]
    fn ramp_wraps() {
        let table = ramp(300);
        assert_eq!(table[255], 0xFF);
        assert_eq!(table[256], 0x00);
        assert_eq!(saw_down(2), vec![0xFF, 0xFE]);
    }

    #[test]
    fn triangle_peaks_mid_table() {
        let table = triangle(512);
        assert_eq!(table[0], 0);
        assert_eq!(table[255], 255);
        assert_eq!(table[256], 255);
        assert_eq!(table[511], 0);
    }

    #[test]
    fn square_is_half_high() {
        assert_eq!(square(4), vec![0xFF, 0xFF, 0x00, 0x00]);
        assert_eq!(square(3), vec![0xFF, 0xFF, 0x00]);
    }

    #[test]
    fn sine_quadrants() {
        let table = sine(64);
        assert_eq!(table[0], 128);
        assert_eq!(table[16], 255);
        assert_eq!(table[32], 128);
        assert_eq!(table[48], 1);
    }
}
