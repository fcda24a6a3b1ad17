use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use wavedma_core::device::DacRegister;
use wavedma_machines::board::Sample;

/// One `tick,cycle,address,dac` line per sample, after a header line.
pub fn write_trace(out: &mut impl Write, samples: &[Sample]) -> std::io::Result<()> {
    writeln!(out, "tick,cycle,address,dac")?;
    for s in samples {
        writeln!(out, "{},{},{},{}", s.tick, s.cycle, s.address, s.dac)?;
    }
    out.flush()
}

/// Signed 16-bit little-endian mono PCM, one frame per sample.
pub fn pcm_bytes(samples: &[Sample]) -> Vec<u8> {
    let mut dac = DacRegister::new();
    samples
        .iter()
        .flat_map(|s| {
            dac.write(s.dac);
            dac.sample_i16().to_le_bytes()
        })
        .collect()
}

pub fn write_pcm(path: &Path, samples: &[Sample]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(&pcm_bytes(samples))?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(tick: u64, dac: u8) -> Sample {
        Sample {
            tick,
            cycle: 100 + tick * 20,
            address: (tick / 4) as u8,
            dac,
        }
    }

    #[test]
    fn trace_lines() {
        let mut out = Vec::new();
        write_trace(&mut out, &[sample(0, 10), sample(1, 11)]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "tick,cycle,address,dac\n0,100,0,10\n1,120,0,11\n"
        );
    }

    #[test]
    fn pcm_is_signed_little_endian() {
        let bytes = pcm_bytes(&[sample(0, 0x00), sample(1, 0x80), sample(2, 0xFF)]);
        assert_eq!(bytes, vec![0x00, 0x80, 0x00, 0x00, 0x00, 0x7F]);
    }
}
