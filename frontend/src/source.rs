//! Sample table resolution: a raw file, a directory holding `<pattern>.bin`,
//! or a built-in pattern.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;
use wavedma_machines::registry;
use wavedma_machines::sample_image::SampleImage;

use crate::config::PlaybackSettings;

/// Build the sample image described by `playback`.
///
/// Resolution order:
/// 1. `sample_file` naming a file → load it directly.
/// 2. `sample_file` naming a directory → load `{pattern}.bin` from it.
/// 3. Otherwise render `length` samples of the registered `pattern`.
///
/// `expected_crc32`, when set, is checked against whichever table results.
pub fn load_image(playback: &PlaybackSettings) -> Result<SampleImage> {
    let image = match &playback.sample_file {
        Some(path) => load_file(path, &playback.pattern)?,
        None => render_pattern(&playback.pattern, playback.length)?,
    };
    if let Some(expected) = playback.expected_crc32 {
        image.verify_crc32(expected)?;
    }
    info!(
        bytes = image.bytes().len(),
        words = image.max_address(),
        crc32 = format_args!("0x{:08X}", image.crc32()),
        "sample table ready"
    );
    Ok(image)
}

fn load_file(path: &Path, pattern: &str) -> Result<SampleImage> {
    let file = if path.is_dir() {
        path.join(format!("{pattern}.bin"))
    } else {
        path.to_path_buf()
    };
    SampleImage::from_file(&file)
        .with_context(|| format!("failed to load sample table: {}", file.display()))
}

fn render_pattern(name: &str, length: usize) -> Result<SampleImage> {
    let Some(entry) = registry::find(name) else {
        let names: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        bail!("unknown pattern {name:?} (available: {})", names.join(", "));
    };
    SampleImage::from_pattern(entry, length)
        .with_context(|| format!("cannot render {length} samples of {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavedma_machines::SampleLoadError;

    fn playback(pattern: &str, length: usize) -> PlaybackSettings {
        PlaybackSettings {
            pattern: pattern.to_string(),
            length,
            ..PlaybackSettings::default()
        }
    }

    #[test]
    fn renders_registered_pattern() {
        let image = load_image(&playback("square", 8)).unwrap();
        assert_eq!(image.bytes(), &[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]);
    }

    #[test]
    fn unknown_pattern_lists_choices() {
        let err = load_image(&playback("noise", 8)).unwrap_err();
        assert!(err.to_string().contains("available: ramp"));
    }

    #[test]
    fn checksum_is_enforced() {
        let mut settings = playback("ramp", 16);
        settings.expected_crc32 = Some(0);
        let err = load_image(&settings).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SampleLoadError>(),
            Some(SampleLoadError::ChecksumMismatch { expected: 0, .. })
        ));
    }

    #[test]
    fn resolves_file_and_directory() {
        let dir = std::env::temp_dir().join(format!("wavedma_source_test_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("custom.bin"), [1u8, 2, 3]).unwrap();

        let mut settings = playback("custom", 0);
        settings.sample_file = Some(dir.join("custom.bin"));
        assert_eq!(load_image(&settings).unwrap().bytes(), &[1, 2, 3]);

        settings.sample_file = Some(dir.clone());
        assert_eq!(load_image(&settings).unwrap().bytes(), &[1, 2, 3]);

        settings.pattern = "missing".to_string();
        assert!(load_image(&settings).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
