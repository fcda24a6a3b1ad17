use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Rows in the plot, one per DAC code.
const HEIGHT: u32 = 256;
/// Pixel columns per sample.
const COLUMN_WIDTH: u32 = 2;
const BACKGROUND: u8 = 0x10;
const GRID: u8 = 0x30;
const TRACE: u8 = 0xFF;
/// Largest image width a PNG header can carry.
const MAX_WIDTH: u32 = i32::MAX as u32;

/// Image width for `samples` columns, if a PNG can hold it.
pub fn plot_width(samples: usize) -> Option<u32> {
    u32::try_from(samples)
        .ok()?
        .checked_mul(COLUMN_WIDTH)
        .filter(|&w| w <= MAX_WIDTH)
}

/// Render DAC codes as an 8-bit grayscale strip chart, code 0xFF at the top.
/// Consecutive samples are joined by vertical segments so steps stay visible.
pub fn render(codes: &[u8]) -> (usize, usize, Vec<u8>) {
    let column = COLUMN_WIDTH as usize;
    let height = HEIGHT as usize;
    let width = codes.len() * column;
    let mut pixels = vec![BACKGROUND; width * height];
    let row_of = |code: u8| usize::from(0xFF - code);

    // Mid-scale reference line.
    let mid = row_of(0x80);
    pixels[mid * width..(mid + 1) * width].fill(GRID);

    let mut previous: Option<u8> = None;
    for (i, &code) in codes.iter().enumerate() {
        let x0 = i * column;
        let row = row_of(code);
        for x in x0..x0 + column {
            pixels[row * width + x] = TRACE;
        }
        if let Some(prev) = previous {
            let (top, bottom) = if prev > code {
                (row_of(prev), row)
            } else {
                (row, row_of(prev))
            };
            for y in top..=bottom {
                pixels[y * width + x0] = TRACE;
            }
        }
        previous = Some(code);
    }
    (width, height, pixels)
}

pub fn write_png(path: &Path, codes: &[u8]) -> Result<()> {
    if codes.is_empty() {
        bail!("nothing to plot");
    }
    let Some(width) = plot_width(codes.len()) else {
        bail!("{} samples is too wide for a PNG plot", codes.len());
    };
    let (_, _, pixels) = render(codes);
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, HEIGHT);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .with_context(|| format!("failed to write PNG: {}", path.display()))?;
    writer.write_image_data(&pixels)?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(width: usize, pixels: &[u8], x: usize, y: usize) -> u8 {
        pixels[y * width + x]
    }

    #[test]
    fn dimensions_follow_sample_count() {
        let (w, h, pixels) = render(&[0, 1, 2]);
        assert_eq!((w, h), (6, 256));
        assert_eq!(pixels.len(), 6 * 256);
    }

    #[test]
    fn full_scale_codes_hit_edges() {
        let (w, _, pixels) = render(&[0xFF, 0x00]);
        assert_eq!(pixel(w, &pixels, 0, 0), TRACE);
        assert_eq!(pixel(w, &pixels, 1, 0), TRACE);
        assert_eq!(pixel(w, &pixels, 3, 255), TRACE);
        // Falling edge joins the two levels in the second sample's first column.
        assert!((0..256).all(|y| pixel(w, &pixels, 2, y) == TRACE));
    }

    #[test]
    fn midline_drawn_under_trace() {
        let (w, _, pixels) = render(&[0x00, 0x00]);
        assert_eq!(pixel(w, &pixels, 0, 0x7F), GRID);
        assert_eq!(pixel(w, &pixels, 0, 0x10), BACKGROUND);
    }

    #[test]
    fn png_file_is_written() {
        let path = std::env::temp_dir().join(format!("wavedma_plot_{}.png", std::process::id()));
        write_png(&path, &[0x00, 0x40, 0x80, 0xC0, 0xFF]).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn width_beyond_png_limit_is_refused() {
        assert_eq!(plot_width(10_000_000), Some(20_000_000));
        assert_eq!(plot_width(1 << 30), None);
        assert_eq!(plot_width(usize::MAX), None);
    }

    #[test]
    fn empty_plot_is_refused() {
        assert!(write_png(Path::new("unused.png"), &[]).is_err());
    }
}
