//! Lighting normalization applied before landmark detection
//!
//! Uneven or dim lighting degrades face-mesh quality well before it makes a
//! frame unusable. The normalizer equalizes the luminance channel (CLAHE)
//! and reports the raw mean luminance so the caller can gate on low light.

use crate::frame::VideoFrame;
use tracing::trace;

/// Frame after lighting normalization, ready for landmark detection.
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    /// Contrast-equalized frame (luminance replicated to RGB)
    pub enhanced: VideoFrame,
    /// Mean luminance of the RAW frame (0-255), for the low-light gate
    pub brightness: f64,
}

/// Contrast-limited adaptive histogram equalization over the luminance channel.
#[derive(Debug, Clone)]
pub struct LightingNormalizer {
    /// Contrast clip limit (multiples of the uniform histogram level)
    pub clip_limit: f64,
    /// Tile grid columns
    pub grid_cols: usize,
    /// Tile grid rows
    pub grid_rows: usize,
}

impl Default for LightingNormalizer {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            grid_cols: 8,
            grid_rows: 8,
        }
    }
}

impl LightingNormalizer {
    /// Equalize a frame's luminance and measure its raw brightness.
    pub fn normalize(&self, frame: &VideoFrame) -> PreparedFrame {
        let gray = frame.to_grayscale();
        let brightness = if gray.is_empty() {
            0.0
        } else {
            gray.iter().map(|&v| v as f64).sum::<f64>() / gray.len() as f64
        };

        let eq = clahe(
            &gray,
            frame.width as usize,
            frame.height as usize,
            self.clip_limit,
            self.grid_cols,
            self.grid_rows,
        );
        trace!(brightness, sequence = frame.sequence, "frame normalized");

        let mut data = Vec::with_capacity(eq.len() * 3);
        for &v in &eq {
            data.extend_from_slice(&[v, v, v]);
        }

        PreparedFrame {
            enhanced: VideoFrame::new(
                data,
                frame.width,
                frame.height,
                frame.timestamp_ns,
                frame.sequence,
            ),
            brightness,
        }
    }
}

/// Global histogram equalization over a grayscale buffer.
pub fn equalize_histogram(gray: &[u8]) -> Vec<u8> {
    let n = gray.len();
    if n == 0 {
        return Vec::new();
    }

    let mut hist = [0usize; 256];
    for &v in gray {
        hist[v as usize] += 1;
    }

    let mut lut = [0u8; 256];
    let mut cdf = 0usize;
    for (v, slot) in lut.iter_mut().enumerate() {
        cdf += hist[v];
        *slot = ((cdf as f64 * 255.0) / n as f64).round().min(255.0) as u8;
    }

    gray.iter().map(|&v| lut[v as usize]).collect()
}

/// Contrast-limited adaptive histogram equalization.
///
/// Per-tile histograms are clipped at `clip_limit` times the uniform level
/// (excess redistributed evenly), turned into mapping LUTs, and blended
/// bilinearly between neighboring tiles to avoid visible tile seams.
pub fn clahe(
    gray: &[u8],
    width: usize,
    height: usize,
    clip_limit: f64,
    grid_cols: usize,
    grid_rows: usize,
) -> Vec<u8> {
    if gray.is_empty() || width == 0 || height == 0 {
        return Vec::new();
    }
    debug_assert_eq!(gray.len(), width * height);

    let tile_w = width.div_ceil(grid_cols.max(1));
    let tile_h = height.div_ceil(grid_rows.max(1));
    // Effective grid: small frames may not fill the nominal grid, and an
    // empty tile must never contribute a mapping
    let grid_cols = width.div_ceil(tile_w);
    let grid_rows = height.div_ceil(tile_h);

    // One mapping LUT per tile
    let mut luts = vec![[0u8; 256]; grid_cols * grid_rows];
    for tr in 0..grid_rows {
        for tc in 0..grid_cols {
            let x0 = tc * tile_w;
            let y0 = tr * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            if x0 >= x1 || y0 >= y1 {
                continue;
            }

            let mut hist = [0f64; 256];
            for y in y0..y1 {
                let row = y * width;
                for x in x0..x1 {
                    hist[gray[row + x] as usize] += 1.0;
                }
            }
            let count = ((x1 - x0) * (y1 - y0)) as f64;

            // Clip and redistribute
            let clip = (clip_limit * count / 256.0).max(1.0);
            let mut excess = 0.0;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let bonus = excess / 256.0;
            for bin in hist.iter_mut() {
                *bin += bonus;
            }

            let lut = &mut luts[tr * grid_cols + tc];
            let mut cdf = 0.0;
            for (v, slot) in lut.iter_mut().enumerate() {
                cdf += hist[v];
                *slot = (cdf * 255.0 / count).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    // Bilinear blend between tile mappings
    let mut out = vec![0u8; gray.len()];
    for y in 0..height {
        let gy = (y as f64 + 0.5) / tile_h as f64 - 0.5;
        let r0 = gy.floor().clamp(0.0, (grid_rows - 1) as f64) as usize;
        let r1 = (r0 + 1).min(grid_rows - 1);
        let fy = (gy - r0 as f64).clamp(0.0, 1.0);

        for x in 0..width {
            let gx = (x as f64 + 0.5) / tile_w as f64 - 0.5;
            let c0 = gx.floor().clamp(0.0, (grid_cols - 1) as f64) as usize;
            let c1 = (c0 + 1).min(grid_cols - 1);
            let fx = (gx - c0 as f64).clamp(0.0, 1.0);

            let v = gray[y * width + x] as usize;
            let tl = luts[r0 * grid_cols + c0][v] as f64;
            let tr_ = luts[r0 * grid_cols + c1][v] as f64;
            let bl = luts[r1 * grid_cols + c0][v] as f64;
            let br = luts[r1 * grid_cols + c1][v] as f64;

            let top = tl + (tr_ - tl) * fx;
            let bottom = bl + (br - bl) * fx;
            out[y * width + x] = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}
