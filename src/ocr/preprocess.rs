//! Image cleanup ahead of word-level OCR.
//!
//! Grayscale, global Otsu binarization, then a 3x3 median filter to remove
//! salt-and-pepper speckle left by scanning.

use image::{DynamicImage, GrayImage, Luma};

/// Grayscale, binarize and denoise a page image.
pub fn preprocess(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    let threshold = otsu_threshold(&gray);
    let binary = binarize(&gray, threshold);
    median_denoise(&binary)
}

/// Otsu's threshold: the gray level maximizing between-class variance.
pub fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best = (0u8, 0.0f64);
    let mut background_count = 0u64;
    let mut background_sum = 0.0f64;

    for (level, &count) in histogram.iter().enumerate() {
        background_count += count;
        if background_count == 0 {
            continue;
        }
        let foreground_count = total - background_count;
        if foreground_count == 0 {
            break;
        }
        background_sum += level as f64 * count as f64;

        let mean_bg = background_sum / background_count as f64;
        let mean_fg = (weighted_sum - background_sum) / foreground_count as f64;
        let variance =
            background_count as f64 * foreground_count as f64 * (mean_bg - mean_fg).powi(2);
        if variance > best.1 {
            best = (level as u8, variance);
        }
    }
    best.0
}

/// Pixels above `threshold` become white, the rest black.
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel[0] = if pixel[0] > threshold { 255 } else { 0 };
    }
    out
}

/// 3x3 median filter; edges replicate the nearest pixel.
pub fn median_denoise(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let mut window = [0u8; 9];
    for y in 0..height {
        for x in 0..width {
            let mut i = 0;
            for dy in [-1i64, 0, 1] {
                for dx in [-1i64, 0, 1] {
                    let sx = (x as i64 + dx).clamp(0, width as i64 - 1) as u32;
                    let sy = (y as i64 + dy).clamp(0, height as i64 - 1) as u32;
                    window[i] = image.get_pixel(sx, sy)[0];
                    i += 1;
                }
            }
            window.sort_unstable();
            out.put_pixel(x, y, Luma([window[4]]));
        }
    }
    out
}
