//! Image preprocessing variants for OCR input.
//!
//! Each rasterized page is turned into a fixed, ordered set of alternate
//! renderings that are OCRed independently: aggressive binarization wins on
//! clean high-contrast scans but can destroy faint text, so a mild variant
//! and the untouched original always ride along as fallbacks. All transforms
//! are pure functions of the input image — no I/O, no engine calls.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};

use super::types::{PreprocessedVariant, VariantKind};
use super::ExtractionError;

/// Local contrast enhancement: clip limit and tile grid (8x8).
const CLAHE_CLIP_LIMIT: f32 = 3.0;
const CLAHE_TILE_GRID: u32 = 8;

/// Adaptive binarization: Gaussian-weighted local threshold over an 11-px
/// block, offset 2. Sigma follows the OpenCV convention for an 11-px kernel:
/// 0.3 * ((ksize - 1) * 0.5 - 1) + 0.8 = 2.0.
const ADAPTIVE_BLOCK_SIGMA: f32 = 2.0;
const ADAPTIVE_OFFSET: i16 = 2;

/// Edge-preserving denoise window and range sigma.
/// Smaller sigma = stronger edge preservation, less smoothing across edges.
const DENOISE_RADIUS: u32 = 3;
const DENOISE_RANGE_SIGMA: f32 = 25.0;

/// Simple variant: global linear contrast stretch, then mild smoothing.
const CONTRAST_SCALE: f32 = 1.5;
const CONTRAST_BIAS: f32 = 30.0;
const SMOOTHING_SIGMA: f32 = 0.5;

/// Build the ordered preprocessing variants for one page image.
///
/// Always produces all three — no early exit even when an earlier variant
/// would already read well. The reconciler needs every candidate to pick
/// the longest OCR result.
pub fn build_variants(page: &DynamicImage) -> Result<Vec<PreprocessedVariant>, ExtractionError> {
    let gray = page.to_luma8();

    let enhanced = preprocess_enhanced(&gray);
    let simple = preprocess_simple(&gray);

    Ok(vec![
        PreprocessedVariant {
            kind: VariantKind::Enhanced,
            png_bytes: encode_gray_png(&enhanced)?,
        },
        PreprocessedVariant {
            kind: VariantKind::Simple,
            png_bytes: encode_gray_png(&simple)?,
        },
        PreprocessedVariant {
            kind: VariantKind::Original,
            png_bytes: encode_png(page)?,
        },
    ])
}

/// Enhanced variant: 2x cubic upscale, denoise, local contrast
/// enhancement, adaptive binarization.
///
/// CatmullRom (cubic spline) is used for the upscale: Lanczos3 is sharper
/// but introduces ringing artifacts around high-contrast edges — exactly
/// what text characters are.
pub fn preprocess_enhanced(gray: &GrayImage) -> GrayImage {
    let (w, h) = (gray.width(), gray.height());
    let upscaled = image::imageops::resize(gray, w * 2, h * 2, FilterType::CatmullRom);
    let denoised = denoise(&upscaled, DENOISE_RADIUS, DENOISE_RANGE_SIGMA);
    let equalized = equalize_local_contrast(&denoised, CLAHE_CLIP_LIMIT, CLAHE_TILE_GRID);
    adaptive_threshold(&equalized, ADAPTIVE_BLOCK_SIGMA, ADAPTIVE_OFFSET)
}

/// Simple variant: linear contrast stretch plus a mild Gaussian blur.
pub fn preprocess_simple(gray: &GrayImage) -> GrayImage {
    let mut stretched = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = (pixel.0[0] as f32 * CONTRAST_SCALE + CONTRAST_BIAS).clamp(0.0, 255.0);
        stretched.put_pixel(x, y, Luma([value as u8]));
    }
    image::imageops::blur(&stretched, SMOOTHING_SIGMA)
}

/// Edge-preserving denoise: bilateral filter on grayscale.
///
/// Smooths speckle noise while keeping text boundaries — a plain box or
/// Gaussian blur would blur the strokes OCR depends on. Pure Rust, no
/// `imageproc` dependency.
pub fn denoise(img: &GrayImage, radius: u32, range_sigma: f32) -> GrayImage {
    let (w, h) = (img.width(), img.height());
    let mut output = GrayImage::new(w, h);
    let range_sigma_sq_2 = 2.0 * range_sigma * range_sigma;

    for y in 0..h {
        for x in 0..w {
            let center = img.get_pixel(x, y).0[0] as f32;

            let mut sum = 0.0f32;
            let mut weight_sum = 0.0f32;

            let y_start = y.saturating_sub(radius);
            let y_end = (y + radius + 1).min(h);
            let x_start = x.saturating_sub(radius);
            let x_end = (x + radius + 1).min(w);

            for ny in y_start..y_end {
                for nx in x_start..x_end {
                    let neighbor = img.get_pixel(nx, ny).0[0] as f32;
                    let diff = neighbor - center;
                    let range_weight = (-(diff * diff) / range_sigma_sq_2).exp();
                    sum += neighbor * range_weight;
                    weight_sum += range_weight;
                }
            }

            let value = if weight_sum > 0.0 {
                (sum / weight_sum).round().clamp(0.0, 255.0) as u8
            } else {
                center as u8
            };
            output.put_pixel(x, y, Luma([value]));
        }
    }

    output
}

/// Contrast-limited local histogram equalization (CLAHE).
///
/// The image is divided into a `grid x grid` tile layout; each tile gets a
/// clip-limited equalization mapping, and every pixel is remapped by
/// bilinear interpolation between the four nearest tile mappings. The clip
/// limit caps how much any single intensity can be amplified, which keeps
/// background paper texture from exploding into noise.
pub fn equalize_local_contrast(img: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return img.clone();
    }

    let tile_w = w.div_ceil(grid).max(1);
    let tile_h = h.div_ceil(grid).max(1);
    let tiles_x = w.div_ceil(tile_w);
    let tiles_y = h.div_ceil(tile_h);

    // Per-tile clip-limited equalization LUTs.
    let mut luts: Vec<[u8; 256]> = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);
            luts.push(tile_lut(img, x0, y0, x1, y1, clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| -> &[u8; 256] { &luts[(ty * tiles_x + tx) as usize] };

    // Bilinear interpolation between the four surrounding tile centers.
    let mut output = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let value = img.get_pixel(x, y).0[0] as usize;

            let fx = (x as f32 - tile_w as f32 / 2.0) / tile_w as f32;
            let fy = (y as f32 - tile_h as f32 / 2.0) / tile_h as f32;

            let tx0 = fx.floor().max(0.0) as u32;
            let ty0 = fy.floor().max(0.0) as u32;
            let tx0 = tx0.min(tiles_x - 1);
            let ty0 = ty0.min(tiles_y - 1);
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let ty1 = (ty0 + 1).min(tiles_y - 1);

            let wx = (fx - fx.floor()).clamp(0.0, 1.0);
            let wy = (fy - fy.floor()).clamp(0.0, 1.0);

            let top = lut_at(tx0, ty0)[value] as f32 * (1.0 - wx)
                + lut_at(tx1, ty0)[value] as f32 * wx;
            let bottom = lut_at(tx0, ty1)[value] as f32 * (1.0 - wx)
                + lut_at(tx1, ty1)[value] as f32 * wx;
            let mapped = (top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0);

            output.put_pixel(x, y, Luma([mapped as u8]));
        }
    }

    output
}

/// Clip-limited equalization LUT for one tile region.
fn tile_lut(img: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f32) -> [u8; 256] {
    let mut hist = [0u32; 256];
    let mut count = 0u32;
    for y in y0..y1 {
        for x in x0..x1 {
            hist[img.get_pixel(x, y).0[0] as usize] += 1;
            count += 1;
        }
    }

    let mut lut = [0u8; 256];
    if count == 0 {
        for (i, entry) in lut.iter_mut().enumerate() {
            *entry = i as u8;
        }
        return lut;
    }

    // Clip the histogram and redistribute the excess evenly.
    let clip = ((clip_limit * count as f32 / 256.0).max(1.0)) as u32;
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }
    let bonus = excess / 256;
    let mut remainder = (excess % 256) as usize;
    for bin in hist.iter_mut() {
        *bin += bonus;
        if remainder > 0 {
            *bin += 1;
            remainder -= 1;
        }
    }

    // Cumulative distribution → mapping.
    let mut cumulative = 0u64;
    for i in 0..256 {
        cumulative += hist[i] as u64;
        lut[i] = ((cumulative * 255) / count as u64).min(255) as u8;
    }
    lut
}

/// Adaptive binarization with a Gaussian-weighted local threshold.
///
/// A pixel becomes white when it sits above its local Gaussian mean minus
/// a small offset; everything else becomes black. Handles uneven scanner
/// illumination that defeats any global threshold.
pub fn adaptive_threshold(img: &GrayImage, sigma: f32, offset: i16) -> GrayImage {
    let local_mean = image::imageops::blur(img, sigma);
    let mut output = GrayImage::new(img.width(), img.height());

    for (x, y, pixel) in img.enumerate_pixels() {
        let mean = local_mean.get_pixel(x, y).0[0] as i16;
        let value = if pixel.0[0] as i16 > mean - offset {
            255
        } else {
            0
        };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Encode a grayscale image as PNG bytes for the OCR engine.
fn encode_gray_png(img: &GrayImage) -> Result<Vec<u8>, ExtractionError> {
    encode_png(&DynamicImage::ImageLuma8(img.clone()))
}

/// Encode any image as PNG bytes.
fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ExtractionError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encode failed: {e}")))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, _| Luma([(x * 255 / w.max(1)) as u8]))
    }

    #[test]
    fn builds_all_three_variants_in_fixed_order() {
        let page = DynamicImage::ImageLuma8(gradient_image(40, 40));
        let variants = build_variants(&page).unwrap();

        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].kind, VariantKind::Enhanced);
        assert_eq!(variants[1].kind, VariantKind::Simple);
        assert_eq!(variants[2].kind, VariantKind::Original);

        for variant in &variants {
            assert_eq!(&variant.png_bytes[0..4], b"\x89PNG");
        }
    }

    #[test]
    fn enhanced_variant_doubles_dimensions_and_binarizes() {
        let gray = gradient_image(32, 24);
        let enhanced = preprocess_enhanced(&gray);

        assert_eq!(enhanced.width(), 64);
        assert_eq!(enhanced.height(), 48);
        assert!(enhanced.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn simple_variant_applies_linear_stretch() {
        let gray = GrayImage::from_pixel(16, 16, Luma([100]));
        let simple = preprocess_simple(&gray);
        // 100 * 1.5 + 30 = 180; blur over a uniform image changes nothing
        // away from the borders.
        assert_eq!(simple.get_pixel(8, 8).0[0], 180);
    }

    #[test]
    fn simple_variant_saturates_at_white() {
        let gray = GrayImage::from_pixel(8, 8, Luma([220]));
        let simple = preprocess_simple(&gray);
        assert_eq!(simple.get_pixel(4, 4).0[0], 255);
    }

    #[test]
    fn denoise_preserves_uniform_regions() {
        let flat = GrayImage::from_pixel(20, 20, Luma([128]));
        let filtered = denoise(&flat, 3, 25.0);
        assert!(filtered.pixels().all(|p| p.0[0] == 128));
    }

    #[test]
    fn denoise_keeps_hard_edges() {
        // Left half black, right half white — an edge-preserving filter
        // must not produce mid-gray at the boundary.
        let img = GrayImage::from_fn(20, 20, |x, _| Luma([if x < 10 { 0 } else { 255 }]));
        let filtered = denoise(&img, 3, 25.0);
        assert!(filtered.get_pixel(9, 10).0[0] < 20);
        assert!(filtered.get_pixel(10, 10).0[0] > 235);
    }

    #[test]
    fn local_equalization_spreads_narrow_histogram() {
        // Low-contrast image: values confined to [100, 130].
        let img = GrayImage::from_fn(64, 64, |x, y| Luma([100 + ((x + y) % 31) as u8]));
        let equalized = equalize_local_contrast(&img, 3.0, 8);

        let spread = |im: &GrayImage| {
            let (mut min, mut max) = (255u8, 0u8);
            for p in im.pixels() {
                min = min.min(p.0[0]);
                max = max.max(p.0[0]);
            }
            max - min
        };
        assert!(spread(&equalized) > spread(&img));
    }

    #[test]
    fn adaptive_threshold_is_binary() {
        let img = gradient_image(40, 40);
        let binary = adaptive_threshold(&img, 2.0, 2);
        assert!(binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn adaptive_threshold_keeps_dark_ink_on_light_paper() {
        // Uniform light background with one dark stroke.
        let mut img = GrayImage::from_pixel(31, 31, Luma([200]));
        for y in 10..20 {
            img.put_pixel(15, y, Luma([30]));
        }
        let binary = adaptive_threshold(&img, 2.0, 2);
        assert_eq!(binary.get_pixel(15, 15).0[0], 0, "ink should stay black");
        assert_eq!(binary.get_pixel(3, 3).0[0], 255, "paper should stay white");
    }
}
