//! Nearest and bilinear resize with Q16.16 fixed-point sampling.
//!
//! Sampling convention: a full pixel is 65536 units. The step per target
//! pixel is `65536 * source_size / region_size`, the first sample sits at
//! `65536 * region_origin + step / 2`, and bilinear sampling shifts the
//! start back by half a pixel so samples center on the target pixels.
//! Weights are 16-bit, intermediates fit 32 bits for the supported image
//! sizes (channels stay <= 255 against 16-bit weights).

use crate::base::geometry::IRect;
use crate::base::simd::{U32x4, mix_packed_colors_uniform};
use crate::draw::CopyFrom;
use crate::image::color::Color;
use crate::image::pixel::Raster;
use crate::image::{ImageError, ImageRgba, ImageU8};

const FULL_PIXEL: i32 = 65536;
const HALF_PIXEL: i32 = FULL_PIXEL / 2;
const WEIGHT_MASK: u32 = FULL_PIXEL as u32 - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sampler {
    Nearest,
    Linear,
}

#[inline]
fn mix_channel(a: u32, b: u32, ratio_b: u32) -> u32 {
    (a * (FULL_PIXEL as u32 - ratio_b) + b * ratio_b) >> 16
}

#[inline]
fn sample_color_bilinear(source: &ImageRgba, left_x: i32, upper_y: i32, right_ratio: u32, lower_ratio: u32) -> Color {
    let upper_left = source.read_color_clamp(left_x, upper_y);
    let upper_right = source.read_color_clamp(left_x + 1, upper_y);
    let lower_left = source.read_color_clamp(left_x, upper_y + 1);
    let lower_right = source.read_color_clamp(left_x + 1, upper_y + 1);
    let mix = |ul: i32, ur: i32, ll: i32, lr: i32| -> i32 {
        let upper = mix_channel(ul as u32, ur as u32, right_ratio);
        let lower = mix_channel(ll as u32, lr as u32, right_ratio);
        mix_channel(upper, lower, lower_ratio) as i32
    };
    Color::new(
        mix(upper_left.red, upper_right.red, lower_left.red, lower_right.red),
        mix(upper_left.green, upper_right.green, lower_left.green, lower_right.green),
        mix(upper_left.blue, upper_right.blue, lower_left.blue, lower_right.blue),
        mix(upper_left.alpha, upper_right.alpha, lower_left.alpha, lower_right.alpha),
    )
}

fn resize_reference_rgba(target: &ImageRgba, source: &ImageRgba, bilinear: bool, scale_region: IRect) {
    let offset_x = (FULL_PIXEL as i64 * source.width() as i64 / scale_region.width() as i64) as i32;
    let offset_y = (FULL_PIXEL as i64 * source.height() as i64 / scale_region.height() as i64) as i32;
    let mut start_x = FULL_PIXEL.wrapping_mul(scale_region.left()) + offset_x / 2;
    let mut start_y = FULL_PIXEL.wrapping_mul(scale_region.top()) + offset_y / 2;
    if bilinear {
        start_x -= HALF_PIXEL;
        start_y -= HALF_PIXEL;
    }
    let mut read_y = start_y;
    for y in 0..target.height() {
        let sample_y = read_y.max(0) as u32;
        let upper_y = (sample_y >> 16) as i32;
        let lower_ratio = sample_y & WEIGHT_MASK;
        let target_row = target.row_pointer(y);
        let mut read_x = start_x;
        for x in 0..target.width() as usize {
            let sample_x = read_x.max(0) as u32;
            let left_x = (sample_x >> 16) as i32;
            let right_ratio = sample_x & WEIGHT_MASK;
            let packed = if bilinear {
                target.saturate_and_pack(sample_color_bilinear(source, left_x, upper_y, right_ratio, lower_ratio))
            } else {
                target.saturate_and_pack(source.read_color_clamp(left_x, upper_y))
            };
            target_row.set(x, packed);
            read_x += offset_x;
        }
        read_y += offset_y;
    }
}

fn resize_reference_u8(target: &ImageU8, source: &ImageU8, bilinear: bool, scale_region: IRect) {
    let offset_x = (FULL_PIXEL as i64 * source.width() as i64 / scale_region.width() as i64) as i32;
    let offset_y = (FULL_PIXEL as i64 * source.height() as i64 / scale_region.height() as i64) as i32;
    let mut start_x = FULL_PIXEL.wrapping_mul(scale_region.left()) + offset_x / 2;
    let mut start_y = FULL_PIXEL.wrapping_mul(scale_region.top()) + offset_y / 2;
    if bilinear {
        start_x -= HALF_PIXEL;
        start_y -= HALF_PIXEL;
    }
    let mut read_y = start_y;
    for y in 0..target.height() {
        let sample_y = read_y.max(0) as u32;
        let upper_y = (sample_y >> 16) as i32;
        let lower_ratio = sample_y & WEIGHT_MASK;
        let target_row = target.row_pointer(y);
        let mut read_x = start_x;
        for x in 0..target.width() as usize {
            let sample_x = read_x.max(0) as u32;
            let left_x = (sample_x >> 16) as i32;
            let right_ratio = sample_x & WEIGHT_MASK;
            let value = if bilinear {
                let upper = mix_channel(
                    source.read_clamp(left_x, upper_y) as u32,
                    source.read_clamp(left_x + 1, upper_y) as u32,
                    right_ratio,
                );
                let lower = mix_channel(
                    source.read_clamp(left_x, upper_y + 1) as u32,
                    source.read_clamp(left_x + 1, upper_y + 1) as u32,
                    right_ratio,
                );
                mix_channel(upper, lower, lower_ratio) as u8
            } else {
                source.read_clamp(left_x, upper_y)
            };
            target_row.set(x, value);
            read_x += offset_x;
        }
        read_y += offset_y;
    }
}

/// Vertical-only interpolation: rows keep their width so bilinear rows mix
/// with one uniform weight (a SIMD inner loop over aligned non-sub images)
/// and nearest rows degenerate to a memcpy.
fn resize_vertical_rgba(target: &ImageRgba, source: &ImageRgba, bilinear: bool, scale_region: IRect, simd_aligned: bool) {
    let offset_y = (FULL_PIXEL as i64 * source.height() as i64 / scale_region.height() as i64) as i32;
    let mut start_y = FULL_PIXEL.wrapping_mul(scale_region.top()) + offset_y / 2;
    if bilinear {
        start_y -= HALF_PIXEL;
    }
    let mut read_y = start_y;
    for y in 0..target.height() {
        let sample_y = read_y.max(0) as u32;
        let mut upper_y = (sample_y >> 16) as i32;
        let mut lower_y = upper_y + 1;
        upper_y = upper_y.min(source.height() - 1);
        lower_y = lower_y.min(source.height() - 1);
        let target_row = target.row_pointer(y);
        if bilinear {
            let lower_ratio = sample_y & WEIGHT_MASK;
            if simd_aligned {
                let mut upper_row = source.row_pointer(upper_y);
                let mut lower_row = source.row_pointer(lower_y);
                let mut target_pixel = target_row;
                let mut x = 0;
                while x < target.width() {
                    let upper = U32x4::read_aligned(upper_row);
                    let lower = U32x4::read_aligned(lower_row);
                    mix_packed_colors_uniform(upper, lower, lower_ratio).write_aligned(target_pixel);
                    upper_row.offset_elements(4);
                    lower_row.offset_elements(4);
                    target_pixel.offset_elements(4);
                    x += 4;
                }
            } else {
                for x in 0..target.width() {
                    let upper = source.read_color_clamp(x, upper_y);
                    let lower = source.read_color_clamp(x, lower_y);
                    let mixed = Color::new(
                        mix_channel(upper.red as u32, lower.red as u32, lower_ratio) as i32,
                        mix_channel(upper.green as u32, lower.green as u32, lower_ratio) as i32,
                        mix_channel(upper.blue as u32, lower.blue as u32, lower_ratio) as i32,
                        mix_channel(upper.alpha as u32, lower.alpha as u32, lower_ratio) as i32,
                    );
                    target_row.set(x as usize, target.saturate_and_pack(mixed));
                }
            }
        } else {
            // Nearest from an equal-width source: one copy per row.
            target_row.copy_elements_from(&source.row_pointer(upper_y), source.width() as usize);
        }
        read_y += offset_y;
    }
}

fn resize_horizontal_rgba(target: &ImageRgba, source: &ImageRgba, bilinear: bool, scale_region: IRect) {
    let offset_x = (FULL_PIXEL as i64 * source.width() as i64 / scale_region.width() as i64) as i32;
    let mut start_x = FULL_PIXEL.wrapping_mul(scale_region.left()) + offset_x / 2;
    if bilinear {
        start_x -= HALF_PIXEL;
    }
    for y in 0..target.height() {
        let target_row = target.row_pointer(y);
        let mut read_x = start_x;
        for x in 0..target.width() as usize {
            let sample_x = read_x.max(0) as u32;
            let left_x = (sample_x >> 16) as i32;
            let right_ratio = sample_x & WEIGHT_MASK;
            let color = if bilinear {
                let left = source.read_color_clamp(left_x, y);
                let right = source.read_color_clamp(left_x + 1, y);
                Color::new(
                    mix_channel(left.red as u32, right.red as u32, right_ratio) as i32,
                    mix_channel(left.green as u32, right.green as u32, right_ratio) as i32,
                    mix_channel(left.blue as u32, right.blue as u32, right_ratio) as i32,
                    mix_channel(left.alpha as u32, right.alpha as u32, right_ratio) as i32,
                )
            } else {
                source.read_color_clamp(left_x, y)
            };
            target_row.set(x, target.saturate_and_pack(color));
            read_x += offset_x;
        }
    }
}

fn resize_region_rgba(target: &ImageRgba, source: &ImageRgba, bilinear: bool, scale_region: IRect) {
    let same_width = source.width() == scale_region.width() && scale_region.left() == 0;
    let same_height = source.height() == scale_region.height() && scale_region.top() == 0;
    let same_pack_order = target.pack_order_index() == source.pack_order_index();
    if same_width && same_height {
        // No need to resize, just make a copy to save time.
        target.draw_copy(source, 0, 0);
    } else if same_width && same_pack_order {
        let simd_aligned = !source.is_sub_image() && !target.is_sub_image();
        resize_vertical_rgba(target, source, bilinear, scale_region, simd_aligned && bilinear);
    } else if same_width && bilinear {
        resize_vertical_rgba(target, source, bilinear, scale_region, false);
    } else if same_height {
        resize_horizontal_rgba(target, source, bilinear, scale_region);
    } else {
        resize_reference_rgba(target, source, bilinear, scale_region);
    }
}

/// Resize `source` to fill `target`.
pub fn resize_into_rgba(target: &ImageRgba, source: &ImageRgba, sampler: Sampler) {
    let bilinear = sampler == Sampler::Linear;
    let scale_region = target.bound();
    if target.width() != source.width() && target.height() > source.height() {
        // Upscaling runs faster in two steps: the horizontal pass is reused
        // by every output row and the vertical pass vectorizes.
        let temp_region = IRect::new(scale_region.left(), 0, scale_region.width(), source.height());
        if let Ok(temp) =
            ImageRgba::create_with_order(target.width(), source.height(), target.pack_order_index())
        {
            resize_region_rgba(&temp, source, bilinear, temp_region);
            resize_region_rgba(target, &temp, bilinear, scale_region);
            return;
        }
    }
    resize_region_rgba(target, source, bilinear, scale_region);
}

/// Resize `source` into a new RGBA image of `width` x `height`.
pub fn resize_rgba(source: &ImageRgba, sampler: Sampler, width: i32, height: i32) -> Result<ImageRgba, ImageError> {
    let result = ImageRgba::create(width, height)?;
    resize_into_rgba(&result, source, sampler);
    Ok(result)
}

/// Resize a U8 image into a new image of `width` x `height`.
pub fn resize_u8(source: &ImageU8, sampler: Sampler, width: i32, height: i32) -> Result<ImageU8, ImageError> {
    let result = ImageU8::create(width, height)?;
    let bilinear = sampler == Sampler::Linear;
    let scale_region = result.bound();
    if width != source.width() && height > source.height() {
        let temp_region = IRect::new(0, 0, width, source.height());
        if let Ok(temp) = ImageU8::create(width, source.height()) {
            resize_reference_u8(&temp, source, bilinear, temp_region);
            resize_reference_u8(&result, &temp, bilinear, scale_region);
            return Ok(result);
        }
    }
    resize_reference_u8(&result, source, bilinear, scale_region);
    Ok(result)
}
