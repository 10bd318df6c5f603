//! Alpha compositing, masking and silhouette coloring.

use crate::draw::access::{intersection, iterate_pixels};
use crate::image::color::{Color, PackOrder, normalized_byte_multiplication as nbm};
use crate::image::pixel::Raster;
use crate::image::{ImageRgba, ImageU8};

#[inline]
fn channel(packed: u32, byte_index: usize) -> u32 {
    (packed >> (byte_index * 8)) & 0xFF
}

#[inline]
fn composite_channel(target: u32, source: u32, target_ratio: u32, source_ratio: u32) -> u32 {
    nbm(target, target_ratio) + nbm(source, source_ratio)
}

/// Blend a partially covered pixel into `target_packed`. `source_ratio` is
/// the source alpha in 1..=254.
#[inline]
fn blend_pixel(
    target_packed: u32,
    target_order: PackOrder,
    red: u32,
    green: u32,
    blue: u32,
    source_ratio: u32,
) -> u32 {
    let target_ratio = 255 - source_ratio;
    let out_red = composite_channel(channel(target_packed, target_order.red_index), red, target_ratio, source_ratio);
    let out_green =
        composite_channel(channel(target_packed, target_order.green_index), green, target_ratio, source_ratio);
    let out_blue =
        composite_channel(channel(target_packed, target_order.blue_index), blue, target_ratio, source_ratio);
    let out_alpha = nbm(channel(target_packed, target_order.alpha_index), target_ratio) + source_ratio;
    (out_red << (target_order.red_index * 8))
        | (out_green << (target_order.green_index * 8))
        | (out_blue << (target_order.blue_index * 8))
        | (out_alpha << (target_order.alpha_index * 8))
}

/// Alpha composite `source` over `target`, optimized for anti-aliased edges
/// where most alpha values are 0 or 255: fully transparent pixels are
/// skipped, fully opaque ones overwrite RGB and force alpha to 255, and only
/// the partial pixels blend.
pub fn draw_alpha_filter(target: &ImageRgba, source: &ImageRgba, left: i32, top: i32) {
    let Some((writer, reader)) = intersection(target, source, left, top) else {
        return;
    };
    let target_order = target.pack_order();
    let source_order = source.pack_order();
    iterate_pixels(&writer, &reader, |target_row, source_row, x| {
        let source_packed = source_row.get(x);
        let source_ratio = channel(source_packed, source_order.alpha_index);
        if source_ratio == 0 {
            return;
        }
        if source_ratio == 255 {
            let packed = (channel(source_packed, source_order.red_index) << (target_order.red_index * 8))
                | (channel(source_packed, source_order.green_index) << (target_order.green_index * 8))
                | (channel(source_packed, source_order.blue_index) << (target_order.blue_index * 8))
                | (255 << (target_order.alpha_index * 8));
            target_row.set(x, packed);
        } else {
            let blended = blend_pixel(
                target_row.get(x),
                target_order,
                channel(source_packed, source_order.red_index),
                channel(source_packed, source_order.green_index),
                channel(source_packed, source_order.blue_index),
                source_ratio,
            );
            target_row.set(x, blended);
        }
    });
}

/// Overwrite target pixels whose source alpha plus `alpha_offset` exceeds
/// the target alpha. A source alpha of zero stays a transparent mask even
/// with a positive offset. The offset result saturates to 0..255 before
/// landing in the target alpha.
pub fn draw_max_alpha(target: &ImageRgba, source: &ImageRgba, left: i32, top: i32, alpha_offset: i32) {
    let Some((writer, reader)) = intersection(target, source, left, top) else {
        return;
    };
    let target_order = target.pack_order();
    let source_order = source.pack_order();
    if alpha_offset == 0 {
        iterate_pixels(&writer, &reader, |target_row, source_row, x| {
            let source_packed = source_row.get(x);
            let source_alpha = channel(source_packed, source_order.alpha_index);
            let target_packed = target_row.get(x);
            if source_alpha > channel(target_packed, target_order.alpha_index) {
                let packed = (channel(source_packed, source_order.red_index) << (target_order.red_index * 8))
                    | (channel(source_packed, source_order.green_index) << (target_order.green_index * 8))
                    | (channel(source_packed, source_order.blue_index) << (target_order.blue_index * 8))
                    | (source_alpha << (target_order.alpha_index * 8));
                target_row.set(x, packed);
            }
        });
    } else {
        iterate_pixels(&writer, &reader, |target_row, source_row, x| {
            let source_packed = source_row.get(x);
            let source_alpha = channel(source_packed, source_order.alpha_index) as i32;
            if source_alpha == 0 {
                return;
            }
            let offset_alpha = source_alpha + alpha_offset;
            let target_packed = target_row.get(x);
            if offset_alpha > channel(target_packed, target_order.alpha_index) as i32 {
                let stored_alpha = offset_alpha.clamp(0, 255) as u32;
                let packed = (channel(source_packed, source_order.red_index) << (target_order.red_index * 8))
                    | (channel(source_packed, source_order.green_index) << (target_order.green_index * 8))
                    | (channel(source_packed, source_order.blue_index) << (target_order.blue_index * 8))
                    | (stored_alpha << (target_order.alpha_index * 8));
                target_row.set(x, packed);
            }
        });
    }
}

/// Overwrite target RGB and set alpha to 255 wherever the source alpha
/// exceeds `threshold`; everything else is left untouched.
pub fn draw_alpha_clip(target: &ImageRgba, source: &ImageRgba, left: i32, top: i32, threshold: i32) {
    let Some((writer, reader)) = intersection(target, source, left, top) else {
        return;
    };
    let target_order = target.pack_order();
    let source_order = source.pack_order();
    iterate_pixels(&writer, &reader, |target_row, source_row, x| {
        let source_packed = source_row.get(x);
        if channel(source_packed, source_order.alpha_index) as i32 > threshold {
            let packed = (channel(source_packed, source_order.red_index) << (target_order.red_index * 8))
                | (channel(source_packed, source_order.green_index) << (target_order.green_index * 8))
                | (channel(source_packed, source_order.blue_index) << (target_order.blue_index * 8))
                | (255 << (target_order.alpha_index * 8));
            target_row.set(x, packed);
        }
    });
}

/// Colorize a U8 silhouette: the source luma acts as the alpha of the
/// colored pixel. A user alpha below 255 is pre-multiplied into the luma
/// first; zero user alpha draws nothing.
pub fn draw_silhouette(target: &ImageRgba, source: &ImageU8, color: Color, left: i32, top: i32) {
    if color.alpha <= 0 {
        return;
    }
    let color = color.saturate();
    let Some((writer, reader)) = intersection(target, source, left, top) else {
        return;
    };
    let target_order = target.pack_order();
    let full_alpha = color.alpha == 255;
    let red = color.red as u32;
    let green = color.green as u32;
    let blue = color.blue as u32;
    let user_alpha = color.alpha as u32;
    iterate_pixels(&writer, &reader, |target_row, source_row, x| {
        let luma = source_row.get(x) as u32;
        let source_ratio = if full_alpha { luma } else { nbm(luma, user_alpha) };
        if source_ratio == 0 {
            return;
        }
        if source_ratio == 255 {
            let packed = (red << (target_order.red_index * 8))
                | (green << (target_order.green_index * 8))
                | (blue << (target_order.blue_index * 8))
                | (255 << (target_order.alpha_index * 8));
            target_row.set(x, packed);
        } else {
            let blended = blend_pixel(target_row.get(x), target_order, red, green, blue, source_ratio);
            target_row.set(x, blended);
        }
    });
}
