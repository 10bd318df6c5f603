//! Lambda-driven image generation and mapping.
//!
//! A callable `f(x, y)` writes every pixel of an image or caller-supplied
//! region, with a caller-chosen start offset fed into the callable so tiled
//! generators can be stitched from sub-images. Monochrome outputs are
//! clamped into the channel range.

use crate::image::color::Color;
use crate::image::pixel::Raster;
use crate::image::{ImageError, ImageF32, ImageRgba, ImageU8, ImageU16};

/// Fill an RGBA image from `f(x, y) -> Color`, saturating the channels.
pub fn map_rgba(target: &ImageRgba, start_x: i32, start_y: i32, f: impl Fn(i32, i32) -> Color) {
    for y in 0..target.height() {
        let row = target.row_pointer(y);
        for x in 0..target.width() {
            row.set(x as usize, target.saturate_and_pack(f(x + start_x, y + start_y)));
        }
    }
}

pub fn generate_rgba(
    width: i32,
    height: i32,
    f: impl Fn(i32, i32) -> Color,
) -> Result<ImageRgba, ImageError> {
    let result = ImageRgba::create(width, height)?;
    map_rgba(&result, 0, 0, f);
    Ok(result)
}

/// Fill a U8 image from `f(x, y) -> i32`, clamping into 0..255.
pub fn map_u8(target: &ImageU8, start_x: i32, start_y: i32, f: impl Fn(i32, i32) -> i32) {
    for y in 0..target.height() {
        let row = target.row_pointer(y);
        for x in 0..target.width() {
            row.set(x as usize, f(x + start_x, y + start_y).clamp(0, 255) as u8);
        }
    }
}

pub fn generate_u8(width: i32, height: i32, f: impl Fn(i32, i32) -> i32) -> Result<ImageU8, ImageError> {
    let result = ImageU8::create(width, height)?;
    map_u8(&result, 0, 0, f);
    Ok(result)
}

/// Fill a U16 image from `f(x, y) -> i32`, clamping into 0..65535.
pub fn map_u16(target: &ImageU16, start_x: i32, start_y: i32, f: impl Fn(i32, i32) -> i32) {
    for y in 0..target.height() {
        let row = target.row_pointer(y);
        for x in 0..target.width() {
            row.set(x as usize, f(x + start_x, y + start_y).clamp(0, 65535) as u16);
        }
    }
}

pub fn generate_u16(width: i32, height: i32, f: impl Fn(i32, i32) -> i32) -> Result<ImageU16, ImageError> {
    let result = ImageU16::create(width, height)?;
    map_u16(&result, 0, 0, f);
    Ok(result)
}

/// Fill an F32 image from `f(x, y) -> f32`; floats are stored unclamped.
pub fn map_f32(target: &ImageF32, start_x: i32, start_y: i32, f: impl Fn(i32, i32) -> f32) {
    for y in 0..target.height() {
        let row = target.row_pointer(y);
        for x in 0..target.width() {
            row.set(x as usize, f(x + start_x, y + start_y));
        }
    }
}

pub fn generate_f32(width: i32, height: i32, f: impl Fn(i32, i32) -> f32) -> Result<ImageF32, ImageError> {
    let result = ImageF32::create(width, height)?;
    map_f32(&result, 0, 0, f);
    Ok(result)
}
