//! Solid rectangle fills and line drawing.

use crate::base::geometry::IRect;
use crate::image::color::{Color, is_uniform_byte};
use crate::image::pixel::Raster;
use crate::image::{ImageF32, ImageRgba, ImageU8, ImageU16};

/// Assign `value` to every pixel of the clipped rectangle, one pixel at a
/// time. Fallback for colors whose packed bytes differ.
fn fill_rect_assign<T: Raster>(target: &T, left: i32, top: i32, right: i32, bottom: i32, value: T::Pixel) {
    let left_bound = left.max(0);
    let top_bound = top.max(0);
    let right_bound = right.min(target.width());
    let bottom_bound = bottom.min(target.height());
    if right_bound <= left_bound || bottom_bound <= top_bound {
        return;
    }
    let mut row = target.row_pointer(top_bound);
    row.offset_elements(left_bound as usize);
    for _ in top_bound..bottom_bound {
        for x in 0..(right_bound - left_bound) as usize {
            row.set(x, value);
        }
        row.increase_bytes(target.stride() as usize);
    }
}

/// Byte fill of the clipped rectangle. Spans fuse when the filled rows are
/// contiguous in memory: a non-sub image filled across its whole width owns
/// its padding and fills it too; otherwise rows fuse only when the row bytes
/// equal the stride. Interleaved rows belonging to sibling views are never
/// touched.
fn fill_rect_memset<T: Raster>(target: &T, left: i32, top: i32, right: i32, bottom: i32, byte: u8) {
    let left_bound = left.max(0);
    let top_bound = top.max(0);
    let right_bound = right.min(target.width());
    let bottom_bound = bottom.min(target.height());
    if right_bound <= left_bound || bottom_bound <= top_bound {
        return;
    }
    let filled_width = right_bound - left_bound;
    let row_bytes = filled_width as usize * T::pixel_size();
    let row_count = (bottom_bound - top_bound) as usize;
    let stride = target.stride() as usize;
    let mut row = target.row_pointer(top_bound);
    row.offset_elements(left_bound as usize);
    if !target.is_sub_image() && filled_width == target.width() {
        row.set_bytes(byte, stride * (row_count - 1) + row_bytes);
    } else if row_bytes == stride {
        row.set_bytes(byte, row_bytes * row_count);
    } else {
        for _ in 0..row_count {
            row.set_bytes(byte, row_bytes);
            row.increase_bytes(stride);
        }
    }
}

/// Fill a rectangle of a U8 image with `color` clamped to 0..255.
pub fn draw_rectangle_u8(target: &ImageU8, bound: IRect, color: i32) {
    let value = color.clamp(0, 255) as u8;
    fill_rect_memset(target, bound.left(), bound.top(), bound.right(), bound.bottom(), value);
}

/// Fill a rectangle of a U16 image with `color` clamped to 0..65535.
pub fn draw_rectangle_u16(target: &ImageU16, bound: IRect, color: i32) {
    let value = color.clamp(0, 65535) as u16;
    if value & 0xFF == value >> 8 {
        fill_rect_memset(target, bound.left(), bound.top(), bound.right(), bound.bottom(), (value & 0xFF) as u8);
    } else {
        fill_rect_assign(target, bound.left(), bound.top(), bound.right(), bound.bottom(), value);
    }
}

/// Fill a rectangle of an F32 image. Only 0.0 qualifies for the byte fill
/// through its all-zero bit pattern.
pub fn draw_rectangle_f32(target: &ImageF32, bound: IRect, color: f32) {
    if color == 0.0 && color.to_bits() == 0 {
        fill_rect_memset(target, bound.left(), bound.top(), bound.right(), bound.bottom(), 0);
    } else {
        fill_rect_assign(target, bound.left(), bound.top(), bound.right(), bound.bottom(), color);
    }
}

/// Fill a rectangle of an RGBA image with an already packed color.
pub fn draw_rectangle_packed(target: &ImageRgba, bound: IRect, packed: u32) {
    if is_uniform_byte(packed) {
        fill_rect_memset(target, bound.left(), bound.top(), bound.right(), bound.bottom(), (packed & 0xFF) as u8);
    } else {
        fill_rect_assign(target, bound.left(), bound.top(), bound.right(), bound.bottom(), packed);
    }
}

/// Fill a rectangle of an RGBA image, saturating and packing `color` in the
/// target's byte order.
pub fn draw_rectangle(target: &ImageRgba, bound: IRect, color: Color) {
    draw_rectangle_packed(target, bound, target.saturate_and_pack(color));
}

/// Closed Bresenham line: both endpoints are included. Lines with both
/// endpoints outside the same image edge are rejected before iterating.
fn draw_line_super<T: Raster>(target: &T, mut x1: i32, mut y1: i32, mut x2: i32, mut y2: i32, color: T::Pixel) {
    let width = target.width();
    let height = target.height();
    if (x1 < 0 && x2 < 0) || (y1 < 0 && y2 < 0) || (x1 >= width && x2 >= width) || (y1 >= height && y2 >= height) {
        return;
    }
    if y1 == y2 {
        // Sideways
        for x in x1.min(x2)..=x1.max(x2) {
            target.write_pixel(x, y1, color);
        }
    } else if x1 == x2 {
        // Down
        for y in y1.min(y2)..=y1.max(y2) {
            target.write_pixel(x1, y, color);
        }
    } else if (y2 - y1).abs() >= (x2 - x1).abs() {
        // Steep: iterate along y.
        if y2 < y1 {
            std::mem::swap(&mut x1, &mut x2);
            std::mem::swap(&mut y1, &mut y2);
        }
        let tilt = (x2 - x1).abs() * 2;
        let step = if x2 > x1 { 1 } else { -1 };
        let max_error = y2 - y1;
        let mut error = 0;
        let mut x = x1;
        for y in y1..=y2 {
            target.write_pixel(x, y, color);
            error += tilt;
            if error >= max_error {
                x += step;
                error -= max_error * 2;
            }
        }
    } else {
        // Shallow: iterate along x.
        if x2 < x1 {
            std::mem::swap(&mut x1, &mut x2);
            std::mem::swap(&mut y1, &mut y2);
        }
        let tilt = (y2 - y1).abs() * 2;
        let step = if y2 > y1 { 1 } else { -1 };
        let max_error = x2 - x1;
        let mut error = 0;
        let mut y = y1;
        for x in x1..=x2 {
            target.write_pixel(x, y, color);
            error += tilt;
            if error >= max_error {
                y += step;
                error -= max_error * 2;
            }
        }
    }
}

pub fn draw_line_u8(target: &ImageU8, x1: i32, y1: i32, x2: i32, y2: i32, color: i32) {
    draw_line_super(target, x1, y1, x2, y2, color.clamp(0, 255) as u8);
}

pub fn draw_line_u16(target: &ImageU16, x1: i32, y1: i32, x2: i32, y2: i32, color: i32) {
    draw_line_super(target, x1, y1, x2, y2, color.clamp(0, 65535) as u16);
}

pub fn draw_line_f32(target: &ImageF32, x1: i32, y1: i32, x2: i32, y2: i32, color: f32) {
    draw_line_super(target, x1, y1, x2, y2, color);
}

pub fn draw_line_packed(target: &ImageRgba, x1: i32, y1: i32, x2: i32, y2: i32, packed: u32) {
    draw_line_super(target, x1, y1, x2, y2, packed);
}

pub fn draw_line(target: &ImageRgba, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
    draw_line_packed(target, x1, y1, x2, y2, target.saturate_and_pack(color));
}
