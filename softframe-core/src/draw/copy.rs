//! Image-to-image copy with format conversion.
//!
//! Same-format copies are row memcpys (with a per-pixel repack when two RGBA
//! images disagree on pack order). Monochrome conversions clamp into the
//! narrower range; float sources round to nearest with NaN treated as black.
//! Monochrome sources replicate their luma into R, G and B with full alpha.

use crate::draw::access::{intersection, iterate_pixels, iterate_rows};
use crate::image::pixel::Raster;
use crate::image::{ImageF32, ImageRgba, ImageU8, ImageU16};

/// Round a float luma to the nearest byte with saturation. Values that fail
/// `x >= 0.5` (including NaN) become 0, values above 254.5 become 255.
#[inline]
pub(crate) fn saturate_float_to_byte(value: f32) -> u8 {
    if !(value >= 0.5) {
        0
    } else if value > 254.5 {
        255
    } else {
        (value + 0.5) as u8
    }
}

/// Copy `source` into `self` with its upper left corner at `(left, top)`,
/// converting the pixel format on the way. Placements without overlap are
/// no-ops.
pub trait CopyFrom<S> {
    fn draw_copy(&self, source: &S, left: i32, top: i32);
}

macro_rules! copy_rows_same_format {
    ($target_type:ty, $source_type:ty) => {
        impl CopyFrom<$source_type> for $target_type {
            fn draw_copy(&self, source: &$source_type, left: i32, top: i32) {
                if let Some((writer, reader)) = intersection(self, source, left, top) {
                    let width = reader.width as usize;
                    iterate_rows(&writer, &reader, |target_row, source_row| {
                        target_row.copy_elements_from(&source_row, width);
                    });
                }
            }
        }
    };
}

copy_rows_same_format!(ImageU8, ImageU8);
copy_rows_same_format!(ImageU16, ImageU16);
copy_rows_same_format!(ImageF32, ImageF32);

impl CopyFrom<ImageRgba> for ImageRgba {
    fn draw_copy(&self, source: &ImageRgba, left: i32, top: i32) {
        let Some((writer, reader)) = intersection(self, source, left, top) else {
            return;
        };
        if self.pack_order_index() == source.pack_order_index() {
            let width = reader.width as usize;
            iterate_rows(&writer, &reader, |target_row, source_row| {
                target_row.copy_elements_from(&source_row, width);
            });
        } else {
            // Read and repack to convert between channel orders.
            iterate_pixels(&writer, &reader, |target_row, source_row, x| {
                let color = source.unpack(source_row.get(x));
                target_row.set(x, self.pack_order().pack_truncated(color));
            });
        }
    }
}

impl CopyFrom<ImageU16> for ImageU8 {
    fn draw_copy(&self, source: &ImageU16, left: i32, top: i32) {
        if let Some((writer, reader)) = intersection(self, source, left, top) {
            iterate_pixels(&writer, &reader, |target_row, source_row, x| {
                target_row.set(x, source_row.get(x).min(255) as u8);
            });
        }
    }
}

impl CopyFrom<ImageF32> for ImageU8 {
    fn draw_copy(&self, source: &ImageF32, left: i32, top: i32) {
        if let Some((writer, reader)) = intersection(self, source, left, top) {
            iterate_pixels(&writer, &reader, |target_row, source_row, x| {
                target_row.set(x, saturate_float_to_byte(source_row.get(x)));
            });
        }
    }
}

impl CopyFrom<ImageU8> for ImageU16 {
    fn draw_copy(&self, source: &ImageU8, left: i32, top: i32) {
        if let Some((writer, reader)) = intersection(self, source, left, top) {
            iterate_pixels(&writer, &reader, |target_row, source_row, x| {
                target_row.set(x, source_row.get(x) as u16);
            });
        }
    }
}

impl CopyFrom<ImageF32> for ImageU16 {
    fn draw_copy(&self, source: &ImageF32, left: i32, top: i32) {
        if let Some((writer, reader)) = intersection(self, source, left, top) {
            iterate_pixels(&writer, &reader, |target_row, source_row, x| {
                // NaN fails both comparisons and lands on zero.
                let value = source_row.get(x);
                let clamped = if value >= 65535.0 {
                    65535
                } else if value >= 0.0 {
                    value as u16
                } else {
                    0
                };
                target_row.set(x, clamped);
            });
        }
    }
}

impl CopyFrom<ImageU8> for ImageF32 {
    fn draw_copy(&self, source: &ImageU8, left: i32, top: i32) {
        if let Some((writer, reader)) = intersection(self, source, left, top) {
            iterate_pixels(&writer, &reader, |target_row, source_row, x| {
                target_row.set(x, source_row.get(x) as f32);
            });
        }
    }
}

impl CopyFrom<ImageU16> for ImageF32 {
    fn draw_copy(&self, source: &ImageU16, left: i32, top: i32) {
        if let Some((writer, reader)) = intersection(self, source, left, top) {
            iterate_pixels(&writer, &reader, |target_row, source_row, x| {
                // Luma images are logically 0..255, so wider heights clamp.
                target_row.set(x, source_row.get(x).min(255) as f32);
            });
        }
    }
}

macro_rules! copy_luma_to_rgba {
    ($source_type:ty, $convert:expr) => {
        impl CopyFrom<$source_type> for ImageRgba {
            fn draw_copy(&self, source: &$source_type, left: i32, top: i32) {
                if let Some((writer, reader)) = intersection(self, source, left, top) {
                    let order = self.pack_order();
                    iterate_pixels(&writer, &reader, |target_row, source_row, x| {
                        let luma: u32 = ($convert)(source_row.get(x));
                        let packed = (luma << (order.red_index * 8))
                            | (luma << (order.green_index * 8))
                            | (luma << (order.blue_index * 8))
                            | (255u32 << (order.alpha_index * 8));
                        target_row.set(x, packed);
                    });
                }
            }
        }
    };
}

copy_luma_to_rgba!(ImageU8, |value: u8| value as u32);
copy_luma_to_rgba!(ImageU16, |value: u16| value.min(255) as u32);
copy_luma_to_rgba!(ImageF32, |value: f32| saturate_float_to_byte(value) as u32);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::color::{Color, PackOrderIndex};
    use crate::image::{max_difference_rgba, max_difference_u8};

    #[test]
    fn same_format_copy_is_idempotent_and_bit_exact() {
        let source = ImageU8::create(6, 5).unwrap();
        for y in 0..5 {
            for x in 0..6 {
                source.write_pixel(x, y, (x * 40 + y) as u8);
            }
        }
        let target = ImageU8::create(6, 5).unwrap();
        target.draw_copy(&source, 0, 0);
        assert_eq!(max_difference_u8(&target, &source), 0);
        target.draw_copy(&source, 0, 0);
        assert_eq!(max_difference_u8(&target, &source), 0);
    }

    #[test]
    fn copy_without_overlap_is_a_no_op() {
        let source = ImageU8::create(4, 4).unwrap();
        draw_fill(&source, 200);
        let target = ImageU8::create(4, 4).unwrap();
        target.draw_copy(&source, 4, 0);
        target.draw_copy(&source, 0, -4);
        target.draw_copy(&source, -4, 4);
        let empty = ImageU8::create(4, 4).unwrap();
        assert_eq!(max_difference_u8(&target, &empty), 0);
    }

    fn draw_fill(image: &ImageU8, value: i32) {
        crate::draw::draw_rectangle_u8(image, image.bound(), value);
    }

    #[test]
    fn pack_order_conversion_preserves_colors() {
        let bgra = ImageRgba::create_with_order(3, 2, PackOrderIndex::Bgra).unwrap();
        bgra.write_color(2, 1, Color::new(11, 22, 33, 44));
        let rgba = ImageRgba::create(3, 2).unwrap();
        rgba.draw_copy(&bgra, 0, 0);
        assert_eq!(rgba.read_color_clamp(2, 1), Color::new(11, 22, 33, 44));
        assert_eq!(max_difference_rgba(&rgba, &bgra), 0);
    }

    #[test]
    fn narrowing_copies_clamp() {
        let wide = ImageU16::create(2, 1).unwrap();
        wide.write_pixel(0, 0, 300);
        wide.write_pixel(1, 0, 77);
        let narrow = ImageU8::create(2, 1).unwrap();
        narrow.draw_copy(&wide, 0, 0);
        assert_eq!(narrow.read_clamp(0, 0), 255);
        assert_eq!(narrow.read_clamp(1, 0), 77);
    }

    #[test]
    fn float_copies_round_to_nearest_and_ignore_nan() {
        let float = ImageF32::create(5, 1).unwrap();
        float.write_pixel(0, 0, f32::NAN);
        float.write_pixel(1, 0, -3.0);
        float.write_pixel(2, 0, 0.6);
        float.write_pixel(3, 0, 200.4);
        float.write_pixel(4, 0, 300.0);
        let bytes = ImageU8::create(5, 1).unwrap();
        bytes.draw_copy(&float, 0, 0);
        assert_eq!(bytes.read_clamp(0, 0), 0);
        assert_eq!(bytes.read_clamp(1, 0), 0);
        assert_eq!(bytes.read_clamp(2, 0), 1);
        assert_eq!(bytes.read_clamp(3, 0), 200);
        assert_eq!(bytes.read_clamp(4, 0), 255);
    }

    #[test]
    fn float_to_u16_writes_the_clamped_value() {
        let float = ImageF32::create(3, 1).unwrap();
        float.write_pixel(0, 0, 70000.0);
        float.write_pixel(1, 0, -5.0);
        float.write_pixel(2, 0, 1234.5);
        let heights = ImageU16::create(3, 1).unwrap();
        heights.draw_copy(&float, 0, 0);
        assert_eq!(heights.read_clamp(0, 0), 65535);
        assert_eq!(heights.read_clamp(1, 0), 0);
        assert_eq!(heights.read_clamp(2, 0), 1234);
    }

    #[test]
    fn luma_replicates_into_rgba_with_full_alpha() {
        let luma = ImageU8::create(2, 1).unwrap();
        luma.write_pixel(0, 0, 100);
        let rgba = ImageRgba::create_with_order(2, 1, PackOrderIndex::Argb).unwrap();
        rgba.draw_copy(&luma, 0, 0);
        assert_eq!(rgba.read_color_clamp(0, 0), Color::new(100, 100, 100, 255));
        assert_eq!(rgba.read_color_clamp(1, 0), Color::new(0, 0, 0, 255));
    }

    #[test]
    fn partial_overlap_clips_both_views() {
        let source = ImageU8::create(4, 4).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                source.write_pixel(x, y, (y * 4 + x + 1) as u8);
            }
        }
        let target = ImageU8::create(4, 4).unwrap();
        target.draw_copy(&source, -2, -2);
        // Only the lower right quadrant of the source lands in the target.
        assert_eq!(target.read_clamp(0, 0), 11);
        assert_eq!(target.read_clamp(1, 1), 16);
        assert_eq!(target.read_clamp(2, 2), 0);
    }
}
