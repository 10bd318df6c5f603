//! Height-buffered occlusion: overwrite where the source is strictly higher.
//!
//! U16 heights treat zero as the invisible sentinel and clamp offset results
//! into 0..65535. F32 heights use negative infinity as the sentinel and
//! apply no clamp, which suits depth-sorted isometric overlays. The layer
//! variants copy the corresponding RGBA pixel(s) whenever the height wins.

use crate::draw::access::{ImageReader, ImageWriter, intersection};
use crate::image::pixel::Raster;
use crate::image::{ImageF32, ImageRgba, ImageU16};

struct LayerViews<P> {
    writer: ImageWriter<P>,
    reader: ImageReader<P>,
}

fn layer_views(
    target: &ImageRgba,
    source: &ImageRgba,
    left: i32,
    top: i32,
) -> Option<LayerViews<u32>> {
    intersection(target, source, left, top).map(|(writer, reader)| LayerViews { writer, reader })
}

#[inline]
fn repack(source_packed: u32, source: &ImageRgba, target: &ImageRgba) -> u32 {
    if source.pack_order_index() == target.pack_order_index() {
        source_packed
    } else {
        target.pack_order().pack_truncated(source.unpack(source_packed))
    }
}

#[inline]
fn offset_height_u16(raw: u16, offset: i32) -> Option<i32> {
    if raw == 0 {
        return None;
    }
    Some((raw as i32 + offset).clamp(0, 65535))
}

#[inline]
fn offset_height_f32(raw: f32, offset: f32) -> Option<f32> {
    if raw <= f32::NEG_INFINITY {
        return None;
    }
    Some(raw + offset)
}

macro_rules! higher_impl {
    ($name:ident, $name_one:ident, $name_two:ident, $height_image:ty, $height_pixel:ty, $offset_type:ty, $offset_fn:ident, $compare:expr) => {
        /// Height-only variant.
        pub fn $name(
            target_height: &$height_image,
            source_height: &$height_image,
            left: i32,
            top: i32,
            height_offset: $offset_type,
        ) {
            let Some((writer, reader)) = intersection(target_height, source_height, left, top) else {
                return;
            };
            let mut target_row = writer.pointer;
            let mut source_row = reader.pointer;
            for _ in 0..reader.height {
                for x in 0..reader.width as usize {
                    if let Some(new_height) = $offset_fn(source_row.get(x), height_offset) {
                        if ($compare)(new_height, target_row.get(x)) {
                            target_row.set(x, new_height as $height_pixel);
                        }
                    }
                }
                target_row.increase_bytes(writer.stride as usize);
                source_row.increase_bytes(reader.stride as usize);
            }
        }

        /// Height plus one attendant RGBA layer.
        pub fn $name_one(
            target_height: &$height_image,
            source_height: &$height_image,
            target_a: &ImageRgba,
            source_a: &ImageRgba,
            left: i32,
            top: i32,
            height_offset: $offset_type,
        ) {
            debug_assert_eq!(source_a.width(), source_height.width());
            debug_assert_eq!(source_a.height(), source_height.height());
            let Some((writer, reader)) = intersection(target_height, source_height, left, top) else {
                return;
            };
            let Some(layer_a) = layer_views(target_a, source_a, left, top) else {
                return;
            };
            let width = reader.width.min(layer_a.reader.width) as usize;
            let height = reader.height.min(layer_a.reader.height);
            let mut target_row = writer.pointer;
            let mut source_row = reader.pointer;
            let mut target_a_row = layer_a.writer.pointer;
            let mut source_a_row = layer_a.reader.pointer;
            for _ in 0..height {
                for x in 0..width {
                    if let Some(new_height) = $offset_fn(source_row.get(x), height_offset) {
                        if ($compare)(new_height, target_row.get(x)) {
                            target_row.set(x, new_height as $height_pixel);
                            target_a_row.set(x, repack(source_a_row.get(x), source_a, target_a));
                        }
                    }
                }
                target_row.increase_bytes(writer.stride as usize);
                source_row.increase_bytes(reader.stride as usize);
                target_a_row.increase_bytes(layer_a.writer.stride as usize);
                source_a_row.increase_bytes(layer_a.reader.stride as usize);
            }
        }

        /// Height plus two attendant RGBA layers, for diffuse + normal style
        /// compositors.
        pub fn $name_two(
            target_height: &$height_image,
            source_height: &$height_image,
            target_a: &ImageRgba,
            source_a: &ImageRgba,
            target_b: &ImageRgba,
            source_b: &ImageRgba,
            left: i32,
            top: i32,
            height_offset: $offset_type,
        ) {
            debug_assert_eq!(source_a.width(), source_height.width());
            debug_assert_eq!(source_b.width(), source_height.width());
            let Some((writer, reader)) = intersection(target_height, source_height, left, top) else {
                return;
            };
            let Some(layer_a) = layer_views(target_a, source_a, left, top) else {
                return;
            };
            let Some(layer_b) = layer_views(target_b, source_b, left, top) else {
                return;
            };
            let width = (reader.width.min(layer_a.reader.width).min(layer_b.reader.width)) as usize;
            let height = reader.height.min(layer_a.reader.height).min(layer_b.reader.height);
            let mut target_row = writer.pointer;
            let mut source_row = reader.pointer;
            let mut target_a_row = layer_a.writer.pointer;
            let mut source_a_row = layer_a.reader.pointer;
            let mut target_b_row = layer_b.writer.pointer;
            let mut source_b_row = layer_b.reader.pointer;
            for _ in 0..height {
                for x in 0..width {
                    if let Some(new_height) = $offset_fn(source_row.get(x), height_offset) {
                        if ($compare)(new_height, target_row.get(x)) {
                            target_row.set(x, new_height as $height_pixel);
                            target_a_row.set(x, repack(source_a_row.get(x), source_a, target_a));
                            target_b_row.set(x, repack(source_b_row.get(x), source_b, target_b));
                        }
                    }
                }
                target_row.increase_bytes(writer.stride as usize);
                source_row.increase_bytes(reader.stride as usize);
                target_a_row.increase_bytes(layer_a.writer.stride as usize);
                source_a_row.increase_bytes(layer_a.reader.stride as usize);
                target_b_row.increase_bytes(layer_b.writer.stride as usize);
                source_b_row.increase_bytes(layer_b.reader.stride as usize);
            }
        }
    };
}

higher_impl!(
    draw_higher_u16,
    draw_higher_u16_with_layer,
    draw_higher_u16_with_two_layers,
    ImageU16,
    u16,
    i32,
    offset_height_u16,
    |new: i32, old: u16| new > old as i32
);

higher_impl!(
    draw_higher_f32,
    draw_higher_f32_with_layer,
    draw_higher_f32_with_two_layers,
    ImageF32,
    f32,
    f32,
    offset_height_f32,
    |new: f32, old: f32| new > old
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::color::Color;

    #[test]
    fn lower_or_equal_heights_are_identity() {
        let target = ImageU16::create(2, 2).unwrap();
        target.write_pixel(0, 0, 100);
        target.write_pixel(1, 1, 100);
        let source = ImageU16::create(2, 2).unwrap();
        source.write_pixel(0, 0, 100);
        source.write_pixel(1, 1, 40);
        draw_higher_u16(&target, &source, 0, 0, 0);
        assert_eq!(target.read_clamp(0, 0), 100);
        assert_eq!(target.read_clamp(1, 1), 100);
    }

    #[test]
    fn zero_source_height_is_invisible_even_with_offset() {
        let target = ImageU16::create(1, 1).unwrap();
        let source = ImageU16::create(1, 1).unwrap();
        draw_higher_u16(&target, &source, 0, 0, 500);
        assert_eq!(target.read_clamp(0, 0), 0);
    }

    #[test]
    fn offset_clamps_into_u16_range() {
        let target = ImageU16::create(1, 1).unwrap();
        let source = ImageU16::create(1, 1).unwrap();
        source.write_pixel(0, 0, 60000);
        draw_higher_u16(&target, &source, 0, 0, 20000);
        assert_eq!(target.read_clamp(0, 0), 65535);
    }

    #[test]
    fn winning_height_copies_the_color_layer() {
        let target_height = ImageU16::create(2, 1).unwrap();
        target_height.write_pixel(1, 0, 500);
        let source_height = ImageU16::create(2, 1).unwrap();
        source_height.write_pixel(0, 0, 10);
        source_height.write_pixel(1, 0, 10);
        let target_color = ImageRgba::create(2, 1).unwrap();
        let source_color = ImageRgba::create(2, 1).unwrap();
        source_color.write_color(0, 0, Color::new(1, 2, 3, 4));
        source_color.write_color(1, 0, Color::new(5, 6, 7, 8));
        draw_higher_u16_with_layer(&target_height, &source_height, &target_color, &source_color, 0, 0, 0);
        assert_eq!(target_color.read_color_clamp(0, 0), Color::new(1, 2, 3, 4));
        // The occluded pixel keeps its old color.
        assert_eq!(target_color.read_color_clamp(1, 0), Color::new(0, 0, 0, 0));
        assert_eq!(target_height.read_clamp(1, 0), 500);
    }

    #[test]
    fn float_heights_use_negative_infinity_as_sentinel() {
        let target = ImageF32::create(2, 1).unwrap();
        crate::draw::draw_rectangle_f32(&target, target.bound(), -1000.0);
        let source = ImageF32::create(2, 1).unwrap();
        source.write_pixel(0, 0, f32::NEG_INFINITY);
        source.write_pixel(1, 0, -5.5);
        draw_higher_f32(&target, &source, 0, 0, 2.0);
        assert_eq!(target.read_clamp(0, 0), -1000.0);
        assert_eq!(target.read_clamp(1, 0), -3.5);
    }
}
