//! Integer block magnification for chunky upscaling.
//!
//! Every source pixel becomes a `pixel_width` x `pixel_height` block in the
//! target; the source pack order is preserved. Square scales from 2 to 8
//! over non-sub images with matching pack order go through a dedicated
//! kernel that reads each source pixel once and writes whole runs. The
//! leftover right and bottom edges are filled with transparent black so a
//! scaled canvas presents as a clean letterbox.

use crate::base::geometry::IRect;
use crate::draw::draw_rectangle_packed;
use crate::image::ImageRgba;
use crate::image::pixel::Raster;

/// One fixed square scale, reading a source pixel once and writing an
/// `N`-wide run into `N` target rows per block.
fn block_magnify_kernel<const N: usize>(target: &ImageRgba, source: &ImageRgba, clip_width: i32, clip_height: i32) {
    let mut source_row = source.view_pointer();
    let mut target_rows = [target.view_pointer(); N];
    for (index, row) in target_rows.iter_mut().enumerate() {
        row.increase_bytes(index * target.stride() as usize);
    }
    let block_target_stride = target.stride() as usize * N;
    let mut upper_target_y = 0;
    while upper_target_y + N as i32 <= clip_height {
        let mut source_pixel = source_row;
        let mut target_pixels = target_rows;
        let mut write_left_x = 0;
        while write_left_x + N as i32 <= clip_width {
            let value = source_pixel.read();
            source_pixel.offset_elements(1);
            for row in &mut target_pixels {
                for offset in 0..N {
                    row.set(offset, value);
                }
                row.offset_elements(N);
            }
            write_left_x += N as i32;
        }
        source_row.increase_bytes(source.stride() as usize);
        for row in &mut target_rows {
            row.increase_bytes(block_target_stride);
        }
        upper_target_y += N as i32;
    }
}

/// General kernel for rectangular scales, sub-images and pack-order
/// conversion.
fn block_magnify_reference(
    target: &ImageRgba,
    source: &ImageRgba,
    pixel_width: i32,
    pixel_height: i32,
    clip_width: i32,
    clip_height: i32,
    convert_order: bool,
) {
    let max_source_x = source.width() - 1;
    let max_source_y = source.height() - 1;
    let mut source_y = 0;
    let mut pixel_top = 0;
    while pixel_top < clip_height {
        let mut source_x = 0;
        let mut pixel_left = 0;
        while pixel_left < clip_width {
            let mut packed = source.read_clamp(source_x, source_y);
            if convert_order {
                packed = target.pack_order().pack_truncated(source.unpack(packed));
            }
            let pixel_right = (pixel_left + pixel_width).min(clip_width);
            let pixel_bottom = (pixel_top + pixel_height).min(clip_height);
            for y in pixel_top..pixel_bottom {
                let row = target.row_pointer(y);
                for x in pixel_left..pixel_right {
                    row.set(x as usize, packed);
                }
            }
            source_x = (source_x + 1).min(max_source_x);
            pixel_left += pixel_width;
        }
        source_y = (source_y + 1).min(max_source_y);
        pixel_top += pixel_height;
    }
}

/// Magnify `source` into `target` with integer blocks of
/// `pixel_width` x `pixel_height`.
pub fn block_magnify(target: &ImageRgba, source: &ImageRgba, pixel_width: i32, pixel_height: i32) {
    let pixel_width = pixel_width.max(1);
    let pixel_height = pixel_height.max(1);
    let same_order = target.pack_order_index() == source.pack_order_index();
    // The part of the source that fits into the target with whole blocks.
    let clip_width = (target.width().min(source.width() * pixel_width) / pixel_width) * pixel_width;
    let clip_height = (target.height().min(source.height() * pixel_height) / pixel_height) * pixel_height;
    if clip_width > 0 && clip_height > 0 {
        let plain_buffers = !source.is_sub_image() && !target.is_sub_image();
        if same_order && plain_buffers && pixel_width == pixel_height && (2..=8).contains(&pixel_width) {
            match pixel_width {
                2 => block_magnify_kernel::<2>(target, source, clip_width, clip_height),
                3 => block_magnify_kernel::<3>(target, source, clip_width, clip_height),
                4 => block_magnify_kernel::<4>(target, source, clip_width, clip_height),
                5 => block_magnify_kernel::<5>(target, source, clip_width, clip_height),
                6 => block_magnify_kernel::<6>(target, source, clip_width, clip_height),
                7 => block_magnify_kernel::<7>(target, source, clip_width, clip_height),
                _ => block_magnify_kernel::<8>(target, source, clip_width, clip_height),
            }
        } else {
            block_magnify_reference(target, source, pixel_width, pixel_height, clip_width, clip_height, !same_order);
        }
    }
    // Letterbox the unused right and bottom edges with transparent black.
    draw_rectangle_packed(
        target,
        IRect::new(clip_width, 0, target.width() - clip_width, clip_height),
        0,
    );
    draw_rectangle_packed(
        target,
        IRect::new(0, clip_height, target.width(), target.height() - clip_height),
        0,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::color::{Color, PackOrderIndex};
    use crate::image::max_difference_rgba;

    fn numbered(width: i32, height: i32) -> ImageRgba {
        let image = ImageRgba::create(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                image.write_color(x, y, Color::new(x * 16 + 8, y * 16 + 8, 0, 255));
            }
        }
        image
    }

    #[test]
    fn every_block_pixel_matches_its_source_pixel() {
        for scale in 1..=9 {
            let source = numbered(5, 4);
            let target = ImageRgba::create(5 * scale, 4 * scale).unwrap();
            block_magnify(&target, &source, scale, scale);
            for y in 0..4 * scale {
                for x in 0..5 * scale {
                    assert_eq!(
                        target.read_color_clamp(x, y),
                        source.read_color_clamp(x / scale, y / scale),
                        "scale {scale} pixel {x},{y}"
                    );
                }
            }
        }
    }

    #[test]
    fn kernel_and_reference_agree() {
        let source = numbered(6, 6);
        let fast = ImageRgba::create(18, 18).unwrap();
        block_magnify(&fast, &source, 3, 3);
        // Forcing the general kernel through a sub-image view.
        let parent = ImageRgba::create(19, 18).unwrap();
        let slow = parent.sub_image(IRect::new(0, 0, 18, 18)).unwrap();
        block_magnify(&slow, &source, 3, 3);
        assert_eq!(max_difference_rgba(&fast, &slow.duplicate()), 0);
    }

    #[test]
    fn uneven_edges_become_transparent_black() {
        let source = numbered(3, 3);
        let target = ImageRgba::create(8, 7).unwrap();
        crate::draw::draw_rectangle(&target, target.bound(), Color::new(9, 9, 9, 255));
        block_magnify(&target, &source, 2, 2);
        // 3x3 at 2x2 covers 6x6; the right 2 columns and bottom row clear.
        assert_eq!(target.read_color_clamp(5, 5), source.read_color_clamp(2, 2));
        assert_eq!(target.read_color_clamp(6, 0), Color::new(0, 0, 0, 0));
        assert_eq!(target.read_color_clamp(7, 6), Color::new(0, 0, 0, 0));
        assert_eq!(target.read_color_clamp(0, 6), Color::new(0, 0, 0, 0));
    }

    #[test]
    fn pack_order_conversion_goes_through_the_general_kernel() {
        let source = numbered(4, 4);
        let bgra = ImageRgba::create_with_order(8, 8, PackOrderIndex::Bgra).unwrap();
        block_magnify(&bgra, &source, 2, 2);
        assert_eq!(bgra.read_color_clamp(3, 3), source.read_color_clamp(1, 1));
    }
}
