//! Mip-map pyramids stored as one contiguous allocation.
//!
//! Level 0 is the source image, level N has dimensions
//! `max(1, w >> N) x max(1, h >> N)`. Levels are stored back to back without
//! row padding, and each level is reachable as a non-owning [`ImageRgba`]
//! view of the pyramid buffer.

use crate::base::buffer::Buffer;
use crate::image::color::PackOrderIndex;
use crate::image::pixel::Raster;
use crate::image::{ImageError, ImageRgba};

#[derive(Clone)]
pub struct TexturePyramid {
    buffer: Buffer,
    width: i32,
    height: i32,
    level_count: i32,
}

fn level_size(base: i32, level: i32) -> i32 {
    (base >> level).max(1)
}

impl TexturePyramid {
    /// Build a pyramid with `level_count` levels from `source`. Level 0 is a
    /// straight copy; each further level is the integer mean of the 2x2
    /// blocks one level up.
    pub fn from_image(source: &ImageRgba, level_count: i32) -> Result<TexturePyramid, ImageError> {
        if level_count < 1 {
            return Err(ImageError::BadMipLevel { level: level_count, count: 1 });
        }
        let width = source.width();
        let height = source.height();
        let mut total_bytes = 0usize;
        for level in 0..level_count {
            total_bytes += level_size(width, level) as usize * level_size(height, level) as usize * 4;
        }
        let buffer = Buffer::allocate(total_bytes, true).ok_or(ImageError::AllocationFailed { bytes: total_bytes })?;
        let pyramid = TexturePyramid { buffer, width, height, level_count };
        // Copy the source into level 0, converting into canonical order.
        let level0 = pyramid.level_image(0)?;
        for y in 0..height {
            for x in 0..width {
                level0.write_color(x, y, source.read_color_clamp(x, y));
            }
        }
        pyramid.generate_levels();
        Ok(pyramid)
    }

    pub fn level_count(&self) -> i32 {
        self.level_count
    }

    pub fn width(&self, level: i32) -> i32 {
        level_size(self.width, level)
    }

    pub fn height(&self, level: i32) -> i32 {
        level_size(self.height, level)
    }

    fn level_byte_offset(&self, level: i32) -> usize {
        let mut offset = 0usize;
        for l in 0..level {
            offset += self.width(l) as usize * self.height(l) as usize * 4;
        }
        offset
    }

    /// Non-owning image view of one mip level.
    pub fn level_image(&self, level: i32) -> Result<ImageRgba, ImageError> {
        if level < 0 || level >= self.level_count {
            log::warn!("mip level {level} outside of 0..{}", self.level_count);
            return Err(ImageError::BadMipLevel { level, count: self.level_count });
        }
        let width = self.width(level);
        let height = self.height(level);
        let byte_offset = self.level_byte_offset(level);
        // A level only counts as owning the buffer when it starts the
        // allocation, spans all of it, and keeps every row on the SIMD
        // alignment the non-sub fast paths assume.
        let spans_whole_buffer =
            byte_offset == 0 && width as usize * height as usize * 4 == self.buffer.size();
        let aligned_rows = (width as usize * 4) % crate::base::buffer::BUFFER_ALIGNMENT == 0;
        Ok(ImageRgba::from_raw_parts(
            self.buffer.clone(),
            byte_offset,
            width,
            height,
            width * 4,
            !(spans_whole_buffer && aligned_rows),
            PackOrderIndex::Rgba,
        ))
    }

    /// Regenerate every level above 0 from the level below it.
    pub fn generate_levels(&self) {
        for target_level in 1..self.level_count {
            let source = self.level_image(target_level - 1).expect("valid source level");
            let target = self.level_image(target_level).expect("valid target level");
            for y in 0..target.height() {
                for x in 0..target.width() {
                    let upper_left = source.read_color_clamp(x * 2, y * 2);
                    let upper_right = source.read_color_clamp(x * 2 + 1, y * 2);
                    let lower_left = source.read_color_clamp(x * 2, y * 2 + 1);
                    let lower_right = source.read_color_clamp(x * 2 + 1, y * 2 + 1);
                    target.write_color(
                        x,
                        y,
                        crate::image::color::Color::new(
                            (upper_left.red + upper_right.red + lower_left.red + lower_right.red) / 4,
                            (upper_left.green + upper_right.green + lower_left.green + lower_right.green) / 4,
                            (upper_left.blue + upper_right.blue + lower_left.blue + lower_right.blue) / 4,
                            (upper_left.alpha + upper_right.alpha + lower_left.alpha + lower_right.alpha) / 4,
                        ),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::color::Color;

    #[test]
    fn level_dimensions_halve_down_to_one() {
        let source = ImageRgba::create(20, 6).unwrap();
        let pyramid = TexturePyramid::from_image(&source, 5).unwrap();
        assert_eq!((pyramid.width(0), pyramid.height(0)), (20, 6));
        assert_eq!((pyramid.width(1), pyramid.height(1)), (10, 3));
        assert_eq!((pyramid.width(2), pyramid.height(2)), (5, 1));
        assert_eq!((pyramid.width(4), pyramid.height(4)), (1, 1));
        assert!(pyramid.level_image(5).is_err());
    }

    #[test]
    fn each_level_pixel_is_the_mean_of_its_block() {
        let source = ImageRgba::create(4, 4).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let value = (y * 4 + x) * 16;
                source.write_color(x, y, Color::new(value, 255 - value, 128, 255));
            }
        }
        let pyramid = TexturePyramid::from_image(&source, 3).unwrap();
        let level0 = pyramid.level_image(0).unwrap();
        let level1 = pyramid.level_image(1).unwrap();
        for y in 0..2 {
            for x in 0..2 {
                let a = level0.read_color_clamp(x * 2, y * 2);
                let b = level0.read_color_clamp(x * 2 + 1, y * 2);
                let c = level0.read_color_clamp(x * 2, y * 2 + 1);
                let d = level0.read_color_clamp(x * 2 + 1, y * 2 + 1);
                let mixed = level1.read_color_clamp(x, y);
                assert_eq!(mixed.red, (a.red + b.red + c.red + d.red) / 4);
                assert_eq!(mixed.green, (a.green + b.green + c.green + d.green) / 4);
            }
        }
        let top = pyramid.level_image(2).unwrap();
        assert_eq!((top.width(), top.height()), (1, 1));
    }

    #[test]
    fn levels_share_the_pyramid_allocation() {
        let source = ImageRgba::create(8, 8).unwrap();
        let pyramid = TexturePyramid::from_image(&source, 2).unwrap();
        let a = pyramid.level_image(0).unwrap();
        let b = pyramid.level_image(1).unwrap();
        assert!(a.shares_buffer(&b));
        // Level 0 shares the allocation with level 1, so it is a sub view.
        assert!(a.is_sub_image());
    }

    #[test]
    fn a_single_level_spanning_the_buffer_owns_it() {
        let source = ImageRgba::create(8, 8).unwrap();
        let pyramid = TexturePyramid::from_image(&source, 1).unwrap();
        let level = pyramid.level_image(0).unwrap();
        assert!(!level.is_sub_image());
        // Rows off the SIMD alignment stay sub views even when the level
        // spans the whole allocation.
        let narrow = ImageRgba::create(5, 4).unwrap();
        let pyramid = TexturePyramid::from_image(&narrow, 1).unwrap();
        assert!(pyramid.level_image(0).unwrap().is_sub_image());
    }
}
