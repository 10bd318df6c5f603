//! The image data model: four monomorphic pixel formats sharing one buffer
//! and view representation.
//!
//! An image is a cheap-to-clone handle over a reference-counted byte buffer.
//! Sub-images reference a rectangle of their parent's buffer without
//! copying and keep the allocation alive. Deep copies go through
//! [`ImageRgba::duplicate`] and friends, which always produce a freshly
//! allocated non-sub image in canonical RGBA order.

pub mod ascii;
pub mod color;
pub mod pixel;
pub mod pyramid;

use crate::base::buffer::{BUFFER_ALIGNMENT, Buffer};
use crate::base::geometry::IRect;
use color::{Color, PackOrder, PackOrderIndex};
use pixel::Raster;
use thiserror::Error;

/// Largest accepted width or height in pixels.
pub const MAX_IMAGE_DIMENSION: i32 = 65_536;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image dimensions {width}x{height} outside of 1..={MAX_IMAGE_DIMENSION}")]
    BadDimensions { width: i32, height: i32 },
    #[error("sub-image region {left},{top} {width}x{height} has no area inside its parent")]
    EmptyRegion { left: i32, top: i32, width: i32, height: i32 },
    #[error("allocation of {bytes} bytes failed")]
    AllocationFailed { bytes: usize },
    #[error("mip level {level} outside of 0..{count}")]
    BadMipLevel { level: i32, count: i32 },
}

/// The shared part of every image handle.
#[derive(Clone, Debug)]
pub struct ImageData {
    pub(crate) buffer: Buffer,
    pub(crate) byte_start: usize,
    pub(crate) width: i32,
    pub(crate) height: i32,
    /// Bytes from one row start to the next, always >= width * pixel size.
    pub(crate) stride: i32,
    /// True iff the view is narrower than the allocation or does not own the
    /// entire buffer.
    pub(crate) sub_image: bool,
}

impl ImageData {
    /// Byte extent the view may touch. Whole-buffer owners claim their
    /// padding too so full-width fills can run over it.
    pub(crate) fn view_extent(&self, pixel_size: usize) -> usize {
        if self.sub_image {
            (self.height as usize - 1) * self.stride as usize + self.width as usize * pixel_size
        } else {
            self.buffer.size() - self.byte_start
        }
    }

    fn create(width: i32, height: i32, pixel_size: usize, zeroed: bool) -> Result<ImageData, ImageError> {
        if width < 1 || width > MAX_IMAGE_DIMENSION || height < 1 || height > MAX_IMAGE_DIMENSION {
            log::warn!("refusing to create a {width}x{height} image");
            return Err(ImageError::BadDimensions { width, height });
        }
        let row_bytes = width as usize * pixel_size;
        let stride = row_bytes.next_multiple_of(BUFFER_ALIGNMENT);
        let bytes = stride * height as usize;
        let buffer = Buffer::allocate(bytes, zeroed).ok_or(ImageError::AllocationFailed { bytes })?;
        Ok(ImageData {
            buffer,
            byte_start: 0,
            width,
            height,
            stride: stride as i32,
            sub_image: false,
        })
    }

    fn sub_region(&self, region: IRect, pixel_size: usize) -> Result<ImageData, ImageError> {
        let clipped = IRect::cut(region, IRect::new(0, 0, self.width, self.height));
        if !clipped.has_area() {
            return Err(ImageError::EmptyRegion {
                left: region.left(),
                top: region.top(),
                width: region.width(),
                height: region.height(),
            });
        }
        Ok(ImageData {
            buffer: self.buffer.clone(),
            byte_start: self.byte_start
                + clipped.top() as usize * self.stride as usize
                + clipped.left() as usize * pixel_size,
            width: clipped.width(),
            height: clipped.height(),
            stride: self.stride,
            sub_image: true,
        })
    }
}

macro_rules! monochrome_image {
    ($name:ident, $pixel:ty, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Debug)]
        pub struct $name {
            data: ImageData,
        }

        impl Raster for $name {
            type Pixel = $pixel;
            fn image_data(&self) -> &ImageData {
                &self.data
            }
        }

        impl $name {
            /// Create a zero-filled image. Dimensions outside the supported
            /// range return an error instead of an image.
            pub fn create(width: i32, height: i32) -> Result<Self, ImageError> {
                Ok(Self { data: ImageData::create(width, height, std::mem::size_of::<$pixel>(), true)? })
            }

            /// View a rectangle of this image without copying. The view is
            /// clipped against the image bound; an empty result is an error.
            pub fn sub_image(&self, region: IRect) -> Result<Self, ImageError> {
                Ok(Self { data: self.data.sub_region(region, std::mem::size_of::<$pixel>())? })
            }

            /// Deep copy into a fresh, non-sub allocation.
            pub fn duplicate(&self) -> Self {
                let result = Self::create(self.width(), self.height()).expect("clone of a valid image");
                for y in 0..self.height() {
                    result
                        .row_pointer(y)
                        .copy_elements_from(&self.row_pointer(y), self.width() as usize);
                }
                result
            }

            /// True when both handles view the same buffer.
            pub fn shares_buffer(&self, other: &Self) -> bool {
                Buffer::same_allocation(&self.data.buffer, &other.data.buffer)
            }
        }
    };
}

monochrome_image!(ImageU8, u8, "8-bit luma image.");
monochrome_image!(ImageU16, u16, "16-bit luma or height image.");
monochrome_image!(ImageF32, f32, "32-bit float luma or height image.");

/// Four-channel 8-bit image with a configurable channel byte order.
#[derive(Clone, Debug)]
pub struct ImageRgba {
    data: ImageData,
    pack_order_index: PackOrderIndex,
}

impl Raster for ImageRgba {
    type Pixel = u32;
    fn image_data(&self) -> &ImageData {
        &self.data
    }
}

impl ImageRgba {
    /// Create a zero-filled image in canonical RGBA order.
    pub fn create(width: i32, height: i32) -> Result<Self, ImageError> {
        Self::create_with_order(width, height, PackOrderIndex::Rgba)
    }

    /// Create a zero-filled image in the pack order of a host surface.
    pub fn create_with_order(width: i32, height: i32, order: PackOrderIndex) -> Result<Self, ImageError> {
        Ok(Self {
            data: ImageData::create(width, height, 4, true)?,
            pack_order_index: order,
        })
    }

    /// Wrap an existing buffer region, for host surfaces and pyramid levels.
    pub(crate) fn from_raw_parts(
        buffer: Buffer,
        byte_start: usize,
        width: i32,
        height: i32,
        stride: i32,
        sub_image: bool,
        order: PackOrderIndex,
    ) -> Self {
        Self {
            data: ImageData { buffer, byte_start, width, height, stride, sub_image },
            pack_order_index: order,
        }
    }

    pub fn pack_order_index(&self) -> PackOrderIndex {
        self.pack_order_index
    }

    pub fn pack_order(&self) -> PackOrder {
        PackOrder::get(self.pack_order_index)
    }

    /// Saturate the channels and pack them in this image's byte order.
    #[inline]
    pub fn saturate_and_pack(&self, color: Color) -> u32 {
        self.pack_order().pack_saturated(color)
    }

    #[inline]
    pub fn unpack(&self, packed: u32) -> Color {
        self.pack_order().unpack(packed)
    }

    pub fn sub_image(&self, region: IRect) -> Result<Self, ImageError> {
        Ok(Self {
            data: self.data.sub_region(region, 4)?,
            pack_order_index: self.pack_order_index,
        })
    }

    /// Deep copy into a fresh allocation, converting into canonical RGBA
    /// order and dropping any sub-image padding inheritance.
    pub fn duplicate(&self) -> Self {
        let result = Self::create(self.width(), self.height()).expect("clone of a valid image");
        if self.pack_order_index == PackOrderIndex::Rgba {
            for y in 0..self.height() {
                result
                    .row_pointer(y)
                    .copy_elements_from(&self.row_pointer(y), self.width() as usize);
            }
        } else {
            for y in 0..self.height() {
                let source_row = self.row_pointer(y);
                let target_row = result.row_pointer(y);
                for x in 0..self.width() as usize {
                    let color = self.unpack(source_row.get(x));
                    target_row.set(x, result.saturate_and_pack(color));
                }
            }
        }
        result
    }

    /// Read a pixel as an unpacked color, clamped addressing.
    #[inline]
    pub fn read_color_clamp(&self, x: i32, y: i32) -> Color {
        self.unpack(self.read_clamp(x, y))
    }

    /// Read a pixel as an unpacked color, border addressing.
    #[inline]
    pub fn read_color_border(&self, x: i32, y: i32, default: Color) -> Color {
        if x < 0 || y < 0 || x >= self.width() || y >= self.height() {
            default
        } else {
            self.unpack(self.read_pixel_unsafe(x, y))
        }
    }

    /// Write an unpacked color with channel saturation, silently dropping
    /// out-of-bounds coordinates.
    #[inline]
    pub fn write_color(&self, x: i32, y: i32, color: Color) {
        self.write_pixel(x, y, self.saturate_and_pack(color));
    }

    pub fn shares_buffer(&self, other: &Self) -> bool {
        Buffer::same_allocation(&self.data.buffer, &other.data.buffer)
    }
}

/// Largest per-channel difference between two same-size images, or the
/// channel maximum when the sizes differ.
pub fn max_difference_u8(a: &ImageU8, b: &ImageU8) -> u8 {
    if a.width() != b.width() || a.height() != b.height() {
        return u8::MAX;
    }
    let mut max = 0u8;
    for y in 0..a.height() {
        let row_a = a.row_pointer(y);
        let row_b = b.row_pointer(y);
        for x in 0..a.width() as usize {
            max = max.max(row_a.get(x).abs_diff(row_b.get(x)));
        }
    }
    max
}

/// Largest per-channel difference between two RGBA images, compared in
/// unpacked color space so differing pack orders still compare equal pixels.
pub fn max_difference_rgba(a: &ImageRgba, b: &ImageRgba) -> i32 {
    if a.width() != b.width() || a.height() != b.height() {
        return 255;
    }
    let mut max = 0i32;
    for y in 0..a.height() {
        for x in 0..a.width() {
            let ca = a.read_color_clamp(x, y);
            let cb = b.read_color_clamp(x, y);
            max = max
                .max((ca.red - cb.red).abs())
                .max((ca.green - cb.green).abs())
                .max((ca.blue - cb.blue).abs())
                .max((ca.alpha - cb.alpha).abs());
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_pads_stride_to_alignment() {
        let image = ImageU8::create(15, 14).unwrap();
        assert_eq!(image.width(), 15);
        assert_eq!(image.stride(), 16);
        assert!(!image.is_sub_image());
    }

    #[test]
    fn oversized_creation_is_refused() {
        assert!(ImageU8::create(MAX_IMAGE_DIMENSION + 1, 4).is_err());
        assert!(ImageU8::create(4, 0).is_err());
        assert!(ImageRgba::create(-1, 4).is_err());
    }

    #[test]
    fn sub_image_views_parent_pixels() {
        let parent = ImageU8::create(8, 8).unwrap();
        parent.write_pixel(3, 2, 77);
        let child = parent.sub_image(IRect::new(2, 2, 4, 4)).unwrap();
        assert!(child.is_sub_image());
        assert_eq!(child.read_clamp(1, 0), 77);
        child.write_pixel(0, 0, 5);
        assert_eq!(parent.read_clamp(2, 2), 5);
        assert!(child.shares_buffer(&parent));
    }

    #[test]
    fn sub_image_is_clipped_against_parent() {
        let parent = ImageU8::create(8, 8).unwrap();
        let child = parent.sub_image(IRect::new(6, 6, 10, 10)).unwrap();
        assert_eq!(child.width(), 2);
        assert_eq!(child.height(), 2);
        assert!(parent.sub_image(IRect::new(9, 9, 2, 2)).is_err());
    }

    #[test]
    fn addressing_modes_obey_their_laws() {
        let image = ImageU8::create(4, 3).unwrap();
        image.write_pixel(0, 0, 10);
        image.write_pixel(3, 2, 20);
        assert_eq!(image.read_border(-1, 0, 99), 99);
        assert_eq!(image.read_border(0, 0, 99), 10);
        assert_eq!(image.read_clamp(-5, -5), 10);
        assert_eq!(image.read_clamp(100, 100), 20);
        assert_eq!(image.read_tile(4, 3), 10);
        assert_eq!(image.read_tile(-1, -1), 20);
        // Out-of-bounds writes are dropped without touching anything.
        image.write_pixel(-1, 0, 255);
        image.write_pixel(4, 0, 255);
        assert_eq!(image.read_clamp(0, 0), 10);
        assert_eq!(image.read_clamp(3, 0), 0);
    }

    #[test]
    fn rgba_pack_order_is_honored_at_write_time() {
        let rgba = ImageRgba::create_with_order(2, 1, PackOrderIndex::Bgra).unwrap();
        rgba.write_color(0, 0, Color::new(1, 2, 3, 4));
        let packed = rgba.read_clamp(0, 0);
        // Byte 0 = blue under BGRA.
        assert_eq!(packed & 0xFF, 3);
        assert_eq!(rgba.unpack(packed), Color::new(1, 2, 3, 4));
    }

    #[test]
    fn duplicate_discards_pack_order_variants() {
        let bgra = ImageRgba::create_with_order(3, 3, PackOrderIndex::Bgra).unwrap();
        bgra.write_color(1, 1, Color::new(9, 8, 7, 6));
        let copy = bgra.duplicate();
        assert_eq!(copy.pack_order_index(), PackOrderIndex::Rgba);
        assert!(!copy.is_sub_image());
        assert_eq!(copy.read_color_clamp(1, 1), Color::new(9, 8, 7, 6));
        assert_eq!(max_difference_rgba(&bgra, &copy), 0);
    }
}
