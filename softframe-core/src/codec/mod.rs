//! Image file loading and saving.
//!
//! The pixel engine itself never touches files; this layer adapts RGBA
//! images to the codec crates. PNG goes through the `png` crate with
//! explicit stride handling, so padded images encode without an un-padding
//! pass; JPEG, TGA and BMP go through the `image` crate and get un-padded
//! (and repacked into canonical order) first.

use crate::image::color::PackOrderIndex;
use crate::image::pixel::Raster;
use crate::image::ImageRgba;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unrecognized image file extension {0:?}")]
    UnknownExtension(String),
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("png error: {0}")]
    Png(String),
    #[error("codec error: {0}")]
    Codec(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFileFormat {
    Jpg,
    Png,
    Tga,
    Bmp,
}

impl ImageFileFormat {
    /// Recognize a case-insensitive file extension.
    pub fn from_extension(extension: &str) -> Option<ImageFileFormat> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFileFormat::Jpg),
            "png" => Some(ImageFileFormat::Png),
            "tga" | "targa" => Some(ImageFileFormat::Tga),
            "bmp" => Some(ImageFileFormat::Bmp),
            _ => None,
        }
    }

    fn from_path(path: &Path) -> Result<ImageFileFormat, CodecError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        ImageFileFormat::from_extension(extension)
            .ok_or_else(|| CodecError::UnknownExtension(extension.into()))
    }
}

/// Copy the view into a tightly packed canonical-order byte vector.
fn tight_rgba_bytes(image: &ImageRgba) -> Vec<u8> {
    let canonical = if image.pack_order_index() == PackOrderIndex::Rgba {
        image.clone()
    } else {
        image.duplicate()
    };
    let mut bytes = Vec::with_capacity(canonical.width() as usize * canonical.height() as usize * 4);
    for y in 0..canonical.height() {
        let row = canonical.row_pointer(y);
        for x in 0..canonical.width() as usize {
            bytes.extend_from_slice(&row.get(x).to_le_bytes());
        }
    }
    bytes
}

/// Encode into the requested format. `quality` is a percentage from 1 to
/// 100 and only affects JPEG; the default is 100.
pub fn encode(image: &ImageRgba, format: ImageFileFormat, quality: i32) -> Result<Vec<u8>, CodecError> {
    let quality = quality.clamp(1, 100) as u8;
    match format {
        ImageFileFormat::Png => {
            // Streaming rows through the encoder keeps padded strides out of
            // the output without an un-padding pass.
            let canonical = if image.pack_order_index() == PackOrderIndex::Rgba {
                image.clone()
            } else {
                image.duplicate()
            };
            let mut output = Vec::new();
            {
                let mut encoder =
                    png::Encoder::new(&mut output, canonical.width() as u32, canonical.height() as u32);
                encoder.set_color(png::ColorType::Rgba);
                encoder.set_depth(png::BitDepth::Eight);
                let mut writer = encoder.write_header().map_err(|e| CodecError::Png(e.to_string()))?;
                let mut stream = writer
                    .stream_writer_with_size(canonical.width() as usize * 4)
                    .map_err(|e| CodecError::Png(e.to_string()))?;
                let mut row_bytes = vec![0u8; canonical.width() as usize * 4];
                for y in 0..canonical.height() {
                    let row = canonical.row_pointer(y);
                    for x in 0..canonical.width() as usize {
                        row_bytes[x * 4..x * 4 + 4].copy_from_slice(&row.get(x).to_le_bytes());
                    }
                    use std::io::Write;
                    stream.write_all(&row_bytes).map_err(|e| CodecError::Png(e.to_string()))?;
                }
                stream.finish().map_err(|e| CodecError::Png(e.to_string()))?;
            }
            Ok(output)
        }
        ImageFileFormat::Jpg | ImageFileFormat::Tga | ImageFileFormat::Bmp => {
            let bytes = tight_rgba_bytes(image);
            let buffer: image::RgbaImage =
                image::ImageBuffer::from_raw(image.width() as u32, image.height() as u32, bytes)
                    .expect("tight buffer matches dimensions");
            let mut output = Cursor::new(Vec::new());
            match format {
                ImageFileFormat::Jpg => {
                    let encoder =
                        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
                    image::DynamicImage::ImageRgba8(buffer)
                        .to_rgb8()
                        .write_with_encoder(encoder)
                        .map_err(|e| CodecError::Codec(e.to_string()))?;
                }
                ImageFileFormat::Tga => {
                    buffer
                        .write_with_encoder(image::codecs::tga::TgaEncoder::new(&mut output))
                        .map_err(|e| CodecError::Codec(e.to_string()))?;
                }
                ImageFileFormat::Bmp => {
                    buffer
                        .write_with_encoder(image::codecs::bmp::BmpEncoder::new(&mut output))
                        .map_err(|e| CodecError::Codec(e.to_string()))?;
                }
                ImageFileFormat::Png => unreachable!(),
            }
            Ok(output.into_inner())
        }
    }
}

/// Decode a supported image file into canonical RGBA.
pub fn decode(bytes: &[u8]) -> Result<ImageRgba, CodecError> {
    // PNG through its dedicated decoder, everything else through `image`.
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        let decoder = png::Decoder::new(Cursor::new(bytes));
        let mut reader = decoder.read_info().map_err(|e| CodecError::Png(e.to_string()))?;
        let mut data = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut data).map_err(|e| CodecError::Png(e.to_string()))?;
        let data = &data[..info.buffer_size()];
        let rgba: Vec<u8> = match info.color_type {
            png::ColorType::Rgba => data.to_vec(),
            png::ColorType::Rgb => data.chunks_exact(3).flat_map(|p| [p[0], p[1], p[2], 255]).collect(),
            png::ColorType::Grayscale => data.iter().flat_map(|&g| [g, g, g, 255]).collect(),
            png::ColorType::GrayscaleAlpha => {
                data.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0], p[1]]).collect()
            }
            png::ColorType::Indexed => {
                return Err(CodecError::Png("indexed color was not expanded".into()));
            }
        };
        return rgba_from_bytes(info.width as i32, info.height as i32, &rgba);
    }
    let decoded = image::load_from_memory(bytes).map_err(|e| CodecError::Codec(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    rgba_from_bytes(rgba.width() as i32, rgba.height() as i32, rgba.as_raw())
}

fn rgba_from_bytes(width: i32, height: i32, bytes: &[u8]) -> Result<ImageRgba, CodecError> {
    let result = ImageRgba::create(width, height)
        .map_err(|e| CodecError::Codec(e.to_string()))?;
    for y in 0..height {
        let row = result.row_pointer(y);
        for x in 0..width as usize {
            let offset = (y as usize * width as usize + x) * 4;
            row.set(x, u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap()));
        }
    }
    Ok(result)
}

/// Save an image, picking the format from the file extension.
pub fn save(image: &ImageRgba, path: &Path, quality: i32) -> Result<(), CodecError> {
    let format = ImageFileFormat::from_path(path)?;
    let bytes = encode(image, format, quality)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Load an image file. With `must_exist` a missing file is an error;
/// without it the error is logged and `None` returned.
pub fn load(path: &Path, must_exist: bool) -> Result<Option<ImageRgba>, CodecError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(decode(&bytes)?)),
        Err(error) if !must_exist => {
            log::warn!("could not load optional image {path:?}: {error}");
            Ok(None)
        }
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::color::Color;
    use crate::image::max_difference_rgba;

    fn pattern(width: i32, height: i32) -> ImageRgba {
        let image = ImageRgba::create(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                image.write_color(x, y, Color::new(x * 17 % 256, y * 31 % 256, (x + y) % 256, 255));
            }
        }
        image
    }

    #[test]
    fn extensions_are_case_insensitive() {
        assert_eq!(ImageFileFormat::from_extension("JPEG"), Some(ImageFileFormat::Jpg));
        assert_eq!(ImageFileFormat::from_extension("Png"), Some(ImageFileFormat::Png));
        assert_eq!(ImageFileFormat::from_extension("TARGA"), Some(ImageFileFormat::Tga));
        assert_eq!(ImageFileFormat::from_extension("gif"), None);
    }

    #[test]
    fn png_round_trip_is_lossless_including_padded_views() {
        let image = pattern(15, 9);
        let bytes = encode(&image, ImageFileFormat::Png, 100).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(max_difference_rgba(&image, &decoded), 0);
        // A sub-image view with inherited stride encodes the same pixels.
        let parent = pattern(20, 12);
        let view = parent.sub_image(crate::base::geometry::IRect::new(2, 2, 15, 9)).unwrap();
        let bytes = encode(&view, ImageFileFormat::Png, 100).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.width(), 15);
        assert_eq!(decoded.read_color_clamp(0, 0), parent.read_color_clamp(2, 2));
    }

    #[test]
    fn bmp_and_tga_round_trip() {
        let image = pattern(8, 8);
        for format in [ImageFileFormat::Bmp, ImageFileFormat::Tga] {
            let bytes = encode(&image, format, 100).unwrap();
            let decoded = decode(&bytes).unwrap();
            assert_eq!(max_difference_rgba(&image, &decoded), 0, "{format:?}");
        }
    }

    #[test]
    fn save_and_load_through_the_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.PNG");
        let image = pattern(6, 6);
        save(&image, &path, 100).unwrap();
        let loaded = load(&path, true).unwrap().unwrap();
        assert_eq!(max_difference_rgba(&image, &loaded), 0);
        // Optional loads of missing files are not an error.
        assert!(load(&dir.path().join("missing.png"), false).unwrap().is_none());
        assert!(load(&dir.path().join("missing.png"), true).is_err());
        assert!(matches!(
            save(&image, &dir.path().join("out.doc"), 100),
            Err(CodecError::UnknownExtension(_))
        ));
    }
}
