//! Row walkers and the clipping helper shared by the image-to-image
//! primitives.

use crate::base::safe_ptr::SafePointer;
use crate::image::pixel::Raster;

/// Writable view over the drawn part of a target image.
pub(crate) struct ImageWriter<P> {
    pub pointer: SafePointer<P>,
    pub width: i32,
    pub height: i32,
    pub stride: i32,
}

/// Readable view over the used part of a source image.
pub(crate) struct ImageReader<P> {
    pub pointer: SafePointer<P>,
    pub width: i32,
    pub height: i32,
    pub stride: i32,
}

/// Compute the overlap of `source` placed at `(left, top)` inside `target`.
/// Returns views that address only the drawn pixels, or `None` when nothing
/// overlaps, making the calling primitive a no-op.
pub(crate) fn intersection<T: Raster, S: Raster>(
    target: &T,
    source: &S,
    left: i32,
    top: i32,
) -> Option<(ImageWriter<T::Pixel>, ImageReader<S::Pixel>)> {
    let target_right = left + source.width();
    let target_bottom = top + source.height();
    if left >= target.width() || top >= target.height() || target_right <= 0 || target_bottom <= 0 {
        return None;
    }
    let clip_left = (-left).max(0);
    let clip_top = (-top).max(0);
    let clip_right = (target_right - target.width()).max(0);
    let clip_bottom = (target_bottom - target.height()).max(0);
    let width = source.width() - clip_left - clip_right;
    let height = source.height() - clip_top - clip_bottom;
    debug_assert!(width > 0 && height > 0);
    let mut writer_pointer = target.row_pointer(top + clip_top);
    writer_pointer.offset_elements((left + clip_left) as usize);
    let mut reader_pointer = source.row_pointer(clip_top);
    reader_pointer.offset_elements(clip_left as usize);
    Some((
        ImageWriter { pointer: writer_pointer, width, height, stride: target.stride() },
        ImageReader { pointer: reader_pointer, width, height, stride: source.stride() },
    ))
}

/// Run `op(target_row, source_row)` over every overlapping row.
pub(crate) fn iterate_rows<TP: Copy, SP: Copy>(
    writer: &ImageWriter<TP>,
    reader: &ImageReader<SP>,
    mut op: impl FnMut(SafePointer<TP>, SafePointer<SP>),
) {
    let mut target_row = writer.pointer;
    let mut source_row = reader.pointer;
    for _ in 0..reader.height {
        op(target_row, source_row);
        target_row.increase_bytes(writer.stride as usize);
        source_row.increase_bytes(reader.stride as usize);
    }
}

/// Run `op(target_index -> pixel)` over every overlapping pixel, handing the
/// per-row pointers and the column index to the closure.
pub(crate) fn iterate_pixels<TP: Copy, SP: Copy>(
    writer: &ImageWriter<TP>,
    reader: &ImageReader<SP>,
    mut op: impl FnMut(SafePointer<TP>, SafePointer<SP>, usize),
) {
    iterate_rows(writer, reader, |target_row, source_row| {
        for x in 0..reader.width as usize {
            op(target_row, source_row, x);
        }
    });
}
