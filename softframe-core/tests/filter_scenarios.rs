//! Filter and data-parallel scenarios.

use softframe_core::base::geometry::IRect;
use softframe_core::base::simd::U8x16;
use softframe_core::base::threading::threaded_work_by_index;
use softframe_core::filter::{Sampler, generate_u8, resize_u8};
use softframe_core::image::pixel::Raster;
use softframe_core::image::{ImageU8, max_difference_u8};

#[test]
fn saturated_addition_matches_between_reference_and_simd_paths() {
    // Two 15x14 images; their aligned strides leave one padding byte per
    // row that the vector loop may touch freely.
    let a = generate_u8(15, 14, |x, y| x * 18 + y * 3).unwrap();
    let b = generate_u8(15, 14, |x, y| 255 - x * 9 + y).unwrap();
    // Reference: per-pixel saturated addition through the lambda path.
    let reference = generate_u8(15, 14, |x, y| {
        (a.read_clamp(x, y) as i32 + b.read_clamp(x, y) as i32).min(255)
    })
    .unwrap();
    // SIMD: whole aligned rows, one vector per 16 bytes.
    let simd = ImageU8::create(15, 14).unwrap();
    for y in 0..14 {
        let mut row_a = a.row_pointer(y);
        let mut row_b = b.row_pointer(y);
        let mut row_out = simd.row_pointer(y);
        let mut x = 0;
        while x < 15 {
            let sum = U8x16::read_aligned(row_a).saturating_add(U8x16::read_aligned(row_b));
            sum.write_aligned(row_out);
            row_a.offset_elements(16);
            row_b.offset_elements(16);
            row_out.offset_elements(16);
            x += 16;
        }
    }
    assert_eq!(max_difference_u8(&reference, &simd), 0);
}

#[test]
fn nearest_resize_to_the_same_size_is_a_copy() {
    let image = generate_u8(9, 13, |x, y| x * 20 + y * 7).unwrap();
    let resized = resize_u8(&image, Sampler::Nearest, 9, 13).unwrap();
    assert_eq!(max_difference_u8(&image, &resized), 0);
}

#[test]
fn disjoint_sub_images_can_be_filled_from_worker_threads() {
    let image = ImageU8::create(64, 64).unwrap();
    let bands: Vec<ImageU8> = (0..8)
        .map(|band| image.sub_image(IRect::new(0, band * 8, 64, 8)).unwrap())
        .collect();
    threaded_work_by_index(
        |band| {
            softframe_core::draw::draw_rectangle_u8(&bands[band], bands[band].bound(), band as i32 * 30);
        },
        8,
        4,
    );
    for band in 0..8 {
        assert_eq!(image.read_clamp(32, band * 8 + 4), (band * 30) as u8, "band {band}");
    }
}
