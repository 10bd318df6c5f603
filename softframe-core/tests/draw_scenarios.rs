//! End-to-end drawing scenarios with expected images written as ASCII art.

use softframe_core::base::geometry::IRect;
use softframe_core::draw::{draw_line_u8, draw_rectangle_u8, draw_silhouette};
use softframe_core::image::ascii::{image_from_ascii, image_to_ascii_with_alphabet};
use softframe_core::image::color::Color;
use softframe_core::image::pixel::Raster;
use softframe_core::image::{ImageRgba, ImageU8, max_difference_u8};

fn white_u8(width: i32, height: i32) -> ImageU8 {
    let image = ImageU8::create(width, height).unwrap();
    draw_rectangle_u8(&image, image.bound(), 255);
    image
}

#[test]
fn gray_rectangle_inside_white_canvas() {
    let image = white_u8(16, 16);
    draw_rectangle_u8(&image, IRect::from_corners(1, 1, 7, 7), 127);
    let expected = image_from_ascii(
        "< -#>\n\
         <################>\n\
         <#------#########>\n\
         <#------#########>\n\
         <#------#########>\n\
         <#------#########>\n\
         <#------#########>\n\
         <#------#########>\n\
         <################>\n\
         <################>\n\
         <################>\n\
         <################>\n\
         <################>\n\
         <################>\n\
         <################>\n\
         <################>\n\
         <################>\n",
    )
    .unwrap();
    // ' ' = 0, '-' = 128, '#' = 255; the drawn gray is 127, one step off
    // the three-character alphabet's midpoint.
    assert!(max_difference_u8(&image, &expected) <= 1);
    // And exactly: a 6x6 block of 127 surrounded by 255.
    for y in 0..16 {
        for x in 0..16 {
            let expected_value = if (1..7).contains(&x) && (1..7).contains(&y) { 127 } else { 255 };
            assert_eq!(image.read_clamp(x, y), expected_value, "pixel {x},{y}");
        }
    }
}

#[test]
fn three_diagonal_lines_follow_the_bresenham_enumeration() {
    let image = white_u8(16, 16);
    draw_line_u8(&image, 1, 2, 12, 13, 0);
    draw_line_u8(&image, 2, 2, 13, 13, 255);
    draw_line_u8(&image, 3, 2, 14, 13, 0);
    // The 45-degree enumeration steps x with every y, so row y holds black
    // at x = y-1 and x = y+1 with the white middle line at x = y.
    for y in 2..=13 {
        for x in 0..16 {
            let expected = if x == y - 1 || x == y + 1 { 0 } else { 255 };
            assert_eq!(image.read_clamp(x, y), expected, "pixel {x},{y}");
        }
    }
    // Rows outside the lines stay untouched.
    for x in 0..16 {
        assert_eq!(image.read_clamp(x, 0), 255);
        assert_eq!(image.read_clamp(x, 1), 255);
        assert_eq!(image.read_clamp(x, 14), 255);
        assert_eq!(image.read_clamp(x, 15), 255);
    }
}

#[test]
fn silhouette_colorizes_a_ball_over_a_split_background() {
    // A 7x6 opaque ball with anti-aliased corners.
    let ball = image_from_ascii(
        "< -#>\n\
         <  -##-  >\n\
         < -####- >\n\
         <-######->\n\
         <-######->\n\
         < -####- >\n\
         <  -##-  >\n",
    )
    .unwrap();
    assert_eq!((ball.width(), ball.height()), (8, 6));
    // An 8x8 target: left half transparent black, right four columns white.
    let target = ImageRgba::create(8, 8).unwrap();
    softframe_core::draw::draw_rectangle(&target, IRect::new(4, 0, 4, 8), Color::opaque(255, 255, 255));
    draw_silhouette(&target, &ball, Color::new(255, 127, 0, 255), 1, 1);
    // Fully covered pixels take the orange color exactly.
    assert_eq!(target.read_color_clamp(4, 3), Color::new(255, 127, 0, 255));
    assert_eq!(target.read_color_clamp(3, 2), Color::new(255, 127, 0, 255));
    // The red channel is saturated both inside the ball and on the white
    // side, while blue separates them: low inside, white outside.
    assert_eq!(target.read_color_clamp(5, 3).red, 255);
    assert_eq!(target.read_color_clamp(7, 7).red, 255);
    assert!(target.read_color_clamp(5, 3).blue < 80);
    assert_eq!(target.read_color_clamp(7, 7).blue, 255);
    // Outside the ball on the left, nothing was touched.
    assert_eq!(target.read_color_clamp(0, 0), Color::new(0, 0, 0, 0));
    // The anti-aliased rim blends half-way between orange and white.
    let rim = target.read_color_clamp(6, 1);
    assert!(rim.blue > 80 && rim.blue < 230, "rim {rim:?}");
}

#[test]
fn ascii_expectations_round_trip_for_authoring() {
    // The inline-image workflow itself: encode, decode, compare.
    let image = white_u8(5, 3);
    draw_rectangle_u8(&image, IRect::new(1, 1, 2, 1), 0);
    let text = image_to_ascii_with_alphabet(&image, " #").unwrap();
    assert_eq!(text, "< #>\n<#####>\n<#  ##>\n<#####>\n");
    let back = image_from_ascii(&text).unwrap();
    assert_eq!(max_difference_u8(&image, &back), 0);
}

#[test]
fn boundary_cases_draw_nothing() {
    let image = white_u8(8, 8);
    let reference = image.duplicate();
    // Rectangles with inverted corners.
    draw_rectangle_u8(&image, IRect::from_corners(5, 5, 2, 7), 0);
    draw_rectangle_u8(&image, IRect::from_corners(3, 6, 7, 6), 0);
    // Lines with both endpoints beyond one edge.
    draw_line_u8(&image, -3, 1, -1, 6, 0);
    draw_line_u8(&image, 0, 8, 7, 12, 0);
    // Copies that never land in the target.
    use softframe_core::draw::CopyFrom;
    image.draw_copy(&reference, 8, 8);
    image.draw_copy(&reference, -8, 0);
    assert_eq!(max_difference_u8(&image, &reference), 0);
}
