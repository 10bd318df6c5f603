//! Drawing primitives: fills, lines, copies, compositing and height-max.
//!
//! Every primitive clips silently against the target bound; out-of-bounds
//! placement is a no-op, never an error. Nothing here synchronizes access:
//! callers serialize overlapping writes, while disjoint sub-images of a
//! shared buffer may be drawn to concurrently.

pub(crate) mod access;
mod blend;
mod copy;
mod higher;
mod shape;

pub use blend::{draw_alpha_clip, draw_alpha_filter, draw_max_alpha, draw_silhouette};
pub use copy::CopyFrom;
pub use higher::{
    draw_higher_f32, draw_higher_f32_with_layer, draw_higher_f32_with_two_layers, draw_higher_u16,
    draw_higher_u16_with_layer, draw_higher_u16_with_two_layers,
};
pub use shape::{
    draw_line, draw_line_f32, draw_line_packed, draw_line_u8, draw_line_u16, draw_rectangle,
    draw_rectangle_f32, draw_rectangle_packed, draw_rectangle_u8, draw_rectangle_u16,
};
