//! Sampling filters: resize, block magnify and lambda generation.

mod magnify;
mod map;
mod resize;

pub use magnify::block_magnify;
pub use map::{
    generate_f32, generate_rgba, generate_u8, generate_u16, map_f32, map_rgba, map_u8, map_u16,
};
pub use resize::{Sampler, resize_into_rgba, resize_rgba, resize_u8};
