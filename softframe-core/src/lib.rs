//! softframe: a software-rendered 2D graphics and media framework.
//!
//! Everything rasterizes on the CPU into in-memory images: drawing
//! primitives, sampling filters, a retained-mode GUI drawing into a
//! window-owned canvas, and a real-time audio mixer. No GPU is involved;
//! each primitive is defined by the pixels it produces.
//!
//! The platform sits behind two small traits: [`gui::window::WindowBackend`]
//! for surfaces and input, [`sound::output::OutputStream`] for audio
//! periods. Headless implementations of both ship in-tree, so the whole
//! framework runs in tests and server-side.

pub mod base;
pub mod codec;
pub mod draw;
pub mod filter;
pub mod font;
pub mod gui;
pub mod image;
pub mod sound;

pub use base::geometry::{IRect, IVector2};
pub use image::color::Color;
pub use image::{ImageF32, ImageRgba, ImageU8, ImageU16};
