//! Shared low-level machinery: buffers, bounds-checked pointers, geometry,
//! SIMD wrappers, the virtual stack and the thread pool helpers.

pub mod buffer;
pub mod geometry;
pub mod safe_ptr;
pub mod simd;
pub mod threading;
pub mod virtual_stack;
