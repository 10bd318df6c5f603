//! Width-parametric SIMD wrappers with a scalar fallback.
//!
//! The x86_64 build maps these onto SSE2, which is part of the baseline
//! instruction set there. Every other target gets the scalar module behind
//! the same interface, so the fast paths in `filter` and `sound` compile and
//! produce identical results everywhere.
//!
//! Aligned loads and stores assert 16-byte alignment in debug builds.

/// Bytes per vector register.
pub const VECTOR_SIZE: usize = 16;
/// f32 lanes per vector.
pub const F32_LANES: usize = 4;

#[inline]
fn debug_assert_aligned(address: usize) {
    debug_assert!(address % VECTOR_SIZE == 0, "unaligned SIMD access at {address:#x}");
}

#[cfg(target_arch = "x86_64")]
mod platform {
    use super::debug_assert_aligned;
    use crate::base::safe_ptr::SafePointer;
    use core::arch::x86_64::*;

    #[derive(Clone, Copy)]
    pub struct U8x16(pub(super) __m128i);
    #[derive(Clone, Copy)]
    pub struct U16x8(pub(super) __m128i);
    #[derive(Clone, Copy)]
    pub struct U32x4(pub(super) __m128i);
    #[derive(Clone, Copy)]
    pub struct F32x4(pub(super) __m128);

    impl U8x16 {
        #[inline]
        pub fn splat(value: u8) -> Self {
            unsafe { Self(_mm_set1_epi8(value as i8)) }
        }
        #[inline]
        pub fn read_aligned(pointer: SafePointer<u8>) -> Self {
            debug_assert_aligned(pointer.address());
            unsafe { Self(_mm_load_si128(pointer.address() as *const __m128i)) }
        }
        #[inline]
        pub fn write_aligned(self, pointer: SafePointer<u8>) {
            debug_assert_aligned(pointer.address());
            unsafe { _mm_store_si128(pointer.address() as *mut __m128i, self.0) }
        }
        /// Lane-wise saturating addition.
        #[inline]
        pub fn saturating_add(self, other: Self) -> Self {
            unsafe { Self(_mm_adds_epu8(self.0, other.0)) }
        }
        #[inline]
        pub fn to_array(self) -> [u8; 16] {
            let mut out = [0u8; 16];
            unsafe { _mm_storeu_si128(out.as_mut_ptr() as *mut __m128i, self.0) };
            out
        }
        #[inline]
        pub fn from_array(values: [u8; 16]) -> Self {
            unsafe { Self(_mm_loadu_si128(values.as_ptr() as *const __m128i)) }
        }
    }

    impl U16x8 {
        #[inline]
        pub fn splat(value: u16) -> Self {
            unsafe { Self(_mm_set1_epi16(value as i16)) }
        }
        /// Lane-wise multiplication keeping the low 16 bits.
        #[inline]
        pub fn mul_low(self, other: Self) -> Self {
            unsafe { Self(_mm_mullo_epi16(self.0, other.0)) }
        }
        #[inline]
        pub fn add(self, other: Self) -> Self {
            unsafe { Self(_mm_add_epi16(self.0, other.0)) }
        }
        #[inline]
        pub fn shr<const BITS: i32>(self) -> Self {
            unsafe { Self(_mm_srli_epi16::<BITS>(self.0)) }
        }
        #[inline]
        pub fn bitcast_u32(self) -> U32x4 {
            U32x4(self.0)
        }
    }

    impl U32x4 {
        #[inline]
        pub fn splat(value: u32) -> Self {
            unsafe { Self(_mm_set1_epi32(value as i32)) }
        }
        #[inline]
        pub fn read_aligned(pointer: SafePointer<u32>) -> Self {
            debug_assert_aligned(pointer.address());
            unsafe { Self(_mm_load_si128(pointer.address() as *const __m128i)) }
        }
        #[inline]
        pub fn write_aligned(self, pointer: SafePointer<u32>) {
            debug_assert_aligned(pointer.address());
            unsafe { _mm_store_si128(pointer.address() as *mut __m128i, self.0) }
        }
        #[inline]
        pub fn and(self, other: Self) -> Self {
            unsafe { Self(_mm_and_si128(self.0, other.0)) }
        }
        #[inline]
        pub fn or(self, other: Self) -> Self {
            unsafe { Self(_mm_or_si128(self.0, other.0)) }
        }
        #[inline]
        pub fn shr<const BITS: i32>(self) -> Self {
            unsafe { Self(_mm_srli_epi32::<BITS>(self.0)) }
        }
        #[inline]
        pub fn bitcast_u16(self) -> U16x8 {
            U16x8(self.0)
        }
    }

    impl F32x4 {
        #[inline]
        pub fn splat(value: f32) -> Self {
            unsafe { Self(_mm_set1_ps(value)) }
        }
        #[inline]
        pub fn read_aligned(pointer: SafePointer<f32>) -> Self {
            debug_assert_aligned(pointer.address());
            unsafe { Self(_mm_load_ps(pointer.address() as *const f32)) }
        }
        #[inline]
        pub fn write_aligned(self, pointer: SafePointer<f32>) {
            debug_assert_aligned(pointer.address());
            unsafe { _mm_store_ps(pointer.address() as *mut f32, self.0) }
        }
        #[inline]
        pub fn add(self, other: Self) -> Self {
            unsafe { Self(_mm_add_ps(self.0, other.0)) }
        }
        #[inline]
        pub fn mul(self, other: Self) -> Self {
            unsafe { Self(_mm_mul_ps(self.0, other.0)) }
        }
    }
}

#[cfg(not(target_arch = "x86_64"))]
mod platform {
    use super::debug_assert_aligned;
    use crate::base::safe_ptr::SafePointer;

    #[derive(Clone, Copy)]
    pub struct U8x16(pub(super) [u8; 16]);
    #[derive(Clone, Copy)]
    pub struct U16x8(pub(super) [u16; 8]);
    #[derive(Clone, Copy)]
    pub struct U32x4(pub(super) [u32; 4]);
    #[derive(Clone, Copy)]
    pub struct F32x4(pub(super) [f32; 4]);

    impl U8x16 {
        pub fn splat(value: u8) -> Self {
            Self([value; 16])
        }
        pub fn read_aligned(pointer: SafePointer<u8>) -> Self {
            debug_assert_aligned(pointer.address());
            let mut out = [0u8; 16];
            for (i, lane) in out.iter_mut().enumerate() {
                *lane = pointer.get(i);
            }
            Self(out)
        }
        pub fn write_aligned(self, pointer: SafePointer<u8>) {
            debug_assert_aligned(pointer.address());
            for (i, lane) in self.0.iter().enumerate() {
                pointer.set(i, *lane);
            }
        }
        pub fn saturating_add(self, other: Self) -> Self {
            let mut out = [0u8; 16];
            for i in 0..16 {
                out[i] = self.0[i].saturating_add(other.0[i]);
            }
            Self(out)
        }
        pub fn to_array(self) -> [u8; 16] {
            self.0
        }
        pub fn from_array(values: [u8; 16]) -> Self {
            Self(values)
        }
    }

    impl U16x8 {
        pub fn splat(value: u16) -> Self {
            Self([value; 8])
        }
        pub fn mul_low(self, other: Self) -> Self {
            let mut out = [0u16; 8];
            for i in 0..8 {
                out[i] = self.0[i].wrapping_mul(other.0[i]);
            }
            Self(out)
        }
        pub fn add(self, other: Self) -> Self {
            let mut out = [0u16; 8];
            for i in 0..8 {
                out[i] = self.0[i].wrapping_add(other.0[i]);
            }
            Self(out)
        }
        pub fn shr<const BITS: i32>(self) -> Self {
            let mut out = [0u16; 8];
            for i in 0..8 {
                out[i] = self.0[i] >> BITS;
            }
            Self(out)
        }
        pub fn bitcast_u32(self) -> U32x4 {
            let mut out = [0u32; 4];
            for i in 0..4 {
                out[i] = u32::from(self.0[i * 2]) | (u32::from(self.0[i * 2 + 1]) << 16);
            }
            U32x4(out)
        }
    }

    impl U32x4 {
        pub fn splat(value: u32) -> Self {
            Self([value; 4])
        }
        pub fn read_aligned(pointer: SafePointer<u32>) -> Self {
            debug_assert_aligned(pointer.address());
            let mut out = [0u32; 4];
            for (i, lane) in out.iter_mut().enumerate() {
                *lane = pointer.get(i);
            }
            Self(out)
        }
        pub fn write_aligned(self, pointer: SafePointer<u32>) {
            debug_assert_aligned(pointer.address());
            for (i, lane) in self.0.iter().enumerate() {
                pointer.set(i, *lane);
            }
        }
        pub fn and(self, other: Self) -> Self {
            let mut out = [0u32; 4];
            for i in 0..4 {
                out[i] = self.0[i] & other.0[i];
            }
            Self(out)
        }
        pub fn or(self, other: Self) -> Self {
            let mut out = [0u32; 4];
            for i in 0..4 {
                out[i] = self.0[i] | other.0[i];
            }
            Self(out)
        }
        pub fn shr<const BITS: i32>(self) -> Self {
            let mut out = [0u32; 4];
            for i in 0..4 {
                out[i] = self.0[i] >> BITS;
            }
            Self(out)
        }
        pub fn bitcast_u16(self) -> U16x8 {
            let mut out = [0u16; 8];
            for i in 0..4 {
                out[i * 2] = (self.0[i] & 0xFFFF) as u16;
                out[i * 2 + 1] = (self.0[i] >> 16) as u16;
            }
            U16x8(out)
        }
    }

    impl F32x4 {
        pub fn splat(value: f32) -> Self {
            Self([value; 4])
        }
        pub fn read_aligned(pointer: SafePointer<f32>) -> Self {
            debug_assert_aligned(pointer.address());
            let mut out = [0f32; 4];
            for (i, lane) in out.iter_mut().enumerate() {
                *lane = pointer.get(i);
            }
            Self(out)
        }
        pub fn write_aligned(self, pointer: SafePointer<f32>) {
            debug_assert_aligned(pointer.address());
            for (i, lane) in self.0.iter().enumerate() {
                pointer.set(i, *lane);
            }
        }
        pub fn add(self, other: Self) -> Self {
            let mut out = [0f32; 4];
            for i in 0..4 {
                out[i] = self.0[i] + other.0[i];
            }
            Self(out)
        }
        pub fn mul(self, other: Self) -> Self {
            let mut out = [0f32; 4];
            for i in 0..4 {
                out[i] = self.0[i] * other.0[i];
            }
            Self(out)
        }
    }
}

pub use platform::{F32x4, U8x16, U16x8, U32x4};

/// Uniform linear mix of two packed RGBA vectors from a 16-bit sub-pixel
/// weight: `a * (1 - ratio/65536) + b * (ratio/65536)` per channel byte.
#[inline]
pub fn mix_packed_colors_uniform(color_a: U32x4, color_b: U32x4, fine_ratio: u32) -> U32x4 {
    let ratio = (fine_ratio >> 8) as u16;
    let inv_ratio = 256 - ratio;
    let weight_a = U16x8::splat(inv_ratio);
    let weight_b = U16x8::splat(ratio);
    let low_mask = U32x4::splat(0x00FF_00FF);
    let high_mask = U32x4::splat(0xFF00_FF00);
    let low_a = color_a.and(low_mask).bitcast_u16();
    let low_b = color_b.and(low_mask).bitcast_u16();
    let high_a = color_a.and(high_mask).bitcast_u16().shr::<8>();
    let high_b = color_b.and(high_mask).bitcast_u16().shr::<8>();
    let low = low_a.mul_low(weight_a).add(low_b.mul_low(weight_b)).bitcast_u32();
    let high = high_a.mul_low(weight_a).add(high_b.mul_low(weight_b)).bitcast_u32();
    low.shr::<8>().and(low_mask).or(high.and(high_mask))
}
