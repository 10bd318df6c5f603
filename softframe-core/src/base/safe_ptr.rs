//! Bounds-checked raw pointers over buffer regions.
//!
//! A `SafePointer<T>` carries its claimed byte extent in debug builds and
//! asserts every element access against it; in release builds it compiles
//! down to plain pointer arithmetic. Element stepping (`offset_elements`)
//! and byte stepping (`increase_bytes`) are separate operations so that row
//! strides are never accidentally multiplied by the element size.

use crate::base::buffer::Buffer;
use std::marker::PhantomData;

pub struct SafePointer<T> {
    ptr: *mut u8,
    #[cfg(debug_assertions)]
    region_start: usize,
    #[cfg(debug_assertions)]
    region_end: usize,
    _marker: PhantomData<*mut T>,
}

impl<T> Clone for SafePointer<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for SafePointer<T> {}

impl<T: Copy> SafePointer<T> {
    /// Claim `byte_extent` bytes of `buffer` starting at `byte_offset`.
    pub fn claim(buffer: &Buffer, byte_offset: usize, byte_extent: usize) -> SafePointer<T> {
        debug_assert!(
            byte_offset + byte_extent <= buffer.size(),
            "claimed region {}..{} outside of buffer of {} bytes",
            byte_offset,
            byte_offset + byte_extent,
            buffer.size()
        );
        let ptr = unsafe { buffer.base_ptr().add(byte_offset) };
        SafePointer {
            ptr,
            #[cfg(debug_assertions)]
            region_start: ptr as usize,
            #[cfg(debug_assertions)]
            region_end: ptr as usize + byte_extent,
            _marker: PhantomData,
        }
    }

    /// Wrap a borrowed slice, claiming exactly its extent.
    pub fn from_slice(slice: &mut [T]) -> SafePointer<T> {
        let ptr = slice.as_mut_ptr() as *mut u8;
        SafePointer {
            ptr,
            #[cfg(debug_assertions)]
            region_start: ptr as usize,
            #[cfg(debug_assertions)]
            region_end: ptr as usize + std::mem::size_of_val(slice),
            _marker: PhantomData,
        }
    }

    #[cfg(debug_assertions)]
    #[inline]
    fn assert_inside(&self, address: usize, bytes: usize) {
        assert!(
            address >= self.region_start && address + bytes <= self.region_end,
            "pointer access {}..{} outside of claimed region {}..{}",
            address,
            address + bytes,
            self.region_start,
            self.region_end
        );
    }

    #[inline]
    pub fn get(&self, element_index: usize) -> T {
        let address = self.ptr as usize + element_index * std::mem::size_of::<T>();
        #[cfg(debug_assertions)]
        self.assert_inside(address, std::mem::size_of::<T>());
        unsafe { (address as *const T).read_unaligned() }
    }

    #[inline]
    pub fn set(&self, element_index: usize, value: T) {
        let address = self.ptr as usize + element_index * std::mem::size_of::<T>();
        #[cfg(debug_assertions)]
        self.assert_inside(address, std::mem::size_of::<T>());
        unsafe { (address as *mut T).write_unaligned(value) }
    }

    #[inline]
    pub fn read(&self) -> T {
        self.get(0)
    }

    #[inline]
    pub fn write(&self, value: T) {
        self.set(0, value)
    }

    /// Step forward by whole elements.
    #[inline]
    pub fn offset_elements(&mut self, elements: usize) {
        self.ptr = unsafe { self.ptr.add(elements * std::mem::size_of::<T>()) };
    }

    /// Step forward by raw bytes, for advancing a row stride.
    #[inline]
    pub fn increase_bytes(&mut self, bytes: usize) {
        self.ptr = unsafe { self.ptr.add(bytes) };
    }

    /// A copy advanced by whole elements.
    #[inline]
    pub fn at(&self, elements: usize) -> SafePointer<T> {
        let mut result = *self;
        result.offset_elements(elements);
        result
    }

    /// Copy `count` elements from `source` to this pointer.
    pub fn copy_elements_from(&self, source: &SafePointer<T>, count: usize) {
        let bytes = count * std::mem::size_of::<T>();
        let src = source.ptr as usize;
        let dst = self.ptr as usize;
        #[cfg(debug_assertions)]
        {
            source.assert_inside(src, bytes);
            self.assert_inside(dst, bytes);
        }
        unsafe {
            std::ptr::copy(src as *const u8, dst as *mut u8, bytes);
        }
    }

    /// Fill `byte_count` bytes with `value`.
    pub fn set_bytes(&self, value: u8, byte_count: usize) {
        #[cfg(debug_assertions)]
        self.assert_inside(self.ptr as usize, byte_count);
        unsafe {
            std::ptr::write_bytes(self.ptr, value, byte_count);
        }
    }

    /// Raw address, for alignment checks in the SIMD wrappers.
    #[inline]
    pub fn address(&self) -> usize {
        self.ptr as usize
    }
}
