//! Shared byte allocations backing images and other pixel data.
//!
//! A [`Buffer`] is an immutable handle to mutable contents: cloning the
//! handle shares the same allocation, and disjoint regions may be written
//! from different threads at the same time. Nothing here synchronizes
//! overlapping writes; callers that draw into the same pixels from two
//! threads get whatever bytes win, exactly like any other framebuffer.

use std::alloc::{self, Layout};
use std::sync::Arc;

/// Allocation alignment for pixel rows, matching the widest SIMD vector.
pub const BUFFER_ALIGNMENT: usize = 16;

enum Storage {
    Owned { data: *mut u8, layout: Layout },
    /// Memory owned by a host surface. The release callback runs when the
    /// last handle drops.
    Foreign {
        data: *mut u8,
        size: usize,
        release: Option<Box<dyn FnOnce(*mut u8) + Send>>,
    },
}

struct BufferInner {
    storage: Storage,
    size: usize,
}

// The raw pointer never moves after construction and all element access goes
// through SafePointer bounds. Concurrent use is limited to disjoint regions
// by the documented contract.
unsafe impl Send for BufferInner {}
unsafe impl Sync for BufferInner {}

impl Drop for BufferInner {
    fn drop(&mut self) {
        match &mut self.storage {
            Storage::Owned { data, layout } => unsafe {
                alloc::dealloc(*data, *layout);
            },
            Storage::Foreign { data, release, .. } => {
                if let Some(release) = release.take() {
                    release(*data);
                }
            }
        }
    }
}

/// Reference-counted byte allocation with 16-byte alignment.
#[derive(Clone)]
pub struct Buffer {
    inner: Arc<BufferInner>,
}

impl Buffer {
    /// Allocate `size` bytes, zero-filled when `zeroed` is set.
    ///
    /// Returns `None` for a zero size, which callers treat as an empty handle.
    pub fn allocate(size: usize, zeroed: bool) -> Option<Buffer> {
        if size == 0 {
            return None;
        }
        let layout = Layout::from_size_align(size, BUFFER_ALIGNMENT).ok()?;
        let data = unsafe {
            if zeroed {
                alloc::alloc_zeroed(layout)
            } else {
                alloc::alloc(layout)
            }
        };
        if data.is_null() {
            return None;
        }
        Some(Buffer {
            inner: Arc::new(BufferInner {
                storage: Storage::Owned { data, layout },
                size,
            }),
        })
    }

    /// Wrap memory owned by something else, such as a window surface.
    ///
    /// # Safety
    /// `data` must stay valid and writable for `size` bytes until `release`
    /// is called, and must not be freed by anyone else.
    pub unsafe fn from_foreign(
        data: *mut u8,
        size: usize,
        release: Option<Box<dyn FnOnce(*mut u8) + Send>>,
    ) -> Buffer {
        Buffer {
            inner: Arc::new(BufferInner {
                storage: Storage::Foreign { data, size, release },
                size,
            }),
        }
    }

    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Base address of the allocation. Only `SafePointer` construction should
    /// need this.
    pub fn base_ptr(&self) -> *mut u8 {
        match &self.inner.storage {
            Storage::Owned { data, .. } => *data,
            Storage::Foreign { data, .. } => *data,
        }
    }

    /// True when both handles share one allocation.
    pub fn same_allocation(a: &Buffer, b: &Buffer) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer").field("size", &self.inner.size).finish()
    }
}
