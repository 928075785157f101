use std::{
  io,
  ops::{Deref, DerefMut},
  ptr::{self, NonNull},
  slice,
};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void, mmap, munmap};
use log::debug;

use crate::error::SegmentError;

/// A heap segment backed by a private anonymous mapping.
///
/// The mapping is page aligned and zero filled, and is unmapped on drop.
/// Hand it to the allocator with
/// [`ExplicitAllocator::init`](crate::ExplicitAllocator::init):
///
/// ```rust,no_run
/// use exalloc::{ExplicitAllocator, MappedSegment};
///
/// let mut segment = MappedSegment::new(1 << 20).unwrap();
/// let mut allocator = ExplicitAllocator::init(&mut segment).unwrap();
/// let ptr = allocator.allocate(64).unwrap();
/// allocator.payload_mut(ptr)[0] = 42;
/// ```
pub struct MappedSegment {
  base: NonNull<u8>,
  len: usize,
}

impl MappedSegment {
  pub fn new(len: usize) -> Result<Self, SegmentError> {
    if len == 0 {
      return Err(SegmentError::Empty);
    }

    let address = unsafe {
      mmap(
        ptr::null_mut(),
        len,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };
    if address == MAP_FAILED {
      return Err(io::Error::last_os_error().into());
    }

    let base = NonNull::new(address as *mut u8)
      .ok_or_else(|| SegmentError::Map(io::Error::other("mmap returned a null mapping")))?;
    debug!("mapped segment at {:?}, {len} bytes", base);

    Ok(Self { base, len })
  }
}

impl Deref for MappedSegment {
  type Target = [u8];

  fn deref(&self) -> &[u8] {
    // The mapping stays valid and exclusively ours until drop.
    unsafe { slice::from_raw_parts(self.base.as_ptr(), self.len) }
  }
}

impl DerefMut for MappedSegment {
  fn deref_mut(&mut self) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(self.base.as_ptr(), self.len) }
  }
}

impl Drop for MappedSegment {
  fn drop(&mut self) {
    unsafe {
      munmap(self.base.as_ptr() as *mut c_void, self.len);
    }
  }
}
