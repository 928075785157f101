use std::{cmp::Ordering, fmt};

use log::{debug, info};

use crate::{
  align_to,
  block::{Block, HEADER_SIZE, MIN_BLOCK_SIZE, MIN_PAYLOAD_SIZE},
  config::Config,
  error::{AllocError, InitError},
  heap::Heap,
};

/// Handle to the payload of a live allocation.
///
/// Only the allocator creates these. Using a handle after it was released,
/// or with another allocator, is a caller error: it may scramble the heap
/// bookkeeping or panic on a bounds check, but never touches memory outside
/// the segment.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PayloadPtr(usize);

impl PayloadPtr {
  /// Offset of the first payload byte from the segment base.
  pub const fn offset(self) -> usize {
    self.0
  }

  /// The block owning this payload, one header before it.
  pub const fn block(self) -> Block {
    Block::from_payload_address(self.0)
  }

  fn from_block(block: Block) -> Self {
    Self(block.payload_address())
  }
}

impl fmt::Debug for PayloadPtr {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "PayloadPtr({:#x})", self.0)
  }
}

/// An explicit free-list allocator over a caller-provided segment.
///
/// The segment is borrowed for the allocator's whole life and nothing is
/// returned to anyone on drop. Not thread-safe: wrap the whole allocator in
/// a single lock if it must be shared.
pub struct ExplicitAllocator<'seg> {
  pub(crate) heap: Heap<'seg>,
  config: Config,
}

impl<'seg> ExplicitAllocator<'seg> {
  /// Takes over `segment` with the default [`Config`].
  pub fn init(segment: &'seg mut [u8]) -> Result<Self, InitError> {
    Self::init_with(segment, Config::DEFAULT)
  }

  /// Takes over `segment`, laying it out as a single free block.
  ///
  /// Fails if the segment cannot hold one minimum block, if its payload
  /// does not fit a header, or if its base is not aligned to
  /// `config.alignment`.
  pub fn init_with(
    segment: &'seg mut [u8],
    config: Config,
  ) -> Result<Self, InitError> {
    config.validate()?;

    let size = segment.len();
    if size < MIN_BLOCK_SIZE {
      return Err(InitError::SegmentTooSmall { size });
    }
    if size - HEADER_SIZE > u32::MAX as usize {
      return Err(InitError::SegmentTooLarge { size });
    }
    let address = segment.as_ptr() as usize;
    if address % config.alignment != 0 {
      return Err(InitError::MisalignedSegment {
        address,
        alignment: config.alignment,
      });
    }

    info!("heap segment at {address:#x}, {size} bytes");

    Ok(Self {
      heap: Heap::format(segment),
      config,
    })
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Size of the managed segment in bytes.
  pub fn segment_size(&self) -> usize {
    self.heap.len()
  }

  /// Validates a request and turns it into a payload size.
  fn payload_size_for(
    &self,
    requested: usize,
  ) -> Result<usize, AllocError> {
    if requested == 0 {
      return Err(AllocError::ZeroSize);
    }
    if requested > self.config.max_request_size {
      return Err(AllocError::TooLarge {
        requested,
        max: self.config.max_request_size,
      });
    }
    Ok(align_to!(requested, self.config.alignment).max(MIN_PAYLOAD_SIZE))
  }

  /// Hands out a block with room for at least `requested` bytes.
  pub fn allocate(
    &mut self,
    requested: usize,
  ) -> Result<PayloadPtr, AllocError> {
    let aligned = self.payload_size_for(requested)?;

    let ptr = self
      .heap
      .find_fit(aligned)
      .map(PayloadPtr::from_block)
      .ok_or(AllocError::OutOfMemory { requested })?;

    debug!("allocate({requested}) -> {ptr:?}");
    self.debug_check();
    Ok(ptr)
  }

  /// Returns a block to the free list, merging the free blocks to its right.
  ///
  /// `None` is a no-op. Releasing the same handle twice is a caller error.
  pub fn release(
    &mut self,
    ptr: Option<PayloadPtr>,
  ) {
    let Some(ptr) = ptr else {
      return;
    };

    let block = ptr.block();
    self.heap.coalesce_right(block);
    self.heap.insert_front(block);

    debug!("release({ptr:?}): {} bytes free", self.heap.payload_size(block));
    self.debug_check();
  }

  /// Changes the size of an allocation, moving it only when it cannot grow
  /// in place.
  ///
  /// `None` or a zero `new_size` behave like [`allocate`](Self::allocate)
  /// with `new_size`; in particular a zero size leaves the original block
  /// allocated. When growth needs a move and no block fits, the original
  /// allocation is left untouched and still owned by the caller.
  pub fn resize(
    &mut self,
    ptr: Option<PayloadPtr>,
    new_size: usize,
  ) -> Result<PayloadPtr, AllocError> {
    let ptr = match ptr {
      Some(ptr) if new_size != 0 => ptr,
      _ => return self.allocate(new_size),
    };

    let aligned = self.payload_size_for(new_size)?;
    let block = ptr.block();
    let current = self.heap.payload_size(block);

    match current.cmp(&aligned) {
      Ordering::Equal => {}
      Ordering::Greater => {
        if current >= aligned + MIN_BLOCK_SIZE {
          let tail = self.heap.split(block, aligned);
          self.heap.coalesce_right(tail);
        }
      }
      Ordering::Less => {
        if current + self.heap.free_run_right(block) < aligned {
          let moved = self.allocate(new_size)?;
          self.heap.copy_payload(block, moved.block(), current);
          self.release(Some(ptr));
          debug!("resize({ptr:?}, {new_size}) moved to {moved:?}");
          return Ok(moved);
        }

        self.heap.coalesce_right(block);
        if self.heap.payload_size(block) >= aligned + MIN_BLOCK_SIZE {
          self.heap.split(block, aligned);
        }
      }
    }

    debug!(
      "resize({ptr:?}, {new_size}) in place, {} bytes",
      self.heap.payload_size(block)
    );
    self.debug_check();
    Ok(ptr)
  }

  /// Usable size of an allocation; at least the requested size.
  pub fn payload_size(
    &self,
    ptr: PayloadPtr,
  ) -> usize {
    self.heap.payload_size(ptr.block())
  }

  pub fn payload(
    &self,
    ptr: PayloadPtr,
  ) -> &[u8] {
    self.heap.payload(ptr.block())
  }

  pub fn payload_mut(
    &mut self,
    ptr: PayloadPtr,
  ) -> &mut [u8] {
    self.heap.payload_mut(ptr.block())
  }

  /// Machine address of the payload.
  pub fn address(
    &self,
    ptr: PayloadPtr,
  ) -> usize {
    self.heap.base_address() + ptr.offset()
  }

  #[inline]
  fn debug_check(&self) {
    #[cfg(feature = "check-heap")]
    debug_assert!(self.validate(), "heap consistency check failed");
  }
}
