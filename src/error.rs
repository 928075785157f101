use crate::block::Block;

/// Why a segment could not be turned into an allocator.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
  #[error("segment of {size} bytes cannot hold a single block")]
  SegmentTooSmall { size: usize },
  #[error("segment of {size} bytes does not fit a block header")]
  SegmentTooLarge { size: usize },
  #[error("segment base {address:#x} is not aligned to {alignment}")]
  MisalignedSegment { address: usize, alignment: usize },
  #[error("invalid configuration: {0}")]
  InvalidConfig(&'static str),
}

/// The "no memory" outcome of `allocate` and `resize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
  #[error("zero-sized request")]
  ZeroSize,
  #[error("request of {requested} bytes exceeds the limit of {max}")]
  TooLarge { requested: usize, max: usize },
  #[error("no free block can hold {requested} bytes")]
  OutOfMemory { requested: usize },
}

/// A broken heap invariant found by the consistency checker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeapViolation {
  #[error("blocks cover {covered} bytes, more than the {segment} byte segment")]
  Overrun { covered: usize, segment: usize },
  #[error("heap walk ended at {end:#x} instead of the segment end {segment:#x}")]
  Untiled { end: usize, segment: usize },
  #[error("block {block} has an implausible payload size of {payload_size}")]
  ImplausiblePayload { block: Block, payload_size: usize },
  #[error("free block {0} is missing from the free list")]
  MissingFromFreeList(Block),
  #[error("free block {block} appears {count} times in the free list")]
  DuplicateInFreeList { block: Block, count: usize },
  #[error("allocated block {0} is linked into the free list")]
  AllocatedInFreeList(Block),
  #[error("free list link at {0} points outside the heap")]
  BrokenLink(Block),
}

/// Failure to obtain a segment from the operating system.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
  #[error("zero-sized segment")]
  Empty,
  #[error("failed to map segment: {0}")]
  Map(#[from] std::io::Error),
}
