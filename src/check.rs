//! Heap consistency checking and introspection.
//!
//! None of this is needed for the allocator to work; it exists for tests and
//! tooling. The checker walks the heap in address order, independently of
//! the free list, and cross-checks the two views.

use std::{collections::HashMap, fmt};

use log::error;

use crate::{
  block::{Block, HEADER_SIZE, MIN_PAYLOAD_SIZE},
  error::HeapViolation,
  explicit::ExplicitAllocator,
  heap::Heap,
};

/// One block seen by the address-order heap walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
  pub block: Block,
  pub payload_size: usize,
  pub allocated: bool,
}

/// One member of the free list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeBlockInfo {
  pub block: Block,
  pub payload_size: usize,
  pub prev: Option<Block>,
  pub next: Option<Block>,
}

/// Occupancy summary of the heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
  pub blocks: usize,
  pub free_blocks: usize,
  pub allocated_bytes: usize,
  pub free_bytes: usize,
  pub largest_free: usize,
}

/// Address-order walk over the blocks of a heap.
///
/// Ends at the segment end, or early at a header that would not fit or a
/// payload size that would run past the segment.
pub struct Blocks<'h, 'seg> {
  heap: &'h Heap<'seg>,
  current: Block,
}

impl Iterator for Blocks<'_, '_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<Self::Item> {
    let block = self.current;
    if !self.heap.contains(block) {
      return None;
    }
    let header = self.heap.header(block);
    let payload_size = header.payload_size();
    self.current = if payload_size > self.heap.len() {
      Block::new(self.heap.len())
    } else {
      block.following(payload_size)
    };
    Some(BlockInfo {
      block,
      payload_size,
      allocated: header.allocated,
    })
  }
}

/// Free-list walk in list order.
pub struct FreeBlocks<'h, 'seg> {
  inner: crate::free_list::FreeListIter<'h, 'seg>,
}

impl Iterator for FreeBlocks<'_, '_> {
  type Item = FreeBlockInfo;

  fn next(&mut self) -> Option<Self::Item> {
    let (block, links) = self.inner.next()?;
    let payload_size = if self.inner.heap().contains(block) {
      self.inner.heap().payload_size(block)
    } else {
      0
    };
    Some(FreeBlockInfo {
      block,
      payload_size,
      prev: links.prev,
      next: links.next,
    })
  }
}

fn check_heap(heap: &Heap<'_>) -> Result<(), HeapViolation> {
  let segment = heap.len();

  let mut occurrences: HashMap<Block, usize> = HashMap::new();
  let mut previous = None;
  for (block, links) in heap.free_list() {
    *occurrences.entry(block).or_default() += 1;
    if !heap.contains(block) {
      return Err(HeapViolation::BrokenLink(block));
    }
    if !heap.is_allocated(block) && links.prev != previous {
      return Err(HeapViolation::BrokenLink(block));
    }
    previous = Some(block);
  }

  let mut covered = 0;
  let mut block = Block::new(0);
  while block.offset() < segment {
    if !heap.contains(block) {
      return Err(HeapViolation::Untiled {
        end: block.offset(),
        segment,
      });
    }

    let header = heap.header(block);
    let payload_size = header.payload_size();
    if payload_size < MIN_PAYLOAD_SIZE || payload_size > segment {
      return Err(HeapViolation::ImplausiblePayload {
        block,
        payload_size,
      });
    }

    covered += HEADER_SIZE + payload_size;
    if covered > segment {
      return Err(HeapViolation::Overrun { covered, segment });
    }

    match (header.allocated, occurrences.remove(&block)) {
      (true, None) | (false, Some(1)) => {}
      (true, Some(_)) => return Err(HeapViolation::AllocatedInFreeList(block)),
      (false, None) => return Err(HeapViolation::MissingFromFreeList(block)),
      (false, Some(count)) => return Err(HeapViolation::DuplicateInFreeList { block, count }),
    }

    block = block.following(payload_size);
  }

  // Whatever is left was linked in but is not a block boundary.
  match occurrences.keys().min() {
    Some(&stray) => Err(HeapViolation::BrokenLink(stray)),
    None => Ok(()),
  }
}

impl<'seg> ExplicitAllocator<'seg> {
  /// Verifies the heap invariants: exact tiling, plausible payload sizes,
  /// and a free list holding every free block exactly once and nothing else.
  pub fn check(&self) -> Result<(), HeapViolation> {
    check_heap(&self.heap)
  }

  /// [`check`](Self::check), reporting any violation through the log.
  pub fn validate(&self) -> bool {
    match self.check() {
      Ok(()) => true,
      Err(violation) => {
        error!("heap check failed: {violation}");
        false
      }
    }
  }

  /// Blocks in address order.
  pub fn blocks(&self) -> Blocks<'_, 'seg> {
    Blocks {
      heap: &self.heap,
      current: Block::new(0),
    }
  }

  /// Free blocks in free-list order.
  pub fn free_blocks(&self) -> FreeBlocks<'_, 'seg> {
    FreeBlocks {
      inner: self.heap.free_list(),
    }
  }

  pub fn stats(&self) -> HeapStats {
    self.blocks().fold(HeapStats::default(), |mut stats, info| {
      stats.blocks += 1;
      if info.allocated {
        stats.allocated_bytes += info.payload_size;
      } else {
        stats.free_blocks += 1;
        stats.free_bytes += info.payload_size;
        stats.largest_free = stats.largest_free.max(info.payload_size);
      }
      stats
    })
  }

  /// Human-readable dump of every block in address order.
  pub fn heap_report(&self) -> HeapReport<'_, 'seg> {
    HeapReport { allocator: self }
  }

  /// Human-readable dump of the free list.
  pub fn free_list_report(&self) -> FreeListReport<'_, 'seg> {
    FreeListReport { allocator: self }
  }
}

fn link(block: Option<Block>) -> String {
  block.map_or_else(|| "-".to_string(), |block| block.to_string())
}

pub struct HeapReport<'a, 'seg> {
  allocator: &'a ExplicitAllocator<'seg>,
}

impl fmt::Display for HeapReport<'_, '_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(
      f,
      "heap at {:#x}, {} bytes",
      self.allocator.heap.base_address(),
      self.allocator.segment_size()
    )?;
    for info in self.allocator.blocks() {
      writeln!(
        f,
        "  block {:>8}  payload {:>8}  {:<9}  next {}",
        info.block,
        info.payload_size,
        if info.allocated { "allocated" } else { "free" },
        info.block.following(info.payload_size),
      )?;
    }
    Ok(())
  }
}

pub struct FreeListReport<'a, 'seg> {
  allocator: &'a ExplicitAllocator<'seg>,
}

impl fmt::Display for FreeListReport<'_, '_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "free list")?;
    for info in self.allocator.free_blocks() {
      writeln!(
        f,
        "  free {:>8}  payload {:>8}  prev {:>8}  next {:>8}",
        info.block,
        info.payload_size,
        link(info.prev),
        link(info.next),
      )?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use test_log::test;

  use super::*;
  use crate::{block::Header, testing::AlignedSegment};

  #[test]
  fn test_fresh_heap_passes() {
    let mut segment = AlignedSegment::<1024>::new();
    let allocator = ExplicitAllocator::init(segment.as_mut_slice()).unwrap();

    assert_eq!(allocator.check(), Ok(()));
    assert!(allocator.validate());
  }

  #[test]
  fn test_detects_free_block_missing_from_list() {
    let mut segment = AlignedSegment::<1024>::new();
    let mut allocator = ExplicitAllocator::init(segment.as_mut_slice()).unwrap();
    let ptr = allocator.allocate(32).unwrap();

    // Flip the flag without touching the list.
    allocator.heap.set_allocated(ptr.block(), false);

    assert_eq!(
      allocator.check(),
      Err(HeapViolation::MissingFromFreeList(ptr.block()))
    );
    assert!(!allocator.validate());
  }

  #[test]
  fn test_detects_allocated_block_in_list() {
    let mut segment = AlignedSegment::<1024>::new();
    let mut allocator = ExplicitAllocator::init(segment.as_mut_slice()).unwrap();
    let _ptr = allocator.allocate(32).unwrap();
    let head = allocator.heap.free_head.unwrap();

    allocator.heap.set_allocated(head, true);

    assert_eq!(
      allocator.check(),
      Err(HeapViolation::AllocatedInFreeList(head))
    );
  }

  #[test]
  fn test_detects_duplicate_membership() {
    let mut segment = AlignedSegment::<1024>::new();
    let mut allocator = ExplicitAllocator::init(segment.as_mut_slice()).unwrap();
    let a = allocator.allocate(32).unwrap();
    let _b = allocator.allocate(32).unwrap();
    allocator.release(Some(a));

    // Re-inserting the head makes it link to itself.
    let head = allocator.heap.free_head.unwrap();
    allocator.heap.insert_front(head);

    assert!(matches!(
      allocator.check(),
      Err(HeapViolation::DuplicateInFreeList { .. }) | Err(HeapViolation::BrokenLink(_))
    ));
  }

  #[test]
  fn test_detects_implausible_and_overrun() {
    let mut segment = AlignedSegment::<1024>::new();
    let mut allocator = ExplicitAllocator::init(segment.as_mut_slice()).unwrap();
    let ptr = allocator.allocate(32).unwrap();

    allocator.heap.write_header(ptr.block(), Header::new(8, true));
    assert_eq!(
      allocator.check(),
      Err(HeapViolation::ImplausiblePayload {
        block: ptr.block(),
        payload_size: 8,
      })
    );

    allocator.heap.write_header(ptr.block(), Header::new(1020, true));
    assert_eq!(
      allocator.check(),
      Err(HeapViolation::Overrun {
        covered: 1020 + HEADER_SIZE,
        segment: 1024,
      })
    );
  }

  #[test]
  fn test_stats_and_walks() {
    let mut segment = AlignedSegment::<1024>::new();
    let mut allocator = ExplicitAllocator::init(segment.as_mut_slice()).unwrap();
    let a = allocator.allocate(100).unwrap();
    let _b = allocator.allocate(200).unwrap();
    allocator.release(Some(a));

    let blocks: Vec<_> = allocator.blocks().collect();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0], BlockInfo {
      block: Block::new(0),
      payload_size: 104,
      allocated: false,
    });
    assert!(blocks[1].allocated);

    let free: Vec<_> = allocator.free_blocks().collect();
    assert_eq!(free.len(), 2);
    assert_eq!(free[0].block, Block::new(0));
    assert_eq!(free[0].prev, None);
    assert_eq!(free[0].next, Some(free[1].block));
    assert_eq!(free[1].prev, Some(Block::new(0)));

    let stats = allocator.stats();
    assert_eq!(stats.blocks, 3);
    assert_eq!(stats.free_blocks, 2);
    assert_eq!(stats.allocated_bytes, 200);
    assert_eq!(
      stats.allocated_bytes + stats.free_bytes + stats.blocks * HEADER_SIZE,
      1024
    );
    assert_eq!(stats.largest_free, 1024 - 104 - 200 - 3 * HEADER_SIZE);
  }

  #[test]
  fn test_reports_render_every_block() {
    let mut segment = AlignedSegment::<1024>::new();
    let mut allocator = ExplicitAllocator::init(segment.as_mut_slice()).unwrap();
    let _a = allocator.allocate(16).unwrap();

    let heap = allocator.heap_report().to_string();
    assert_eq!(heap.lines().count(), 3);
    assert!(heap.contains("allocated"));
    assert!(heap.contains("block      0x0"));

    let free = allocator.free_list_report().to_string();
    assert_eq!(free.lines().count(), 2);
    assert!(free.contains("free     0x18"));
    assert!(free.contains("prev        -"));
  }
}
