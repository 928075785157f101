use log::trace;

use crate::{
  block::{Block, HEADER_SIZE, Header, MIN_BLOCK_SIZE},
  heap::Heap,
};

impl Heap<'_> {
  /// First-fit search over the free list.
  ///
  /// The first free block whose payload holds `aligned_size` bytes wins. It
  /// is split when the leftover can form a block of its own, then taken off
  /// the list and returned allocated.
  pub(crate) fn find_fit(
    &mut self,
    aligned_size: usize,
  ) -> Option<Block> {
    let mut current = self.free_head;

    while let Some(block) = current {
      let available = self.payload_size(block);
      if available >= aligned_size {
        trace!("find_fit({aligned_size}): {block:?} with {available} bytes");
        if available >= aligned_size + MIN_BLOCK_SIZE {
          self.split(block, aligned_size);
        }
        self.remove(block);
        return Some(block);
      }
      current = self.links(block).next;
    }

    trace!("find_fit({aligned_size}): free list exhausted");
    None
  }

  /// Shrinks `block` to `payload_size` bytes and turns the rest into a new
  /// free block on the free list, which is returned.
  ///
  /// The remainder must be at least a minimum block.
  pub(crate) fn split(
    &mut self,
    block: Block,
    payload_size: usize,
  ) -> Block {
    let available = self.payload_size(block);
    debug_assert!(available >= payload_size + MIN_BLOCK_SIZE);

    let tail = block.following(payload_size);
    let tail_payload = available - payload_size - HEADER_SIZE;
    trace!("split {block:?}: {payload_size} + {tail:?} with {tail_payload}");

    self.write_header(tail, Header::new(tail_payload as u32, false));
    self.insert_front(tail);
    self.set_payload_size(block, payload_size);
    tail
  }
}
