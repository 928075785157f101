use log::trace;

use crate::{
  block::{Block, HEADER_SIZE},
  heap::Heap,
};

impl Heap<'_> {
  /// Absorbs every free block directly to the right of `block`.
  ///
  /// Walks forward from the end of `block`'s payload, folding each free
  /// neighbour (header included) into `block` and dropping it from the free
  /// list, until an allocated block or the segment end is reached.
  ///
  /// Only right-hand neighbours are merged. Headers carry no footer and the
  /// free list is unordered, so there is no O(1) way to find the block on
  /// the left; a free left neighbour stays a separate block.
  pub(crate) fn coalesce_right(
    &mut self,
    block: Block,
  ) {
    let mut payload_size = self.payload_size(block);
    let mut neighbour = block.following(payload_size);

    while self.contains(neighbour) && !self.is_allocated(neighbour) {
      let absorbed = self.payload_size(neighbour) + HEADER_SIZE;
      trace!("coalesce {block:?} <- {neighbour:?} ({absorbed} bytes)");
      self.remove(neighbour);
      payload_size += absorbed;
      self.set_payload_size(block, payload_size);
      neighbour = block.following(payload_size);
    }
  }

  /// Bytes `coalesce_right` would add to `block`, without merging anything.
  pub(crate) fn free_run_right(
    &self,
    block: Block,
  ) -> usize {
    let start = block.following(self.payload_size(block));
    let mut neighbour = start;

    while self.contains(neighbour) && !self.is_allocated(neighbour) {
      neighbour = neighbour.following(self.payload_size(neighbour));
    }

    neighbour.offset() - start.offset()
  }
}
