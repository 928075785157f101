//! The explicit free list.
//!
//! Free blocks are threaded into a doubly linked list whose links live in
//! the first 16 payload bytes of each free block:
//!
//! ```text
//!   ┌────────┬──────────┬──────────┬─────────────────────┐
//!   │ Header │ prev u64 │ next u64 │ rest of the payload │
//!   └────────┴──────────┴──────────┴─────────────────────┘
//! ```
//!
//! Insertion is always at the head, so list order follows recency rather
//! than address. Links are only meaningful while the header says "free";
//! once a block is handed out those bytes belong to the caller.

use crate::{
  block::{Block, HEADER_SIZE, MIN_BLOCK_SIZE},
  heap::Heap,
};

/// Stored in a link slot to mean "no block".
const NIL: u64 = u64::MAX;
const LINK_SIZE: usize = std::mem::size_of::<u64>();

/// The link overlay of a free block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Links {
  pub prev: Option<Block>,
  pub next: Option<Block>,
}

fn decode_link(bytes: &[u8]) -> Option<Block> {
  let mut raw = [0u8; LINK_SIZE];
  raw.copy_from_slice(bytes);
  match u64::from_ne_bytes(raw) {
    NIL => None,
    offset => Some(Block::new(offset as usize)),
  }
}

fn encode_link(link: Option<Block>) -> [u8; LINK_SIZE] {
  link.map_or(NIL, |block| block.offset() as u64).to_ne_bytes()
}

impl<'seg> Heap<'seg> {
  pub(crate) fn links(
    &self,
    block: Block,
  ) -> Links {
    debug_assert!(!self.is_allocated(block), "link view of allocated {block:?}");
    let raw = self.bytes(block.payload_address(), 2 * LINK_SIZE);
    Links {
      prev: decode_link(&raw[..LINK_SIZE]),
      next: decode_link(&raw[LINK_SIZE..]),
    }
  }

  fn set_prev(
    &mut self,
    block: Block,
    prev: Option<Block>,
  ) {
    self
      .bytes_mut(block.payload_address(), LINK_SIZE)
      .copy_from_slice(&encode_link(prev));
  }

  fn set_next(
    &mut self,
    block: Block,
    next: Option<Block>,
  ) {
    self
      .bytes_mut(block.payload_address() + LINK_SIZE, LINK_SIZE)
      .copy_from_slice(&encode_link(next));
  }

  /// Pushes `block` to the head of the free list and marks it free.
  pub(crate) fn insert_front(
    &mut self,
    block: Block,
  ) {
    self.set_allocated(block, false);
    self.set_prev(block, None);
    self.set_next(block, self.free_head);
    if let Some(head) = self.free_head {
      self.set_prev(head, Some(block));
    }
    self.free_head = Some(block);
  }

  /// Unlinks `block` from the free list and marks it allocated.
  ///
  /// `block` must currently be on the list.
  pub(crate) fn remove(
    &mut self,
    block: Block,
  ) {
    let Links { prev, next } = self.links(block);

    match (prev, next) {
      (None, None) => self.free_head = None,
      (None, Some(next)) => {
        self.set_prev(next, None);
        self.free_head = Some(next);
      }
      (Some(prev), None) => self.set_next(prev, None),
      (Some(prev), Some(next)) => {
        self.set_next(prev, Some(next));
        self.set_prev(next, Some(prev));
      }
    }

    self.set_allocated(block, true);
  }

  /// Walks the free list from the head.
  pub(crate) fn free_list(&self) -> FreeListIter<'_, 'seg> {
    FreeListIter {
      heap: self,
      current: self.free_head,
      remaining: self.len() / MIN_BLOCK_SIZE + 1,
    }
  }
}

/// Iterator over free-list members in list order.
///
/// Stops after as many steps as the segment could possibly hold blocks, so
/// a corrupted (cyclic) list cannot hang the caller.
pub(crate) struct FreeListIter<'h, 'seg> {
  heap: &'h Heap<'seg>,
  current: Option<Block>,
  remaining: usize,
}

impl<'h, 'seg> FreeListIter<'h, 'seg> {
  pub(crate) fn heap(&self) -> &'h Heap<'seg> {
    self.heap
  }
}

impl Iterator for FreeListIter<'_, '_> {
  type Item = (Block, Links);

  fn next(&mut self) -> Option<Self::Item> {
    let block = self.current?;
    if self.remaining == 0 {
      self.current = None;
      return None;
    }
    self.remaining -= 1;
    // Out-of-bounds and allocated members are reported without links and
    // end the walk; the checker flags them.
    let readable = block
      .offset()
      .checked_add(HEADER_SIZE + 2 * LINK_SIZE)
      .is_some_and(|end| end <= self.heap.len());
    let links = if !readable || self.heap.is_allocated(block) {
      Links {
        prev: None,
        next: None,
      }
    } else {
      self.heap.links(block)
    };
    self.current = links.next;
    Some((block, links))
  }
}
