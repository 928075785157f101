use crate::block::{Block, HEADER_SIZE, Header};

/// The segment under management, viewed as a sequence of blocks.
///
/// Every block address is an offset into `bytes`; all header and link
/// accesses go through slice indexing, so a bogus offset can at worst
/// panic, never reach outside the segment.
pub(crate) struct Heap<'seg> {
  bytes: &'seg mut [u8],
  /// Head of the free list, `None` when no block is free.
  pub(crate) free_head: Option<Block>,
}

impl<'seg> Heap<'seg> {
  /// Lays out a single free block spanning `bytes`.
  ///
  /// The caller has checked that `bytes` holds at least one minimum block
  /// and that its payload fits a header.
  pub fn format(bytes: &'seg mut [u8]) -> Self {
    let mut heap = Self {
      bytes,
      free_head: None,
    };
    let first = Block::new(0);
    heap.write_header(first, Header::new((heap.len() - HEADER_SIZE) as u32, false));
    heap.insert_front(first);
    heap
  }

  /// Segment size in bytes.
  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  /// Machine address of the segment base.
  pub fn base_address(&self) -> usize {
    self.bytes.as_ptr() as usize
  }

  /// Whether a header could live at `block`.
  pub fn contains(
    &self,
    block: Block,
  ) -> bool {
    block.offset() + HEADER_SIZE <= self.len()
  }

  pub fn header(
    &self,
    block: Block,
  ) -> Header {
    let mut bytes = [0u8; HEADER_SIZE];
    bytes.copy_from_slice(&self.bytes[block.offset()..block.payload_address()]);
    Header::decode(bytes)
  }

  pub fn write_header(
    &mut self,
    block: Block,
    header: Header,
  ) {
    self.bytes[block.offset()..block.payload_address()].copy_from_slice(&header.encode());
  }

  pub fn payload_size(
    &self,
    block: Block,
  ) -> usize {
    self.header(block).payload_size()
  }

  pub fn set_payload_size(
    &mut self,
    block: Block,
    payload_size: usize,
  ) {
    debug_assert!(payload_size <= u32::MAX as usize);
    let header = self.header(block);
    self.write_header(block, Header::new(payload_size as u32, header.allocated));
  }

  pub fn is_allocated(
    &self,
    block: Block,
  ) -> bool {
    self.header(block).allocated
  }

  pub fn set_allocated(
    &mut self,
    block: Block,
    allocated: bool,
  ) {
    let header = self.header(block);
    self.write_header(block, Header::new(header.payload_size, allocated));
  }

  /// Raw bytes starting at `offset`, `len` long.
  pub fn bytes(
    &self,
    offset: usize,
    len: usize,
  ) -> &[u8] {
    &self.bytes[offset..offset + len]
  }

  pub fn bytes_mut(
    &mut self,
    offset: usize,
    len: usize,
  ) -> &mut [u8] {
    &mut self.bytes[offset..offset + len]
  }

  /// The payload bytes of `block`.
  pub fn payload(
    &self,
    block: Block,
  ) -> &[u8] {
    self.bytes(block.payload_address(), self.payload_size(block))
  }

  pub fn payload_mut(
    &mut self,
    block: Block,
  ) -> &mut [u8] {
    let size = self.payload_size(block);
    self.bytes_mut(block.payload_address(), size)
  }

  /// Copies `len` payload bytes from `from` into `to`.
  pub fn copy_payload(
    &mut self,
    from: Block,
    to: Block,
    len: usize,
  ) {
    self
      .bytes
      .copy_within(from.payload_address()..from.payload_address() + len, to.payload_address());
  }
}
