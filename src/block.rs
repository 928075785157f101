use std::fmt;

/// Size of a block header in bytes.
pub const HEADER_SIZE: usize = 8;
/// Smallest payload a block may carry: room for the two free-list links.
pub const MIN_PAYLOAD_SIZE: usize = 16;
/// Smallest complete block, header included.
pub const MIN_BLOCK_SIZE: usize = HEADER_SIZE + MIN_PAYLOAD_SIZE;

/// A block, identified by the offset of its header from the segment base.
///
/// ```text
///   ┌──────────────────┬──────────────────────────────────┐
///   │ Header (8 bytes) │ Payload (payload_size bytes)     │
///   │ u32 payload_size │                                  │
///   │ u32 allocated    │                                  │
///   └──────────────────┴──────────────────────────────────┘
///   ▲                  ▲
///   Block              payload_address()
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Block(usize);

impl Block {
  pub(crate) const fn new(offset: usize) -> Self {
    Self(offset)
  }

  /// Offset of the header from the segment base.
  pub const fn offset(self) -> usize {
    self.0
  }

  /// Offset of the first payload byte.
  pub const fn payload_address(self) -> usize {
    self.0 + HEADER_SIZE
  }

  /// Offset of the block that follows a block carrying `payload_size` bytes.
  pub(crate) const fn following(
    self,
    payload_size: usize,
  ) -> Block {
    Block(self.0 + HEADER_SIZE + payload_size)
  }

  /// Recovers the block that owns the payload starting at `payload_address`.
  pub(crate) const fn from_payload_address(payload_address: usize) -> Self {
    Self(payload_address - HEADER_SIZE)
  }
}

impl fmt::Debug for Block {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "Block({:#x})", self.0)
  }
}

impl fmt::Display for Block {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.pad(&format!("{:#x}", self.0))
  }
}

/// Decoded form of the 8 header bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Header {
  pub payload_size: u32,
  pub allocated: bool,
}

impl Header {
  pub fn new(
    payload_size: u32,
    allocated: bool,
  ) -> Self {
    Self {
      payload_size,
      allocated,
    }
  }

  pub fn decode(bytes: [u8; HEADER_SIZE]) -> Self {
    let [s0, s1, s2, s3, a0, a1, a2, a3] = bytes;
    Self {
      payload_size: u32::from_ne_bytes([s0, s1, s2, s3]),
      allocated: u32::from_ne_bytes([a0, a1, a2, a3]) != 0,
    }
  }

  pub fn encode(self) -> [u8; HEADER_SIZE] {
    let mut bytes = [0u8; HEADER_SIZE];
    bytes[..4].copy_from_slice(&self.payload_size.to_ne_bytes());
    bytes[4..].copy_from_slice(&u32::from(self.allocated).to_ne_bytes());
    bytes
  }

  pub fn payload_size(self) -> usize {
    self.payload_size as usize
  }
}
