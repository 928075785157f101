use crate::{block::HEADER_SIZE, error::InitError};

/// Alignment of every payload address handed out.
pub const ALIGNMENT: usize = 8;
/// Largest single request accepted by `allocate`/`resize`.
pub const MAX_REQUEST_SIZE: usize = 1 << 30;

/// Build-time parameters of an allocator instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
  /// Payload alignment, a power of two no larger than the header.
  pub alignment: usize,
  /// Requests above this many bytes are rejected.
  pub max_request_size: usize,
}

impl Config {
  pub const DEFAULT: Config = Config {
    alignment: ALIGNMENT,
    max_request_size: MAX_REQUEST_SIZE,
  };

  pub fn validate(&self) -> Result<(), InitError> {
    if !self.alignment.is_power_of_two() {
      return Err(InitError::InvalidConfig("alignment must be a power of two"));
    }
    // Headers are 8 bytes, so payloads can never sit on a coarser boundary.
    if self.alignment > HEADER_SIZE {
      return Err(InitError::InvalidConfig(
        "alignment must not exceed the header size",
      ));
    }
    if self.max_request_size == 0 || self.max_request_size > u32::MAX as usize - HEADER_SIZE {
      return Err(InitError::InvalidConfig(
        "max_request_size must be non-zero and fit a block header",
      ));
    }
    Ok(())
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::DEFAULT
  }
}
