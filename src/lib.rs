//! # exalloc - An Explicit Free-List Allocator
//!
//! This crate provides a general-purpose **explicit free-list allocator**
//! that manages one fixed segment of memory handed to it once, and serves
//! allocate, release and resize requests from it without ever asking an
//! outer allocator for more.
//!
//! ## Overview
//!
//! The segment is tiled by blocks. Each block is an 8-byte header followed
//! by its payload; free blocks additionally thread a doubly linked list
//! through the first 16 bytes of their payload:
//!
//! ```text
//!   Heap Segment:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ ┌───┬────────┐┌───┬──────────────┐┌───┬──────┐┌───┬────────────────┐ │
//!   │ │ H │  used  ││ H │ prev|next .. ││ H │ used ││ H │ prev|next .... │ │
//!   │ └───┴────────┘└───┴──────────────┘└───┴──────┘└───┴────────────────┘ │
//!   │                  ▲       │                       ▲      │            │
//!   │                  │       └───────────────────────┘      │            │
//!   │                  └──────────────────────────────────────┘            │
//!   └──────────────────────────────────────────────────────────────────────┘
//!   ▲                                                                      ▲
//!   segment base                                                 segment end
//! ```
//!
//! - **Allocation** is first-fit over the free list. A block with room for
//!   another minimum block (24 bytes) beyond the request is split and the
//!   tail goes back on the list.
//! - **Release** merges every free block directly to the right into the
//!   released block, then pushes it to the head of the free list. Free
//!   blocks to the *left* are never merged: there is no footer and the list
//!   is not address ordered, so the left neighbour cannot be found in O(1).
//! - **Resize** shrinks in place, grows in place into free right neighbours
//!   when they suffice, and otherwise moves the payload to a fresh block.
//!
//! ## Crate Structure
//!
//! ```text
//!   exalloc
//!   ├── align      - Alignment macro (align_to!)
//!   ├── block      - Block handle and header encoding
//!   ├── heap       - The segment viewed as blocks (internal)
//!   ├── free_list  - Intrusive doubly linked free list (internal)
//!   ├── placement  - First-fit search and splitting (internal)
//!   ├── coalesce   - Right-hand coalescing (internal)
//!   ├── explicit   - ExplicitAllocator: init / allocate / release / resize
//!   ├── check      - Consistency checker, heap and free-list reports
//!   ├── config     - Alignment and request limits
//!   ├── error      - Error types
//!   └── segment    - mmap-backed segments
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exalloc::{ExplicitAllocator, MappedSegment};
//!
//! let mut segment = MappedSegment::new(64 * 1024).unwrap();
//! let mut allocator = ExplicitAllocator::init(&mut segment).unwrap();
//!
//! let ptr = allocator.allocate(100).unwrap();
//! allocator.payload_mut(ptr)[..5].copy_from_slice(b"hello");
//!
//! let ptr = allocator.resize(Some(ptr), 300).unwrap();
//! assert_eq!(&allocator.payload(ptr)[..5], b"hello");
//!
//! allocator.release(Some(ptr));
//! assert!(allocator.validate());
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization; share it behind one lock
//! - **Fixed segment**: The heap never grows
//! - **Right-only coalescing**: See above
//! - **Unchecked misuse**: Double free and foreign handles are not detected
//!   by the allocator itself; [`ExplicitAllocator::check`] will usually
//!   notice the damage afterwards

pub mod align;
mod block;
mod check;
mod coalesce;
mod config;
mod error;
mod explicit;
mod free_list;
mod heap;
mod placement;
mod segment;

pub use block::{Block, HEADER_SIZE, MIN_BLOCK_SIZE, MIN_PAYLOAD_SIZE};
pub use check::{BlockInfo, Blocks, FreeBlockInfo, FreeBlocks, FreeListReport, HeapReport, HeapStats};
pub use config::{ALIGNMENT, Config, MAX_REQUEST_SIZE};
pub use error::{AllocError, HeapViolation, InitError, SegmentError};
pub use explicit::{ExplicitAllocator, PayloadPtr};
pub use segment::MappedSegment;
