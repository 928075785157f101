use exalloc::{AllocError, ExplicitAllocator, HEADER_SIZE, MappedSegment, MIN_PAYLOAD_SIZE};
use test_log::test;

fn disjoint(
  allocator: &ExplicitAllocator<'_>,
  a: exalloc::PayloadPtr,
  b: exalloc::PayloadPtr,
) -> bool {
  let a_end = a.offset() + allocator.payload_size(a);
  let b_end = b.offset() + allocator.payload_size(b);
  a_end <= b.offset() || b_end <= a.offset()
}

#[test]
fn test_walkthrough_1024() {
  let mut segment = MappedSegment::new(1024).unwrap();
  let mut allocator = ExplicitAllocator::init(&mut segment).unwrap();

  let p1 = allocator.allocate(100).unwrap();
  assert!(allocator.payload_size(p1) >= 100);

  let p2 = allocator.allocate(200).unwrap();
  assert!(disjoint(&allocator, p1, p2));
  for (i, byte) in allocator.payload_mut(p2)[..200].iter_mut().enumerate() {
    *byte = (i * 7) as u8;
  }
  let original: Vec<u8> = allocator.payload(p2)[..200].to_vec();

  allocator.release(Some(p1));
  let p3 = allocator.allocate(50).unwrap();
  assert_eq!(p3, p1);

  let p4 = allocator.resize(Some(p2), 300).unwrap();
  assert!(allocator.payload_size(p4) >= 300);
  assert_eq!(&allocator.payload(p4)[..200], original.as_slice());
  assert!(disjoint(&allocator, p3, p4));

  assert!(allocator.validate());
}

#[test]
fn test_minimum_payload() {
  let mut segment = MappedSegment::new(4096).unwrap();
  let mut allocator = ExplicitAllocator::init(&mut segment).unwrap();

  for size in 1..=16 {
    let ptr = allocator.allocate(size).unwrap();
    assert_eq!(allocator.payload_size(ptr), MIN_PAYLOAD_SIZE);
  }
  assert!(allocator.blocks().all(|info| info.payload_size >= MIN_PAYLOAD_SIZE));
}

#[test]
fn test_round_trip_reuses_space() {
  let mut segment = MappedSegment::new(256).unwrap();
  let mut allocator = ExplicitAllocator::init(&mut segment).unwrap();

  // Take the whole heap, so only the released block can satisfy the retry.
  let all = allocator.allocate(248).unwrap();
  assert!(allocator.allocate(1).is_err());

  allocator.release(Some(all));
  assert_eq!(allocator.allocate(248), Ok(all));
}

#[test]
fn test_release_right_then_left_merges() {
  let mut segment = MappedSegment::new(1024).unwrap();
  let mut allocator = ExplicitAllocator::init(&mut segment).unwrap();

  let left = allocator.allocate(64).unwrap();
  let right = allocator.allocate(64).unwrap();
  let _fence = allocator.allocate(16).unwrap();

  allocator.release(Some(right));
  allocator.release(Some(left));

  let free: Vec<_> = allocator.free_blocks().collect();
  assert_eq!(free[0].block, left.block());
  assert_eq!(free[0].payload_size, 64 + HEADER_SIZE + 64);
  assert!(allocator.validate());
}

#[test]
fn test_release_left_then_right_stays_split() {
  let mut segment = MappedSegment::new(1024).unwrap();
  let mut allocator = ExplicitAllocator::init(&mut segment).unwrap();

  let left = allocator.allocate(64).unwrap();
  let right = allocator.allocate(64).unwrap();
  let _fence = allocator.allocate(16).unwrap();

  allocator.release(Some(left));
  allocator.release(Some(right));

  // Only right-hand neighbours are merged, so the two stay separate.
  let sizes: Vec<_> = allocator
    .blocks()
    .filter(|info| !info.allocated)
    .map(|info| info.payload_size)
    .collect();
  assert_eq!(&sizes[..2], &[64, 64]);
  assert!(allocator.validate());
}

#[test]
fn test_exhaustion_keeps_heap_valid() {
  let mut segment = MappedSegment::new(4096).unwrap();
  let mut allocator = ExplicitAllocator::init(&mut segment).unwrap();

  let mut live = Vec::new();
  let failure = loop {
    match allocator.allocate(100) {
      Ok(ptr) => live.push(ptr),
      Err(err) => break err,
    }
  };

  assert_eq!(failure, AllocError::OutOfMemory { requested: 100 });
  assert!(live.len() * (104 + HEADER_SIZE) <= 4096);
  assert!(allocator.validate());

  // Freeing one makes room again.
  allocator.release(live.pop());
  assert!(allocator.allocate(100).is_ok());
  assert!(allocator.validate());
}

#[test]
fn test_resize_failure_leaves_original() {
  let mut segment = MappedSegment::new(512).unwrap();
  let mut allocator = ExplicitAllocator::init(&mut segment).unwrap();

  let ptr = allocator.allocate(64).unwrap();
  let _fence = allocator.allocate(64).unwrap();
  allocator.payload_mut(ptr).fill(0x5A);

  assert!(allocator.resize(Some(ptr), 4096).is_err());
  assert!(allocator.payload(ptr).iter().all(|&byte| byte == 0x5A));
  assert!(allocator.validate());

  allocator.release(Some(ptr));
  assert!(allocator.validate());
}
