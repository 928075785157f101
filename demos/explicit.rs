use std::io::Read;

use exalloc::{ExplicitAllocator, MappedSegment, PayloadPtr};

/// Waits until the user presses ENTER when run with `--step`.
/// Useful to inspect the mapping with `pmap` or `gdb` between steps.
fn block_until_enter_pressed(step: bool) {
  if step {
    println!("\n>>> Press ENTER to continue...");
    let _ = std::io::stdin().bytes().next();
  }
}

fn print_alloc(
  allocator: &ExplicitAllocator<'_>,
  requested: usize,
  ptr: PayloadPtr,
) {
  println!(
    "Requested {} bytes, got {} at offset {:#x}, address = {:#x}",
    requested,
    allocator.payload_size(ptr),
    ptr.offset(),
    allocator.address(ptr),
  );
}

fn main() {
  env_logger::init();
  let step = std::env::args().any(|arg| arg == "--step");

  let mut segment = match MappedSegment::new(4096) {
    Ok(segment) => segment,
    Err(err) => {
      eprintln!("cannot map a heap segment: {err}");
      std::process::exit(1);
    }
  };
  let mut allocator = match ExplicitAllocator::init(&mut segment) {
    Ok(allocator) => allocator,
    Err(err) => {
      eprintln!("cannot initialize the allocator: {err}");
      std::process::exit(1);
    }
  };

  println!("[0] Fresh heap: one free block spanning the segment");
  print!("{}", allocator.heap_report());
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 1) Two allocations carved off the front of the free block.
  // --------------------------------------------------------------------
  let Ok(first) = allocator.allocate(100) else {
    return;
  };
  print_alloc(&allocator, 100, first);
  let Ok(second) = allocator.allocate(200) else {
    return;
  };
  print_alloc(&allocator, 200, second);
  allocator.payload_mut(second)[..12].copy_from_slice(b"second block");

  println!("\n[1] After two allocations");
  print!("{}", allocator.heap_report());
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 2) Release the first block and ask for a smaller one: first fit
  //    hands the old block back, split to size.
  // --------------------------------------------------------------------
  allocator.release(Some(first));
  let Ok(third) = allocator.allocate(50) else {
    return;
  };
  print_alloc(&allocator, 50, third);
  println!(
    "\n[2] third == first? {}",
    if third == first {
      "Yes, it reused the freed block"
    } else {
      "No, it allocated somewhere else"
    }
  );
  print!("{}", allocator.free_list_report());
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 3) Grow the second block; the free space to its right absorbs the
  //    growth without a copy.
  // --------------------------------------------------------------------
  let Ok(grown) = allocator.resize(Some(second), 300) else {
    return;
  };
  print_alloc(&allocator, 300, grown);
  println!(
    "\n[3] Grown in place: {}, contents: {:?}",
    grown == second,
    String::from_utf8_lossy(&allocator.payload(grown)[..12])
  );
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 4) Release everything and check the heap.
  // --------------------------------------------------------------------
  allocator.release(Some(grown));
  allocator.release(Some(third));
  println!("\n[4] Everything released");
  print!("{}", allocator.heap_report());
  println!("stats: {:?}", allocator.stats());
  println!("heap valid: {}", allocator.validate());
}
