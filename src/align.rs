/// Rounds `value` up to the next multiple of `multiple`.
///
/// `multiple` must be a power of two. Every payload size handed out by the
/// allocator goes through this macro, which keeps every block boundary on
/// the configured alignment.
///
/// # Examples
///
/// ```rust
/// use exalloc::align_to;
///
/// assert_eq!(align_to!(13usize, 8usize), 16);
/// assert_eq!(align_to!(16usize, 8usize), 16);
/// assert_eq!(align_to!(1usize, 4usize), 4);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $multiple:expr) => {
    ($value + ($multiple - 1)) & !($multiple - 1)
  };
}
