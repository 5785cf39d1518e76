use super::error::{BoundaryError, BoundaryResult};
use super::identifier::SegmentId;

/// Estimated boundary frame between two adjacent windows: the midpoint of
/// the before-window's last end frame and the after-window's first start
/// frame, rounded up.
pub fn locate_boundary<B, A>(before: &[B], after: &[A]) -> BoundaryResult<u64>
where
    B: AsRef<str>,
    A: AsRef<str>,
{
    let last = before.last().ok_or(BoundaryError::EmptyWindow)?;
    let first = after.first().ok_or(BoundaryError::EmptyWindow)?;

    let last_end = SegmentId::parse(last.as_ref())?.end_frame;
    let first_start = SegmentId::parse(first.as_ref())?.start_frame;

    Ok(ceil_midpoint(last_end, first_start))
}

fn ceil_midpoint(a: u64, b: u64) -> u64 {
    // (a + b + 1) / 2 without overflowing near u64::MAX
    a / 2 + b / 2 + (a % 2 + b % 2 + 1) / 2
}
