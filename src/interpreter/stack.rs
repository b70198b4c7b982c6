//! Native stack growth for the recursive evaluator.
//!
//! Script recursion maps onto native recursion, so evaluation grows the stack on the heap instead of relying on the
//! size of whatever thread it runs on. The call depth limit then always fires before the host stack runs out.

/// Grow the stack when less than this remains
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
