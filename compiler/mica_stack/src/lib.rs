//! Stack growth for deep recursion.
//!
//! Compiled closures call each other recursively, once per nested
//! sub-expression and once per interpreted function call. A long call chain
//! in the evaluated program therefore becomes a long native call chain.
//! Entry points that may recurse wrap themselves in [`ensure_sufficient_stack`]
//! so the native stack grows on demand instead of overflowing.
//!
//! - **Native targets** use `stacker`.
//! - **WASM targets** call straight through.

/// Grow when less than this many bytes remain (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Bytes allocated for each new stack segment (2MB).
const SEGMENT: usize = 2 * 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
