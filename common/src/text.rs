//! Bounded string helpers.
//!
//! Every text field in the engine (config strings, messages, notification
//! bodies, log lines) has a fixed capacity. Input longer than that is cut,
//! never rejected.

use heapless::String;

/// Copy `src` into a bounded string, dropping whatever does not fit.
pub fn bounded<const N: usize>(src: &str) -> String<N> {
    let mut out = String::new();
    for c in src.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Replace the contents of `dst` with as much of `src` as fits.
pub fn assign<const N: usize>(
    dst: &mut String<N>,
    src: &str,
) {
    *dst = bounded(src);
}
