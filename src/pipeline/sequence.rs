//! Page ordering for reassembly.
//!
//! Page images are named `{stem}_page{N}.png`; directory listings and
//! renderer callbacks make no ordering promise, and a plain lexical sort puts
//! `page10` before `page2`. Ordering by the number after `page` restores the
//! source order.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"page(\d+)").unwrap());

/// Numeric page key for a page-image filename.
///
/// Uses the first `page<digits>` substring; 0 when there is none or when the
/// number does not fit in a `u64`.
pub fn page_key(file_name: &str) -> u64 {
    RE_PAGE_NUMBER
        .captures(file_name)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// Sort page-image filenames into document order.
///
/// Stable: names with equal keys (including every un-paginated name, key 0)
/// keep their relative order.
pub fn order_pages<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by_key(|n| page_key(n.as_ref()));
}
