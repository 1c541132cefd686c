//! Merge-based operations over sorted, deduplicated id sequences.
//!
//! Every comparison in the reconciler goes through these helpers so that
//! membership is always decided by full-value equality on normalized
//! inputs. Substring-style matching (where id `12` would "find" id `123`)
//! is exactly the bug class these exist to rule out.

/// Sort ascending and drop duplicates in place.
pub fn sort_dedup(ids: &mut Vec<u64>) {
    ids.sort_unstable();
    ids.dedup();
}

/// `a − b` for sorted, deduplicated inputs. O(|a| + |b|).
pub fn diff_sorted(a: &[u64], b: &[u64]) -> Vec<u64> {
    debug_assert!(is_sorted_dedup(a));
    debug_assert!(is_sorted_dedup(b));
    let mut out = Vec::new();
    let mut j = 0;
    for &x in a {
        while j < b.len() && b[j] < x {
            j += 1;
        }
        if j >= b.len() || b[j] != x {
            out.push(x);
        }
    }
    out
}

/// `a ∪ b` for sorted, deduplicated inputs. O(|a| + |b|).
pub fn union_sorted(a: &[u64], b: &[u64]) -> Vec<u64> {
    debug_assert!(is_sorted_dedup(a));
    debug_assert!(is_sorted_dedup(b));
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

fn is_sorted_dedup(ids: &[u64]) -> bool {
    ids.windows(2).all(|w| w[0] < w[1])
}
