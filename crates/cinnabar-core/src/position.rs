//! Dense position keys for ordered inserts.
//!
//! A `PositionKey` is a string over a 62-symbol alphanumeric alphabet,
//! compared lexicographically byte-by-byte; a shorter key sorts before any
//! extension of itself. [`PositionKey::between`] always finds a key strictly
//! between two neighbors by extending string length, so a list insert never
//! renumbers siblings.
//!
//! Every allocated key ends in a short suffix derived from the allocating
//! actor. Two actors that concurrently fill the same gap therefore mint
//! distinct keys, which keeps the allocator's own invariant alive: between
//! any two adjacent keys there is always room for another.
//!
//! Keys grow under adversarial patterns (repeatedly inserting at the same
//! boundary lengthens them steadily). That is a storage cost, not a failure
//! mode; long-running documents that care should renumber out-of-band.

use crate::clock::ActorId;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The 62 usable symbols, in ASCII (and therefore comparison) order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Virtual digit below every symbol; stands in for an exhausted or open
/// left bound.
const LOW: u8 = 0;

/// Virtual digit above every symbol; stands in for an open right bound.
const HIGH: u8 = 63;

/// Length of the per-actor disambiguation suffix.
const SUFFIX_LEN: usize = 3;

/// A total-ordered list position. Position is data: elements are sorted by
/// key, and moving an element only rewrites its key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionKey(String);

impl PositionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Digit value at `i`, or the virtual low digit beyond the end.
    fn digit(&self, i: usize) -> u8 {
        self.0.as_bytes().get(i).map_or(LOW, |&b| digit_value(b))
    }

    /// A key for `actor` strictly between `left` and `right`; `None`
    /// bounds are the open ends of the list.
    ///
    /// Walks digit positions left to right. Where the gap between the two
    /// bound digits leaves room, the midpoint digit finishes the core;
    /// where it does not, the walk follows one of the bounds down a level
    /// and tries again, extending the key. The core always diverges from
    /// the right bound at its last digit, so appending the actor suffix
    /// cannot push the result past it — and the suffix never uses the
    /// minimum symbol, so head-insertion before any allocated key stays
    /// satisfiable.
    pub fn between(
        left: Option<&PositionKey>,
        right: Option<&PositionKey>,
        actor: &ActorId,
    ) -> PositionKey {
        if let (Some(l), Some(r)) = (left, right) {
            debug_assert!(l < r, "position bounds out of order: {l} >= {r}");
        }

        let mut out = String::new();
        let mut bounded = right.is_some();
        let mut i = 0usize;

        loop {
            let lo = left.map_or(LOW, |k| k.digit(i));
            let hi = match right {
                Some(r) if bounded => {
                    if i < r.len() {
                        r.digit(i)
                    } else {
                        // A well-formed right bound diverges from the left
                        // bound before it exhausts.
                        debug_assert!(false, "right bound exhausted at digit {i}");
                        bounded = false;
                        HIGH
                    }
                }
                _ => HIGH,
            };

            if hi > lo + 1 {
                // Room at this digit; the midpoint ends the core strictly
                // below the right bound.
                out.push(symbol(lo + (hi - lo + 1) / 2));
                break;
            } else if hi == lo {
                // Both bounds share this digit; keep matching.
                out.push(symbol(lo));
                i += 1;
            } else if lo == LOW {
                // The left bound is exhausted and the right bound sits on
                // the minimum symbol here. Descend along the right bound;
                // whatever follows stays strictly below its next digit.
                out.push(symbol(hi));
                i += 1;
            } else {
                // hi == lo + 1: no room at this digit. Sit on the left
                // digit, which is already strictly below the right bound,
                // and continue against the left bound alone.
                out.push(symbol(lo));
                bounded = false;
                i += 1;
            }
        }

        for c in actor_suffix(actor) {
            out.push(c);
        }
        PositionKey(out)
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn digit_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0' + 1,
        b'A'..=b'Z' => b - b'A' + 11,
        b'a'..=b'z' => b - b'a' + 37,
        // Foreign bytes sort below every symbol, same as a missing digit.
        _ => LOW,
    }
}

fn symbol(value: u8) -> char {
    ALPHABET[(value - 1) as usize] as char
}

/// Short key suffix derived from the actor id. Drawn from symbols 2..=62
/// so no allocated key ever ends in the minimum symbol.
fn actor_suffix(actor: &ActorId) -> [char; SUFFIX_LEN] {
    let mut hasher = DefaultHasher::new();
    actor.as_str().hash(&mut hasher);
    let mut h = hasher.finish();

    let mut out = ['1'; SUFFIX_LEN];
    for slot in out.iter_mut() {
        *slot = symbol((h % 61) as u8 + 2);
        h /= 61;
    }
    out
}
