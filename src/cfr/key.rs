//! Information-set key encodings.
//!
//! The store and engines are generic over the key type. Two encodings ship
//! with the crate:
//!
//! - `String`: the exact key from [`GameNode::info_set_key`].
//! - `u64`: the fixed-width key from [`GameNode::info_set_hash`].
//!
//! Both must split a game into the same information sets, so a solve gives
//! the same strategies whichever encoding is used.

use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::cfr::game::{GameError, GameNode};

/// A key identifying one information set.
pub trait InfoSetKey: Clone + Eq + Hash + Debug {
    /// Read the key of a Decision node.
    fn from_node<N: GameNode>(node: &N) -> Result<Self, GameError>;

    /// Stable text form, used as the key in snapshot files.
    fn to_text(&self) -> String;

    /// Inverse of [`to_text`](InfoSetKey::to_text).
    fn from_text(text: &str) -> Self;
}

impl InfoSetKey for String {
    fn from_node<N: GameNode>(node: &N) -> Result<Self, GameError> {
        node.info_set_key()
    }

    fn to_text(&self) -> String {
        self.clone()
    }

    fn from_text(text: &str) -> Self {
        text.to_string()
    }
}

impl InfoSetKey for u64 {
    fn from_node<N: GameNode>(node: &N) -> Result<Self, GameError> {
        node.info_set_hash()
    }

    fn to_text(&self) -> String {
        self.to_string()
    }

    /// Decimal text parses back to the same hash. Any other text is treated
    /// as an exact string key and hashed the way the default
    /// [`GameNode::info_set_hash`] does, so string-keyed snapshots of games on
    /// the default hash load into a hashed store. Games with their own hash
    /// need [`InfoSetStore::rekey_with`](crate::cfr::InfoSetStore::rekey_with).
    fn from_text(text: &str) -> Self {
        text.parse().unwrap_or_else(|_| hash_key(text))
    }
}

/// Hash an exact key into its fixed-width form.
///
/// FxHash has no per-process seed, so the value is stable across runs.
pub fn hash_key(key: &str) -> u64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

/// Convert a key between encodings through its text form.
pub fn convert_key<From: InfoSetKey, To: InfoSetKey>(key: &From) -> To {
    To::from_text(&key.to_text())
}
