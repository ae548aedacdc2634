//! Node wrappers that change how the engines see a game tree.
//!
//! - [`MonteCarloNode`]: samples chance outcomes instead of expanding them
//! - [`RandomizedNode`]: puts a random-play branch in front of every decision
//!
//! Both implement [`GameNode`](crate::cfr::GameNode) themselves and re-wrap
//! every child they produce, so they compose with each other and with any
//! game.

pub mod monte_carlo;
pub mod randomizer;

pub use monte_carlo::MonteCarloNode;
pub use randomizer::{RandomizedNode, RandomizerConfig, NON_RANDOM, RANDOM};
