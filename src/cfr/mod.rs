//! CFR+ (Counterfactual Regret Minimization) Solver Module.
//!
//! This module provides a generic implementation of CFR+ for computing Nash
//! equilibrium strategies in extensive-form games with imperfect information.
//!
//! # Overview
//!
//! CFR+ is an iterative algorithm that converges to Nash equilibrium by:
//! 1. Computing counterfactual regret for each action at each decision point
//! 2. Clipping cumulative regret at zero and playing in proportion to it
//! 3. Averaging strategies across iterations to converge to equilibrium
//!
//! # Usage
//!
//! 1. Implement [`GameNode`] for your game's tree nodes
//! 2. Create a [`CfrPlus`] (two players) or [`MultiwayCfrPlus`] (any number)
//! 3. Call `train()` to run iterations
//! 4. Read strategies with `average_strategy()`
//!
//! # Example
//!
//! ```
//! use cfr_plus::cfr::{CfrConfig, CfrPlus};
//! use cfr_plus::games::kuhn::KuhnNode;
//!
//! let mut solver: CfrPlus<KuhnNode> = CfrPlus::new(KuhnNode::root(), CfrConfig::default()).unwrap();
//! let stats = solver.train(1_000).unwrap();
//! println!("Trained {} info sets in {:.2}s", stats.info_sets, stats.elapsed_seconds);
//!
//! // Player 1 holding the Jack, first to act
//! let strategy = solver.average_strategy(&"0:".to_string()).unwrap();
//! println!("Strategy: {:?}", strategy);
//! ```
//!
//! # Theory
//!
//! **Regret**: The difference between the value of an action and the value of the current strategy.
//! ```text
//! Regret(a) = Value(a) - Value(current_strategy)
//! ```
//!
//! **CFR+ update**: regrets are weighted by the opponents' and chance's reach,
//! then clipped.
//! ```text
//! R(a) = max(0, R(a) + reach_others * Regret(a))
//! ```
//!
//! With `use_cfr_plus` off the engines run plain CFR: the `max` is dropped
//! and only regret matching takes the positive part.
//!
//! **Convergence**: the average strategy, weighted by the acting player's own
//! reach, converges to a Nash equilibrium in two-player zero-sum games.
//!
//! # References
//!
//! - Zinkevich, M., et al. "Regret Minimization in Games with Incomplete Information" (2007)
//! - Tammelin, O. "Solving Large Imperfect Information Games Using CFR+" (2014)

pub mod config;
pub mod error;
pub mod evaluate;
pub mod game;
pub mod key;
pub mod multiway;
pub mod persist;
pub mod regret;
pub mod solver;
pub mod storage;

// Re-export main types for convenient access
pub use config::{CfrConfig, CfrStats, ConfigError};
pub use error::{CfrError, Result};
pub use evaluate::{evaluate_average_strategy, expected_utilities};
pub use game::{ActionId, GameError, GameNode, Node, NodeKind, PlayerId};
pub use key::{convert_key, hash_key, InfoSetKey};
pub use multiway::MultiwayCfrPlus;
pub use persist::{load_stats, load_store, merge, save_stats, save_store, PersistError, Snapshot};
pub use regret::{epsilon_soft, normalize, regret_match};
pub use solver::CfrPlus;
pub use storage::{InfoSet, InfoSetStore, RegretMetric};
