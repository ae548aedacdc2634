//! # CFR+
//!
//! A Counterfactual Regret Minimization (CFR+) solver for computing Nash
//! equilibrium strategies in extensive-form games with imperfect information.
//!
//! ## Features
//!
//! - **Generic Game Trees**: Works with any tree implementing [`GameNode`]
//! - **Two Key Encodings**: Exact string keys or fixed-width `u64` hashes
//! - **Two Engines**: Two-player zero-sum ([`CfrPlus`]) and n-player ([`MultiwayCfrPlus`])
//! - **Tree Wrappers**: Monte Carlo chance sampling and decision randomization
//! - **Checkpointing**: Save and resume regret and strategy sums
//!
//! ## Quick Start
//!
//! ```
//! use cfr_plus::cfr::{CfrConfig, CfrPlus};
//! use cfr_plus::games::kuhn::KuhnNode;
//!
//! // 1. Build the root of your game tree
//! // 2. Create a solver (discovers every info set)
//! let mut solver: CfrPlus<KuhnNode> = CfrPlus::new(KuhnNode::root(), CfrConfig::default()).unwrap();
//!
//! // 3. Train
//! solver.train(1_000).unwrap();
//!
//! // 4. Get strategies
//! let strategy = solver.average_strategy(&"2:b".to_string()).unwrap();
//! assert!(strategy[1] > 0.9);
//! ```
//!
//! ## Modules
//!
//! - [`cfr`]: Core CFR+ algorithm, info set store and persistence
//! - [`nodes`]: Wrappers that transform a game tree
//! - [`games`]: Example game implementations (Kuhn Poker, tic-tac-toe)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    CFR+ Engine (Generic)                        │
//! │  - Discovery pass         - Regret / strategy accumulation      │
//! │  - Instant regret metric  - Snapshot save / load                │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ walks GameNode trees
//!                               ▼
//!         ┌─────────────────────┼─────────────────────┐
//!         │                     │                     │
//!         ▼                     ▼                     ▼
//!    ┌─────────┐         ┌─────────────┐       ┌─────────────┐
//!    │  Kuhn   │         │ Tic-tac-toe │       │  Wrappers   │
//!    │  Poker  │         │ (+symmetric)│       │ (MC, random)│
//!    └─────────┘         └─────────────┘       └─────────────┘
//! ```

#![warn(missing_docs)]

/// CFR+ (Counterfactual Regret Minimization) solver module.
///
/// This is the core module containing the generic CFR+ algorithm.
pub mod cfr;

/// Game-tree wrappers.
///
/// Monte Carlo chance resolution and decision randomization.
pub mod nodes;

/// Game implementations module.
///
/// Contains example games like Kuhn Poker for testing and validation.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use cfr::{CfrConfig, CfrError, CfrPlus, CfrStats, GameNode, InfoSetKey, InfoSetStore, MultiwayCfrPlus, Node};
pub use nodes::{MonteCarloNode, RandomizedNode, RandomizerConfig};
