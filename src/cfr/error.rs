//! Error types for the solver.

use thiserror::Error;

use crate::cfr::config::ConfigError;
use crate::cfr::game::GameError;
use crate::cfr::persist::PersistError;

/// Errors raised by the store and the engines.
#[derive(Debug, Error)]
pub enum CfrError {
    /// A game node broke its contract.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A key was looked up that the store doesn't hold.
    ///
    /// Usually a stale key, or a query before the discovery pass. The store
    /// never invents an entry in this case.
    #[error("info set not found: {0:?}")]
    InfoSetNotFound(String),

    /// A loaded store holds a key the game tree never reaches.
    ///
    /// Usually a snapshot from another game, or one whose keys were
    /// converted without the tree (see
    /// [`InfoSetStore::rekey_with`](crate::cfr::InfoSetStore::rekey_with)).
    #[error("info set {0:?} is not reachable from the root")]
    UnreachableInfoSet(String),

    /// Two nodes with the same key disagree on the number of actions.
    #[error("info set {key:?} has {found} actions, expected {expected}")]
    ActionCountMismatch {
        /// Text form of the key.
        key: String,
        /// Action count stored for the key.
        expected: usize,
        /// Action count of the node just visited.
        found: usize,
    },

    /// The solver configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading or writing a snapshot failed.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Result alias for solver operations.
pub type Result<T, E = CfrError> = std::result::Result<T, E>;
