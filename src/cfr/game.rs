//! Game-tree node contract for the CFR engines.
//!
//! Any game that implements [`GameNode`] can be solved. A node is an immutable
//! value: [`GameNode::apply_action`] builds the child and never touches the
//! receiver, so subtrees can be shared freely between iterations.
//!
//! The three node kinds form a closed set, exposed through the [`Node`] view:
//!
//! ```text
//! Terminal { utilities }              game over, one payoff per player
//! Chance   { actions, probabilities } nature moves with fixed odds
//! Decision { actions, player }        a player moves from an information set
//! ```
//!
//! Only Chance and Decision nodes have children, and only Decision nodes carry
//! an information-set key. Asking a node for something its kind doesn't have
//! yields [`GameError::WrongNodeKind`].

use std::any::type_name;
use std::fmt::{self, Debug};

use thiserror::Error;

use crate::cfr::key::hash_key;

/// Identifier of an action, meaningful only relative to one node.
pub type ActionId = usize;

/// Index of a player (0-indexed).
pub type PlayerId = usize;

/// Kind tag of a game node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Leaf with fixed utilities.
    Terminal,
    /// Random event with a probability per outcome.
    Chance,
    /// A player to move.
    Decision,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Terminal => write!(f, "Terminal"),
            NodeKind::Chance => write!(f, "Chance"),
            NodeKind::Decision => write!(f, "Decision"),
        }
    }
}

/// Borrowed view of a node's kind-specific data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    /// Final payoffs, one per player.
    Terminal {
        /// Utility for each player.
        utilities: &'a [f64],
    },
    /// Nature's move. `probabilities[i]` belongs to `actions[i]`.
    Chance {
        /// Possible outcomes.
        actions: &'a [ActionId],
        /// Probability of each outcome, summing to 1.
        probabilities: &'a [f64],
    },
    /// A player's move.
    Decision {
        /// Legal actions, in a fixed order per information set.
        actions: &'a [ActionId],
        /// The player to act.
        player: PlayerId,
    },
}

impl<'a> Node<'a> {
    /// The kind tag of this view.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Terminal { .. } => NodeKind::Terminal,
            Node::Chance { .. } => NodeKind::Chance,
            Node::Decision { .. } => NodeKind::Decision,
        }
    }

    /// Legal actions for Chance and Decision nodes, `None` for Terminal.
    pub fn actions(&self) -> Option<&'a [ActionId]> {
        match *self {
            Node::Terminal { .. } => None,
            Node::Chance { actions, .. } | Node::Decision { actions, .. } => Some(actions),
        }
    }

    /// Terminal utilities, `None` for other kinds.
    pub fn utilities(&self) -> Option<&'a [f64]> {
        match *self {
            Node::Terminal { utilities } => Some(utilities),
            _ => None,
        }
    }
}

/// Errors raised by game nodes.
///
/// These are programmer errors in a game implementation (or a wrapper); the
/// engines abort the current pass when they see one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// An operation was called on a node kind that doesn't support it.
    #[error("node of type {node} ({kind}) does not implement {operation}()")]
    WrongNodeKind {
        /// Concrete Rust type of the node.
        node: &'static str,
        /// Kind of the node.
        kind: NodeKind,
        /// Operation attempted.
        operation: &'static str,
    },

    /// A hook required for this node kind was left at its default.
    #[error("node of type {node} is missing an implementation for {operation}()")]
    MissingImplementation {
        /// Concrete Rust type of the node.
        node: &'static str,
        /// Operation attempted.
        operation: &'static str,
    },

    /// An action outside the node's legal set was applied.
    #[error("action {action} is not legal at node of type {node}")]
    IllegalAction {
        /// Concrete Rust type of the node.
        node: &'static str,
        /// The rejected action.
        action: ActionId,
    },

    /// A Chance or Decision node exposed no actions.
    #[error("node of type {node} ({kind}) has no legal actions")]
    NoLegalActions {
        /// Concrete Rust type of the node.
        node: &'static str,
        /// Kind of the node.
        kind: NodeKind,
    },

    /// A chance distribution is malformed.
    #[error("chance node of type {node} has invalid probabilities: {reason}")]
    InvalidChance {
        /// Concrete Rust type of the node.
        node: &'static str,
        /// What is wrong with the distribution.
        reason: String,
    },

    /// A terminal node returned the wrong number of utilities.
    #[error("terminal node of type {node} has {found} utilities, expected {expected}")]
    UtilityLength {
        /// Concrete Rust type of the node.
        node: &'static str,
        /// Number of players the engine was built for.
        expected: usize,
        /// Number of utilities the node returned.
        found: usize,
    },

    /// A decision node named a player the engine doesn't track.
    #[error("node of type {node} is owned by player {player}, but the game has {num_players} players")]
    PlayerOutOfRange {
        /// Concrete Rust type of the node.
        node: &'static str,
        /// The offending player index.
        player: PlayerId,
        /// Number of players the engine was built for.
        num_players: usize,
    },
}

impl GameError {
    /// `WrongNodeKind` for node type `N`.
    pub fn wrong_kind<N: ?Sized>(kind: NodeKind, operation: &'static str) -> Self {
        GameError::WrongNodeKind {
            node: type_name::<N>(),
            kind,
            operation,
        }
    }

    /// `MissingImplementation` for node type `N`.
    pub fn missing<N: ?Sized>(operation: &'static str) -> Self {
        GameError::MissingImplementation {
            node: type_name::<N>(),
            operation,
        }
    }

    /// `IllegalAction` for node type `N`.
    pub fn illegal<N: ?Sized>(action: ActionId) -> Self {
        GameError::IllegalAction {
            node: type_name::<N>(),
            action,
        }
    }

    /// `InvalidChance` for node type `N`.
    pub fn invalid_chance<N: ?Sized>(reason: impl Into<String>) -> Self {
        GameError::InvalidChance {
            node: type_name::<N>(),
            reason: reason.into(),
        }
    }
}

/// Tolerance used when checking that chance probabilities sum to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// A node of an extensive-form game tree.
///
/// Implementors provide [`node`](GameNode::node) and
/// [`apply_action`](GameNode::apply_action); Decision nodes must also provide
/// [`info_set_key`](GameNode::info_set_key). Two nodes the acting player
/// cannot tell apart must return the same key and the same action list.
///
/// # Example
/// ```ignore
/// #[derive(Debug, Clone)]
/// struct Coin { flipped: Option<ActionId> }
///
/// impl GameNode for Coin {
///     fn node(&self) -> Node<'_> {
///         match self.flipped {
///             None => Node::Chance { actions: &[0, 1], probabilities: &[0.5, 0.5] },
///             Some(0) => Node::Terminal { utilities: &[1.0, -1.0] },
///             Some(_) => Node::Terminal { utilities: &[-1.0, 1.0] },
///         }
///     }
///
///     fn apply_action(&self, action: ActionId) -> Result<Self, GameError> {
///         Ok(Coin { flipped: Some(action) })
///     }
/// }
/// ```
pub trait GameNode: Clone + Debug {
    /// Kind-specific view of this node.
    fn node(&self) -> Node<'_>;

    /// Build the child reached by `action`. Must not mutate `self`.
    ///
    /// Total over the node's legal actions; Terminal nodes return
    /// [`GameError::WrongNodeKind`].
    fn apply_action(&self, action: ActionId) -> Result<Self, GameError>;

    /// Exact information-set key of a Decision node.
    fn info_set_key(&self) -> Result<String, GameError> {
        Err(unsupported::<Self>(self.kind(), NodeKind::Decision, "info_set_key"))
    }

    /// Fixed-width information-set key of a Decision node.
    ///
    /// Defaults to a hash of [`info_set_key`](GameNode::info_set_key). Games
    /// may override it with a cheaper encoding as long as it separates the
    /// same information sets.
    fn info_set_hash(&self) -> Result<u64, GameError> {
        self.info_set_key().map(|key| hash_key(&key))
    }

    /// Human-readable action name, used in logs.
    fn action_label(&self, action: ActionId) -> String {
        action.to_string()
    }

    /// Human-readable node description, used in logs.
    fn describe(&self) -> String {
        format!("{:?}", self)
    }

    /// Kind tag of this node.
    fn kind(&self) -> NodeKind {
        self.node().kind()
    }
}

/// Error for an optional hook left at its default: "missing" when the node is
/// of the kind the hook belongs to, "wrong kind" otherwise.
pub fn unsupported<N: ?Sized>(kind: NodeKind, owner: NodeKind, operation: &'static str) -> GameError {
    if kind == owner {
        GameError::missing::<N>(operation)
    } else {
        GameError::wrong_kind::<N>(kind, operation)
    }
}

/// Check a chance distribution: same length as the actions, non-negative,
/// summing to one within [`PROBABILITY_TOLERANCE`].
pub fn validate_chance<N: ?Sized>(actions: &[ActionId], probabilities: &[f64]) -> Result<(), GameError> {
    if actions.is_empty() {
        return Err(GameError::NoLegalActions {
            node: type_name::<N>(),
            kind: NodeKind::Chance,
        });
    }
    if actions.len() != probabilities.len() {
        return Err(GameError::invalid_chance::<N>(format!(
            "{} actions but {} probabilities",
            actions.len(),
            probabilities.len()
        )));
    }
    if let Some(p) = probabilities.iter().find(|p| !(**p >= 0.0)) {
        return Err(GameError::invalid_chance::<N>(format!("probability {} is not a non-negative number", p)));
    }
    let total: f64 = probabilities.iter().sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(GameError::invalid_chance::<N>(format!("probabilities sum to {}", total)));
    }
    Ok(())
}
