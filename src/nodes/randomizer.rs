//! Decision randomization.
//!
//! [`RandomizedNode`] wraps a game tree so that every decision is preceded by
//! a synthetic chance node:
//!
//! ```text
//! Entry (chance)
//! ├── NON_RANDOM (1 - p) → Deliberate: the original decision, same key
//! └── RANDOM     (p)     → Random (chance): uniform over ≤ M legal actions
//! ```
//!
//! Children are wrapped again, so the substitution applies through the whole
//! subtree. Chance and terminal nodes pass through unchanged. Info set keys
//! are only exposed by `Deliberate` nodes and are exactly the wrapped game's
//! keys, so a store discovered on the plain game fits the randomized one.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::cfr::config::ConfigError;
use crate::cfr::game::{unsupported, ActionId, GameError, GameNode, Node, NodeKind};

/// Entry action that keeps the original decision.
pub const NON_RANDOM: ActionId = 0;

/// Entry action that replaces the decision with a random choice.
pub const RANDOM: ActionId = 1;

const ENTRY_ACTIONS: [ActionId; 2] = [NON_RANDOM, RANDOM];

/// Settings for the randomization wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizerConfig {
    /// Probability that a decision is replaced by a random choice.
    pub p_random: f64,

    /// Maximum number of candidate actions for a random choice. `None` uses
    /// every legal action.
    pub max_random_actions: Option<usize>,

    /// Seed for picking candidate actions.
    pub seed: u64,
}

impl Default for RandomizerConfig {
    fn default() -> Self {
        Self {
            p_random: 0.1,
            max_random_actions: None,
            seed: 0,
        }
    }
}

impl RandomizerConfig {
    /// Create a new RandomizerConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the random choice probability.
    pub fn with_p_random(mut self, p: f64) -> Self {
        self.p_random = p;
        self
    }

    /// Builder method: set the candidate limit.
    pub fn with_max_random_actions(mut self, max: usize) -> Self {
        self.max_random_actions = Some(max);
        self
    }

    /// Builder method: set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.p_random) {
            return Err(ConfigError::InvalidRandomProbability(self.p_random));
        }
        if self.max_random_actions == Some(0) {
            return Err(ConfigError::InvalidMaxRandomActions);
        }
        Ok(())
    }
}

/// A node of a randomized game tree.
#[derive(Debug, Clone)]
pub enum RandomizedNode<N: GameNode> {
    /// Chance node in front of a decision: keep it or randomize it.
    Entry {
        /// The wrapped decision.
        inner: N,
        /// `[1 - p, p]`.
        probabilities: [f64; 2],
        /// Wrapper settings.
        config: RandomizerConfig,
    },
    /// The wrapped decision, played as usual.
    Deliberate {
        /// The wrapped decision.
        inner: N,
        /// Wrapper settings.
        config: RandomizerConfig,
    },
    /// Chance node choosing uniformly among candidate actions.
    Random {
        /// The wrapped decision.
        inner: N,
        /// Candidate actions, a subset of the decision's legal actions.
        candidates: Vec<ActionId>,
        /// Uniform probabilities over `candidates`.
        probabilities: Vec<f64>,
        /// Wrapper settings.
        config: RandomizerConfig,
    },
    /// A chance node of the wrapped game.
    Chance {
        /// The wrapped chance node.
        inner: N,
        /// Wrapper settings.
        config: RandomizerConfig,
    },
    /// A terminal node of the wrapped game.
    Terminal {
        /// The wrapped terminal node.
        inner: N,
    },
}

impl<N: GameNode> RandomizedNode<N> {
    /// Wrap the root of a game after validating `config`.
    pub fn root(node: N, config: RandomizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::wrap(node, config))
    }

    /// Wrap a node according to its kind.
    pub fn wrap(node: N, config: RandomizerConfig) -> Self {
        match node.kind() {
            NodeKind::Decision => RandomizedNode::Entry {
                inner: node,
                probabilities: [1.0 - config.p_random, config.p_random],
                config,
            },
            NodeKind::Chance => RandomizedNode::Chance { inner: node, config },
            NodeKind::Terminal => RandomizedNode::Terminal { inner: node },
        }
    }

    /// The wrapped node.
    pub fn inner(&self) -> &N {
        match self {
            RandomizedNode::Entry { inner, .. }
            | RandomizedNode::Deliberate { inner, .. }
            | RandomizedNode::Random { inner, .. }
            | RandomizedNode::Chance { inner, .. }
            | RandomizedNode::Terminal { inner } => inner,
        }
    }

    fn randomize(inner: &N, config: RandomizerConfig) -> Result<Self, GameError> {
        let actions = match inner.node() {
            Node::Decision { actions, .. } => actions,
            other => return Err(GameError::wrong_kind::<N>(other.kind(), "randomize")),
        };

        let candidates: Vec<ActionId> = match config.max_random_actions {
            Some(max) if max < actions.len() => {
                // Same candidates every time this decision is visited
                let mut rng = StdRng::seed_from_u64(config.seed ^ inner.info_set_hash()?);
                actions.choose_multiple(&mut rng, max).copied().collect()
            }
            _ => actions.to_vec(),
        };
        if candidates.is_empty() {
            return Err(GameError::NoLegalActions {
                node: std::any::type_name::<N>(),
                kind: NodeKind::Decision,
            });
        }
        let probabilities = vec![1.0 / candidates.len() as f64; candidates.len()];

        Ok(RandomizedNode::Random {
            inner: inner.clone(),
            candidates,
            probabilities,
            config,
        })
    }
}

impl<N: GameNode> GameNode for RandomizedNode<N> {
    fn node(&self) -> Node<'_> {
        match self {
            RandomizedNode::Entry { probabilities, .. } => Node::Chance {
                actions: &ENTRY_ACTIONS,
                probabilities,
            },
            RandomizedNode::Random {
                candidates,
                probabilities,
                ..
            } => Node::Chance {
                actions: candidates,
                probabilities,
            },
            RandomizedNode::Deliberate { inner, .. }
            | RandomizedNode::Chance { inner, .. }
            | RandomizedNode::Terminal { inner } => inner.node(),
        }
    }

    fn apply_action(&self, action: ActionId) -> Result<Self, GameError> {
        match self {
            RandomizedNode::Entry { inner, config, .. } => match action {
                NON_RANDOM => Ok(RandomizedNode::Deliberate {
                    inner: inner.clone(),
                    config: *config,
                }),
                RANDOM => Self::randomize(inner, *config),
                _ => Err(GameError::illegal::<Self>(action)),
            },
            RandomizedNode::Random {
                inner,
                candidates,
                config,
                ..
            } => {
                if !candidates.contains(&action) {
                    return Err(GameError::illegal::<Self>(action));
                }
                Ok(Self::wrap(inner.apply_action(action)?, *config))
            }
            RandomizedNode::Deliberate { inner, config } | RandomizedNode::Chance { inner, config } => {
                Ok(Self::wrap(inner.apply_action(action)?, *config))
            }
            RandomizedNode::Terminal { .. } => Err(GameError::wrong_kind::<Self>(NodeKind::Terminal, "apply_action")),
        }
    }

    fn info_set_key(&self) -> Result<String, GameError> {
        match self {
            RandomizedNode::Deliberate { inner, .. } => inner.info_set_key(),
            other => Err(unsupported::<Self>(other.kind(), NodeKind::Decision, "info_set_key")),
        }
    }

    fn info_set_hash(&self) -> Result<u64, GameError> {
        match self {
            RandomizedNode::Deliberate { inner, .. } => inner.info_set_hash(),
            other => Err(unsupported::<Self>(other.kind(), NodeKind::Decision, "info_set_hash")),
        }
    }

    fn action_label(&self, action: ActionId) -> String {
        match self {
            RandomizedNode::Entry { .. } if action == NON_RANDOM => "non-random".to_string(),
            RandomizedNode::Entry { .. } if action == RANDOM => "random".to_string(),
            other => other.inner().action_label(action),
        }
    }

    fn describe(&self) -> String {
        let tag = match self {
            RandomizedNode::Entry { .. } => "entry",
            RandomizedNode::Deliberate { .. } => "deliberate",
            RandomizedNode::Random { .. } => "random",
            RandomizedNode::Chance { .. } => "chance",
            RandomizedNode::Terminal { .. } => "terminal",
        };
        format!("[{}] {}", tag, self.inner().describe())
    }
}
