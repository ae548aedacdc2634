//! Monte Carlo chance resolution.
//!
//! [`MonteCarloNode`] wraps a node and, if it is a chance node, immediately
//! picks one outcome, repeating until it reaches a Decision or Terminal node.
//! The engine then sees a tree without chance branching. Outcomes come from a
//! queue of preselected actions first, then from a weighted draw seeded with
//! the wrapper's seed, so a path is reproducible from `(seed, queue)`.

use std::collections::VecDeque;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cfr::game::{ActionId, GameError, GameNode, Node};

/// A node whose chance layers have been sampled away.
#[derive(Debug, Clone)]
pub struct MonteCarloNode<N: GameNode> {
    /// The resolved node, never of kind Chance.
    node: N,
    /// Outcomes still to be used by chance nodes below this one.
    preselected: VecDeque<ActionId>,
    seed: u64,
    /// Chance outcomes taken while resolving this node.
    resolved: Vec<ActionId>,
}

impl<N: GameNode> MonteCarloNode<N> {
    /// Wrap `node`, sampling every chance outcome from `seed`.
    pub fn new(node: N, seed: u64) -> Result<Self, GameError> {
        Self::with_preselected(node, VecDeque::new(), seed)
    }

    /// Wrap `node`, taking chance outcomes from `preselected` in order before
    /// falling back to sampling.
    ///
    /// A preselected outcome that isn't legal at its chance node is an error.
    pub fn with_preselected(node: N, mut preselected: VecDeque<ActionId>, seed: u64) -> Result<Self, GameError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut resolved = Vec::new();
        let mut node = node;

        loop {
            let next = match node.node() {
                Node::Chance {
                    actions,
                    probabilities,
                } => {
                    let action = match preselected.pop_front() {
                        Some(action) if actions.contains(&action) => action,
                        Some(action) => return Err(GameError::illegal::<N>(action)),
                        None => {
                            let distribution = WeightedIndex::new(probabilities)
                                .map_err(|e| GameError::invalid_chance::<N>(e.to_string()))?;
                            *actions
                                .get(distribution.sample(&mut rng))
                                .ok_or_else(|| GameError::invalid_chance::<N>("fewer actions than probabilities"))?
                        }
                    };
                    log::trace!("resolved chance {} -> {}", node.describe(), node.action_label(action));
                    resolved.push(action);
                    node.apply_action(action)?
                }
                _ => break,
            };
            node = next;
        }

        Ok(Self {
            node,
            preselected,
            seed,
            resolved,
        })
    }

    /// Wrap `node` with a seed drawn from the OS.
    pub fn from_entropy(node: N) -> Result<Self, GameError> {
        Self::new(node, rand::random())
    }

    /// Seed used for sampling.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The resolved node.
    pub fn inner(&self) -> &N {
        &self.node
    }

    /// Chance outcomes taken to reach the resolved node, in order.
    pub fn resolved(&self) -> &[ActionId] {
        &self.resolved
    }

    /// Preselected outcomes not yet used.
    pub fn preselected(&self) -> &VecDeque<ActionId> {
        &self.preselected
    }
}

impl<N: GameNode> GameNode for MonteCarloNode<N> {
    fn node(&self) -> Node<'_> {
        self.node.node()
    }

    fn apply_action(&self, action: ActionId) -> Result<Self, GameError> {
        let child = self.node.apply_action(action)?;
        Self::with_preselected(child, self.preselected.clone(), self.seed)
    }

    fn info_set_key(&self) -> Result<String, GameError> {
        self.node.info_set_key()
    }

    fn info_set_hash(&self) -> Result<u64, GameError> {
        self.node.info_set_hash()
    }

    fn action_label(&self, action: ActionId) -> String {
        self.node.action_label(action)
    }

    fn describe(&self) -> String {
        self.node.describe()
    }
}
