//! Two-player zero-sum CFR+ solver.
//!
//! Every iteration walks the full game tree once:
//! - **Terminal**: return player 0's utility
//! - **Chance**: expectation over outcomes, chance reach multiplied in
//! - **Decision**: recurse under the regret-matching strategy, record the
//!   instantaneous regret of each action, and (when enabled) accumulate
//!   regrets and the average strategy in place
//!
//! Utilities are carried from player 0's perspective, so player 1's regrets
//! are negated.

use std::time::Instant;

use crate::cfr::config::{CfrConfig, CfrStats};
use crate::cfr::error::{CfrError, Result};
use crate::cfr::game::{ActionId, GameError, GameNode, Node, PlayerId};
use crate::cfr::key::InfoSetKey;
use crate::cfr::regret::epsilon_soft;
use crate::cfr::storage::{InfoSetStore, RegretMetric};

const NUM_PLAYERS: usize = 2;

/// CFR+ solver for two-player zero-sum games.
///
/// # Type Parameters
/// - `N`: root node type
/// - `K`: info set key encoding (`String` or `u64`)
///
/// # Example
/// ```
/// use cfr_plus::cfr::{CfrConfig, CfrPlus};
/// use cfr_plus::games::kuhn::KuhnNode;
///
/// let mut solver: CfrPlus<KuhnNode> = CfrPlus::new(KuhnNode::root(), CfrConfig::default()).unwrap();
/// solver.train(100).unwrap();
///
/// let strategy = solver.average_strategy(&"0:".to_string()).unwrap();
/// assert_eq!(strategy.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CfrPlus<N: GameNode, K: InfoSetKey = String> {
    /// Root of the game tree.
    root: N,

    /// Configuration for the solver.
    config: CfrConfig,

    /// Regrets and strategy sums.
    store: InfoSetStore<K>,

    /// Number of accumulating passes completed.
    iteration: u64,

    /// Statistics tracking.
    stats: CfrStats,
}

impl<N: GameNode, K: InfoSetKey> CfrPlus<N, K> {
    /// Create a solver with a fresh store.
    ///
    /// Discovers every info set reachable from `root`, then runs the
    /// initialization pass if `config.initial_evaluation` is set.
    pub fn new(root: N, config: CfrConfig) -> Result<Self> {
        Self::with_store(root, config, InfoSetStore::new())
    }

    /// Create a solver that continues from an existing store.
    ///
    /// Keys missing from `store` are discovered; existing entries keep their
    /// sums (clipped at zero under CFR+). A stored key the tree never reaches
    /// is an [`UnreachableInfoSet`](CfrError::UnreachableInfoSet) error.
    pub fn with_store(root: N, config: CfrConfig, mut store: InfoSetStore<K>) -> Result<Self> {
        config.validate()?;
        store.discover_with(&root, config.initial_regret)?;
        check_reachable(&store, &root, NUM_PLAYERS)?;
        if config.use_cfr_plus {
            store.clip_regrets();
        }

        let mut solver = Self {
            root,
            config,
            store,
            iteration: 0,
            stats: CfrStats::new(),
        };
        solver.stats.info_sets = solver.store.len();

        if solver.config.initial_evaluation {
            solver.evaluate()?;
        }

        Ok(solver)
    }

    /// Run one pass from the root.
    ///
    /// Returns the root utility for player 0 under the current strategy.
    pub fn iterate(&mut self, accumulate_regret: bool, accumulate_strategy: bool) -> Result<f64> {
        // The root tree was checked when the solver was built
        let mut pass = Pass {
            store: &mut self.store,
            epsilon: self.config.epsilon,
            use_cfr_plus: self.config.use_cfr_plus,
            accumulate_regret,
            accumulate_strategy,
        };
        let value = pass.traverse(&self.root, [1.0; NUM_PLAYERS], 1.0)?;
        self.finish_pass(value, accumulate_regret || accumulate_strategy);
        Ok(value)
    }

    /// Run one pass from another root over the same store.
    ///
    /// Used with wrappers that change per iteration, such as a
    /// [`MonteCarloNode`](crate::nodes::MonteCarloNode) with a fresh seed.
    /// Every key reachable from `root` must already be in the store. The
    /// tree is checked before anything is written, so a failed call leaves
    /// the store and the iteration count untouched.
    pub fn iterate_from<M: GameNode>(
        &mut self,
        root: &M,
        accumulate_regret: bool,
        accumulate_strategy: bool,
    ) -> Result<f64> {
        self.store.verify(root, NUM_PLAYERS)?;
        let mut pass = Pass {
            store: &mut self.store,
            epsilon: self.config.epsilon,
            use_cfr_plus: self.config.use_cfr_plus,
            accumulate_regret,
            accumulate_strategy,
        };
        let value = pass.traverse(root, [1.0; NUM_PLAYERS], 1.0)?;
        self.finish_pass(value, accumulate_regret || accumulate_strategy);
        Ok(value)
    }

    /// Run a pass that only refreshes instantaneous regrets.
    pub fn evaluate(&mut self) -> Result<f64> {
        self.iterate(false, false)
    }

    /// Train the solver for a specified number of iterations.
    ///
    /// Regrets are always accumulated; the average strategy only once
    /// `config.strategy_delay` iterations have completed.
    pub fn train(&mut self, iterations: u64) -> Result<&CfrStats> {
        self.train_with_callback(iterations, 0, |_| {})
    }

    /// Train with a callback for progress tracking.
    ///
    /// # Arguments
    /// * `iterations` - Number of iterations to run
    /// * `callback_interval` - How often to call the callback (0 = never)
    /// * `callback` - Function called every `callback_interval` iterations
    pub fn train_with_callback<F>(
        &mut self,
        iterations: u64,
        callback_interval: u64,
        callback: F,
    ) -> Result<&CfrStats>
    where
        F: FnMut(&CfrStats),
    {
        self.run_training(iterations, None::<fn(&N, u64) -> Result<N, GameError>>, callback_interval, callback)
    }

    /// Train on a freshly sampled tree every iteration.
    ///
    /// `sample` receives the root and the current iteration count (a
    /// natural seed offset) and returns the tree for that iteration, for
    /// example a [`MonteCarloNode`](crate::nodes::MonteCarloNode). Each pass
    /// goes through [`iterate_from`](CfrPlus::iterate_from); stats and the
    /// strategy delay behave as in
    /// [`train_with_callback`](CfrPlus::train_with_callback).
    pub fn train_sampled<M, S, F>(
        &mut self,
        iterations: u64,
        sample: S,
        callback_interval: u64,
        callback: F,
    ) -> Result<&CfrStats>
    where
        M: GameNode,
        S: FnMut(&N, u64) -> Result<M, GameError>,
        F: FnMut(&CfrStats),
    {
        self.run_training(iterations, Some(sample), callback_interval, callback)
    }

    fn run_training<M, S, F>(
        &mut self,
        iterations: u64,
        mut sample: Option<S>,
        callback_interval: u64,
        mut callback: F,
    ) -> Result<&CfrStats>
    where
        M: GameNode,
        S: FnMut(&N, u64) -> Result<M, GameError>,
        F: FnMut(&CfrStats),
    {
        log::info!(
            "training {} iterations over {} info sets (starting at iteration {})",
            iterations,
            self.store.len(),
            self.iteration
        );
        let start_time = Instant::now();
        let base_elapsed = self.stats.elapsed_seconds;

        for i in 0..iterations {
            let accumulate_strategy = self.iteration >= self.config.strategy_delay;
            match sample.as_mut() {
                Some(sample) => {
                    let tree = sample(&self.root, self.iteration)?;
                    self.iterate_from(&tree, true, accumulate_strategy)?;
                }
                None => {
                    self.iterate(true, accumulate_strategy)?;
                }
            }

            if callback_interval > 0 && (i + 1) % callback_interval == 0 {
                self.stats.elapsed_seconds = base_elapsed + start_time.elapsed().as_secs_f64();
                self.stats.update_rate();
                log::debug!("iteration {}: {}", self.iteration, self.store.metric());
                callback(&self.stats);
            }
        }

        self.stats.elapsed_seconds = base_elapsed + start_time.elapsed().as_secs_f64();
        self.stats.update_rate();
        log::info!(
            "finished at iteration {} in {:.2}s ({:.0} it/s)",
            self.iteration,
            self.stats.elapsed_seconds,
            self.stats.iterations_per_second
        );

        Ok(&self.stats)
    }

    fn finish_pass(&mut self, value: f64, accumulated: bool) {
        if accumulated {
            self.iteration += 1;
        }
        self.stats.iterations = self.iteration;
        self.stats.info_sets = self.store.len();
        self.stats.root_utilities = vec![value, -value];
    }

    /// Average strategy at an info set, the equilibrium approximation.
    pub fn average_strategy(&self, key: &K) -> Result<Vec<f64>> {
        Ok(self.store.get(key)?.average_strategy())
    }

    /// Current regret-matching strategy at an info set.
    pub fn current_strategy(&self, key: &K) -> Result<Vec<f64>> {
        Ok(self.store.get(key)?.current_strategy().to_vec())
    }

    /// Instantaneous-regret statistics from the latest pass.
    pub fn metric(&self) -> RegretMetric {
        self.store.metric()
    }

    /// Get the current iteration count.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Restore the iteration count of a resumed run, so the strategy delay
    /// is not applied a second time.
    pub fn set_iteration(&mut self, iteration: u64) {
        self.iteration = iteration;
        self.stats.iterations = iteration;
    }

    /// Get current statistics.
    pub fn stats(&self) -> &CfrStats {
        &self.stats
    }

    /// Get reference to the store for analysis.
    pub fn store(&self) -> &InfoSetStore<K> {
        &self.store
    }

    /// Consume the solver, keeping the store.
    pub fn into_store(self) -> InfoSetStore<K> {
        self.store
    }

    /// Get reference to the root node.
    pub fn root(&self) -> &N {
        &self.root
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &CfrConfig {
        &self.config
    }
}

/// One traversal, borrowing the store for its duration.
struct Pass<'s, K: InfoSetKey> {
    store: &'s mut InfoSetStore<K>,
    epsilon: f64,
    use_cfr_plus: bool,
    accumulate_regret: bool,
    accumulate_strategy: bool,
}

impl<K: InfoSetKey> Pass<'_, K> {
    fn traverse<M: GameNode>(&mut self, node: &M, reach: [f64; NUM_PLAYERS], p_chance: f64) -> Result<f64> {
        match node.node() {
            Node::Terminal { utilities } => {
                if utilities.len() != NUM_PLAYERS {
                    return Err(GameError::UtilityLength {
                        node: std::any::type_name::<M>(),
                        expected: NUM_PLAYERS,
                        found: utilities.len(),
                    }
                    .into());
                }
                Ok(utilities[0])
            }
            Node::Chance {
                actions,
                probabilities,
            } => self.traverse_chance(node, actions, probabilities, reach, p_chance),
            Node::Decision { actions, player } => {
                self.traverse_decision(node, actions, player, reach, p_chance)
            }
        }
    }

    fn traverse_chance<M: GameNode>(
        &mut self,
        node: &M,
        actions: &[ActionId],
        probabilities: &[f64],
        reach: [f64; NUM_PLAYERS],
        p_chance: f64,
    ) -> Result<f64> {
        let mut value = 0.0;
        for (&action, &prob) in actions.iter().zip(probabilities) {
            let child = node.apply_action(action)?;
            value += prob * self.traverse(&child, reach, p_chance * prob)?;
        }
        Ok(value)
    }

    fn traverse_decision<M: GameNode>(
        &mut self,
        node: &M,
        actions: &[ActionId],
        player: PlayerId,
        reach: [f64; NUM_PLAYERS],
        p_chance: f64,
    ) -> Result<f64> {
        if player >= NUM_PLAYERS {
            return Err(GameError::PlayerOutOfRange {
                node: std::any::type_name::<M>(),
                player,
                num_players: NUM_PLAYERS,
            }
            .into());
        }

        let key = K::from_node(node)?;
        let strategy = {
            let info_set = self.store.get(&key)?;
            if info_set.num_actions() != actions.len() {
                return Err(CfrError::ActionCountMismatch {
                    key: key.to_text(),
                    expected: info_set.num_actions(),
                    found: actions.len(),
                });
            }
            if self.epsilon > 0.0 {
                epsilon_soft(info_set.current_strategy(), self.epsilon)
            } else {
                info_set.current_strategy().to_vec()
            }
        };

        let mut action_values = Vec::with_capacity(actions.len());
        for (i, &action) in actions.iter().enumerate() {
            let mut child_reach = reach;
            child_reach[player] *= strategy[i];
            let child = node.apply_action(action)?;
            action_values.push(self.traverse(&child, child_reach, p_chance)?);
        }

        let node_value: f64 = strategy
            .iter()
            .zip(&action_values)
            .map(|(&s, &v)| s * v)
            .sum();

        // Values are player 0's; player 1 wants them low
        let sign = if player == 0 { 1.0 } else { -1.0 };

        let info_set = self.store.get_mut(&key)?;
        for (i, &value) in action_values.iter().enumerate() {
            info_set.set_instant_regret(i, sign * (value - node_value));
        }
        if self.accumulate_strategy {
            info_set.accumulate_strategy(reach[player]);
        }
        if self.accumulate_regret {
            info_set.accumulate_regret(p_chance * reach[1 - player], self.use_cfr_plus);
        }

        Ok(node_value)
    }
}

/// Check a loaded store against the tree and reject keys it never reaches.
pub(crate) fn check_reachable<N: GameNode, K: InfoSetKey>(
    store: &InfoSetStore<K>,
    root: &N,
    num_players: usize,
) -> Result<()> {
    let reached = store.reachable_keys(root, num_players)?;
    if reached.len() == store.len() {
        return Ok(());
    }
    match store.keys().into_iter().find(|key| !reached.contains(key)) {
        Some(key) => Err(CfrError::UnreachableInfoSet(key.to_text())),
        None => Ok(()),
    }
}
