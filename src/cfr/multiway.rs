//! N-player CFR+ solver.
//!
//! Same recursion as [`CfrPlus`](crate::cfr::CfrPlus), but utilities travel as
//! one value per player and each player's regret is taken from its own
//! component. Reach is tracked per player; the regret weight of a decision is
//! chance reach times the reach of every other player.

use std::time::Instant;

use crate::cfr::config::{CfrConfig, CfrStats};
use crate::cfr::error::{CfrError, Result};
use crate::cfr::game::{ActionId, GameError, GameNode, Node, PlayerId};
use crate::cfr::key::InfoSetKey;
use crate::cfr::solver::check_reachable;
use crate::cfr::regret::epsilon_soft;
use crate::cfr::storage::{InfoSetStore, RegretMetric};

/// CFR+ solver for games with any number of players.
#[derive(Debug, Clone)]
pub struct MultiwayCfrPlus<N: GameNode, K: InfoSetKey = String> {
    root: N,
    num_players: usize,
    config: CfrConfig,
    store: InfoSetStore<K>,
    iteration: u64,
    stats: CfrStats,
}

impl<N: GameNode, K: InfoSetKey> MultiwayCfrPlus<N, K> {
    /// Create a solver with a fresh store.
    pub fn new(root: N, num_players: usize, config: CfrConfig) -> Result<Self> {
        Self::with_store(root, num_players, config, InfoSetStore::new())
    }

    /// Create a solver that continues from an existing store.
    ///
    /// Loading follows [`CfrPlus::with_store`](crate::cfr::CfrPlus::with_store).
    pub fn with_store(root: N, num_players: usize, config: CfrConfig, mut store: InfoSetStore<K>) -> Result<Self> {
        config.validate()?;
        store.discover_with(&root, config.initial_regret)?;
        check_reachable(&store, &root, num_players)?;
        if config.use_cfr_plus {
            store.clip_regrets();
        }

        let mut solver = Self {
            root,
            num_players,
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

    /// Run one pass from the root, returning every player's utility.
    pub fn iterate(&mut self, accumulate_regret: bool, accumulate_strategy: bool) -> Result<Vec<f64>> {
        let mut pass = MultiwayPass {
            store: &mut self.store,
            num_players: self.num_players,
            epsilon: self.config.epsilon,
            use_cfr_plus: self.config.use_cfr_plus,
            accumulate_regret,
            accumulate_strategy,
        };
        let values = pass.traverse(&self.root, &vec![1.0; self.num_players], 1.0)?;
        self.finish_pass(&values, accumulate_regret || accumulate_strategy);
        Ok(values)
    }

    /// Run one pass from another root over the same store.
    ///
    /// A failed call leaves the store and the iteration count untouched.
    pub fn iterate_from<M: GameNode>(
        &mut self,
        root: &M,
        accumulate_regret: bool,
        accumulate_strategy: bool,
    ) -> Result<Vec<f64>> {
        self.store.verify(root, self.num_players)?;
        let mut pass = MultiwayPass {
            store: &mut self.store,
            num_players: self.num_players,
            epsilon: self.config.epsilon,
            use_cfr_plus: self.config.use_cfr_plus,
            accumulate_regret,
            accumulate_strategy,
        };
        let values = pass.traverse(root, &vec![1.0; self.num_players], 1.0)?;
        self.finish_pass(&values, accumulate_regret || accumulate_strategy);
        Ok(values)
    }

    /// Run a pass that only refreshes instantaneous regrets.
    pub fn evaluate(&mut self) -> Result<Vec<f64>> {
        self.iterate(false, false)
    }

    /// Train the solver for a specified number of iterations.
    pub fn train(&mut self, iterations: u64) -> Result<&CfrStats> {
        self.train_with_callback(iterations, 0, |_| {})
    }

    /// Train with a callback every `callback_interval` iterations (0 = never).
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
    /// See [`CfrPlus::train_sampled`](crate::cfr::CfrPlus::train_sampled).
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
            "training {} iterations for {} players over {} info sets",
            iterations,
            self.num_players,
            self.store.len()
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
            "finished at iteration {} in {:.2}s",
            self.iteration,
            self.stats.elapsed_seconds
        );

        Ok(&self.stats)
    }

    fn finish_pass(&mut self, values: &[f64], accumulated: bool) {
        if accumulated {
            self.iteration += 1;
        }
        self.stats.iterations = self.iteration;
        self.stats.info_sets = self.store.len();
        self.stats.root_utilities = values.to_vec();
    }

    /// Average strategy at an info set.
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

    /// Number of players.
    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// Get the current iteration count.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Restore the iteration count of a resumed run.
    pub fn set_iteration(&mut self, iteration: u64) {
        self.iteration = iteration;
        self.stats.iterations = iteration;
    }

    /// Get current statistics.
    pub fn stats(&self) -> &CfrStats {
        &self.stats
    }

    /// Get reference to the store.
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

struct MultiwayPass<'s, K: InfoSetKey> {
    store: &'s mut InfoSetStore<K>,
    num_players: usize,
    epsilon: f64,
    use_cfr_plus: bool,
    accumulate_regret: bool,
    accumulate_strategy: bool,
}

impl<K: InfoSetKey> MultiwayPass<'_, K> {
    fn traverse<M: GameNode>(&mut self, node: &M, reach: &[f64], p_chance: f64) -> Result<Vec<f64>> {
        match node.node() {
            Node::Terminal { utilities } => {
                if utilities.len() != self.num_players {
                    return Err(GameError::UtilityLength {
                        node: std::any::type_name::<M>(),
                        expected: self.num_players,
                        found: utilities.len(),
                    }
                    .into());
                }
                Ok(utilities.to_vec())
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
        reach: &[f64],
        p_chance: f64,
    ) -> Result<Vec<f64>> {
        let mut values = vec![0.0; self.num_players];
        for (&action, &prob) in actions.iter().zip(probabilities) {
            let child = node.apply_action(action)?;
            let child_values = self.traverse(&child, reach, p_chance * prob)?;
            for (value, child_value) in values.iter_mut().zip(child_values) {
                *value += prob * child_value;
            }
        }
        Ok(values)
    }

    fn traverse_decision<M: GameNode>(
        &mut self,
        node: &M,
        actions: &[ActionId],
        player: PlayerId,
        reach: &[f64],
        p_chance: f64,
    ) -> Result<Vec<f64>> {
        if player >= self.num_players {
            return Err(GameError::PlayerOutOfRange {
                node: std::any::type_name::<M>(),
                player,
                num_players: self.num_players,
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

        let mut node_values = vec![0.0; self.num_players];
        let mut action_values = Vec::with_capacity(actions.len());
        let mut child_reach = reach.to_vec();
        for (i, &action) in actions.iter().enumerate() {
            child_reach[player] = reach[player] * strategy[i];
            let child = node.apply_action(action)?;
            let child_values = self.traverse(&child, &child_reach, p_chance)?;
            for (value, &child_value) in node_values.iter_mut().zip(&child_values) {
                *value += strategy[i] * child_value;
            }
            action_values.push(child_values[player]);
        }

        let info_set = self.store.get_mut(&key)?;
        for (i, &value) in action_values.iter().enumerate() {
            info_set.set_instant_regret(i, value - node_values[player]);
        }
        if self.accumulate_strategy {
            info_set.accumulate_strategy(reach[player]);
        }
        if self.accumulate_regret {
            let others: f64 = reach
                .iter()
                .enumerate()
                .filter(|&(p, _)| p != player)
                .map(|(_, &r)| r)
                .product();
            info_set.accumulate_regret(p_chance * others, self.use_cfr_plus);
        }

        Ok(node_values)
    }
}
