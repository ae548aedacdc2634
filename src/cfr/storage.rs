//! Storage for CFR+ regrets and strategies.
//!
//! This module provides the per-information-set accumulator ([`InfoSet`]) and
//! the keyed store that owns them ([`InfoSetStore`]).
//!
//! The store is filled exactly once by a discovery walk over the game tree.
//! After that, training only mutates existing entries; looking up an unknown
//! key is an error rather than a silent insert.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::cfr::error::{CfrError, Result};
use crate::cfr::game::{validate_chance, GameError, GameNode, Node, NodeKind};
use crate::cfr::key::{convert_key, InfoSetKey};
use crate::cfr::regret::{normalize, regret_match};

/// Regret and strategy accumulator for one information set.
///
/// - **Instant regret**: regret of each action on the latest visit
/// - **Regret sum**: cumulative regret, clipped to be non-negative under CFR+
///   and signed under plain CFR
/// - **Cumulative strategy**: reach-weighted sum of the strategies played
///
/// The regret-matching strategy is recomputed whenever the regret sum
/// changes, so [`current_strategy`](InfoSet::current_strategy) never returns
/// a stale value.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoSet {
    instant_regret: Vec<f64>,
    regret_sum: Vec<f64>,
    strategy: Vec<f64>,
    cumulative_strategy: Vec<f64>,
}

impl InfoSet {
    /// Create an info set with zero regret for `num_actions` actions.
    pub fn new(num_actions: usize) -> Self {
        Self::with_initial_regret(num_actions, 0.0)
    }

    /// Create an info set whose cumulative regrets all start at `regret`.
    pub fn with_initial_regret(num_actions: usize, regret: f64) -> Self {
        Self::from_sums(vec![regret; num_actions], vec![0.0; num_actions])
    }

    /// Rebuild an info set from saved sums, kept as given.
    ///
    /// # Panics
    /// If the two vectors differ in length.
    pub fn from_sums(regret_sum: Vec<f64>, cumulative_strategy: Vec<f64>) -> Self {
        assert_eq!(
            regret_sum.len(),
            cumulative_strategy.len(),
            "regret and strategy sums must have one entry per action"
        );
        let strategy = regret_match(&regret_sum);
        Self {
            instant_regret: vec![0.0; regret_sum.len()],
            regret_sum,
            strategy,
            cumulative_strategy,
        }
    }

    /// Number of actions at this info set.
    pub fn num_actions(&self) -> usize {
        self.regret_sum.len()
    }

    /// Regret of each action on the latest visit.
    pub fn instant_regret(&self) -> &[f64] {
        &self.instant_regret
    }

    /// Cumulative (non-negative) regret of each action.
    pub fn regret_sum(&self) -> &[f64] {
        &self.regret_sum
    }

    /// Unnormalized cumulative strategy.
    pub fn cumulative_strategy(&self) -> &[f64] {
        &self.cumulative_strategy
    }

    /// Regret-matching strategy for the current regret sum.
    pub fn current_strategy(&self) -> &[f64] {
        &self.strategy
    }

    /// Average strategy: the normalized cumulative strategy.
    ///
    /// This is the strategy that converges to equilibrium. Uniform if the
    /// info set never accumulated any weight.
    pub fn average_strategy(&self) -> Vec<f64> {
        normalize(&self.cumulative_strategy)
    }

    /// Record the regret of one action for the current visit.
    pub fn set_instant_regret(&mut self, action_idx: usize, regret: f64) {
        self.instant_regret[action_idx] = regret;
    }

    /// Add `weight * instant_regret` to the regret sum.
    ///
    /// With `use_cfr_plus` the sum is clipped at zero afterwards.
    pub fn accumulate_regret(&mut self, weight: f64, use_cfr_plus: bool) {
        for (sum, &regret) in self.regret_sum.iter_mut().zip(&self.instant_regret) {
            *sum += weight * regret;
        }
        if use_cfr_plus {
            self.clip_regret();
        } else {
            self.strategy = regret_match(&self.regret_sum);
        }
    }

    /// Add `weight * current_strategy` to the cumulative strategy.
    pub fn accumulate_strategy(&mut self, weight: f64) {
        for (sum, &prob) in self.cumulative_strategy.iter_mut().zip(&self.strategy) {
            *sum += weight * prob;
        }
    }

    /// Replace the regret sum, kept as given.
    ///
    /// # Panics
    /// If the length differs from the number of actions.
    pub fn set_regret_sum(&mut self, regret_sum: Vec<f64>) {
        assert_eq!(
            regret_sum.len(),
            self.num_actions(),
            "regret sum must have one entry per action"
        );
        self.regret_sum = regret_sum;
        self.strategy = regret_match(&self.regret_sum);
    }

    /// Clip the regret sum at zero.
    pub fn clip_regret(&mut self) {
        for sum in self.regret_sum.iter_mut() {
            *sum = sum.max(0.0);
        }
        self.strategy = regret_match(&self.regret_sum);
    }
}

/// Aggregate instantaneous-regret statistics, for convergence monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegretMetric {
    /// Number of (info set, action) regrets scanned.
    pub n_regrets: usize,
    /// Largest instantaneous regret (0 if none is positive).
    pub max_instant_regret: f64,
    /// Sum of all positive instantaneous regrets.
    pub sum_positive_instant_regrets: f64,
}

impl fmt::Display for RegretMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "regrets={} max={:.6} sum_positive={:.6}",
            self.n_regrets, self.max_instant_regret, self.sum_positive_instant_regrets
        )
    }
}

/// Key -> [`InfoSet`] store.
///
/// One writer at a time: the engines take it by value and mutate it in place.
#[derive(Debug, Clone)]
pub struct InfoSetStore<K: InfoSetKey> {
    info_sets: FxHashMap<K, InfoSet>,
}

impl<K: InfoSetKey> Default for InfoSetStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: InfoSetKey> InfoSetStore<K> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            info_sets: FxHashMap::default(),
        }
    }

    /// Create a store with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            info_sets: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Get the number of info sets stored.
    pub fn len(&self) -> usize {
        self.info_sets.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.info_sets.is_empty()
    }

    /// Check if an info set exists in storage.
    pub fn contains(&self, key: &K) -> bool {
        self.info_sets.contains_key(key)
    }

    /// Look up an info set.
    pub fn get(&self, key: &K) -> Result<&InfoSet> {
        self.info_sets
            .get(key)
            .ok_or_else(|| CfrError::InfoSetNotFound(key.to_text()))
    }

    /// Look up an info set for mutation.
    pub fn get_mut(&mut self, key: &K) -> Result<&mut InfoSet> {
        self.info_sets
            .get_mut(key)
            .ok_or_else(|| CfrError::InfoSetNotFound(key.to_text()))
    }

    /// Insert or replace an info set, returning the previous one.
    pub fn insert(&mut self, key: K, info_set: InfoSet) -> Option<InfoSet> {
        self.info_sets.insert(key, info_set)
    }

    /// Iterate over all entries (arbitrary order).
    pub fn iter(&self) -> impl Iterator<Item = (&K, &InfoSet)> {
        self.info_sets.iter()
    }

    /// All keys, sorted by their text form.
    pub fn keys(&self) -> Vec<K> {
        let mut keys: Vec<K> = self.info_sets.keys().cloned().collect();
        keys.sort_by_cached_key(|key| key.to_text());
        keys
    }

    /// Walk the tree from `root` and insert a zeroed info set for every
    /// Decision key not yet stored.
    ///
    /// Returns the number of info sets added.
    pub fn discover<N: GameNode>(&mut self, root: &N) -> Result<usize> {
        self.discover_with(root, 0.0)
    }

    /// Like [`discover`](InfoSetStore::discover), starting every new regret
    /// sum at `initial_regret`.
    ///
    /// Also checks the tree along the way: every chance distribution must be
    /// valid, and every node sharing a key must have the same action count.
    pub fn discover_with<N: GameNode>(&mut self, root: &N, initial_regret: f64) -> Result<usize> {
        let before = self.len();
        self.discover_node(root, initial_regret)?;
        let added = self.len() - before;
        log::debug!("discovered {} new info sets ({} total)", added, self.len());
        Ok(added)
    }

    fn discover_node<N: GameNode>(&mut self, node: &N, initial_regret: f64) -> Result<()> {
        let actions = match node.node() {
            Node::Terminal { .. } => return Ok(()),
            Node::Chance {
                actions,
                probabilities,
            } => {
                validate_chance::<N>(actions, probabilities)?;
                actions
            }
            Node::Decision { actions, .. } => {
                if actions.is_empty() {
                    return Err(GameError::NoLegalActions {
                        node: std::any::type_name::<N>(),
                        kind: NodeKind::Decision,
                    }
                    .into());
                }
                let key = K::from_node(node)?;
                match self.info_sets.get(&key) {
                    Some(existing) if existing.num_actions() != actions.len() => {
                        return Err(CfrError::ActionCountMismatch {
                            key: key.to_text(),
                            expected: existing.num_actions(),
                            found: actions.len(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        self.info_sets
                            .insert(key, InfoSet::with_initial_regret(actions.len(), initial_regret));
                    }
                }
                actions
            }
        };

        for &action in actions {
            self.discover_node(&node.apply_action(action)?, initial_regret)?;
        }
        Ok(())
    }

    /// Scan every info set's instantaneous regret.
    pub fn metric(&self) -> RegretMetric {
        let mut metric = RegretMetric::default();

        for info_set in self.info_sets.values() {
            for &regret in info_set.instant_regret() {
                metric.n_regrets += 1;
                if regret > metric.max_instant_regret {
                    metric.max_instant_regret = regret;
                }
                if regret > 0.0 {
                    metric.sum_positive_instant_regrets += regret;
                }
            }
        }

        metric
    }

    /// Walk the tree from `root` without touching any entry.
    ///
    /// Fails where a training pass over the same tree would fail: a bad
    /// chance distribution, a terminal without `num_players` utilities, a
    /// player out of range, a key the store doesn't hold, or an action count
    /// that disagrees with the stored one. A pass that follows a successful
    /// check cannot stop halfway.
    pub fn verify<N: GameNode>(&self, root: &N, num_players: usize) -> Result<()> {
        self.check_node(root, num_players, &mut None)
    }

    /// Like [`verify`](InfoSetStore::verify), returning every key reached.
    pub fn reachable_keys<N: GameNode>(&self, root: &N, num_players: usize) -> Result<FxHashSet<K>> {
        let mut reached = Some(FxHashSet::default());
        self.check_node(root, num_players, &mut reached)?;
        Ok(reached.unwrap_or_default())
    }

    fn check_node<N: GameNode>(
        &self,
        node: &N,
        num_players: usize,
        reached: &mut Option<FxHashSet<K>>,
    ) -> Result<()> {
        let actions = match node.node() {
            Node::Terminal { utilities } => {
                if utilities.len() != num_players {
                    return Err(GameError::UtilityLength {
                        node: std::any::type_name::<N>(),
                        expected: num_players,
                        found: utilities.len(),
                    }
                    .into());
                }
                return Ok(());
            }
            Node::Chance {
                actions,
                probabilities,
            } => {
                validate_chance::<N>(actions, probabilities)?;
                actions
            }
            Node::Decision { actions, player } => {
                if player >= num_players {
                    return Err(GameError::PlayerOutOfRange {
                        node: std::any::type_name::<N>(),
                        player,
                        num_players,
                    }
                    .into());
                }
                let key = K::from_node(node)?;
                let info_set = self.get(&key)?;
                if info_set.num_actions() != actions.len() {
                    return Err(CfrError::ActionCountMismatch {
                        key: key.to_text(),
                        expected: info_set.num_actions(),
                        found: actions.len(),
                    });
                }
                if let Some(reached) = reached.as_mut() {
                    reached.insert(key);
                }
                actions
            }
        };

        for &action in actions {
            self.check_node(&node.apply_action(action)?, num_players, reached)?;
        }
        Ok(())
    }

    /// Clip every regret sum at zero.
    pub fn clip_regrets(&mut self) {
        for info_set in self.info_sets.values_mut() {
            info_set.clip_regret();
        }
    }

    /// Copy the store into another key encoding through the keys' text form.
    ///
    /// Only valid when both encodings derive from the same text, that is for
    /// games that keep the default [`GameNode::info_set_hash`]. Games with
    /// their own hash need [`rekey_with`](InfoSetStore::rekey_with).
    pub fn rekey<K2: InfoSetKey>(&self) -> InfoSetStore<K2> {
        let mut converted = InfoSetStore::with_capacity(self.len());
        for (key, info_set) in &self.info_sets {
            converted.insert(convert_key::<K, K2>(key), info_set.clone());
        }
        converted
    }

    /// Copy the store into another key encoding, pairing keys by walking the
    /// tree from `root`.
    ///
    /// Every Decision node gives one `K -> K2` pair, so this works for any
    /// game whatever its hash. A stored key that the tree never reaches is
    /// an [`InfoSetNotFound`](CfrError::InfoSetNotFound) error.
    pub fn rekey_with<K2: InfoSetKey, N: GameNode>(&self, root: &N) -> Result<InfoSetStore<K2>> {
        let mut pairs: FxHashMap<K, K2> = FxHashMap::default();
        collect_key_pairs(root, &mut pairs)?;

        let mut converted = InfoSetStore::with_capacity(self.len());
        for (key, info_set) in &self.info_sets {
            let new_key = pairs
                .get(key)
                .ok_or_else(|| CfrError::InfoSetNotFound(key.to_text()))?;
            converted.insert(new_key.clone(), info_set.clone());
        }
        Ok(converted)
    }

    /// Clear all stored data.
    pub fn clear(&mut self) {
        self.info_sets.clear();
    }
}

fn collect_key_pairs<N: GameNode, K: InfoSetKey, K2: InfoSetKey>(
    node: &N,
    pairs: &mut FxHashMap<K, K2>,
) -> Result<()> {
    let actions = match node.node() {
        Node::Terminal { .. } => return Ok(()),
        Node::Chance { actions, .. } => actions,
        Node::Decision { actions, .. } => {
            pairs.insert(K::from_node(node)?, K2::from_node(node)?);
            actions
        }
    };
    for &action in actions {
        collect_key_pairs(&node.apply_action(action)?, pairs)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::game::ActionId;
    use crate::games::kuhn::KuhnNode;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_info_set_is_uniform() {
        let info_set = InfoSet::new(3);
        assert_eq!(info_set.num_actions(), 3);
        assert_eq!(info_set.regret_sum(), &[0.0; 3]);
        assert_eq!(info_set.current_strategy(), &[1.0 / 3.0; 3]);
        assert_eq!(info_set.average_strategy(), vec![1.0 / 3.0; 3]);
    }

    #[test]
    fn test_accumulate_regret_clips_and_refreshes_strategy() {
        let mut info_set = InfoSet::new(3);
        info_set.set_instant_regret(0, 2.0);
        info_set.set_instant_regret(1, -1.0);
        info_set.set_instant_regret(2, 0.5);
        info_set.accumulate_regret(1.0, true);

        assert_eq!(info_set.regret_sum(), &[2.0, 0.0, 0.5]);
        assert_relative_eq!(info_set.current_strategy()[0], 0.8);
        assert_eq!(info_set.current_strategy()[1], 0.0);
        assert_relative_eq!(info_set.current_strategy()[2], 0.2);

        // A large negative update drives everything to zero, never below
        for i in 0..3 {
            info_set.set_instant_regret(i, -10.0);
        }
        info_set.accumulate_regret(3.0, true);
        assert!(info_set.regret_sum().iter().all(|&r| r >= 0.0));
        assert_eq!(info_set.current_strategy(), &[1.0 / 3.0; 3]);
    }

    #[test]
    fn test_plain_regret_keeps_its_sign() {
        let mut info_set = InfoSet::new(3);
        info_set.set_instant_regret(0, 2.0);
        info_set.set_instant_regret(1, -1.0);
        info_set.set_instant_regret(2, 0.5);
        info_set.accumulate_regret(2.0, false);

        assert_eq!(info_set.regret_sum(), &[4.0, -2.0, 1.0]);
        assert_relative_eq!(info_set.current_strategy()[0], 0.8);
        assert_eq!(info_set.current_strategy()[1], 0.0);

        // Negative regret has to be paid back before the action is played
        info_set.set_instant_regret(0, 0.0);
        info_set.set_instant_regret(1, 1.0);
        info_set.set_instant_regret(2, 0.0);
        info_set.accumulate_regret(1.0, false);
        assert_eq!(info_set.regret_sum()[1], -1.0);
        assert_eq!(info_set.current_strategy()[1], 0.0);
    }

    #[test]
    fn test_accumulate_strategy_uses_current_strategy() {
        let mut info_set = InfoSet::new(2);
        info_set.set_instant_regret(0, 1.0);
        info_set.accumulate_regret(1.0, true);
        info_set.accumulate_strategy(0.5);
        info_set.accumulate_strategy(0.5);

        assert_eq!(info_set.cumulative_strategy(), &[1.0, 0.0]);
        assert_eq!(info_set.average_strategy(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_from_sums_recomputes_strategy() {
        let mut info_set = InfoSet::from_sums(vec![-3.0, 1.0, 3.0], vec![1.0, 1.0, 2.0]);
        assert_eq!(info_set.regret_sum(), &[-3.0, 1.0, 3.0]);
        assert_eq!(info_set.current_strategy(), &[0.0, 0.25, 0.75]);
        assert_eq!(info_set.average_strategy(), vec![0.25, 0.25, 0.5]);

        info_set.clip_regret();
        assert_eq!(info_set.regret_sum(), &[0.0, 1.0, 3.0]);
        assert_eq!(info_set.current_strategy(), &[0.0, 0.25, 0.75]);
    }

    #[test]
    #[should_panic(expected = "one entry per action")]
    fn test_from_sums_rejects_length_mismatch() {
        InfoSet::from_sums(vec![0.0, 1.0], vec![1.0]);
    }

    #[test]
    #[should_panic(expected = "one entry per action")]
    fn test_set_regret_sum_rejects_length_mismatch() {
        InfoSet::new(3).set_regret_sum(vec![1.0, 2.0]);
    }

    #[test]
    fn test_clip_regrets() {
        let mut store: InfoSetStore<String> = InfoSetStore::new();
        store.insert("a".to_string(), InfoSet::from_sums(vec![-1.0, 2.0], vec![0.0, 0.0]));
        store.clip_regrets();
        assert_eq!(store.get(&"a".to_string()).unwrap().regret_sum(), &[0.0, 2.0]);
    }

    #[test]
    fn test_get_missing_key_fails() {
        let mut store: InfoSetStore<String> = InfoSetStore::new();
        assert!(matches!(
            store.get(&"nope".to_string()),
            Err(CfrError::InfoSetNotFound(key)) if key == "nope"
        ));
        assert!(store.get_mut(&"nope".to_string()).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_discover_kuhn() {
        let mut store: InfoSetStore<String> = InfoSetStore::new();
        let added = store.discover(&KuhnNode::root()).unwrap();

        // 3 cards x 4 decision histories
        assert_eq!(added, 12);
        assert_eq!(store.len(), 12);
        assert!(store.contains(&"0:".to_string()));
        assert!(store.contains(&"2:pb".to_string()));

        // Rediscovery adds nothing
        assert_eq!(store.discover(&KuhnNode::root()).unwrap(), 0);
    }

    #[test]
    fn test_discover_is_deterministic() {
        let mut first: InfoSetStore<String> = InfoSetStore::new();
        let mut second: InfoSetStore<String> = InfoSetStore::new();
        first.discover(&KuhnNode::root()).unwrap();
        second.discover(&KuhnNode::root()).unwrap();
        assert_eq!(first.keys(), second.keys());
    }

    #[test]
    fn test_discover_with_initial_regret() {
        let mut store: InfoSetStore<String> = InfoSetStore::new();
        store.discover_with(&KuhnNode::root(), 20.0).unwrap();
        let info_set = store.get(&"1:".to_string()).unwrap();
        assert_eq!(info_set.regret_sum(), &[20.0, 20.0]);
    }

    #[derive(Debug, Clone)]
    struct Mismatched {
        depth: u8,
    }

    impl GameNode for Mismatched {
        fn node(&self) -> Node<'_> {
            match self.depth {
                0 => Node::Decision {
                    actions: &[0, 1],
                    player: 0,
                },
                1 => Node::Decision {
                    actions: &[0, 1, 2],
                    player: 0,
                },
                _ => Node::Terminal {
                    utilities: &[0.0, 0.0],
                },
            }
        }

        fn apply_action(&self, _action: ActionId) -> std::result::Result<Self, GameError> {
            Ok(Mismatched {
                depth: self.depth + 1,
            })
        }

        fn info_set_key(&self) -> std::result::Result<String, GameError> {
            Ok("same".to_string())
        }
    }

    #[test]
    fn test_discover_rejects_action_count_mismatch() {
        let mut store: InfoSetStore<String> = InfoSetStore::new();
        let err = store.discover(&Mismatched { depth: 0 }).unwrap_err();
        assert!(matches!(
            err,
            CfrError::ActionCountMismatch { expected: 2, found: 3, .. }
        ));
    }

    #[test]
    fn test_verify_checks_without_writing() {
        let mut store: InfoSetStore<String> = InfoSetStore::new();
        store.discover(&KuhnNode::root()).unwrap();
        let before = store.clone();

        store.verify(&KuhnNode::root(), 2).unwrap();
        let reached = store.reachable_keys(&KuhnNode::root(), 2).unwrap();
        assert_eq!(reached.len(), 12);

        assert!(matches!(
            store.verify(&KuhnNode::root(), 3),
            Err(CfrError::Game(GameError::UtilityLength { expected: 3, .. }))
        ));
        assert!(matches!(
            store.verify(&KuhnNode::root(), 1),
            Err(CfrError::Game(GameError::PlayerOutOfRange { player: 1, .. }))
        ));

        let mut partial = store.clone();
        partial.clear();
        partial.insert("0:".to_string(), InfoSet::new(2));
        assert!(matches!(
            partial.verify(&KuhnNode::root(), 2),
            Err(CfrError::InfoSetNotFound(_))
        ));

        for (key, info_set) in store.iter() {
            assert_eq!(info_set, before.get(key).unwrap());
        }
    }

    #[test]
    fn test_verify_rejects_action_count_mismatch() {
        let mut store: InfoSetStore<String> = InfoSetStore::new();
        store.insert("same".to_string(), InfoSet::new(2));
        assert!(matches!(
            store.verify(&Mismatched { depth: 0 }, 2),
            Err(CfrError::ActionCountMismatch { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn test_metric() {
        let mut store: InfoSetStore<String> = InfoSetStore::new();
        let mut a = InfoSet::new(2);
        a.set_instant_regret(0, 0.5);
        a.set_instant_regret(1, -2.0);
        let mut b = InfoSet::new(3);
        b.set_instant_regret(2, 1.5);
        store.insert("a".to_string(), a);
        store.insert("b".to_string(), b);

        let metric = store.metric();
        assert_eq!(metric.n_regrets, 5);
        assert_eq!(metric.max_instant_regret, 1.5);
        assert_eq!(metric.sum_positive_instant_regrets, 2.0);
    }

    #[test]
    fn test_rekey_to_hashed() {
        let mut store: InfoSetStore<String> = InfoSetStore::new();
        store.discover(&KuhnNode::root()).unwrap();

        let hashed: InfoSetStore<u64> = store.rekey();
        let mut direct: InfoSetStore<u64> = InfoSetStore::new();
        direct.discover(&KuhnNode::root()).unwrap();

        assert_eq!(hashed.keys(), direct.keys());

        let walked: InfoSetStore<u64> = store.rekey_with(&KuhnNode::root()).unwrap();
        assert_eq!(walked.keys(), direct.keys());
    }
}
