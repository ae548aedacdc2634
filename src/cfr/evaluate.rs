//! Expected value of the average strategy profile.
//!
//! Walks the full tree with every player following its average strategy and
//! returns the expected terminal utilities. The store is only read.

use crate::cfr::error::{CfrError, Result};
use crate::cfr::game::{GameNode, Node};
use crate::cfr::key::InfoSetKey;
use crate::cfr::storage::InfoSetStore;

/// Expected utility of every player when all follow their average strategy.
pub fn expected_utilities<N: GameNode, K: InfoSetKey>(root: &N, store: &InfoSetStore<K>) -> Result<Vec<f64>> {
    match root.node() {
        Node::Terminal { utilities } => Ok(utilities.to_vec()),
        Node::Chance {
            actions,
            probabilities,
        } => {
            let weighted = actions.iter().zip(probabilities).map(|(&action, &prob)| (action, prob));
            weighted_sum(root, store, weighted)
        }
        Node::Decision { actions, .. } => {
            let key = K::from_node(root)?;
            let info_set = store.get(&key)?;
            if info_set.num_actions() != actions.len() {
                return Err(CfrError::ActionCountMismatch {
                    key: key.to_text(),
                    expected: info_set.num_actions(),
                    found: actions.len(),
                });
            }
            let strategy = info_set.average_strategy();
            weighted_sum(root, store, actions.iter().copied().zip(strategy))
        }
    }
}

/// Player 0's expected utility under the average strategy profile.
pub fn evaluate_average_strategy<N: GameNode, K: InfoSetKey>(root: &N, store: &InfoSetStore<K>) -> Result<f64> {
    Ok(expected_utilities(root, store)?.first().copied().unwrap_or(0.0))
}

fn weighted_sum<N, K, I>(node: &N, store: &InfoSetStore<K>, weighted: I) -> Result<Vec<f64>>
where
    N: GameNode,
    K: InfoSetKey,
    I: Iterator<Item = (usize, f64)>,
{
    let mut total: Vec<f64> = Vec::new();
    for (action, weight) in weighted {
        // Unreached branches contribute nothing
        if weight == 0.0 {
            continue;
        }
        let child = expected_utilities(&node.apply_action(action)?, store)?;
        if total.is_empty() {
            total = vec![0.0; child.len()];
        }
        for (sum, value) in total.iter_mut().zip(child) {
            *sum += weight * value;
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::kuhn::KuhnNode;

    #[test]
    fn test_uniform_kuhn_value() {
        let mut store: InfoSetStore<String> = InfoSetStore::new();
        store.discover(&KuhnNode::root()).unwrap();

        // Fresh store: every average strategy is uniform
        let utilities = expected_utilities(&KuhnNode::root(), &store).unwrap();
        assert!((utilities[0] - 0.125).abs() < 1e-12);
        assert!((utilities[0] + utilities[1]).abs() < 1e-12);
        assert_eq!(evaluate_average_strategy(&KuhnNode::root(), &store).unwrap(), utilities[0]);
    }

    #[test]
    fn test_missing_store_entry() {
        let store: InfoSetStore<String> = InfoSetStore::new();
        assert!(matches!(
            evaluate_average_strategy(&KuhnNode::root(), &store),
            Err(CfrError::InfoSetNotFound(_))
        ));
    }
}
