//! Regret matching.
//!
//! ```text
//! Strategy(a) = max(0, R(a)) / sum(max(0, R(a')))      if the sum is positive
//!             = 1 / k                                  otherwise
//! ```

/// Turn a cumulative-regret vector into a probability distribution.
///
/// Actions are played in proportion to their positive regret. When no action
/// has positive regret the result is exactly uniform.
pub fn regret_match(regret_sum: &[f64]) -> Vec<f64> {
    let positive: Vec<f64> = regret_sum.iter().map(|&r| r.max(0.0)).collect();
    normalize(&positive)
}

/// Normalize non-negative weights into a distribution, uniform if they sum
/// to zero.
pub fn normalize(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter().map(|&w| w / total).collect()
    } else {
        let k = weights.len();
        vec![1.0 / k as f64; k]
    }
}

/// Mix a strategy with the uniform distribution.
///
/// Each action gets at least `epsilon / k`; equivalently, with probability
/// `epsilon` an action is picked uniformly at random.
pub fn epsilon_soft(strategy: &[f64], epsilon: f64) -> Vec<f64> {
    let k = strategy.len() as f64;
    strategy
        .iter()
        .map(|&p| epsilon / k + (1.0 - epsilon) * p)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_distribution(strategy: &[f64]) {
        assert!(strategy.iter().all(|&p| p >= 0.0), "negative entry in {:?}", strategy);
        assert_relative_eq!(strategy.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_regret_match_is_distribution() {
        let cases: [&[f64]; 6] = [
            &[1.0, 2.0, 3.0],
            &[-1.0, 4.0],
            &[0.0, 0.0, 5.0, -2.0],
            &[1e-300, 1e-300],
            &[1e300, 1.0],
            &[7.0],
        ];
        for regrets in cases {
            let strategy = regret_match(regrets);
            assert_eq!(strategy.len(), regrets.len());
            assert_distribution(&strategy);
        }
    }

    #[test]
    fn test_regret_match_proportional() {
        let strategy = regret_match(&[1.0, -5.0, 3.0]);
        assert_relative_eq!(strategy[0], 0.25);
        assert_eq!(strategy[1], 0.0);
        assert_relative_eq!(strategy[2], 0.75);
    }

    #[test]
    fn test_non_positive_regrets_are_uniform() {
        assert_eq!(regret_match(&[0.0, 0.0, 0.0, 0.0]), vec![0.25; 4]);
        assert_eq!(regret_match(&[-1.0, -3.0]), vec![0.5, 0.5]);
        assert_eq!(regret_match(&[0.0, -2.0, -0.5]), vec![1.0 / 3.0; 3]);
    }

    #[test]
    fn test_epsilon_soft_floor() {
        let epsilon = 0.3;
        let soft = epsilon_soft(&[1.0, 0.0, 0.0], epsilon);
        assert_distribution(&soft);
        for &p in &soft {
            assert!(p >= epsilon / 3.0 - 1e-15);
        }
        assert_relative_eq!(soft[0], 0.1 + 0.7, epsilon = 1e-12);

        // epsilon = 0 leaves the strategy alone
        assert_eq!(epsilon_soft(&[0.2, 0.8], 0.0), vec![0.2, 0.8]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(&[2.0, 6.0]), vec![0.25, 0.75]);
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.5, 0.5]);
        assert!(normalize(&[]).is_empty());
    }
}
