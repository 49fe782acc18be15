//! Defines the `BicScorer`, the decomposable structure score driving the hill-climbing search.
//!
//! The score of a graph is the sum of independent per-node local scores
//! ```Score(G) = sum_node local_score(node, parents(node))```, each a penalized log-likelihood
//! computed from a sufficient-statistic count table:
//!
//! ```text
//! local_score = sum_cfg sum_state count * ln(count / cfg_count)
//!               - (penalty / 2) * ln(N) * (card(node) - 1) * prod_p card(p)
//! ```
//!
//! with `0 * ln(0) := 0`. `penalty = 1` is BIC. Decomposability is the property the learner
//! exploits: changing one node's parent set invalidates only that node's local score, so candidate
//! edits are evaluated without rescoring the whole graph. Local scores are memoized by
//! `(node, sorted parent set)` - the same parent set is proposed many times across iterations.

use dataset::Dataset;
use factor::Table;
use graph::Dag;
use variable::{Variable, all_assignments};

use ndarray::prelude as nd;

use std::cell::RefCell;
use std::collections::HashMap;

pub struct BicScorer<'a> {

    /// The training data the score is computed against
    data: &'a Dataset,

    /// The node arena, in dataset column order; node indices match the `Dag` under search
    vars: Vec<Variable>,

    /// The penalty weight `lambda`. BIC uses 1.0.
    penalty: f64,

    /// Memoized local scores, keyed by `(node, sorted parent indices)`
    cache: RefCell<HashMap<(usize, Vec<usize>), f64>>

}

impl<'a> BicScorer<'a> {

    pub fn new(data: &'a Dataset, penalty: f64) -> Self {
        let vars = data.variables();
        BicScorer { data, vars, penalty, cache: RefCell::new(HashMap::new()) }
    }

    /// The number of nodes in the arena
    pub fn node_count(&self) -> usize {
        self.vars.len()
    }

    /// The local score of one node under the given parent set. The parent order does not matter;
    /// the memo key is canonicalized.
    pub fn local_score(&self, node: usize, parents: &[usize]) -> f64 {
        let mut key_parents = parents.to_vec();
        key_parents.sort();
        let key = (node, key_parents);

        if let Some(&score) = self.cache.borrow().get(&key) {
            return score;
        }

        let score = self.compute_local_score(node, &key.1);
        self.cache.borrow_mut().insert(key, score);
        score
    }

    /// The total score of a graph: the sum of its per-node local scores
    pub fn total_score(&self, dag: &Dag) -> f64 {
        (0..dag.node_count()).map(|n| self.local_score(n, dag.parents(n))).sum()
    }

    fn compute_local_score(&self, node: usize, parents: &[usize]) -> f64 {
        let scope: Vec<Variable> = parents.iter()
                                          .map(|&p| self.vars[p])
                                          .chain(Some(self.vars[node]))
                                          .collect();

        // sufficient statistics: counts over (joint parent configuration, node state)
        let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
        let mut counts = Table::zeros(shape);

        for row in self.data.records() {
            // safe to unwrap: Dataset rows are complete by construction
            let idx: Vec<usize> = scope.iter().map(|v| *row.get(v).unwrap()).collect();
            counts[nd::IxDyn(&idx)] += 1.0;
        }

        // counts per parent configuration, summed over the node's states
        let config_counts = counts.sum_axis(nd::Axis(scope.len() - 1));

        let mut log_likelihood = 0.0;
        for assn in all_assignments(&scope) {
            let idx: Vec<usize> = scope.iter().map(|v| *assn.get(v).unwrap()).collect();
            let count = counts[nd::IxDyn(&idx)];

            // zero-count cells contribute nothing: 0 * ln(0) := 0
            if count > 0.0 {
                let config_count = config_counts[nd::IxDyn(&idx[..idx.len() - 1])];
                log_likelihood += count * (count / config_count).ln();
            }
        }

        let parent_configs: usize = parents.iter().map(|&p| self.vars[p].cardinality()).product();
        let free_params = ((self.vars[node].cardinality() - 1) * parent_configs) as f64;
        let n = self.data.len() as f64;

        log_likelihood - 0.5 * self.penalty * n.ln() * free_params
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use dataset::tests::record;

    fn coin_data() -> Dataset {
        // 3 heads, 1 tail
        let records = vec![
            record(&[("coin", "h")]),
            record(&[("coin", "h")]),
            record(&[("coin", "h")]),
            record(&[("coin", "t")]),
        ];
        Dataset::from_records(&records).unwrap()
    }

    #[test]
    fn single_node_score() {
        let data = coin_data();
        let scorer = BicScorer::new(&data, 1.0);

        // ll = 3 ln(3/4) + 1 ln(1/4); one free parameter
        let expected = 3.0 * (0.75f64).ln() + (0.25f64).ln() - 0.5 * (4.0f64).ln();
        assert!((scorer.local_score(0, &[]) - expected).abs() < 1e-12);
    }

    #[test]
    fn penalty_weight_scales_only_the_penalty() {
        let data = coin_data();
        let bic = BicScorer::new(&data, 1.0);
        let heavy = BicScorer::new(&data, 3.0);

        let ll = 3.0 * (0.75f64).ln() + (0.25f64).ln();
        assert!((bic.local_score(0, &[]) - (ll - 0.5 * (4.0f64).ln())).abs() < 1e-12);
        assert!((heavy.local_score(0, &[]) - (ll - 1.5 * (4.0f64).ln())).abs() < 1e-12);
    }

    fn deterministic_pair() -> Dataset {
        // a == b on every row
        let mut records = Vec::new();
        for _ in 0..20 {
            records.push(record(&[("a", "0"), ("b", "0")]));
            records.push(record(&[("a", "1"), ("b", "1")]));
        }
        Dataset::from_records(&records).unwrap()
    }

    #[test]
    fn dependent_parent_improves_score() {
        let data = deterministic_pair();
        let scorer = BicScorer::new(&data, 1.0);

        // a is a deterministic function of b, so conditioning wins despite the extra parameter
        assert!(scorer.local_score(0, &[1]) > scorer.local_score(0, &[]));
    }

    #[test]
    fn parent_order_is_canonicalized() {
        let records = vec![
            record(&[("a", "0"), ("b", "0"), ("c", "1")]),
            record(&[("a", "1"), ("b", "0"), ("c", "0")]),
            record(&[("a", "0"), ("b", "1"), ("c", "1")]),
            record(&[("a", "1"), ("b", "1"), ("c", "0")]),
        ];
        let data = Dataset::from_records(&records).unwrap();
        let scorer = BicScorer::new(&data, 1.0);

        assert_eq!(scorer.local_score(0, &[1, 2]), scorer.local_score(0, &[2, 1]));
    }

    #[test]
    fn total_score_decomposes() {
        let data = deterministic_pair();
        let scorer = BicScorer::new(&data, 1.0);

        let mut dag = Dag::new(data.variables());
        dag.add_edge(1, 0).unwrap();

        let total = scorer.total_score(&dag);
        let recomputed: f64 = (0..dag.node_count())
            .map(|n| BicScorer::new(&data, 1.0).local_score(n, dag.parents(n)))
            .sum();

        assert!((total - recomputed).abs() < 1e-12);
    }

}
