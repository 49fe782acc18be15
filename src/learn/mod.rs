//! Defines the structure learner: greedy local search over DAG space driven by the `BicScorer`.

use std::collections::HashSet;

mod hill_climbing;
pub use self::hill_climbing::HillClimbSearch;


/// Configuration of the structure search. Edge constraints are expressed over variable *names*
/// and resolved to node indices when the search starts; an unresolvable or contradictory
/// configuration fails with `BayonetError::InvalidConfiguration` before any search begins.
#[derive(Clone, Debug)]
pub struct SearchConfig {

    /// The maximum number of parents any node may have
    pub max_in_degree: usize,

    /// `(from, to)` edges the search may never add
    pub forbidden_edges: HashSet<(String, String)>,

    /// `(from, to)` edges that are placed in the starting graph and may never be removed or
    /// reversed
    pub required_edges: HashSet<(String, String)>,

    /// Variables that may never be the source of any edge. Such a variable can still acquire
    /// parents - this is how a classification target is kept from becoming a cause of its
    /// features.
    pub forbidden_sources: HashSet<String>,

    /// The score penalty weight `lambda`; 1.0 is BIC
    pub score_penalty_weight: f64,

    /// Upper bound on the number of accepted edits
    pub iteration_cap: usize

}

impl Default for SearchConfig {

    fn default() -> Self {
        SearchConfig {
            max_in_degree: 4,
            forbidden_edges: HashSet::new(),
            required_edges: HashSet::new(),
            forbidden_sources: HashSet::new(),
            score_penalty_weight: 1.0,
            iteration_cap: 1000
        }
    }

}

impl SearchConfig {

    pub fn with_max_in_degree(mut self, max_in_degree: usize) -> Self {
        self.max_in_degree = max_in_degree;
        self
    }

    pub fn forbid(mut self, from: &str, to: &str) -> Self {
        self.forbidden_edges.insert((String::from(from), String::from(to)));
        self
    }

    pub fn require(mut self, from: &str, to: &str) -> Self {
        self.required_edges.insert((String::from(from), String::from(to)));
        self
    }

    /// Forbid every outgoing edge of the named variable, preventing it from ever becoming an
    /// ancestor of another variable while still allowing it to have parents
    pub fn forbid_children_of(mut self, name: &str) -> Self {
        self.forbidden_sources.insert(String::from(name));
        self
    }

    pub fn with_score_penalty_weight(mut self, weight: f64) -> Self {
        self.score_penalty_weight = weight;
        self
    }

    pub fn with_iteration_cap(mut self, cap: usize) -> Self {
        self.iteration_cap = cap;
        self
    }

}
