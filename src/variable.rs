//! Definition of the variable module
//!
//! A `Variable` represents a discrete random variable in a probabilistic graphical model. The
//! handle is deliberately lightweight (`Copy`) - it carries only a process-unique id and a
//! cardinality. Human-readable names and state labels live in the `dataset::Codebook`, which maps
//! both directions.

use indexmap::IndexMap;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering, ATOMIC_USIZE_INIT};

/// Source of process-unique `Variable` ids.
static NEXT_ID: AtomicUsize = ATOMIC_USIZE_INIT;

/// A discrete random variable with states `0..cardinality`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    id: usize,
    cardinality: usize
}

impl Variable {

    /// Construct a new binary `Variable`
    pub fn binary() -> Variable {
        Variable::discrete(2)
    }

    /// Construct a new discrete `Variable` with the given number of states
    ///
    /// # Panics
    /// if `cardinality` is zero - a variable must have at least one state
    pub fn discrete(cardinality: usize) -> Variable {
        if cardinality == 0 {
            panic!("A Variable must have at least one state");
        }

        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        Variable { id, cardinality }
    }

    /// Get the process-unique id of this `Variable`
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get the number of states of this `Variable`
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

}

impl fmt::Display for Variable {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "X{}", self.id)
    }

}


/// A (possibly partial) assignment of state indices to `Variable`s.
///
/// Iteration order is insertion order, which keeps downstream computations deterministic.
#[derive(Clone, Debug, Default)]
pub struct Assignment {
    values: IndexMap<Variable, usize>
}

impl Assignment {

    /// Construct a new, empty `Assignment`
    pub fn new() -> Assignment {
        Assignment { values: IndexMap::new() }
    }

    /// Assign a state index to the given `Variable`
    ///
    /// # Panics
    /// if `value` is not a valid state index for `var`. Out-of-domain *labels* are rejected with
    /// an error at the `Codebook` boundary; by the time an index reaches an `Assignment` it must
    /// be in range.
    pub fn set(&mut self, var: &Variable, value: usize) {
        if value >= var.cardinality() {
            panic!("Invalid state ({}) for Variable with cardinality ({})", value, var.cardinality());
        }

        self.values.insert(*var, value);
    }

    /// Get the state index assigned to the given `Variable`, if any
    pub fn get(&self, var: &Variable) -> Option<&usize> {
        self.values.get(var)
    }

    /// Check whether the given `Variable` is assigned
    pub fn contains(&self, var: &Variable) -> bool {
        self.values.contains_key(var)
    }

    /// The number of assigned `Variable`s
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the assigned `(Variable, state)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &usize)> {
        self.values.iter()
    }

}


/// Iterator over every complete `Assignment` to a scope of `Variable`s, in row-major order (the
/// last `Variable` in the scope varies fastest). An empty scope yields exactly one empty
/// `Assignment` - the natural base case for factors and CPTs without parents.
pub struct AssignmentIter {
    scope: Vec<Variable>,
    state: Option<Vec<usize>>
}

impl Iterator for AssignmentIter {

    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        let current = match self.state {
            None => return None,
            Some(ref s) => s.clone()
        };

        let mut assignment = Assignment::new();
        for (v, &val) in self.scope.iter().zip(current.iter()) {
            assignment.set(v, val);
        }

        // advance the odometer; the last position rolls over first
        let mut done = true;
        let mut next = current;
        for i in (0..self.scope.len()).rev() {
            next[i] += 1;
            if next[i] < self.scope[i].cardinality() {
                done = false;
                break;
            }
            next[i] = 0;
        }

        self.state = if done { None } else { Some(next) };
        Some(assignment)
    }

}

/// Enumerate all complete `Assignment`s over the given scope
pub fn all_assignments(scope: &[Variable]) -> AssignmentIter {
    AssignmentIter {
        scope: scope.to_vec(),
        state: Some(vec![0; scope.len()])
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn unique_ids() {
        let a = Variable::binary();
        let b = Variable::binary();

        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.cardinality(), 2);
    }

    #[test]
    fn assignment() {
        let a = Variable::binary();
        let b = Variable::discrete(3);

        let mut assn = Assignment::new();
        assert!(assn.is_empty());

        assn.set(&a, 1);
        assn.set(&b, 2);

        assert_eq!(assn.len(), 2);
        assert_eq!(assn.get(&a), Some(&1));
        assert_eq!(assn.get(&b), Some(&2));
        assert!(assn.contains(&a));

        let c = Variable::binary();
        assert_eq!(assn.get(&c), None);
    }

    #[test]
    #[should_panic]
    fn assignment_out_of_range() {
        let a = Variable::binary();
        let mut assn = Assignment::new();
        assn.set(&a, 2);
    }

    #[test]
    fn all_assignments_row_major() {
        let a = Variable::binary();
        let b = Variable::discrete(3);

        let assignments: Vec<Assignment> = all_assignments(&[a, b]).collect();
        assert_eq!(assignments.len(), 6);

        let expected = vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)];
        for (assn, (va, vb)) in assignments.iter().zip(expected) {
            assert_eq!(assn.get(&a), Some(&va));
            assert_eq!(assn.get(&b), Some(&vb));
        }
    }

    #[test]
    fn all_assignments_empty_scope() {
        let assignments: Vec<Assignment> = all_assignments(&[]).collect();
        assert_eq!(assignments.len(), 1);
        assert!(assignments[0].is_empty());
    }

}
