//! Defines the `Dag`, the owned structure the learner searches over.
//!
//! Nodes are indices `0..n` into a variable arena (codebook column order), not pointer-based graph
//! objects; edges are per-node sorted parent index sets. The structure is acyclic after every
//! accepted mutation - the checked mutators refuse any edit that would introduce a cycle.

use util::{Result, BayonetError};
use variable::Variable;

/// A directed acyclic graph over an arena of `Variable`s.
#[derive(Clone, Debug, PartialEq)]
pub struct Dag {

    /// The node arena. Node `i` of the graph is `vars[i]`; the order is fixed at construction.
    vars: Vec<Variable>,

    /// The sorted parent indices of each node
    parents: Vec<Vec<usize>>

}

impl Dag {

    /// Construct an edgeless `Dag` over the given variables
    pub fn new(vars: Vec<Variable>) -> Self {
        let parents = vec![Vec::new(); vars.len()];
        Dag { vars, parents }
    }

    /// The number of nodes
    pub fn node_count(&self) -> usize {
        self.vars.len()
    }

    /// The node arena, in construction order
    pub fn variables(&self) -> &[Variable] {
        &self.vars
    }

    /// The `Variable` at a node index
    pub fn variable(&self, node: usize) -> Variable {
        self.vars[node]
    }

    /// The node index of a `Variable`, if present
    pub fn node_of(&self, var: &Variable) -> Option<usize> {
        self.vars.iter().position(|v| v == var)
    }

    /// The sorted parent indices of a node
    pub fn parents(&self, node: usize) -> &[usize] {
        &self.parents[node]
    }

    /// The in-degree of a node
    pub fn in_degree(&self, node: usize) -> usize {
        self.parents[node].len()
    }

    /// Check whether the edge `parent -> child` is present
    pub fn has_edge(&self, parent: usize, child: usize) -> bool {
        self.parents[child].binary_search(&parent).is_ok()
    }

    /// All edges as `(parent, child)` pairs, ordered by parent then child index
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for (child, ps) in self.parents.iter().enumerate() {
            for &parent in ps.iter() {
                edges.push((parent, child));
            }
        }

        edges.sort();
        edges
    }

    /// Check whether a directed path `from ~> to` exists (including the trivial path when
    /// `from == to`)
    pub fn has_path(&self, from: usize, to: usize) -> bool {
        if from == to {
            return true;
        }

        // DFS over child edges
        let mut visited = vec![false; self.vars.len()];
        let mut stack = vec![from];

        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if visited[node] {
                continue;
            }
            visited[node] = true;

            for (child, ps) in self.parents.iter().enumerate() {
                if ps.binary_search(&node).is_ok() && !visited[child] {
                    stack.push(child);
                }
            }
        }

        false
    }

    /// Add the edge `parent -> child`.
    ///
    /// # Errors
    /// * `BayonetError::General` if the edge is a self-loop, already present, or would create a
    ///   cycle
    pub fn add_edge(&mut self, parent: usize, child: usize) -> Result<()> {
        if parent == child {
            return Err(BayonetError::General(String::from("Self-edges are not allowed")));
        }
        if self.has_edge(parent, child) {
            return Err(BayonetError::General(String::from("Edge is already present")));
        }
        if self.has_path(child, parent) {
            return Err(BayonetError::General(String::from("Edge would create a cycle")));
        }

        let pos = self.parents[child].binary_search(&parent).unwrap_err();
        self.parents[child].insert(pos, parent);
        Ok(())
    }

    /// Remove the edge `parent -> child`.
    ///
    /// # Errors
    /// * `BayonetError::General` if the edge is not present
    pub fn remove_edge(&mut self, parent: usize, child: usize) -> Result<()> {
        match self.parents[child].binary_search(&parent) {
            Ok(pos) => {
                self.parents[child].remove(pos);
                Ok(())
            },
            Err(_) => Err(BayonetError::General(String::from("Edge is not present")))
        }
    }

    /// Reverse the edge `parent -> child` to `child -> parent`.
    ///
    /// # Errors
    /// * `BayonetError::General` if the edge is not present or the reversal would create a cycle.
    ///   The graph is unchanged on error.
    pub fn reverse_edge(&mut self, parent: usize, child: usize) -> Result<()> {
        self.remove_edge(parent, child)?;

        if let Err(e) = self.add_edge(child, parent) {
            // restore; binary_search cannot fail because we just removed the edge
            let pos = self.parents[child].binary_search(&parent).unwrap_err();
            self.parents[child].insert(pos, parent);
            return Err(e);
        }

        Ok(())
    }

    /// A topological order of the node indices (parents before children). Deterministic: among
    /// ready nodes, the lowest index is emitted first.
    pub fn topological_order(&self) -> Vec<usize> {
        let n = self.vars.len();
        let mut remaining: Vec<usize> = self.parents.iter().map(|p| p.len()).collect();
        let mut emitted = vec![false; n];
        let mut order = Vec::with_capacity(n);

        while order.len() < n {
            let next = (0..n).find(|&i| !emitted[i] && remaining[i] == 0)
                             .expect("Dag invariant violated: no acyclic order exists");

            emitted[next] = true;
            order.push(next);

            for (child, ps) in self.parents.iter().enumerate() {
                if ps.binary_search(&next).is_ok() {
                    remaining[child] -= 1;
                }
            }
        }

        order
    }

}
