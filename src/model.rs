//! Defines a `DirectedModel`, a Bayesian network that represents the factorization of a
//! probability distribution P.

use factor::Factor;
use util::{Result, BayonetError};
use variable::{Assignment, Variable};

use bidir_map::BidirMap;
use indexmap::IndexMap;

use std::collections::HashSet;


/// Represents a Bayesian Network - a Directed Probabilistic Graphical Model.
///
/// # Representation
/// The network is represented as a Directed Acyclic Graph (DAG). A traditional graph data
/// structure is not used for the simple representation of a `DirectedModel`; instead, the
/// Conditional Probability Distribution (CPD) of each `Variable` implicitly defines the edges of
/// the graph. The `Variable`s are held in their topological order to facilitate efficient
/// computations over the graph.
///
/// A `DirectedModel` is immutable once built: all inference runs against `&DirectedModel`, so a
/// fitted model may serve any number of concurrent queries.
#[derive(Debug)]
pub struct DirectedModel {

    /// The `Variable`s comprising the scope of the `DirectedModel` and their associated CPDs. The
    /// `Factor` associated with a `Variable` ```X``` has scope ```Pa(X) U X```, where ```Pa(X)```
    /// are the parents of ```X```; the map therefore encodes the edges ```P -> X``` for all
    /// ```P in Pa(X)```.
    graph: IndexMap<Variable, Factor>,

    /// The user-defined names of each `Variable`. This is a two way lookup ```(Variable->Name)```
    /// and ```(Name->Variable)```
    names: BidirMap<Variable, String>

}

impl DirectedModel {

    /// Get the `Factor` (CPT) for the given variable in this model.
    pub fn cpd(&self, v: &Variable) -> Option<&Factor> {
        self.graph.get(v)
    }

    /// Get a topological order of the `DirectedModel`
    pub fn topological_order(&self) -> Vec<Variable> {
        self.graph.keys().cloned().collect()
    }

    /// Lookup a `Variable` in the `DirectedModel` based on the name
    pub fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.names.get_by_second(&String::from(name))
    }

    /// Lookup a `Variable`'s name in the `DirectedModel`.
    pub fn lookup_name(&self, var: &Variable) -> Option<&String> {
        self.names.get_by_first(var)
    }

    /// Get all `Variable`s in the model.
    pub fn variables(&self) -> HashSet<Variable> {
        self.graph.keys().cloned().collect()
    }

    /// Get the number of `Variable`s in the the `DirectedModel`
    pub fn num_variables(&self) -> usize {
        self.graph.len()
    }

    /// Determine the probability of a full `Assignment` to the `Variable`s in the `DirectedModel`.
    ///
    /// Specifically, this computes ```P(zeta)```, where ```zeta``` is a full assignment, by the
    /// chain rule for Bayesian networks.
    ///
    /// # Errors
    /// * `BayonetError::IncompleteAssignment` if the assignment does not cover the model
    pub fn probability(&self, assignment: &Assignment) -> Result<f64> {
        self.graph.values()
                  .map(|cpt| cpt.value(assignment))
                  .fold(Ok(1.0), |acc, val| acc.and_then(|p| val.map(|v| p * v)))
    }

}


/// An implementation of the [builder pattern] for creating a `DirectedModel`.
///
/// Models must be assembled in topological order: every parent of a variable must already be in
/// the model when the variable is added.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
pub struct DirectedModelBuilder {

    /// The `Variable`s and their associated CPDs
    factors: IndexMap<Variable, Factor>,

    /// The names of each `Variable`
    names: BidirMap<Variable, String>,

    /// The error state of the builder
    err: Option<BayonetError>

}

impl DirectedModelBuilder {

    /// Construct a new `DirectedModelBuilder` representing an empty `DirectedModel`
    pub fn new() -> Self {
        DirectedModelBuilder {
            factors: IndexMap::new(),
            names: BidirMap::new(),
            err: None
        }
    }

    /// Add a named `Variable` to the `DirectedModel`.
    ///
    /// # Args
    /// * `var`: the variable to add to the model
    /// * `name`: the name for the variable
    /// * `parents`: the parent variables. The parents must already be in the model.
    /// * `cpt`: the CPT ```P(var | parents)```; its scope must be exactly ```parents U {var}```
    pub fn with_named_variable(
        mut self,
        var: &Variable,
        name: &str,
        parents: HashSet<Variable>,
        cpt: Factor,
    ) -> Self {
        // if we are in an error state, do nothing
        if self.err.is_some() {
            return self;
        }

        if parents.iter().any(|v| !self.factors.contains_key(v)) {
            self.err = Some(BayonetError::MissingParent);
            return self;
        }

        if self.factors.contains_key(var) {
            self.err = Some(BayonetError::DuplicateVariable);
            return self;
        }

        if !cpt.is_cpd() {
            self.err = Some(BayonetError::General(
                String::from("The factor for a model variable must be a CPD")
            ));
            return self;
        }

        let scope = cpt.scope();
        let scope_ok = scope.len() == parents.len() + 1
            && scope.last() == Some(var)
            && parents.iter().all(|p| scope.contains(p));
        if !scope_ok {
            self.err = Some(BayonetError::InvalidScope);
            return self;
        }

        self.factors.insert(*var, cpt);
        self.names.insert(*var, String::from(name));

        self
    }

    /// Complete building the model.
    ///
    /// # Returns
    /// the `DirectedModel`, or an error if one was generated during the building process
    ///
    /// # Postcondition
    /// This call consumes the `DirectedModelBuilder`
    pub fn build(self) -> Result<DirectedModel> {
        match self.err {
            Some(e) => Err(e),
            None => Ok(DirectedModel { graph: self.factors, names: self.names })
        }
    }

}
