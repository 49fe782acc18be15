//! Defines `Estimator`s that use Maximum Likelihood Estimation to estimate the value of
//! parameters given a dataset.
//!
//! Implementation of the MLE parameter estimation scheme for conditional probability
//! distributions described in Koller & Friedman Section 17.2, with one explicit policy choice on
//! top: a parent configuration that never occurs in the data still gets a CPT row, filled with
//! the uniform distribution over the node's states. Inference can therefore always evaluate a
//! query, and an unseen evidence combination shows up as an uninformative posterior rather than a
//! missing row.

use dataset::Codebook;
use factor::{Factor, Table};
use graph::Dag;
use model::{DirectedModel, DirectedModelBuilder};
use super::Estimator;
use util::{Result, BayonetError};
use variable::{Assignment, Variable, all_assignments};

use ndarray::prelude as nd;


/// A Maximum Likelihood `Estimator` for the CPT of a single node given a fixed parent set.
pub struct CptMLEstimator {

    /// The node whose CPT is estimated
    var: Variable,

    /// The node's parents; together with `var` they form the scope `[parents..., var]`
    parents: Vec<Variable>

}

impl CptMLEstimator {

    pub fn new(var: Variable, parents: Vec<Variable>) -> Self {
        CptMLEstimator { var, parents }
    }

}

impl<'a> Estimator<'a, Factor> for CptMLEstimator {

    fn estimate(&mut self, dataset: impl Iterator<Item = &'a Assignment>) -> Result<Factor> {
        let mut scope = self.parents.clone();
        scope.push(self.var);

        // sufficient statistics: count the occurrences of each configuration (K&F Eq. 17.5)
        let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
        let mut counts = Table::zeros(shape.clone());

        for sample in dataset {
            let idx: Vec<Option<&usize>> = scope.iter().map(|v| sample.get(v)).collect();
            if idx.iter().any(|i| i.is_none()) {
                return Err(BayonetError::IncompleteAssignment);
            }

            let idx: Vec<usize> = idx.iter().map(|i| *i.unwrap()).collect();
            counts[nd::IxDyn(&idx)] += 1.0;
        }

        // normalize each parent-configuration row:
        //                  M[u, x]     <-- each value in the counts table
        //      theta x|u = -------
        //                   M[u]       <-- sum along the last axis
        // an unobserved configuration (M[u] = 0) gets the uniform distribution
        let row_totals = counts.sum_axis(nd::Axis(scope.len() - 1));
        let cardinality = self.var.cardinality();
        let uniform = 1.0 / cardinality as f64;

        let mut table = Table::zeros(shape);
        for config in all_assignments(&self.parents) {
            let prefix: Vec<usize> = self.parents.iter().map(|v| *config.get(v).unwrap()).collect();
            let total = row_totals[nd::IxDyn(&prefix)];

            for state in 0..cardinality {
                let mut idx = prefix.clone();
                idx.push(state);

                table[nd::IxDyn(&idx)] = if total == 0.0 {
                    uniform
                } else {
                    counts[nd::IxDyn(&idx)] / total
                };
            }
        }

        Factor::cpd(self.var, self.parents.clone(), table)
    }

}


/// A Maximum Likelihood estimator for a `DirectedModel` under a fixed `Dag`.
///
/// Based on the decomposability of the likelihood function, each CPD can be estimated separately
/// and therefore the `ModelMLEstimator` is really just a 'bag-o-`CptMLEstimator`s'.
pub struct ModelMLEstimator<'a> {

    /// The structure to fit
    dag: &'a Dag,

    /// Variable names for the fitted model
    codebook: &'a Codebook,

    /// The `Estimator` for each node, in topological order
    estimators: Vec<CptMLEstimator>

}

impl<'a> ModelMLEstimator<'a> {

    pub fn new(dag: &'a Dag, codebook: &'a Codebook) -> Self {
        let estimators = dag.topological_order()
                            .into_iter()
                            .map(|node| {
                                let parents = dag.parents(node)
                                                 .iter()
                                                 .map(|&p| dag.variable(p))
                                                 .collect();
                                CptMLEstimator::new(dag.variable(node), parents)
                            })
                            .collect();

        ModelMLEstimator { dag, codebook, estimators }
    }

}

impl<'a, 'b> Estimator<'a, DirectedModel> for ModelMLEstimator<'b> {

    fn estimate(&mut self, dataset: impl Iterator<Item = &'a Assignment>) -> Result<DirectedModel> {
        let data: Vec<&Assignment> = dataset.collect();

        let mut builder = DirectedModelBuilder::new();

        let dag = self.dag;
        for (node, estimator) in dag.topological_order().into_iter().zip(self.estimators.iter_mut()) {
            let cpt = estimator.estimate(data.iter().cloned())?;

            let var = dag.variable(node);
            let parents = dag.parents(node).iter().map(|&p| dag.variable(p)).collect();
            let name = self.codebook.name(&var)
                                    .cloned()
                                    .unwrap_or_else(|| var.to_string());

            builder = builder.with_named_variable(&var, name.as_str(), parents, cpt);
        }

        let model = builder.build()?;
        info!("fitted {} CPTs", model.num_variables());
        Ok(model)
    }

}
