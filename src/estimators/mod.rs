//! Defines an `Estimator`, which is used to estimate the parameters of a model from a dataset.

use dataset::Dataset;
use graph::Dag;
use model::DirectedModel;
use util::Result;
use variable::Assignment;

mod mle;
pub use self::mle::CptMLEstimator;
pub use self::mle::ModelMLEstimator;

/// A trait that represents the ability to estimate the parameters of some model (be it a
/// `DirectedModel` or just a local CPD).
pub trait Estimator<'a, T> {

    /// Estimate the value of the parameters from the given dataset
    fn estimate(&mut self, dataset: impl Iterator<Item = &'a Assignment>) -> Result<T>;

}

/// Fit a `DirectedModel` to the dataset under the given structure: one maximum-likelihood CPT per
/// node, named after the dataset's columns.
///
/// Deterministic and idempotent: fitting the same structure to the same data always reproduces
/// identical CPTs.
pub fn fit(dag: &Dag, data: &Dataset) -> Result<DirectedModel> {
    let mut estimator = ModelMLEstimator::new(dag, data.codebook());
    estimator.estimate(data.records().iter())
}
