//! bayonet - a discrete Bayesian-network classifier.
//!
//! The pipeline: a `dataset::Dataset` of fully observed categorical rows feeds
//! `learn::HillClimbSearch`, which produces a `graph::Dag` by greedy local search under the
//! decomposable BIC score of `score::BicScorer`; `estimators::fit` turns the structure into a
//! `model::DirectedModel` of maximum-likelihood CPTs; `classify` answers posterior queries and
//! batch predictions by exact variable elimination (`inference`).

extern crate bidir_map;
extern crate indexmap;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate log;
#[macro_use]
extern crate ndarray;

pub mod variable;
pub mod dataset;
pub mod factor;
pub mod graph;
pub mod score;
pub mod learn;
pub mod estimators;
pub mod model;
pub mod inference;
pub mod classify;
pub mod util;
pub use util::{Result, BayonetError};
