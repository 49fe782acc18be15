//! Name-level queries and batch classification over a fitted model.
//!
//! This is the surface downstream metric computation consumes: string-level records go in,
//! posteriors and per-row predictions come out. Every evidence value is validated against the
//! training-time `Codebook` before any factor is reduced, so an out-of-domain value surfaces as
//! `BayonetError::Domain` for that row alone - one bad row never fails a batch.

use dataset::{Codebook, Record};
use inference::{ConditionalInferenceEngine, VariableEliminationEngine};
use model::DirectedModel;
use util::{Result, BayonetError};
use variable::Assignment;

use indexmap::IndexMap;


/// The outcome of classifying one record.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {

    /// The record's true state of the target variable
    pub actual: String,

    /// The maximum-posterior state; argmax ties go to the lowest state index
    pub predicted: String,

    /// The posterior probability of the designated positive state
    pub p_positive: f64

}


/// Compute the posterior distribution of one query variable given a string-level evidence record.
///
/// # Returns
/// the posterior keyed by state label, in fixed domain order
///
/// # Errors
/// * `BayonetError::Domain` if any evidence value lies outside its variable's recorded domain
///   (validated before any reduction)
/// * `BayonetError::General` if the query or an evidence variable is unknown
/// * `BayonetError::InvalidScope` if the evidence assigns the query variable itself
/// * `BayonetError::DegenerateDistribution` if the evidence has no mass under the model
pub fn infer(
    model: &DirectedModel,
    codebook: &Codebook,
    query: &str,
    evidence: &Record,
) -> Result<IndexMap<String, f64>> {
    let query_var = *model.lookup_variable(query).ok_or_else(|| {
        BayonetError::General(format!("Unknown query variable '{}'", query))
    })?;

    // domain validation happens here, before any factor is touched
    let assignment = codebook.encode(evidence)?;
    if assignment.contains(&query_var) {
        return Err(BayonetError::InvalidScope);
    }

    let mut engine = VariableEliminationEngine::for_model(model, &assignment);
    let posterior = engine.infer(&vec![query_var].into_iter().collect())?;

    let states = codebook.states(&query_var).ok_or_else(|| {
        BayonetError::General(format!("Variable '{}' is not in the codebook", query))
    })?;

    let mut distribution = IndexMap::new();
    for (index, label) in states.iter().enumerate() {
        let mut assn = Assignment::new();
        assn.set(&query_var, index);
        distribution.insert(label.clone(), posterior.value(&assn)?);
    }

    Ok(distribution)
}


/// Classify a batch of test records against a fitted model.
///
/// Each record's non-target columns become the evidence for one independent inference call, and
/// each row succeeds or fails on its own. The fitted model is read-only throughout, so callers
/// may also fan the rows out across threads.
///
/// # Args
/// * `records`: the test table; each row maps variable name to state label
/// * `target`: the variable to predict
/// * `positive`: the state whose posterior probability is reported per row
///
/// # Errors
/// The outer `Result` fails only on target-level configuration problems (unknown target variable
/// or positive state). Per-row failures (`Domain`, `DegenerateDistribution`) are reported in the
/// row's own slot.
pub fn predict_batch(
    model: &DirectedModel,
    codebook: &Codebook,
    records: &[Record],
    target: &str,
    positive: &str,
) -> Result<Vec<Result<Prediction>>> {
    let target_var = *model.lookup_variable(target).ok_or_else(|| {
        BayonetError::General(format!("Unknown target variable '{}'", target))
    })?;
    // validates the positive label once, up front
    codebook.state_index(&target_var, positive)?;

    let predictions = records.iter()
                             .map(|record| predict_one(model, codebook, record, target, positive))
                             .collect();

    Ok(predictions)
}

fn predict_one(
    model: &DirectedModel,
    codebook: &Codebook,
    record: &Record,
    target: &str,
    positive: &str,
) -> Result<Prediction> {
    let actual = record.get(target)
                       .cloned()
                       .ok_or(BayonetError::IncompleteAssignment)?;

    let evidence: Record = record.iter()
                                 .filter(|&(name, _)| name.as_str() != target)
                                 .map(|(name, value)| (name.clone(), value.clone()))
                                 .collect();

    let posterior = infer(model, codebook, target, &evidence)?;

    // argmax with ties to the lowest state index; the map iterates in domain order
    let mut predicted = None;
    let mut best = ::std::f64::NEG_INFINITY;
    let mut p_positive = 0.0;

    for (label, &p) in posterior.iter() {
        if p > best {
            best = p;
            predicted = Some(label.clone());
        }
        if label.as_str() == positive {
            p_positive = p;
        }
    }

    // safe to unwrap: a variable always has at least one state
    Ok(Prediction { actual, predicted: predicted.unwrap(), p_positive })
}
