//! Defines a `ConditionalInferenceEngine` that uses exact inference by variable elimination to
//! answer conditional inference queries.
//!
//! Implementation of Koller & Friedman Algorithm 9.1 - Sum-Product-VE

use factor::Factor;
use model::DirectedModel;
use super::ConditionalInferenceEngine;
use util::{Result, BayonetError};
use variable::{Assignment, Variable};

use std::collections::HashSet;

pub struct VariableEliminationEngine {

    /// the model's CPTs, reduced by the evidence - the 'bag of factors' elimination runs over
    factors: Vec<Factor>,

    /// precomputed elimination order over the unobserved variables: reverse topological order of
    /// the model. Any order is correctness-preserving; the order only shapes the intermediate
    /// factor sizes, and eliminating leaves-first keeps them small for tree-like structures.
    order: Vec<Variable>,

    /// the product of the CPT entries whose scope the evidence covers entirely. Reducing such a
    /// factor yields the scopeless identity and would silently drop its value - in particular a
    /// zero, which must surface as a degenerate distribution.
    evidence_mass: f64

}

impl VariableEliminationEngine {

    /// Construct an engine for the given model, conditioned on the evidence.
    ///
    /// Every CPT is reduced by the evidence up front; observed variables leave every factor's
    /// scope before elimination begins. Evidence state indices are validated at the `Assignment`
    /// boundary, so no mid-computation domain failure is possible.
    pub fn for_model(model: &DirectedModel, evidence: &Assignment) -> Self {
        let mut factors = Vec::new();
        let mut evidence_mass = 1.0;

        for v in model.topological_order().iter() {
            // safe to unwrap: every model variable has a CPT
            let cpt = model.cpd(v).unwrap();
            let reduced = cpt.reduce(evidence);

            if reduced.is_identity() {
                // fully observed scope; keep the entry's value rather than the factor
                evidence_mass *= cpt.value(evidence).unwrap();
            } else {
                factors.push(reduced);
            }
        }

        let mut order: Vec<Variable> = model.topological_order()
                                            .into_iter()
                                            .filter(|v| !evidence.contains(v))
                                            .collect();
        order.reverse();

        VariableEliminationEngine { factors, order, evidence_mass }
    }

}

impl ConditionalInferenceEngine for VariableEliminationEngine {

    fn infer(&mut self, variables: &HashSet<Variable>) -> Result<Factor> {
        // check input arguments
        if variables.iter().any(|v| !self.order.contains(v)) {
            // a variable requested is observed or not in the model
            return Err(BayonetError::InvalidScope);
        }

        if self.evidence_mass == 0.0 {
            // the evidence itself has no probability under the model
            return Err(BayonetError::DegenerateDistribution);
        }

        let mut phis = self.factors.clone();
        for &var in self.order.iter() {
            if variables.contains(&var) {
                // we are computing P(var | e), so do not eliminate the variable
                continue;
            }

            // product step - multiply together all factors that mention var
            let (phi_1prime, phi_2prime): (Vec<Factor>, Vec<Factor>) = phis
                                           .into_iter()
                                           .partition(|f| f.scope().contains(&var));

            let mut psi = Factor::identity();
            for phi in phi_1prime {
                psi = psi.product(&phi)?;
            }

            // sum step - marginalize psi over var
            let tau = psi.marginalize(var);

            phis = phi_2prime;
            if !tau.is_identity() {
                phis.push(tau);
            }
        }

        // multiply together remaining phis
        let mut phi_star = Factor::identity();
        for phi in phis {
            phi_star = phi_star.product(&phi)?;
        }

        // we now have an unnormalized distribution; normalizing yields the conditional. Zero
        // total mass means the evidence combination has no probability under the model.
        phi_star.normalize()
    }

}
