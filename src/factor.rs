//! Definition of the factor module
//!
//! A `Factor` is a table over the joint states of a set of `Variable`s - the generalization of a
//! CPT used during estimation and inference. Operations follow Koller & Friedman: factor product
//! (Section 4.2.1), reduction (4.2.3) and marginalization (9.3.1).

use util::{Result, BayonetError};
use variable::{Variable, Assignment, all_assignments};

use ndarray::prelude as nd;

/// Alias f64 ndarray::Array as Table
pub type Table = nd::ArrayD<f64>;


#[derive(Clone, Debug)]
pub enum Factor {
    /// The empty, identity `Factor` with no scope. This type exists for dealing with arithmetic
    /// operations of `Factor`s
    Identity,

    /// A `Factor` over some scope of variables, represented as a table as described in Koller
    /// & Friedman.
    TableFactor {
        /// The scope of the `Factor`
        scope: Vec<Variable>,

        /// The values of the `Factor` table. Axis `i` ranges over the states of `scope[i]`.
        table: Table,

        /// `true`, if the `Factor` is a conditional probability distribution of its last scope
        /// variable given the others - every lane along the last axis sums to 1
        cpd: bool
    }
}


impl Factor {

    /// Get the identity factor
    pub fn identity() -> Self {
        Factor::Identity
    }


    /// Create a new, unnormalized `Factor`
    ///
    /// # Errors
    /// * `BayonetError::General` if the scope is empty, the table dimensionality does not match
    ///   the scope, or any dimension does not match its variable's cardinality
    /// * `BayonetError::General` if any value is negative
    pub fn new(scope: Vec<Variable>, table: Table) -> Result<Self> {
        Factor::build(scope, table, false)
    }


    /// Create a CPT `Factor` representing ```P(var | parents)```.
    ///
    /// The scope is ```[parents..., var]``` and the table shape must match; every lane of the
    /// last axis (one per joint parent configuration) must sum to 1.
    pub fn cpd(var: Variable, parents: Vec<Variable>, table: Table) -> Result<Self> {
        let mut scope = parents;
        scope.push(var);
        Factor::build(scope, table, true)
    }


    fn build(scope: Vec<Variable>, table: Table, cpd: bool) -> Result<Self> {
        if scope.is_empty() {
            return Err(
                BayonetError::General(
                    String::from("Invalid arguments. Scope may not be empty")
                )
            );
        } else if scope.len() != table.ndim() {
            return Err(
                BayonetError::General(
                    String::from("Invalid arguments. Cardinality of scope must match number of table dimensions")
                )
            );
        }

        for (v, t) in scope.iter().map(|v| v.cardinality()).zip(table.shape().iter()) {
            if v != *t {
                return Err(
                    BayonetError::General(
                        String::from("Invalid arguments. Dimensions do not match")
                    )
                );
            }
        }

        if table.iter().any(|&v| v < 0.0) {
            return Err(
                BayonetError::General(
                    String::from("Invalid arguments. Factor values may not be negative")
                )
            );
        }

        // verify the table represents a CPD if the caller says it does: each lane along the last
        // axis is one conditional distribution and must sum to 1
        if cpd {
            let last = nd::Axis(scope.len() - 1);
            let rows = table.sum_axis(last);
            if rows.iter().any(|&s| (s - 1.0).abs() > 1e-9) {
                return Err(
                    BayonetError::General(
                        String::from("Invalid arguments. Requested a CPD, but the rows are not normalized")
                    )
                );
            }
        }

        Ok(Factor::TableFactor { scope, table, cpd })
    }


    /// Check if the `Factor` is the identity `Factor`
    pub fn is_identity(&self) -> bool {
        match self {
            &Factor::Identity => true,
            _ => false
        }
    }


    /// Check if the `Factor` is a Conditional Probability Distribution.
    ///
    /// # Note
    /// A conditional probability distribution is a specialization of a `Factor`. All CPDs are
    /// `Factor`s, but not all `Factor`s are CPDs. The identity `Factor` is considered a CPD.
    pub fn is_cpd(&self) -> bool {
        match self {
            &Factor::Identity => true,
            &Factor::TableFactor { cpd, .. } => cpd
        }
    }


    /// Retrieve the scope of the `Factor`.
    ///
    /// # Note
    /// This method returns a clone of the `Factor`'s scope. `Variable`s are lightweight and
    /// therefore this is an acceptable overhead
    pub fn scope(&self) -> Vec<Variable> {
        match self {
            &Factor::Identity => vec![],
            &Factor::TableFactor { ref scope, .. } => scope.clone()
        }
    }


    /// Retrieve the value for a complete assignment over the scope of this `Factor`
    ///
    /// # Args
    /// assignment: a full assignment to the scope of a `Factor`. The assignment's scope may be a
    ///             superset of the `Factor`s scope.
    ///
    /// # Errors
    /// * `BayonetError::General` if the `Factor` is the identity
    /// * `BayonetError::IncompleteAssignment`, if assignment is not a complete assignment to the
    ///   scope of the `Factor`
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        match self {
            &Factor::Identity => {
                Err(BayonetError::General(String::from("The identity factor has no value")))
            },
            &Factor::TableFactor { ref scope, ref table, .. } => {
                let idxs: Vec<Option<&usize>> = scope.iter().map(|v| assignment.get(v)).collect();
                if idxs.iter().any(|&v| v.is_none()) {
                    return Err(BayonetError::IncompleteAssignment);
                }

                let idxs: Vec<usize> = idxs.iter().map(|&v| *(v.unwrap())).collect();
                Ok(table[nd::IxDyn(&idxs)])
            }
        }
    }


    /// Product of this `Factor` and another `Factor`.
    ///
    /// Defined in Koller & Friedman Section 4.2.1. Disjoint scopes are legal: the result is then
    /// the outer product, which the final multiply of variable elimination relies on. Two factors
    /// can never disagree on a shared variable's domain because the cardinality rides on the
    /// `Variable` handle itself.
    ///
    /// # Returns
    /// A new `Factor` of scope union(self.scope(), other.scope())
    pub fn product(&self, other: &Self) -> Result<Self> {
        // Factor::Identity is the multiplicative identity
        if let &Factor::Identity = self {
            return Ok(other.clone());
        } else if let &Factor::Identity = other {
            return Ok(self.clone());
        }

        // We are computing a new factor Psi(X, Y, Z) = phi1(X, Y) * phi2(Y, Z).
        // See Koller & Friedman Definition 4.2
        let mut new_scope = self.scope();
        for v in other.scope() {
            if !new_scope.contains(&v) {
                new_scope.push(v);
            }
        }

        let new_shape: Vec<usize> = new_scope.iter().map(|v| v.cardinality()).collect();
        let mut tbl = nd::Array::ones(new_shape).into_dyn();

        for assn in all_assignments(&new_scope) {
            // For each assignment, multiply the values in each and store the result in the
            // new table.
            //
            // Unwrapping here is safe because a failed lookup should be impossible if
            // invariants are maintained
            let phi1_val = self.value(&assn).unwrap();
            let phi2_val = other.value(&assn).unwrap();

            let idx: Vec<usize> = new_scope.iter().map(|v| *assn.get(v).unwrap()).collect();
            tbl[nd::IxDyn(&idx)] = phi1_val * phi2_val;
        }

        Factor::new(new_scope, tbl)
    }


    /// Reduce the `Factor` over the given partial assignment, fixing each assigned in-scope
    /// variable to its observed state and dropping it from the scope.
    ///
    /// Defined in Koller & Friedman 4.2.3
    ///
    /// # Args
    /// assignment: a partial assignment to the `Factor`. State indices are validated against each
    ///             variable's cardinality when the `Assignment` is built.
    ///
    /// # Returns
    /// A new `Factor` reduced over the given assignment. A complete assignment reduces to the
    /// identity `Factor`.
    pub fn reduce(&self, assignment: &Assignment) -> Self {
        match self {
            &Factor::Identity => Factor::Identity,
            &Factor::TableFactor { ref scope, ref table, .. } => {
                let mut view = table.view();
                let mut new_scope: Vec<Variable> = Vec::new();
                let mut removed = 0;

                for (i, v) in scope.iter().enumerate() {
                    if let Some(&val) = assignment.get(v) {
                        // each collapsed axis shifts the ones after it
                        view = view.into_subview(nd::Axis(i - removed), val);
                        removed += 1;
                    } else {
                        new_scope.push(*v);
                    }
                }

                if new_scope.is_empty() {
                    Factor::Identity
                } else if new_scope.len() == scope.len() {
                    self.clone()
                } else {
                    Factor::new(new_scope, view.to_owned())
                        .expect("reduce encountered unexpected error")
                }
            }
        }
    }


    /// Marginalize the `Factor` over the given `Variable`, summing it out of the table.
    ///
    /// Defined in Koller & Friedman 9.3.1
    ///
    /// # Args
    /// other: the `Variable` over which to marginalize. A variable outside the scope is a no-op.
    ///
    /// # Returns
    /// another `Factor`, marginalized over the given `Variable`. Marginalizing the last scope
    /// variable yields the identity `Factor`.
    pub fn marginalize(&self, other: Variable) -> Self {
        match self {
            // the identity factor marginalized over anything is the identity
            &Factor::Identity => Factor::Identity,

            &Factor::TableFactor { ref scope, ref table, .. } => {
                if let Some(idx) = scope.iter().position(|&v| v == other) {
                    if scope.len() == 1 {
                        return Factor::Identity;
                    }

                    let new_table = table.sum_axis(nd::Axis(idx));
                    let new_scope = scope.clone().into_iter().filter(|&v| v != other).collect();

                    Factor::new(new_scope, new_table).expect(
                        "marginalize encountered error that should never occur"
                    )
                } else {
                    self.clone()
                }
            }
        }
    }


    /// Normalize the `Factor` so its values sum to 1 over the free variables.
    ///
    /// # Errors
    /// * `BayonetError::DegenerateDistribution` if the table sums to zero - an evidence
    ///   combination with no probability mass under the model
    pub fn normalize(&self) -> Result<Self> {
        match self {
            &Factor::Identity => Ok(Factor::Identity),
            &Factor::TableFactor { ref scope, ref table, .. } => {
                let z = table.scalar_sum();
                if z == 0.0 {
                    return Err(BayonetError::DegenerateDistribution);
                }

                let cpd = scope.len() == 1;
                Ok(Factor::TableFactor {
                    scope: scope.clone(),
                    table: table / z,
                    cpd
                })
            }
        }
    }

}


// Unit tests
#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn identity() {
        let f = Factor::identity();

        assert!(f.is_identity());
        assert!(f.is_cpd());
        assert!(f.scope().is_empty());
    }

    #[test]
    fn table_factor_errs() {
        // empty scope
        let table = Table::ones(vec![2, 5, 3]);
        let f = Factor::new(vec![], table);
        assert!(f.is_err());

        // mismatched number of dimensions
        let vars = vec![ Variable::binary(), Variable::binary() ];
        let table = Table::ones(vec![2, 2, 2]);
        assert!(Factor::new(vars.clone(), table).is_err());

        // wrong cardinality
        let table = Table::ones(vec![2, 3]);
        assert!(Factor::new(vars.clone(), table).is_err());

        // negative value
        let mut table = Table::ones(vec![2, 2]);
        table[[0, 1].as_ref()] = -1.0;
        assert!(Factor::new(vars.clone(), table).is_err());
    }

    #[test]
    fn cpd_rows_must_normalize() {
        let x = Variable::binary();
        let y = Variable::binary();

        // each row along the last axis sums to 1
        let f = Factor::cpd(y, vec![x], array![[0.95, 0.05], [0.2, 0.8]].into_dyn());
        assert!(f.is_ok());
        assert!(f.unwrap().is_cpd());

        // total sums to 1, but rows do not
        let f = Factor::cpd(y, vec![x], array![[0.25, 0.25], [0.25, 0.25]].into_dyn());
        assert!(f.is_err());
    }

    #[test]
    fn value() {
        let vars = vec![ Variable::binary(), Variable::discrete(3) ];
        let mut table = Table::zeros(vec![2, 3]);
        for (i, (x, y)) in iproduct!(0..2, 0..3).enumerate() {
            table[[x, y].as_ref()] = i as f64;
        }

        let f = Factor::new(vars.clone(), table).unwrap();

        for (i, (x, y)) in iproduct!(0..2, 0..3).enumerate() {
            let mut assn = Assignment::new();
            assn.set(&vars[0], x);
            assn.set(&vars[1], y);
            assert_eq!(i as f64, f.value(&assn).unwrap());
        }

        // incomplete assignment
        let mut assn = Assignment::new();
        assn.set(&vars[0], 0);
        assert_eq!(f.value(&assn).unwrap_err(), BayonetError::IncompleteAssignment);
    }

    #[test]
    /// Example taken from Koller & Friedman Figure 4.3
    fn product() {
        let a = Variable::discrete(3);
        let b = Variable::binary();
        let c = Variable::binary();

        let tbl1 = nd::Array::from_shape_vec(
            (3, 2),
            vec![ 0.5, 0.8, 0.1, 0.0, 0.3, 0.9 ]
        ).unwrap().into_dyn();
        let phi1 = Factor::new(vec![ a, b ], tbl1).unwrap();

        let tbl2 = nd::Array::from_shape_vec(
            (2, 2),
            vec![ 0.5, 0.7, 0.1, 0.2 ]
        ).unwrap().into_dyn();
        let phi2 = Factor::new(vec![ b, c ], tbl2).unwrap();

        let psi = phi1.product(&phi2).unwrap();
        assert_eq!(psi.scope(), vec![ a, b, c ]);

        for assn in all_assignments(&[a, b, c]) {
            let expected = phi1.value(&assn).unwrap() * phi2.value(&assn).unwrap();
            assert!((psi.value(&assn).unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn product_disjoint_scopes() {
        let a = Variable::binary();
        let b = Variable::binary();

        let phi1 = Factor::new(vec![ a ], array![0.3, 0.7].into_dyn()).unwrap();
        let phi2 = Factor::new(vec![ b ], array![0.9, 0.1].into_dyn()).unwrap();

        let psi = phi1.product(&phi2).unwrap();
        assert_eq!(psi.scope(), vec![ a, b ]);

        for assn in all_assignments(&[a, b]) {
            let expected = phi1.value(&assn).unwrap() * phi2.value(&assn).unwrap();
            assert!((psi.value(&assn).unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn product_identity() {
        let a = Variable::binary();
        let phi = Factor::new(vec![ a ], array![0.3, 0.7].into_dyn()).unwrap();

        let psi = Factor::identity().product(&phi).unwrap();
        assert_eq!(psi.scope(), vec![ a ]);

        let psi = phi.product(&Factor::identity()).unwrap();
        assert_eq!(psi.scope(), vec![ a ]);
    }

    #[test]
    fn reduce() {
        let a = Variable::discrete(3);
        let b = Variable::binary();
        let c = Variable::binary();

        let mut table = Table::zeros(vec![3, 2, 2]);
        for (i, (x, y, z)) in iproduct!(0..3, 0..2, 0..2).enumerate() {
            table[[x, y, z].as_ref()] = i as f64;
        }
        let f = Factor::new(vec![ a, b, c ], table).unwrap();

        // reduce two of three variables; exercises the axis-shift bookkeeping
        let mut evidence = Assignment::new();
        evidence.set(&a, 2);
        evidence.set(&c, 1);

        let reduced = f.reduce(&evidence);
        assert_eq!(reduced.scope(), vec![ b ]);

        for y in 0..2 {
            let mut full = Assignment::new();
            full.set(&a, 2);
            full.set(&b, y);
            full.set(&c, 1);

            let mut partial = Assignment::new();
            partial.set(&b, y);

            assert_eq!(f.value(&full).unwrap(), reduced.value(&partial).unwrap());
        }

        // complete assignment reduces to the identity
        let mut evidence = Assignment::new();
        evidence.set(&a, 0);
        evidence.set(&b, 0);
        evidence.set(&c, 0);
        assert!(f.reduce(&evidence).is_identity());

        // assignment disjoint from the scope leaves the factor unchanged
        let d = Variable::binary();
        let mut evidence = Assignment::new();
        evidence.set(&d, 1);
        assert_eq!(f.reduce(&evidence).scope(), vec![ a, b, c ]);
    }

    #[test]
    fn marginalize() {
        let a = Variable::binary();
        let b = Variable::discrete(3);

        let mut table = Table::zeros(vec![2, 3]);
        for (i, (x, y)) in iproduct!(0..2, 0..3).enumerate() {
            table[[x, y].as_ref()] = i as f64;
        }
        let f = Factor::new(vec![ a, b ], table).unwrap();

        let m = f.marginalize(b);
        assert_eq!(m.scope(), vec![ a ]);

        for x in 0..2 {
            let mut assn = Assignment::new();
            assn.set(&a, x);

            let expected: f64 = (0..3).map(|y| {
                let mut full = Assignment::new();
                full.set(&a, x);
                full.set(&b, y);
                f.value(&full).unwrap()
            }).sum();

            assert!((m.value(&assn).unwrap() - expected).abs() < 1e-12);
        }

        // marginalizing a variable outside the scope is a no-op
        let c = Variable::binary();
        assert_eq!(f.marginalize(c).scope(), vec![ a, b ]);

        // marginalizing the last variable yields the identity
        assert!(m.marginalize(a).is_identity());
    }

    #[test]
    fn normalize() {
        let a = Variable::binary();
        let f = Factor::new(vec![ a ], array![3.0, 1.0].into_dyn()).unwrap();

        let n = f.normalize().unwrap();
        assert!(n.is_cpd());

        let mut assn = Assignment::new();
        assn.set(&a, 0);
        assert!((n.value(&assn).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn normalize_zero_mass() {
        let a = Variable::binary();
        let f = Factor::new(vec![ a ], array![0.0, 0.0].into_dyn()).unwrap();

        assert_eq!(f.normalize().unwrap_err(), BayonetError::DegenerateDistribution);
    }

}
