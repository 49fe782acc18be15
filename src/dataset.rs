//! Defines the `Codebook` and `Dataset` types, the boundary between string-level tabular data and
//! the index-level representation the rest of the library computes with.
//!
//! Upstream collaborators (file ingestion, feature derivation, train/test splitting) deliver rows
//! as maps from variable name to categorical state label. A `Dataset` built from those rows fixes
//! each variable's domain once - the sorted unique labels observed in the training table - and
//! every later index-to-label mapping goes through that fixed order. Test rows are encoded against
//! the training `Codebook` and fail with `BayonetError::Domain` on any unseen label; a value is
//! never silently dropped.

use bidir_map::BidirMap;
use indexmap::IndexMap;

use util::{BayonetError, Result};
use variable::{Assignment, Variable};

use std::collections::BTreeSet;

/// A single string-level row: variable name to state label, in column order.
pub type Record = IndexMap<String, String>;


/// Maps `Variable` handles to their names and ordered state-label domains.
#[derive(Debug)]
pub struct Codebook {

    /// Two way lookup between `Variable` handles and user-facing names
    names: BidirMap<Variable, String>,

    /// The fixed, ordered state labels of each `Variable`. Index `i` of the vector is the label
    /// of state `i`; the order is immutable once recorded.
    states: IndexMap<Variable, Vec<String>>

}

impl Codebook {

    fn new() -> Codebook {
        Codebook { names: BidirMap::new(), states: IndexMap::new() }
    }

    fn add(&mut self, name: &str, labels: Vec<String>) -> Variable {
        let var = Variable::discrete(labels.len());
        self.names.insert(var, String::from(name));
        self.states.insert(var, labels);
        var
    }

    /// The `Variable`s in column order
    pub fn variables(&self) -> Vec<Variable> {
        self.states.keys().cloned().collect()
    }

    /// Lookup a `Variable` by name
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.names.get_by_second(&String::from(name))
    }

    /// Lookup a `Variable`'s name
    pub fn name(&self, var: &Variable) -> Option<&String> {
        self.names.get_by_first(var)
    }

    /// The ordered state labels of a `Variable`
    pub fn states(&self, var: &Variable) -> Option<&[String]> {
        self.states.get(var).map(|v| v.as_slice())
    }

    /// Resolve a state label to its index in the recorded domain.
    ///
    /// # Errors
    /// `BayonetError::Domain` if the label was never observed at training time
    pub fn state_index(&self, var: &Variable, label: &str) -> Result<usize> {
        let states = self.states.get(var).ok_or_else(|| {
            BayonetError::General(format!("Variable {} is not in the codebook", var))
        })?;

        states.iter().position(|s| s == label).ok_or_else(|| {
            BayonetError::Domain {
                variable: self.name(var).cloned().unwrap_or_else(|| var.to_string()),
                value: String::from(label)
            }
        })
    }

    /// The label of a state index
    pub fn state_label(&self, var: &Variable, index: usize) -> Option<&str> {
        self.states.get(var).and_then(|s| s.get(index)).map(|s| s.as_str())
    }

    /// Encode a string-level record as an `Assignment`, validating every value against the
    /// recorded domains before any computation touches it.
    ///
    /// # Errors
    /// * `BayonetError::Domain` if any value is outside its variable's domain
    /// * `BayonetError::General` if the record mentions an unknown variable
    pub fn encode(&self, record: &Record) -> Result<Assignment> {
        let mut assignment = Assignment::new();

        for (name, value) in record.iter() {
            let var = *self.variable(name).ok_or_else(|| {
                BayonetError::General(format!("Unknown variable '{}'", name))
            })?;

            let idx = self.state_index(&var, value)?;
            assignment.set(&var, idx);
        }

        Ok(assignment)
    }

}


/// A fully observed, discrete training table: a `Codebook` plus one encoded `Assignment` per row.
#[derive(Debug)]
pub struct Dataset {
    codebook: Codebook,
    rows: Vec<Assignment>
}

impl Dataset {

    /// Build a `Dataset` from string-level records.
    ///
    /// Column order is taken from the first record; each column's domain is the sorted unique
    /// labels observed across all records.
    ///
    /// # Errors
    /// * `BayonetError::General` if `records` is empty
    /// * `BayonetError::IncompleteAssignment` if any record is missing a column
    pub fn from_records(records: &[Record]) -> Result<Dataset> {
        if records.is_empty() {
            return Err(BayonetError::General(String::from("Cannot build a Dataset from zero records")));
        }

        let columns: Vec<String> = records[0].keys().cloned().collect();

        // first pass: discover each column's domain
        let mut codebook = Codebook::new();
        for column in columns.iter() {
            let mut labels = BTreeSet::new();
            for record in records.iter() {
                match record.get(column) {
                    Some(value) => { labels.insert(value.clone()); },
                    None => return Err(BayonetError::IncompleteAssignment)
                }
            }

            codebook.add(column, labels.into_iter().collect());
        }

        // second pass: encode the rows against the now-fixed domains
        let rows: Result<Vec<Assignment>> = records.iter().map(|r| codebook.encode(r)).collect();

        Ok(Dataset { codebook, rows: rows? })
    }

    pub fn codebook(&self) -> &Codebook {
        &self.codebook
    }

    /// The encoded rows of the table
    pub fn records(&self) -> &[Assignment] {
        &self.rows
    }

    /// The number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The `Variable`s of the table, in column order
    pub fn variables(&self) -> Vec<Variable> {
        self.codebook.variables()
    }

}


#[cfg(test)]
pub mod tests {

    use super::*;

    /// Build a `Record` from name/label pairs. Shared across the crate's test modules.
    pub fn record(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().map(|&(k, v)| (String::from(k), String::from(v))).collect()
    }

    #[test]
    fn domains_are_sorted_unique() {
        let records = vec![
            record(&[("color", "red"), ("size", "small")]),
            record(&[("color", "blue"), ("size", "large")]),
            record(&[("color", "red"), ("size", "medium")]),
        ];

        let data = Dataset::from_records(&records).unwrap();
        let vars = data.variables();
        assert_eq!(vars.len(), 2);

        let color = *data.codebook().variable("color").unwrap();
        let size = *data.codebook().variable("size").unwrap();

        assert_eq!(data.codebook().states(&color).unwrap(), ["blue", "red"]);
        assert_eq!(data.codebook().states(&size).unwrap(), ["large", "medium", "small"]);
        assert_eq!(color.cardinality(), 2);
        assert_eq!(size.cardinality(), 3);

        // rows encode against the fixed order
        assert_eq!(data.len(), 3);
        assert_eq!(data.records()[0].get(&color), Some(&1));  // red
        assert_eq!(data.records()[1].get(&size), Some(&0));   // large
    }

    #[test]
    fn encode_rejects_out_of_domain() {
        let records = vec![
            record(&[("a", "0"), ("b", "0")]),
            record(&[("a", "1"), ("b", "1")]),
        ];

        let data = Dataset::from_records(&records).unwrap();
        let bad = record(&[("a", "2"), ("b", "0")]);

        match data.codebook().encode(&bad) {
            Err(BayonetError::Domain { ref variable, ref value }) => {
                assert_eq!(variable, "a");
                assert_eq!(value, "2");
            },
            other => panic!("expected Domain error, got {:?}", other)
        }
    }

    #[test]
    fn missing_cell_is_an_error() {
        let records = vec![
            record(&[("a", "0"), ("b", "0")]),
            record(&[("a", "1")]),
        ];

        assert_eq!(
            Dataset::from_records(&records).unwrap_err(),
            BayonetError::IncompleteAssignment
        );
    }

}
