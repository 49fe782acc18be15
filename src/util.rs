//! Defines the `Error` type for the bayonet library

use std::error::Error;
use std::fmt;
use std::result;

pub type Result<T> = result::Result<T, BayonetError>;

#[derive(Clone, Debug, PartialEq)]
pub enum BayonetError {

    /// Represents an incomplete assignment where a complete assignment was required.
    IncompleteAssignment,

    /// Represents an error where a certain constraint on a scope was not satisfied
    InvalidScope,

    /// Represents an error where there was a parent variable expected, but not found
    MissingParent,

    /// Represents a variable that was present multiple times in a situation where it should only
    /// have been present once
    DuplicateVariable,

    /// A training or evidence value lies outside the recorded domain of its variable. Aborts the
    /// single affected query, never a whole batch.
    Domain {
        variable: String,
        value: String
    },

    /// Normalization encountered zero total probability mass. Indicates an evidence combination
    /// with no mass under the estimated CPTs.
    DegenerateDistribution,

    /// An invalid search configuration. Fatal to the training run; raised before any search
    /// begins.
    InvalidConfiguration(String),

    /// A general error with the given description
    General(String)

}

impl Error for BayonetError {

    fn description(&self) -> &str {
        match self {
            &BayonetError::IncompleteAssignment => "Missing assignments to the required Variables",
            &BayonetError::InvalidScope => "Provided scope did not satisfy constraints",
            &BayonetError::MissingParent => "Missing a parent from the model",
            &BayonetError::DuplicateVariable => "A variable was encountered twice",
            &BayonetError::Domain { .. } => "Value outside the variable's recorded domain",
            &BayonetError::DegenerateDistribution => "Distribution has zero probability mass",
            &BayonetError::InvalidConfiguration(ref err) => err.as_str(),
            &BayonetError::General(ref err) => err.as_str()
        }
    }

    fn cause(&self) -> Option<&Error> {
        None
    }

}

impl fmt::Display for BayonetError {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &BayonetError::Domain { ref variable, ref value } => {
                write!(f, "Value '{}' is not in the recorded domain of variable '{}'", value, variable)
            },
            &BayonetError::InvalidConfiguration(ref err) => {
                write!(f, "Invalid search configuration: {}", err)
            },
            _ => write!(f, "{}", self.description())
        }
    }

}
