use thiserror::Error;

/// Convenient result alias for the dispatch engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the fallible helper APIs. Planning itself never fails.
#[derive(Debug, Error)]
pub enum Error {
    /// A bearing that is not one of the 16 compass directions.
    #[error("bearing {angle} is not a multiple of 22.5 in [0, 360)")]
    InvalidBearing { angle: f64 },

    /// Query referenced a drone attribute that does not exist.
    #[error("unknown drone attribute: {name}")]
    UnknownAttribute { name: String },

    /// Query used an operator outside `= != < > <= >=`.
    #[error("unknown comparison operator: {operator}")]
    UnknownOperator { operator: String },

    /// Query value could not be read as the attribute's type.
    #[error("value {value:?} is not a valid {expected} for attribute {attribute}")]
    InvalidQueryValue {
        attribute: String,
        value: String,
        expected: &'static str,
    },
}
