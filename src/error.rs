use thiserror::Error;

/// Errors that can occur while compiling a chart specification.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Failed to parse chart specification: {0}")]
    JsonParseError(String),

    #[error("View '{view}' has no data source, neither its own nor inherited from a parent view")]
    MissingDataSource { view: String },

    #[error("Field '{field}' required by the {node} transform is not available from its data source")]
    MissingField { field: String, node: String },

    #[error("Selection '{0}' is referenced but not defined in any view")]
    SelectionNotFound(String),

    #[error("Invalid event selector '{selector}': {message}")]
    InvalidEventSelector { selector: String, message: String },

    #[error(
        "Interval selection '{selection}' needs an event stream with a start and end event, e.g. '[mousedown, mouseup] > mousemove'"
    )]
    IntervalWithoutBetween { selection: String },

    #[error("Interval selection '{selection}' must project the x or y encoding channel")]
    IntervalWithoutPosition { selection: String },

    #[error(transparent)]
    TimeUnit(#[from] TimeUnitError),
}

/// Errors raised by time unit parsing and date conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeUnitError {
    #[error("Cannot convert to time units containing 'day': '{0}'")]
    ContainsDay(String),

    #[error("'{0}' is not a valid time unit")]
    Unknown(String),

    #[error("Date '{0}' cannot be represented after truncation")]
    OutOfRange(String),
}
