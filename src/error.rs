//! Error types.
//!
//! - `JetError` is returned by the library. Every variant is a structural or
//!   configuration problem that halts a run; numeric trouble inside a single
//!   cell never becomes an error (it is recorded as a missing sample instead).
//! - `AppError` is what the `stj` binary reports: a message plus a process exit
//!   code (2 = configuration/usage, 3 = input data, 4 = computation/output).

/// Fatal precondition violations detected before or between computations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JetError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// A coordinate vector is empty, non-finite or not strictly monotonic.
    #[error("invalid {axis} coordinate: {reason}")]
    InvalidCoordinate {
        axis: &'static str,
        reason: String,
    },

    /// A 4-D field does not match the grid it is attached to.
    #[error("field '{field}' has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        field: &'static str,
        actual: Vec<usize>,
        expected: Vec<usize>,
    },

    /// No consistent assignment of named axes to array dimensions.
    #[error("cannot identify the {dim} axis of an array with shape {shape:?}")]
    AxisUnresolved { dim: &'static str, shape: Vec<usize> },

    /// Axis tags repeat or miss a dimension.
    #[error("axis order {order} must name time, level, lat and lon exactly once")]
    InvalidAxisOrder { order: String },

    /// Pressure-level input without potential temperature.
    #[error("pressure-level data needs a potential temperature field")]
    MissingTheta,

    /// Time units string is not of the form `<unit> since <date>`.
    #[error("unsupported time units '{units}'")]
    InvalidTimeUnits { units: String },

    /// Unknown CF calendar name.
    #[error("unsupported calendar '{calendar}'")]
    InvalidCalendar { calendar: String },

    /// Two records cannot be concatenated.
    #[error("cannot merge jet records: {reason}")]
    MergeMismatch { reason: String },

    /// Two records overlap or are out of chronological order.
    #[error("cannot merge jet records: time {next} does not follow {last}")]
    ChunkOverlap { last: f64, next: f64 },

    /// No time steps fall inside the requested period.
    #[error("no time steps between {year_s} and {year_e}")]
    EmptySelection { year_s: i32, year_e: i32 },
}

impl JetError {
    /// Exit code used when this error terminates the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            JetError::InvalidConfig { .. } | JetError::InvalidAxisOrder { .. } => 2,
            JetError::InvalidCoordinate { .. }
            | JetError::ShapeMismatch { .. }
            | JetError::AxisUnresolved { .. }
            | JetError::MissingTheta
            | JetError::InvalidTimeUnits { .. }
            | JetError::InvalidCalendar { .. }
            | JetError::EmptySelection { .. } => 3,
            JetError::MergeMismatch { .. } | JetError::ChunkOverlap { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<JetError> for AppError {
    fn from(err: JetError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
