use thiserror::Error;

/// Structural problems detected while building an instance, before any model exists.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("the fleet must contain at least one vehicle")]
    EmptyFleet,
    #[error("vehicle capacity must be finite and non-negative, got {0}")]
    InvalidCapacity(f64),
    #[error("max shift duration must be positive")]
    NonPositiveShiftDuration,
    #[error("handling time per unit must not be negative")]
    NegativeHandlingTime,
    #[error("an instance needs a depot and at least one customer, got {0} nodes")]
    NoCustomers(usize),
    #[error("the depot must have a zero demand, got {0}")]
    DepotDemand(i64),
    #[error("the depot must not carry a time window")]
    DepotTimeWindow,
    #[error("customer {node} demand {demand} exceeds the vehicle capacity {capacity}")]
    DemandExceedsCapacity {
        node: usize,
        demand: i64,
        capacity: f64,
    },
    #[error("customer {node} has an invalid time window [{earliest}, {latest}]")]
    InvalidTimeWindow {
        node: usize,
        earliest: f64,
        latest: f64,
    },
    #[error("at least two period breakpoints are required, got {0}")]
    TooFewBreakpoints(usize),
    #[error("period breakpoints must be finite and strictly increasing")]
    NonIncreasingBreakpoints,
    #[error("{matrix} matrix must be {expected}x{expected}, found a row of length {found}")]
    MatrixDimension {
        matrix: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("expected one travel-time matrix per period ({expected}), got {found}")]
    PeriodCountMismatch { expected: usize, found: usize },
    #[error("{matrix} matrix has an invalid value {value} on arc ({from}, {to})")]
    InvalidMatrixValue {
        matrix: &'static str,
        from: usize,
        to: usize,
        value: f64,
    },
    #[error("the energy model requires energy parameters")]
    MissingEnergyParameters,
    #[error("the energy model requires a battery capacity")]
    MissingBatteryCapacity,
    #[error("battery capacity must be finite and non-negative, got {0}")]
    InvalidBatteryCapacity(f64),
    #[error("energy cost coefficient {name} must be finite and non-negative, got {value}")]
    InvalidCostCoefficient { name: &'static str, value: f64 },
}

/// Checks that `rows` is a square `expected`x`expected` matrix.
pub(crate) fn check_square<T>(
    matrix: &'static str,
    rows: &[Vec<T>],
    expected: usize,
) -> Result<(), ValidationError> {
    if rows.len() != expected {
        return Err(ValidationError::MatrixDimension {
            matrix,
            expected,
            found: rows.len(),
        });
    }

    match rows.iter().find(|row| row.len() != expected) {
        Some(row) => Err(ValidationError::MatrixDimension {
            matrix,
            expected,
            found: row.len(),
        }),
        None => Ok(()),
    }
}

/// Values must not be negative or NaN; `+inf` marks an unreachable arc when allowed.
pub(crate) fn check_values(
    matrix: &'static str,
    values: &[f64],
    num_nodes: usize,
    allow_unreachable: bool,
) -> Result<(), ValidationError> {
    for (index, &value) in values.iter().enumerate() {
        let is_valid = if value.is_infinite() {
            allow_unreachable && value > 0.0
        } else {
            !value.is_nan() && value >= 0.0
        };

        if !is_valid {
            return Err(ValidationError::InvalidMatrixValue {
                matrix,
                from: index / num_nodes,
                to: index % num_nodes,
                value,
            });
        }
    }

    Ok(())
}
