use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryBuildError {
    #[error("Relationship hops require a 'me' anchor (got {0} hop(s) without one)")]
    RelationsRequireAnchor(usize),

    #[error("Invalid coordinate for {field}: {value} (must be a finite number)")]
    InvalidCoordinate { field: &'static str, value: f64 },
}
