pub mod role;
pub mod status;
pub mod storage;

pub use role::Role;
pub use status::{ChallengeStatus, ChallengeType, CourseStatus, InstitutionStatus};

/// Returned when a string does not name a variant of one of the domain enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{invalid}', expected one of: {valid}")]
pub struct ParseEnumError {
    kind: &'static str,
    invalid: String,
    valid: String,
}

impl ParseEnumError {
    pub fn new<'a>(
        kind: &'static str,
        invalid: &str,
        valid: impl Iterator<Item = &'a str>,
    ) -> Self {
        Self {
            kind,
            invalid: invalid.to_string(),
            valid: valid.collect::<Vec<_>>().join(", "),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}
