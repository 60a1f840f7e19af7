//! Small reusable risk checks, generic over the value being checked.
//! Kept deliberately minimal — a check here is a one-line predicate,
//! not a full risk engine.

use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// General interface for a single risk check.
pub trait RiskCheck {
    type Input;
    type Error;

    fn name() -> &'static str;
    fn check(&self, input: &Self::Input) -> Result<(), Self::Error>;
}

/// Passes iff `input <= limit`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Deserialize, Serialize, Constructor)]
pub struct CheckHigherThan<T> {
    pub limit: T,
}

impl<T> RiskCheck for CheckHigherThan<T>
where
    T: Clone + PartialOrd + std::fmt::Debug,
{
    type Input = T;
    type Error = CheckHigherThanError<T>;

    fn name() -> &'static str {
        "CheckHigherThan"
    }

    fn check(&self, input: &Self::Input) -> Result<(), Self::Error> {
        if input > &self.limit {
            Err(CheckHigherThanError {
                input: input.clone(),
                limit: self.limit.clone(),
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error, Constructor)]
#[error("CheckHigherThan failed: input {input:?} > limit {limit:?}")]
pub struct CheckHigherThanError<T: std::fmt::Debug> {
    pub input: T,
    pub limit: T,
}
