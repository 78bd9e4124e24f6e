//! Caller-visible rendering of a race result.
//!
//! Successes and failures use disjoint JSON shapes so a caller can tell them
//! apart structurally:
//!
//! ```text
//! {"cep":"01001-000","addressLine":"Praça da Sé","district":"Sé","city":"São Paulo","region":"SP","provider":"viacep"}
//! {"message":"exceeded timeout of 1 second :("}
//! ```

use serde::{Deserialize, Serialize};

use crate::race::{RaceFailure, RaceResult, RaceSuccess};
use crate::{Address, ProviderId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Report {
    Found(FoundReport),
    Failed(FailedReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundReport {
    #[serde(flatten)]
    pub address: Address,
    pub provider: ProviderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedReport {
    pub message: String,
}

impl Report {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl From<&RaceSuccess> for Report {
    fn from(success: &RaceSuccess) -> Self {
        Self::Found(FoundReport {
            address: success.address.clone(),
            provider: success.provider,
        })
    }
}

impl From<&RaceFailure> for Report {
    fn from(failure: &RaceFailure) -> Self {
        Self::Failed(FailedReport {
            message: failure.error.message().to_owned(),
        })
    }
}

impl From<&RaceResult> for Report {
    fn from(result: &RaceResult) -> Self {
        match result {
            Ok(success) => Self::from(success),
            Err(failure) => Self::from(failure),
        }
    }
}

impl From<RaceResult> for Report {
    fn from(result: RaceResult) -> Self {
        match result {
            Ok(success) => Self::Found(FoundReport {
                address: success.address,
                provider: success.provider,
            }),
            Err(failure) => Self::from(&failure),
        }
    }
}
