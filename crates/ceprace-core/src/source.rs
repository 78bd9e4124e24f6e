use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Identifiers for the upstream postal-code providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    ViaCep,
    ApiCep,
}

impl ProviderId {
    pub const ALL: [Self; 2] = [Self::ViaCep, Self::ApiCep];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViaCep => "viacep",
            Self::ApiCep => "apicep",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "viacep" => Ok(Self::ViaCep),
            "apicep" => Ok(Self::ApiCep),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}
