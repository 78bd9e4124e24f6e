use serde::{Deserialize, Serialize};

/// Provider-neutral address record.
///
/// Fields an upstream payload omits are carried as empty strings; a partial
/// record is still a successful lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub cep: String,
    pub address_line: String,
    pub district: String,
    pub city: String,
    pub region: String,
}

impl Address {
    pub fn new(
        cep: impl Into<String>,
        address_line: impl Into<String>,
        district: impl Into<String>,
        city: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            cep: cep.into(),
            address_line: address_line.into(),
            district: district.into(),
            city: city.into(),
            region: region.into(),
        }
    }
}
