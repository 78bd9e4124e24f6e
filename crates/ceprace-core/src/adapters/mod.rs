//! Concrete postal-code providers.
//!
//! | Adapter | Upstream | Key fields |
//! |---------|----------|------------|
//! | [`ViaCepProvider`] | viacep.com.br | `cep`, `logradouro`, `bairro`, `localidade`, `uf` |
//! | [`ApiCepProvider`] | cdn.apicep.com | `code`, `address`, `district`, `city`, `state` |

mod apicep;
mod viacep;

pub use apicep::{ApiCepProvider, APICEP_URL_TEMPLATE};
pub use viacep::{ViaCepProvider, VIACEP_URL_TEMPLATE};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::ResolutionError;
use crate::ProviderId;

/// Per-request transport timeout applied by the built-in adapters.
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 3_000;

/// Issue `request` and decode the body into the provider's payload type.
///
/// A body that is not a JSON object is a parse failure; an object that does
/// not match `T` is a payload failure.
pub(crate) async fn fetch_payload<T>(
    http_client: &dyn HttpClient,
    provider: ProviderId,
    request: HttpRequest,
) -> Result<T, ResolutionError>
where
    T: DeserializeOwned,
{
    let response = http_client.execute(request).await.map_err(|error| {
        ResolutionError::transport(format!("{provider} transport error: {}", error.message()))
    })?;

    if !response.is_success() {
        return Err(ResolutionError::status(response.status));
    }

    let value: Value = serde_json::from_str(&response.body).map_err(|error| {
        ResolutionError::parse(format!("failed to parse {provider} response: {error}"))
    })?;
    if !value.is_object() {
        return Err(ResolutionError::parse(format!(
            "failed to parse {provider} response: expected a JSON object"
        )));
    }

    serde_json::from_value(value).map_err(|error| {
        ResolutionError::payload(format!("unexpected {provider} payload: {error}"))
    })
}

pub(crate) fn log_failure(provider: ProviderId, error: &ResolutionError) {
    tracing::warn!(
        provider = %provider,
        code = error.code(),
        message = error.message(),
        "provider lookup failed"
    );
}
