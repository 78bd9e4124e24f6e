use std::sync::Arc;

use serde::Deserialize;

use super::{fetch_payload, log_failure, DEFAULT_PROVIDER_TIMEOUT_MS};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{render_url, validate_url_template, CepProvider, FetchFuture, ResolutionError};
use crate::{Address, Cep, ProviderId, ValidationError};

pub const APICEP_URL_TEMPLATE: &str = "https://cdn.apicep.com/file/apicep/{cep}.json";

/// ApiCEP (`cdn.apicep.com`) adapter.
#[derive(Clone)]
pub struct ApiCepProvider {
    http_client: Arc<dyn HttpClient>,
    url_template: String,
    timeout_ms: u64,
}

impl ApiCepProvider {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            url_template: String::from(APICEP_URL_TEMPLATE),
            timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
        }
    }

    pub fn with_url_template(mut self, template: impl Into<String>) -> Result<Self, ValidationError> {
        let template = template.into();
        validate_url_template(&template)?;
        self.url_template = template;
        Ok(self)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn url_for(&self, cep: &Cep) -> String {
        render_url(&self.url_template, cep)
    }

    async fn lookup(&self, cep: &Cep) -> Result<Address, ResolutionError> {
        let request = HttpRequest::get(self.url_for(cep))
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let payload: ApiCepPayload =
            fetch_payload(self.http_client.as_ref(), ProviderId::ApiCep, request).await?;
        normalize(payload)
    }
}

impl CepProvider for ApiCepProvider {
    fn id(&self) -> ProviderId {
        ProviderId::ApiCep
    }

    fn fetch<'a>(&'a self, cep: &'a Cep) -> FetchFuture<'a> {
        Box::pin(async move {
            self.lookup(cep)
                .await
                .inspect_err(|error| log_failure(ProviderId::ApiCep, error))
        })
    }
}

// ApiCEP embeds its own status alongside the address fields; a miss comes
// back as `{"status": 404, "ok": false, "message": "CEP not found"}`.
#[derive(Debug, Clone, Deserialize)]
struct ApiCepPayload {
    code: Option<String>,
    address: Option<String>,
    district: Option<String>,
    city: Option<String>,
    state: Option<String>,
    status: Option<u16>,
    ok: Option<bool>,
    message: Option<String>,
    #[serde(rename = "statusText")]
    status_text: Option<String>,
}

fn normalize(payload: ApiCepPayload) -> Result<Address, ResolutionError> {
    let failed = payload.ok == Some(false) || payload.status.is_some_and(|status| status != 200);
    if failed {
        let reason = payload
            .message
            .or(payload.status_text)
            .unwrap_or_else(|| String::from("lookup failed"));
        return Err(ResolutionError::payload(format!("apicep: {reason}")));
    }

    Ok(Address {
        cep: payload.code.unwrap_or_default(),
        address_line: payload.address.unwrap_or_default(),
        district: payload.district.unwrap_or_default(),
        city: payload.city.unwrap_or_default(),
        region: payload.state.unwrap_or_default(),
    })
}
