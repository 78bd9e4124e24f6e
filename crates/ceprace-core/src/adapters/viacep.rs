use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::{fetch_payload, log_failure, DEFAULT_PROVIDER_TIMEOUT_MS};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{render_url, validate_url_template, CepProvider, FetchFuture, ResolutionError};
use crate::{Address, Cep, ProviderId, ValidationError};

pub const VIACEP_URL_TEMPLATE: &str = "https://viacep.com.br/ws/{cep}/json";

/// ViaCEP (`viacep.com.br`) adapter.
#[derive(Clone)]
pub struct ViaCepProvider {
    http_client: Arc<dyn HttpClient>,
    url_template: String,
    timeout_ms: u64,
}

impl ViaCepProvider {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            url_template: String::from(VIACEP_URL_TEMPLATE),
            timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
        }
    }

    /// Point the adapter at another host; the template must contain `{cep}`.
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

        let payload: ViaCepPayload =
            fetch_payload(self.http_client.as_ref(), ProviderId::ViaCep, request).await?;
        normalize(payload)
    }
}

impl CepProvider for ViaCepProvider {
    fn id(&self) -> ProviderId {
        ProviderId::ViaCep
    }

    fn fetch<'a>(&'a self, cep: &'a Cep) -> FetchFuture<'a> {
        Box::pin(async move {
            self.lookup(cep)
                .await
                .inspect_err(|error| log_failure(ProviderId::ViaCep, error))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ViaCepPayload {
    cep: Option<String>,
    logradouro: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    /// Present on unknown keys, as `true` or `"true"` depending on API version.
    erro: Option<Value>,
}

fn normalize(payload: ViaCepPayload) -> Result<Address, ResolutionError> {
    let not_found = match &payload.erro {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
        _ => false,
    };
    if not_found {
        return Err(ResolutionError::payload("viacep: cep not found"));
    }

    Ok(Address {
        cep: payload.cep.unwrap_or_default(),
        address_line: payload.logradouro.unwrap_or_default(),
        district: payload.bairro.unwrap_or_default(),
        city: payload.localidade.unwrap_or_default(),
        region: payload.uf.unwrap_or_default(),
    })
}
