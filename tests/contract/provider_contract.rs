use std::sync::{Arc, Mutex};

use ceprace_core::{
    ApiCepProvider, Cep, CepProvider, HttpClient, HttpError, HttpFuture, HttpRequest,
    HttpResponse, ProviderId, Report, ResolutionErrorKind, ViaCepProvider,
};

/// Transport fake answering every request with one canned response.
struct CannedHttpClient {
    response: Result<HttpResponse, HttpError>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl CannedHttpClient {
    fn new(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
        Arc::new(Self {
            response,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<HttpRequest> {
        self.seen.lock().expect("request log lock").clone()
    }
}

impl HttpClient for CannedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        self.seen.lock().expect("request log lock").push(request);
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

struct ProviderCase {
    id: ProviderId,
    found_body: &'static str,
    missing_body: &'static str,
    missing_message: &'static str,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::ViaCep,
            found_body: r#"{
                "cep": "01001-000",
                "logradouro": "Praça da Sé",
                "bairro": "Sé",
                "localidade": "São Paulo",
                "uf": "SP"
            }"#,
            missing_body: r#"{"erro": "true"}"#,
            missing_message: "viacep: cep not found",
        },
        ProviderCase {
            id: ProviderId::ApiCep,
            found_body: r#"{
                "status": 200,
                "ok": true,
                "code": "01001-000",
                "address": "Praça da Sé",
                "district": "Sé",
                "city": "São Paulo",
                "state": "SP"
            }"#,
            missing_body: r#"{"status": 404, "ok": false, "message": "CEP not found"}"#,
            missing_message: "apicep: CEP not found",
        },
    ]
}

fn provider_for(id: ProviderId, http_client: Arc<CannedHttpClient>) -> Arc<dyn CepProvider> {
    match id {
        ProviderId::ViaCep => Arc::new(ViaCepProvider::new(http_client)),
        ProviderId::ApiCep => Arc::new(ApiCepProvider::new(http_client)),
    }
}

fn cep() -> Cep {
    Cep::parse("01001000").expect("valid cep")
}

#[tokio::test]
async fn each_fetch_issues_exactly_one_get_for_the_key() {
    for case in provider_cases() {
        let http_client = CannedHttpClient::new(Ok(HttpResponse::ok_json(case.found_body)));
        let provider = provider_for(case.id, Arc::clone(&http_client));

        provider
            .fetch(&cep())
            .await
            .unwrap_or_else(|error| panic!("provider '{}' fetch failed: {error}", case.id));

        let seen = http_client.seen();
        assert_eq!(seen.len(), 1, "provider '{}': request count", case.id);
        assert!(
            seen[0].url.contains("01001000"),
            "provider '{}': url {} must carry the key",
            case.id,
            seen[0].url
        );
    }
}

#[tokio::test]
async fn found_payloads_normalize_to_the_same_address() {
    for case in provider_cases() {
        let http_client = CannedHttpClient::new(Ok(HttpResponse::ok_json(case.found_body)));
        let provider = provider_for(case.id, http_client);

        let address = provider
            .fetch(&cep())
            .await
            .unwrap_or_else(|error| panic!("provider '{}' fetch failed: {error}", case.id));

        assert_eq!(address.cep, "01001-000", "provider '{}': cep", case.id);
        assert_eq!(address.address_line, "Praça da Sé", "provider '{}': street", case.id);
        assert_eq!(address.district, "Sé", "provider '{}': district", case.id);
        assert_eq!(address.city, "São Paulo", "provider '{}': city", case.id);
        assert_eq!(address.region, "SP", "provider '{}': region", case.id);
    }
}

#[tokio::test]
async fn provider_reported_misses_are_payload_failures() {
    for case in provider_cases() {
        let http_client = CannedHttpClient::new(Ok(HttpResponse::ok_json(case.missing_body)));
        let provider = provider_for(case.id, http_client);

        let error = provider
            .fetch(&cep())
            .await
            .expect_err("a miss must not produce an address");

        assert_eq!(error.kind(), ResolutionErrorKind::Payload, "provider '{}'", case.id);
        assert_eq!(error.message(), case.missing_message, "provider '{}'", case.id);
    }
}

#[tokio::test]
async fn transport_failures_surface_as_message_reports() {
    for case in provider_cases() {
        let http_client = CannedHttpClient::new(Err(HttpError::new("connection failed: refused")));
        let provider = provider_for(case.id, http_client);

        let error = provider
            .fetch(&cep())
            .await
            .expect_err("transport failure must propagate");

        assert_eq!(error.kind(), ResolutionErrorKind::Transport, "provider '{}'", case.id);
        assert_eq!(
            error.message(),
            format!("{} transport error: connection failed: refused", case.id),
        );
    }
}

#[tokio::test]
async fn non_json_bodies_are_parse_failures() {
    for case in provider_cases() {
        let http_client = CannedHttpClient::new(Ok(HttpResponse::ok_json("<html>busy</html>")));
        let provider = provider_for(case.id, http_client);

        let error = provider.fetch(&cep()).await.expect_err("html is not json");

        assert_eq!(error.kind(), ResolutionErrorKind::Parse, "provider '{}'", case.id);
        assert!(
            error.message().starts_with(&format!("failed to parse {} response", case.id)),
            "provider '{}': {}",
            case.id,
            error.message()
        );
    }
}

#[tokio::test]
async fn error_statuses_are_reported_without_decoding() {
    for case in provider_cases() {
        let http_client = CannedHttpClient::new(Ok(HttpResponse {
            status: 500,
            body: String::from(case.found_body),
        }));
        let provider = provider_for(case.id, http_client);

        let error = provider.fetch(&cep()).await.expect_err("500 must fail");

        assert_eq!(error.kind(), ResolutionErrorKind::Status, "provider '{}'", case.id);
        assert_eq!(error.message(), "upstream returned status 500");
    }
}

#[test]
fn failure_reports_serialize_to_a_single_message_field() {
    let error = ceprace_core::ResolutionError::payload("viacep: cep not found");
    let report = Report::Failed(ceprace_core::FailedReport {
        message: error.message().to_owned(),
    });

    assert_eq!(
        serde_json::to_value(report).expect("report serializes"),
        serde_json::json!({"message": "viacep: cep not found"})
    );
}
