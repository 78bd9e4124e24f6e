//! End-to-end races over real sockets
//!
//! Each test starts throwaway axum upstreams on loopback and points the
//! built-in adapters at them, so the reqwest transport, the adapters and the
//! coordinator run exactly as they do in production.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use ceprace_core::{ProviderId, RaceCoordinator, Report, ResolutionErrorKind};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::sleep;

async fn spawn_upstream(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream listener");
    let addr = listener.local_addr().expect("upstream address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("upstream should serve");
    });
    addr
}

fn viacep_upstream(delay: Duration) -> Router {
    Router::new().route(
        "/ws/:cep/json",
        get(move |Path(cep): Path<String>| async move {
            sleep(delay).await;
            Json(json!({
                "cep": cep,
                "logradouro": "Praça da Sé",
                "bairro": "Sé",
                "localidade": "São Paulo",
                "uf": "SP"
            }))
        }),
    )
}

fn apicep_upstream(delay: Duration) -> Router {
    Router::new().route(
        "/file/apicep/:file",
        get(move |Path(file): Path<String>| async move {
            sleep(delay).await;
            Json(json!({
                "status": 200,
                "ok": true,
                "code": file.trim_end_matches(".json"),
                "address": "Praça da Sé",
                "district": "Sé",
                "city": "São Paulo",
                "state": "SP"
            }))
        }),
    )
}

fn failing_upstream(status: StatusCode) -> Router {
    Router::new().route(
        "/ws/:cep/json",
        get(move || async move { (status, "upstream unavailable") }),
    )
}

fn viacep_template(addr: SocketAddr) -> String {
    format!("http://{addr}/ws/{{cep}}/json")
}

fn apicep_template(addr: SocketAddr) -> String {
    format!("http://{addr}/file/apicep/{{cep}}.json")
}

#[tokio::test]
async fn fast_upstream_wins_over_slow_upstream() {
    // Given: ViaCEP answers immediately and ApiCEP after 600ms
    let viacep = spawn_upstream(viacep_upstream(Duration::ZERO)).await;
    let apicep = spawn_upstream(apicep_upstream(Duration::from_millis(600))).await;
    let coordinator = RaceCoordinator::builder()
        .with_deadline(Duration::from_secs(2))
        .with_viacep_url(viacep_template(viacep))
        .with_apicep_url(apicep_template(apicep))
        .build()
        .expect("coordinator builds");

    // When: a key is resolved
    let started = Instant::now();
    let result = coordinator.resolve("01001000").await;

    // Then: ViaCEP's normalized record is returned without waiting for ApiCEP
    let success = result.expect("viacep should win");
    assert_eq!(success.provider, ProviderId::ViaCep);
    assert_eq!(success.address.cep, "01001000");
    assert_eq!(success.address.city, "São Paulo");
    assert!(started.elapsed() < Duration::from_millis(600));

    let report = serde_json::to_value(Report::from(&success)).expect("report serializes");
    assert_eq!(report["provider"], "viacep");
    assert_eq!(report["addressLine"], "Praça da Sé");
}

#[tokio::test]
async fn slow_upstreams_are_cut_off_at_the_deadline() {
    // Given: both upstreams need 1500ms and the deadline is 300ms
    let viacep = spawn_upstream(viacep_upstream(Duration::from_millis(1_500))).await;
    let apicep = spawn_upstream(apicep_upstream(Duration::from_millis(1_500))).await;
    let coordinator = RaceCoordinator::builder()
        .with_deadline(Duration::from_millis(300))
        .with_viacep_url(viacep_template(viacep))
        .with_apicep_url(apicep_template(apicep))
        .build()
        .expect("coordinator builds");

    // When: a key is resolved
    let started = Instant::now();
    let failure = coordinator
        .resolve("01001000")
        .await
        .expect_err("both upstreams are too slow");

    // Then: the timeout message is returned close to the deadline
    assert_eq!(failure.error.kind(), ResolutionErrorKind::Timeout);
    assert_eq!(failure.error.message(), "exceeded timeout of 300 milliseconds :(");
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(started.elapsed() < Duration::from_millis(1_500));
}

#[tokio::test]
async fn upstream_error_status_that_arrives_first_is_the_answer() {
    // Given: ViaCEP answers 503 at once, ApiCEP would succeed after 500ms
    let viacep = spawn_upstream(failing_upstream(StatusCode::SERVICE_UNAVAILABLE)).await;
    let apicep = spawn_upstream(apicep_upstream(Duration::from_millis(500))).await;
    let coordinator = RaceCoordinator::builder()
        .with_viacep_url(viacep_template(viacep))
        .with_apicep_url(apicep_template(apicep))
        .build()
        .expect("coordinator builds");

    // When: a key is resolved
    let failure = coordinator
        .resolve("01001000")
        .await
        .expect_err("first arrival is a failure");

    // Then: the status failure is reported as a message
    assert_eq!(failure.provider, Some(ProviderId::ViaCep));
    assert_eq!(failure.error.kind(), ResolutionErrorKind::Status);
    assert_eq!(
        serde_json::to_value(Report::from(&failure)).expect("report serializes"),
        json!({"message": "upstream returned status 503"})
    );
}

#[tokio::test]
async fn refused_connection_is_a_transport_failure() {
    // Given: only ViaCEP is registered and it points at a closed port
    let coordinator = RaceCoordinator::builder()
        .with_providers(&[ProviderId::ViaCep])
        .with_viacep_url("http://127.0.0.1:1/ws/{cep}/json")
        .with_deadline(Duration::from_secs(5))
        .build()
        .expect("coordinator builds");

    // When: a key is resolved
    let failure = coordinator
        .resolve("01001000")
        .await
        .expect_err("nothing listens on port 1");

    // Then: the transport error wins long before the deadline
    assert_eq!(failure.error.kind(), ResolutionErrorKind::Transport);
    assert!(failure.error.message().starts_with("viacep transport error"));
    assert!(failure.latency_ms < 5_000);
}
