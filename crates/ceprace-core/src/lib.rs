//! # Ceprace Core
//!
//! Resolves a postal code (CEP) by racing several independent upstream
//! providers and keeping whichever answer arrives first, bounded by a
//! deadline.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | ViaCEP and ApiCEP providers |
//! | [`domain`] | Lookup key and normalized address record |
//! | [`error`] | Validation errors |
//! | [`http_client`] | Outbound HTTP abstraction and reqwest transport |
//! | [`provider`] | Provider trait and resolution error shape |
//! | [`race`] | Race coordinator, configuration, and builder |
//! | [`report`] | Caller-visible success/failure shapes |
//! | [`source`] | Provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ceprace_core::{RaceCoordinator, Report};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = RaceCoordinator::builder().with_env_overrides()?.build()?;
//!
//!     let result = coordinator.resolve("01001000").await;
//!     println!("{}", serde_json::to_string(&Report::from(result))?);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Caller         │  resolve("01001000")
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Race Coordinator│────▶│ Deadline timer   │
//! └────────┬────────┘     └──────────────────┘
//!          │ one task per provider
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ CepProvider     │────▶│ HTTP Client      │
//! │ (ViaCEP/ApiCEP) │     │ (reqwest)        │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Address / Report│
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every failure surfaces as a [`ResolutionError`] whose message is the only
//! part shown to callers; the kind is kept for logs:
//!
//! ```rust
//! use ceprace_core::{ResolutionError, ResolutionErrorKind};
//!
//! fn describe(error: &ResolutionError) -> &'static str {
//!     match error.kind() {
//!         ResolutionErrorKind::InvalidCep => "client error",
//!         ResolutionErrorKind::Timeout => "no provider answered in time",
//!         _ => "a provider failed first",
//!     }
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod provider;
pub mod race;
pub mod report;
pub mod source;

pub use adapters::{ApiCepProvider, ViaCepProvider, APICEP_URL_TEMPLATE, VIACEP_URL_TEMPLATE};

pub use domain::{Address, Cep};

pub use error::ValidationError;

pub use http_client::{HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse, ReqwestHttpClient};

pub use provider::{CepProvider, FetchFuture, ResolutionError, ResolutionErrorKind, CEP_PLACEHOLDER};

pub use race::{
    duration_ms, LoserPolicy, ProviderOutcome, RaceConfig, RaceCoordinator, RaceCoordinatorBuilder,
    RaceFailure, RaceResult, RaceSuccess, DEFAULT_DEADLINE,
};

pub use report::{FailedReport, FoundReport, Report};

pub use source::ProviderId;
