//! Race coordinator: concurrent dispatch with first-arrival selection.
//!
//! Each call to [`RaceCoordinator::race`] spawns one task per registered
//! provider into a request-scoped [`JoinSet`] and arms a deadline timer at the
//! same instant. The first of those N+1 events decides the result:
//!
//! - a provider that succeeds first wins with its [`Address`];
//! - a provider that *fails* first also wins, and its error is reported even
//!   if a sibling would have succeeded moments later;
//! - if the deadline fires first the result is a timeout error.
//!
//! When a provider completion and the deadline are ready in the same poll, the
//! provider completion is taken. Tasks that did not win are aborted or
//! detached according to [`LoserPolicy`]; their outcomes are never read.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::adapters::{ApiCepProvider, ViaCepProvider, DEFAULT_PROVIDER_TIMEOUT_MS};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::provider::{CepProvider, ResolutionError};
use crate::{Address, Cep, ProviderId, ValidationError};

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(1);

/// What happens to provider tasks still running once the race is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoserPolicy {
    /// Abort unfinished tasks, dropping their in-flight requests.
    #[default]
    Cancel,
    /// Let unfinished tasks run to completion in the background.
    Detach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceConfig {
    pub deadline: Duration,
    pub losers: LoserPolicy,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            losers: LoserPolicy::default(),
        }
    }
}

impl RaceConfig {
    pub fn new(deadline: Duration) -> Result<Self, ValidationError> {
        if deadline.is_zero() {
            return Err(ValidationError::ZeroDeadline);
        }
        Ok(Self {
            deadline,
            ..Self::default()
        })
    }

    pub fn with_losers(mut self, losers: LoserPolicy) -> Self {
        self.losers = losers;
        self
    }
}

/// Outcome produced by a single provider task.
pub type ProviderOutcome = Result<Address, ResolutionError>;

/// Race won by a provider that returned an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceSuccess {
    pub address: Address,
    pub provider: ProviderId,
    pub dispatched: usize,
    pub latency_ms: u64,
}

/// Race that ended in an error.
///
/// `provider` names the provider whose failure arrived first; it is `None`
/// for timeouts and for keys rejected before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceFailure {
    pub error: ResolutionError,
    pub provider: Option<ProviderId>,
    pub dispatched: usize,
    pub latency_ms: u64,
}

pub type RaceResult = Result<RaceSuccess, RaceFailure>;

/// Registry of providers plus the per-request race algorithm.
///
/// The coordinator holds no per-request state: every race owns its own task
/// set and timer, so one instance can serve any number of concurrent lookups.
pub struct RaceCoordinator {
    providers: Vec<Arc<dyn CepProvider>>,
    config: RaceConfig,
}

impl RaceCoordinator {
    pub fn new(providers: Vec<Arc<dyn CepProvider>>, config: RaceConfig) -> Self {
        Self { providers, config }
    }

    pub fn builder() -> RaceCoordinatorBuilder {
        RaceCoordinatorBuilder::new()
    }

    pub fn providers(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|provider| provider.id()).collect()
    }

    pub fn config(&self) -> RaceConfig {
        self.config
    }

    /// Validate `raw` and race it. An invalid key never reaches a provider.
    pub async fn resolve(&self, raw: &str) -> RaceResult {
        match Cep::parse(raw) {
            Ok(cep) => self.race(cep).await,
            Err(error) => {
                tracing::debug!(%error, "rejected lookup key before dispatch");
                Err(RaceFailure {
                    error: ResolutionError::from(error),
                    provider: None,
                    dispatched: 0,
                    latency_ms: 0,
                })
            }
        }
    }

    /// Race every registered provider for `cep` against the deadline.
    pub async fn race(&self, cep: Cep) -> RaceResult {
        let started = Instant::now();
        let deadline = tokio::time::sleep(self.config.deadline);
        tokio::pin!(deadline);

        let mut tasks = JoinSet::new();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let cep = cep.clone();
            tasks.spawn(async move {
                let outcome: ProviderOutcome = provider.fetch(&cep).await;
                (provider.id(), outcome)
            });
        }
        let dispatched = tasks.len();
        tracing::debug!(
            cep = %cep,
            providers = dispatched,
            deadline_ms = duration_ms(self.config.deadline),
            "dispatched provider race"
        );

        let result = loop {
            tokio::select! {
                biased;

                Some(joined) = tasks.join_next() => match joined {
                    Ok((provider, Ok(address))) => {
                        break Ok(RaceSuccess {
                            address,
                            provider,
                            dispatched,
                            latency_ms: elapsed_ms(started),
                        });
                    }
                    Ok((provider, Err(error))) => {
                        break Err(RaceFailure {
                            error,
                            provider: Some(provider),
                            dispatched,
                            latency_ms: elapsed_ms(started),
                        });
                    }
                    // A panicked task deposits nothing; keep waiting on the rest.
                    Err(join_error) => {
                        tracing::warn!(error = %join_error, "provider task ended without an outcome");
                    }
                },
                () = &mut deadline => {
                    break Err(RaceFailure {
                        error: ResolutionError::timeout(self.config.deadline),
                        provider: None,
                        dispatched,
                        latency_ms: elapsed_ms(started),
                    });
                }
            }
        };

        self.release_losers(tasks);
        log_result(&cep, &result);
        result
    }

    fn release_losers(&self, mut tasks: JoinSet<(ProviderId, ProviderOutcome)>) {
        let outstanding = tasks.len();
        if outstanding == 0 {
            return;
        }

        match self.config.losers {
            LoserPolicy::Cancel => {
                tasks.abort_all();
                tracing::debug!(outstanding, "cancelled unfinished provider tasks");
            }
            LoserPolicy::Detach => {
                tasks.detach_all();
                tracing::debug!(outstanding, "detached unfinished provider tasks");
            }
        }
    }
}

/// Builder wiring the built-in providers to one shared HTTP client.
///
/// # Environment Variables
///
/// Read by [`with_env_overrides`](RaceCoordinatorBuilder::with_env_overrides):
///
/// | Variable | Effect |
/// |----------|--------|
/// | `CEPRACE_DEADLINE_MS` | Race deadline in milliseconds |
/// | `CEPRACE_VIACEP_URL` | ViaCEP URL template (must contain `{cep}`) |
/// | `CEPRACE_APICEP_URL` | ApiCEP URL template (must contain `{cep}`) |
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use ceprace_core::{LoserPolicy, RaceCoordinator};
///
/// let coordinator = RaceCoordinator::builder()
///     .with_deadline(Duration::from_millis(800))
///     .with_loser_policy(LoserPolicy::Cancel)
///     .with_env_overrides()?
///     .build()?;
/// ```
pub struct RaceCoordinatorBuilder {
    deadline: Duration,
    losers: LoserPolicy,
    builtin: Vec<ProviderId>,
    provider_timeout_ms: u64,
    viacep_url: Option<String>,
    apicep_url: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    extra_providers: Vec<Arc<dyn CepProvider>>,
}

impl Default for RaceCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RaceCoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            losers: LoserPolicy::default(),
            builtin: ProviderId::ALL.to_vec(),
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
            viacep_url: None,
            apicep_url: None,
            http_client: None,
            extra_providers: Vec::new(),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_loser_policy(mut self, losers: LoserPolicy) -> Self {
        self.losers = losers;
        self
    }

    /// Race only the listed built-in providers, registered in list order.
    /// Repeated ids are registered once.
    pub fn with_providers(mut self, providers: &[ProviderId]) -> Self {
        self.builtin.clear();
        for id in providers {
            if !self.builtin.contains(id) {
                self.builtin.push(*id);
            }
        }
        self
    }

    /// Transport timeout for each built-in provider request.
    pub fn with_provider_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.provider_timeout_ms = timeout_ms;
        self
    }

    pub fn with_viacep_url(mut self, template: impl Into<String>) -> Self {
        self.viacep_url = Some(template.into());
        self
    }

    pub fn with_apicep_url(mut self, template: impl Into<String>) -> Self {
        self.apicep_url = Some(template.into());
        self
    }

    /// Transport shared by the built-in providers. Defaults to reqwest.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Register an additional provider after the built-in ones.
    pub fn with_provider(mut self, provider: Arc<dyn CepProvider>) -> Self {
        self.extra_providers.push(provider);
        self
    }

    /// Apply `CEPRACE_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self, ValidationError> {
        self.apply_overrides(|name| env::var(name).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("CEPRACE_DEADLINE_MS") {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ValidationError::InvalidDeadline { value: raw.clone() })?;
            self.deadline = Duration::from_millis(millis);
        }
        if let Some(template) = lookup("CEPRACE_VIACEP_URL") {
            self.viacep_url = Some(template);
        }
        if let Some(template) = lookup("CEPRACE_APICEP_URL") {
            self.apicep_url = Some(template);
        }
        Ok(self)
    }

    pub fn build(self) -> Result<RaceCoordinator, ValidationError> {
        let config = RaceConfig::new(self.deadline)?.with_losers(self.losers);
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));

        let mut providers: Vec<Arc<dyn CepProvider>> = Vec::new();

        for id in &self.builtin {
            let provider: Arc<dyn CepProvider> = match id {
                ProviderId::ViaCep => {
                    let mut provider = ViaCepProvider::new(Arc::clone(&http_client))
                        .with_timeout_ms(self.provider_timeout_ms);
                    if let Some(template) = self.viacep_url.as_deref() {
                        provider = provider.with_url_template(template)?;
                    }
                    Arc::new(provider)
                }
                ProviderId::ApiCep => {
                    let mut provider = ApiCepProvider::new(Arc::clone(&http_client))
                        .with_timeout_ms(self.provider_timeout_ms);
                    if let Some(template) = self.apicep_url.as_deref() {
                        provider = provider.with_url_template(template)?;
                    }
                    Arc::new(provider)
                }
            };
            providers.push(provider);
        }

        providers.extend(self.extra_providers);

        if providers.is_empty() {
            tracing::warn!("no providers registered; every race will end at the deadline");
        }

        Ok(RaceCoordinator::new(providers, config))
    }
}

fn log_result(cep: &Cep, result: &RaceResult) {
    match result {
        Ok(success) => tracing::info!(
            cep = %cep,
            provider = %success.provider,
            latency_ms = success.latency_ms,
            "race won"
        ),
        Err(failure) => match failure.provider {
            Some(provider) => tracing::warn!(
                cep = %cep,
                provider = %provider,
                code = failure.error.code(),
                latency_ms = failure.latency_ms,
                "race lost to a provider failure"
            ),
            None => tracing::warn!(
                cep = %cep,
                code = failure.error.code(),
                latency_ms = failure.latency_ms,
                "race ended without a provider answer"
            ),
        },
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}

fn elapsed_ms(started: Instant) -> u64 {
    duration_ms(started.elapsed())
}
