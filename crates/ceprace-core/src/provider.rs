//! Provider capability and the shared failure shape.
//!
//! Every upstream postal-code service is wrapped in a [`CepProvider`]. A
//! provider performs one outbound call per [`fetch`](CepProvider::fetch),
//! decodes its own schema and hands back either a normalized [`Address`] or a
//! [`ResolutionError`].
//!
//! # Failure kinds
//!
//! | Kind | Raised by | Code |
//! |------|-----------|------|
//! | [`InvalidCep`](ResolutionErrorKind::InvalidCep) | coordinator, before dispatch | `resolution.invalid_cep` |
//! | [`Transport`](ResolutionErrorKind::Transport) | provider | `resolution.transport` |
//! | [`Status`](ResolutionErrorKind::Status) | provider | `resolution.status` |
//! | [`Parse`](ResolutionErrorKind::Parse) | provider | `resolution.parse` |
//! | [`Payload`](ResolutionErrorKind::Payload) | provider | `resolution.payload` |
//! | [`Timeout`](ResolutionErrorKind::Timeout) | coordinator deadline | `resolution.timeout` |
//!
//! Callers only ever see [`ResolutionError::message`]; the kind exists so logs
//! can tell the cases apart.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::{Address, Cep, ProviderId, ValidationError};

/// Placeholder substituted with the percent-encoded key in provider URLs.
pub const CEP_PLACEHOLDER: &str = "{cep}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionErrorKind {
    InvalidCep,
    Transport,
    Status,
    Parse,
    Payload,
    Timeout,
}

/// Failure outcome of a lookup, whatever produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionError {
    kind: ResolutionErrorKind,
    message: String,
}

impl ResolutionError {
    pub fn invalid_cep() -> Self {
        Self {
            kind: ResolutionErrorKind::InvalidCep,
            message: ValidationError::EmptyCep.to_string(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ResolutionErrorKind::Transport, message)
    }

    pub fn status(status: u16) -> Self {
        Self::new(
            ResolutionErrorKind::Status,
            format!("upstream returned status {status}"),
        )
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ResolutionErrorKind::Parse, message)
    }

    pub fn payload(message: impl Into<String>) -> Self {
        Self::new(ResolutionErrorKind::Payload, message)
    }

    /// Deadline failure with a human-readable rendering of `deadline`.
    pub fn timeout(deadline: Duration) -> Self {
        Self::new(
            ResolutionErrorKind::Timeout,
            format!("exceeded timeout of {} :(", describe_duration(deadline)),
        )
    }

    fn new(kind: ResolutionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> ResolutionErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ResolutionErrorKind::InvalidCep => "resolution.invalid_cep",
            ResolutionErrorKind::Transport => "resolution.transport",
            ResolutionErrorKind::Status => "resolution.status",
            ResolutionErrorKind::Parse => "resolution.parse",
            ResolutionErrorKind::Payload => "resolution.payload",
            ResolutionErrorKind::Timeout => "resolution.timeout",
        }
    }
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ResolutionError {}

impl From<ValidationError> for ResolutionError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::EmptyCep => Self::invalid_cep(),
            other => Self::new(ResolutionErrorKind::InvalidCep, other.to_string()),
        }
    }
}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Address, ResolutionError>> + Send + 'a>>;

/// Upstream postal-code source.
///
/// Implementations hold no state shared with other providers and never retry:
/// a single `fetch` is a single outbound request. The race coordinator runs
/// each registered provider on its own task, so implementations must be
/// `Send + Sync`.
pub trait CepProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Look up `cep` upstream and normalize the answer.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when the request cannot be sent, the
    /// upstream answers with a non-2xx status, the body is not the expected
    /// JSON, or the payload itself reports a failure.
    fn fetch<'a>(&'a self, cep: &'a Cep) -> FetchFuture<'a>;
}

pub(crate) fn validate_url_template(template: &str) -> Result<(), ValidationError> {
    if template.contains(CEP_PLACEHOLDER) {
        Ok(())
    } else {
        Err(ValidationError::MissingCepPlaceholder {
            template: template.to_owned(),
        })
    }
}

pub(crate) fn render_url(template: &str, cep: &Cep) -> String {
    template.replace(CEP_PLACEHOLDER, &urlencoding::encode(cep.as_str()))
}

fn describe_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis > 0 && millis % 1_000 == 0 {
        let seconds = millis / 1_000;
        if seconds == 1 {
            String::from("1 second")
        } else {
            format!("{seconds} seconds")
        }
    } else if millis == 1 {
        String::from("1 millisecond")
    } else {
        format!("{millis} milliseconds")
    }
}
