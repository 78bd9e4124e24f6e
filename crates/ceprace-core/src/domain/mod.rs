//! # Domain Models
//!
//! The lookup key and the normalized record every provider maps into.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Cep`] | Validated, non-empty postal code used as the lookup key |
//! | [`Address`] | Provider-neutral address record |
//!
//! Upstream schemas differ per provider; adapters translate them into
//! [`Address`] at their own boundary so the race coordinator only ever sees
//! normalized values.

mod address;
mod cep;

pub use address::Address;
pub use cep::Cep;
