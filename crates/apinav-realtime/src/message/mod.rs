//! Message vocabulary exchanged between surfaces and the host.

pub mod intent;
pub mod types;
pub mod validator;

pub use types::{InboundMessage, IntentError, MutateIntent, OutboundMessage};
