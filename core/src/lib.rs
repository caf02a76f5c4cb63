//! Core library for LLM Vibes Radar.
//!
//! The crate owns everything that happens between "the user typed a prompt"
//! and "the UI has a new chat value to render":
//! - [`agents`] holds the provider adapters (remote HTTP and canned simulation)
//!   and the configuration they are built from.
//! - [`fanout`] asks every configured model concurrently and joins the results
//!   back into request order.
//! - [`chat`] is the in-memory chat state container and its pure turn helpers.
//! - [`errors`] keeps the central error catalogue with human friendly metadata.
//! - [`logging`] records structured diagnostics through the `log` facade.
//! - [`models`] defines the model identifiers and the response record.

pub mod agents;
pub mod chat;
pub mod errors;
pub mod fanout;
pub mod logging;
pub mod models;

pub use chat::{Chat, ChatStore, Message, Role};
pub use errors::VibesError;
pub use fanout::FanOutCoordinator;
pub use models::{Confidence, ModelId, ModelResponse};
