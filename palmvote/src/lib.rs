#[macro_use]
extern crate serde;

mod admin_flow;
mod api;
mod ballot;
mod election;
mod error;
mod receipt;
mod registry;
mod results;
mod router;
mod screen;
mod store;
mod voter;
mod voter_flow;

pub mod crypto;
pub mod matching;
pub mod mock;
pub mod qkd;
pub mod serde_datetime;
pub mod vvpat;

pub use admin_flow::*;
pub use api::*;
pub use ballot::*;
pub use crypto::TemplateKey;
pub use election::*;
pub use error::*;
pub use matching::DEFAULT_MATCH_THRESHOLD;
pub use qkd::QkdProgress;
pub use receipt::*;
pub use registry::*;
pub use results::*;
pub use router::*;
pub use screen::*;
pub use store::*;
pub use voter::*;
pub use voter_flow::*;
pub use vvpat::{ReceiptSink, VvpatDir};

#[cfg(test)]
mod tests;
