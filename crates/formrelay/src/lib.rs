//! `formrelay` - An HTTP form relay backed by a JSON record store
//!
//! This library provides the front door (HTTP listener), the datagram relay
//! between it and the decoder, the decoder that turns URL-encoded bodies
//! into records, and the JSON store those records are merged into.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod daemon;
pub mod decoder;
pub mod error;
pub mod http;
pub mod logging;
pub mod record;
pub mod relay;
pub mod store;

pub use config::Config;
pub use decoder::{Decoder, FormError};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{Entry, Record};
pub use relay::{Inbox, Relay, Transport};
pub use store::Store;
