//! The decoder loop.
//!
//! Receives raw form bodies from an [`Inbox`], decodes each into a
//! [`Record`](crate::record::Record), stamps it and merges it into the
//! [`Store`]. Payloads are handled strictly one after another: an entry is
//! fully persisted before the next payload is received.

mod form;

pub use form::{parse, unquote_plus, FormError};

use tracing::{error, info};

use crate::error::{Error, Result};
use crate::record::Entry;
use crate::relay::Inbox;
use crate::store::Store;

/// Turns payloads into persisted entries.
#[derive(Debug, Clone)]
pub struct Decoder {
    store: Store,
}

impl Decoder {
    /// Create a decoder writing into `store`.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The store entries are merged into.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Decode one payload and persist it.
    ///
    /// Returns the entry that was written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for malformed payloads (nothing is written)
    /// and a persistence error if the store could not be updated.
    pub async fn handle(&self, payload: &[u8]) -> Result<Entry> {
        let entry = Entry::now(parse(payload)?);

        let store = self.store.clone();
        let to_persist = entry.clone();
        tokio::task::spawn_blocking(move || store.merge_and_persist(&to_persist))
            .await
            .map_err(|e| Error::internal(format!("store task failed: {e}")))??;

        Ok(entry)
    }

    /// Run the loop until the inbox closes or fails.
    ///
    /// Decode and persistence failures are logged and the payload dropped;
    /// the loop keeps going.
    ///
    /// # Errors
    ///
    /// Returns the transport error that ended the loop.
    pub async fn run<I: Inbox>(&self, mut inbox: I) -> Result<()> {
        info!(
            "Decoder started, writing to {}",
            self.store.path().display()
        );

        loop {
            let payload = match inbox.recv().await {
                Ok(Some(payload)) => payload,
                Ok(None) => {
                    info!("Inbox closed, decoder stopping");
                    return Ok(());
                }
                Err(e) => {
                    error!("Decoder stopping: {e}");
                    return Err(e);
                }
            };

            match self.handle(&payload).await {
                Ok(entry) => info!(
                    "Saved entry {} with {} field(s)",
                    entry.timestamp,
                    entry.record.len()
                ),
                Err(Error::Decode(e)) => error!(
                    "Error parsing data {:?}: {e}",
                    String::from_utf8_lossy(&payload)
                ),
                Err(e) => error!(
                    "Error writing data {:?}: {e}",
                    String::from_utf8_lossy(&payload)
                ),
            }
        }
    }
}
