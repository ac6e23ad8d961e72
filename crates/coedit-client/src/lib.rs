//! Coedit Sync Client
//!
//! Client-side half of the coedit realtime protocol, in three layers:
//! - [`reconcile`]: a pure document mirror with echo suppression and
//!   positional selection mapping.
//! - [`debounce`]: coalesces keystrokes into one change per quiet period.
//! - [`conn`]: a reconnecting WebSocket session tying both to the wire.
//!
//! Typical embedding (not run here):
//! ```no_run
//! use coedit_client::{ClientConfig, SyncClient, SyncEvent};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! #   let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
//! #   rt.block_on(async move {
//! let config = ClientConfig::new("ws://127.0.0.1:3000", "some-doc-id");
//! let (client, handle, mut events) = SyncClient::new(config);
//! tokio::spawn(client.run());
//!
//! handle.edit("hello, room").await;
//! while let Some(event) = events.recv().await {
//!     if let SyncEvent::RemoteChange { from, .. } = event {
//!         println!("edit from {}", from);
//!     }
//! }
//! #   Ok::<_, Box<dyn std::error::Error>>(())
//! #   })?;
//! #   Ok(())
//! # }
//! ```

pub mod config;
pub mod conn;
pub mod debounce;
pub mod reconcile;

pub use config::ClientConfig;
pub use conn::{ClientError, SyncClient, SyncEvent, SyncHandle};
pub use debounce::EditDebouncer;
pub use reconcile::{map_selection, DocumentMirror, RemoteOutcome, Selection};
