//! # roster-sheets
//!
//! Spreadsheet gateway for Roster.
//!
//! [`SheetStore`] is the seam between the bot and its storage. Two backends
//! implement it:
//! - [`GoogleSheets`]: Google Sheets v4 REST with a service-account token
//! - [`MemorySheets`]: an in-process document with an operation journal,
//!   used for offline runs and as the test double
//!
//! ```no_run
//! # async fn demo() -> Result<(), roster_sheets::SheetsError> {
//! use std::sync::Arc;
//! use roster_sheets::{MemorySheets, SheetStore};
//!
//! let store: Arc<dyn SheetStore> = Arc::new(MemorySheets::new());
//! store.create_table("Students").await?;
//! store.write_header("Students", &["name".into(), "age".into()]).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod google;
pub mod memory;

mod error;
mod http;
mod store;

pub use error::SheetsError;
pub use google::GoogleSheets;
pub use memory::{MemorySheets, Operation, StoreCall};
pub use store::SheetStore;
