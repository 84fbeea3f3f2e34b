// Application layer - use cases and orchestration.
// Clients (CLI, interactive prompt) go through LedgerService and never touch
// the store directly.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
