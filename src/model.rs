//! Core data model for Lookout.
//!
//! A session owns everything one run produced: the recon facts, the model's
//! candidate recommendations, and provenance for every command dispatched.

mod executed;
mod mode;
mod recommendation;
mod recon;
mod session;

pub use executed::{CommandOutcome, ExecutedCommand, NO_EXIT_CODE};
pub use mode::ScanMode;
pub use recommendation::{Category, DEFAULT_NAME, DEFAULT_PRIORITY, Recommendation};
pub use recon::{DiscoveryOutcome, DiscoverySummary, Host, Port, Reachability};
pub use session::{AiOutcome, Session, SessionId};
