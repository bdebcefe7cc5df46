pub mod error;
pub mod handlers;
pub mod repository;
pub mod router;
pub mod server;
pub mod session;
pub mod state;

pub use error::{ApiError, Result};
pub use repository::{CachedHoldingsRepository, HoldingsRepository};
pub use router::create_router;
pub use server::{init_tracing, run_server};
pub use session::{AccessGate, AuthenticatedSession, SessionContext, SessionStore, SESSION_HEADER};
pub use state::{AppState, ViewSettings};
