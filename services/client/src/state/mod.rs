//! services/client/src/state/mod.rs
//!
//! The client's state containers. Screens (or the CLI) call these; they call the
//! ports and keep the results, and they never surface operation errors except as a
//! stored message.

pub mod app;
pub mod auth;
pub mod documents;
pub mod session;

pub use app::AppState;
pub use auth::AuthState;
pub use documents::DocumentState;
pub use session::SessionHandle;
