//! Middleware for Rolo.

mod session_bridge;

pub use session_bridge::{require_session, session_bridge, SessionUser};
