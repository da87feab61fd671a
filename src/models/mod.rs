//! Domain models for Rolo.

mod contact;
mod event;
mod profile;
mod session;
mod task;

pub use contact::*;
pub use event::*;
pub use profile::*;
pub use session::*;
pub use task::*;

/// Generate a new unique ID for database records.
pub fn new_id() -> String {
    nanoid::nanoid!()
}
