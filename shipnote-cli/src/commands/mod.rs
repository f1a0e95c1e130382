//! CLI command implementations

pub mod extract;
pub mod notify;

pub use extract::ExtractArgs;
pub use notify::NotifyArgs;
