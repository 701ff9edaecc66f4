//! suraksha-core: transport-agnostic building blocks shared by every
//! Soul Suraksha crate.

pub mod actor;
pub mod config;
pub mod errors;

pub use actor::{ActorContext, ActorId, Role};
pub use config::{AppConfig, AppConfigSnapshot};
pub use errors::{AppError, AppResult, ErrorKind};
