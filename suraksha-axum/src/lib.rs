//! suraksha-axum: HTTP surface of the story service.
//!
//! Builds an axum router over a [`suraksha_stories::StoryService`],
//! resolves the caller from request headers and renders every failure as
//! a `{name, message, code, className, data?, errors?}` body.

pub mod app;
pub mod auth;
mod error;
pub mod rest;
mod state;
pub mod uploads;

pub use app::{axum, AxumApp};
pub use auth::{Actor, ActorResolver, HeaderActorResolver, JwtActorResolver};
pub use error::AxumError;
pub use state::ApiState;
