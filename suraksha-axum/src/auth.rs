//! Who is calling.
//!
//! Handlers receive an [`Actor`] already resolved from the request
//! headers; stories never look at credentials themselves.

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use suraksha_core::{ActorContext, AppError, AppResult, Role};
use tracing::debug;

use crate::{ApiState, AxumError};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Turns request headers into an [`ActorContext`].
pub trait ActorResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> AppResult<ActorContext>;
}

/// Token payload: `{ id, role? }`; a missing role means student.
#[derive(Debug, Deserialize)]
struct Claims {
    id: String,
    #[serde(default)]
    role: Option<String>,
}

/// HS256 bearer tokens signed with a shared secret
pub struct JwtActorResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtActorResolver {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl ActorResolver for JwtActorResolver {
    fn resolve(&self, headers: &HeaderMap) -> AppResult<ActorContext> {
        let token = bearer_token(headers)
            .ok_or_else(|| AppError::not_authenticated("Access token not found").into_anyhow())?;

        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "rejected access token");
                AppError::not_authenticated("Invalid access token").into_anyhow()
            })?
            .claims;

        let role = match claims.role.as_deref() {
            None => Role::Student,
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|e| AppError::forbidden(e).into_anyhow())?,
        };

        Ok(ActorContext::new(claims.id, role))
    }
}

/// Trusts `x-actor-id` / `x-actor-role` set by an authenticating gateway.
#[derive(Debug, Default, Clone)]
pub struct HeaderActorResolver;

impl ActorResolver for HeaderActorResolver {
    fn resolve(&self, headers: &HeaderMap) -> AppResult<ActorContext> {
        let actor_id = header(headers, ACTOR_ID_HEADER)
            .ok_or_else(|| AppError::not_authenticated("Missing x-actor-id header").into_anyhow())?;

        let role = match header(headers, ACTOR_ROLE_HEADER) {
            None => Role::Student,
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|e| AppError::forbidden(e).into_anyhow())?,
        };

        Ok(ActorContext::new(actor_id, role))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = header(headers, "authorization")?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Authenticated caller of a request
#[derive(Debug, Clone)]
pub struct Actor(pub ActorContext);

impl Actor {
    /// Fail with 403 unless the caller has one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<&ActorContext, AxumError> {
        if self.0.has_role(roles) {
            Ok(&self.0)
        } else {
            Err(AppError::forbidden(format!(
                "Role {} may not perform this action",
                self.0.role
            ))
            .into())
        }
    }
}

impl FromRequestParts<ApiState> for Actor {
    type Rejection = AxumError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let mut actor = state.resolver.resolve(&parts.headers)?;
        if let Some(request_id) = header(&parts.headers, REQUEST_ID_HEADER) {
            actor = actor.with_request_id(request_id);
        }
        Ok(Actor(actor))
    }
}
