//! Authenticated caller context.
//!
//! Identity is resolved by the transport layer; everything below it only
//! ever sees an [`ActorContext`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Parent,
    Therapist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Parent => "parent",
            Role::Therapist => "therapist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            "therapist" => Ok(Role::Therapist),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Context carried into every service call.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub actor_id: ActorId,
    pub role: Role,
    pub request_id: String,
}

impl ActorContext {
    pub fn new<S: Into<String>>(actor_id: S, role: Role) -> Self {
        Self {
            actor_id: ActorId::new(actor_id),
            role,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn student<S: Into<String>>(actor_id: S) -> Self {
        Self::new(actor_id, Role::Student)
    }

    pub fn with_request_id<S: Into<String>>(mut self, request_id: S) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}
