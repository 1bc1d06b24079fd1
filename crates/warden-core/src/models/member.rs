//! Member notation and principal identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WardenError;

/// Kind of subject that can be a member of a group or role binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    User,
    ServiceAccount,
    Group,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::ServiceAccount => "service_account",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectKind {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "service_account" => Ok(Self::ServiceAccount),
            "group" => Ok(Self::Group),
            other => Err(WardenError::MalformedMember(other.to_string())),
        }
    }
}

/// A member reference as submitted by callers: a type tag plus an id.
///
/// The tag stays a plain string so that an unknown tag survives
/// deserialization and is rejected by member resolution instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberNotation {
    #[serde(rename = "type")]
    pub kind: String,
    pub uuid: Uuid,
}

impl MemberNotation {
    pub fn new(kind: SubjectKind, uuid: Uuid) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            uuid,
        }
    }

    pub fn user(uuid: Uuid) -> Self {
        Self::new(SubjectKind::User, uuid)
    }

    pub fn service_account(uuid: Uuid) -> Self {
        Self::new(SubjectKind::ServiceAccount, uuid)
    }

    pub fn group(uuid: Uuid) -> Self {
        Self::new(SubjectKind::Group, uuid)
    }

    pub fn subject_kind(&self) -> Result<SubjectKind, WardenError> {
        self.kind.parse()
    }
}

/// Member ids split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Members {
    pub users: Vec<Uuid>,
    pub service_accounts: Vec<Uuid>,
    pub groups: Vec<Uuid>,
}

/// A subject that can hold roles directly: a user or a service account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Principal {
    User(Uuid),
    ServiceAccount(Uuid),
}

impl Principal {
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(id) | Self::ServiceAccount(id) => *id,
        }
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::User(_) => SubjectKind::User,
            Self::ServiceAccount(_) => SubjectKind::ServiceAccount,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// What the engine needs to know about a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrincipalRecord {
    pub tenant_uuid: Uuid,
    pub archived: bool,
}
