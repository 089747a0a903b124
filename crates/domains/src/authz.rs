//! # Authorization
//!
//! Every mutating operation asks one question: how does this actor stand
//! relative to the thing being changed? The answer is a [`Standing`],
//! computed once from the actor's [`Role`], the owning school's admin set,
//! the resource's owners and (for forum content) its moderators.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};
use crate::models::School;

/// Platform roles, as issued by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Guest,
    User,
    Alumni,
    SchoolAdmin,
    UsosaAdmin,
    SuperAdmin,
}

impl Role {
    /// Association-wide administrators.
    pub fn is_platform_admin(self) -> bool {
        matches!(self, Role::UsosaAdmin | Role::SuperAdmin)
    }

    /// Any administrative role, school-scoped or not.
    pub fn is_staff(self) -> bool {
        self == Role::SchoolAdmin || self.is_platform_admin()
    }

    pub fn can_organize_events(self) -> bool {
        self == Role::Alumni || self.is_staff()
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    /// The school this user is an alumnus of, if any.
    pub school_id: Option<Uuid>,
}

impl Actor {
    pub fn new(id: Uuid, role: Role, school_id: Option<Uuid>) -> Self {
        Self { id, role, school_id }
    }

    /// Resolves this actor's standing on `subject`, best grant first.
    pub fn standing_on(&self, subject: &Subject<'_>) -> Standing {
        if self.role.is_platform_admin() {
            Standing::PlatformAdmin
        } else if self.role == Role::SchoolAdmin
            && subject.school.is_some_and(|school| school.is_admin(self.id))
        {
            Standing::SchoolAdmin
        } else if subject.moderators.contains(&self.id) {
            Standing::Moderator
        } else if subject.owners.contains(&self.id) {
            Standing::Owner
        } else {
            Standing::Outsider
        }
    }
}

/// The resource an operation targets, reduced to what authorization needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Subject<'a> {
    /// Owning school; `None` for association-wide resources.
    school: Option<&'a School>,
    owners: &'a [Uuid],
    moderators: &'a [Uuid],
}

impl<'a> Subject<'a> {
    /// A resource scoped to `school` (or association-wide when `None`).
    pub fn in_school(school: Option<&'a School>) -> Self {
        Self {
            school,
            ..Self::default()
        }
    }

    pub fn owned_by(mut self, owners: &'a [Uuid]) -> Self {
        self.owners = owners;
        self
    }

    pub fn moderated_by(mut self, moderators: &'a [Uuid]) -> Self {
        self.moderators = moderators;
        self
    }
}

/// How an actor relates to a subject. Ordered weakest to strongest so that
/// a check is a single comparison against the minimum standing required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Standing {
    Outsider,
    /// Author, organizer or creator of the resource.
    Owner,
    /// Listed moderator of the owning forum.
    Moderator,
    /// Administers the owning school.
    SchoolAdmin,
    PlatformAdmin,
}

impl Standing {
    /// Fails with `Forbidden(message)` unless this standing reaches `minimum`.
    pub fn require(self, minimum: Standing, message: &str) -> DomainResult<()> {
        if self >= minimum {
            Ok(())
        } else {
            Err(DomainError::forbidden(message))
        }
    }
}
