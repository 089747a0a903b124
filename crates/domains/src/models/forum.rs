use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::school::{dedup_in_order, required};
use crate::errors::{DomainError, DomainResult};

/// A discussion space, association-wide ("general") or scoped to a school.
///
/// `topics` and `posts` are denormalized counters maintained by the topic
/// and post lifecycle (see `crate::lifecycle`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forum {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub school_id: Option<Uuid>,
    pub is_general: bool,
    /// Never empty
    pub moderators: Vec<Uuid>,
    pub topics: u64,
    /// Counts each live topic's opening post plus its live replies.
    pub posts: u64,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Forum {
    pub fn is_moderator(&self, user_id: Uuid) -> bool {
        self.moderators.contains(&user_id)
    }

    pub fn add_moderator(&mut self, user_id: Uuid) -> DomainResult<()> {
        if self.is_moderator(user_id) {
            return Err(DomainError::conflict("User is already a moderator for this forum"));
        }
        self.moderators.push(user_id);
        Ok(())
    }

    /// Removes a moderator; rejected without change when it is the last one.
    pub fn remove_moderator(&mut self, user_id: Uuid) -> DomainResult<()> {
        if !self.is_moderator(user_id) {
            return Err(DomainError::conflict("User is not a moderator for this forum"));
        }
        if self.moderators.len() == 1 {
            return Err(DomainError::conflict("Cannot remove the last moderator from a forum"));
        }
        self.moderators.retain(|id| *id != user_id);
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewForum {
    pub name: String,
    pub description: String,
    /// Absent for a general forum
    pub school_id: Option<Uuid>,
    pub moderators: Option<Vec<Uuid>>,
}

impl NewForum {
    pub fn into_forum(self, creator: Uuid, now: DateTime<Utc>) -> DomainResult<Forum> {
        let name = required(&self.name, "Forum name")?;
        let description = required(&self.description, "Description")?;
        let moderators = match self.moderators {
            Some(list) => non_empty_moderators(list)?,
            None => vec![creator],
        };

        Ok(Forum {
            id: Uuid::now_v7(),
            name,
            description,
            school_id: self.school_id,
            is_general: self.school_id.is_none(),
            moderators,
            topics: 0,
            posts: 0,
            last_activity: now,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

fn non_empty_moderators(mut list: Vec<Uuid>) -> DomainResult<Vec<Uuid>> {
    dedup_in_order(&mut list);
    if list.is_empty() {
        return Err(DomainError::validation("A forum needs at least one moderator"));
    }
    Ok(list)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub moderators: Option<Vec<Uuid>>,
    pub is_active: Option<bool>,
}

impl ForumPatch {
    pub fn apply(self, forum: &mut Forum, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = self.name {
            forum.name = required(&name, "Forum name")?;
        }
        if let Some(description) = self.description {
            forum.description = required(&description, "Description")?;
        }
        if let Some(moderators) = self.moderators {
            forum.moderators = non_empty_moderators(moderators)?;
        }
        if let Some(active) = self.is_active {
            forum.is_active = active;
        }
        forum.updated_at = now;
        Ok(())
    }
}

/// Which active forums a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForumScope {
    All,
    General,
    School(Uuid),
}

impl ForumScope {
    pub fn matches(&self, forum: &Forum) -> bool {
        forum.is_active
            && match self {
                ForumScope::All => true,
                ForumScope::General => forum.is_general,
                ForumScope::School(id) => forum.school_id == Some(*id),
            }
    }
}

/// General forums first, then by name.
pub fn forum_order(a: &Forum, b: &Forum) -> std::cmp::Ordering {
    b.is_general
        .cmp(&a.is_general)
        .then_with(|| a.name.cmp(&b.name))
}
