use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::school::required;
use crate::errors::{DomainError, DomainResult};

/// A thread within a forum. The opening message lives in `content`; replies
/// are separate `Post` documents counted by `replies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: Uuid,
    pub title: String,
    pub forum_id: Uuid,
    /// Author
    pub user_id: Uuid,
    pub content: String,
    pub views: u64,
    pub replies: u64,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub last_post_id: Option<Uuid>,
    pub last_post_at: DateTime<Utc>,
    pub last_post_user_id: Uuid,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTopic {
    pub forum_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewTopic {
    pub fn into_topic(self, author: Uuid, now: DateTime<Utc>) -> DomainResult<Topic> {
        Ok(Topic {
            id: Uuid::now_v7(),
            title: required(&self.title, "Title")?,
            forum_id: self.forum_id,
            user_id: author,
            content: required(&self.content, "Content")?,
            views: 0,
            replies: 0,
            is_pinned: false,
            is_locked: false,
            last_post_id: None,
            last_post_at: now,
            last_post_user_id: author,
            tags: clean_tags(self.tags),
            created_at: now,
            updated_at: now,
            is_deleted: false,
        })
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl TopicPatch {
    pub fn apply(self, topic: &mut Topic, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(title) = self.title {
            topic.title = required(&title, "Title")?;
        }
        if let Some(content) = self.content {
            topic.content = required(&content, "Content")?;
        }
        if let Some(tags) = self.tags {
            topic.tags = clean_tags(tags);
        }
        topic.updated_at = now;
        Ok(())
    }
}

/// Orderings offered by the topic listing. Pinned topics always lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicSort {
    /// Most recent activity
    #[default]
    Latest,
    /// Most recently created
    Newest,
    /// Most viewed
    Popular,
    MostReplies,
}

impl TopicSort {
    pub fn compare(self, a: &Topic, b: &Topic) -> std::cmp::Ordering {
        let pinned = b.is_pinned.cmp(&a.is_pinned);
        let secondary = match self {
            TopicSort::Latest => b.last_post_at.cmp(&a.last_post_at),
            TopicSort::Newest => b.created_at.cmp(&a.created_at),
            TopicSort::Popular => b.views.cmp(&a.views),
            TopicSort::MostReplies => b.replies.cmp(&a.replies),
        };
        pinned.then(secondary).then_with(|| b.id.cmp(&a.id))
    }
}

impl std::str::FromStr for TopicSort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(TopicSort::Latest),
            "newest" => Ok(TopicSort::Newest),
            "popular" => Ok(TopicSort::Popular),
            "most_replies" => Ok(TopicSort::MostReplies),
            other => Err(DomainError::validation(format!("Unknown sort: {other}"))),
        }
    }
}
