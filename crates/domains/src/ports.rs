//! # Ports
//!
//! Contracts the adapters implement. Stores hand back whole documents and
//! never touch counters; that belongs to `crate::lifecycle` via the services.
//!
//! Tombstoned topics and posts are invisible to every read except the
//! single-document lookups called with [`Tombstones::Include`].

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::authz::Actor;
use crate::errors::DomainResult;
use crate::models::{Event, EventQuery, Forum, ForumScope, Post, Region, School, Topic, TopicSort};
use crate::paging::{Page, PageRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tombstones {
    Exclude,
    Include,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SchoolRepo: Send + Sync {
    /// Active schools, optionally narrowed to a region, ordered by name.
    async fn list_schools(&self, region: Option<Region>) -> anyhow::Result<Vec<School>>;
    /// Any school, active or not.
    async fn find_school(&self, id: Uuid) -> anyhow::Result<Option<School>>;
    async fn find_school_by_name(&self, name: &str) -> anyhow::Result<Option<School>>;
    /// Inserts or replaces. Fails with a wrapped [`School::name_taken`] when
    /// another school already holds the name; the check and the write are
    /// one atomic step.
    async fn save_school(&self, school: &School) -> anyhow::Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EventRepo: Send + Sync {
    /// Matching events ordered by start date, earliest first.
    async fn list_events(&self, query: &EventQuery, page: PageRequest) -> anyhow::Result<Page<Event>>;
    async fn find_event(&self, id: Uuid) -> anyhow::Result<Option<Event>>;
    async fn save_event(&self, event: &Event) -> anyhow::Result<()>;
    /// Returns whether anything was removed.
    async fn delete_event(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ForumRepo: Send + Sync {
    /// Active forums in `scope`, ordered by [`crate::models::forum_order`].
    async fn list_forums(&self, scope: ForumScope) -> anyhow::Result<Vec<Forum>>;
    /// Any forum, active or not.
    async fn find_forum(&self, id: Uuid) -> anyhow::Result<Option<Forum>>;
    async fn save_forum(&self, forum: &Forum) -> anyhow::Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TopicRepo: Send + Sync {
    async fn list_topics(
        &self,
        forum_id: Uuid,
        sort: TopicSort,
        page: PageRequest,
    ) -> anyhow::Result<Page<Topic>>;
    async fn find_topic(&self, id: Uuid, tombstones: Tombstones) -> anyhow::Result<Option<Topic>>;
    async fn save_topic(&self, topic: &Topic) -> anyhow::Result<()>;
    /// Bumps `views` on a live topic in place, without rewriting the rest of
    /// the document. Returns `false` when there is no such topic.
    async fn record_view(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Live posts of a topic, oldest first.
    async fn list_posts(&self, topic_id: Uuid, page: PageRequest) -> anyhow::Result<Page<Post>>;
    async fn find_post(&self, id: Uuid, tombstones: Tombstones) -> anyhow::Result<Option<Post>>;
    /// Resolved with [`crate::lifecycle::latest_non_deleted_post`].
    async fn latest_post(&self, topic_id: Uuid) -> anyhow::Result<Option<Post>>;
    async fn save_post(&self, post: &Post) -> anyhow::Result<()>;
    /// Tombstones every live post of a topic. Returns how many changed.
    async fn tombstone_posts(&self, topic_id: Uuid) -> anyhow::Result<u64>;
}

/// Where an uploaded image belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    SchoolLogo,
    SchoolBanner,
    EventBanner,
}

impl MediaKind {
    /// Sub-directory under the media root.
    pub fn category(self) -> &'static str {
        match self {
            MediaKind::SchoolLogo | MediaKind::SchoolBanner => "schools",
            MediaKind::EventBanner => "events",
        }
    }

    /// File name prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            MediaKind::SchoolLogo => "logo",
            MediaKind::SchoolBanner | MediaKind::EventBanner => "banner",
        }
    }

    /// Multipart field carrying the file.
    pub fn field(self) -> &'static str {
        self.prefix()
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Validates and writes an image, returning its public relative path
    /// (`uploads/<category>/<file>`). Rejections carry a `DomainError`.
    async fn store_image(&self, kind: MediaKind, file_name: &str, data: Bytes) -> anyhow::Result<String>;
    /// Removes a file previously returned by `store_image`.
    async fn remove(&self, path: &str) -> anyhow::Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> DomainResult<Actor>;
}

/// The stores a service layer runs against.
#[derive(Clone)]
pub struct Repos {
    pub schools: Arc<dyn SchoolRepo>,
    pub events: Arc<dyn EventRepo>,
    pub forums: Arc<dyn ForumRepo>,
    pub topics: Arc<dyn TopicRepo>,
    pub posts: Arc<dyn PostRepo>,
}

impl Repos {
    /// One store implementing every repository.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: SchoolRepo + EventRepo + ForumRepo + TopicRepo + PostRepo + 'static,
    {
        Self {
            schools: store.clone(),
            events: store.clone(),
            forums: store.clone(),
            topics: store.clone(),
            posts: store,
        }
    }
}
