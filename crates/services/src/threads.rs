//! Loading and retiring forum content under the owning forum's lock.
//!
//! Every write to a topic or post goes through here: the topic's forum id is
//! peeked first, the forum lock is taken, and only then are the documents
//! re-read. Writers therefore never save a stale copy over a counter update.

use chrono::Utc;
use domains::lifecycle::latest_non_deleted_post;
use domains::{
    Actor, DomainError, DomainResult, Forum, Post, Repos, School, Standing, Subject, Tombstones,
    Topic,
};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::forums::school_of;
use crate::locks::AggregateLocks;

/// A topic with its forum and the forum's school, read under the forum lock.
pub(crate) struct Thread {
    pub topic: Topic,
    pub forum: Forum,
    pub school: Option<School>,
    _guard: OwnedMutexGuard<()>,
}

impl Thread {
    /// Opens a thread for writing. `tombstones` applies to the topic.
    pub async fn lock(
        repos: &Repos,
        locks: &AggregateLocks,
        topic_id: Uuid,
        tombstones: Tombstones,
    ) -> DomainResult<Self> {
        let forum_id = repos
            .topics
            .find_topic(topic_id, tombstones)
            .await?
            .ok_or(DomainError::NotFound("Topic"))?
            .forum_id;
        let guard = locks.acquire(forum_id).await;

        let topic = repos
            .topics
            .find_topic(topic_id, tombstones)
            .await?
            .ok_or(DomainError::NotFound("Topic"))?;
        let forum = repos
            .forums
            .find_forum(forum_id)
            .await?
            .ok_or(DomainError::NotFound("Forum"))?;
        let school = school_of(repos, &forum).await?;
        Ok(Self {
            topic,
            forum,
            school,
            _guard: guard,
        })
    }

    /// How `actor` stands on content written by `author` in this thread.
    pub fn standing(&self, actor: &Actor, author: Uuid) -> Standing {
        let authors = [author];
        actor.standing_on(
            &Subject::in_school(self.school.as_ref())
                .owned_by(&authors)
                .moderated_by(&self.forum.moderators),
        )
    }

    /// Tombstones a live reply and rolls the counters back.
    pub async fn retire_post(&mut self, repos: &Repos, post: &mut Post) -> DomainResult<()> {
        post.is_deleted = true;
        post.updated_at = Utc::now();
        repos.posts.save_post(post).await?;

        let latest = repos.posts.latest_post(self.topic.id).await?;
        self.topic
            .forget_post(post, latest_non_deleted_post(latest.as_ref()));
        repos.topics.save_topic(&self.topic).await?;

        self.forum.forget_post();
        repos.forums.save_forum(&self.forum).await?;
        tracing::info!(
            post = %post.id,
            topic = %self.topic.id,
            replies = self.topic.replies,
            forum_posts = self.forum.posts,
            "post deleted"
        );
        Ok(())
    }
}

/// Looks up the topic a post belongs to.
pub(crate) async fn topic_of_post(repos: &Repos, post_id: Uuid, tombstones: Tombstones) -> DomainResult<Uuid> {
    Ok(repos
        .posts
        .find_post(post_id, tombstones)
        .await?
        .ok_or(DomainError::NotFound("Post"))?
        .topic_id)
}

/// Re-reads a post once its thread is locked.
pub(crate) async fn reload_post(repos: &Repos, post_id: Uuid, tombstones: Tombstones) -> DomainResult<Post> {
    repos
        .posts
        .find_post(post_id, tombstones)
        .await?
        .ok_or(DomainError::NotFound("Post"))
}
