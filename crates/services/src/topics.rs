use chrono::Utc;
use domains::{
    Actor, DomainError, DomainResult, NewTopic, Page, PageRequest, Repos, Standing, Tombstones,
    Topic, TopicPatch, TopicSort,
};
use uuid::Uuid;

use crate::locks::AggregateLocks;
use crate::threads::Thread;

#[derive(Clone)]
pub struct TopicService {
    repos: Repos,
    locks: AggregateLocks,
}

impl TopicService {
    pub fn new(repos: Repos, locks: AggregateLocks) -> Self {
        Self { repos, locks }
    }

    /// Live topics of an active forum, pinned first.
    pub async fn list(&self, forum_id: Uuid, sort: TopicSort, page: PageRequest) -> DomainResult<Page<Topic>> {
        match self.repos.forums.find_forum(forum_id).await? {
            Some(forum) if forum.is_active => {}
            _ => return Err(DomainError::NotFound("Forum")),
        }
        Ok(self
            .repos
            .topics
            .list_topics(forum_id, sort, page.normalized())
            .await?)
    }

    /// Returns the topic after counting this view. Views skip the forum
    /// lock; a locked writer saving the topic concurrently may drop one.
    pub async fn get(&self, id: Uuid) -> DomainResult<Topic> {
        if !self.repos.topics.record_view(id).await? {
            return Err(DomainError::NotFound("Topic"));
        }
        self.repos
            .topics
            .find_topic(id, Tombstones::Exclude)
            .await?
            .ok_or(DomainError::NotFound("Topic"))
    }

    #[tracing::instrument(skip(self, input), fields(actor = %actor.id, forum = %input.forum_id))]
    pub async fn create(&self, actor: &Actor, input: NewTopic) -> DomainResult<Topic> {
        let _guard = self.locks.acquire(input.forum_id).await;
        let mut forum = match self.repos.forums.find_forum(input.forum_id).await? {
            Some(forum) if forum.is_active => forum,
            _ => return Err(DomainError::NotFound("Forum")),
        };

        let topic = input.into_topic(actor.id, Utc::now())?;
        self.repos.topics.save_topic(&topic).await?;
        forum.record_topic(topic.created_at);
        self.repos.forums.save_forum(&forum).await?;
        tracing::info!(topic = %topic.id, topics = forum.topics, posts = forum.posts, "topic created");
        Ok(topic)
    }

    #[tracing::instrument(skip(self, patch), fields(actor = %actor.id))]
    pub async fn update(&self, actor: &Actor, id: Uuid, patch: TopicPatch) -> DomainResult<Topic> {
        let mut thread = Thread::lock(&self.repos, &self.locks, id, Tombstones::Exclude).await?;
        thread
            .standing(actor, thread.topic.user_id)
            .require(Standing::Owner, "Not authorized to update this topic")?;

        patch.apply(&mut thread.topic, Utc::now())?;
        self.repos.topics.save_topic(&thread.topic).await?;
        Ok(thread.topic)
    }

    /// Tombstones the topic and every post in it. Forum counters drop by the
    /// topic plus its opening post and live replies.
    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> DomainResult<()> {
        let mut thread = Thread::lock(&self.repos, &self.locks, id, Tombstones::Exclude).await?;
        thread
            .standing(actor, thread.topic.user_id)
            .require(Standing::Owner, "Not authorized to delete this topic")?;

        thread.topic.is_deleted = true;
        thread.topic.updated_at = Utc::now();
        self.repos.topics.save_topic(&thread.topic).await?;
        let cascaded = self.repos.posts.tombstone_posts(id).await?;

        thread.forum.forget_topic(thread.topic.replies);
        self.repos.forums.save_forum(&thread.forum).await?;
        tracing::info!(
            topic = %id,
            cascaded,
            topics = thread.forum.topics,
            posts = thread.forum.posts,
            "topic deleted"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn toggle_pin(&self, actor: &Actor, id: Uuid) -> DomainResult<Topic> {
        let mut thread = Thread::lock(&self.repos, &self.locks, id, Tombstones::Exclude).await?;
        thread
            .standing(actor, thread.topic.user_id)
            .require(Standing::Moderator, "Not authorized to pin/unpin topics")?;

        thread.topic.is_pinned = !thread.topic.is_pinned;
        self.repos.topics.save_topic(&thread.topic).await?;
        tracing::info!(topic = %id, pinned = thread.topic.is_pinned, "topic pin toggled");
        Ok(thread.topic)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn toggle_lock(&self, actor: &Actor, id: Uuid) -> DomainResult<Topic> {
        let mut thread = Thread::lock(&self.repos, &self.locks, id, Tombstones::Exclude).await?;
        thread
            .standing(actor, thread.topic.user_id)
            .require(Standing::Moderator, "Not authorized to lock/unlock topics")?;

        thread.topic.is_locked = !thread.topic.is_locked;
        self.repos.topics.save_topic(&thread.topic).await?;
        tracing::info!(topic = %id, locked = thread.topic.is_locked, "topic lock toggled");
        Ok(thread.topic)
    }
}
