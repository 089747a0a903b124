use chrono::Utc;
use domains::{
    Actor, DomainError, DomainResult, Page, PageRequest, Post, Report, ReportAction, Repos,
    Standing, Tombstones,
};
use serde::Serialize;
use uuid::Uuid;

use crate::locks::AggregateLocks;
use crate::threads::{reload_post, topic_of_post, Thread};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub liked: bool,
    pub likes: usize,
}

#[derive(Clone)]
pub struct PostService {
    repos: Repos,
    locks: AggregateLocks,
}

impl PostService {
    pub fn new(repos: Repos, locks: AggregateLocks) -> Self {
        Self { repos, locks }
    }

    /// Live replies of a live topic, oldest first.
    pub async fn list(&self, topic_id: Uuid, page: PageRequest) -> DomainResult<Page<Post>> {
        if self
            .repos
            .topics
            .find_topic(topic_id, Tombstones::Exclude)
            .await?
            .is_none()
        {
            return Err(DomainError::NotFound("Topic"));
        }
        Ok(self.repos.posts.list_posts(topic_id, page.normalized()).await?)
    }

    #[tracing::instrument(skip(self, content), fields(actor = %actor.id))]
    pub async fn create(
        &self,
        actor: &Actor,
        topic_id: Uuid,
        content: &str,
        parent_post_id: Option<Uuid>,
    ) -> DomainResult<Post> {
        let mut thread = Thread::lock(&self.repos, &self.locks, topic_id, Tombstones::Exclude).await?;
        if thread.topic.is_locked {
            return Err(DomainError::forbidden(
                "This topic is locked and cannot receive new posts",
            ));
        }
        if let Some(parent_id) = parent_post_id {
            let parent = self.repos.posts.find_post(parent_id, Tombstones::Exclude).await?;
            if parent.is_none_or(|p| p.topic_id != topic_id) {
                return Err(DomainError::NotFound("Parent post"));
            }
        }

        let post = Post::new(topic_id, actor.id, content, parent_post_id, Utc::now())?;
        self.repos.posts.save_post(&post).await?;
        thread.topic.record_post(&post);
        self.repos.topics.save_topic(&thread.topic).await?;
        thread.forum.record_post(post.created_at);
        self.repos.forums.save_forum(&thread.forum).await?;
        tracing::info!(
            post = %post.id,
            topic = %topic_id,
            replies = thread.topic.replies,
            forum_posts = thread.forum.posts,
            "post created"
        );
        Ok(post)
    }

    #[tracing::instrument(skip(self, content), fields(actor = %actor.id))]
    pub async fn update(&self, actor: &Actor, id: Uuid, content: &str) -> DomainResult<Post> {
        let topic_id = topic_of_post(&self.repos, id, Tombstones::Exclude).await?;
        let thread = Thread::lock(&self.repos, &self.locks, topic_id, Tombstones::Exclude).await?;
        let mut post = reload_post(&self.repos, id, Tombstones::Exclude).await?;
        thread
            .standing(actor, post.user_id)
            .require(Standing::Owner, "Not authorized to update this post")?;

        post.edit(content, Utc::now())?;
        self.repos.posts.save_post(&post).await?;
        Ok(post)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> DomainResult<()> {
        let topic_id = topic_of_post(&self.repos, id, Tombstones::Exclude).await?;
        let mut thread = Thread::lock(&self.repos, &self.locks, topic_id, Tombstones::Exclude).await?;
        let mut post = reload_post(&self.repos, id, Tombstones::Exclude).await?;
        thread
            .standing(actor, post.user_id)
            .require(Standing::Owner, "Not authorized to delete this post")?;

        thread.retire_post(&self.repos, &mut post).await
    }

    pub async fn toggle_like(&self, actor: &Actor, id: Uuid) -> DomainResult<LikeOutcome> {
        let topic_id = topic_of_post(&self.repos, id, Tombstones::Exclude).await?;
        let _thread = Thread::lock(&self.repos, &self.locks, topic_id, Tombstones::Exclude).await?;
        let mut post = reload_post(&self.repos, id, Tombstones::Exclude).await?;

        let liked = post.toggle_like(actor.id);
        self.repos.posts.save_post(&post).await?;
        Ok(LikeOutcome {
            liked,
            likes: post.likes.len(),
        })
    }

    #[tracing::instrument(skip(self, reason), fields(actor = %actor.id))]
    pub async fn report(&self, actor: &Actor, id: Uuid, reason: &str) -> DomainResult<Report> {
        if reason.trim().is_empty() {
            return Err(DomainError::validation("Reason is required for reporting a post"));
        }
        let topic_id = topic_of_post(&self.repos, id, Tombstones::Exclude).await?;
        let _thread = Thread::lock(&self.repos, &self.locks, topic_id, Tombstones::Exclude).await?;
        let mut post = reload_post(&self.repos, id, Tombstones::Exclude).await?;

        let report = post.add_report(actor.id, reason, Utc::now())?.clone();
        self.repos.posts.save_post(&post).await?;
        tracing::info!(post = %id, report = %report.id, "post reported");
        Ok(report)
    }

    /// Closes a report. `DeletePost` also retires the post when it is still
    /// live; a post that is already gone only has its report closed.
    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn resolve_report(
        &self,
        actor: &Actor,
        id: Uuid,
        report_id: Uuid,
        action: ReportAction,
    ) -> DomainResult<Post> {
        let topic_id = topic_of_post(&self.repos, id, Tombstones::Include).await?;
        let mut thread = Thread::lock(&self.repos, &self.locks, topic_id, Tombstones::Include).await?;
        let mut post = reload_post(&self.repos, id, Tombstones::Include).await?;
        thread
            .standing(actor, post.user_id)
            .require(Standing::Moderator, "Not authorized to handle post reports")?;

        post.review_report(report_id)?;
        let retire = action == ReportAction::DeletePost && !post.is_deleted && !thread.topic.is_deleted;
        if retire {
            thread.retire_post(&self.repos, &mut post).await?;
        } else {
            self.repos.posts.save_post(&post).await?;
        }
        tracing::info!(post = %id, report = %report_id, ?action, "report handled");
        Ok(post)
    }
}
