use chrono::Utc;
use domains::{
    Actor, DomainError, DomainResult, Forum, ForumPatch, ForumScope, NewForum, Repos, School,
    Standing, Subject,
};
use uuid::Uuid;

use crate::locks::AggregateLocks;

/// Forum registry. Counters are owned by the topic and post services; this
/// service only manages metadata and the moderator set.
#[derive(Clone)]
pub struct ForumService {
    repos: Repos,
    locks: AggregateLocks,
}

impl ForumService {
    pub fn new(repos: Repos, locks: AggregateLocks) -> Self {
        Self { repos, locks }
    }

    pub async fn list(&self) -> DomainResult<Vec<Forum>> {
        Ok(self.repos.forums.list_forums(ForumScope::All).await?)
    }

    pub async fn general(&self) -> DomainResult<Forum> {
        self.repos
            .forums
            .list_forums(ForumScope::General)
            .await?
            .into_iter()
            .next()
            .ok_or(DomainError::NotFound("General forum"))
    }

    pub async fn list_by_school(&self, school_id: Uuid) -> DomainResult<Vec<Forum>> {
        if self.repos.schools.find_school(school_id).await?.is_none() {
            return Err(DomainError::NotFound("School"));
        }
        Ok(self.repos.forums.list_forums(ForumScope::School(school_id)).await?)
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Forum> {
        match self.repos.forums.find_forum(id).await? {
            Some(forum) if forum.is_active => Ok(forum),
            _ => Err(DomainError::NotFound("Forum")),
        }
    }

    #[tracing::instrument(skip(self, input), fields(actor = %actor.id))]
    pub async fn create(&self, actor: &Actor, input: NewForum) -> DomainResult<Forum> {
        if !actor.role.is_staff() {
            return Err(DomainError::forbidden("Not authorized to create forums"));
        }
        match input.school_id {
            Some(school_id) => {
                let school = self
                    .repos
                    .schools
                    .find_school(school_id)
                    .await?
                    .ok_or(DomainError::NotFound("School"))?;
                actor
                    .standing_on(&Subject::in_school(Some(&school)))
                    .require(Standing::SchoolAdmin, "Not authorized to create forums for this school")?;
            }
            None => actor
                .standing_on(&Subject::default())
                .require(Standing::PlatformAdmin, "Not authorized to create general forums")?,
        }

        let forum = input.into_forum(actor.id, Utc::now())?;
        self.repos.forums.save_forum(&forum).await?;
        tracing::info!(forum = %forum.id, general = forum.is_general, "forum created");
        Ok(forum)
    }

    #[tracing::instrument(skip(self, patch), fields(actor = %actor.id))]
    pub async fn update(&self, actor: &Actor, id: Uuid, patch: ForumPatch) -> DomainResult<Forum> {
        let _guard = self.locks.acquire(id).await;
        let mut forum = self.find(id).await?;
        self.require_admin(actor, &forum, "Not authorized to update this forum")
            .await?;

        patch.apply(&mut forum, Utc::now())?;
        self.repos.forums.save_forum(&forum).await?;
        tracing::info!(forum = %id, "forum updated");
        Ok(forum)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn add_moderator(&self, actor: &Actor, forum_id: Uuid, user_id: Uuid) -> DomainResult<Forum> {
        let _guard = self.locks.acquire(forum_id).await;
        let mut forum = self.find(forum_id).await?;
        self.require_admin(actor, &forum, "Not authorized to add moderators to this forum")
            .await?;

        forum.add_moderator(user_id)?;
        forum.updated_at = Utc::now();
        self.repos.forums.save_forum(&forum).await?;
        tracing::info!(forum = %forum_id, user = %user_id, "moderator added");
        Ok(forum)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn remove_moderator(&self, actor: &Actor, forum_id: Uuid, user_id: Uuid) -> DomainResult<Forum> {
        let _guard = self.locks.acquire(forum_id).await;
        let mut forum = self.find(forum_id).await?;
        self.require_admin(actor, &forum, "Not authorized to remove moderators from this forum")
            .await?;

        forum.remove_moderator(user_id)?;
        forum.updated_at = Utc::now();
        self.repos.forums.save_forum(&forum).await?;
        tracing::info!(forum = %forum_id, user = %user_id, "moderator removed");
        Ok(forum)
    }

    async fn find(&self, id: Uuid) -> DomainResult<Forum> {
        self.repos
            .forums
            .find_forum(id)
            .await?
            .ok_or(DomainError::NotFound("Forum"))
    }

    /// School forums answer to that school's admins; general forums only to
    /// platform admins.
    async fn require_admin(&self, actor: &Actor, forum: &Forum, message: &str) -> DomainResult<()> {
        let school = school_of(&self.repos, forum).await?;
        actor
            .standing_on(&Subject::in_school(school.as_ref()))
            .require(Standing::SchoolAdmin, message)
    }
}

pub(crate) async fn school_of(repos: &Repos, forum: &Forum) -> DomainResult<Option<School>> {
    match forum.school_id {
        Some(id) => Ok(repos.schools.find_school(id).await?),
        None => Ok(None),
    }
}
