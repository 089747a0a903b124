use std::sync::Arc;

use chrono::Utc;
use domains::{
    Actor, DomainError, DomainResult, MediaKind, MediaStorage, NewSchool, Region, Repos, School,
    SchoolPatch, Standing, Subject,
};
use uuid::Uuid;

use crate::locks::AggregateLocks;
use crate::media::{discard, Upload};

/// School directory: reference data plus the per-school admin set.
#[derive(Clone)]
pub struct SchoolService {
    repos: Repos,
    media: Arc<dyn MediaStorage>,
    locks: AggregateLocks,
}

impl SchoolService {
    pub fn new(repos: Repos, media: Arc<dyn MediaStorage>, locks: AggregateLocks) -> Self {
        Self { repos, media, locks }
    }

    pub async fn list(&self) -> DomainResult<Vec<School>> {
        Ok(self.repos.schools.list_schools(None).await?)
    }

    pub async fn list_by_region(&self, region: Region) -> DomainResult<Vec<School>> {
        Ok(self.repos.schools.list_schools(Some(region)).await?)
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<School> {
        match self.repos.schools.find_school(id).await? {
            Some(school) if school.is_active => Ok(school),
            _ => Err(DomainError::NotFound("School")),
        }
    }

    #[tracing::instrument(skip(self, input), fields(actor = %actor.id))]
    pub async fn create(&self, actor: &Actor, input: NewSchool) -> DomainResult<School> {
        actor
            .standing_on(&Subject::default())
            .require(Standing::PlatformAdmin, "Not authorized to create schools")?;

        let school = input.into_school(actor.id, Utc::now())?;
        self.ensure_name_free(&school.name).await?;
        self.repos.schools.save_school(&school).await?;
        tracing::info!(school = %school.id, name = %school.name, "school created");
        Ok(school)
    }

    #[tracing::instrument(skip(self, patch), fields(actor = %actor.id))]
    pub async fn update(&self, actor: &Actor, id: Uuid, patch: SchoolPatch) -> DomainResult<School> {
        let _guard = self.locks.acquire(id).await;
        let mut school = self.find(id).await?;
        actor
            .standing_on(&Subject::in_school(Some(&school)))
            .require(Standing::SchoolAdmin, "Not authorized to update this school")?;

        let previous_name = school.name.clone();
        patch.apply(&mut school, Utc::now())?;
        if school.name != previous_name {
            self.ensure_name_free(&school.name).await?;
        }
        self.repos.schools.save_school(&school).await?;
        tracing::info!(school = %id, "school updated");
        Ok(school)
    }

    /// Soft delete.
    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn deactivate(&self, actor: &Actor, id: Uuid) -> DomainResult<()> {
        actor
            .standing_on(&Subject::default())
            .require(Standing::PlatformAdmin, "Not authorized to delete schools")?;

        let _guard = self.locks.acquire(id).await;
        let mut school = self.find(id).await?;
        school.is_active = false;
        school.updated_at = Utc::now();
        self.repos.schools.save_school(&school).await?;
        tracing::info!(school = %id, "school deactivated");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn add_admin(&self, actor: &Actor, school_id: Uuid, user_id: Uuid) -> DomainResult<School> {
        let _guard = self.locks.acquire(school_id).await;
        let mut school = self.find(school_id).await?;
        actor
            .standing_on(&Subject::in_school(Some(&school)))
            .require(Standing::SchoolAdmin, "Not authorized to add admins to this school")?;

        school.add_admin(user_id)?;
        school.updated_at = Utc::now();
        self.repos.schools.save_school(&school).await?;
        tracing::info!(school = %school_id, user = %user_id, "school admin added");
        Ok(school)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn remove_admin(&self, actor: &Actor, school_id: Uuid, user_id: Uuid) -> DomainResult<School> {
        let _guard = self.locks.acquire(school_id).await;
        let mut school = self.find(school_id).await?;
        let standing = actor.standing_on(&Subject::in_school(Some(&school)));
        standing.require(Standing::SchoolAdmin, "Not authorized to remove admins from this school")?;
        if standing == Standing::SchoolAdmin && user_id == actor.id {
            return Err(DomainError::conflict("Cannot remove yourself as admin"));
        }

        school.remove_admin(user_id)?;
        school.updated_at = Utc::now();
        self.repos.schools.save_school(&school).await?;
        tracing::info!(school = %school_id, user = %user_id, "school admin removed");
        Ok(school)
    }

    /// Stores a new logo or banner and returns its relative path.
    #[tracing::instrument(skip(self, upload), fields(actor = %actor.id, file = %upload.file_name))]
    pub async fn upload_image(
        &self,
        actor: &Actor,
        id: Uuid,
        kind: MediaKind,
        upload: Upload,
    ) -> DomainResult<String> {
        let path = self.media.store_image(kind, &upload.file_name, upload.data).await?;
        match self.attach_image(actor, id, kind, &path).await {
            Ok(previous) => {
                discard(&self.media, previous).await;
                Ok(path)
            }
            Err(err) => {
                discard(&self.media, Some(path)).await;
                Err(err)
            }
        }
    }

    async fn attach_image(
        &self,
        actor: &Actor,
        id: Uuid,
        kind: MediaKind,
        path: &str,
    ) -> DomainResult<Option<String>> {
        let _guard = self.locks.acquire(id).await;
        let mut school = self.find(id).await?;
        actor
            .standing_on(&Subject::in_school(Some(&school)))
            .require(Standing::SchoolAdmin, "Not authorized to update this school")?;

        let slot = match kind {
            MediaKind::SchoolLogo => &mut school.logo,
            MediaKind::SchoolBanner => &mut school.banner,
            MediaKind::EventBanner => {
                return Err(DomainError::validation("Unsupported image kind for a school"))
            }
        };
        let previous = slot.replace(path.to_string());
        school.updated_at = Utc::now();
        self.repos.schools.save_school(&school).await?;
        Ok(previous)
    }

    /// Any school, active or not.
    async fn find(&self, id: Uuid) -> DomainResult<School> {
        self.repos
            .schools
            .find_school(id)
            .await?
            .ok_or(DomainError::NotFound("School"))
    }

    async fn ensure_name_free(&self, name: &str) -> DomainResult<()> {
        if self.repos.schools.find_school_by_name(name).await?.is_some() {
            return Err(School::name_taken());
        }
        Ok(())
    }
}
