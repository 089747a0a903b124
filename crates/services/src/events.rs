use std::sync::Arc;

use chrono::Utc;
use domains::{
    Actor, AttendeePatch, Audience, DomainError, DomainResult, Event, EventPatch, EventQuery,
    EventStatus, EventType, MediaKind, MediaStorage, NewEvent, Page, PageRequest, PaymentStatus,
    Repos, School, Standing, Subject,
};
use serde::Serialize;
use uuid::Uuid;

use crate::locks::AggregateLocks;
use crate::media::{discard, Upload};

/// Listing filters as accepted from callers.
#[derive(Debug, Clone)]
pub struct EventFilter {
    pub event_type: Option<EventType>,
    pub school_id: Option<Uuid>,
    /// Defaults to published
    pub status: Option<EventStatus>,
    /// Only events that have not started yet
    pub upcoming: bool,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            event_type: None,
            school_id: None,
            status: None,
            upcoming: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub requires_payment: bool,
    pub payment_status: PaymentStatus,
}

/// Events and their attendee rosters.
#[derive(Clone)]
pub struct EventService {
    repos: Repos,
    media: Arc<dyn MediaStorage>,
    locks: AggregateLocks,
}

impl EventService {
    pub fn new(repos: Repos, media: Arc<dyn MediaStorage>, locks: AggregateLocks) -> Self {
        Self { repos, media, locks }
    }

    pub async fn list(
        &self,
        viewer: Option<&Actor>,
        filter: EventFilter,
        page: PageRequest,
    ) -> DomainResult<Page<Event>> {
        let query = EventQuery {
            event_type: filter.event_type,
            school_id: filter.school_id,
            status: filter.status.unwrap_or(EventStatus::Published),
            starting_after: filter.upcoming.then(Utc::now),
            audience: Audience::of(viewer),
        };
        Ok(self.repos.events.list_events(&query, page.normalized()).await?)
    }

    pub async fn get(&self, viewer: Option<&Actor>, id: Uuid) -> DomainResult<Event> {
        let event = self.find(id).await?;
        event.check_viewable_by(viewer)?;
        Ok(event)
    }

    #[tracing::instrument(skip(self, input), fields(actor = %actor.id))]
    pub async fn create(&self, actor: &Actor, input: NewEvent) -> DomainResult<Event> {
        if !actor.role.can_organize_events() {
            return Err(DomainError::forbidden("Not authorized to create events"));
        }
        if let Some(school_id) = input.school_id {
            self.check_assignable(actor, school_id, "Not authorized to create events for this school")
                .await?;
        }

        let event = input.into_event(actor.id, Utc::now())?;
        self.repos.events.save_event(&event).await?;
        tracing::info!(event = %event.id, title = %event.title, "event created");
        Ok(event)
    }

    #[tracing::instrument(skip(self, patch), fields(actor = %actor.id))]
    pub async fn update(&self, actor: &Actor, id: Uuid, patch: EventPatch) -> DomainResult<Event> {
        let _guard = self.locks.acquire(id).await;
        let mut event = self.find(id).await?;
        self.standing(actor, &event, &event.owners())
            .await?
            .require(Standing::Owner, "Not authorized to update this event")?;

        if let Some(Some(school_id)) = patch.school_id {
            if event.school_id != Some(school_id) {
                self.check_assignable(actor, school_id, "Not authorized to assign event to this school")
                    .await?;
            }
        }
        patch.apply(&mut event, actor.id, Utc::now())?;
        self.repos.events.save_event(&event).await?;
        tracing::info!(event = %id, "event updated");
        Ok(event)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> DomainResult<()> {
        let _guard = self.locks.acquire(id).await;
        let event = self.find(id).await?;
        self.standing(actor, &event, &event.owners())
            .await?
            .require(Standing::Owner, "Not authorized to delete this event")?;

        self.repos.events.delete_event(id).await?;
        tracing::info!(event = %id, "event deleted");
        discard(&self.media, event.banner).await;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn register(&self, actor: &Actor, id: Uuid) -> DomainResult<Registration> {
        let _guard = self.locks.acquire(id).await;
        let mut event = self.find(id).await?;
        let payment_status = event.register(actor, Utc::now())?;
        self.repos.events.save_event(&event).await?;
        tracing::info!(event = %id, seats = event.seats_taken(), "registration recorded");
        Ok(Registration {
            requires_payment: payment_status == PaymentStatus::Pending,
            payment_status,
        })
    }

    #[tracing::instrument(skip(self), fields(actor = %actor.id))]
    pub async fn cancel_registration(&self, actor: &Actor, id: Uuid) -> DomainResult<()> {
        let _guard = self.locks.acquire(id).await;
        let mut event = self.find(id).await?;
        event.cancel_registration(actor.id)?;
        self.repos.events.save_event(&event).await?;
        tracing::info!(event = %id, "registration cancelled");
        Ok(())
    }

    #[tracing::instrument(skip(self, patch), fields(actor = %actor.id))]
    pub async fn update_attendee(
        &self,
        actor: &Actor,
        id: Uuid,
        user_id: Uuid,
        patch: AttendeePatch,
    ) -> DomainResult<()> {
        let _guard = self.locks.acquire(id).await;
        let mut event = self.find(id).await?;
        self.standing(actor, &event, &[event.organizer])
            .await?
            .require(Standing::Owner, "Not authorized to update attendee status")?;

        event.update_attendee(user_id, patch)?;
        self.repos.events.save_event(&event).await?;
        Ok(())
    }

    /// Returns the ids actually added to the roster.
    #[tracing::instrument(skip(self, user_ids), fields(actor = %actor.id, requested = user_ids.len()))]
    pub async fn invite(&self, actor: &Actor, id: Uuid, user_ids: &[Uuid]) -> DomainResult<Vec<Uuid>> {
        if user_ids.is_empty() {
            return Err(DomainError::validation("User IDs are required"));
        }
        let _guard = self.locks.acquire(id).await;
        let mut event = self.find(id).await?;
        self.standing(actor, &event, &event.owners())
            .await?
            .require(Standing::Owner, "Not authorized to invite users to this event")?;

        let added = event.invite(user_ids, Utc::now());
        if !added.is_empty() {
            self.repos.events.save_event(&event).await?;
        }
        tracing::info!(event = %id, added = added.len(), "users invited");
        Ok(added)
    }

    #[tracing::instrument(skip(self, upload), fields(actor = %actor.id, file = %upload.file_name))]
    pub async fn upload_banner(&self, actor: &Actor, id: Uuid, upload: Upload) -> DomainResult<String> {
        let path = self
            .media
            .store_image(MediaKind::EventBanner, &upload.file_name, upload.data)
            .await?;
        match self.attach_banner(actor, id, &path).await {
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

    async fn attach_banner(&self, actor: &Actor, id: Uuid, path: &str) -> DomainResult<Option<String>> {
        let _guard = self.locks.acquire(id).await;
        let mut event = self.find(id).await?;
        self.standing(actor, &event, &event.owners())
            .await?
            .require(Standing::Owner, "Not authorized to update this event")?;

        let previous = event.banner.replace(path.to_string());
        event.updated_by = actor.id;
        event.updated_at = Utc::now();
        self.repos.events.save_event(&event).await?;
        Ok(previous)
    }

    async fn find(&self, id: Uuid) -> DomainResult<Event> {
        self.repos
            .events
            .find_event(id)
            .await?
            .ok_or(DomainError::NotFound("Event"))
    }

    async fn standing(&self, actor: &Actor, event: &Event, owners: &[Uuid]) -> DomainResult<Standing> {
        let school = self.school(event.school_id).await?;
        Ok(actor.standing_on(&Subject::in_school(school.as_ref()).owned_by(owners)))
    }

    async fn school(&self, id: Option<Uuid>) -> DomainResult<Option<School>> {
        match id {
            Some(id) => Ok(self.repos.schools.find_school(id).await?),
            None => Ok(None),
        }
    }

    /// An event may only be tied to an existing school, and a school admin
    /// only to one they administer.
    async fn check_assignable(&self, actor: &Actor, school_id: Uuid, message: &str) -> DomainResult<()> {
        let school = self
            .repos
            .schools
            .find_school(school_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or(DomainError::NotFound("School"))?;
        if actor.role == domains::Role::SchoolAdmin && !school.is_admin(actor.id) {
            return Err(DomainError::forbidden(message));
        }
        Ok(())
    }
}
