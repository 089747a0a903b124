use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::school::{default_country, dedup_in_order, required, Coordinates};
use crate::authz::{Actor, Role};
use crate::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Reunion,
    Seminar,
    Workshop,
    Conference,
    Networking,
    Social,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Cancelled,
    Completed,
}

/// Who may see (and register for) an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    #[default]
    AlumniOnly,
    SchoolAlumniOnly,
    InviteOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeStatus {
    #[default]
    Registered,
    Confirmed,
    Attended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    NotApplicable,
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLocation {
    pub venue: String,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub virtual_link: Option<String>,
}

fn default_currency() -> String {
    "NGN".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationFee {
    #[serde(default)]
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for RegistrationFee {
    fn default() -> Self {
        Self {
            amount: 0.0,
            currency: default_currency(),
        }
    }
}

/// One roster entry. A user appears at most once per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub user_id: Uuid,
    pub registered_at: DateTime<Utc>,
    pub status: AttendeeStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaItem {
    pub time: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub speaker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sponsor {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: EventLocation,
    pub organizer: Uuid,
    /// `None` for association-wide events
    pub school_id: Option<Uuid>,
    pub is_school_specific: bool,
    pub banner: Option<String>,
    pub capacity: Option<u32>,
    pub registration_required: bool,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub registration_fee: RegistrationFee,
    pub attendees: Vec<Attendee>,
    pub agenda: Vec<AgendaItem>,
    pub sponsors: Vec<Sponsor>,
    pub status: EventStatus,
    pub visibility: Visibility,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Organizer and creator; both may manage the event.
    pub fn owners(&self) -> [Uuid; 2] {
        [self.organizer, self.created_by]
    }

    pub fn attendee(&self, user_id: Uuid) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.user_id == user_id)
    }

    /// Roster entries that still hold a seat.
    pub fn seats_taken(&self) -> usize {
        self.attendees
            .iter()
            .filter(|a| a.status != AttendeeStatus::Cancelled)
            .count()
    }

    /// Payment state a newly added attendee starts in.
    pub fn initial_payment_status(&self) -> PaymentStatus {
        if self.registration_fee.amount > 0.0 {
            PaymentStatus::Pending
        } else {
            PaymentStatus::NotApplicable
        }
    }

    /// Read access per visibility tier.
    pub fn check_viewable_by(&self, viewer: Option<&Actor>) -> DomainResult<()> {
        if self.visibility == Visibility::Public {
            return Ok(());
        }
        let Some(viewer) = viewer else {
            return Err(DomainError::forbidden("Not authorized to view this event"));
        };
        match self.visibility {
            Visibility::Public => Ok(()),
            Visibility::AlumniOnly if viewer.role == Role::Guest => {
                Err(DomainError::forbidden("This event is for alumni only"))
            }
            Visibility::AlumniOnly => Ok(()),
            Visibility::SchoolAlumniOnly
                if !self.is_school_member(viewer) && !viewer.role.is_staff() =>
            {
                Err(DomainError::forbidden(
                    "This event is for alumni of a specific school only",
                ))
            }
            Visibility::SchoolAlumniOnly => Ok(()),
            Visibility::InviteOnly
                if self.attendee(viewer.id).is_none()
                    && self.organizer != viewer.id
                    && !viewer.role.is_platform_admin() =>
            {
                Err(DomainError::forbidden("This event is by invitation only"))
            }
            Visibility::InviteOnly => Ok(()),
        }
    }

    fn is_school_member(&self, actor: &Actor) -> bool {
        actor.school_id.is_some() && actor.school_id == self.school_id
    }

    fn check_registrable_by(&self, actor: &Actor) -> DomainResult<()> {
        match self.visibility {
            Visibility::Public => Ok(()),
            Visibility::AlumniOnly if actor.role == Role::Guest => {
                Err(DomainError::forbidden("This event is for alumni only"))
            }
            Visibility::AlumniOnly => Ok(()),
            Visibility::SchoolAlumniOnly if !self.is_school_member(actor) => Err(
                DomainError::forbidden("This event is for alumni of a specific school only"),
            ),
            Visibility::SchoolAlumniOnly => Ok(()),
            Visibility::InviteOnly => {
                Err(DomainError::forbidden("This event is by invitation only"))
            }
        }
    }

    /// Self-registration. Returns the payment state of the new entry.
    ///
    /// A user whose only entry is cancelled is re-activated in place, so the
    /// roster never holds two entries for one user.
    pub fn register(&mut self, actor: &Actor, now: DateTime<Utc>) -> DomainResult<PaymentStatus> {
        if self.status != EventStatus::Published {
            return Err(DomainError::conflict("Cannot register for an unpublished event"));
        }
        if !self.registration_required {
            return Err(DomainError::conflict("Registration is not required for this event"));
        }
        if self.registration_deadline.is_some_and(|deadline| deadline < now) {
            return Err(DomainError::conflict("Registration deadline has passed"));
        }
        if self
            .capacity
            .is_some_and(|capacity| self.seats_taken() >= capacity as usize)
        {
            return Err(DomainError::conflict("Event has reached maximum capacity"));
        }
        let existing = self.attendee(actor.id).map(|a| a.status);
        if existing.is_some_and(|status| status != AttendeeStatus::Cancelled) {
            return Err(DomainError::conflict("You are already registered for this event"));
        }
        self.check_registrable_by(actor)?;

        let payment_status = self.initial_payment_status();
        match self.attendees.iter_mut().find(|a| a.user_id == actor.id) {
            Some(entry) => {
                entry.status = AttendeeStatus::Registered;
                entry.payment_status = payment_status;
                entry.registered_at = now;
            }
            None => self.attendees.push(Attendee {
                user_id: actor.id,
                registered_at: now,
                status: AttendeeStatus::Registered,
                payment_status,
                payment_reference: None,
            }),
        }
        Ok(payment_status)
    }

    /// Marks the user's entry cancelled; the entry stays on the roster.
    pub fn cancel_registration(&mut self, user_id: Uuid) -> DomainResult<()> {
        let entry = self
            .attendees
            .iter_mut()
            .find(|a| a.user_id == user_id)
            .ok_or(DomainError::NotFound("Registration"))?;
        entry.status = AttendeeStatus::Cancelled;
        Ok(())
    }

    /// Adds every user not already on the roster. Returns the ids added,
    /// in request order.
    pub fn invite(&mut self, user_ids: &[Uuid], now: DateTime<Utc>) -> Vec<Uuid> {
        let mut candidates = user_ids.to_vec();
        dedup_in_order(&mut candidates);
        let payment_status = self.initial_payment_status();

        let mut added = Vec::new();
        for user_id in candidates {
            if self.attendee(user_id).is_some() {
                continue;
            }
            self.attendees.push(Attendee {
                user_id,
                registered_at: now,
                status: AttendeeStatus::Registered,
                payment_status,
                payment_reference: None,
            });
            added.push(user_id);
        }
        added
    }

    pub fn update_attendee(&mut self, user_id: Uuid, patch: AttendeePatch) -> DomainResult<()> {
        let entry = self
            .attendees
            .iter_mut()
            .find(|a| a.user_id == user_id)
            .ok_or(DomainError::NotFound("Attendee"))?;
        if let Some(status) = patch.status {
            entry.status = status;
        }
        if let Some(payment_status) = patch.payment_status {
            entry.payment_status = payment_status;
        }
        if let Some(reference) = patch.payment_reference {
            entry.payment_reference = Some(reference);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeePatch {
    pub status: Option<AttendeeStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: EventLocation,
    pub school_id: Option<Uuid>,
    pub capacity: Option<u32>,
    pub registration_required: Option<bool>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub registration_fee: Option<RegistrationFee>,
    #[serde(default)]
    pub agenda: Vec<AgendaItem>,
    #[serde(default)]
    pub sponsors: Vec<Sponsor>,
    pub status: Option<EventStatus>,
    pub visibility: Option<Visibility>,
}

impl NewEvent {
    pub fn into_event(self, organizer: Uuid, now: DateTime<Utc>) -> DomainResult<Event> {
        let title = required(&self.title, "Title")?;
        let description = required(&self.description, "Description")?;
        check_schedule(self.start_date, self.end_date)?;

        Ok(Event {
            id: Uuid::now_v7(),
            title,
            description,
            event_type: self.event_type,
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location,
            organizer,
            school_id: self.school_id,
            is_school_specific: self.school_id.is_some(),
            banner: None,
            capacity: self.capacity,
            registration_required: self.registration_required.unwrap_or(true),
            registration_deadline: self.registration_deadline,
            registration_fee: self.registration_fee.unwrap_or_default(),
            attendees: Vec::new(),
            agenda: self.agenda,
            sponsors: self.sponsors,
            status: self.status.unwrap_or_default(),
            visibility: self.visibility.unwrap_or_default(),
            created_by: organizer,
            updated_by: organizer,
            created_at: now,
            updated_at: now,
        })
    }
}

fn check_schedule(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<()> {
    if end < start {
        return Err(DomainError::validation("End date cannot be before start date"));
    }
    Ok(())
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update. The roster, creator and creation time are not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<EventType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<EventLocation>,
    #[serde(default, deserialize_with = "nullable")]
    pub school_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub capacity: Option<Option<u32>>,
    pub registration_required: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub registration_deadline: Option<Option<DateTime<Utc>>>,
    pub registration_fee: Option<RegistrationFee>,
    pub agenda: Option<Vec<AgendaItem>>,
    pub sponsors: Option<Vec<Sponsor>>,
    pub status: Option<EventStatus>,
    pub visibility: Option<Visibility>,
}

impl EventPatch {
    pub fn apply(self, event: &mut Event, editor: Uuid, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(title) = self.title {
            event.title = required(&title, "Title")?;
        }
        if let Some(description) = self.description {
            event.description = required(&description, "Description")?;
        }
        if let Some(event_type) = self.event_type {
            event.event_type = event_type;
        }
        if let Some(start) = self.start_date {
            event.start_date = start;
        }
        if let Some(end) = self.end_date {
            event.end_date = end;
        }
        check_schedule(event.start_date, event.end_date)?;
        if let Some(location) = self.location {
            event.location = location;
        }
        if let Some(school_id) = self.school_id {
            event.school_id = school_id;
            event.is_school_specific = school_id.is_some();
        }
        if let Some(capacity) = self.capacity {
            event.capacity = capacity;
        }
        if let Some(registration_required) = self.registration_required {
            event.registration_required = registration_required;
        }
        if let Some(deadline) = self.registration_deadline {
            event.registration_deadline = deadline;
        }
        if let Some(fee) = self.registration_fee {
            event.registration_fee = fee;
        }
        if let Some(agenda) = self.agenda {
            event.agenda = agenda;
        }
        if let Some(sponsors) = self.sponsors {
            event.sponsors = sponsors;
        }
        if let Some(status) = self.status {
            event.status = status;
        }
        if let Some(visibility) = self.visibility {
            event.visibility = visibility;
        }
        event.updated_by = editor;
        event.updated_at = now;
        Ok(())
    }
}

/// The slice of events a viewer may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Anonymous visitors and guests.
    Public,
    /// Ordinary members; sees their own school's restricted events.
    Alumni { school_id: Option<Uuid> },
    /// Staff see every tier.
    Everyone,
}

impl Audience {
    pub fn of(viewer: Option<&Actor>) -> Self {
        match viewer {
            None => Audience::Public,
            Some(actor) => match actor.role {
                Role::Guest => Audience::Public,
                Role::User | Role::Alumni => Audience::Alumni {
                    school_id: actor.school_id,
                },
                Role::SchoolAdmin | Role::UsosaAdmin | Role::SuperAdmin => Audience::Everyone,
            },
        }
    }

    pub fn admits(&self, event: &Event) -> bool {
        match (self, event.visibility) {
            (Audience::Everyone, _) => true,
            (_, Visibility::Public) => true,
            (Audience::Public, _) => false,
            (Audience::Alumni { .. }, Visibility::AlumniOnly) => true,
            (Audience::Alumni { school_id }, Visibility::SchoolAlumniOnly) => {
                school_id.is_some() && *school_id == event.school_id
            }
            (Audience::Alumni { .. }, Visibility::InviteOnly) => false,
        }
    }
}

/// Listing filter applied by event stores.
#[derive(Debug, Clone)]
pub struct EventQuery {
    pub event_type: Option<EventType>,
    pub school_id: Option<Uuid>,
    pub status: EventStatus,
    /// Only events starting at or after this instant.
    pub starting_after: Option<DateTime<Utc>>,
    pub audience: Audience,
}

impl EventQuery {
    pub fn matches(&self, event: &Event) -> bool {
        event.status == self.status
            && self.event_type.is_none_or(|t| t == event.event_type)
            && self.school_id.is_none_or(|s| Some(s) == event.school_id)
            && self.starting_after.is_none_or(|after| event.start_date >= after)
            && self.audience.admits(event)
    }
}
