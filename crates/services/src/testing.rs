use std::sync::Arc;

use chrono::{Duration, Utc};
use domains::{
    Actor, EventLocation, EventStatus, EventType, Forum, Gender, MockMediaStorage, NewEvent,
    NewForum, NewSchool, NewTopic, Region, RegistrationFee, Repos, Role, School, SchoolLocation,
    SchoolType, Tombstones, Topic, TopicRepo,
};
use storage_adapters::memory::MemoryStore;
use uuid::Uuid;

use crate::Services;

pub(crate) struct TestEnv {
    pub services: Services,
    pub store: Arc<MemoryStore>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_media(MockMediaStorage::new())
    }

    pub fn with_media(media: MockMediaStorage) -> Self {
        let store = Arc::new(MemoryStore::new());
        let services = Services::new(Repos::from_store(store.clone()), Arc::new(media));
        Self { services, store }
    }

    /// Creates a school and returns it with one of its admins.
    pub async fn school_with_admin(&self, name: &str) -> (School, Actor) {
        let head = Uuid::now_v7();
        let mut input = new_school(name);
        input.admin_users = Some(vec![head]);
        let school = self.services.schools.create(&platform_admin(), input).await.unwrap();
        let actor = Actor::new(head, Role::SchoolAdmin, Some(school.id));
        (school, actor)
    }

    /// A general forum moderated by a fresh platform admin.
    pub async fn general_forum(&self) -> Forum {
        self.services
            .forums
            .create(&platform_admin(), new_forum(None))
            .await
            .unwrap()
    }

    /// Reads a topic without counting a view.
    pub async fn topic(&self, id: Uuid) -> Topic {
        self.store
            .find_topic(id, Tombstones::Include)
            .await
            .unwrap()
            .unwrap()
    }
}

pub(crate) fn platform_admin() -> Actor {
    Actor::new(Uuid::now_v7(), Role::UsosaAdmin, None)
}

pub(crate) fn member() -> Actor {
    Actor::new(Uuid::now_v7(), Role::Alumni, None)
}

pub(crate) fn new_school(name: &str) -> NewSchool {
    NewSchool {
        name: name.into(),
        short_name: name.split_whitespace().map(|w| &w[..1]).collect(),
        school_type: SchoolType::Other,
        gender: Gender::Mixed,
        location: SchoolLocation {
            city: "Lagos".into(),
            state: "Lagos".into(),
            region: Region::SouthWest,
            country: "Nigeria".into(),
            coordinates: None,
        },
        founded_year: None,
        website: None,
        email: None,
        phone_number: None,
        address: None,
        description: None,
        admin_users: None,
    }
}

pub(crate) fn new_forum(school_id: Option<Uuid>) -> NewForum {
    NewForum {
        name: "General Discussion".into(),
        description: "Open to every member".into(),
        school_id,
        moderators: None,
    }
}

pub(crate) fn new_topic(forum_id: Uuid, title: &str) -> NewTopic {
    NewTopic {
        forum_id,
        title: title.into(),
        content: "opening message".into(),
        tags: vec![],
    }
}

pub(crate) fn published_event(capacity: Option<u32>, fee: f64) -> NewEvent {
    let start = Utc::now() + Duration::days(14);
    NewEvent {
        title: "Annual Reunion".into(),
        description: "Catch up with classmates".into(),
        event_type: EventType::Reunion,
        start_date: start,
        end_date: start + Duration::hours(6),
        location: EventLocation {
            venue: "Assembly Hall".into(),
            address: "1 College Road".into(),
            city: "Lagos".into(),
            state: "Lagos".into(),
            country: "Nigeria".into(),
            coordinates: None,
            is_virtual: false,
            virtual_link: None,
        },
        school_id: None,
        capacity,
        registration_required: None,
        registration_deadline: None,
        registration_fee: Some(RegistrationFee {
            amount: fee,
            currency: "NGN".into(),
        }),
        agenda: vec![],
        sponsors: vec![],
        status: Some(EventStatus::Published),
        visibility: None,
    }
}
