//! Application services: one per resource. Each operation validates input,
//! resolves the caller's standing once and then reads and writes through the
//! ports. Multi-document updates run under a per-aggregate lock.

use std::sync::Arc;

use domains::{MediaStorage, Repos};

pub mod events;
pub mod forums;
pub mod locks;
pub mod media;
pub mod posts;
pub mod schools;
mod threads;
pub mod topics;

#[cfg(test)]
mod testing;

pub use events::{EventFilter, EventService, Registration};
pub use forums::ForumService;
pub use locks::AggregateLocks;
pub use media::Upload;
pub use posts::{LikeOutcome, PostService};
pub use schools::SchoolService;
pub use topics::TopicService;

/// Every service, wired to one set of ports.
#[derive(Clone)]
pub struct Services {
    pub schools: SchoolService,
    pub events: EventService,
    pub forums: ForumService,
    pub topics: TopicService,
    pub posts: PostService,
}

impl Services {
    pub fn new(repos: Repos, media: Arc<dyn MediaStorage>) -> Self {
        let locks = AggregateLocks::new();
        Self {
            schools: SchoolService::new(repos.clone(), media.clone(), locks.clone()),
            events: EventService::new(repos.clone(), media, locks.clone()),
            forums: ForumService::new(repos.clone(), locks.clone()),
            topics: TopicService::new(repos.clone(), locks.clone()),
            posts: PostService::new(repos, locks),
        }
    }
}
