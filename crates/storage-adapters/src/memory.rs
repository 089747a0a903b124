use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::lifecycle::latest_non_deleted_post;
use domains::{
    forum_order, paginate, Event, EventQuery, EventRepo, Forum, ForumRepo, ForumScope, Page,
    PageRequest, Post, PostRepo, Region, School, SchoolRepo, Tombstones, Topic, TopicRepo,
    TopicSort,
};
use uuid::Uuid;

/// Process-local document store. Documents are cloned in and out, so
/// callers never hold references into the maps.
#[derive(Default)]
pub struct MemoryStore {
    schools: DashMap<Uuid, School>,
    /// Name -> id of the school holding it.
    school_names: DashMap<String, Uuid>,
    events: DashMap<Uuid, Event>,
    forums: DashMap<Uuid, Forum>,
    topics: DashMap<Uuid, Topic>,
    posts: DashMap<Uuid, Post>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn visible(is_deleted: bool, tombstones: Tombstones) -> bool {
    tombstones == Tombstones::Include || !is_deleted
}

#[async_trait]
impl SchoolRepo for MemoryStore {
    async fn list_schools(&self, region: Option<Region>) -> anyhow::Result<Vec<School>> {
        let mut schools: Vec<School> = self
            .schools
            .iter()
            .filter(|s| s.is_active && region.is_none_or(|r| s.location.region == r))
            .map(|s| s.value().clone())
            .collect();
        schools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(schools)
    }

    async fn find_school(&self, id: Uuid) -> anyhow::Result<Option<School>> {
        Ok(self.schools.get(&id).map(|s| s.value().clone()))
    }

    async fn find_school_by_name(&self, name: &str) -> anyhow::Result<Option<School>> {
        let Some(id) = self.school_names.get(name).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.schools.get(&id).map(|s| s.value().clone()))
    }

    async fn save_school(&self, school: &School) -> anyhow::Result<()> {
        match self.school_names.entry(school.name.clone()) {
            Entry::Occupied(holder) if *holder.get() != school.id => {
                return Err(School::name_taken().into());
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(school.id);
            }
        }
        if let Some(previous) = self.schools.insert(school.id, school.clone()) {
            if previous.name != school.name {
                self.school_names.remove_if(&previous.name, |_, id| *id == school.id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventRepo for MemoryStore {
    async fn list_events(&self, query: &EventQuery, page: PageRequest) -> anyhow::Result<Page<Event>> {
        let mut events: Vec<Event> = self
            .events
            .iter()
            .filter(|e| query.matches(e))
            .map(|e| e.value().clone())
            .collect();
        events.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(paginate(events, page))
    }

    async fn find_event(&self, id: Uuid) -> anyhow::Result<Option<Event>> {
        Ok(self.events.get(&id).map(|e| e.value().clone()))
    }

    async fn save_event(&self, event: &Event) -> anyhow::Result<()> {
        self.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn delete_event(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.events.remove(&id).is_some())
    }
}

#[async_trait]
impl ForumRepo for MemoryStore {
    async fn list_forums(&self, scope: ForumScope) -> anyhow::Result<Vec<Forum>> {
        let mut forums: Vec<Forum> = self
            .forums
            .iter()
            .filter(|f| scope.matches(f))
            .map(|f| f.value().clone())
            .collect();
        forums.sort_by(forum_order);
        Ok(forums)
    }

    async fn find_forum(&self, id: Uuid) -> anyhow::Result<Option<Forum>> {
        Ok(self.forums.get(&id).map(|f| f.value().clone()))
    }

    async fn save_forum(&self, forum: &Forum) -> anyhow::Result<()> {
        self.forums.insert(forum.id, forum.clone());
        Ok(())
    }
}

#[async_trait]
impl TopicRepo for MemoryStore {
    async fn list_topics(
        &self,
        forum_id: Uuid,
        sort: TopicSort,
        page: PageRequest,
    ) -> anyhow::Result<Page<Topic>> {
        let mut topics: Vec<Topic> = self
            .topics
            .iter()
            .filter(|t| t.forum_id == forum_id && !t.is_deleted)
            .map(|t| t.value().clone())
            .collect();
        topics.sort_by(|a, b| sort.compare(a, b));
        Ok(paginate(topics, page))
    }

    async fn find_topic(&self, id: Uuid, tombstones: Tombstones) -> anyhow::Result<Option<Topic>> {
        Ok(self
            .topics
            .get(&id)
            .filter(|t| visible(t.is_deleted, tombstones))
            .map(|t| t.value().clone()))
    }

    async fn save_topic(&self, topic: &Topic) -> anyhow::Result<()> {
        self.topics.insert(topic.id, topic.clone());
        Ok(())
    }

    async fn record_view(&self, id: Uuid) -> anyhow::Result<bool> {
        match self.topics.get_mut(&id) {
            Some(mut topic) if !topic.is_deleted => {
                topic.views += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl PostRepo for MemoryStore {
    async fn list_posts(&self, topic_id: Uuid, page: PageRequest) -> anyhow::Result<Page<Post>> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| p.topic_id == topic_id && !p.is_deleted)
            .map(|p| p.value().clone())
            .collect();
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(posts, page))
    }

    async fn find_post(&self, id: Uuid, tombstones: Tombstones) -> anyhow::Result<Option<Post>> {
        Ok(self
            .posts
            .get(&id)
            .filter(|p| visible(p.is_deleted, tombstones))
            .map(|p| p.value().clone()))
    }

    async fn latest_post(&self, topic_id: Uuid) -> anyhow::Result<Option<Post>> {
        let posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| p.topic_id == topic_id)
            .map(|p| p.value().clone())
            .collect();
        Ok(latest_non_deleted_post(&posts).cloned())
    }

    async fn save_post(&self, post: &Post) -> anyhow::Result<()> {
        self.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn tombstone_posts(&self, topic_id: Uuid) -> anyhow::Result<u64> {
        let mut changed = 0;
        for mut post in self.posts.iter_mut() {
            if post.topic_id == topic_id && !post.is_deleted {
                post.is_deleted = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}
