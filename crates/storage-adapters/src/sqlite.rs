//! # SQLite document store
//!
//! Each aggregate lives in its own table as one JSON document per row. The
//! few columns queries filter on (`name`, `forum_id`, `topic_id`) are copied
//! out of the document on every write. Ordering and paging reuse the same
//! domain functions as [`crate::memory::MemoryStore`], so both backends list
//! identically.

use std::str::FromStr;

use async_trait::async_trait;
use domains::lifecycle::latest_non_deleted_post;
use domains::{
    forum_order, paginate, Event, EventQuery, EventRepo, Forum, ForumRepo, ForumScope, Page,
    PageRequest, Post, PostRepo, Region, School, SchoolRepo, Tombstones, Topic, TopicRepo,
    TopicSort,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schools (
        id   TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        doc  TEXT NOT NULL
    )",
    "DROP INDEX IF EXISTS schools_name",
    "CREATE UNIQUE INDEX IF NOT EXISTS schools_name_key ON schools (name)",
    "CREATE TABLE IF NOT EXISTS events (
        id  TEXT PRIMARY KEY,
        doc TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS forums (
        id  TEXT PRIMARY KEY,
        doc TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS topics (
        id       TEXT PRIMARY KEY,
        forum_id TEXT NOT NULL,
        doc      TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS topics_forum ON topics (forum_id)",
    "CREATE TABLE IF NOT EXISTS posts (
        id       TEXT PRIMARY KEY,
        topic_id TEXT NOT NULL,
        doc      TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS posts_topic ON posts (topic_id)",
];

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and applies the schema.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // Every connection to `:memory:` is a separate database.
        let max = if url.contains(":memory:") { 1 } else { 8 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(url, "sqlite store ready");
        Ok(store)
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn find_doc<T: DeserializeOwned>(&self, table: &str, id: Uuid) -> anyhow::Result<Option<T>> {
        let row = sqlx::query(&format!("SELECT doc FROM {table} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| decode(&r)).transpose()
    }

    async fn all_docs<T: DeserializeOwned>(&self, table: &str) -> anyhow::Result<Vec<T>> {
        let rows = sqlx::query(&format!("SELECT doc FROM {table}"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode).collect()
    }

    async fn docs_where<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> anyhow::Result<Vec<T>> {
        let rows = sqlx::query(&format!("SELECT doc FROM {table} WHERE {column} = ?"))
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode).collect()
    }

    async fn upsert_doc<T: Serialize>(&self, table: &str, id: Uuid, doc: &T) -> anyhow::Result<()> {
        sqlx::query(&format!(
            "INSERT INTO {table} (id, doc) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET doc = excluded.doc"
        ))
        .bind(id.to_string())
        .bind(serde_json::to_string(doc)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(row: &SqliteRow) -> anyhow::Result<T> {
    let doc: String = row.try_get("doc")?;
    Ok(serde_json::from_str(&doc)?)
}

fn visible(is_deleted: bool, tombstones: Tombstones) -> bool {
    tombstones == Tombstones::Include || !is_deleted
}

#[async_trait]
impl SchoolRepo for SqliteStore {
    async fn list_schools(&self, region: Option<Region>) -> anyhow::Result<Vec<School>> {
        let mut schools: Vec<School> = self
            .all_docs::<School>("schools")
            .await?
            .into_iter()
            .filter(|s| s.is_active && region.is_none_or(|r| s.location.region == r))
            .collect();
        schools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(schools)
    }

    async fn find_school(&self, id: Uuid) -> anyhow::Result<Option<School>> {
        self.find_doc("schools", id).await
    }

    async fn find_school_by_name(&self, name: &str) -> anyhow::Result<Option<School>> {
        Ok(self.docs_where("schools", "name", name).await?.into_iter().next())
    }

    async fn save_school(&self, school: &School) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO schools (id, name, doc) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, doc = excluded.doc",
        )
        .bind(school.id.to_string())
        .bind(&school.name)
        .bind(serde_json::to_string(school)?)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation()) {
                anyhow::Error::new(School::name_taken())
            } else {
                anyhow::Error::from(err)
            }
        })?;
        Ok(())
    }
}

#[async_trait]
impl EventRepo for SqliteStore {
    async fn list_events(&self, query: &EventQuery, page: PageRequest) -> anyhow::Result<Page<Event>> {
        let mut events: Vec<Event> = self
            .all_docs::<Event>("events")
            .await?
            .into_iter()
            .filter(|e| query.matches(e))
            .collect();
        events.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(paginate(events, page))
    }

    async fn find_event(&self, id: Uuid) -> anyhow::Result<Option<Event>> {
        self.find_doc("events", id).await
    }

    async fn save_event(&self, event: &Event) -> anyhow::Result<()> {
        self.upsert_doc("events", event.id, event).await
    }

    async fn delete_event(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ForumRepo for SqliteStore {
    async fn list_forums(&self, scope: ForumScope) -> anyhow::Result<Vec<Forum>> {
        let mut forums: Vec<Forum> = self
            .all_docs::<Forum>("forums")
            .await?
            .into_iter()
            .filter(|f| scope.matches(f))
            .collect();
        forums.sort_by(forum_order);
        Ok(forums)
    }

    async fn find_forum(&self, id: Uuid) -> anyhow::Result<Option<Forum>> {
        self.find_doc("forums", id).await
    }

    async fn save_forum(&self, forum: &Forum) -> anyhow::Result<()> {
        self.upsert_doc("forums", forum.id, forum).await
    }
}

#[async_trait]
impl TopicRepo for SqliteStore {
    async fn list_topics(
        &self,
        forum_id: Uuid,
        sort: TopicSort,
        page: PageRequest,
    ) -> anyhow::Result<Page<Topic>> {
        let mut topics: Vec<Topic> = self
            .docs_where::<Topic>("topics", "forum_id", &forum_id.to_string())
            .await?
            .into_iter()
            .filter(|t| !t.is_deleted)
            .collect();
        topics.sort_by(|a, b| sort.compare(a, b));
        Ok(paginate(topics, page))
    }

    async fn find_topic(&self, id: Uuid, tombstones: Tombstones) -> anyhow::Result<Option<Topic>> {
        let topic: Option<Topic> = self.find_doc("topics", id).await?;
        Ok(topic.filter(|t| visible(t.is_deleted, tombstones)))
    }

    async fn save_topic(&self, topic: &Topic) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO topics (id, forum_id, doc) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET forum_id = excluded.forum_id, doc = excluded.doc",
        )
        .bind(topic.id.to_string())
        .bind(topic.forum_id.to_string())
        .bind(serde_json::to_string(topic)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_view(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE topics SET doc = json_set(doc, '$.views', json_extract(doc, '$.views') + 1)
             WHERE id = ? AND json_extract(doc, '$.isDeleted') = 0",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PostRepo for SqliteStore {
    async fn list_posts(&self, topic_id: Uuid, page: PageRequest) -> anyhow::Result<Page<Post>> {
        let mut posts: Vec<Post> = self
            .docs_where::<Post>("posts", "topic_id", &topic_id.to_string())
            .await?
            .into_iter()
            .filter(|p| !p.is_deleted)
            .collect();
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(posts, page))
    }

    async fn find_post(&self, id: Uuid, tombstones: Tombstones) -> anyhow::Result<Option<Post>> {
        let post: Option<Post> = self.find_doc("posts", id).await?;
        Ok(post.filter(|p| visible(p.is_deleted, tombstones)))
    }

    async fn latest_post(&self, topic_id: Uuid) -> anyhow::Result<Option<Post>> {
        let posts: Vec<Post> = self
            .docs_where("posts", "topic_id", &topic_id.to_string())
            .await?;
        Ok(latest_non_deleted_post(&posts).cloned())
    }

    async fn save_post(&self, post: &Post) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, topic_id, doc) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET topic_id = excluded.topic_id, doc = excluded.doc",
        )
        .bind(post.id.to_string())
        .bind(post.topic_id.to_string())
        .bind(serde_json::to_string(post)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Rewrites every live post of the topic in one transaction.
    async fn tombstone_posts(&self, topic_id: Uuid) -> anyhow::Result<u64> {
        let posts: Vec<Post> = self
            .docs_where("posts", "topic_id", &topic_id.to_string())
            .await?;

        let mut tx = self.pool.begin().await?;
        let mut changed = 0;
        for mut post in posts.into_iter().filter(|p| !p.is_deleted) {
            post.is_deleted = true;
            sqlx::query("UPDATE posts SET doc = ? WHERE id = ?")
                .bind(serde_json::to_string(&post)?)
                .bind(post.id.to_string())
                .execute(&mut *tx)
                .await?;
            changed += 1;
        }
        tx.commit().await?;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use domains::{DomainError, Gender, NewForum, NewSchool, NewTopic, SchoolLocation, SchoolType};

    async fn store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    fn school(name: &str, region: Region) -> School {
        NewSchool {
            name: name.into(),
            short_name: name.into(),
            school_type: SchoolType::Other,
            gender: Gender::Mixed,
            location: SchoolLocation {
                city: "Kano".into(),
                state: "Kano".into(),
                region,
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
        .into_school(Uuid::now_v7(), Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn schools_round_trip_and_filter() {
        let store = store().await;
        let north = school("FGC Kano", Region::NorthWest);
        let south = school("FGC Ijanikin", Region::SouthWest);
        let mut closed = school("FGC Closed", Region::NorthWest);
        closed.is_active = false;
        for s in [&north, &south, &closed] {
            store.save_school(s).await.unwrap();
        }

        let names: Vec<_> = store
            .list_schools(None)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["FGC Ijanikin", "FGC Kano"]);

        let north_west = store.list_schools(Some(Region::NorthWest)).await.unwrap();
        assert_eq!(north_west.len(), 1);
        assert_eq!(store.find_school(closed.id).await.unwrap(), Some(closed));
        assert_eq!(
            store.find_school_by_name("FGC Kano").await.unwrap().map(|s| s.id),
            Some(north.id)
        );
    }

    #[tokio::test]
    async fn rename_updates_lookup_column() {
        let store = store().await;
        let mut s = school("Old Name", Region::SouthSouth);
        store.save_school(&s).await.unwrap();
        s.name = "New Name".into();
        store.save_school(&s).await.unwrap();

        assert!(store.find_school_by_name("Old Name").await.unwrap().is_none());
        assert!(store.find_school_by_name("New Name").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn school_names_are_unique() {
        let store = store().await;
        let first = school("FGC Kano", Region::NorthWest);
        let mut second = school("FGC Kano", Region::NorthWest);
        store.save_school(&first).await.unwrap();

        let err = store.save_school(&second).await.unwrap_err();
        assert_eq!(DomainError::from(err), School::name_taken());
        assert!(store.find_school(second.id).await.unwrap().is_none());

        second.name = "FGC Katsina".into();
        store.save_school(&second).await.unwrap();
        second.name = "FGC Kano".into();
        let err = store.save_school(&second).await.unwrap_err();
        assert_eq!(DomainError::from(err), School::name_taken());

        store.save_school(&first).await.unwrap();
    }

    #[tokio::test]
    async fn forums_general_first() {
        let store = store().await;
        let creator = Uuid::now_v7();
        let school_forum = NewForum {
            name: "Alpha".into(),
            description: "d".into(),
            school_id: Some(Uuid::now_v7()),
            moderators: None,
        }
        .into_forum(creator, Utc::now())
        .unwrap();
        let general = NewForum {
            name: "Zulu".into(),
            description: "d".into(),
            school_id: None,
            moderators: None,
        }
        .into_forum(creator, Utc::now())
        .unwrap();
        store.save_forum(&school_forum).await.unwrap();
        store.save_forum(&general).await.unwrap();

        let all = store.list_forums(ForumScope::All).await.unwrap();
        assert_eq!(all[0].id, general.id);
        assert_eq!(all[1].id, school_forum.id);
    }

    #[tokio::test]
    async fn record_view_bumps_only_live_topics() {
        let store = store().await;
        let mut topic = NewTopic {
            forum_id: Uuid::now_v7(),
            title: "Class of '98".into(),
            content: "Roll call".into(),
            tags: vec!["reunion".into()],
        }
        .into_topic(Uuid::now_v7(), Utc::now())
        .unwrap();
        store.save_topic(&topic).await.unwrap();

        assert!(store.record_view(topic.id).await.unwrap());
        assert!(store.record_view(topic.id).await.unwrap());
        let seen = store.find_topic(topic.id, Tombstones::Exclude).await.unwrap().unwrap();
        assert_eq!(seen.views, 2);
        assert_eq!(seen.tags, ["reunion"]);

        topic.is_deleted = true;
        store.save_topic(&topic).await.unwrap();
        assert!(!store.record_view(topic.id).await.unwrap());
        assert!(!store.record_view(Uuid::now_v7()).await.unwrap());
    }

    #[tokio::test]
    async fn topic_cascade_in_one_transaction() {
        let store = store().await;
        let topic = NewTopic {
            forum_id: Uuid::now_v7(),
            title: "Homecoming".into(),
            content: "Who's in?".into(),
            tags: vec![],
        }
        .into_topic(Uuid::now_v7(), Utc::now())
        .unwrap();
        store.save_topic(&topic).await.unwrap();

        let now = Utc::now();
        let first = Post::new(topic.id, Uuid::now_v7(), "me", None, now).unwrap();
        let second = Post::new(topic.id, Uuid::now_v7(), "me too", None, now + Duration::seconds(5)).unwrap();
        store.save_post(&first).await.unwrap();
        store.save_post(&second).await.unwrap();
        assert_eq!(store.latest_post(topic.id).await.unwrap().map(|p| p.id), Some(second.id));

        assert_eq!(store.tombstone_posts(topic.id).await.unwrap(), 2);
        assert_eq!(store.list_posts(topic.id, PageRequest::default()).await.unwrap().total, 0);
        assert!(store.find_post(first.id, Tombstones::Exclude).await.unwrap().is_none());
        assert!(store.find_post(first.id, Tombstones::Include).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_event_reports_absence() {
        let store = store().await;
        assert!(!store.delete_event(Uuid::now_v7()).await.unwrap());
    }
}
