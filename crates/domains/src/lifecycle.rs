//! # Counter rules
//!
//! Forums and topics carry denormalized activity counters. The functions here
//! are the only code that moves them, so the stores and services never do
//! arithmetic on their own.
//!
//! Convention: a topic's opening message counts as one forum post. Creating
//! a topic adds one to `forum.posts`; deleting it removes `replies + 1`.

use chrono::{DateTime, Utc};

use crate::models::{Forum, Post, Topic};

/// The most recent live post, ties broken by id (ids are time-ordered).
pub fn latest_non_deleted_post<'a, I>(posts: I) -> Option<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts
        .into_iter()
        .filter(|p| !p.is_deleted)
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
}

impl Forum {
    pub fn record_topic(&mut self, now: DateTime<Utc>) {
        self.topics += 1;
        self.posts += 1;
        self.last_activity = now;
    }

    pub fn record_post(&mut self, now: DateTime<Utc>) {
        self.posts += 1;
        self.last_activity = now;
    }

    pub fn forget_post(&mut self) {
        self.posts = self.posts.saturating_sub(1);
    }

    /// Drops a topic together with its opening post and `replies` replies.
    pub fn forget_topic(&mut self, replies: u64) {
        self.topics = self.topics.saturating_sub(1);
        self.posts = self.posts.saturating_sub(replies + 1);
    }
}

impl Topic {
    pub fn record_post(&mut self, post: &Post) {
        self.replies += 1;
        self.point_last_post_at(Some(post));
    }

    /// Accounts for a removed reply. `latest` is the newest reply still
    /// live, resolved after the removal.
    pub fn forget_post(&mut self, removed: &Post, latest: Option<&Post>) {
        self.replies = self.replies.saturating_sub(1);
        if self.last_post_id == Some(removed.id) {
            self.point_last_post_at(latest);
        }
    }

    /// Moves the last-post pointer to `post`, or back to the topic's own
    /// creation when there is none.
    pub fn point_last_post_at(&mut self, post: Option<&Post>) {
        match post {
            Some(post) => {
                self.last_post_id = Some(post.id);
                self.last_post_at = post.created_at;
                self.last_post_user_id = post.user_id;
            }
            None => {
                self.last_post_id = None;
                self.last_post_at = self.created_at;
                self.last_post_user_id = self.user_id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewForum, NewTopic};
    use chrono::Duration;
    use uuid::Uuid;

    fn forum() -> Forum {
        NewForum {
            name: "F".into(),
            description: "d".into(),
            school_id: None,
            moderators: None,
        }
        .into_forum(Uuid::now_v7(), Utc::now())
        .unwrap()
    }

    fn topic(forum_id: Uuid, author: Uuid) -> Topic {
        NewTopic {
            forum_id,
            title: "T1".into(),
            content: "body".into(),
            tags: vec![],
        }
        .into_topic(author, Utc::now())
        .unwrap()
    }

    fn reply(topic: &Topic, author: Uuid, at: DateTime<Utc>) -> Post {
        Post::new(topic.id, author, "reply", None, at).unwrap()
    }

    #[test]
    fn latest_skips_tombstones() {
        let t = topic(Uuid::now_v7(), Uuid::now_v7());
        let now = Utc::now();
        let older = reply(&t, Uuid::now_v7(), now);
        let mut newer = reply(&t, Uuid::now_v7(), now + Duration::seconds(5));
        assert_eq!(latest_non_deleted_post([&older, &newer]).map(|p| p.id), Some(newer.id));

        newer.is_deleted = true;
        assert_eq!(latest_non_deleted_post([&older, &newer]).map(|p| p.id), Some(older.id));
        assert!(latest_non_deleted_post(std::iter::empty()).is_none());
    }

    #[test]
    fn latest_breaks_timestamp_ties_by_id() {
        let t = topic(Uuid::now_v7(), Uuid::now_v7());
        let at = Utc::now();
        let first = reply(&t, Uuid::now_v7(), at);
        let second = reply(&t, Uuid::now_v7(), at);
        assert_eq!(latest_non_deleted_post([&second, &first]).map(|p| p.id), Some(second.id));
    }

    #[test]
    fn reply_then_delete_rewinds_to_opening() {
        let u1 = Uuid::now_v7();
        let u2 = Uuid::now_v7();
        let mut f = forum();
        let mut t = topic(f.id, u1);
        f.record_topic(t.created_at);
        assert_eq!((f.topics, f.posts, t.replies), (1, 1, 0));

        let mut p = reply(&t, u2, Utc::now());
        t.record_post(&p);
        f.record_post(p.created_at);
        assert_eq!((t.replies, f.posts, t.last_post_user_id), (1, 2, u2));

        p.is_deleted = true;
        t.forget_post(&p, latest_non_deleted_post([&p]));
        f.forget_post();
        assert_eq!((t.replies, f.posts), (0, 1));
        assert_eq!(t.last_post_user_id, u1);
        assert_eq!(t.last_post_id, None);
        assert_eq!(t.last_post_at, t.created_at);
    }

    #[test]
    fn deleting_older_reply_keeps_pointer() {
        let mut t = topic(Uuid::now_v7(), Uuid::now_v7());
        let now = Utc::now();
        let mut a = reply(&t, Uuid::now_v7(), now);
        let b = reply(&t, Uuid::now_v7(), now + Duration::seconds(1));
        t.record_post(&a);
        t.record_post(&b);

        a.is_deleted = true;
        t.forget_post(&a, latest_non_deleted_post([&a, &b]));
        assert_eq!(t.last_post_id, Some(b.id));
        assert_eq!(t.replies, 1);
    }

    #[test]
    fn topic_removal_takes_opening_post_too() {
        let mut f = forum();
        f.record_topic(Utc::now());
        f.record_post(Utc::now());
        f.record_post(Utc::now());
        f.forget_topic(2);
        assert_eq!((f.topics, f.posts), (0, 0));
    }

    #[test]
    fn counters_never_underflow() {
        let mut f = forum();
        f.forget_topic(3);
        f.forget_post();
        assert_eq!((f.topics, f.posts), (0, 0));
    }
}
