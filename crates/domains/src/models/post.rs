use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::school::required;
use crate::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub status: ReportStatus,
}

/// What a moderator decides about a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportAction {
    Dismiss,
    DeletePost,
}

impl std::str::FromStr for ReportAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dismiss" => Ok(ReportAction::Dismiss),
            "delete_post" => Ok(ReportAction::DeletePost),
            _ => Err(DomainError::validation(
                r#"Invalid action. Must be "dismiss" or "delete_post""#,
            )),
        }
    }
}

/// A reply within a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub likes: Vec<Uuid>,
    pub parent_post_id: Option<Uuid>,
    pub reports: Vec<Report>,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl Post {
    pub fn new(
        topic_id: Uuid,
        author: Uuid,
        content: &str,
        parent_post_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: Uuid::now_v7(),
            topic_id,
            user_id: author,
            content: required(content, "Content")?,
            likes: Vec::new(),
            parent_post_id,
            reports: Vec::new(),
            is_edited: false,
            edited_at: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        })
    }

    pub fn edit(&mut self, content: &str, now: DateTime<Utc>) -> DomainResult<()> {
        self.content = required(content, "Content")?;
        self.is_edited = true;
        self.edited_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Flips `user_id`'s like. Returns whether the post is now liked by them.
    pub fn toggle_like(&mut self, user_id: Uuid) -> bool {
        if let Some(pos) = self.likes.iter().position(|id| *id == user_id) {
            self.likes.remove(pos);
            false
        } else {
            self.likes.push(user_id);
            true
        }
    }

    /// One report per user per post, whatever its status.
    pub fn add_report(&mut self, user_id: Uuid, reason: &str, now: DateTime<Utc>) -> DomainResult<&Report> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("Reason is required for reporting a post"));
        }
        if self.reports.iter().any(|r| r.user_id == user_id) {
            return Err(DomainError::conflict("You have already reported this post"));
        }
        self.reports.push(Report {
            id: Uuid::now_v7(),
            user_id,
            reason: reason.to_string(),
            created_at: now,
            status: ReportStatus::Pending,
        });
        Ok(&self.reports[self.reports.len() - 1])
    }

    /// Closes a pending report. Both actions leave it `reviewed`.
    pub fn review_report(&mut self, report_id: Uuid) -> DomainResult<()> {
        let report = self
            .reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or(DomainError::NotFound("Report"))?;
        if report.status != ReportStatus::Pending {
            return Err(DomainError::conflict("Report has already been handled"));
        }
        report.status = ReportStatus::Reviewed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post::new(Uuid::now_v7(), Uuid::now_v7(), "hello", None, Utc::now()).unwrap()
    }

    #[test]
    fn double_like_restores_count() {
        let mut p = post();
        let u = Uuid::now_v7();
        let before = p.likes.len();
        assert!(p.toggle_like(u));
        assert!(!p.toggle_like(u));
        assert_eq!(p.likes.len(), before);
    }

    #[test]
    fn second_report_from_same_user_conflicts() {
        let mut p = post();
        let u = Uuid::now_v7();
        p.add_report(u, "spam", Utc::now()).unwrap();
        let err = p.add_report(u, "spam", Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::Conflict("You have already reported this post".into()));
        assert_eq!(p.reports.len(), 1);
    }

    #[test]
    fn blank_reason_is_rejected() {
        let mut p = post();
        assert!(matches!(
            p.add_report(Uuid::now_v7(), "  ", Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn report_is_reviewed_once() {
        let mut p = post();
        let id = p.add_report(Uuid::now_v7(), "spam", Utc::now()).unwrap().id;
        p.review_report(id).unwrap();
        assert_eq!(p.reports[0].status, ReportStatus::Reviewed);
        assert!(matches!(p.review_report(id), Err(DomainError::Conflict(_))));
        assert_eq!(p.review_report(Uuid::now_v7()), Err(DomainError::NotFound("Report")));
    }

    #[test]
    fn edit_marks_post() {
        let mut p = post();
        p.edit(" updated ", Utc::now()).unwrap();
        assert_eq!(p.content, "updated");
        assert!(p.is_edited && p.edited_at.is_some());
    }

    #[test]
    fn unknown_action_is_invalid() {
        assert_eq!("delete_post".parse::<ReportAction>().unwrap(), ReportAction::DeletePost);
        assert!(matches!("ban".parse::<ReportAction>(), Err(DomainError::Validation(_))));
    }
}
