#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Publishing domain types: news articles, generic content items, and
//! portal users.
//!
//! Stored article documents come in two historical snapshot shapes (an
//! excerpt-style one and a political-analysis one); the canonical
//! [`NewsArticle`] carries both field groups as optionals and the gateway
//! decode layer accepts either.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Lifecycle status shared by articles and content items.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArticleStatus {
    /// Not yet visible to readers.
    Draft,
    /// Live on the public feed.
    Published,
    /// Retired from the public feed but retained.
    Archived,
}

/// Kind of generic content item managed by the admin console.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentKind {
    /// News entry.
    News,
    /// Long-form article.
    Article,
    /// Site announcement.
    Announcement,
}

/// Role of a regular portal user.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    /// Regular account.
    User,
    /// Can moderate user content.
    Moderator,
    /// Full administrative access.
    Admin,
}

/// Role of an authenticated admin-console account.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdminRole {
    /// Standard admin-console access.
    Admin,
    /// Elevated access for allow-listed accounts.
    SuperAdmin,
}

/// A news article in the canonical schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    /// Document id, absent until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Author display name.
    pub author: String,
    /// Free-text category (defaults to "General" on decode).
    pub category: String,
    /// Lifecycle status.
    pub status: ArticleStatus,
    /// Tag list.
    pub tags: Vec<String>,
    /// Featured image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    /// When the article was created.
    pub created_at: NaiveDateTime,
    /// When the article was last modified.
    pub updated_at: NaiveDateTime,
    /// Set when the status first transitions to published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<NaiveDateTime>,
    /// Read counter.
    pub views: u64,
    /// Short teaser (excerpt-variant snapshot field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Editorial stance (political-analysis snapshot field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub political_perspective: Option<String>,
    /// Regional impact note (political-analysis snapshot field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional_impact: Option<String>,
}

impl NewsArticle {
    /// Applies a status change at time `now`.
    ///
    /// Transitioning to [`ArticleStatus::Published`] stamps
    /// `published_at` with `now`; every transition touches `updated_at`
    /// and nothing else.
    pub fn set_status(&mut self, status: ArticleStatus, now: NaiveDateTime) {
        if status == ArticleStatus::Published && self.status != ArticleStatus::Published {
            self.published_at = Some(now);
        }
        self.status = status;
        self.updated_at = now;
    }
}

/// Form input for creating or editing an article.
///
/// Absent fields on edit mean "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInput {
    /// Headline.
    #[serde(default)]
    pub title: Option<String>,
    /// Body text.
    #[serde(default)]
    pub content: Option<String>,
    /// Author display name.
    #[serde(default)]
    pub author: Option<String>,
    /// Free-text category.
    #[serde(default)]
    pub category: Option<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: Option<ArticleStatus>,
    /// Tag list.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Featured image URL.
    #[serde(default)]
    pub featured_image: Option<String>,
    /// Short teaser.
    #[serde(default)]
    pub summary: Option<String>,
    /// Editorial stance.
    #[serde(default)]
    pub political_perspective: Option<String>,
    /// Regional impact note.
    #[serde(default)]
    pub regional_impact: Option<String>,
}

impl ArticleInput {
    /// Builds a fresh article from this input at time `now`.
    ///
    /// Missing fields take the decode-layer defaults; a published status
    /// stamps `published_at` immediately.
    #[must_use]
    pub fn into_article(self, now: NaiveDateTime) -> NewsArticle {
        let status = self.status.unwrap_or(ArticleStatus::Draft);
        NewsArticle {
            id: None,
            title: self.title.unwrap_or_else(|| "Untitled".to_string()),
            content: self.content.unwrap_or_default(),
            author: self.author.unwrap_or_else(|| "Unknown".to_string()),
            category: self.category.unwrap_or_else(|| "General".to_string()),
            status,
            tags: self.tags.unwrap_or_default(),
            featured_image: self.featured_image,
            created_at: now,
            updated_at: now,
            published_at: (status == ArticleStatus::Published).then_some(now),
            views: 0,
            summary: self.summary,
            political_perspective: self.political_perspective,
            regional_impact: self.regional_impact,
        }
    }

    /// Applies this input onto an existing article at time `now`.
    ///
    /// Only present fields are written. A status change goes through
    /// [`NewsArticle::set_status`] so the publish timestamp rule holds.
    pub fn apply_to(self, article: &mut NewsArticle, now: NaiveDateTime) {
        if let Some(title) = self.title {
            article.title = title;
        }
        if let Some(content) = self.content {
            article.content = content;
        }
        if let Some(author) = self.author {
            article.author = author;
        }
        if let Some(category) = self.category {
            article.category = category;
        }
        if let Some(tags) = self.tags {
            article.tags = tags;
        }
        if let Some(image) = self.featured_image {
            article.featured_image = Some(image);
        }
        if let Some(summary) = self.summary {
            article.summary = Some(summary);
        }
        if let Some(p) = self.political_perspective {
            article.political_perspective = Some(p);
        }
        if let Some(r) = self.regional_impact {
            article.regional_impact = Some(r);
        }
        if let Some(status) = self.status {
            article.set_status(status, now);
        } else {
            article.updated_at = now;
        }
    }
}

/// A generic content item managed by the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Document id, absent until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display title.
    pub title: String,
    /// What kind of item this is.
    pub kind: ContentKind,
    /// Lifecycle status.
    pub status: ArticleStatus,
    /// Author display name.
    pub author: String,
    /// When the item was created.
    pub created_at: NaiveDateTime,
    /// When the item was last modified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
    /// Read counter.
    pub view_count: u64,
}

/// A portal user account as shown in the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalUser {
    /// Document id, absent until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Account email.
    pub email: String,
    /// Display username.
    pub username: String,
    /// Account role.
    pub role: UserRole,
    /// When the account was created.
    pub created_at: NaiveDateTime,
    /// Last seen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<NaiveDateTime>,
    /// Whether the account is enabled.
    pub is_active: bool,
}

/// An authenticated admin-console account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    /// Provider-assigned account id.
    pub id: String,
    /// Account email.
    pub email: String,
    /// Display name, derived from the email local part when unset.
    pub username: String,
    /// Derived role (see the auth crate's allow-list rules).
    pub role: AdminRole,
    /// When this session signed in.
    pub last_login: NaiveDateTime,
}

/// Dashboard counters for the admin console landing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    /// All registered users.
    pub total_users: u64,
    /// Users flagged active.
    pub active_users: u64,
    /// All content items.
    pub total_content: u64,
    /// Content items in published status.
    pub published_content: u64,
    /// Article views recorded today.
    pub today_views: u64,
    /// Article views recorded this month.
    pub monthly_views: u64,
}

/// Per-status article counts for the news dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleStats {
    /// All articles.
    pub total: u64,
    /// Published articles.
    pub published: u64,
    /// Draft articles.
    pub drafts: u64,
    /// Archived articles.
    pub archived: u64,
}
