#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! List pipelines for the admin console and the politics feed.
//!
//! Every pipeline is pure, synchronous, and linear: a status/category
//! predicate, then a case-insensitive substring search over a few text
//! fields, then a fixed sort. The only stateful operation here is
//! [`record_view`], which bumps an article's view counter through the
//! gateway.

mod views;

pub use views::record_view;

use chrono::{Days, Months, NaiveDateTime};
use civic_portal_content_models::{
    AdminStats, ArticleStats, ArticleStatus, ContentItem, NewsArticle, PortalUser,
};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Filter inputs for the article list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilter {
    /// Keep only this status.
    pub status: Option<ArticleStatus>,
    /// Keep only this category (case-insensitive).
    pub category: Option<String>,
    /// Substring searched in title, content, and author.
    pub query: Option<String>,
}

/// Sliding time window for the politics feed: everything newer than
/// now minus one day, week, or month.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FeedWindow {
    /// The last 24 hours.
    Day,
    /// The last 7 days.
    Week,
    /// The last calendar month.
    Month,
}

impl FeedWindow {
    /// The cut-off instant for this window ending at `now`.
    #[must_use]
    pub fn threshold(self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            Self::Day => now - Days::new(1),
            Self::Week => now - Days::new(7),
            Self::Month => now - Months::new(1),
        }
    }
}

/// Filters, searches, and sorts articles for the admin list.
///
/// Sort key: creation date, newest first.
#[must_use]
pub fn filter_articles(articles: &[NewsArticle], filter: &ArticleFilter) -> Vec<NewsArticle> {
    let category = filter.category.as_deref().map(str::to_lowercase);
    let query = normalized_query(filter.query.as_deref());

    let mut out: Vec<NewsArticle> = articles
        .iter()
        .filter(|a| filter.status.is_none_or(|s| a.status == s))
        .filter(|a| {
            category
                .as_deref()
                .is_none_or(|c| a.category.to_lowercase() == c)
        })
        .filter(|a| {
            query.as_deref().is_none_or(|q| {
                contains_ci(&a.title, q) || contains_ci(&a.content, q) || contains_ci(&a.author, q)
            })
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

/// Builds the politics feed: published articles inside the sliding
/// window, optionally searched, ordered by view count then recency.
#[must_use]
pub fn politics_feed(
    articles: &[NewsArticle],
    window: FeedWindow,
    query: Option<&str>,
    now: NaiveDateTime,
) -> Vec<NewsArticle> {
    let threshold = window.threshold(now);
    let query = normalized_query(query);

    let mut out: Vec<NewsArticle> = articles
        .iter()
        .filter(|a| a.status == ArticleStatus::Published)
        .filter(|a| a.published_at.is_some_and(|at| at >= threshold))
        .filter(|a| {
            query.as_deref().is_none_or(|q| {
                contains_ci(&a.title, q)
                    || a.summary.as_deref().is_some_and(|s| contains_ci(s, q))
                    || contains_ci(&a.content, q)
            })
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        b.views
            .cmp(&a.views)
            .then_with(|| b.published_at.cmp(&a.published_at))
    });
    out
}

/// Filters and sorts content items for the admin list (title/author
/// search, creation date descending).
#[must_use]
pub fn filter_content(
    items: &[ContentItem],
    status: Option<ArticleStatus>,
    query: Option<&str>,
) -> Vec<ContentItem> {
    let query = normalized_query(query);

    let mut out: Vec<ContentItem> = items
        .iter()
        .filter(|i| status.is_none_or(|s| i.status == s))
        .filter(|i| {
            query
                .as_deref()
                .is_none_or(|q| contains_ci(&i.title, q) || contains_ci(&i.author, q))
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

/// Filters and sorts users for the admin list (email/username search,
/// newest account first).
#[must_use]
pub fn filter_users(users: &[PortalUser], query: Option<&str>) -> Vec<PortalUser> {
    let query = normalized_query(query);

    let mut out: Vec<PortalUser> = users
        .iter()
        .filter(|u| {
            query
                .as_deref()
                .is_none_or(|q| contains_ci(&u.email, q) || contains_ci(&u.username, q))
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

/// Per-status article counts.
#[must_use]
pub fn article_stats(articles: &[NewsArticle]) -> ArticleStats {
    let mut stats = ArticleStats {
        total: articles.len() as u64,
        ..ArticleStats::default()
    };
    for article in articles {
        match article.status {
            ArticleStatus::Published => stats.published += 1,
            ArticleStatus::Draft => stats.drafts += 1,
            ArticleStatus::Archived => stats.archived += 1,
        }
    }
    stats
}

/// How many articles were published within `now`'s calendar day.
#[must_use]
pub fn today_published_count(articles: &[NewsArticle], now: NaiveDateTime) -> u64 {
    let start = now.date().and_hms_opt(0, 0, 0).unwrap_or(now);
    let end = start + Days::new(1);
    articles
        .iter()
        .filter(|a| {
            a.published_at
                .is_some_and(|at| at >= start && at < end)
        })
        .count() as u64
}

/// Derives the admin dashboard counters by linear counting.
///
/// View windows are approximated from publish times: "today's views" are
/// the view counts of articles published today, "monthly" of those
/// published within the last calendar month.
#[must_use]
pub fn admin_stats(
    users: &[PortalUser],
    content: &[ContentItem],
    articles: &[NewsArticle],
    now: NaiveDateTime,
) -> AdminStats {
    let day_start = now.date().and_hms_opt(0, 0, 0).unwrap_or(now);
    let month_start = now - Months::new(1);

    let today_views = articles
        .iter()
        .filter(|a| a.published_at.is_some_and(|at| at >= day_start))
        .map(|a| a.views)
        .sum();
    let monthly_views = articles
        .iter()
        .filter(|a| a.published_at.is_some_and(|at| at >= month_start))
        .map(|a| a.views)
        .sum();

    AdminStats {
        total_users: users.len() as u64,
        active_users: users.iter().filter(|u| u.is_active).count() as u64,
        total_content: content.len() as u64,
        published_content: content
            .iter()
            .filter(|c| c.status == ArticleStatus::Published)
            .count() as u64,
        today_views,
        monthly_views,
    }
}

fn normalized_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

fn contains_ci(haystack: &str, lowercase_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use civic_portal_content_models::ArticleInput;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn article(title: &str, status: ArticleStatus, created: NaiveDateTime) -> NewsArticle {
        let mut article = ArticleInput {
            title: Some(title.to_string()),
            author: Some("Editor".to_string()),
            category: Some("Politics".to_string()),
            ..ArticleInput::default()
        }
        .into_article(created);
        article.set_status(status, created);
        article
    }

    fn published(title: &str, published: NaiveDateTime, views: u64) -> NewsArticle {
        let mut a = article(title, ArticleStatus::Published, published);
        a.views = views;
        a
    }

    #[test]
    fn article_filter_applies_status_then_search_then_sort() {
        let articles = vec![
            article("Old draft on trade", ArticleStatus::Draft, at(1, 9)),
            article("New draft on borders", ArticleStatus::Draft, at(10, 9)),
            article("Published on trade", ArticleStatus::Published, at(5, 9)),
        ];

        let drafts = filter_articles(
            &articles,
            &ArticleFilter {
                status: Some(ArticleStatus::Draft),
                ..ArticleFilter::default()
            },
        );
        let titles: Vec<&str> = drafts.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["New draft on borders", "Old draft on trade"]);

        let trade = filter_articles(
            &articles,
            &ArticleFilter {
                query: Some("TRADE".to_string()),
                ..ArticleFilter::default()
            },
        );
        assert_eq!(trade.len(), 2);
    }

    #[test]
    fn category_filter_is_case_insensitive() {
        let articles = vec![article("A", ArticleStatus::Draft, at(1, 9))];
        let hit = filter_articles(
            &articles,
            &ArticleFilter {
                category: Some("politics".to_string()),
                ..ArticleFilter::default()
            },
        );
        assert_eq!(hit.len(), 1);

        let miss = filter_articles(
            &articles,
            &ArticleFilter {
                category: Some("sports".to_string()),
                ..ArticleFilter::default()
            },
        );
        assert!(miss.is_empty());
    }

    #[test]
    fn feed_orders_by_views_then_recency() {
        let now = at(15, 12);
        let articles = vec![
            published("few views, recent", at(14, 9), 10),
            published("many views", at(12, 9), 500),
            published("same views, older", at(11, 9), 10),
            published("outside window", at(1, 9), 9_999),
        ];

        let feed = politics_feed(&articles, FeedWindow::Week, None, now);
        let titles: Vec<&str> = feed.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["many views", "few views, recent", "same views, older"]
        );
    }

    #[test]
    fn feed_excludes_drafts_and_searches_summaries() {
        let now = at(15, 12);
        let mut summarized = published("Council session", at(14, 9), 3);
        summarized.summary = Some("Budget approved by council".to_string());
        let articles = vec![
            summarized,
            article("Draft council notes", ArticleStatus::Draft, at(14, 10)),
        ];

        let feed = politics_feed(&articles, FeedWindow::Week, Some("budget"), now);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "Council session");
    }

    #[test]
    fn feed_windows_have_expected_thresholds() {
        let now = at(15, 12);
        assert_eq!(FeedWindow::Day.threshold(now), at(14, 12));
        assert_eq!(FeedWindow::Week.threshold(now), at(8, 12));
        assert_eq!(
            FeedWindow::Month.threshold(now),
            NaiveDate::from_ymd_opt(2025, 5, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn stats_count_by_status() {
        let articles = vec![
            article("a", ArticleStatus::Published, at(1, 1)),
            article("b", ArticleStatus::Draft, at(1, 2)),
            article("c", ArticleStatus::Draft, at(1, 3)),
            article("d", ArticleStatus::Archived, at(1, 4)),
        ];
        let stats = article_stats(&articles);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.published, 1);
        assert_eq!(stats.drafts, 2);
        assert_eq!(stats.archived, 1);
    }

    #[test]
    fn today_published_count_uses_the_calendar_day() {
        let now = at(15, 18);
        let articles = vec![
            published("today early", at(15, 0), 0),
            published("today late", at(15, 23), 0),
            published("yesterday", at(14, 23), 0),
        ];
        assert_eq!(today_published_count(&articles, now), 2);
    }

    #[test]
    fn user_search_matches_email_or_username() {
        let users = vec![
            PortalUser {
                id: Some("1".to_string()),
                email: "jane@example.com".to_string(),
                username: "janedoe".to_string(),
                role: civic_portal_content_models::UserRole::User,
                created_at: at(1, 1),
                last_active: None,
                is_active: true,
            },
            PortalUser {
                id: Some("2".to_string()),
                email: "bob@example.com".to_string(),
                username: "bob".to_string(),
                role: civic_portal_content_models::UserRole::Moderator,
                created_at: at(2, 1),
                last_active: None,
                is_active: false,
            },
        ];

        assert_eq!(filter_users(&users, Some("JANE")).len(), 1);
        assert_eq!(filter_users(&users, Some("example.com")).len(), 2);
        assert_eq!(filter_users(&users, None)[0].username, "bob");
    }
}
