//! View-count tracking.

use chrono::NaiveDateTime;
use civic_portal_gateway::{DocumentStore, GatewayError, collections, decode};

/// Increments an article's view counter and returns the new count.
///
/// View counts are the one place where concurrent writes are routine
/// (every reader bumps them), so a version conflict here gets a single
/// automatic re-read-and-retry before giving up. Everything else in the
/// system leaves conflicts to the caller.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] for an unknown article, or the
/// underlying gateway error — including a second
/// [`GatewayError::VersionConflict`] after the bounded retry.
pub async fn record_view(
    gateway: &dyn DocumentStore,
    article_id: &str,
    now: NaiveDateTime,
) -> Result<u64, GatewayError> {
    match try_record_view(gateway, article_id, now).await {
        Err(GatewayError::VersionConflict { .. }) => {
            log::debug!("view-count conflict on {article_id}; retrying once");
            try_record_view(gateway, article_id, now).await
        }
        other => other,
    }
}

async fn try_record_view(
    gateway: &dyn DocumentStore,
    article_id: &str,
    now: NaiveDateTime,
) -> Result<u64, GatewayError> {
    let doc = gateway
        .get(collections::NEWS_ARTICLES, article_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound {
            collection: collections::NEWS_ARTICLES.to_string(),
            id: article_id.to_string(),
        })?;

    let mut article = decode::decode_article(&doc, now)?;
    article.views += 1;
    let views = article.views;

    let mut value = serde_json::to_value(&article)?;
    if let Some(map) = value.as_object_mut() {
        map.remove("id");
    }
    gateway
        .update(collections::NEWS_ARTICLES, article_id, value, doc.version)
        .await?;
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use civic_portal_content_models::{ArticleInput, ArticleStatus};
    use civic_portal_gateway::MemoryStore;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    async fn seeded_article(store: &MemoryStore) -> String {
        let mut article = ArticleInput {
            title: Some("Budget vote".to_string()),
            status: Some(ArticleStatus::Published),
            ..ArticleInput::default()
        }
        .into_article(now());
        article.views = 7;
        let value = serde_json::to_value(&article).unwrap();
        store
            .insert(collections::NEWS_ARTICLES, value)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn bumps_and_persists_the_counter() {
        let store = MemoryStore::new();
        let id = seeded_article(&store).await;

        assert_eq!(record_view(&store, &id, now()).await.unwrap(), 8);
        assert_eq!(record_view(&store, &id, now()).await.unwrap(), 9);

        let doc = store
            .get(collections::NEWS_ARTICLES, &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.value["views"], 9);
    }

    #[tokio::test]
    async fn unknown_article_is_not_found() {
        let store = MemoryStore::new();
        let err = record_view(&store, "ghost", now()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }
}
