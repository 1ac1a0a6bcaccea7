//! HTTP handler functions for the portal API.
//!
//! Error policy, applied uniformly: failed reads degrade to empty JSON
//! results with a log line so pages never hard-fail on load; failed
//! writes answer 500 with an error body for the client's transient
//! notification (manual retry); version conflicts answer 409.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::NaiveDateTime;
use civic_portal_content_models::{ArticleInput, ContentItem, NewsArticle, PortalUser};
use civic_portal_gateway::{Document, GatewayError, collections, decode};
use civic_portal_geo_models::{
    CrimeReport, Marker, PENDING_INVESTIGATION, ReportDraft, Reporter, Shape,
};
use civic_portal_map::{MapError, save_report as run_save_report};
use civic_portal_news::{ArticleFilter, FeedWindow, record_view};
use civic_portal_server_models::{
    ApiArticle, ApiHealth, ApiMarker, ApiSaveReceipt, ApiUpload, ApiViews, ApiVisibleMarkers,
    ArticleQuery, ArticleUpdate, ContentItemInput, ContentQuery, CreateAdminRequest,
    CrimeReportInput, LoginRequest, MarkerInput, MarkerUpdate, PoliticsQuery, ReportRequest,
    StatusUpdate, UploadQuery, UserInput, UsersQuery, WindowQuery,
};

use crate::{AppState, DEFAULT_REPORT_CATEGORY, FETCH_CAP};

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn error_body(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        maps_enabled: state.maps_enabled,
        persistence_enabled: state.persistence_enabled,
    })
}

// ── Auth ───────────────────────────────────────────────────────────

/// `POST /api/auth/login`
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> HttpResponse {
    match state.auth.sign_in(&body.email, &body.password).await {
        Ok(user) => {
            state.session.signed_in(user.clone());
            HttpResponse::Ok().json(user)
        }
        Err(e) => HttpResponse::Unauthorized().json(error_body(&e.to_string())),
    }
}

/// `POST /api/auth/logout`
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    state.auth.sign_out().await;
    state.session.signed_out();
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

/// `POST /api/auth/admins`
pub async fn create_admin(
    state: web::Data<AppState>,
    body: web::Json<CreateAdminRequest>,
) -> HttpResponse {
    match state
        .auth
        .create_user(&body.email, &body.password, body.display_name.as_deref())
        .await
    {
        Ok(user) => HttpResponse::Created().json(user),
        Err(e) => HttpResponse::BadRequest().json(error_body(&e.to_string())),
    }
}

// ── Markers ────────────────────────────────────────────────────────

/// `GET /api/markers`
///
/// Every persisted marker with its document version. Undecodable
/// documents are skipped with a warning.
pub async fn markers(state: web::Data<AppState>) -> HttpResponse {
    match state.gateway.list(collections::MARKERS, Some(FETCH_CAP)).await {
        Ok(docs) => {
            let markers: Vec<ApiMarker> = docs
                .iter()
                .filter_map(|doc| match decode::decode_marker(doc) {
                    Ok(marker) => Some(ApiMarker {
                        marker,
                        version: doc.version,
                    }),
                    Err(e) => {
                        log::warn!("skipping marker {}: {e}", doc.id);
                        None
                    }
                })
                .collect();
            HttpResponse::Ok().json(markers)
        }
        Err(e) => {
            log::error!("failed to list markers: {e}");
            HttpResponse::Ok().json(Vec::<ApiMarker>::new())
        }
    }
}

/// `GET /api/markers/visible`
///
/// Applies any window change from the query (mode, anchor, shift), then
/// returns the date-filtered markers and rebuilds the overlay layer.
pub async fn visible_markers(
    state: web::Data<AppState>,
    params: web::Query<WindowQuery>,
) -> HttpResponse {
    let mut store = state.markers.write().await;

    if let Some(mode) = params.mode {
        store.set_mode(mode);
    }
    if let Some(anchor) = params.anchor {
        store.set_anchor(anchor);
    }
    if let Some(shift) = params.shift {
        for _ in 0..shift.unsigned_abs() {
            if shift > 0 {
                store.go_next();
            } else {
                store.go_previous();
            }
        }
    }

    let range = store.range();
    let response = ApiVisibleMarkers {
        start: range.start,
        end: range.end,
        label: range.label(store.mode()),
        markers: store.visible().to_vec(),
    };

    let mut overlays = state.overlays.write().await;
    overlays.rebuild(store.visible(), store.generation(), &state.icons);

    HttpResponse::Ok().json(response)
}

/// `POST /api/markers`
///
/// Optimistic save: the marker lands in local state immediately; the
/// remote write backfills the id or leaves a warning.
pub async fn create_marker(
    state: web::Data<AppState>,
    body: web::Json<MarkerInput>,
) -> HttpResponse {
    let input = body.into_inner();
    let marker = Marker {
        id: None,
        title: input.title,
        category: input.category.unwrap_or_else(|| "other".to_string()),
        position: input.position,
        image_url: input.image_url,
        created_at: Some(now()),
    };

    let mut store = state.markers.write().await;
    let index = store.insert(marker.clone());
    let mut receipt = ApiSaveReceipt {
        marker_id: None,
        crime_report_id: None,
        shape_saved: false,
        saved: true,
        warnings: Vec::new(),
    };

    match serde_json::to_value(&marker) {
        Ok(value) => match state.gateway.insert(collections::MARKERS, value).await {
            Ok(doc) => {
                store.backfill_id(index, &doc.id);
                receipt.marker_id = Some(doc.id);
            }
            Err(e) => {
                log::error!("failed to persist marker: {e}");
                receipt
                    .warnings
                    .push("Marker saved locally; persisting it failed".to_string());
            }
        },
        Err(e) => log::error!("marker serialization failed: {e}"),
    }

    let mut overlays = state.overlays.write().await;
    overlays.rebuild(store.visible(), store.generation(), &state.icons);

    HttpResponse::Ok().json(receipt)
}

/// `PUT /api/markers/{id}`
///
/// Versioned edit: 409 when someone else edited the marker since the
/// client read it.
pub async fn update_marker(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<MarkerUpdate>,
) -> HttpResponse {
    let id = path.into_inner();
    let update = body.into_inner();

    let mut store = state.markers.write().await;
    let created_at = store
        .all()
        .iter()
        .find(|m| m.id.as_deref() == Some(id.as_str()))
        .and_then(|m| m.created_at);

    let marker = Marker {
        id: Some(id.clone()),
        title: update.input.title,
        category: update.input.category.unwrap_or_else(|| "other".to_string()),
        position: update.input.position,
        image_url: update.input.image_url,
        created_at,
    };

    match civic_portal_map::apply_marker_edit(
        &mut store,
        state.gateway.as_ref(),
        &id,
        marker,
        update.expected_version,
    )
    .await
    {
        Ok(()) => {
            let mut overlays = state.overlays.write().await;
            overlays.rebuild(store.visible(), store.generation(), &state.icons);
            HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
        }
        Err(MapError::UnknownMarker { .. }) => {
            HttpResponse::NotFound().json(error_body("Unknown marker"))
        }
        Err(MapError::Gateway(GatewayError::VersionConflict { .. })) => {
            HttpResponse::Conflict().json(error_body("Marker was modified; reload and retry"))
        }
        Err(MapError::Gateway(GatewayError::NotFound { .. })) => {
            HttpResponse::NotFound().json(error_body("Marker no longer exists"))
        }
        Err(e) => {
            log::error!("failed to update marker {id}: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to update marker"))
        }
    }
}

/// `DELETE /api/markers/{id}`
///
/// Local removal is immediate; the remote delete is best-effort and a
/// failure only produces a warning.
pub async fn delete_marker(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    let mut store = state.markers.write().await;
    let (removed, warning) =
        civic_portal_map::delete_marker(&mut store, state.gateway.as_ref(), &id).await;

    let mut overlays = state.overlays.write().await;
    overlays.rebuild(store.visible(), store.generation(), &state.icons);

    HttpResponse::Ok().json(serde_json::json!({ "removed": removed, "warning": warning }))
}

/// `GET /api/icons/{id}.svg`
///
/// The circular-image overlay icon for a marker. 404 for markers without
/// an image (they keep the SDK's default glyph).
pub async fn marker_icon(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    let store = state.markers.read().await;

    let Some(marker) = store
        .all()
        .iter()
        .find(|m| m.id.as_deref() == Some(id.as_str()))
    else {
        return HttpResponse::NotFound().json(error_body("Unknown marker"));
    };
    let Some(image_url) = marker.image_url.as_deref() else {
        return HttpResponse::NotFound().json(error_body("Marker has no image"));
    };

    let icon = state.icons.icon(image_url, &marker.category);
    HttpResponse::Ok()
        .content_type("image/svg+xml")
        .body(icon.as_str().to_string())
}

// ── Crime reports & shapes ─────────────────────────────────────────

/// `GET /api/crime-reports`
pub async fn crime_reports(state: web::Data<AppState>) -> HttpResponse {
    let ts = now();
    match state
        .gateway
        .list(collections::CRIME_REPORTS, Some(FETCH_CAP))
        .await
    {
        Ok(docs) => {
            let reports: Vec<CrimeReport> = docs
                .iter()
                .filter_map(|doc| match decode::decode_crime_report(doc, ts) {
                    Ok(report) => Some(report),
                    Err(e) => {
                        log::warn!("skipping crime report {}: {e}", doc.id);
                        None
                    }
                })
                .collect();
            HttpResponse::Ok().json(reports)
        }
        Err(e) => {
            log::error!("failed to list crime reports: {e}");
            HttpResponse::Ok().json(Vec::<CrimeReport>::new())
        }
    }
}

/// `POST /api/crime-reports`
pub async fn create_crime_report(
    state: web::Data<AppState>,
    body: web::Json<CrimeReportInput>,
) -> HttpResponse {
    let input = body.into_inner();
    let report = CrimeReport {
        id: None,
        title: input.title,
        description: input.description,
        crime_type: input
            .crime_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        timestamp: now().and_utc().timestamp_millis(),
        location: input.location,
        address: input.address,
        reported_by: input.reported_by.unwrap_or_else(Reporter::anonymous),
        status: PENDING_INVESTIGATION.to_string(),
        attachments: input.attachments,
    };

    match serde_json::to_value(&report) {
        Ok(value) => match state.gateway.insert(collections::CRIME_REPORTS, value).await {
            Ok(doc) => HttpResponse::Created().json(serde_json::json!({ "id": doc.id })),
            Err(e) => {
                log::error!("failed to save crime report: {e}");
                HttpResponse::InternalServerError()
                    .json(error_body("Failed to save crime report"))
            }
        },
        Err(e) => {
            log::error!("crime report serialization failed: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to save crime report"))
        }
    }
}

/// `GET /api/shapes`
///
/// Shapes are create-and-list only; there is no update or delete.
pub async fn shapes(state: web::Data<AppState>) -> HttpResponse {
    match state.gateway.list(collections::SHAPES, Some(FETCH_CAP)).await {
        Ok(docs) => {
            let shapes: Vec<Shape> = docs
                .iter()
                .filter_map(|doc| match decode::decode_shape(doc) {
                    Ok(shape) => Some(shape),
                    Err(e) => {
                        log::warn!("skipping shape {}: {e}", doc.id);
                        None
                    }
                })
                .collect();
            HttpResponse::Ok().json(shapes)
        }
        Err(e) => {
            log::error!("failed to list shapes: {e}");
            HttpResponse::Ok().json(Vec::<Shape>::new())
        }
    }
}

/// `POST /api/shapes`
pub async fn create_shape(state: web::Data<AppState>, body: web::Json<Shape>) -> HttpResponse {
    match serde_json::to_value(&body.into_inner()) {
        Ok(value) => match state.gateway.insert(collections::SHAPES, value).await {
            Ok(doc) => HttpResponse::Created().json(serde_json::json!({ "id": doc.id })),
            Err(e) => {
                log::error!("failed to save shape: {e}");
                HttpResponse::InternalServerError().json(error_body("Failed to save shape"))
            }
        },
        Err(e) => {
            log::error!("shape serialization failed: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to save shape"))
        }
    }
}

/// `POST /api/reports`
///
/// The full save-report flow: draft in, marker / crime report / shape
/// out, with warnings for remote writes that failed.
pub async fn save_report(
    state: web::Data<AppState>,
    body: web::Json<ReportRequest>,
) -> HttpResponse {
    let draft: ReportDraft = body.into_inner().into();
    let mut store = state.markers.write().await;

    let receipt = run_save_report(
        &draft,
        DEFAULT_REPORT_CATEGORY,
        &mut store,
        state.gateway.as_ref(),
        now(),
    )
    .await;

    let mut overlays = state.overlays.write().await;
    overlays.rebuild(store.visible(), store.generation(), &state.icons);

    HttpResponse::Ok().json(ApiSaveReceipt::from(receipt))
}

// ── Articles & feed ────────────────────────────────────────────────

async fn load_articles(state: &AppState) -> Vec<(NewsArticle, u64)> {
    let ts = now();
    match state
        .gateway
        .list(collections::NEWS_ARTICLES, Some(FETCH_CAP))
        .await
    {
        Ok(docs) => docs
            .iter()
            .filter_map(|doc| match decode::decode_article(doc, ts) {
                Ok(article) => Some((article, doc.version)),
                Err(e) => {
                    log::warn!("skipping article {}: {e}", doc.id);
                    None
                }
            })
            .collect(),
        Err(e) => {
            log::error!("failed to list articles: {e}");
            Vec::new()
        }
    }
}

/// `GET /api/articles`
pub async fn articles(state: web::Data<AppState>, params: web::Query<ArticleQuery>) -> HttpResponse {
    let loaded = load_articles(&state).await;
    let versions: std::collections::HashMap<String, u64> = loaded
        .iter()
        .filter_map(|(a, v)| a.id.clone().map(|id| (id, *v)))
        .collect();
    let all: Vec<NewsArticle> = loaded.into_iter().map(|(a, _)| a).collect();

    let filter = ArticleFilter {
        status: params.status,
        category: params.category.clone(),
        query: params.q.clone(),
    };
    let filtered: Vec<ApiArticle> = civic_portal_news::filter_articles(&all, &filter)
        .into_iter()
        .map(|article| {
            let version = article
                .id
                .as_deref()
                .and_then(|id| versions.get(id).copied())
                .unwrap_or(1);
            ApiArticle { article, version }
        })
        .collect();
    HttpResponse::Ok().json(filtered)
}

/// `GET /api/articles/{id}`
pub async fn article(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match state.gateway.get(collections::NEWS_ARTICLES, &id).await {
        Ok(Some(doc)) => match decode::decode_article(&doc, now()) {
            Ok(article) => HttpResponse::Ok().json(ApiArticle {
                article,
                version: doc.version,
            }),
            Err(e) => {
                log::error!("article {id} failed to decode: {e}");
                HttpResponse::InternalServerError().json(error_body("Article is unreadable"))
            }
        },
        Ok(None) => HttpResponse::NotFound().json(error_body("Unknown article")),
        Err(e) => {
            log::error!("failed to fetch article {id}: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to fetch article"))
        }
    }
}

/// `POST /api/articles`
pub async fn create_article(
    state: web::Data<AppState>,
    body: web::Json<ArticleInput>,
) -> HttpResponse {
    let mut article = body.into_inner().into_article(now());

    match strip_id(&article) {
        Ok(value) => match state.gateway.insert(collections::NEWS_ARTICLES, value).await {
            Ok(doc) => {
                article.id = Some(doc.id);
                HttpResponse::Created().json(ApiArticle {
                    article,
                    version: doc.version,
                })
            }
            Err(e) => {
                log::error!("failed to create article: {e}");
                HttpResponse::InternalServerError().json(error_body("Failed to create article"))
            }
        },
        Err(e) => {
            log::error!("article serialization failed: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to create article"))
        }
    }
}

/// `PUT /api/articles/{id}`
///
/// Partial edit with the publish-timestamp rule applied; 409 when the
/// article moved past the version the client read.
pub async fn update_article(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ArticleUpdate>,
) -> HttpResponse {
    let id = path.into_inner();
    let update = body.into_inner();
    let ts = now();

    let doc: Document = match state.gateway.get(collections::NEWS_ARTICLES, &id).await {
        Ok(Some(doc)) => doc,
        Ok(None) => return HttpResponse::NotFound().json(error_body("Unknown article")),
        Err(e) => {
            log::error!("failed to fetch article {id}: {e}");
            return HttpResponse::InternalServerError()
                .json(error_body("Failed to fetch article"));
        }
    };

    let mut article = match decode::decode_article(&doc, ts) {
        Ok(article) => article,
        Err(e) => {
            log::error!("article {id} failed to decode: {e}");
            return HttpResponse::InternalServerError().json(error_body("Article is unreadable"));
        }
    };
    update.input.apply_to(&mut article, ts);

    let value = match strip_id(&article) {
        Ok(value) => value,
        Err(e) => {
            log::error!("article serialization failed: {e}");
            return HttpResponse::InternalServerError()
                .json(error_body("Failed to update article"));
        }
    };

    match state
        .gateway
        .update(collections::NEWS_ARTICLES, &id, value, update.expected_version)
        .await
    {
        Ok(updated) => HttpResponse::Ok().json(ApiArticle {
            article,
            version: updated.version,
        }),
        Err(GatewayError::VersionConflict { .. }) => {
            HttpResponse::Conflict().json(error_body("Article was modified; reload and retry"))
        }
        Err(GatewayError::NotFound { .. }) => {
            HttpResponse::NotFound().json(error_body("Unknown article"))
        }
        Err(e) => {
            log::error!("failed to update article {id}: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to update article"))
        }
    }
}

/// `DELETE /api/articles/{id}`
pub async fn delete_article(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match state.gateway.delete(collections::NEWS_ARTICLES, &id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "ok": true })),
        Err(e) => {
            log::error!("failed to delete article {id}: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to delete article"))
        }
    }
}

/// `POST /api/articles/{id}/views`
pub async fn record_article_view(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    match record_view(state.gateway.as_ref(), &id, now()).await {
        Ok(views) => HttpResponse::Ok().json(ApiViews { views }),
        Err(GatewayError::NotFound { .. }) => {
            HttpResponse::NotFound().json(error_body("Unknown article"))
        }
        Err(e) => {
            log::error!("failed to record view for {id}: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to record view"))
        }
    }
}

/// `GET /api/articles/stats`
pub async fn article_stats(state: web::Data<AppState>) -> HttpResponse {
    let articles: Vec<NewsArticle> = load_articles(&state)
        .await
        .into_iter()
        .map(|(a, _)| a)
        .collect();
    HttpResponse::Ok().json(civic_portal_news::article_stats(&articles))
}

/// `GET /api/politics`
///
/// The public feed: published articles in the sliding window, most-viewed
/// first.
pub async fn politics(state: web::Data<AppState>, params: web::Query<PoliticsQuery>) -> HttpResponse {
    let articles: Vec<NewsArticle> = load_articles(&state)
        .await
        .into_iter()
        .map(|(a, _)| a)
        .collect();
    let feed = civic_portal_news::politics_feed(
        &articles,
        params.window.unwrap_or(FeedWindow::Week),
        params.q.as_deref(),
        now(),
    );
    HttpResponse::Ok().json(feed)
}

// ── Admin lists ────────────────────────────────────────────────────

/// `GET /api/content`
pub async fn content(state: web::Data<AppState>, params: web::Query<ContentQuery>) -> HttpResponse {
    let items = load_content(&state).await;
    HttpResponse::Ok().json(civic_portal_news::filter_content(
        &items,
        params.status,
        params.q.as_deref(),
    ))
}

/// `GET /api/users`
pub async fn users(state: web::Data<AppState>, params: web::Query<UsersQuery>) -> HttpResponse {
    let users = load_users(&state).await;
    HttpResponse::Ok().json(civic_portal_news::filter_users(&users, params.q.as_deref()))
}

/// `GET /api/admin/stats`
pub async fn admin_stats(state: web::Data<AppState>) -> HttpResponse {
    let ts = now();
    let users = load_users(&state).await;
    let items = load_content(&state).await;
    let articles: Vec<NewsArticle> = load_articles(&state)
        .await
        .into_iter()
        .map(|(a, _)| a)
        .collect();
    HttpResponse::Ok().json(civic_portal_news::admin_stats(&users, &items, &articles, ts))
}

/// `POST /api/users`
///
/// Create-or-replace: a body with an id updates the stored user (guarded
/// by the stored version it just read), otherwise a new account record
/// is inserted.
pub async fn save_user(state: web::Data<AppState>, body: web::Json<UserInput>) -> HttpResponse {
    let input = body.into_inner();
    let ts = now();

    if let Some(id) = input.id.clone() {
        let doc: Document = match state.gateway.get(collections::USERS, &id).await {
            Ok(Some(doc)) => doc,
            Ok(None) => return HttpResponse::NotFound().json(error_body("Unknown user")),
            Err(e) => {
                log::error!("failed to fetch user {id}: {e}");
                return HttpResponse::InternalServerError()
                    .json(error_body("Failed to fetch user"));
            }
        };
        let mut user = match decode::decode_user(&doc, ts) {
            Ok(user) => user,
            Err(e) => {
                log::error!("user {id} failed to decode: {e}");
                return HttpResponse::InternalServerError().json(error_body("User is unreadable"));
            }
        };
        user.email = input.email;
        user.username = input.username;
        if let Some(role) = input.role {
            user.role = role;
        }
        if let Some(is_active) = input.is_active {
            user.is_active = is_active;
        }
        return persist_user_update(&state, &id, &user, doc.version).await;
    }

    let user = PortalUser {
        id: None,
        email: input.email,
        username: input.username,
        role: input.role.unwrap_or(civic_portal_content_models::UserRole::User),
        created_at: ts,
        last_active: None,
        is_active: input.is_active.unwrap_or(true),
    };
    match strip_id(&user) {
        Ok(value) => match state.gateway.insert(collections::USERS, value).await {
            Ok(doc) => {
                let mut user = user;
                user.id = Some(doc.id);
                HttpResponse::Created().json(user)
            }
            Err(e) => {
                log::error!("failed to create user: {e}");
                HttpResponse::InternalServerError().json(error_body("Failed to save user"))
            }
        },
        Err(e) => {
            log::error!("user serialization failed: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to save user"))
        }
    }
}

/// `POST /api/users/{id}/toggle-active`
pub async fn toggle_user_active(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    let ts = now();

    let doc: Document = match state.gateway.get(collections::USERS, &id).await {
        Ok(Some(doc)) => doc,
        Ok(None) => return HttpResponse::NotFound().json(error_body("Unknown user")),
        Err(e) => {
            log::error!("failed to fetch user {id}: {e}");
            return HttpResponse::InternalServerError().json(error_body("Failed to fetch user"));
        }
    };
    let mut user = match decode::decode_user(&doc, ts) {
        Ok(user) => user,
        Err(e) => {
            log::error!("user {id} failed to decode: {e}");
            return HttpResponse::InternalServerError().json(error_body("User is unreadable"));
        }
    };
    user.is_active = !user.is_active;
    persist_user_update(&state, &id, &user, doc.version).await
}

async fn persist_user_update(
    state: &AppState,
    id: &str,
    user: &PortalUser,
    expected_version: u64,
) -> HttpResponse {
    let value = match strip_id(user) {
        Ok(value) => value,
        Err(e) => {
            log::error!("user serialization failed: {e}");
            return HttpResponse::InternalServerError().json(error_body("Failed to save user"));
        }
    };
    match state
        .gateway
        .update(collections::USERS, id, value, expected_version)
        .await
    {
        Ok(_) => HttpResponse::Ok().json(user),
        Err(GatewayError::VersionConflict { .. }) => {
            HttpResponse::Conflict().json(error_body("User was modified; reload and retry"))
        }
        Err(GatewayError::NotFound { .. }) => {
            HttpResponse::NotFound().json(error_body("Unknown user"))
        }
        Err(e) => {
            log::error!("failed to update user {id}: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to save user"))
        }
    }
}

/// `DELETE /api/users/{id}`
pub async fn delete_user(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match state.gateway.delete(collections::USERS, &id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "ok": true })),
        Err(e) => {
            log::error!("failed to delete user {id}: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to delete user"))
        }
    }
}

/// `POST /api/content`
///
/// Create-or-replace for content items; updates touch `updatedAt`.
pub async fn save_content(
    state: web::Data<AppState>,
    body: web::Json<ContentItemInput>,
) -> HttpResponse {
    let input = body.into_inner();
    let ts = now();

    if let Some(id) = input.id.clone() {
        let doc: Document = match state.gateway.get(collections::CONTENT, &id).await {
            Ok(Some(doc)) => doc,
            Ok(None) => return HttpResponse::NotFound().json(error_body("Unknown content item")),
            Err(e) => {
                log::error!("failed to fetch content item {id}: {e}");
                return HttpResponse::InternalServerError()
                    .json(error_body("Failed to fetch content item"));
            }
        };
        let mut item = match decode::decode_content_item(&doc, ts) {
            Ok(item) => item,
            Err(e) => {
                log::error!("content item {id} failed to decode: {e}");
                return HttpResponse::InternalServerError()
                    .json(error_body("Content item is unreadable"));
            }
        };
        item.title = input.title;
        if let Some(kind) = input.kind {
            item.kind = kind;
        }
        if let Some(status) = input.status {
            item.status = status;
        }
        if let Some(author) = input.author {
            item.author = author;
        }
        item.updated_at = Some(ts);
        return persist_content_update(&state, &id, &item, doc.version).await;
    }

    let item = ContentItem {
        id: None,
        title: input.title,
        kind: input
            .kind
            .unwrap_or(civic_portal_content_models::ContentKind::News),
        status: input
            .status
            .unwrap_or(civic_portal_content_models::ArticleStatus::Draft),
        author: input.author.unwrap_or_else(|| "Admin".to_string()),
        created_at: ts,
        updated_at: None,
        view_count: 0,
    };
    match strip_id(&item) {
        Ok(value) => match state.gateway.insert(collections::CONTENT, value).await {
            Ok(doc) => {
                let mut item = item;
                item.id = Some(doc.id);
                HttpResponse::Created().json(item)
            }
            Err(e) => {
                log::error!("failed to create content item: {e}");
                HttpResponse::InternalServerError().json(error_body("Failed to save content item"))
            }
        },
        Err(e) => {
            log::error!("content item serialization failed: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to save content item"))
        }
    }
}

/// `POST /api/content/{id}/status`
pub async fn update_content_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<StatusUpdate>,
) -> HttpResponse {
    let id = path.into_inner();
    let ts = now();

    let doc: Document = match state.gateway.get(collections::CONTENT, &id).await {
        Ok(Some(doc)) => doc,
        Ok(None) => return HttpResponse::NotFound().json(error_body("Unknown content item")),
        Err(e) => {
            log::error!("failed to fetch content item {id}: {e}");
            return HttpResponse::InternalServerError()
                .json(error_body("Failed to fetch content item"));
        }
    };
    let mut item = match decode::decode_content_item(&doc, ts) {
        Ok(item) => item,
        Err(e) => {
            log::error!("content item {id} failed to decode: {e}");
            return HttpResponse::InternalServerError()
                .json(error_body("Content item is unreadable"));
        }
    };
    item.status = body.into_inner().status;
    item.updated_at = Some(ts);
    persist_content_update(&state, &id, &item, doc.version).await
}

async fn persist_content_update(
    state: &AppState,
    id: &str,
    item: &ContentItem,
    expected_version: u64,
) -> HttpResponse {
    let value = match strip_id(item) {
        Ok(value) => value,
        Err(e) => {
            log::error!("content item serialization failed: {e}");
            return HttpResponse::InternalServerError()
                .json(error_body("Failed to save content item"));
        }
    };
    match state
        .gateway
        .update(collections::CONTENT, id, value, expected_version)
        .await
    {
        Ok(_) => HttpResponse::Ok().json(item),
        Err(GatewayError::VersionConflict { .. }) => {
            HttpResponse::Conflict().json(error_body("Content item was modified; reload and retry"))
        }
        Err(GatewayError::NotFound { .. }) => {
            HttpResponse::NotFound().json(error_body("Unknown content item"))
        }
        Err(e) => {
            log::error!("failed to update content item {id}: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to save content item"))
        }
    }
}

/// `DELETE /api/content/{id}`
pub async fn delete_content(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match state.gateway.delete(collections::CONTENT, &id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "ok": true })),
        Err(e) => {
            log::error!("failed to delete content item {id}: {e}");
            HttpResponse::InternalServerError().json(error_body("Failed to delete content item"))
        }
    }
}

/// Serializes a record for storage, dropping the envelope-owned id.
fn strip_id<T: serde::Serialize>(record: &T) -> Result<serde_json::Value, serde_json::Error> {
    let mut value = serde_json::to_value(record)?;
    if let Some(map) = value.as_object_mut() {
        map.remove("id");
    }
    Ok(value)
}

async fn load_users(state: &AppState) -> Vec<PortalUser> {
    let ts = now();
    match state.gateway.list(collections::USERS, Some(FETCH_CAP)).await {
        Ok(docs) => docs
            .iter()
            .filter_map(|doc| match decode::decode_user(doc, ts) {
                Ok(user) => Some(user),
                Err(e) => {
                    log::warn!("skipping user {}: {e}", doc.id);
                    None
                }
            })
            .collect(),
        Err(e) => {
            log::error!("failed to list users: {e}");
            Vec::new()
        }
    }
}

async fn load_content(state: &AppState) -> Vec<ContentItem> {
    let ts = now();
    match state.gateway.list(collections::CONTENT, Some(FETCH_CAP)).await {
        Ok(docs) => docs
            .iter()
            .filter_map(|doc| match decode::decode_content_item(doc, ts) {
                Ok(item) => Some(item),
                Err(e) => {
                    log::warn!("skipping content item {}: {e}", doc.id);
                    None
                }
            })
            .collect(),
        Err(e) => {
            log::error!("failed to list content: {e}");
            Vec::new()
        }
    }
}

// ── Uploads ────────────────────────────────────────────────────────

/// `POST /api/uploads`
///
/// Raw request body in, public URL out.
pub async fn upload(
    state: web::Data<AppState>,
    request: HttpRequest,
    params: web::Query<UploadQuery>,
    body: web::Bytes,
) -> HttpResponse {
    let folder = params
        .folder
        .clone()
        .unwrap_or_else(|| "report-attachments".to_string());
    let filename = params
        .filename
        .clone()
        .unwrap_or_else(|| "upload.bin".to_string());
    let content_type = request
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    match state
        .media
        .upload(body.to_vec(), &folder, &filename, &content_type)
        .await
    {
        Ok(url) => HttpResponse::Ok().json(ApiUpload { url }),
        Err(e) => {
            log::error!("upload failed: {e}");
            HttpResponse::InternalServerError()
                .json(error_body("Upload failed. Please try again."))
        }
    }
}
