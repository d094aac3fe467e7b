//! Mail endpoints: send/draft, listings, single-record access, edits,
//! per-holder deletion, search, and post-delivery labeling.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use postbox_delivery::{Delivery, SendRequest};
use postbox_store::{GroupId, LabelId, MailId, MailRecord};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{auth::Identity, error::ApiError, state::AppState};

/// How many inbox entries the `recent_mails` preview covers.
const RECENT_LIMIT: usize = 50;

/// How many characters of content a preview carries.
const PREVIEW_LIMIT: usize = 100;

/// One mail copy as the caller sees it: the label set is the caller's own
/// entry on the copy, never another user's.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailView {
    pub id: MailId,
    pub sender: String,
    pub recipient: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub content: String,
    pub labels: Vec<LabelId>,
    pub group_id: GroupId,
    pub timestamp: DateTime<Utc>,
    pub is_draft: bool,
}

impl MailView {
    fn for_user(record: &MailRecord, user: &str) -> Self {
        Self {
            id: record.id,
            sender: record.sender.clone(),
            recipient: record.recipient.clone(),
            recipients: record.recipients.clone(),
            subject: record.subject.clone(),
            content: record.content.clone(),
            labels: record.labels_for(user),
            group_id: record.group_id,
            timestamp: record.timestamp,
            is_draft: record.is_draft,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecentView {
    id: MailId,
    subject: String,
    timestamp: DateTime<Utc>,
    direction: &'static str,
    other_party: PartyView,
    preview: String,
}

#[derive(Debug, Serialize)]
struct PartyView {
    email: String,
}

impl RecentView {
    fn from_record(record: &MailRecord, user: &str) -> Self {
        let is_sent = record.sender == user;
        let other = if is_sent {
            record.recipient.clone()
        } else {
            record.sender.clone()
        };
        Self {
            id: record.id,
            subject: record.subject.clone(),
            timestamp: record.timestamp,
            direction: if is_sent { "sent" } else { "received" },
            other_party: PartyView { email: other },
            preview: record.content.chars().take(PREVIEW_LIMIT).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMailBody {
    sender: Option<String>,
    recipient: Option<String>,
    recipients: Option<Vec<String>>,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    is_draft: bool,
    #[serde(default)]
    labels: Vec<String>,
}

/// `POST /mails` — send a message or save a draft.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
    Json(body): Json<CreateMailBody>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(sender) = body.sender else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };

    // Back-compat: fold the legacy single-recipient form into the list.
    let recipients = body
        .recipients
        .or_else(|| body.recipient.map(|r| vec![r]))
        .unwrap_or_default();

    let request = SendRequest {
        sender,
        recipients,
        subject: body.subject,
        content: body.content,
        is_draft: body.is_draft,
        labels: body.labels,
    };

    match state.engine.send(&user, request).await? {
        Delivery::Draft(record) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Draft saved",
                "mail": MailView::for_user(&record, &user),
            })),
        )),
        Delivery::Sent(copies) => {
            let views: Vec<MailView> = copies
                .iter()
                .map(|record| MailView::for_user(record, &user))
                .collect();
            Ok((
                StatusCode::CREATED,
                Json(json!({
                    "message": "Mail sent successfully",
                    "sent": views,
                })),
            ))
        }
    }
}

/// `GET /mails` — the caller's inbox, sent mail, and a recent preview.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
) -> Result<impl IntoResponse, ApiError> {
    let inbox = state.mailbox.inbox(&user)?;
    let sent = state.mailbox.sent(&user)?;

    if inbox.is_empty() && sent.is_empty() {
        return Ok(Json(json!({
            "message": "No mails found for this user",
            "inbox": [],
            "sent": [],
            "recent_mails": [],
        })));
    }

    let recent_mails: Vec<RecentView> = inbox
        .iter()
        .take(RECENT_LIMIT)
        .map(|record| RecentView::from_record(record, &user))
        .collect();

    let inbox: Vec<MailView> = inbox
        .iter()
        .map(|record| MailView::for_user(record, &user))
        .collect();
    let sent: Vec<MailView> = sent
        .iter()
        .map(|record| MailView::for_user(record, &user))
        .collect();

    Ok(Json(json!({
        "message": "Mails fetched successfully",
        "inbox": inbox,
        "sent": sent,
        "recent_mails": recent_mails,
    })))
}

/// `GET /mails/{id}` — one copy, readable by its sender or any recipient.
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = lookup(&state, &id)?;

    if !record.is_visible_to(&user) {
        return Err(ApiError::Forbidden(
            "You are not authorized to view this mail".to_string(),
        ));
    }

    Ok(Json(MailView::for_user(&record, &user)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMailBody {
    subject: Option<String>,
    content: Option<String>,
}

/// `PATCH /mails/{id}` — sender-only subject/content edit.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
    Path(id): Path<String>,
    Json(body): Json<UpdateMailBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.subject.is_none() && body.content.is_none() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    let record = lookup(&state, &id)?;
    if record.sender != user {
        return Err(ApiError::Forbidden(
            "Only sender may edit subject or content".to_string(),
        ));
    }

    let updated = state
        .mailbox
        .update_content(record.id, body.subject, body.content)?;

    Ok(Json(json!({
        "message": "Mail updated",
        "mail": MailView::for_user(&updated, &user),
    })))
}

/// `DELETE /mails/{id}` — remove the copy from the caller's own mailbox.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = lookup(&state, &id)?;
    if !record.is_visible_to(&user) {
        return Err(ApiError::Forbidden(
            "Not authorized to delete this mail".to_string(),
        ));
    }

    state.mailbox.delete_for(record.id, &user)?;

    Ok(Json(json!({ "message": "Mail deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchView {
    id: MailId,
    subject: String,
    timestamp: DateTime<Utc>,
    direction: &'static str,
    sender: String,
    recipients: Vec<String>,
    content: String,
}

/// `GET /mails/search?q=` — substring search deduplicated by group id.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing search query".to_string()))?;

    let results = state.mailbox.search(&user, &query)?;
    if results.is_empty() {
        return Err(ApiError::NotFound("No matching mails found".to_string()));
    }

    let views: Vec<SearchView> = results
        .iter()
        .map(|record| SearchView {
            id: record.id,
            subject: record.subject.clone(),
            timestamp: record.timestamp,
            direction: if record.sender == user {
                "sent"
            } else {
                "received"
            },
            sender: record.sender.clone(),
            recipients: record.recipients.clone(),
            content: record.content.clone(),
        })
        .collect();

    Ok(Json(views))
}

#[derive(Debug, Deserialize)]
pub struct SetLabelsBody {
    labels: Vec<String>,
}

/// `PATCH /mails/{id}/labels` — replace the caller's label set on a copy.
pub async fn set_labels(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
    Path(id): Path<String>,
    Json(body): Json<SetLabelsBody>,
) -> Result<impl IntoResponse, ApiError> {
    let id: MailId = id
        .parse()
        .map_err(|_| ApiError::NotFound("Mail not found".to_string()))?;

    let labels = state
        .engine
        .set_labels_for_user(&user, id, &body.labels)
        .await?;

    Ok(Json(json!({
        "message": "Labels updated",
        "labels": labels,
    })))
}

/// Parse a path id and fetch the copy; both failure modes are a 404.
fn lookup(state: &AppState, id: &str) -> Result<MailRecord, ApiError> {
    let id: MailId = id
        .parse()
        .map_err(|_| ApiError::NotFound("Mail not found".to_string()))?;
    state
        .mailbox
        .get(id)?
        .ok_or_else(|| ApiError::NotFound("Mail not found".to_string()))
}
