use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::gateway::{GatewayError, Query, RestGateway};
use crate::models::Event;
use crate::reaction::{plan_remote, DislikeReason, Reaction, RemoteAction};

const TABLE: &str = "feedbacks";
const COLUMNS: &str = "id,user_id,event_id,is_positive,reason";

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("event id {0} is not numeric")]
    InvalidEventId(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// One row per (user, event) pair.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeedbackRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: i64,
    pub event_id: i64,
    pub is_positive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionSummary {
    pub likes: u32,
    pub dislikes: u32,
    pub user_reaction: Reaction,
}

#[derive(Clone)]
pub struct FeedbackStore {
    gateway: RestGateway,
}

impl FeedbackStore {
    pub fn new(gateway: RestGateway) -> Self {
        Self { gateway }
    }

    /// Per-event counts keyed by event id, with `user`'s own reaction filled in.
    pub async fn fetch_summary(
        &self,
        user: Option<i64>,
    ) -> Result<HashMap<String, ReactionSummary>, FeedbackError> {
        let rows: Vec<FeedbackRow> = self
            .gateway
            .select(TABLE, &Query::new().select(COLUMNS))
            .await?;
        Ok(summarize(&rows, user))
    }

    /// Makes the stored row for (`user`, `event_id`) match `next`.
    pub async fn sync(
        &self,
        user: i64,
        event_id: &str,
        next: Reaction,
        reason: Option<DislikeReason>,
    ) -> Result<RemoteAction, FeedbackError> {
        let event = event_id
            .parse::<i64>()
            .map_err(|_| FeedbackError::InvalidEventId(event_id.to_string()))?;
        let pair = Query::new().eq("user_id", user).eq("event_id", event);

        let existing: Vec<FeedbackRow> = self
            .gateway
            .select(TABLE, &pair.clone().select(COLUMNS).limit(1))
            .await?;
        let stored = existing.first();
        let reason = reason
            .filter(|_| next == Reaction::Dislike)
            .map(|r| r.label().to_string());

        let reason_changed = reason.is_some() && stored.map(|row| &row.reason) != Some(&reason);
        let action = match plan_remote(stored.map(|row| row.is_positive), next) {
            RemoteAction::Noop if reason_changed => RemoteAction::Update { is_positive: false },
            action => action,
        };

        match action {
            RemoteAction::Insert { is_positive } => {
                let row = FeedbackRow {
                    id: None,
                    user_id: user,
                    event_id: event,
                    is_positive,
                    reason,
                };
                let _: Vec<FeedbackRow> = self.gateway.insert(TABLE, &row).await?;
            }
            RemoteAction::Update { is_positive } => {
                let body = json!({ "is_positive": is_positive, "reason": reason });
                let _: Vec<FeedbackRow> = self.gateway.update(TABLE, &body, &pair).await?;
            }
            RemoteAction::Delete => self.gateway.delete(TABLE, &pair).await?,
            RemoteAction::Noop => {}
        }
        tracing::debug!(user, event, ?action, "feedback synced");
        Ok(action)
    }
}

pub fn summarize(rows: &[FeedbackRow], user: Option<i64>) -> HashMap<String, ReactionSummary> {
    let mut summary: HashMap<String, ReactionSummary> = HashMap::new();
    for row in rows {
        let entry = summary.entry(row.event_id.to_string()).or_default();
        if row.is_positive {
            entry.likes += 1;
        } else {
            entry.dislikes += 1;
        }
        if Some(row.user_id) == user {
            entry.user_reaction = Reaction::from_polarity(row.is_positive);
        }
    }
    summary
}

/// Joins remote counts onto the catalog; events without feedback keep zeros.
pub fn overlay(events: &mut [Event], summary: &HashMap<String, ReactionSummary>) {
    for event in events.iter_mut() {
        let counts = summary.get(&event.id).copied().unwrap_or_default();
        event.likes = counts.likes;
        event.dislikes = counts.dislikes;
        event.user_reaction = counts.user_reaction;
    }
}
