use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Event;

/// A user's standing reaction to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    #[default]
    None,
    Like,
    Dislike,
}

/// What the user clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl From<ReactionKind> for Reaction {
    fn from(kind: ReactionKind) -> Self {
        match kind {
            ReactionKind::Like => Reaction::Like,
            ReactionKind::Dislike => Reaction::Dislike,
        }
    }
}

impl Reaction {
    /// Remote polarity; `None` has no row.
    pub fn polarity(self) -> Option<bool> {
        match self {
            Reaction::None => None,
            Reaction::Like => Some(true),
            Reaction::Dislike => Some(false),
        }
    }

    pub fn from_polarity(is_positive: bool) -> Self {
        if is_positive {
            Reaction::Like
        } else {
            Reaction::Dislike
        }
    }
}

/// Fixed reasons a user may give with a dislike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DislikeReason {
    NotMyField,
    NotB2b,
    SmallScale,
}

impl DislikeReason {
    pub const ALL: [DislikeReason; 3] = [
        DislikeReason::NotMyField,
        DislikeReason::NotB2b,
        DislikeReason::SmallScale,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DislikeReason::NotMyField => "Не моя сфера",
            DislikeReason::NotB2b => "Не B2B",
            DislikeReason::SmallScale => "Малый масштаб",
        }
    }
}

#[derive(Debug, Error)]
pub enum ReactionError {
    #[error("no event with id {0}")]
    UnknownEvent(String),
    #[error("sign in to react to events")]
    NotSignedIn,
}

/// Outcome of one state-machine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: Reaction,
    pub likes_delta: i32,
    pub dislikes_delta: i32,
}

pub fn transition(current: Reaction, requested: ReactionKind) -> Transition {
    let requested = Reaction::from(requested);
    let next = if current == requested {
        Reaction::None
    } else {
        requested
    };
    Transition {
        next,
        likes_delta: contribution(next, Reaction::Like) - contribution(current, Reaction::Like),
        dislikes_delta: contribution(next, Reaction::Dislike)
            - contribution(current, Reaction::Dislike),
    }
}

fn contribution(state: Reaction, counted: Reaction) -> i32 {
    i32::from(state == counted)
}

/// Returns the event as it looks after the toggle; the input is untouched.
pub fn toggle_reaction(event: &Event, requested: ReactionKind) -> Event {
    let mut next = event.clone();
    apply_toggle(&mut next, requested);
    next
}

pub fn apply_toggle(event: &mut Event, requested: ReactionKind) -> Transition {
    let step = transition(event.user_reaction, requested);
    event.likes = shift(event.likes, step.likes_delta);
    event.dislikes = shift(event.dislikes, step.dislikes_delta);
    event.user_reaction = step.next;
    step
}

fn shift(count: u32, delta: i32) -> u32 {
    if delta < 0 {
        count.saturating_sub(delta.unsigned_abs())
    } else {
        count.saturating_add(delta.unsigned_abs())
    }
}

/// Remote write needed to make the stored row match the local reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    Insert { is_positive: bool },
    Update { is_positive: bool },
    Delete,
    Noop,
}

pub fn plan_remote(existing: Option<bool>, next: Reaction) -> RemoteAction {
    match (existing, next.polarity()) {
        (None, None) => RemoteAction::Noop,
        (None, Some(is_positive)) => RemoteAction::Insert { is_positive },
        (Some(_), None) => RemoteAction::Delete,
        (Some(stored), Some(wanted)) if stored == wanted => RemoteAction::Noop,
        (Some(_), Some(is_positive)) => RemoteAction::Update { is_positive },
    }
}

/// What to do with the optimistic local state when the remote write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    /// Keep the local state and log the failure.
    #[default]
    Accept,
    /// Restore the event to its pre-toggle state.
    Revert,
}

impl ReconcilePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "accept" => Some(Self::Accept),
            "revert" => Some(Self::Revert),
            _ => None,
        }
    }
}
