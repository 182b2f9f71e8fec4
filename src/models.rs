use serde::{Deserialize, Serialize};

use crate::industry::Industry;
use crate::reaction::Reaction;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub title: String,
    pub date: String, // display string, "Date TBD" when unscheduled
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub city: String,
    pub country: String,
    pub description: String,
    pub image_url: String,
    pub industry: String,
    pub category: Option<Industry>,
    pub url: Option<String>,
    pub place: Option<String>,
    pub source: Option<String>,
    pub likes: u32,
    pub dislikes: u32,
    pub user_reaction: Reaction,
    pub saved: bool,
}

impl Event {
    pub fn is_in_region(&self, region: &str) -> bool {
        self.country == region
    }

    /// Link placed on the clipboard by the share dialog.
    pub fn share_link(&self, fallback: &str) -> String {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Row of the remote `events` table.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RawEvent {
    pub id: i64,
    pub name: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub industry: Option<String>,
    pub place: Option<String>,
    pub image_url: Option<String>,
}

impl RawEvent {
    pub const COLUMNS: &'static str = "id,name,title,description,city,country,start_date,end_date,url,source,industry,place,image_url";
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserSession {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub surname: String,
}

impl UserSession {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    #[serde(rename = "telegramNotifications")]
    pub notifications: bool,
    pub region: String,
    pub language: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            notifications: true,
            region: "Казахстан".to_string(),
            language: "English".to_string(),
        }
    }
}

impl AppSettings {
    pub fn primary_region(&self) -> Option<&str> {
        let region = self.region.trim();
        (!region.is_empty()).then_some(region)
    }
}

/// Profile card data rendered on the profile tab.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub title: String,
    pub company: String,
    pub interests: Vec<String>,
}

impl UserProfile {
    pub fn for_session(session: Option<&UserSession>) -> Self {
        Self {
            name: session
                .map(UserSession::display_name)
                .unwrap_or_else(|| "Guest".to_string()),
            title: "Venture Partner".to_string(),
            company: "Activat VC".to_string(),
            interests: ["FinTech", "AI", "Investment", "SaaS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Adds a trimmed interest tag. Blank and already-listed tags are refused.
    pub fn add_interest(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.interests.iter().any(|t| t == tag) {
            return false;
        }
        self.interests.push(tag.to_string());
        true
    }

    pub fn remove_interest(&mut self, tag: &str) -> bool {
        let before = self.interests.len();
        self.interests.retain(|t| t != tag.trim());
        self.interests.len() != before
    }
}
