use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::gateway::{GatewayError, Query, RestGateway};
use crate::industry::Industry;
use crate::models::{Event, RawEvent};
use crate::reaction::Reaction;

const LOCAL_ASSET_PREFIX: &str = "parsed_images/";
const UNSCHEDULED: &str = "Date TBD";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to load events: {0}")]
    Load(#[from] GatewayError),
}

pub async fn load_catalog(gateway: &RestGateway) -> Result<Vec<Event>, CatalogError> {
    let query = Query::new()
        .select(RawEvent::COLUMNS)
        .order("start_date", true);
    let rows: Vec<RawEvent> = gateway.select("events", &query).await?;
    tracing::info!(rows = rows.len(), "loaded raw events");
    Ok(rows.into_iter().map(normalize).collect())
}

pub fn normalize(raw: RawEvent) -> Event {
    let industry = non_blank(raw.industry).unwrap_or_else(|| "General".to_string());
    let category = Industry::from_label(&industry);

    Event {
        id: raw.id.to_string(),
        name: non_blank(raw.name).unwrap_or_else(|| raw.title.clone()),
        date: display_date(raw.start_date.as_deref()),
        image_url: resolve_image_url(raw.image_url.as_deref(), raw.id),
        city: non_blank(raw.city).unwrap_or_else(|| "Unknown".to_string()),
        country: non_blank(raw.country).unwrap_or_else(|| "Unknown".to_string()),
        description: raw.description.unwrap_or_default(),
        title: raw.title,
        start_date: raw.start_date,
        end_date: raw.end_date,
        industry,
        category,
        url: raw.url,
        place: raw.place,
        source: raw.source,
        likes: 0,
        dislikes: 0,
        user_reaction: Reaction::None,
        saved: false,
    }
}

pub fn resolve_image_url(image_url: Option<&str>, id: i64) -> String {
    match image_url.map(str::trim) {
        Some(path) if !path.is_empty() => {
            if path.starts_with("http://") || path.starts_with("https://") {
                path.to_string()
            } else if path.starts_with(LOCAL_ASSET_PREFIX) {
                format!("/{path}")
            } else {
                format!("/{}", path.trim_start_matches('/'))
            }
        }
        _ => placeholder_image_url(id),
    }
}

pub fn placeholder_image_url(id: i64) -> String {
    format!("https://picsum.photos/seed/{id}/800/450")
}

/// Short month/day/year, e.g. "May 12, 2024".
pub fn display_date(start_date: Option<&str>) -> String {
    start_date
        .and_then(parse_date)
        .map(|date| date.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| UNSCHEDULED.to_string())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
