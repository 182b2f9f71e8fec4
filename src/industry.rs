use serde::{Deserialize, Serialize};

/// Canonical industry categories shown on the quick-filter strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Industry {
    ItDigital,
    Agrosector,
    FinTech,
    Energy,
    Retail,
    Mining,
    Construction,
    Transport,
    Other,
}

/// Canonical name followed by every surface label seen in source data.
const SYNONYMS: &[(Industry, &str, &[&str])] = &[
    (Industry::ItDigital, "IT/Digital", &["IT/Digital"]),
    (Industry::Agrosector, "Agrosector", &["Agrosector", "Агросектор"]),
    (Industry::FinTech, "FinTech", &["FinTech"]),
    (Industry::Energy, "Energy", &["Energy", "Энергетика"]),
    (Industry::Retail, "Retail", &["Retail", "Ритейл/FMCG"]),
    (Industry::Mining, "Mining", &["Mining"]),
    (Industry::Construction, "Construction", &["Construction", "Строительство"]),
    (Industry::Transport, "Transport", &["Transport", "Транспорт"]),
    (Industry::Other, "Other", &["Other", "Другое"]),
];

impl Industry {
    /// Quick-filter strip order, after the leading "All" entry.
    pub const RIBBON: [Industry; 8] = [
        Industry::ItDigital,
        Industry::Agrosector,
        Industry::Energy,
        Industry::Retail,
        Industry::Mining,
        Industry::Construction,
        Industry::Transport,
        Industry::Other,
    ];

    pub fn canonical_name(self) -> &'static str {
        SYNONYMS
            .iter()
            .find(|(industry, _, _)| *industry == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("Other")
    }

    /// Resolves a canonical English name only; localized labels return `None`.
    pub fn from_canonical(name: &str) -> Option<Self> {
        SYNONYMS
            .iter()
            .find(|(_, canonical, _)| *canonical == name)
            .map(|(industry, _, _)| *industry)
    }

    /// Resolves any known surface label, case-sensitive and exact.
    pub fn from_label(label: &str) -> Option<Self> {
        SYNONYMS
            .iter()
            .find(|(_, _, labels)| labels.contains(&label))
            .map(|(industry, _, _)| *industry)
    }
}

/// Industry selection on the feed: everything, or one label.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndustrySelection {
    #[default]
    All,
    Label(String),
}

impl IndustrySelection {
    pub fn from_label(label: &str) -> Self {
        if label == "All" {
            Self::All
        } else {
            Self::Label(label.to_string())
        }
    }

    /// `event_category` is the category resolved when the event was ingested.
    pub fn matches(&self, event_label: &str, event_category: Option<Industry>) -> bool {
        match self {
            Self::All => true,
            Self::Label(label) if label == event_label => true,
            Self::Label(label) => match (Industry::from_canonical(label), event_category) {
                (Some(wanted), Some(category)) => wanted == category,
                _ => false,
            },
        }
    }
}

impl From<Industry> for IndustrySelection {
    fn from(industry: Industry) -> Self {
        Self::Label(industry.canonical_name().to_string())
    }
}
