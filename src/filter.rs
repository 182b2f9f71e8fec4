use crate::industry::IndustrySelection;
use crate::models::Event;

/// Feed filters. Ephemeral; rebuilt from UI state each session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub industry: IndustrySelection,
    pub country: Option<String>,
    pub city: Option<String>,
    pub query: String,
    /// Orders the result; never filters.
    pub primary_region: Option<String>,
}

impl FilterCriteria {
    pub fn with_primary_region(mut self, region: Option<&str>) -> Self {
        self.primary_region = region.map(str::to_string);
        self
    }

    /// Cities are scoped to a country, so changing the country clears the city.
    pub fn select_country(&mut self, country: Option<String>) {
        if self.country != country {
            self.city = None;
        }
        self.country = country;
    }

    pub fn select_city(&mut self, city: Option<String>) {
        self.city = city;
    }

    pub fn reset(&mut self) {
        *self = Self {
            primary_region: self.primary_region.take(),
            ..Self::default()
        };
    }

    pub fn is_cleared(&self) -> bool {
        self.industry == IndustrySelection::All
            && self.country.is_none()
            && self.city.is_none()
            && self.query.is_empty()
    }
}

pub fn matches(event: &Event, criteria: &FilterCriteria) -> bool {
    criteria.industry.matches(&event.industry, event.category)
        && criteria
            .country
            .as_deref()
            .map_or(true, |country| event.country == country)
        && criteria
            .city
            .as_deref()
            .map_or(true, |city| event.city == city)
        && matches_query(event, &criteria.query)
}

fn matches_query(event: &Event, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    [&event.title, &event.description, &event.country, &event.name]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Filters, then moves primary-region events ahead of the rest. Both groups
/// keep their input order.
pub fn filter_and_sort<'a>(events: &'a [Event], criteria: &FilterCriteria) -> Vec<&'a Event> {
    let filtered = events.iter().filter(|event| matches(event, criteria));
    match criteria.primary_region.as_deref() {
        Some(region) => {
            let (mut primary, rest): (Vec<&Event>, Vec<&Event>) =
                filtered.partition(|event| event.is_in_region(region));
            primary.extend(rest);
            primary
        }
        None => filtered.collect(),
    }
}
