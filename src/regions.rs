//! Countries and cities offered by the refinement modal and settings.

const COUNTRY_CITIES: &[(&str, &[&str])] = &[
    (
        "Казахстан",
        &[
            "Алматы",
            "Астана",
            "Шымкент",
            "Атырау",
            "Актау",
            "Караганда",
            "Актобе",
            "Тараз",
            "Павлодар",
            "Усть-Каменогорск",
            "Семей",
            "Костанай",
            "Кызылорда",
            "Уральск",
            "Петропавловск",
            "Туркестан",
            "Кокшетау",
            "Талдыкорган",
        ],
    ),
    ("Узбекистан", &["Ташкент", "Самарканд", "Наманган"]),
    ("Азербайджан", &["Баку", "Гянджа"]),
    ("Грузия", &["Тбилиси", "Батуми", "Кутаиси"]),
    ("Армения", &["Ереван", "Ванадзор"]),
    ("Кыргызстан", &["Бишкек", "Ош"]),
    ("Таджикистан", &["Душанбе", "Худжанд"]),
    ("Туркменистан", &["Ашхабад", "Мары", "Туркменабат"]),
];

pub const LANGUAGES: [&str; 10] = [
    "English",
    "Қазақша",
    "Русский",
    "O'zbekcha",
    "Azərbaycan",
    "ქართული",
    "Հայերեն",
    "Кыргызча",
    "Тоҷикӣ",
    "Türkmen",
];

pub fn countries() -> impl Iterator<Item = &'static str> {
    COUNTRY_CITIES.iter().map(|(country, _)| *country)
}

pub fn cities_for(country: &str) -> &'static [&'static str] {
    COUNTRY_CITIES
        .iter()
        .find(|(name, _)| *name == country)
        .map(|(_, cities)| *cities)
        .unwrap_or(&[])
}

/// Region picker options, primary region first when it is a known country.
pub fn region_options(primary: Option<&str>) -> Vec<&'static str> {
    let mut options: Vec<&'static str> = countries().collect();
    if let Some(index) = primary.and_then(|p| options.iter().position(|c| *c == p)) {
        let chosen = options.remove(index);
        options.insert(0, chosen);
    }
    options
}

pub fn is_supported_language(language: &str) -> bool {
    LANGUAGES.contains(&language)
}
