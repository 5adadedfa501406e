//! Fail-soft normalization of raw catalog records into typed stops and
//! activities. Shape problems degrade to documented defaults, never errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::config::DEFAULT_HUB_ISLAND;
use crate::models::{Activity, PointOfInterest};

pub const DEFAULT_DURATION_HOURS: f64 = 2.0;

static NUMBER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d[\d,]*\.?\d*").expect("static number pattern"));
static NON_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern"));

const MOOD_FAMILIES: &[(&str, &[&str])] = &[
    (
        "adventure",
        &["dive", "snorkel", "scuba", "trek", "kayak", "surf", "water sport"],
    ),
    ("romantic", &["beach", "sunset", "lagoon", "romantic", "view"]),
    (
        "family",
        &["museum", "heritage", "memorial", "aquarium", "light and sound"],
    ),
    (
        "photography",
        &["wildlife", "reef", "bird", "mangrove", "coral", "nature"],
    ),
    ("offbeat", &["remote", "cave", "lighthouse", "limestone", "volcano"]),
];

pub fn normalize_location(raw: &Value) -> PointOfInterest {
    let name = string_field(raw, &["name", "title", "label"])
        .unwrap_or_else(|| "Unnamed spot".to_string());
    let id = string_field(raw, &["id", "slug"]).unwrap_or_else(|| slugify(&name));
    let island =
        string_field(raw, &["island"]).unwrap_or_else(|| DEFAULT_HUB_ISLAND.to_string());
    let duration_hours = positive_number_field(raw, &["duration_hrs", "duration", "hours"])
        .unwrap_or(DEFAULT_DURATION_HOURS);
    let time_of_day = scalar_or_array(raw.get("best_time"));
    let description = string_field(raw, &["description"]);
    let image = string_field(raw, &["image"]);

    let explicit_moods = scalar_or_array(raw.get("moods"));
    let moods = if explicit_moods.is_empty() {
        infer_moods(&name, description.as_deref(), duration_hours)
    } else {
        explicit_moods
    };

    PointOfInterest {
        id,
        name,
        island,
        duration_hours,
        time_of_day,
        moods,
        description,
        image,
    }
}

pub fn normalize_activity(raw: &Value) -> Activity {
    let name = string_field(raw, &["name", "title", "label"])
        .unwrap_or_else(|| "Unnamed activity".to_string());
    let id = string_field(raw, &["id", "slug"]).unwrap_or_else(|| slugify(&name));
    let price = money_field(raw, &["price", "cost"]);
    let description = string_field(raw, &["description"]);

    Activity {
        id,
        name,
        price,
        description,
    }
}

pub fn infer_moods(name: &str, description: Option<&str>, duration_hours: f64) -> Vec<String> {
    let haystack = format!("{} {}", name, description.unwrap_or_default()).to_lowercase();

    let mut moods = Vec::new();
    let mut keyword_hit = false;
    for (tag, needles) in MOOD_FAMILIES {
        if contains_any(&haystack, needles) {
            push_unique(&mut moods, tag);
            keyword_hit = true;
        }
    }

    if duration_hours <= 2.0 {
        push_unique(&mut moods, "relaxed");
    }
    if duration_hours >= 3.0 {
        push_unique(&mut moods, "balanced");
    }
    if duration_hours >= 4.0 {
        push_unique(&mut moods, "active");
    }

    if !keyword_hit {
        push_unique(&mut moods, "balanced");
    }
    moods
}

// Accepts JSON numbers and numeric strings ("₹1,500", "2 hrs"); anything
// non-finite or negative is treated as absent.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => NUMBER_TOKEN
            .find(text)
            .and_then(|token| token.as_str().replace(',', "").parse::<f64>().ok()),
        _ => None,
    };
    parsed.filter(|number| number.is_finite() && *number >= 0.0)
}

pub fn slugify(input: &str) -> String {
    NON_SLUG
        .replace_all(&input.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

fn string_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key) {
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn positive_number_field(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        raw.get(*key)
            .and_then(coerce_number)
            .filter(|number| *number > 0.0)
    })
}

fn money_field(raw: &Value, keys: &[&str]) -> f64 {
    keys.iter()
        .find_map(|key| raw.get(*key).and_then(coerce_number))
        .unwrap_or(0.0)
}

fn scalar_or_array(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(text) => {
                    let trimmed = text.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                }
                _ => None,
            })
            .collect(),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
        _ => Vec::new(),
    }
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}

fn push_unique(moods: &mut Vec<String>, tag: &str) {
    if !moods.iter().any(|existing| existing == tag) {
        moods.push(tag.to_string());
    }
}
