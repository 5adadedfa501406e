use std::path::{Path, PathBuf};

use atoll_core::{normalize_activity, normalize_location, Activity, PointOfInterest};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog root {0} is not a readable directory")]
    RootUnavailable(PathBuf),
    #[error("failed reading catalog file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog file {path} is not valid JSON")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationActivities {
    pub location_id: String,
    pub activity_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogStats {
    pub locations: usize,
    pub activities: usize,
    pub links: usize,
    pub skipped_records: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    locations: Vec<PointOfInterest>,
    activities: Vec<Activity>,
    links: Vec<LocationActivities>,
    skipped_records: usize,
}

enum RecordKind {
    Locations,
    Activities,
    Links,
}

impl Catalog {
    // File stems pick the record kind, so sharded files like
    // locations-north.json land in the right collection.
    pub fn from_dir(root: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(CatalogError::RootUnavailable(root.to_path_buf()));
        }

        let mut catalog = Catalog::default();
        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry.path().extension().and_then(|ext| ext.to_str()) == Some("json")
            })
        {
            let path = entry.path();
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default();
            let Some(kind) = classify_stem(stem) else {
                continue;
            };

            let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let parsed: Value =
                serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            catalog.ingest(&kind, parsed);
        }

        Ok(catalog)
    }

    pub fn from_values(locations: &[Value], activities: &[Value], links: &[Value]) -> Self {
        let mut catalog = Catalog::default();
        catalog.ingest(&RecordKind::Locations, Value::Array(locations.to_vec()));
        catalog.ingest(&RecordKind::Activities, Value::Array(activities.to_vec()));
        catalog.ingest(&RecordKind::Links, Value::Array(links.to_vec()));
        catalog
    }

    fn ingest(&mut self, kind: &RecordKind, parsed: Value) {
        let records = match parsed {
            Value::Array(entries) => entries,
            record @ Value::Object(_) => vec![record],
            _ => {
                self.skipped_records += 1;
                return;
            }
        };

        for record in records {
            if !record.is_object() {
                self.skipped_records += 1;
                continue;
            }
            match kind {
                RecordKind::Locations => self.locations.push(normalize_location(&record)),
                RecordKind::Activities => self.activities.push(normalize_activity(&record)),
                RecordKind::Links => match parse_link(&record) {
                    Some(link) => self.links.push(link),
                    None => self.skipped_records += 1,
                },
            }
        }
    }

    pub fn locations(&self) -> &[PointOfInterest] {
        &self.locations
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn location(&self, id: &str) -> Option<&PointOfInterest> {
        self.locations.iter().find(|location| location.id == id)
    }

    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|activity| activity.id == id)
    }

    // Resolves selection ids in order, collapsing duplicates and dropping
    // ids the catalog does not know.
    pub fn resolve_selection(&self, ids: &[String]) -> Vec<PointOfInterest> {
        let mut resolved: Vec<PointOfInterest> = Vec::new();
        for id in ids {
            if resolved.iter().any(|location| &location.id == id) {
                continue;
            }
            if let Some(location) = self.location(id) {
                resolved.push(location.clone());
            }
        }
        resolved
    }

    pub fn resolve_activities(&self, ids: &[String]) -> Vec<Activity> {
        let mut resolved: Vec<Activity> = Vec::new();
        for id in ids {
            if resolved.iter().any(|activity| &activity.id == id) {
                continue;
            }
            if let Some(activity) = self.activity(id) {
                resolved.push(activity.clone());
            }
        }
        resolved
    }

    pub fn suggest_for(&self, location_id: &str) -> Vec<&Activity> {
        let mut suggestions: Vec<&Activity> = Vec::new();
        for link in self.links.iter().filter(|link| link.location_id == location_id) {
            for activity_id in &link.activity_ids {
                if suggestions.iter().any(|activity| &activity.id == activity_id) {
                    continue;
                }
                if let Some(activity) = self.activity(activity_id) {
                    suggestions.push(activity);
                }
            }
        }
        suggestions
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            locations: self.locations.len(),
            activities: self.activities.len(),
            links: self.links.len(),
            skipped_records: self.skipped_records,
        }
    }
}

fn classify_stem(stem: &str) -> Option<RecordKind> {
    if stem.starts_with("location_activities") || stem.starts_with("links") {
        Some(RecordKind::Links)
    } else if stem.starts_with("activities") {
        Some(RecordKind::Activities)
    } else if stem.starts_with("locations") {
        Some(RecordKind::Locations)
    } else {
        None
    }
}

fn parse_link(raw: &Value) -> Option<LocationActivities> {
    let location_id = id_string(raw.get("location_id").or_else(|| raw.get("location"))?)?;
    let ids = match raw.get("activity_ids").or_else(|| raw.get("activities")) {
        Some(Value::Array(entries)) => entries,
        _ => return None,
    };

    let mut activity_ids: Vec<String> = Vec::new();
    for entry in ids {
        if let Some(id) = id_string(entry) {
            if !activity_ids.contains(&id) {
                activity_ids.push(id);
            }
        }
    }

    Some(LocationActivities {
        location_id,
        activity_ids,
    })
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
