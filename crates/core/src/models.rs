use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

pub const TRANSPORT_NONE: &str = "—";
pub const TRANSPORT_DAY_CAB: &str = "Day Cab";
pub const TRANSPORT_SCOOTER: &str = "Scooter";
pub const TRANSPORT_POINT_TO_POINT: &str = "Point-to-Point";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FerryClass {
    Economy,
    Deluxe,
    Luxury,
}

impl FerryClass {
    pub fn from_optional_str(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "deluxe" || v == "premium" => Self::Deluxe,
            Some(v) if v == "luxury" || v == "royal" => Self::Luxury,
            _ => Self::Economy,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::Deluxe => "deluxe",
            Self::Luxury => "luxury",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    pub island: String,
    pub duration_hours: f64,
    pub time_of_day: Vec<String>,
    pub moods: Vec<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl PointOfInterest {
    pub fn short_description(&self, max_graphemes: usize) -> String {
        let text = self.description.as_deref().unwrap_or("");
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        if graphemes.len() <= max_graphemes {
            text.to_string()
        } else {
            format!("{}…", graphemes[..max_graphemes].concat())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripSelection {
    pub location_ids: Vec<String>,
    pub start_from_hub: bool,
    pub adults: u32,
    pub infants: u32,
}

impl Default for TripSelection {
    fn default() -> Self {
        Self {
            location_ids: Vec::new(),
            start_from_hub: true,
            adults: 2,
            infants: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayItem {
    Arrival,
    Transfer,
    Location {
        id: String,
        name: String,
        duration_hours: f64,
        time_of_day: Vec<String>,
    },
    Ferry {
        from: String,
        to: String,
        window: Option<String>,
    },
    Departure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub island: String,
    pub items: Vec<DayItem>,
    pub transport: String,
}

impl DayPlan {
    pub fn is_transit(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, DayItem::Ferry { .. } | DayItem::Departure))
    }

    pub fn stop_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, DayItem::Location { .. }))
            .count()
    }

    pub fn stop_hours(&self) -> f64 {
        self.items
            .iter()
            .map(|item| match item {
                DayItem::Location { duration_hours, .. } => *duration_hours,
                _ => 0.0,
            })
            .sum()
    }
}

pub fn ferry_leg_count(days: &[DayPlan]) -> usize {
    days.iter()
        .flat_map(|day| day.items.iter())
        .filter(|item| matches!(item, DayItem::Ferry { .. }))
        .count()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssentialsConfig {
    pub ferry_class: FerryClass,
    pub vehicle_id: String,
    pub flat_islands: Vec<String>,
}

impl Default for EssentialsConfig {
    fn default() -> Self {
        Self {
            ferry_class: FerryClass::Economy,
            vehicle_id: String::new(),
            flat_islands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelChoice {
    pub hotel_id: String,
    pub name: String,
    pub nightly_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub lodging: f64,
    pub transit: f64,
    pub ground: f64,
    pub addons: f64,
    pub total: f64,
}
