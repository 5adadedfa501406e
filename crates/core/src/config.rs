use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::FerryClass;

pub const DEFAULT_HUB_ISLAND: &str = "Port Blair";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubStartPolicy {
    AlwaysPrepend,
    ReorderOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRate {
    pub id: String,
    pub name: String,
    pub day_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FerryWindow {
    pub from: String,
    pub to: String,
    pub window: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FerryClassMultipliers {
    pub economy: f64,
    pub deluxe: f64,
    pub luxury: f64,
}

impl Default for FerryClassMultipliers {
    fn default() -> Self {
        Self {
            economy: 1.0,
            deluxe: 1.4,
            luxury: 1.9,
        }
    }
}

impl FerryClassMultipliers {
    pub fn for_class(&self, class: FerryClass) -> f64 {
        let multiplier = match class {
            FerryClass::Economy => self.economy,
            FerryClass::Deluxe => self.deluxe,
            FerryClass::Luxury => self.luxury,
        };
        if multiplier.is_finite() && multiplier > 0.0 {
            multiplier
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub hub_island: String,
    pub island_order: Vec<String>,
    pub leisure_islands: Vec<String>,
    pub hub_policy: HubStartPolicy,
    pub max_stops_per_day: usize,
    pub max_hours_per_day: f64,
    pub day_cab_min_stops: usize,
    pub ferry_base_fare: f64,
    pub ferry_class_multipliers: FerryClassMultipliers,
    pub vehicles: Vec<VehicleRate>,
    pub default_vehicle: String,
    pub scooter_day_rate: f64,
    pub point_to_point_rate: f64,
    pub flat_day_rate: f64,
    pub ferry_windows: Vec<FerryWindow>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            hub_island: DEFAULT_HUB_ISLAND.to_string(),
            island_order: vec![
                DEFAULT_HUB_ISLAND.to_string(),
                "Havelock".to_string(),
                "Neil".to_string(),
                "Baratang".to_string(),
                "Rangat".to_string(),
                "Diglipur".to_string(),
                "Little Andaman".to_string(),
            ],
            leisure_islands: vec!["Havelock".to_string(), "Neil".to_string()],
            hub_policy: HubStartPolicy::AlwaysPrepend,
            max_stops_per_day: 4,
            max_hours_per_day: 7.0,
            day_cab_min_stops: 3,
            ferry_base_fare: 1150.0,
            ferry_class_multipliers: FerryClassMultipliers::default(),
            vehicles: vec![
                VehicleRate {
                    id: "wagonr".to_string(),
                    name: "WagonR (AC)".to_string(),
                    day_rate: 2500.0,
                },
                VehicleRate {
                    id: "innova".to_string(),
                    name: "Innova Crysta (AC)".to_string(),
                    day_rate: 3500.0,
                },
                VehicleRate {
                    id: "tempo".to_string(),
                    name: "Tempo Traveller".to_string(),
                    day_rate: 5500.0,
                },
            ],
            default_vehicle: "wagonr".to_string(),
            scooter_day_rate: 500.0,
            point_to_point_rate: 400.0,
            flat_day_rate: 800.0,
            ferry_windows: vec![
                FerryWindow {
                    from: DEFAULT_HUB_ISLAND.to_string(),
                    to: "Havelock".to_string(),
                    window: "06:30 – 08:00".to_string(),
                },
                FerryWindow {
                    from: "Havelock".to_string(),
                    to: "Neil".to_string(),
                    window: "10:30 – 11:45".to_string(),
                },
                FerryWindow {
                    from: "Neil".to_string(),
                    to: DEFAULT_HUB_ISLAND.to_string(),
                    window: "14:00 – 16:00".to_string(),
                },
                FerryWindow {
                    from: "Havelock".to_string(),
                    to: DEFAULT_HUB_ISLAND.to_string(),
                    window: "16:00 – 17:30".to_string(),
                },
            ],
        }
    }
}

impl PlannerConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading planner config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing planner config {}", path.display()))?;
        Ok(config)
    }

    pub fn island_rank(&self, island: &str) -> Option<usize> {
        self.island_order.iter().position(|known| known == island)
    }

    pub fn is_leisure(&self, island: &str) -> bool {
        self.leisure_islands.iter().any(|leisure| leisure == island)
    }

    pub fn vehicle_day_rate(&self, vehicle_id: &str) -> f64 {
        self.vehicles
            .iter()
            .find(|vehicle| vehicle.id == vehicle_id)
            .or_else(|| {
                self.vehicles
                    .iter()
                    .find(|vehicle| vehicle.id == self.default_vehicle)
            })
            .map(|vehicle| vehicle.day_rate)
            .unwrap_or(0.0)
    }

    pub fn ferry_window(&self, from: &str, to: &str) -> Option<String> {
        self.ferry_windows
            .iter()
            .find(|window| window.from == from && window.to == to)
            .map(|window| window.window.clone())
    }
}
