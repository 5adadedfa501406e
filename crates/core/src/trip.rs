//! The editable trip snapshot: an owned, versioned value regenerated
//! wholesale when selection inputs change and mutated only through the
//! edit operations below.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PlannerConfig;
use crate::itinerary::{assign_transport, generate};
use crate::models::{
    ferry_leg_count, DayItem, DayPlan, EssentialsConfig, HotelChoice, PointOfInterest,
    TripSelection,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripState {
    pub trip_id: String,
    pub version: u64,
    pub selection: TripSelection,
    pub essentials: EssentialsConfig,
    pub hotel_choices: HashMap<String, HotelChoice>,
    pub activity_ids: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub days: Vec<DayPlan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Previous,
    Next,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    InsertDay { index: usize, island: String },
    DeleteDay { index: usize },
    MoveItem {
        day: usize,
        item: usize,
        direction: MoveDirection,
    },
    SetTransport { day: usize, mode: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("day index {0} is out of range")]
    DayOutOfRange(usize),
    #[error("item index {item} is out of range for day {day}")]
    ItemOutOfRange { day: usize, item: usize },
    #[error("arrival and departure days stay in place")]
    EndpointLocked,
    #[error("day {0} is a transit day and keeps its contents")]
    TransitDayLocked(usize),
    #[error("only location stops can be moved")]
    NotAStop,
}

impl TripState {
    pub fn new(trip_id: impl Into<String>) -> Self {
        Self {
            trip_id: trip_id.into(),
            version: 0,
            selection: TripSelection::default(),
            essentials: EssentialsConfig::default(),
            hotel_choices: HashMap::new(),
            activity_ids: Vec::new(),
            start_date: None,
            days: Vec::new(),
        }
    }

    // Replaces the day list wholesale; manual edits do not survive this.
    pub fn regenerate(&mut self, resolved: &[PointOfInterest], config: &PlannerConfig) {
        self.days = generate(resolved, self.selection.start_from_hub, config);
        self.version += 1;
    }

    pub fn apply_edit(&mut self, op: &EditOp, config: &PlannerConfig) -> Result<(), EditError> {
        match op {
            EditOp::InsertDay { index, island } => self.insert_day(*index, island, config)?,
            EditOp::DeleteDay { index } => self.delete_day(*index)?,
            EditOp::MoveItem { day, item, direction } => self.move_item(*day, *item, *direction)?,
            EditOp::SetTransport { day, mode } => self.set_transport(*day, mode)?,
        }
        self.version += 1;
        Ok(())
    }

    fn insert_day(
        &mut self,
        index: usize,
        island: &str,
        config: &PlannerConfig,
    ) -> Result<(), EditError> {
        if index > self.days.len() {
            return Err(EditError::DayOutOfRange(index));
        }
        if index == 0 || index == self.days.len() {
            return Err(EditError::EndpointLocked);
        }
        let transport = assign_transport(island, 0, config).to_string();
        self.days.insert(
            index,
            DayPlan {
                island: island.to_string(),
                items: Vec::new(),
                transport,
            },
        );
        Ok(())
    }

    fn delete_day(&mut self, index: usize) -> Result<(), EditError> {
        if index >= self.days.len() {
            return Err(EditError::DayOutOfRange(index));
        }
        if index == 0 || index == self.days.len() - 1 {
            return Err(EditError::EndpointLocked);
        }
        self.days.remove(index);
        Ok(())
    }

    fn move_item(
        &mut self,
        day: usize,
        item: usize,
        direction: MoveDirection,
    ) -> Result<(), EditError> {
        if day >= self.days.len() {
            return Err(EditError::DayOutOfRange(day));
        }
        let target = match direction {
            MoveDirection::Previous => day
                .checked_sub(1)
                .ok_or(EditError::DayOutOfRange(day))?,
            MoveDirection::Next => day + 1,
        };
        if target >= self.days.len() {
            return Err(EditError::DayOutOfRange(target));
        }
        if self.days[day].is_transit() || self.days[target].is_transit() {
            return Err(EditError::TransitDayLocked(day.max(target)));
        }
        if item >= self.days[day].items.len() {
            return Err(EditError::ItemOutOfRange { day, item });
        }
        if !matches!(self.days[day].items[item], DayItem::Location { .. }) {
            return Err(EditError::NotAStop);
        }

        let moved = self.days[day].items.remove(item);
        match direction {
            MoveDirection::Previous => self.days[target].items.push(moved),
            MoveDirection::Next => self.days[target].items.insert(0, moved),
        }
        Ok(())
    }

    fn set_transport(&mut self, day: usize, mode: &str) -> Result<(), EditError> {
        if day >= self.days.len() {
            return Err(EditError::DayOutOfRange(day));
        }
        if self.days[day].is_transit() {
            return Err(EditError::TransitDayLocked(day));
        }
        self.days[day].transport = mode.to_string();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandNights {
    pub island: String,
    pub nights: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub day_count: usize,
    pub ferry_legs: usize,
    pub nights_by_island: Vec<IslandNights>,
    pub day_dates: Option<Vec<NaiveDate>>,
}

pub fn summarize(days: &[DayPlan], start_date: Option<NaiveDate>) -> TripSummary {
    let mut nights_by_island: Vec<IslandNights> = Vec::new();
    for day in days.iter().filter(|day| !day.is_transit()) {
        match nights_by_island
            .iter_mut()
            .find(|entry| entry.island == day.island)
        {
            Some(entry) => entry.nights += 1,
            None => nights_by_island.push(IslandNights {
                island: day.island.clone(),
                nights: 1,
            }),
        }
    }

    let day_dates = start_date.map(|start| {
        (0..days.len())
            .map(|offset| start + chrono::Duration::days(offset as i64))
            .collect()
    });

    TripSummary {
        day_count: days.len(),
        ferry_legs: ferry_leg_count(days),
        nights_by_island,
        day_dates,
    }
}
