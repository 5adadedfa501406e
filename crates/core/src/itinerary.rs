//! Day-by-day itinerary generation: island ordering, greedy stop packing,
//! mandatory ferry rows, and per-day transport assignment. Pure functions.

use crate::config::{HubStartPolicy, PlannerConfig};
use crate::models::{
    DayItem, DayPlan, PointOfInterest, TRANSPORT_DAY_CAB, TRANSPORT_NONE,
    TRANSPORT_POINT_TO_POINT, TRANSPORT_SCOOTER,
};

pub fn generate(
    selected: &[PointOfInterest],
    start_from_hub: bool,
    config: &PlannerConfig,
) -> Vec<DayPlan> {
    let mut days = vec![arrival_day(config)];

    if selected.is_empty() {
        days.push(departure_day(config));
        return days;
    }

    let groups = ordered_island_groups(selected, start_from_hub, config);

    for (index, (island, stops)) in groups.iter().enumerate() {
        if index > 0 {
            days.push(ferry_day(&groups[index - 1].0, island, config));
        }
        append_island_days(&mut days, island, stops, config);
    }

    if let Some((last_island, _)) = groups.last() {
        if last_island != &config.hub_island {
            days.push(ferry_day(last_island, &config.hub_island, config));
        }
    }

    days.push(departure_day(config));
    days
}

pub fn assign_transport(island: &str, stop_count: usize, config: &PlannerConfig) -> &'static str {
    if stop_count >= config.day_cab_min_stops {
        TRANSPORT_DAY_CAB
    } else if config.is_leisure(island) {
        TRANSPORT_SCOOTER
    } else {
        TRANSPORT_POINT_TO_POINT
    }
}

fn ordered_island_groups<'a>(
    selected: &'a [PointOfInterest],
    start_from_hub: bool,
    config: &PlannerConfig,
) -> Vec<(String, Vec<&'a PointOfInterest>)> {
    let mut groups: Vec<(String, Vec<&PointOfInterest>)> = Vec::new();
    for stop in selected {
        match groups.iter_mut().find(|(island, _)| island == &stop.island) {
            Some((_, stops)) => stops.push(stop),
            None => groups.push((stop.island.clone(), vec![stop])),
        }
    }

    // Stable sort: unknown islands keep their first-seen order after the
    // canonical ones.
    groups.sort_by_key(|(island, _)| config.island_rank(island).unwrap_or(usize::MAX));

    if start_from_hub {
        match groups.iter().position(|(island, _)| island == &config.hub_island) {
            Some(position) => {
                let hub = groups.remove(position);
                groups.insert(0, hub);
            }
            None if config.hub_policy == HubStartPolicy::AlwaysPrepend => {
                groups.insert(0, (config.hub_island.clone(), Vec::new()));
            }
            None => {}
        }
    }

    groups
}

fn append_island_days(
    days: &mut Vec<DayPlan>,
    island: &str,
    stops: &[&PointOfInterest],
    config: &PlannerConfig,
) {
    if stops.is_empty() {
        // Only the prepended hub produces an empty group; it still gets a
        // free-standing day.
        days.push(visiting_day(island, &[], config));
        return;
    }

    let mut ordered: Vec<&PointOfInterest> = stops.to_vec();
    ordered.sort_by_key(|stop| time_of_day_rank(&stop.time_of_day));

    let mut bucket: Vec<&PointOfInterest> = Vec::new();
    let mut bucket_hours = 0.0;
    for stop in ordered {
        let over_stops = bucket.len() + 1 > config.max_stops_per_day;
        let over_hours = bucket_hours + stop.duration_hours > config.max_hours_per_day;
        // Checked before adding, so the overflowing stop opens the next day
        // and no day is ever emptied by the flush.
        if !bucket.is_empty() && (over_stops || over_hours) {
            days.push(visiting_day(island, &bucket, config));
            bucket.clear();
            bucket_hours = 0.0;
        }
        bucket_hours += stop.duration_hours;
        bucket.push(stop);
    }
    if !bucket.is_empty() {
        days.push(visiting_day(island, &bucket, config));
    }
}

fn visiting_day(island: &str, stops: &[&PointOfInterest], config: &PlannerConfig) -> DayPlan {
    let items = stops
        .iter()
        .map(|stop| DayItem::Location {
            id: stop.id.clone(),
            name: stop.name.clone(),
            duration_hours: stop.duration_hours,
            time_of_day: stop.time_of_day.clone(),
        })
        .collect();

    DayPlan {
        island: island.to_string(),
        items,
        transport: assign_transport(island, stops.len(), config).to_string(),
    }
}

fn arrival_day(config: &PlannerConfig) -> DayPlan {
    DayPlan {
        island: config.hub_island.clone(),
        items: vec![DayItem::Arrival, DayItem::Transfer],
        transport: TRANSPORT_NONE.to_string(),
    }
}

fn ferry_day(from: &str, to: &str, config: &PlannerConfig) -> DayPlan {
    DayPlan {
        island: to.to_string(),
        items: vec![DayItem::Ferry {
            from: from.to_string(),
            to: to.to_string(),
            window: config.ferry_window(from, to),
        }],
        transport: TRANSPORT_NONE.to_string(),
    }
}

fn departure_day(config: &PlannerConfig) -> DayPlan {
    DayPlan {
        island: config.hub_island.clone(),
        items: vec![DayItem::Departure],
        transport: TRANSPORT_NONE.to_string(),
    }
}

fn time_of_day_rank(tags: &[String]) -> u8 {
    let joined = tags.join(" ").to_lowercase();
    if joined.contains("morning") || joined.contains("sunrise") {
        0
    } else if joined.contains("afternoon") {
        1
    } else if joined.contains("evening") || joined.contains("sunset") {
        2
    } else {
        3
    }
}
