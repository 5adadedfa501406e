//! Cost aggregation over a generated itinerary: lodging, ferry transit,
//! ground transport, and add-on lines plus their exact sum.

use std::collections::HashMap;

use crate::config::PlannerConfig;
use crate::models::{
    ferry_leg_count, Activity, CostBreakdown, DayPlan, EssentialsConfig, FerryClass, HotelChoice,
    TripSelection, TRANSPORT_DAY_CAB, TRANSPORT_NONE, TRANSPORT_SCOOTER,
};

pub fn cost_breakdown(
    days: &[DayPlan],
    selection: &TripSelection,
    essentials: &EssentialsConfig,
    hotel_choices: &HashMap<String, HotelChoice>,
    chosen_activities: &[Activity],
    config: &PlannerConfig,
) -> CostBreakdown {
    let lodging = lodging_total(days, hotel_choices);
    let transit = transit_total(days, essentials.ferry_class, selection.adults, config);
    let ground = ground_total(days, essentials, config);
    let addons = addons_total(chosen_activities);

    CostBreakdown {
        lodging,
        transit,
        ground,
        addons,
        total: lodging + transit + ground + addons,
    }
}

pub fn lodging_total(days: &[DayPlan], hotel_choices: &HashMap<String, HotelChoice>) -> f64 {
    days.iter()
        .filter(|day| !day.is_transit())
        .map(|day| {
            hotel_choices
                .get(&day.island)
                .map(|choice| choice.nightly_rate.max(0.0))
                .unwrap_or(0.0)
        })
        .sum()
}

pub fn transit_total(
    days: &[DayPlan],
    ferry_class: FerryClass,
    adults: u32,
    config: &PlannerConfig,
) -> f64 {
    let legs = ferry_leg_count(days);
    let multiplier = config.ferry_class_multipliers.for_class(ferry_class);
    legs as f64 * config.ferry_base_fare * multiplier * adults.max(1) as f64
}

pub fn ground_total(days: &[DayPlan], essentials: &EssentialsConfig, config: &PlannerConfig) -> f64 {
    days.iter()
        .filter(|day| !day.is_transit() && day.transport != TRANSPORT_NONE)
        .map(|day| {
            if essentials.flat_islands.iter().any(|island| island == &day.island) {
                config.flat_day_rate
            } else if day.transport == TRANSPORT_DAY_CAB {
                config.vehicle_day_rate(&essentials.vehicle_id)
            } else if day.transport == TRANSPORT_SCOOTER {
                config.scooter_day_rate
            } else {
                // Point-to-Point and any user-entered label price per hop.
                day.stop_count().saturating_sub(1).max(1) as f64 * config.point_to_point_rate
            }
        })
        .sum()
}

pub fn addons_total(chosen_activities: &[Activity]) -> f64 {
    chosen_activities
        .iter()
        .map(|activity| activity.price.max(0.0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::generate;
    use crate::models::PointOfInterest;

    fn stop(id: &str, island: &str, hours: f64) -> PointOfInterest {
        PointOfInterest {
            id: id.to_string(),
            name: id.to_string(),
            island: island.to_string(),
            duration_hours: hours,
            time_of_day: vec![],
            moods: vec!["balanced".to_string()],
            description: None,
            image: None,
        }
    }

    fn hotel(island: &str, rate: f64) -> (String, HotelChoice) {
        (
            island.to_string(),
            HotelChoice {
                hotel_id: format!("{}-hotel", island.to_lowercase()),
                name: format!("{island} Stay"),
                nightly_rate: rate,
            },
        )
    }

    fn selection(adults: u32, infants: u32) -> TripSelection {
        TripSelection {
            location_ids: vec![],
            start_from_hub: true,
            adults,
            infants,
        }
    }

    #[test]
    fn empty_selection_costs_nothing() {
        let config = PlannerConfig::default();
        let days = generate(&[], true, &config);
        let breakdown = cost_breakdown(
            &days,
            &selection(2, 1),
            &EssentialsConfig::default(),
            &HashMap::new(),
            &[],
            &config,
        );
        assert_eq!(breakdown.lodging, 0.0);
        assert_eq!(breakdown.transit, 0.0);
        assert_eq!(breakdown.ground, 0.0);
        assert_eq!(breakdown.addons, 0.0);
        assert_eq!(breakdown.total, 0.0);
    }

    #[test]
    fn transit_scales_with_adults_and_ignores_infants() {
        let config = PlannerConfig::default();
        let selected = vec![stop("r1", "Havelock", 2.0)];
        let days = generate(&selected, false, &config);
        assert_eq!(ferry_leg_count(&days), 1);

        let one = transit_total(&days, FerryClass::Economy, 1, &config);
        let three = transit_total(&days, FerryClass::Economy, 3, &config);
        assert_eq!(one, 1150.0);
        assert_eq!(three, one * 3.0);
        // Zero adults still pays for one seat.
        assert_eq!(transit_total(&days, FerryClass::Economy, 0, &config), one);

        let breakdown_no_infants = cost_breakdown(
            &days,
            &selection(2, 0),
            &EssentialsConfig::default(),
            &HashMap::new(),
            &[],
            &config,
        );
        let breakdown_with_infants = cost_breakdown(
            &days,
            &selection(2, 4),
            &EssentialsConfig::default(),
            &HashMap::new(),
            &[],
            &config,
        );
        assert_eq!(breakdown_no_infants.transit, breakdown_with_infants.transit);
    }

    #[test]
    fn ferry_class_multiplier_applies() {
        let config = PlannerConfig::default();
        let selected = vec![stop("r1", "Havelock", 2.0)];
        let days = generate(&selected, false, &config);
        let economy = transit_total(&days, FerryClass::Economy, 2, &config);
        let deluxe = transit_total(&days, FerryClass::Deluxe, 2, &config);
        let luxury = transit_total(&days, FerryClass::Luxury, 2, &config);
        assert_eq!(deluxe, economy * 1.4);
        assert_eq!(luxury, economy * 1.9);
    }

    #[test]
    fn lodging_counts_non_transit_nights_per_island() {
        let config = PlannerConfig::default();
        let selected = vec![
            stop("pb1", "Port Blair", 2.0),
            stop("pb2", "Port Blair", 2.0),
            stop("h1", "Havelock", 6.0),
            stop("h2", "Havelock", 6.0),
        ];
        let days = generate(&selected, true, &config);
        // Arrival night + one visiting day at the hub, two visiting days on
        // Havelock (the 6h stops cannot share a day).
        let choices: HashMap<_, _> =
            vec![hotel("Port Blair", 3000.0), hotel("Havelock", 5000.0)]
                .into_iter()
                .collect();
        assert_eq!(lodging_total(&days, &choices), 2.0 * 3000.0 + 2.0 * 5000.0);

        let hub_only: HashMap<_, _> = vec![hotel("Port Blair", 3000.0)].into_iter().collect();
        assert_eq!(lodging_total(&days, &hub_only), 2.0 * 3000.0);
    }

    #[test]
    fn negative_hotel_rate_is_clamped() {
        let config = PlannerConfig::default();
        let days = generate(&[stop("pb1", "Port Blair", 2.0)], true, &config);
        let choices: HashMap<_, _> = vec![hotel("Port Blair", -500.0)].into_iter().collect();
        assert_eq!(lodging_total(&days, &choices), 0.0);
    }

    #[test]
    fn ground_rates_follow_transport_modes() {
        let config = PlannerConfig::default();
        let essentials = EssentialsConfig::default();

        // Three stops on the hub: Day Cab with the default vehicle.
        let cab_days = generate(
            &[
                stop("a", "Port Blair", 1.0),
                stop("b", "Port Blair", 1.0),
                stop("c", "Port Blair", 1.0),
            ],
            true,
            &config,
        );
        assert_eq!(ground_total(&cab_days, &essentials, &config), 2500.0);

        let chosen_vehicle = EssentialsConfig {
            vehicle_id: "innova".to_string(),
            ..EssentialsConfig::default()
        };
        assert_eq!(ground_total(&cab_days, &chosen_vehicle, &config), 3500.0);

        let unknown_vehicle = EssentialsConfig {
            vehicle_id: "rickshaw-deluxe".to_string(),
            ..EssentialsConfig::default()
        };
        assert_eq!(ground_total(&cab_days, &unknown_vehicle, &config), 2500.0);

        // Two stops on Havelock ride a scooter.
        let scooter_days = generate(
            &[stop("h1", "Havelock", 1.0), stop("h2", "Havelock", 1.0)],
            false,
            &config,
        );
        assert_eq!(ground_total(&scooter_days, &essentials, &config), 500.0);

        // Two stops on Baratang pay one hop between them.
        let hop_days = generate(
            &[stop("b1", "Baratang", 1.0), stop("b2", "Baratang", 1.0)],
            false,
            &config,
        );
        assert_eq!(ground_total(&hop_days, &essentials, &config), 400.0);

        // A single stop still pays one hop.
        let single_days = generate(&[stop("b1", "Baratang", 1.0)], false, &config);
        assert_eq!(ground_total(&single_days, &essentials, &config), 400.0);
    }

    #[test]
    fn flat_islands_override_the_mode_rate() {
        let config = PlannerConfig::default();
        let essentials = EssentialsConfig {
            flat_islands: vec!["Havelock".to_string()],
            ..EssentialsConfig::default()
        };
        let days = generate(
            &[stop("h1", "Havelock", 1.0), stop("h2", "Havelock", 1.0)],
            false,
            &config,
        );
        assert_eq!(ground_total(&days, &essentials, &config), 800.0);
    }

    #[test]
    fn addons_sum_chosen_activity_prices() {
        let chosen = vec![
            Activity {
                id: "scuba".to_string(),
                name: "Scuba Dive".to_string(),
                price: 4500.0,
                description: None,
            },
            Activity {
                id: "sea-walk".to_string(),
                name: "Sea Walk".to_string(),
                price: 3500.0,
                description: None,
            },
        ];
        assert_eq!(addons_total(&chosen), 8000.0);
        assert_eq!(addons_total(&[]), 0.0);
    }

    #[test]
    fn grand_total_is_the_exact_sum() {
        let config = PlannerConfig::default();
        let selected = vec![
            stop("pb1", "Port Blair", 2.0),
            stop("pb2", "Port Blair", 2.0),
            stop("pb3", "Port Blair", 2.0),
            stop("h1", "Havelock", 3.0),
        ];
        let days = generate(&selected, true, &config);
        let choices: HashMap<_, _> = vec![hotel("Havelock", 4200.0)].into_iter().collect();
        let chosen = vec![Activity {
            id: "kayak".to_string(),
            name: "Mangrove Kayaking".to_string(),
            price: 2000.0,
            description: None,
        }];
        let essentials = EssentialsConfig {
            ferry_class: FerryClass::Deluxe,
            ..EssentialsConfig::default()
        };
        let breakdown = cost_breakdown(&days, &selection(2, 1), &essentials, &choices, &chosen, &config);
        assert_eq!(
            breakdown.total,
            breakdown.lodging + breakdown.transit + breakdown.ground + breakdown.addons
        );
        assert_eq!(breakdown.lodging, 4200.0);
        assert_eq!(breakdown.transit, 2.0 * 1150.0 * 1.4 * 2.0);
        assert_eq!(breakdown.addons, 2000.0);
    }
}
