pub mod config;
pub mod costs;
pub mod itinerary;
pub mod models;
pub mod normalize;
pub mod trip;

pub use config::{
    FerryClassMultipliers, FerryWindow, HubStartPolicy, PlannerConfig, VehicleRate,
    DEFAULT_HUB_ISLAND,
};
pub use costs::{addons_total, cost_breakdown, ground_total, lodging_total, transit_total};
pub use itinerary::{assign_transport, generate};
pub use models::*;
pub use normalize::{
    coerce_number, infer_moods, normalize_activity, normalize_location, slugify,
    DEFAULT_DURATION_HOURS,
};
pub use trip::{summarize, EditError, EditOp, IslandNights, MoveDirection, TripState, TripSummary};
