//! Orchestration layer between the HTTP/CLI surfaces and the pure planner
//! core. Owns the catalog, the reference tables, and the trip store; every
//! mutation loads the owned snapshot, reworks it, and persists it back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use atoll_catalog::Catalog;
use atoll_core::{
    cost_breakdown, generate, summarize, Activity, CostBreakdown, DayPlan, EditError, EditOp,
    EssentialsConfig, HotelChoice, PlannerConfig, TripSelection, TripState, TripSummary,
};
use atoll_observability::AppMetrics;
use atoll_storage::{TripRecord, TripRepository};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("trip {0} not found")]
    TripNotFound(String),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateTripRequest {
    pub selection: Option<TripSelection>,
    pub essentials: Option<EssentialsConfig>,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectionUpdate {
    pub location_ids: Vec<String>,
    pub start_from_hub: Option<bool>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PartyUpdate {
    pub adults: u32,
    pub infants: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HotelUpdate {
    pub island: String,
    pub hotel_id: String,
    pub name: String,
    pub nightly_rate: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivitiesUpdate {
    pub activity_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StartDateUpdate {
    pub start_date: Option<NaiveDate>,
}

/// One-shot planning input: everything the stateful trip flow collects,
/// in a single request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanRequest {
    pub selection: TripSelection,
    pub essentials: EssentialsConfig,
    pub hotels: HashMap<String, HotelChoice>,
    pub activity_ids: Vec<String>,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub days: Vec<DayPlan>,
    pub costs: CostBreakdown,
    pub summary: TripSummary,
}

/// Response snapshot for a stored trip. Days, costs, and the summary are
/// re-derived from the persisted state on every read.
#[derive(Debug, Clone, Serialize)]
pub struct TripView {
    pub trip_id: String,
    pub version: u64,
    pub selection: TripSelection,
    pub essentials: EssentialsConfig,
    pub hotel_choices: HashMap<String, HotelChoice>,
    pub activities: Vec<Activity>,
    pub start_date: Option<NaiveDate>,
    pub days: Vec<DayPlan>,
    pub costs: CostBreakdown,
    pub summary: TripSummary,
}

#[derive(Clone)]
pub struct TripService<S>
where
    S: TripRepository,
{
    catalog: Arc<Catalog>,
    config: PlannerConfig,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
    trip_ttl: Duration,
}

impl<S> TripService<S>
where
    S: TripRepository,
{
    pub fn new(
        catalog: Arc<Catalog>,
        config: PlannerConfig,
        store: Arc<S>,
        metrics: Arc<AppMetrics>,
        trip_ttl: Duration,
    ) -> Self {
        Self {
            catalog,
            config,
            store,
            metrics,
            trip_ttl,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    #[instrument(skip(self, request))]
    pub async fn plan_once(&self, request: PlanRequest) -> PlanResponse {
        let started = Instant::now();
        self.metrics.inc_request();

        let resolved = self.catalog.resolve_selection(&request.selection.location_ids);
        let days = generate(&resolved, request.selection.start_from_hub, &self.config);
        self.metrics.inc_plan_generated();

        let chosen = self.catalog.resolve_activities(&request.activity_ids);
        let costs = cost_breakdown(
            &days,
            &request.selection,
            &request.essentials,
            &request.hotels,
            &chosen,
            &self.config,
        );
        self.metrics.inc_cost_recompute();
        let summary = summarize(&days, request.start_date);

        self.metrics.observe_latency(started.elapsed());
        info!(
            selected = resolved.len(),
            days = days.len(),
            total = costs.total,
            "one-shot plan generated"
        );

        PlanResponse {
            days,
            costs,
            summary,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_trip(&self, request: CreateTripRequest) -> Result<TripView, ServiceError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let mut state = TripState::new(Uuid::new_v4().to_string());
        if let Some(mut selection) = request.selection {
            selection.location_ids = dedup_ids(&selection.location_ids);
            state.selection = selection;
        }
        if let Some(essentials) = request.essentials {
            state.essentials = essentials;
        }
        state.start_date = request.start_date;

        self.regenerate(&mut state);
        self.persist(&state).await?;

        self.metrics.observe_latency(started.elapsed());
        info!(trip_id = %state.trip_id, days = state.days.len(), "trip created");
        Ok(self.view(&state))
    }

    pub async fn get_trip(&self, trip_id: &str) -> Result<TripView, ServiceError> {
        self.metrics.inc_request();
        let state = self.load(trip_id).await?;
        Ok(self.view(&state))
    }

    pub async fn delete_trip(&self, trip_id: &str) -> Result<bool, ServiceError> {
        self.metrics.inc_request();
        Ok(self.store.delete_trip(trip_id).await?)
    }

    /// Replaces the generator inputs and regenerates the day list wholesale.
    /// Manual edits on the previous snapshot are discarded.
    #[instrument(skip(self, update))]
    pub async fn update_selection(
        &self,
        trip_id: &str,
        update: SelectionUpdate,
    ) -> Result<TripView, ServiceError> {
        self.metrics.inc_request();
        let mut state = self.load(trip_id).await?;

        state.selection.location_ids = dedup_ids(&update.location_ids);
        if let Some(start_from_hub) = update.start_from_hub {
            state.selection.start_from_hub = start_from_hub;
        }

        self.regenerate(&mut state);
        self.persist(&state).await?;
        info!(trip_id = %state.trip_id, version = state.version, "selection updated");
        Ok(self.view(&state))
    }

    pub async fn update_essentials(
        &self,
        trip_id: &str,
        essentials: EssentialsConfig,
    ) -> Result<TripView, ServiceError> {
        self.metrics.inc_request();
        let mut state = self.load(trip_id).await?;
        state.essentials = essentials;
        self.persist(&state).await?;
        Ok(self.view(&state))
    }

    pub async fn choose_hotel(
        &self,
        trip_id: &str,
        update: HotelUpdate,
    ) -> Result<TripView, ServiceError> {
        self.metrics.inc_request();
        let mut state = self.load(trip_id).await?;
        state.hotel_choices.insert(
            update.island,
            HotelChoice {
                hotel_id: update.hotel_id,
                name: update.name,
                nightly_rate: update.nightly_rate,
            },
        );
        self.persist(&state).await?;
        Ok(self.view(&state))
    }

    pub async fn set_party(
        &self,
        trip_id: &str,
        party: PartyUpdate,
    ) -> Result<TripView, ServiceError> {
        self.metrics.inc_request();
        let mut state = self.load(trip_id).await?;
        state.selection.adults = party.adults;
        state.selection.infants = party.infants;
        self.persist(&state).await?;
        Ok(self.view(&state))
    }

    /// Stores the catalog-resolved subset, dropping unknown ids.
    pub async fn set_activities(
        &self,
        trip_id: &str,
        update: ActivitiesUpdate,
    ) -> Result<TripView, ServiceError> {
        self.metrics.inc_request();
        let mut state = self.load(trip_id).await?;
        state.activity_ids = self
            .catalog
            .resolve_activities(&update.activity_ids)
            .into_iter()
            .map(|activity| activity.id)
            .collect();
        self.persist(&state).await?;
        Ok(self.view(&state))
    }

    pub async fn set_start_date(
        &self,
        trip_id: &str,
        update: StartDateUpdate,
    ) -> Result<TripView, ServiceError> {
        self.metrics.inc_request();
        let mut state = self.load(trip_id).await?;
        state.start_date = update.start_date;
        self.persist(&state).await?;
        Ok(self.view(&state))
    }

    #[instrument(skip(self, op))]
    pub async fn apply_edit(&self, trip_id: &str, op: EditOp) -> Result<TripView, ServiceError> {
        self.metrics.inc_request();
        let mut state = self.load(trip_id).await?;

        if let Err(error) = state.apply_edit(&op, &self.config) {
            self.metrics.inc_edit_rejected();
            return Err(ServiceError::Edit(error));
        }
        self.metrics.inc_edit_applied();

        self.persist(&state).await?;
        info!(trip_id = %state.trip_id, version = state.version, "edit applied");
        Ok(self.view(&state))
    }

    pub async fn purge_expired_trips(&self) -> Result<u64, ServiceError> {
        Ok(self.store.purge_expired(Utc::now()).await?)
    }

    fn regenerate(&self, state: &mut TripState) {
        let resolved = self.catalog.resolve_selection(&state.selection.location_ids);
        state.regenerate(&resolved, &self.config);
        self.metrics.inc_plan_generated();
    }

    async fn load(&self, trip_id: &str) -> Result<TripState, ServiceError> {
        let record = self
            .store
            .load_trip(trip_id)
            .await?
            .ok_or_else(|| ServiceError::TripNotFound(trip_id.to_string()))?;
        Ok(record.state)
    }

    async fn persist(&self, state: &TripState) -> Result<(), ServiceError> {
        let now = Utc::now();
        let record = TripRecord {
            state: state.clone(),
            updated_at: now,
            expires_at: now + self.trip_ttl,
        };
        self.store.upsert_trip(&record).await?;
        Ok(())
    }

    fn view(&self, state: &TripState) -> TripView {
        let activities = self.catalog.resolve_activities(&state.activity_ids);
        let costs = cost_breakdown(
            &state.days,
            &state.selection,
            &state.essentials,
            &state.hotel_choices,
            &activities,
            &self.config,
        );
        self.metrics.inc_cost_recompute();
        let summary = summarize(&state.days, state.start_date);

        TripView {
            trip_id: state.trip_id.clone(),
            version: state.version,
            selection: state.selection.clone(),
            essentials: state.essentials.clone(),
            hotel_choices: state.hotel_choices.clone(),
            activities,
            start_date: state.start_date,
            days: state.days.clone(),
            costs,
            summary,
        }
    }
}

fn dedup_ids(ids: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for id in ids {
        if !seen.iter().any(|known| known == id) {
            seen.push(id.clone());
        }
    }
    seen
}
