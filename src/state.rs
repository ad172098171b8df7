use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::geolocation::{create_locator, spawn_resolution, CurrentPosition};
use crate::model::GeoPoint;
use crate::notifications::NotificationCenter;
use crate::oracle::Oracle;
use crate::pipeline::SubmissionPipeline;
use crate::population;
use crate::runtime::GridRuntime;
use crate::settings::schema::{GeolocationSettings, PopulationSettings};
use crate::settings::GridSettings;
use crate::store::GridStore;

/// Everything a front end needs to drive the grid.
pub struct AppState {
    pub store: Arc<GridStore>,
    pub position: Arc<CurrentPosition>,
    pub notifications: Arc<NotificationCenter>,
    pub pipeline: Arc<SubmissionPipeline>,
    pub oracle: Arc<dyn Oracle>,
    pub runtime: Arc<dyn GridRuntime>,
}

impl AppState {
    pub fn new(settings: &GridSettings, oracle: Arc<dyn Oracle>, runtime: Arc<dyn GridRuntime>) -> Self {
        let store = Arc::new(GridStore::new());
        let position = Arc::new(CurrentPosition::new());
        let notifications = Arc::new(NotificationCenter::new(
            store.clone(),
            runtime.clone(),
            Duration::from_millis(settings.notifications.expiry_ms),
        ));
        let pipeline = Arc::new(SubmissionPipeline::new(
            store.clone(),
            oracle.clone(),
            notifications.clone(),
            position.clone(),
            runtime.clone(),
            settings.submission.clone(),
        ));

        Self {
            store,
            position,
            notifications,
            pipeline,
            oracle,
            runtime,
        }
    }

    /// Generate the mock population and seed it. Returns the actor count afterwards.
    pub fn seed_population(&self, settings: &PopulationSettings) -> usize {
        let actors = population::generate(settings);
        let with_insights = actors.iter().filter(|a| !a.insights.is_empty()).count();
        tracing::info!(
            "[state] Seeding {} actors ({} with insights)",
            actors.len(),
            with_insights
        );
        self.store.seed(actors);
        self.store.summary().actors
    }

    /// Kick off background position resolution.
    ///
    /// Returns `None` when geolocation is disabled; submissions then stay at the origin.
    pub fn start_geolocation(&self, settings: &GeolocationSettings) -> Option<JoinHandle<GeoPoint>> {
        if !settings.enabled {
            tracing::info!("[state] Geolocation disabled");
            return None;
        }

        match create_locator(settings) {
            Ok(locator) => Some(spawn_resolution(
                locator,
                self.position.clone(),
                settings.fallback,
                self.runtime.clone(),
            )),
            Err(e) => {
                tracing::warn!("[state] Geolocation unavailable, using fallback: {:#}", e);
                self.position.set(settings.fallback);
                None
            }
        }
    }
}
