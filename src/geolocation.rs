//! Best-effort device position.
//!
//! Resolution runs once at start-up in the background. Submissions never wait
//! for it; they read whatever [`CurrentPosition`] holds at that moment.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::events::GridEvent;
use crate::model::GeoPoint;
use crate::runtime::GridRuntime;
use crate::settings::schema::GeolocationSettings;

/// Source of the device coordinate.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self) -> Result<GeoPoint>;

    fn description(&self) -> String;
}

/// Last known device position. `None` until resolution settles.
#[derive(Debug, Default)]
pub struct CurrentPosition {
    inner: RwLock<Option<GeoPoint>>,
}

impl CurrentPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<GeoPoint> {
        *self.inner.read()
    }

    /// Current position, or the origin if nothing was resolved yet.
    pub fn or_origin(&self) -> GeoPoint {
        self.get().unwrap_or(GeoPoint::ORIGIN)
    }

    pub fn set(&self, point: GeoPoint) {
        *self.inner.write() = Some(point);
    }
}

/// IP-based lookup against a JSON endpoint.
pub struct IpLocator {
    http: reqwest::Client,
    endpoint: String,
}

/// Accepts both `latitude`/`longitude` and `lat`/`lon` field names.
#[derive(Debug, Deserialize)]
struct IpLookup {
    #[serde(alias = "lat")]
    latitude: Option<f64>,
    #[serde(alias = "lon")]
    longitude: Option<f64>,
}

impl IpLocator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build geolocation HTTP client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

fn point_from_lookup(lookup: IpLookup) -> Result<GeoPoint> {
    let (Some(lat), Some(lng)) = (lookup.latitude, lookup.longitude) else {
        anyhow::bail!("Geolocation response has no coordinates");
    };
    let point = GeoPoint::new(lat, lng);
    if !point.is_valid() {
        anyhow::bail!("Geolocation returned out-of-range coordinate {:?}", point);
    }
    Ok(point)
}

#[async_trait]
impl GeoLocator for IpLocator {
    async fn locate(&self) -> Result<GeoPoint> {
        let response = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .context("Geolocation request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Geolocation endpoint returned {}", response.status());
        }

        let lookup: IpLookup = response
            .json()
            .await
            .context("Failed to parse geolocation response")?;
        point_from_lookup(lookup)
    }

    fn description(&self) -> String {
        format!("IP lookup ({})", self.endpoint)
    }
}

/// Locator that answers with a configured coordinate.
pub struct FixedLocator {
    position: Option<GeoPoint>,
}

impl FixedLocator {
    pub fn new(position: Option<GeoPoint>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeoLocator for FixedLocator {
    async fn locate(&self) -> Result<GeoPoint> {
        self.position
            .filter(GeoPoint::is_valid)
            .ok_or_else(|| anyhow::anyhow!("No valid fixed position configured"))
    }

    fn description(&self) -> String {
        "Fixed position".to_string()
    }
}

/// Build the locator named in settings.
pub fn create_locator(settings: &GeolocationSettings) -> Result<Arc<dyn GeoLocator>> {
    match settings.provider.as_str() {
        "ip" => Ok(Arc::new(IpLocator::new(
            settings.endpoint.clone(),
            Duration::from_secs(settings.timeout_secs),
        )?)),
        "fixed" => Ok(Arc::new(FixedLocator::new(settings.position))),
        other => anyhow::bail!("Unknown geolocation provider '{}'", other),
    }
}

/// Resolve once in the background. Failure stores `fallback`.
pub fn spawn_resolution(
    locator: Arc<dyn GeoLocator>,
    position: Arc<CurrentPosition>,
    fallback: GeoPoint,
    runtime: Arc<dyn GridRuntime>,
) -> JoinHandle<GeoPoint> {
    tokio::spawn(async move {
        let (point, is_fallback) = match locator.locate().await {
            Ok(point) => {
                tracing::info!("[geo] Resolved position via {}: {:?}", locator.description(), point);
                (point, false)
            }
            Err(e) => {
                tracing::warn!("[geo] Resolution failed, using fallback {:?}: {:#}", fallback, e);
                (fallback, true)
            }
        };

        position.set(point);
        if let Err(e) = runtime.emit(GridEvent::PositionResolved {
            lat: point.lat,
            lng: point.lng,
            fallback: is_fallback,
        }) {
            tracing::debug!("[geo] Failed to emit position event: {}", e);
        }
        point
    })
}
