// REST adapter for the tracking endpoints
use crate::application::tracking_api::{RegistryFetchError, TrackingApi};
use crate::domain::position::{parse_timestamp, PositionSample};
use crate::domain::session::{SessionId, TrackingSession};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct RestTrackingApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SessionSnapshot {
    ejecucion_id: SessionId,
    conductor_nombre: String,
    camion_placa: String,
    sector: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    velocidad: Option<f64>,
    timestamp: String,
    estado: String,
}

#[derive(Debug, Deserialize)]
struct RouteHistoryResponse {
    #[serde(default)]
    puntos: Vec<RoutePoint>,
}

#[derive(Debug, Deserialize)]
struct RoutePoint {
    lat: f64,
    lon: f64,
    #[serde(default)]
    velocidad: Option<f64>,
    timestamp: String,
}

impl RestTrackingApi {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RegistryFetchError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| RegistryFetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RegistryFetchError::Status(response.status().as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RegistryFetchError::Decode(e.to_string()))
    }
}

fn snapshot_into_session(snapshot: SessionSnapshot) -> Option<TrackingSession> {
    let Some(last_update) = parse_timestamp(&snapshot.timestamp) else {
        tracing::warn!(
            session_id = %snapshot.ejecucion_id,
            raw = %snapshot.timestamp,
            "skipping active session with unreadable timestamp"
        );
        return None;
    };
    Some(TrackingSession {
        id: snapshot.ejecucion_id,
        driver_name: snapshot.conductor_nombre,
        vehicle_plate: snapshot.camion_placa,
        sector: snapshot.sector,
        lat: snapshot.lat,
        lon: snapshot.lon,
        speed: snapshot.velocidad,
        last_update,
        status: snapshot.estado,
    })
}

#[async_trait]
impl TrackingApi for RestTrackingApi {
    async fn active_sessions(&self) -> Result<Vec<TrackingSession>, RegistryFetchError> {
        let snapshots: Vec<SessionSnapshot> = self.get_json("/tracking/activos").await?;
        Ok(snapshots
            .into_iter()
            .filter_map(snapshot_into_session)
            .collect())
    }

    async fn route_history(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PositionSample>, RegistryFetchError> {
        let response: RouteHistoryResponse = self
            .get_json(&format!("/tracking/ruta/{session_id}"))
            .await?;
        Ok(response
            .puntos
            .into_iter()
            .filter_map(|point| {
                let timestamp = parse_timestamp(&point.timestamp)?;
                Some(PositionSample::new(
                    point.lat,
                    point.lon,
                    point.velocidad,
                    timestamp,
                ))
            })
            .collect())
    }
}
