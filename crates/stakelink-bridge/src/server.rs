//! HTTP front end
//!
//! - `POST /integration/uplink?event=up` receives network-server uplink events
//! - `POST /api/induction-lights/*` sends unicast control commands
//! - `POST /api/device/set-acceleration-mode` toggles acceleration detection
//! - `POST /api/multicast-groups/*` sends multicast control commands

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use stakelink_core::{UplinkEnvelope, UplinkFrame, UPLINK_EVENT};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::api::{
    AccelerationModeRequest, ApiResponse, CharacterFields, ColorFields, ControlRequest,
    FrequencyFields, JoinMulticastRequest, LevelFields, MannerFields, Multicast, OneOrMany,
    OverallFields, SwitchFields, Unicast,
};
use crate::config::BridgeSettings;
use crate::downlink::{DeliveryStatus, DownlinkSender};
use crate::registry::{CommandRegistry, DispatchOutcome, Dispatcher};
use crate::target::TargetResolver;
use crate::traits::{DeviceQueue, StatusSink};
use crate::{BridgeError, Result};

/// Shared, read-only state for all requests
pub struct AppState {
    pub resolver: TargetResolver,
    pub sender: DownlinkSender,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(
        resolver: TargetResolver,
        sender: DownlinkSender,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            resolver,
            sender,
            dispatcher,
        }
    }

    /// Wire the standard registry and resolver from settings
    pub fn from_settings(
        settings: &BridgeSettings,
        queue: Arc<dyn DeviceQueue>,
        status: Arc<dyn StatusSink>,
    ) -> Result<Self> {
        let registry = CommandRegistry::standard(queue.clone(), status, settings.time_offset()?);
        Ok(Self::new(
            TargetResolver::new(Arc::new(settings.group_map())),
            DownlinkSender::new(queue, settings.chirpstack.confirmed),
            Dispatcher::new(Arc::new(registry)),
        ))
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ApiResponse::error(code, self.to_string()))).into_response()
    }
}

impl From<JsonRejection> for BridgeError {
    fn from(rejection: JsonRejection) -> Self {
        BridgeError::MalformedInput(rejection.body_text())
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>, cors_enabled: bool) -> Router {
    let lights = Router::new()
        .route("/set-color", post(control::<Unicast<ColorFields>>))
        .route("/set-frequency", post(control::<Unicast<FrequencyFields>>))
        .route("/set-level", post(control::<Unicast<LevelFields>>))
        .route("/set-manner", post(control::<Unicast<MannerFields>>))
        .route("/set-switch", post(control::<Unicast<SwitchFields>>))
        .route("/overall-setting", post(control::<Unicast<OverallFields>>))
        .route("/set-multicast-group", post(control::<JoinMulticastRequest>));

    let groups = Router::new()
        .route("/set-color", post(control::<Multicast<ColorFields>>))
        .route("/set-frequency", post(control::<Multicast<FrequencyFields>>))
        .route("/set-level", post(control::<Multicast<LevelFields>>))
        .route("/set-manner", post(control::<Multicast<MannerFields>>))
        .route("/set-switch", post(control::<Multicast<SwitchFields>>))
        .route("/overall-setting", post(control::<Multicast<OverallFields>>))
        .route("/set-character", post(control::<Multicast<CharacterFields>>));

    let mut router = Router::new()
        .route("/integration/uplink", post(uplink))
        .route("/health", get(health_check))
        .nest("/api/induction-lights", lights)
        .nest("/api/multicast-groups", groups)
        .route(
            "/api/device/set-acceleration-mode",
            post(control::<AccelerationModeRequest>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }
    router
}

/// Serve `router` on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "stakelink",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
struct EventQuery {
    event: Option<String>,
}

async fn uplink(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventQuery>,
    body: std::result::Result<Json<UplinkEnvelope>, JsonRejection>,
) -> Result<Json<serde_json::Value>> {
    let event = query.event.unwrap_or_default();
    if event != UPLINK_EVENT {
        warn!("ignoring non-uplink event '{}'", event);
        return Ok(Json(serde_json::json!({ "message": "event ignored" })));
    }

    let Json(envelope) = body.map_err(|e| {
        error!("failed to parse uplink event: {}", e);
        BridgeError::from(e)
    })?;
    let frame = UplinkFrame::from_envelope(&envelope).map_err(|e| {
        error!(dev_eui = %envelope.device_info.dev_eui, "failed to decode uplink data: {}", e);
        BridgeError::from(e)
    })?;
    info!(dev_eui = %frame.device_id, len = frame.payload.len(), "uplink received");

    let outcome = match state.dispatcher.dispatch(&frame).await {
        DispatchOutcome::Handled(code) => format!("handled {}", code.name()),
        DispatchOutcome::Unrecognized(code) => format!("unknown command 0x{:02x}", code),
        DispatchOutcome::Failed { code, .. } => format!("{} failed", code.name()),
    };
    Ok(Json(serde_json::json!({ "message": outcome })))
}

/// Resolve, encode and enqueue a control request
///
/// Every entry is validated and resolved before the first downlink goes out.
async fn control<R>(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<OneOrMany<R>>, JsonRejection>,
) -> Result<Json<ApiResponse>>
where
    R: ControlRequest + DeserializeOwned + Send + 'static,
{
    let Json(requests) = body?;
    let requests = requests.into_vec();
    if requests.is_empty() {
        return Err(BridgeError::MalformedInput(
            "request body must contain at least one command".to_string(),
        ));
    }

    let mut plan = Vec::with_capacity(requests.len());
    for request in &requests {
        let command = request.command()?;
        let targets = state.resolver.resolve(&request.addressing())?;
        plan.push((command, targets));
    }

    let total: usize = plan.iter().map(|(_, targets)| targets.len()).sum();
    let mut outcomes = Vec::with_capacity(total);
    for (command, targets) in &plan {
        outcomes.extend(state.sender.send(targets, command).await);
    }

    if total == 1 {
        if let DeliveryStatus::Failed { error } = &outcomes[0].status {
            return Err(BridgeError::Downstream(error.clone()));
        }
    }

    let queued = outcomes.iter().filter(|o| o.is_queued()).count();
    let kind = plan[0].0.kind();
    Ok(Json(
        ApiResponse::ok(format!("{}: {} of {} downlinks queued", kind, queued, total))
            .with_outcomes(outcomes),
    ))
}
