use anyhow::anyhow;
use rocket::http::Status;
use rocket::serde::json::{json, Json, Value};
use rocket::{get, post, routes, Build, Rocket, State};
use tracing::{error, info};

use common::ServerConfig;

use crate::models::AggregatorMessage;
use crate::worker::RunQueue;

/// Application state stored inside Rocket managed state.
pub struct AppState {
    pub queue: RunQueue,
}

impl AppState {
    pub fn new(queue: RunQueue) -> Self {
        Self { queue }
    }
}

#[get("/")]
async fn root() -> Value {
    json!({ "Hello": "World" })
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Entry point for aggregator batches. The run happens in the background;
/// the caller only gets an acknowledgment.
#[post("/subscriber/update", data = "<message>")]
async fn update_from_publisher(state: &State<AppState>, message: Json<AggregatorMessage>) -> Result<Value, Status> {
    let message = message.into_inner();
    info!("Received message with {} source ids", message.source_ids.len());

    if let Err(e) = state.queue.enqueue(message.source_ids) {
        error!(%e, "failed to schedule pipeline run");
        return Err(Status::ServiceUnavailable);
    }

    Ok(json!({ "message": "Annotations in progress" }))
}

/// Assemble the Rocket instance without launching it.
pub fn build_rocket(state: AppState, server: &ServerConfig) -> Rocket<Build> {
    let fig = rocket::Config::figment()
        .merge(("address", server.address.clone()))
        .merge(("port", server.port));

    rocket::custom(fig)
        .manage(state)
        .mount("/", routes![root, health, update_from_publisher])
}

/// Launch the HTTP ingress; returns when Rocket shuts down.
pub async fn launch_rocket(state: AppState, server: &ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Rocket HTTP server on {}:{}", server.address, server.port);
    build_rocket(state, server)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
