//! # irrihubd: irrihub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and install logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Load the runtime configuration (strategy, policies, override, devices)
//! - Start the controller task and the MQTT event loop
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (Ctrl-C)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use irrihub_adapter_http_axum::state::AppState;
use irrihub_adapter_storage_sqlite_sqlx::{SqliteConfigStore, SqliteHistoryLog};
use irrihub_app::controller::Controller;
use irrihub_app::event_bus::InProcessEventBus;
use irrihub_app::ports::{Clock, SystemClock};
use irrihub_app::state::Configuration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = irrihub_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let config_store = Arc::new(SqliteConfigStore::new(db.pool().clone()));
    let history = Arc::new(SqliteHistoryLog::new(db.pool().clone()));

    // Runtime configuration
    let configuration = Configuration::load(&config_store, SystemClock.now()).await?;

    // Controller and transport
    let (transport, mqtt_loop) = irrihub_adapter_mqtt::connect(&config.mqtt);
    let event_bus = Arc::new(InProcessEventBus::new(config.controller.event_bus_capacity));
    let (controller, handle) = Controller::new(
        configuration,
        transport,
        Arc::clone(&event_bus),
        config_store,
        Arc::clone(&history),
        SystemClock,
        config.controller.channel_capacity,
    );
    let controller_task = tokio::spawn(controller.run());
    let mqtt_task = tokio::spawn(mqtt_loop.run(handle.clone()));
    tracing::info!(
        broker_host = %config.mqtt.broker_host,
        broker_port = config.mqtt.broker_port,
        "mqtt transport started"
    );

    // HTTP
    let app = irrihub_adapter_http_axum::router::build(AppState::new(handle, event_bus, history));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "irrihubd listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // the event loop holds the last controller handle
    mqtt_task.abort();
    let _ = mqtt_task.await;
    controller_task.await?;
    tracing::info!("irrihubd stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
