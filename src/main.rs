//! CareBook server binary.
//!
//! Resolves configuration from the environment once at startup, wires the
//! in-process collaborators into the core services, and serves the REST API.
//!
//! # Environment Variables
//! - `CAREBOOK_ADDR`: server address (default: "0.0.0.0:3000")
//! - `CAREBOOK_CLINIC_NAME`: name used to brand notifications (default: "CareBook")
//! - `CAREBOOK_ADMIN_PASSKEY`: passkey for the admin surface; unset locks it
//! - `CAREBOOK_STORAGE_ENDPOINT`: base URL for stored-file view links

use carebook_core::constants::USERS_COLLECTION;
use carebook_core::{AppConfig, AppointmentService, PatientDirectory};
use carebook_rest::{router, AppState};
use carebook_store::{LogSender, MemoryFileStore, MemoryStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("carebook=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CAREBOOK_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let clinic_name = std::env::var("CAREBOOK_CLINIC_NAME").unwrap_or_else(|_| "CareBook".into());
    let storage_endpoint = std::env::var("CAREBOOK_STORAGE_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:3000/storage".into());
    let admin_passkey = std::env::var("CAREBOOK_ADMIN_PASSKEY").ok();
    if admin_passkey.is_none() {
        tracing::warn!("CAREBOOK_ADMIN_PASSKEY not set; admin endpoints are locked");
    }

    let cfg = Arc::new(AppConfig::new(clinic_name, admin_passkey, storage_endpoint)?);

    let store = Arc::new(MemoryStore::new().with_unique_key(USERS_COLLECTION, "email"));
    let files = Arc::new(MemoryFileStore::new(cfg.storage_endpoint()));
    let messages = Arc::new(LogSender::new());

    let state = AppState {
        directory: Arc::new(PatientDirectory::new(store.clone(), files)),
        appointments: Arc::new(AppointmentService::new(
            store,
            messages,
            cfg.clinic_name(),
        )),
        cfg,
    };

    tracing::info!("-- Starting CareBook REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
