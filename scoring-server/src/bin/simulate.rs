//! Traffic simulator
//!
//! Replays random rows of the raw dataset (label dropped) against the
//! scoring API to mimic a live transaction stream.

use std::env;
use std::time::Duration;

use anyhow::Context;
use rand::Rng;
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fraud_core::logic::dataset::load_csv;
use fraud_core::{FraudConfig, Transaction};

const DEFAULT_API_URL: &str = "http://localhost:5001/predict";
const CONNECT_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct PredictResponse {
    fraud_score: f64,
    alert: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "simulate=info,fraud_core=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = FraudConfig::from_env().context("Invalid configuration")?;
    let api_url = env::var("SIMULATOR_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let max_requests: Option<u64> = env::var("SIMULATOR_MAX_REQUESTS").ok().and_then(|v| v.parse().ok());

    tracing::info!("Loading data from {} for simulation...", config.data.raw_file.display());
    let dataset = load_csv(&config.data.raw_file, &config.data.label_column)
        .context("Failed to load simulation dataset")?;
    let names = dataset.layout.names().to_vec();

    let client = reqwest::Client::new();
    tracing::info!("🚀 Starting traffic simulation against {}... Press Ctrl+C to stop.", api_url);

    let mut sent = 0u64;
    while max_requests.map_or(true, |max| sent < max) {
        let (index, pause) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(0..dataset.len()), rng.gen_range(0.1..=1.0))
        };
        let transaction = Transaction::from_pairs(names.iter().cloned().zip(dataset.rows[index].iter().copied()));

        match client.post(&api_url).json(&transaction).send().await {
            Ok(response) if response.status().is_success() => {
                let result: PredictResponse = response.json().await.context("Unexpected response body")?;
                let status = if result.alert { "🔴 FRAUD DETECTED" } else { "🟢 Normal" };
                tracing::info!("Sent ID {} | Score: {:.4} | {}", index, result.fraud_score, status);
            }
            Ok(response) => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                tracing::error!("API Error: {} - {}", status, text);
            }
            Err(e) if e.is_connect() => {
                tracing::error!("Could not connect to API. Is it running?");
                tokio::time::sleep(CONNECT_BACKOFF).await;
            }
            Err(e) => tracing::error!("Request failed: {}", e),
        }

        sent += 1;
        tokio::time::sleep(Duration::from_secs_f64(pause)).await;
    }

    tracing::info!("Simulation stopped after {} requests", sent);
    Ok(())
}
