//! Terminal front-end for the enrolment dashboard.
//!
//! Reads one command per line from stdin and prints the dashboard whenever
//! the backend requests it triggered have finished. Type `help` for commands.
//!
//! Usage: `ENROLMENT_DASHBOARD_URL=http://localhost:8000 enrolment-dashboard`

use std::sync::Arc;

use tokio::io::BufReader;

use enrolment_dashboard::console;
use enrolment_dashboard::state::load_config;
use enrolment_dashboard::{BackendClient, DashboardBackend, DashboardSession, SessionOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config =
        load_config().map_err(|e| anyhow::anyhow!("Failed to load dashboard config: {e}"))?;
    log::info!("Using backend at {}", config.api_root());

    let client = BackendClient::new(&config)?;
    let backend: Arc<dyn DashboardBackend> = Arc::new(client);
    let mut session = DashboardSession::new(backend, SessionOptions::from(&config));

    session.mount();
    session.settle().await;

    let stdin = BufReader::new(tokio::io::stdin());
    console::run(&mut session, stdin, &mut std::io::stdout()).await?;
    Ok(())
}
