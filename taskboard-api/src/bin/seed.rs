//! # Taskboard Seeder
//!
//! Loads the demo data set (5 users, 3 projects, 12 tasks) into the
//! configured store. Every seeded user gets the password from
//! `SEED_PASSWORD`. Does nothing if the store already has users.
//!
//! ```bash
//! SEED_PASSWORD=changeme cargo run -p taskboard-api --bin taskboard-seed
//! ```

use taskboard_api::app::connect_store;
use taskboard_api::config::Config;
use taskboard_shared::board::Board;
use taskboard_shared::seed::seed_demo_data;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_shared=info,taskboard_seed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let password = std::env::var("SEED_PASSWORD")
        .map_err(|_| anyhow::anyhow!("SEED_PASSWORD environment variable is required"))?;

    let (store, pg) = connect_store(&config).await?;
    let board = Board::new(store, config.board_config());

    let report = seed_demo_data(&board, &password).await?;
    if report.skipped {
        tracing::info!("Store already populated, nothing to do");
    } else {
        tracing::info!(
            users = report.users,
            projects = report.projects,
            tasks = report.tasks,
            "Seed complete"
        );
    }

    if let Some(pg) = pg {
        pg.close().await;
    }

    Ok(())
}
