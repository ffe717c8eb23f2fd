use salon_booking::{db, AppState, Config};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    log::info!("Opening store at {}", config.database_url);
    let state = AppState::connect(config).await?;

    if state.config.seed {
        if db::seed_defaults(&state.db).await? {
            state.log_activity("seeded", "Demo salon data loaded.", None).await;
        }
    } else {
        log::info!("SALON_SEED not set, leaving store contents as they are");
    }

    state.log_activity("migrated", "Store schema is up to date.", None).await;
    state.db.close().await;
    Ok(())
}
