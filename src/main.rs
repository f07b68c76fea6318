use product_catalog::{app, config::AppConfig, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing();

    let config = AppConfig::from_env()?;
    let state = AppState::init(&config).await?;

    // Schema errors abort startup.
    db::init_schema(state.store.as_ref()).await?;

    let router = app::build_app(state);
    app::serve(config.addr()?, router).await
}
