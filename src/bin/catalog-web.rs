use product_catalog::{
    app,
    client::ProductApiClient,
    config::WebConfig,
    web::{build_web, WebState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing();

    let config = WebConfig::from_env()?;
    let api = ProductApiClient::from_config(&config)?;
    tracing::info!(api = %config.api_base_url, "using product api");

    let router = build_web(WebState::new(api)?);
    app::serve(config.addr()?, router).await
}
