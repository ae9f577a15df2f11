use anyhow::Result;
use envconfig::Envconfig;
use streamer_links::app::{router, AppState};
use streamer_links::config::Config;

async fn listen(app: axum::Router, bind: String) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::init_from_env()?;
    streamer_links::trace::init(&config.log_level)?;

    let bind = config.bind();
    let state = AppState::from_config(config)?;
    let app = router(state);

    if let Err(e) = listen(app, bind).await {
        tracing::error!("failed to start http server, {}", e);
        return Err(e);
    }
    Ok(())
}
