use anyhow::Context;

use stockroom_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let session = stockroom_api::app::services::build_session(&config).await?;

    let outcome = session.start().await;
    if !outcome.is_success() {
        tracing::warn!(
            message = %outcome.message,
            "initial inventory listing failed; serving a stale view"
        );
    }

    let app = stockroom_api::app::build_app(session);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
