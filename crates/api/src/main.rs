use std::sync::Arc;

use anyhow::Context;

use pantry_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    pantry_observability::init(config.log_format);

    if config.uses_dev_jwt_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }
    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            tracing::error!(%problem, "configuration problem");
        }
        anyhow::bail!("configuration has {} problem(s)", problems.len());
    }

    let config = Arc::new(config);
    let app = pantry_api::app::build_app(config.clone()).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
