use anyhow::{Context, Result};
use clap::Parser;
use sensor_inference::{cli, config, engine, models, registry, routes, state};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,sensor_inference=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Failed to bind sensor-inference listener on {addr}: port already in use. Stop the other service using this port or re-run with --bind to choose another address.",
            );
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to bind sensor-inference listener on {addr}"))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let mut config = config::Config::from_env()?;
    if let Some(bind) = args.bind {
        config.http_bind = bind;
    }
    if let Some(model_dir) = args.model_dir {
        config.model_dir = model_dir;
    }
    init_tracing()?;

    let registry = match &config.registry_path {
        Some(path) => registry::SensorRegistry::from_file(path)?,
        None => registry::SensorRegistry::reference(),
    };
    if args.print_registry {
        for sensor in registry.sensors() {
            println!("{sensor}");
        }
        return Ok(());
    }

    let snapshot = models::artifacts::ModelSnapshot::load(
        &registry,
        &config.artifact_paths(),
        config.n_lags,
        config.contamination,
    );
    let engine = engine::InferenceEngine::new(registry, config.engine_settings(), snapshot);
    if args.print_status {
        println!("{}", serde_json::to_string_pretty(&engine.status())?);
        return Ok(());
    }

    let state = state::AppState {
        engine: Arc::new(engine),
    };
    let mut app = routes::router(state);
    if config.cors_allow_any {
        app = app.layer(CorsLayer::permissive());
    }

    let listener = bind_listener(&config.http_bind).await?;
    tracing::info!(bind = %config.http_bind, "sensor-inference HTTP listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::bind_listener;
    use anyhow::Result;

    #[tokio::test]
    async fn reports_port_in_use_with_actionable_message() -> Result<()> {
        let listener = match std::net::TcpListener::bind("127.0.0.1:0") {
            Ok(listener) => listener,
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                // Sandbox environments can block binding attempts.
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let addr = listener.local_addr()?;

        let err = bind_listener(&addr.to_string()).await.unwrap_err();
        let message = err.to_string().to_lowercase();
        if message.contains("operation not permitted") {
            return Ok(());
        }

        assert!(message.contains(&addr.to_string()));
        assert!(message.contains("port already in use"));
        assert!(message.contains("--bind"));

        drop(listener);
        Ok(())
    }
}
