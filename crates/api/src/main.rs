//! Service entry point: REST server plus the broker consumer loop.

use api::config::Config;
use consumer::{Consumer, InMemoryBroker, MessageRouter};
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Create stores and application state
    let state = api::create_default_state();

    // 4. Start the broker consumer against the same services
    let broker = InMemoryBroker::new(config.request_topic.clone());
    let router = MessageRouter::new(state.interactions.clone(), state.conversations.clone());
    let message_consumer = Consumer::new(broker.clone(), broker.clone(), router)
        .with_fetch_backoff(config.fetch_backoff);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tracing::info!(
        request_topic = %config.request_topic,
        response_topic = %config.response_topic,
        consumer_group = %config.consumer_group,
        "starting broker consumer"
    );
    let consumer_task = tokio::spawn(async move { message_consumer.run(shutdown_rx).await });

    // 5. Build and serve the application
    let app = api::create_app(state, metrics_handle);
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 6. Stop the consumer loop before exiting
    let _ = shutdown_tx.send(true);
    let _ = consumer_task.await;

    tracing::info!("server shut down gracefully");
}
