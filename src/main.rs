mod baas;
mod config;
mod routes;
mod services;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env().expect("invalid configuration");
    let port = config.port;

    let baas = baas::BaasClient::new(&config.baas_url, config.anon_key.clone(), config.timeouts)
        .expect("backend client init failed");
    let state = state::AppState::new(Arc::new(baas), config);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "eventsphere listening");
    axum::serve(listener, app).await.expect("server failed");
}
