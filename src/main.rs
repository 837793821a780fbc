use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;

mod api;
mod chat;
mod config;
mod context;
mod docs;
mod model;
mod notify;
mod report;
mod review;
mod routes;
mod store;

use chat::ChatEngine;
use config::Config;
use context::AppContext;
use notify::{Notifier, webhook::WebhookNotifier};
use report::{PlainTextRenderer, ReportService};
use review::ReviewService;
use store::{RecordStore, mysql::MySqlStore};

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "leavedesk.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    info!("Server starting...");

    let mysql = MySqlStore::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    let pool = mysql.pool().clone();

    let store: Arc<dyn RecordStore> = Arc::new(mysql);
    let notifier: Arc<dyn Notifier> = Arc::new(WebhookNotifier::new(config.notify_url.clone()));

    let ctx = Data::new(AppContext {
        chat: ChatEngine::new(store.clone(), notifier.clone(), config.hr_chat_id),
        review: ReviewService::new(store.clone(), notifier),
        reports: ReportService::new(store, Arc::new(PlainTextRenderer)),
    });

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(ctx.clone())
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    info!("Server stopped, closing store connections");
    pool.close().await;
    Ok(())
}
