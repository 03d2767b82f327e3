use std::io;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use env_logger::Env;
use log::{error, info};

use fpv_blog_backend::config::AppConfig;
use fpv_blog_backend::middleware::cors::cors;
use fpv_blog_backend::middleware::not_found::not_found;
use fpv_blog_backend::router::index::routes;
use fpv_blog_backend::state::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        io::Error::other(e)
    })?;

    let state = AppState::build(&config).await.map_err(|e| {
        error!("Failed to initialize application: {}", e);
        io::Error::other(e)
    })?;

    info!(
        "Starting server on http://{}:{} ({})",
        config.host, config.port, config.environment
    );

    let server_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors(&server_config))
            .configure(|cfg| state.configure(cfg))
            .configure(routes)
            .default_service(web::to(not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    info!("Server has stopped");

    Ok(())
}
