mod config;
mod error;
mod services;
mod storage;

use crate::config::Config;
use crate::storage::Database;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::load().map_err(io::Error::other)?;
    let db = Database::open(&config.db_path).map_err(io::Error::other)?;
    let roster_len = db.roster_len().await.map_err(io::Error::other)?;
    info!("Roster holds {} records", roster_len);

    let bind = (config.host.clone(), config.port);
    let body_limit = config.body_limit;
    info!("Server running at http://{}:{}", bind.0, bind.1);

    let app_config = web::Data::new(config);
    let app_db = db.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(services::json_config(body_limit))
            .app_data(web::Data::new(app_db.clone()))
            .app_data(app_config.clone())
            .service(services::roster::configure_routes())
            .service(services::scans::configure_routes())
    })
        .bind(bind)?
        .run()
        .await?;

    info!("Server stopped, closing database");
    db.close().await.map_err(io::Error::other)
}
