use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};

use privatenote::{
    auth::UpdateAuthenticator,
    config::Config,
    handlers,
    store::postgres::{self, PgNoteStore},
    AppState,
};

fn cors(frontend_origin: Option<&str>) -> Cors {
    let cors = match frontend_origin {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allow_any_origin(),
    };
    cors.allowed_methods(vec!["GET", "POST", "PUT"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::LOCATION])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(io::Error::other)?;
    let pool = postgres::connect(&config.database_url, config.pool_size).map_err(io::Error::other)?;
    postgres::run_migrations(&pool).map_err(io::Error::other)?;

    if config.secret_key.is_none() {
        log::warn!("SECRET_KEY is not set, update secrets are hashed without a pepper");
    }
    let authenticator =
        UpdateAuthenticator::new(config.secret_key.as_ref().map(|key| key.as_bytes().to_vec()));
    let state = web::Data::new(AppState::new(
        Arc::new(PgNoteStore::new(pool)),
        authenticator,
    ));

    let governor_config = GovernorConfigBuilder::default()
        .per_second(config.rate_limit_replenish_secs)
        .burst_size(config.rate_limit_burst)
        .finish()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "rate limit values must be greater than zero",
            )
        })?;

    let frontend_origin = config.frontend_origin.clone();
    let json_limit = config.json_limit;
    log::info!("listening on 0.0.0.0:{}", config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(frontend_origin.as_deref()))
            .wrap(Governor::new(&governor_config))
            .wrap(Logger::default())
            .configure(handlers::configure(json_limit))
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
