use actix_web::{web, HttpResponse};

use crate::errors::{Fields, ServerError};

pub mod note;

pub async fn index() -> impl actix_web::Responder {
    HttpResponse::Ok().finish()
}

fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| ServerError::field(Fields::Body(err.to_string())).into())
}

/// Routes and extractor settings, for `App::configure`.
pub fn configure(json_limit: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(json_config(json_limit))
            .route("/", web::get().to(index))
            .service(
                web::scope("/api/notes")
                    .route("", web::post().to(note::post::new))
                    .route("/{slug}", web::get().to(note::query::get))
                    .route("/{slug}", web::put().to(note::mutate::update)),
            );
    }
}
