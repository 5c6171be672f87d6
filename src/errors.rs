use actix_web::{http::StatusCode, HttpResponse};
use derive_more::Display;
use serde_derive::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommonError {
    Empty,
    TooLong,
    InvalidFormat,
    InvalidLength,
    InvalidEncoding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", content = "error", rename_all = "snake_case")]
pub enum Fields {
    Slug(CommonError),
    Ciphertext(CommonError),
    Salt(CommonError),
    Nonce(CommonError),
    UpdateSecret(CommonError),
    ModificationToken(CommonError),
    Body(String),
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    #[display(fmt = "slug has been taken")]
    SlugTaken,
    #[display(fmt = "note has been modified by someone else")]
    StaleToken,
}

#[derive(Debug, Display)]
pub enum ServerError {
    #[display(fmt = "invalid request")]
    UserError(Vec<Fields>),
    #[display(fmt = "{}", _0)]
    Conflict(ConflictKind),
    #[display(fmt = "note '{}' was not found", _0)]
    NotFound(String),
    #[display(fmt = "update secret does not match")]
    Forbidden,
    ArgonError,
    BlockingError,
    DieselError,
    EnvironmentError,
    MigrationError,
    R2D2Error,
}

impl std::error::Error for ServerError {}

impl From<r2d2::Error> for ServerError {
    fn from(err: r2d2::Error) -> ServerError {
        log::error!("{err}");
        ServerError::R2D2Error
    }
}

impl From<std::env::VarError> for ServerError {
    fn from(_: std::env::VarError) -> ServerError {
        ServerError::EnvironmentError
    }
}

impl From<diesel::result::Error> for ServerError {
    fn from(err: diesel::result::Error) -> ServerError {
        log::error!("{err}");
        ServerError::DieselError
    }
}

impl From<argon2::Error> for ServerError {
    fn from(err: argon2::Error) -> ServerError {
        log::error!("{err}");
        ServerError::ArgonError
    }
}

impl From<argon2::password_hash::Error> for ServerError {
    fn from(err: argon2::password_hash::Error) -> ServerError {
        log::error!("{err}");
        ServerError::ArgonError
    }
}

impl From<actix_web::error::BlockingError> for ServerError {
    fn from(err: actix_web::error::BlockingError) -> ServerError {
        log::error!("{err}");
        ServerError::BlockingError
    }
}

impl ServerError {
    pub fn field(field: Fields) -> ServerError {
        ServerError::UserError(vec![field])
    }

    fn kind(&self) -> &'static str {
        match self {
            ServerError::UserError(_) => "validation",
            ServerError::Conflict(ConflictKind::SlugTaken) => "slug_taken",
            ServerError::Conflict(ConflictKind::StaleToken) => "stale_token",
            ServerError::NotFound(_) => "not_found",
            ServerError::Forbidden => "forbidden",
            _ => "internal",
        }
    }
}

impl actix_web::error::ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::UserError(_) => StatusCode::BAD_REQUEST,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            ServerError::UserError(fields) => builder.json(json!({
                "error": self.kind(),
                "message": self.to_string(),
                "fields": fields,
            })),
            ServerError::ArgonError
            | ServerError::BlockingError
            | ServerError::DieselError
            | ServerError::EnvironmentError
            | ServerError::MigrationError
            | ServerError::R2D2Error => builder.json(json!({
                "error": self.kind(),
                "message": format!("Internal Error: {self}"),
            })),
            _ => builder.json(json!({
                "error": self.kind(),
                "message": self.to_string(),
            })),
        }
    }
}
