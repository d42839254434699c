use palmvote::{ErrorBody, ValidationError};
use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::Request;

pub type ApiResult<T> = Result<T, Failure>;

/// An error response: the status plus `{"message": ...}`
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub status: Status,
    pub message: String,
}

impl Failure {
    pub fn new<M: Into<String>>(status: Status, message: M) -> Self {
        Failure {
            status,
            message: message.into(),
        }
    }
}

impl From<ValidationError> for Failure {
    fn from(e: ValidationError) -> Self {
        let status = Status::from_code(e.status()).unwrap_or(Status::InternalServerError);
        Failure::new(status, e.to_string())
    }
}

impl<'r> Responder<'r, 'static> for Failure {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        if self.status.code >= 500 {
            log::error!("{} {}: {}", req.method(), req.uri(), self.message);
        }

        Response::build_from(Json(ErrorBody { message: self.message }).respond_to(req)?)
            .status(self.status)
            .ok()
    }
}

/// JSON bodies for everything Rocket rejects before a handler runs
#[catch(default)]
pub fn default_catcher(status: Status, _req: &Request) -> Failure {
    let message = match status.code {
        404 => "Not found",
        422 => "Malformed request",
        _ => status.reason().unwrap_or("API request failed"),
    };
    Failure::new(status, message)
}
