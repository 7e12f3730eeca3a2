pub mod game;
pub mod maps;
pub mod records;

use actix_web::{web, Route};

use crate::error::GameError;

/// Wired as a resource's `default_service`, so any verb the resource
/// didn't register an explicit route for gets a uniform 405 with the
/// `Allow` header §4.5 requires, instead of actix's generic 404.
pub fn method_not_allowed(allow: &'static str) -> Route {
    web::route().to(move || async move { Err::<actix_web::HttpResponse, _>(GameError::InvalidMethod { allow }) })
}
