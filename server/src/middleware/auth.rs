use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, HttpMessage,
};

use crate::error::GameError;
use crate::model::player::Player;
use crate::registry::GameRegistry;

/// Extracts and validates the bearer token on every authenticated game
/// endpoint, then stashes the resolved player in request extensions so
/// handlers never re-parse `Authorization` themselves.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(rest) => crate::model::token::PlayerToken::parse(rest).ok_or(GameError::InvalidToken)?,
        None => return Err(GameError::InvalidToken.into()),
    };

    let registry = req
        .app_data::<web::Data<Arc<GameRegistry>>>()
        .expect("GameRegistry must be registered as app data")
        .clone();

    let player: Player = registry.player(token).await.ok_or(GameError::UnknownToken)?;

    req.extensions_mut().insert(token);
    req.extensions_mut().insert(player);

    next.call(req).await
}
