use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::db::ScoreboardSink;
use crate::error::{GameError, Result};

const DEFAULT_MAX_ITEMS: i64 = 100;
const MAX_ITEMS_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    #[serde(default)]
    start: i64,
    #[serde(rename = "maxItems")]
    max_items: Option<i64>,
}

pub async fn list(query: web::Query<RecordsQuery>, scoreboard: web::Data<Arc<dyn ScoreboardSink>>) -> Result<HttpResponse> {
    let max_items = query.max_items.unwrap_or(DEFAULT_MAX_ITEMS);
    if max_items > MAX_ITEMS_LIMIT {
        return Err(GameError::InvalidRequest("maxItems exceeds the limit of 100".into()));
    }

    let records = scoreboard
        .page(query.start, max_items)
        .await
        .map_err(|e| GameError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .insert_header((actix_web::http::header::CACHE_CONTROL, "no-cache"))
        .json(records))
}
