use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::Value;

use crate::error::{GameError, Result};
use crate::registry::GameRegistry;

pub async fn list(req: HttpRequest, registry: web::Data<Arc<GameRegistry>>) -> Result<HttpResponse> {
    let mut builder = HttpResponse::Ok();
    builder.insert_header((actix_web::http::header::CACHE_CONTROL, "no-cache"));

    if req.method() == actix_web::http::Method::HEAD {
        return Ok(builder.finish());
    }

    let summaries: Vec<Value> = registry
        .maps()
        .iter()
        .map(|m| serde_json::json!({ "id": m.id, "name": m.name }))
        .collect();

    Ok(builder.json(summaries))
}

pub async fn get(req: HttpRequest, path: web::Path<String>, registry: web::Data<Arc<GameRegistry>>) -> Result<HttpResponse> {
    let map_id = path.into_inner();
    let map = registry.maps().iter().find(|m| m.id == map_id).ok_or(GameError::MapNotFound)?;

    let mut builder = HttpResponse::Ok();
    builder.insert_header((actix_web::http::header::CACHE_CONTROL, "no-cache"));

    if req.method() == actix_web::http::Method::HEAD {
        return Ok(builder.finish());
    }

    let roads: Vec<Value> = map
        .roads
        .iter()
        .map(|r| match r.axis {
            crate::model::RoadAxis::Horizontal => serde_json::json!({ "x0": r.x0, "y0": r.y0, "x1": r.far }),
            crate::model::RoadAxis::Vertical => serde_json::json!({ "x0": r.x0, "y0": r.y0, "y1": r.far }),
        })
        .collect();

    let buildings: Vec<Value> = map
        .buildings
        .iter()
        .map(|b| serde_json::json!({ "x": b.x, "y": b.y, "w": b.w, "h": b.h }))
        .collect();

    let offices: Vec<Value> = map
        .offices
        .iter()
        .map(|o| serde_json::json!({ "id": o.id, "x": o.x, "y": o.y, "offsetX": o.offset_x, "offsetY": o.offset_y }))
        .collect();

    let loot_types: Vec<Value> = map
        .loot_types
        .iter()
        .map(|lt| {
            let mut obj = lt.extra.clone();
            obj.insert("value".to_string(), serde_json::json!(lt.value));
            Value::Object(obj)
        })
        .collect();

    Ok(builder.json(serde_json::json!({
        "id": map.id,
        "name": map.name,
        "roads": roads,
        "buildings": buildings,
        "offices": offices,
        "lootTypes": loot_types,
    })))
}
