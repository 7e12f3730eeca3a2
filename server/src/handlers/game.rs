use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::ScoreboardHandle;
use crate::error::{GameError, Result};
use crate::model::player::{Direction, Player};
use crate::registry::GameRegistry;

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    #[serde(rename = "userName")]
    user_name: String,
    #[serde(rename = "mapId")]
    map_id: String,
}

#[derive(Debug, Serialize)]
struct JoinResponse {
    #[serde(rename = "authToken")]
    auth_token: String,
    #[serde(rename = "playerId")]
    player_id: u64,
}

pub async fn join(body: web::Bytes, registry: web::Data<Arc<GameRegistry>>) -> Result<HttpResponse> {
    let request: JoinRequest = serde_json::from_slice(&body)
        .map_err(|e| GameError::InvalidArgument(format!("join game request parse error: {e}")))?;

    if request.user_name.is_empty() {
        return Err(GameError::InvalidArgument("invalid name".into()));
    }

    let (token, player_id) = match registry.join(&request.map_id, request.user_name).await {
        Some(joined) => joined.map_err(|_| GameError::InvalidArgument("invalid name".into()))?,
        None => return Err(GameError::MapNotFound),
    };

    Ok(HttpResponse::Ok()
        .insert_header((actix_web::http::header::CACHE_CONTROL, "no-cache"))
        .json(JoinResponse {
            auth_token: token.to_string(),
            player_id,
        }))
}

pub async fn players(req: HttpRequest, player: web::ReqData<Player>, registry: web::Data<Arc<GameRegistry>>) -> Result<HttpResponse> {
    let map_id = find_player_map_id(&registry, &player)?;
    let mut builder = HttpResponse::Ok();
    builder.insert_header((actix_web::http::header::CACHE_CONTROL, "no-cache"));

    if req.method() == actix_web::http::Method::HEAD {
        return Ok(builder.finish());
    }

    let members = registry.players_on(&map_id).await.unwrap_or_default();
    let mut body = Map::new();
    for member in members {
        body.insert(member.id.to_string(), serde_json::json!({ "name": member.name }));
    }
    Ok(builder.json(Value::Object(body)))
}

pub async fn state(req: HttpRequest, player: web::ReqData<Player>, registry: web::Data<Arc<GameRegistry>>) -> Result<HttpResponse> {
    let map_id = find_player_map_id(&registry, &player)?;
    let mut builder = HttpResponse::Ok();
    builder.insert_header((actix_web::http::header::CACHE_CONTROL, "no-cache"));

    if req.method() == actix_web::http::Method::HEAD {
        return Ok(builder.finish());
    }

    let members = registry.players_on(&map_id).await.unwrap_or_default();
    let mut players_obj = Map::new();
    for member in &members {
        let bag: Vec<Value> = member
            .bag
            .iter()
            .map(|item| serde_json::json!({ "id": item.id, "type": item.type_index }))
            .collect();
        players_obj.insert(
            member.id.to_string(),
            serde_json::json!({
                "pos": [member.position.x, member.position.y],
                "speed": [member.speed.0, member.speed.1],
                "dir": member.direction.to_move_code(),
                "bag": bag,
                "score": member.score,
            }),
        );
    }

    let loot = registry.loot_on(&map_id).await.unwrap_or_default();
    let mut lost_objects = Map::new();
    for item in &loot {
        lost_objects.insert(
            item.id.to_string(),
            serde_json::json!({
                "type": item.type_index,
                "pos": [item.position.x, item.position.y],
            }),
        );
    }

    Ok(builder.json(serde_json::json!({
        "players": Value::Object(players_obj),
        "lostObjects": Value::Object(lost_objects),
    })))
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    #[serde(rename = "move")]
    move_code: String,
}

pub async fn action(
    req: HttpRequest,
    body: web::Bytes,
    player: web::ReqData<Player>,
    registry: web::Data<Arc<GameRegistry>>,
) -> Result<HttpResponse> {
    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("application/json") {
        return Err(GameError::InvalidArgument("invalid content type".into()));
    }

    let request: ActionRequest = serde_json::from_slice(&body)
        .map_err(|e| GameError::InvalidArgument(format!("failed to parse action: {e}")))?;

    let direction = Direction::from_move_code(&request.move_code);
    registry.apply_action(player.token, direction).await;

    Ok(HttpResponse::Ok()
        .insert_header((actix_web::http::header::CACHE_CONTROL, "no-cache"))
        .json(serde_json::json!({})))
}

#[derive(Debug, Deserialize)]
pub struct TickRequest {
    #[serde(rename = "timeDelta")]
    time_delta_ms: i64,
}

/// Whether the manual `/api/v1/game/tick` route is allowed to actually
/// drive the simulation. `false` when an internal ticker is running:
/// the route stays mounted (so callers get a precise 400 instead of a
/// generic 404) but refuses to race the scheduler on the strand.
#[derive(Debug, Clone, Copy)]
pub struct ManualTickEnabled(pub bool);

pub async fn tick(
    body: web::Bytes,
    registry: web::Data<Arc<GameRegistry>>,
    scoreboard: web::Data<ScoreboardHandle>,
    manual_tick: web::Data<ManualTickEnabled>,
) -> Result<HttpResponse> {
    if !manual_tick.0 {
        return Err(GameError::InvalidArgument(
            "Can't process client action in auto tick mode".into(),
        ));
    }

    let request: TickRequest = serde_json::from_slice(&body)
        .map_err(|e| GameError::InvalidArgument(format!("failed to parse tick request JSON: {e}")))?;

    let dt = request.time_delta_ms as f64 / 1000.0;
    let retired = registry.tick(dt).await;
    scoreboard.forward_retired(retired).await;

    Ok(HttpResponse::Ok()
        .insert_header((actix_web::http::header::CACHE_CONTROL, "no-cache"))
        .json(serde_json::json!({})))
}

fn find_player_map_id(registry: &GameRegistry, player: &Player) -> Result<String> {
    registry.map_id_for(player.token).ok_or(GameError::UnknownToken)
}
