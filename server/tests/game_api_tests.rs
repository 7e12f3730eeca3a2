use std::sync::Arc;

use actix_web::{http::StatusCode, middleware as actix_middleware, test, web, App};

use server::db::{start_scoreboard_worker, InMemoryScoreboardSink, ScoreboardHandle, ScoreboardSink};
use server::handlers;
use server::handlers::game::ManualTickEnabled;
use server::middleware::auth_middleware;
use server::model::catalog::MapCatalog;
use server::registry::GameRegistry;

const CATALOG: &str = r#"{
    "defaultDogSpeed": 3.0,
    "defaultBagCapacity": 3,
    "lootGeneratorConfig": { "period": 5.0, "probability": 0.0 },
    "maps": [
        {
            "id": "map1",
            "name": "Town",
            "roads": [ { "x0": 0, "y0": 0, "x1": 10 } ],
            "offices": [ { "id": "o1", "x": 10, "y": 0, "offsetX": 0, "offsetY": 0 } ],
            "lootTypes": [ { "value": 5, "name": "key" } ]
        }
    ]
}"#;

fn make_registry() -> Arc<GameRegistry> {
    let catalog = Arc::new(MapCatalog::load_from_str(CATALOG).unwrap());
    Arc::new(GameRegistry::new(catalog, false, 60.0))
}

fn make_scoreboard() -> (Arc<dyn ScoreboardSink>, ScoreboardHandle) {
    let sink: Arc<dyn ScoreboardSink> = Arc::new(InMemoryScoreboardSink::new());
    let handle = start_scoreboard_worker(sink.clone());
    (sink, handle)
}

macro_rules! build_app {
    ($registry:expr, $sink:expr, $scoreboard:expr) => {
        build_app!($registry, $sink, $scoreboard, true)
    };
    ($registry:expr, $sink:expr, $scoreboard:expr, $manual_tick:expr) => {
        App::new()
            .app_data(web::Data::new($registry.clone()))
            .app_data(web::Data::new($scoreboard.clone()))
            .app_data(web::Data::new($sink.clone()))
            .app_data(web::Data::new(ManualTickEnabled($manual_tick)))
            .wrap(actix_middleware::Logger::default())
            // Order matters: these `/api/v1/game/*` siblings must be
            // registered before the `/api/v1/game` scope, or actix routes
            // them into the scope's prefix match and 404s them (no inner
            // route matches `/records` or `/tick`).
            .service(
                web::resource("/api/v1/game/join")
                    .route(web::post().to(handlers::game::join))
                    .default_service(handlers::method_not_allowed("POST")),
            )
            .service(
                web::resource("/api/v1/game/records")
                    .route(web::get().to(handlers::records::list))
                    .default_service(handlers::method_not_allowed("GET")),
            )
            .service(
                web::resource("/api/v1/game/tick")
                    .route(web::post().to(handlers::game::tick))
                    .default_service(handlers::method_not_allowed("POST")),
            )
            .service(
                web::scope("/api/v1/game")
                    .wrap(actix_middleware::from_fn(auth_middleware))
                    .service(
                        web::resource("/players")
                            .route(web::get().to(handlers::game::players))
                            .route(web::head().to(handlers::game::players))
                            .default_service(handlers::method_not_allowed("GET, HEAD")),
                    )
                    .service(
                        web::resource("/state")
                            .route(web::get().to(handlers::game::state))
                            .default_service(handlers::method_not_allowed("GET, HEAD")),
                    )
                    .service(
                        web::resource("/player/action")
                            .route(web::post().to(handlers::game::action))
                            .default_service(handlers::method_not_allowed("POST")),
                    ),
            )
            .service(
                web::resource("/api/v1/maps")
                    .route(web::get().to(handlers::maps::list))
                    .default_service(handlers::method_not_allowed("GET, HEAD")),
            )
            .service(
                web::resource("/api/v1/maps/{id}")
                    .route(web::get().to(handlers::maps::get))
                    .default_service(handlers::method_not_allowed("GET, HEAD")),
            )
    };
}

#[actix_web::test]
async fn joining_an_unknown_map_returns_404_map_not_found() {
    let registry = make_registry();
    let (sink, scoreboard) = make_scoreboard();
    let app = test::init_service(build_app!(registry, sink, scoreboard)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/game/join")
        .set_json(serde_json::json!({ "userName": "ana", "mapId": "no-such-map" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "mapNotFound");
}

#[actix_web::test]
async fn joining_with_an_empty_name_returns_400_invalid_argument() {
    let registry = make_registry();
    let (sink, scoreboard) = make_scoreboard();
    let app = test::init_service(build_app!(registry, sink, scoreboard)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/game/join")
        .set_json(serde_json::json!({ "userName": "", "mapId": "map1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "invalidArgument");
}

#[actix_web::test]
async fn manual_tick_is_rejected_when_an_internal_ticker_is_active() {
    let registry = make_registry();
    let (sink, scoreboard) = make_scoreboard();
    let app = test::init_service(build_app!(registry, sink, scoreboard, false)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/game/tick")
        .set_json(serde_json::json!({ "timeDelta": 1000 }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "invalidArgument");
}

#[actix_web::test]
async fn join_then_act_then_tick_moves_the_player() {
    let registry = make_registry();
    let (sink, scoreboard) = make_scoreboard();
    let app = test::init_service(build_app!(registry, sink, scoreboard)).await;

    let join_req = test::TestRequest::post()
        .uri("/api/v1/game/join")
        .set_json(serde_json::json!({ "userName": "ana", "mapId": "map1" }))
        .to_request();
    let join_resp: serde_json::Value = test::call_and_read_body_json(&app, join_req).await;
    let token = join_resp["authToken"].as_str().unwrap().to_string();

    let action_req = test::TestRequest::post()
        .uri("/api/v1/game/player/action")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(serde_json::json!({ "move": "R" }))
        .to_request();
    let action_resp = test::call_service(&app, action_req).await;
    assert!(action_resp.status().is_success());

    let tick_req = test::TestRequest::post()
        .uri("/api/v1/game/tick")
        .set_json(serde_json::json!({ "timeDelta": 1000 }))
        .to_request();
    let tick_resp = test::call_service(&app, tick_req).await;
    assert!(tick_resp.status().is_success());

    let state_req = test::TestRequest::get()
        .uri("/api/v1/game/state")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let state_resp: serde_json::Value = test::call_and_read_body_json(&app, state_req).await;
    let player_entry = state_resp["players"].as_object().unwrap().values().next().unwrap();
    assert!(player_entry["pos"][0].as_f64().unwrap() > 0.0);
}

#[actix_web::test]
async fn missing_authorization_header_returns_401_invalid_token() {
    let registry = make_registry();
    let (sink, scoreboard) = make_scoreboard();
    let app = test::init_service(build_app!(registry, sink, scoreboard)).await;

    let req = test::TestRequest::get().uri("/api/v1/game/players").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "invalidToken");
}

#[actix_web::test]
async fn well_formed_but_unknown_token_returns_401_unknown_token() {
    let registry = make_registry();
    let (sink, scoreboard) = make_scoreboard();
    let app = test::init_service(build_app!(registry, sink, scoreboard)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/game/players")
        .insert_header(("Authorization", format!("Bearer {}", "0".repeat(32))))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "unknownToken");
}

#[actix_web::test]
async fn wrong_method_returns_405_with_allow_header() {
    let registry = make_registry();
    let (sink, scoreboard) = make_scoreboard();
    let app = test::init_service(build_app!(registry, sink, scoreboard)).await;

    let req = test::TestRequest::get().uri("/api/v1/game/join").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers().get("Allow").unwrap(), "POST");
}

#[actix_web::test]
async fn records_max_items_over_100_is_rejected() {
    let registry = make_registry();
    let (sink, scoreboard) = make_scoreboard();
    let app = test::init_service(build_app!(registry, sink, scoreboard)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/game/records?maxItems=101")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "invalidRequest");
}

#[actix_web::test]
async fn maps_listing_reports_id_and_name() {
    let registry = make_registry();
    let (sink, scoreboard) = make_scoreboard();
    let app = test::init_service(build_app!(registry, sink, scoreboard)).await;

    let req = test::TestRequest::get().uri("/api/v1/maps").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body[0]["id"], "map1");
    assert_eq!(body[0]["name"], "Town");
}

#[actix_web::test]
async fn unknown_map_detail_returns_404() {
    let registry = make_registry();
    let (sink, scoreboard) = make_scoreboard();
    let app = test::init_service(build_app!(registry, sink, scoreboard)).await;

    let req = test::TestRequest::get().uri("/api/v1/maps/no-such-map").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
