mod cli;
mod db;
mod error;
mod handlers;
mod loot_generator;
mod middleware;
mod model;
mod motion;
mod registry;
mod session;
mod session_actor;
mod snapshot;
mod ticker;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};

use cli::Args;
use db::{start_scoreboard_worker, PgScoreboardSink, ScoreboardSink};
use model::catalog::MapCatalog;
use registry::GameRegistry;

/// Idle time after which a player is evicted from its session (§8 scenario 3).
const RETIREMENT_THRESHOLD_SECS: f64 = 60.0;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if dotenvy::dotenv().is_err() {
        dotenvy::from_filename("server/.env").ok();
    }
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args = Args::parse();

    let catalog = MapCatalog::load_from_file(&args.config_file).unwrap_or_else(|e| {
        eprintln!("failed to load map catalog from '{}': {e}", args.config_file.display());
        std::process::exit(1);
    });
    log::info!("loaded {} maps from {}", catalog.maps.len(), args.config_file.display());
    let catalog = Arc::new(catalog);

    let database_url = cli::resolve_database_url().unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });
    let sink = PgScoreboardSink::connect(&database_url).await.unwrap_or_else(|e| {
        eprintln!("failed to connect to the scoreboard database: {e}");
        std::process::exit(1);
    });
    let sink: Arc<dyn ScoreboardSink> = Arc::new(sink);
    let scoreboard = start_scoreboard_worker(sink.clone());

    let registry = match &args.state_file {
        Some(path) => match snapshot::load(path) {
            Ok(Some(saved)) => {
                log::info!("restored game state from {}", path.display());
                Arc::new(GameRegistry::restore(
                    catalog.clone(),
                    args.randomize_spawn_points,
                    RETIREMENT_THRESHOLD_SECS,
                    saved,
                ))
            }
            Ok(None) => Arc::new(GameRegistry::new(catalog.clone(), args.randomize_spawn_points, RETIREMENT_THRESHOLD_SECS)),
            Err(e) => {
                eprintln!("malformed state file '{}': {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Arc::new(GameRegistry::new(catalog.clone(), args.randomize_spawn_points, RETIREMENT_THRESHOLD_SECS)),
    };

    let ticker_cancel = args.tick_period_ms.map(|period_ms| {
        log::info!("internal ticker enabled at {period_ms}ms");
        ticker::start(
            registry.clone(),
            scoreboard.clone(),
            Duration::from_millis(period_ms),
            args.state_file.clone(),
            args.save_state_period_ms.map(Duration::from_millis),
        )
    });
    let manual_tick_enabled = handlers::game::ManualTickEnabled(ticker_cancel.is_none());
    if manual_tick_enabled.0 {
        log::info!("no --tick-period supplied; /api/v1/game/tick is enabled");
    }

    let www_root = args.www_root.clone();

    let http_result = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(scoreboard.clone()))
            .app_data(web::Data::new(sink.clone()))
            .app_data(web::Data::new(manual_tick_enabled))
            .wrap(actix_middleware::Logger::default())
            // These sibling `/api/v1/game/*` resources must be registered
            // before the `/api/v1/game` scope below: actix commits to the
            // first top-level service whose `ResourceDef` matches, and a
            // scope's def is a prefix match, so registering it first would
            // swallow `/api/v1/game/records` and `/api/v1/game/tick` into
            // the scope (which has no matching inner route) and 404 them.
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
                    .wrap(actix_middleware::from_fn(middleware::auth_middleware))
                    .service(
                        web::resource("/players")
                            .route(web::get().to(handlers::game::players))
                            .route(web::head().to(handlers::game::players))
                            .default_service(handlers::method_not_allowed("GET, HEAD")),
                    )
                    .service(
                        web::resource("/state")
                            .route(web::get().to(handlers::game::state))
                            .route(web::head().to(handlers::game::state))
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
                    .route(web::head().to(handlers::maps::list))
                    .default_service(handlers::method_not_allowed("GET, HEAD")),
            )
            .service(
                web::resource("/api/v1/maps/{id}")
                    .route(web::get().to(handlers::maps::get))
                    .route(web::head().to(handlers::maps::get))
                    .default_service(handlers::method_not_allowed("GET, HEAD")),
            )
            .service(actix_files::Files::new("/", &www_root).index_file("index.html"))
    })
    .bind(("0.0.0.0", 8080))?
    .run();

    let server_handle = http_result.handle();
    let registry_for_shutdown = registry.clone();
    let scoreboard_for_shutdown = scoreboard.clone();
    let state_file_for_shutdown = args.state_file.clone();

    tokio::spawn(async move {
        let mut terminate = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
        log::info!("shutdown signal received");
        server_handle.stop(true).await;
    });

    let result = http_result.await;

    if let Some(cancel) = ticker_cancel {
        cancel.notify_one();
    }
    if let Some(path) = &state_file_for_shutdown {
        let snap = registry_for_shutdown.snapshot().await;
        if let Err(e) = snapshot::save(path, &snap) {
            log::error!("final snapshot save failed: {e}");
        }
    }
    registry_for_shutdown.shutdown().await;
    scoreboard_for_shutdown.shutdown().await;

    result
}
