use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use matchroom_backend::config::db::database_url;
use matchroom_backend::ctx::Ctx;
use matchroom_backend::entities::scheduled_tasks::TaskType;
use matchroom_backend::repos::tasks as tasks_repo;
use matchroom_backend::repos::tasks::TaskKey;
use matchroom_backend::routes;
use matchroom_backend::services::finisher;
use matchroom_backend::{AppState, LoggingMessenger, RequestTrace, TaskRouter};
use matchroom_migration::{Migrator, MigratorTrait};
use time::OffsetDateTime;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    matchroom_backend::telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: via compose env_file or docker run --env-file
    // - Local dev: source env files manually (set -a; . ./.env; set +a)
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| {
            eprintln!("❌ BACKEND_PORT must be a valid port number");
            std::process::exit(1);
        });

    println!("🚀 Starting Matchroom backend on http://{}:{}", host, port);

    let db_url = match database_url() {
        Ok(url) => url,
        Err(e) => {
            eprintln!("❌ Database configuration error: {e}");
            std::process::exit(1);
        }
    };

    let db = match sea_orm::Database::connect(&db_url).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("❌ Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(&db, None).await {
        eprintln!("❌ Migrations failed: {e}");
        std::process::exit(1);
    }

    println!("✅ Database connected");

    let state = AppState::new(db, Arc::new(LoggingMessenger));
    state
        .scheduler
        .set_handler(Arc::new(TaskRouter::new(state.clone())));

    // The process must not serve with an unknown set of outstanding timers.
    match state.scheduler.recover().await {
        Ok(report) => {
            println!(
                "✅ Scheduler recovered: {} re-armed, {} markers finished",
                report.rearmed, report.finished_markers
            );
        }
        Err(e) => {
            eprintln!("❌ Scheduler recovery failed: {e}");
            std::process::exit(1);
        }
    }

    let _sweep = finisher::spawn_expiration_sweep(state.clone());

    let data = web::Data::new(state.clone());
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(RequestTrace)
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    announce_shutdown(&state).await;
    Ok(())
}

/// Persist and fire the one-shot shutdown notice. If the process dies
/// before the firing completes, the next startup's recovery finishes the
/// row without executing it.
async fn announce_shutdown(state: &AppState) {
    let ctx = Ctx::for_task("shutdown");
    let key = TaskKey::new(TaskType::ShutdownNotice, 0);
    match tasks_repo::schedule(&state.db, key, OffsetDateTime::now_utc()).await {
        Ok(_) => state.scheduler.fire(key).await,
        Err(e) => {
            tracing::warn!(trace_id = %ctx.trace_id, error = %e, "failed to persist shutdown notice");
        }
    }
}
