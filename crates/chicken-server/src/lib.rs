//! HTTP and WebSocket surface for the classroom chicken game.
//!
//! ## Submodules
//!
//! - [`handlers`] — One actix handler per coordinator operation
//! - [`Broadcaster`] — Per-session push channels and the WebSocket bridge
//! - [`Settings`] — Environment configuration
pub mod handlers;
mod broadcast;
mod settings;

pub use broadcast::*;
pub use settings::*;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;
use chicken_engine::Coordinator;
use chicken_engine::MemoryStore;
use chicken_engine::Store;
use std::sync::Arc;

/// Registers every route for a coordinator over `S`.
#[rustfmt::skip]
pub fn routes<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health::<S>))
        .service(
            web::scope("/sessions")
                .route("", web::post().to(handlers::create::<S>))
                .route("/code/{code}", web::get().to(handlers::lookup::<S>))
                .route("/join/{code}", web::post().to(handlers::join::<S>))
                .route("/{id}", web::delete().to(handlers::delete::<S>))
                .route("/{id}/activate", web::post().to(handlers::activate::<S>))
                .route("/{id}/end", web::post().to(handlers::end::<S>))
                .route("/{id}/rounds", web::post().to(handlers::start_round::<S>))
                .route("/{id}/state", web::get().to(handlers::state::<S>))
                .route("/{id}/events", web::get().to(handlers::events::<S>))
                .route("/{id}/summary", web::get().to(handlers::summary::<S>))
                .route("/{id}/rounds/{number}/message", web::post().to(handlers::send_message::<S>))
                .route("/{id}/rounds/{number}/message", web::get().to(handlers::message::<S>))
                .route("/{id}/indicators", web::post().to(handlers::assign_indicators::<S>))
                .route("/{id}/indicator", web::get().to(handlers::indicator::<S>))
                .route("/{id}/subscribe", web::get().to(handlers::subscribe::<S>)),
        )
        .service(
            web::scope("/rounds")
                .route("/{id}/actions", web::post().to(handlers::submit::<S>))
                .route("/{id}/finalize", web::post().to(handlers::finalize::<S>))
                .route("/{id}/publish", web::post().to(handlers::publish::<S>))
                .route("/{id}/force", web::post().to(handlers::force::<S>)),
        );
}

/// Serves `store` until the process is interrupted.
pub async fn serve<S: Store>(store: S, settings: &Settings) -> anyhow::Result<()> {
    let hub = Arc::new(Broadcaster::default());
    let game = web::Data::new(Coordinator::new(store).with_notifier(hub.clone()));
    let hub = web::Data::from(hub);
    log::info!("[server] listening on {}", settings.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(game.clone())
            .app_data(hub.clone())
            .configure(routes::<S>)
    })
    .workers(settings.workers)
    .bind(&settings.bind)?
    .run()
    .await?;
    Ok(())
}

/// Picks a store from the environment and serves it.
pub async fn run() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    match settings.db_url.as_deref() {
        #[cfg(feature = "database")]
        Some(url) => {
            let store = chicken_engine::PgStore::connect(url, settings.pool).await?;
            store.migrate().await?;
            serve(store, &settings).await
        }
        #[cfg(not(feature = "database"))]
        Some(_) => {
            log::warn!("[server] built without database support, ignoring DB_URL");
            serve(MemoryStore::new(), &settings).await
        }
        None => {
            log::warn!("[server] DB_URL not set, sessions live in memory only");
            serve(MemoryStore::new(), &settings).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(Coordinator::new(MemoryStore::new())))
                    .app_data(web::Data::new(Broadcaster::default()))
                    .configure(routes::<MemoryStore>),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_is_ok() {
        let app = app!();
        let req = test::TestRequest::get().uri("/health").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
    #[actix_web::test]
    async fn full_round_over_http() {
        let app = app!();
        let req = test::TestRequest::post().uri("/sessions").to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let code = created["session"]["code"].as_str().unwrap().to_string();
        let id = created["session"]["session_id"].as_str().unwrap().to_string();
        let mut players = Vec::new();
        for name in ["Ada", "Bob"] {
            let req = test::TestRequest::post()
                .uri(&format!("/sessions/join/{}", code.to_lowercase()))
                .set_json(serde_json::json!({ "name": name }))
                .to_request();
            let joined: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            players.push(joined["participant_id"].as_str().unwrap().to_string());
        }
        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{}/activate?first_round=true", id))
            .to_request();
        let active: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(active["session"]["status"], "ACTIVE");
        let round = active["round"]["round_id"].as_str().unwrap().to_string();
        let mut finalized = Vec::new();
        for (player, choice) in players.iter().zip(["TURN", "ACCELERATE"]) {
            let req = test::TestRequest::post()
                .uri(&format!("/rounds/{}/actions", round))
                .set_json(serde_json::json!({ "player_id": player, "choice": choice }))
                .to_request();
            let submitted: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            finalized.push(submitted["finalized"].as_bool().unwrap());
        }
        assert_eq!(finalized, vec![false, true]);
        let req = test::TestRequest::post()
            .uri(&format!("/rounds/{}/publish", round))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::get()
            .uri(&format!("/sessions/{}/summary", id))
            .to_request();
        let summary: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary["rounds_published"], 1);
        assert_eq!(summary["standings"][0]["name"], "Bob");
        assert_eq!(summary["standings"][0]["total"], 5);
    }
    #[actix_web::test]
    async fn messages_over_http() {
        let app = app!();
        let req = test::TestRequest::post().uri("/sessions").to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let code = created["session"]["code"].as_str().unwrap().to_string();
        let id = created["session"]["session_id"].as_str().unwrap().to_string();
        let mut players = Vec::new();
        for name in ["Ada", "Bob"] {
            let req = test::TestRequest::post()
                .uri(&format!("/sessions/join/{}", code))
                .set_json(serde_json::json!({ "name": name }))
                .to_request();
            let joined: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            players.push(joined["participant_id"].as_str().unwrap().to_string());
        }
        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{}/activate?first_round=true", id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{}/rounds/1/message", id))
            .set_json(serde_json::json!({ "sender_id": players[0], "content": "hi" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{}/indicators", id))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
        let req = test::TestRequest::get()
            .uri(&format!("/sessions/{}/indicator?player={}", id, players[0]))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }
    #[actix_web::test]
    async fn errors_map_to_statuses() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/sessions/code/NOPE")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
        let req = test::TestRequest::post().uri("/sessions").to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = created["session"]["session_id"].as_str().unwrap().to_string();
        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{}/activate", id))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{}/rounds", id))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CONFLICT
        );
        let req = test::TestRequest::get()
            .uri(&format!("/sessions/{}/state?since=1", id))
            .to_request();
        let state: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(state["has_update"], false);
    }
}
