use super::*;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use chicken_core::*;
use chicken_engine::*;
use chicken_game::Choice;
use serde::Deserialize;
use serde_json::json;

type Game<S> = web::Data<Coordinator<S>>;

#[derive(Debug, Deserialize)]
pub struct JoinBody {
    pub name: String,
}
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    pub player_id: ID<Participant>,
    pub choice: Choice,
}
#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub sender_id: ID<Participant>,
    pub content: String,
}
#[derive(Debug, Deserialize)]
pub struct PlayerQuery {
    pub player: ID<Participant>,
}
#[derive(Debug, Default, Deserialize)]
pub struct ActivateQuery {
    #[serde(default)]
    pub first_round: bool,
}
#[derive(Debug, Default, Deserialize)]
pub struct ForceQuery {
    pub default: Option<Choice>,
}
#[derive(Debug, Default, Deserialize)]
pub struct StateQuery {
    pub since: Option<Version>,
    pub player: Option<ID<Participant>>,
}
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub after: Option<Seq>,
    pub limit: Option<i64>,
}

/// Maps coordinator errors onto HTTP statuses.
pub fn reject(e: Error) -> HttpResponse {
    match e {
        ref e if e.is_not_found() => HttpResponse::NotFound().body(e.to_string()),
        Error::InvalidName
        | Error::InvalidPlayerCount { .. }
        | Error::InvalidMessage
        | Error::MessageNotAllowed { .. }
        | Error::IndicatorsTooEarly { .. } => {
            HttpResponse::BadRequest().body(e.to_string())
        }
        Error::Storage(_) | Error::CodeExhausted => {
            log::error!("[server] {}", e);
            HttpResponse::ServiceUnavailable().body(e.to_string())
        }
        _ => HttpResponse::Conflict().body(e.to_string()),
    }
}

fn session_json(session: &Session) -> serde_json::Value {
    json!({
        "session_id": session.id(),
        "code": session.code(),
        "status": session.status(),
        "current_round": session.round(),
        "version": session.version(),
    })
}

fn round_json(round: &Round) -> serde_json::Value {
    json!({
        "round_id": round.id(),
        "session_id": round.session(),
        "round_number": round.number(),
        "phase": round.phase(),
        "status": round.status(),
        "version": round.version(),
    })
}

pub async fn health<S: Store>(game: Game<S>) -> impl Responder {
    match game
        .store()
        .view()
        .await
        .inspect_err(|e| log::error!("health check failed: {}", e))
    {
        Ok(_) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("storage unavailable"),
    }
}

pub async fn create<S: Store>(game: Game<S>) -> impl Responder {
    match game.create().await {
        Ok((session, host)) => HttpResponse::Ok().json(json!({
            "session": session_json(&session),
            "facilitator_id": host.id(),
        })),
        Err(e) => reject(e),
    }
}
pub async fn lookup<S: Store>(game: Game<S>, path: web::Path<String>) -> impl Responder {
    match game.session_by_code(&path.into_inner()).await {
        Ok(session) => HttpResponse::Ok().json(session_json(&session)),
        Err(e) => reject(e),
    }
}
pub async fn join<S: Store>(
    game: Game<S>,
    path: web::Path<String>,
    body: web::Json<JoinBody>,
) -> impl Responder {
    match game.join_by_code(&path.into_inner(), &body.name).await {
        Ok(player) => HttpResponse::Ok().json(json!({
            "participant_id": player.id(),
            "session_id": player.session(),
            "name": player.name(),
        })),
        Err(e) => reject(e),
    }
}
pub async fn activate<S: Store>(
    game: Game<S>,
    path: web::Path<uuid::Uuid>,
    query: web::Query<ActivateQuery>,
) -> impl Responder {
    let id = ID::from(path.into_inner());
    match query.first_round {
        true => match game.activate_with_first_round(id).await {
            Ok((session, round)) => HttpResponse::Ok().json(json!({
                "session": session_json(&session),
                "round": round_json(&round),
            })),
            Err(e) => reject(e),
        },
        false => match game.activate(id).await {
            Ok(session) => HttpResponse::Ok().json(json!({ "session": session_json(&session) })),
            Err(e) => reject(e),
        },
    }
}
pub async fn end<S: Store>(game: Game<S>, path: web::Path<uuid::Uuid>) -> impl Responder {
    match game.end(ID::from(path.into_inner())).await {
        Ok(session) => HttpResponse::Ok().json(session_json(&session)),
        Err(e) => reject(e),
    }
}
pub async fn delete<S: Store>(game: Game<S>, path: web::Path<uuid::Uuid>) -> impl Responder {
    match game.delete(ID::from(path.into_inner())).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => reject(e),
    }
}
pub async fn start_round<S: Store>(game: Game<S>, path: web::Path<uuid::Uuid>) -> impl Responder {
    match game.start_round(ID::from(path.into_inner())).await {
        Ok(round) => HttpResponse::Ok().json(round_json(&round)),
        Err(e) => reject(e),
    }
}
pub async fn state<S: Store>(
    game: Game<S>,
    path: web::Path<uuid::Uuid>,
    query: web::Query<StateQuery>,
) -> impl Responder {
    match game
        .snapshot(ID::from(path.into_inner()), query.since, query.player)
        .await
    {
        Ok(update) => HttpResponse::Ok().json(update),
        Err(e) => reject(e),
    }
}
pub async fn events<S: Store>(
    game: Game<S>,
    path: web::Path<uuid::Uuid>,
    query: web::Query<EventsQuery>,
) -> impl Responder {
    let after = query.after.unwrap_or_default();
    match game
        .events_since(ID::from(path.into_inner()), after, query.limit)
        .await
    {
        Ok(events) => HttpResponse::Ok().json(events),
        Err(e) => reject(e),
    }
}
pub async fn summary<S: Store>(game: Game<S>, path: web::Path<uuid::Uuid>) -> impl Responder {
    match game.summary(ID::from(path.into_inner())).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => reject(e),
    }
}
pub async fn subscribe<S: Store>(
    game: Game<S>,
    hub: web::Data<Broadcaster>,
    path: web::Path<uuid::Uuid>,
    body: web::Payload,
    req: HttpRequest,
) -> impl Responder {
    let id = ID::from(path.into_inner());
    if let Err(e) = game.session(id).await {
        return reject(e).map_into_right_body();
    }
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => match hub.bridge(id, session, stream).await {
            Ok(()) => response.map_into_left_body(),
            Err(e) => HttpResponse::InternalServerError()
                .body(e.to_string())
                .map_into_right_body(),
        },
        Err(e) => HttpResponse::BadRequest()
            .body(e.to_string())
            .map_into_right_body(),
    }
}

/// Submits a choice, then attempts finalization so the last submitter
/// triggers scoring.
pub async fn submit<S: Store>(
    game: Game<S>,
    path: web::Path<uuid::Uuid>,
    body: web::Json<SubmitBody>,
) -> impl Responder {
    let round = ID::from(path.into_inner());
    let action = match game.submit(round, body.player_id, body.choice).await {
        Ok(action) => action,
        Err(e) => return reject(e),
    };
    match game.try_finalize(round).await {
        Ok(finalized) => HttpResponse::Ok().json(json!({
            "round_id": round,
            "player_id": action.player(),
            "choice": action.choice(),
            "finalized": finalized,
        })),
        Err(e) => reject(e),
    }
}
pub async fn finalize<S: Store>(game: Game<S>, path: web::Path<uuid::Uuid>) -> impl Responder {
    let round = ID::from(path.into_inner());
    match game.try_finalize(round).await {
        Ok(finalized) => HttpResponse::Ok().json(json!({
            "round_id": round,
            "finalized": finalized,
        })),
        Err(e) => reject(e),
    }
}
pub async fn publish<S: Store>(game: Game<S>, path: web::Path<uuid::Uuid>) -> impl Responder {
    match game.publish(ID::from(path.into_inner())).await {
        Ok(round) => HttpResponse::Ok().json(round_json(&round)),
        Err(e) => reject(e),
    }
}
pub async fn force<S: Store>(
    game: Game<S>,
    path: web::Path<uuid::Uuid>,
    query: web::Query<ForceQuery>,
) -> impl Responder {
    let default = query.default.unwrap_or_default();
    match game
        .force_complete(ID::from(path.into_inner()), default)
        .await
    {
        Ok(round) => HttpResponse::Ok().json(round_json(&round)),
        Err(e) => reject(e),
    }
}

pub async fn send_message<S: Store>(
    game: Game<S>,
    path: web::Path<(uuid::Uuid, RoundNumber)>,
    body: web::Json<MessageBody>,
) -> impl Responder {
    let (id, number) = path.into_inner();
    match game
        .send_message(ID::from(id), number, body.sender_id, &body.content)
        .await
    {
        Ok(message) => HttpResponse::Ok().json(json!({
            "round_number": number,
            "sender_id": message.sender(),
            "receiver_id": message.receiver(),
        })),
        Err(e) => reject(e),
    }
}
pub async fn message<S: Store>(
    game: Game<S>,
    path: web::Path<(uuid::Uuid, RoundNumber)>,
    query: web::Query<PlayerQuery>,
) -> impl Responder {
    let (id, number) = path.into_inner();
    match game.message(ID::from(id), number, query.player).await {
        Ok(message) => HttpResponse::Ok().json(json!({
            "content": message.content(),
            "from_opponent": true,
        })),
        Err(e) => reject(e),
    }
}
pub async fn assign_indicators<S: Store>(
    game: Game<S>,
    path: web::Path<uuid::Uuid>,
) -> impl Responder {
    match game.assign_indicators(ID::from(path.into_inner())).await {
        Ok(indicators) => HttpResponse::Ok().json(json!({ "assigned": indicators.len() })),
        Err(e) => reject(e),
    }
}
pub async fn indicator<S: Store>(
    game: Game<S>,
    path: web::Path<uuid::Uuid>,
    query: web::Query<PlayerQuery>,
) -> impl Responder {
    match game
        .indicator(ID::from(path.into_inner()), query.player)
        .await
    {
        Ok(indicator) => HttpResponse::Ok().json(json!({ "symbol": indicator.symbol() })),
        Err(e) => reject(e),
    }
}
