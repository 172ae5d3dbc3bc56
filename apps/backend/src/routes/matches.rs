//! HTTP command surface for the match lifecycle.
//!
//! Handlers are thin: resolve chat identities through the player
//! directory, run one service call inside `with_txn`, then apply timer
//! commands and dispatch notices after the transaction committed.

use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::request_ctx;
use crate::db::txn::with_txn;
use crate::entities::matches::{FailReason, GameMode, MatchState};
use crate::error::AppError;
use crate::repos::matches::Match;
use crate::repos::participants::Participant;
use crate::repos::players as players_repo;
use crate::services::matches::MatchService;
use crate::services::notices;
use crate::services::resubmission::ResubmissionService;
use crate::services::submission::SubmissionService;
use crate::services::votes::VoteService;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub game_mode: GameMode,
    /// Chat identity of the owner.
    pub owner: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    /// Chat identity of the voter.
    pub player: String,
    pub positive: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub requester: String,
}

#[derive(Debug, Deserialize)]
pub struct ClaimPlaceRequest {
    pub participant_id: i64,
    pub requester: String,
}

#[derive(Debug, Deserialize)]
pub struct ClaimLeaderRequest {
    pub leader_id: i64,
    pub requester: String,
}

#[derive(Debug, Deserialize)]
pub struct ResubmitRequest {
    pub requester: String,
    #[serde(default)]
    pub delegate_back: bool,
}

#[derive(Debug, Deserialize)]
pub struct CancelQuery {
    pub requester: String,
}

#[derive(Debug, Serialize)]
pub struct ParticipantView {
    pub id: i64,
    pub player_id: i64,
    pub candidate_place: Option<i16>,
    pub confirmed_place: Option<i16>,
    pub leader_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub id: i64,
    pub game_mode: GameMode,
    pub state: MatchState,
    pub positive_votes: i32,
    pub resubmit_count: i32,
    pub submitter_id: Option<i64>,
    pub fail_reason: Option<FailReason>,
    pub created_at: OffsetDateTime,
    pub finished_at: Option<OffsetDateTime>,
    pub participants: Vec<ParticipantView>,
}

impl MatchResponse {
    fn from_parts(m: Match, participants: Vec<Participant>) -> Self {
        Self {
            id: m.id,
            game_mode: m.game_mode,
            state: m.state,
            positive_votes: m.positive_votes,
            resubmit_count: m.resubmit_count,
            submitter_id: m.submitter_id,
            fail_reason: m.fail_reason,
            created_at: m.created_at,
            finished_at: m.finished_at,
            participants: participants
                .into_iter()
                .map(|p| ParticipantView {
                    id: p.id,
                    player_id: p.player_id,
                    candidate_place: p.candidate_place,
                    confirmed_place: p.confirmed_place,
                    leader_id: p.leader_id,
                })
                .collect(),
        }
    }
}

#[post("/matches")]
pub async fn create_match(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CreateMatchRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let ctx = request_ctx(&req);
    let st = state.get_ref();

    let (response, outcome) = with_txn(Some(&req), st, |txn| {
        let ctx = &ctx;
        async move {
            let (m, outcome) = MatchService
                .create_match(ctx, txn, body.game_mode, &body.owner)
                .await?;
            Ok((MatchResponse::from_parts(m, Vec::new()), outcome))
        }
    })
    .await?;

    st.scheduler.apply(outcome.timers);
    notices::dispatch(&ctx, st, outcome.notices).await;
    Ok(HttpResponse::Created().json(response))
}

#[get("/matches/{id}")]
pub async fn get_match(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let match_id = path.into_inner();
    let st = state.get_ref();

    let response = with_txn(Some(&req), st, |txn| async move {
        let (m, participants) = MatchService.get_match(txn, match_id).await?;
        Ok(MatchResponse::from_parts(m, participants))
    })
    .await?;

    Ok(HttpResponse::Ok().json(response))
}

#[delete("/matches/{id}")]
pub async fn cancel_match(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<CancelQuery>,
) -> Result<HttpResponse, AppError> {
    let match_id = path.into_inner();
    let query = query.into_inner();
    let ctx = request_ctx(&req);
    let st = state.get_ref();

    let (response, outcome) = with_txn(Some(&req), st, |txn| {
        let ctx = &ctx;
        async move {
            let requester = players_repo::require_by_external_id(txn, &query.requester).await?;
            let outcome = MatchService
                .cancel_match(ctx, txn, match_id, requester.id)
                .await?;
            let (m, participants) = MatchService.get_match(txn, match_id).await?;
            Ok((MatchResponse::from_parts(m, participants), outcome))
        }
    })
    .await?;

    st.scheduler.apply(outcome.timers);
    notices::dispatch(&ctx, st, outcome.notices).await;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/matches/{id}/votes")]
pub async fn vote(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<VoteRequest>,
) -> Result<HttpResponse, AppError> {
    let match_id = path.into_inner();
    let body = body.into_inner();
    let ctx = request_ctx(&req);
    let st = state.get_ref();

    let (response, outcome) = with_txn(Some(&req), st, |txn| {
        let ctx = &ctx;
        async move {
            let player = players_repo::require_by_external_id(txn, &body.player).await?;
            let outcome = VoteService
                .vote(ctx, st, txn, match_id, player.id, body.positive)
                .await?;
            let (m, participants) = MatchService.get_match(txn, match_id).await?;
            Ok((MatchResponse::from_parts(m, participants), outcome))
        }
    })
    .await?;

    st.scheduler.apply(outcome.timers);
    notices::dispatch(&ctx, st, outcome.notices).await;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/matches/{id}/submission")]
pub async fn request_submit(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<SubmitRequest>,
) -> Result<HttpResponse, AppError> {
    let match_id = path.into_inner();
    let body = body.into_inner();
    let ctx = request_ctx(&req);
    let st = state.get_ref();

    let (response, outcome) = with_txn(Some(&req), st, |txn| {
        let ctx = &ctx;
        async move {
            let requester = players_repo::require_by_external_id(txn, &body.requester).await?;
            let outcome = SubmissionService
                .request_submit(ctx, txn, match_id, requester.id)
                .await?;
            let (m, participants) = MatchService.get_match(txn, match_id).await?;
            Ok((MatchResponse::from_parts(m, participants), outcome))
        }
    })
    .await?;

    st.scheduler.apply(outcome.timers);
    notices::dispatch(&ctx, st, outcome.notices).await;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/matches/{id}/places")]
pub async fn claim_place(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ClaimPlaceRequest>,
) -> Result<HttpResponse, AppError> {
    let match_id = path.into_inner();
    let body = body.into_inner();
    let ctx = request_ctx(&req);
    let st = state.get_ref();

    let (response, outcome) = with_txn(Some(&req), st, |txn| {
        let ctx = &ctx;
        async move {
            let requester = players_repo::require_by_external_id(txn, &body.requester).await?;
            let outcome = SubmissionService
                .claim_place(ctx, st, txn, match_id, body.participant_id, requester.id)
                .await?;
            let (m, participants) = MatchService.get_match(txn, match_id).await?;
            Ok((MatchResponse::from_parts(m, participants), outcome))
        }
    })
    .await?;

    st.scheduler.apply(outcome.timers);
    notices::dispatch(&ctx, st, outcome.notices).await;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/matches/{id}/leaders")]
pub async fn claim_leader(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ClaimLeaderRequest>,
) -> Result<HttpResponse, AppError> {
    let match_id = path.into_inner();
    let body = body.into_inner();
    let ctx = request_ctx(&req);
    let st = state.get_ref();

    let (response, outcome) = with_txn(Some(&req), st, |txn| {
        let ctx = &ctx;
        async move {
            let requester = players_repo::require_by_external_id(txn, &body.requester).await?;
            let outcome = SubmissionService
                .claim_leader(ctx, st, txn, match_id, body.leader_id, requester.id)
                .await?;
            let (m, participants) = MatchService.get_match(txn, match_id).await?;
            Ok((MatchResponse::from_parts(m, participants), outcome))
        }
    })
    .await?;

    st.scheduler.apply(outcome.timers);
    notices::dispatch(&ctx, st, outcome.notices).await;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/matches/{id}/resubmission")]
pub async fn resubmit(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ResubmitRequest>,
) -> Result<HttpResponse, AppError> {
    let match_id = path.into_inner();
    let body = body.into_inner();
    let ctx = request_ctx(&req);
    let st = state.get_ref();

    let (response, outcome) = with_txn(Some(&req), st, |txn| {
        let ctx = &ctx;
        async move {
            let requester = players_repo::require_by_external_id(txn, &body.requester).await?;
            let outcome = ResubmissionService
                .resubmit(ctx, st, txn, match_id, requester.id, body.delegate_back)
                .await?;
            let (m, participants) = MatchService.get_match(txn, match_id).await?;
            Ok((MatchResponse::from_parts(m, participants), outcome))
        }
    })
    .await?;

    st.scheduler.apply(outcome.timers);
    notices::dispatch(&ctx, st, outcome.notices).await;
    Ok(HttpResponse::Ok().json(response))
}
