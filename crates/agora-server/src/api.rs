use std::sync::Arc;

use agora_shared::{Credential, PlatformType, ReportStatus};
use agora_store::{
    Comment, Currency, CurrencyUpdate, Experience, Network, NewComment, NewExperience, NewFriend,
    NewNetwork, NewPeople, NewPost, NewTag, NewTransaction, NewUser, NewUserSocialMedia, NewVote,
    Notification, People, Report, Store, User,
};
use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::fanout::FanOut;
use crate::pipeline::{
    Committed, Mutation, MutationContext, Pipeline, PostView, ReadGuard, ReportDetail, VoteCall,
    VoteGuard, VoteOutcome,
};
use crate::services::{CurrencyVerifier, RawCurrency, Services};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub services: Services,
    pub fanout: FanOut,
    pub pipeline: Arc<Pipeline>,
    pub votes: VoteGuard,
    pub reads: ReadGuard,
}

impl AppState {
    pub fn new(store: Store, verifier: Arc<dyn CurrencyVerifier>, fanout: FanOut) -> Self {
        let services = Services::new(store.clone(), verifier);
        Self {
            pipeline: Arc::new(Pipeline::new(services.clone(), fanout.clone())),
            votes: VoteGuard::new(services.clone()),
            reads: ReadGuard::new(services.clone()),
            store,
            services,
            fanout,
        }
    }

    async fn mutate(&self, args: Mutation) -> ApiResult<Json<Committed>> {
        let committed = self.pipeline.execute(MutationContext::create(args)).await?;
        Ok(Json(committed))
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(create_user))
        .route("/users/:id", get(read_user).delete(ban_user))
        .route("/users/:id/notifications", get(list_notifications))
        .route("/users/:id/notifications/count", get(count_notifications))
        .route("/notifications/read", patch(read_notifications))
        .route("/notifications/:id", get(read_notification_by_id).delete(delete_notification))
        .route("/notifications/:id/read", patch(read_notification))
        .route("/users/:id/wallets", post(link_wallet))
        .route("/users/:id/reports", post(report))
        .route("/users/:id/social-medias", post(link_social_media))
        .route("/networks", post(create_network))
        .route("/networks/:id/currencies", post(add_currency))
        .route("/currencies", get(list_currencies))
        .route(
            "/currencies/:id",
            get(get_currency).patch(update_currency).delete(delete_currency),
        )
        .route("/reports", get(list_reports))
        .route("/reports/:id", get(get_report).patch(review_report).delete(restore_report))
        .route("/posts", post(create_post))
        .route("/posts/:id", get(read_post).delete(remove_post))
        .route("/comments", post(create_comment))
        .route("/comments/:id", get(read_comment).delete(remove_comment))
        .route("/transactions", post(create_transaction))
        .route("/friends", post(request_friend))
        .route("/votes", post(create_vote).put(cast_vote))
        .route("/votes/:id", axum::routing::delete(delete_vote))
        .route("/tags", post(create_tag))
        .route("/experiences", post(create_experience))
        .route("/experiences/:id", get(read_experience))
        .route("/experiences/:id/posts/:post_id", post(add_experience_post))
        .route("/people", post(create_people))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// The user a read is made on behalf of.
#[derive(Debug, Default, Deserialize)]
struct ViewerQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReadFilter {
    read: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusFilter {
    status: Option<ReportStatus>,
}

#[derive(Deserialize)]
struct ReviewRequest {
    status: ReportStatus,
}

#[derive(Serialize)]
struct CountResponse {
    count: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SocialMediaRequest {
    people_id: String,
    platform: PlatformType,
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    primary: bool,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─── Users ───

async fn create_user(
    State(state): State<AppState>,
    Json(new): Json<NewUser>,
) -> ApiResult<Json<Committed>> {
    state.mutate(Mutation::User(new)).await
}

async fn read_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(viewer): Query<ViewerQuery>,
) -> ApiResult<Json<Option<User>>> {
    Ok(Json(state.reads.read_user(&id, viewer.user_id.as_deref())?))
}

async fn ban_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let banned = state.store.with(|db| {
        db.get_user(&id)?;
        db.soft_delete_user(&id)
    })?;
    if banned {
        info!(user = %id, "user banned");
    }
    Ok(Json(serde_json::json!({ "deleted": banned })))
}

async fn list_notifications(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(state.store.with(|db| db.list_notifications_for(&id))?))
}

async fn count_notifications(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(filter): Query<ReadFilter>,
) -> ApiResult<Json<CountResponse>> {
    let count = state.store.with(|db| db.count_notifications(&id, filter.read))?;
    Ok(Json(CountResponse { count }))
}

// ─── Notifications ───

async fn read_notification_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(state.store.with(|db| db.get_notification(&id))?))
}

async fn read_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.with(|db| db.mark_notification_read(&id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_notifications(
    State(state): State<AppState>,
    Json(ids): Json<Vec<String>>,
) -> ApiResult<Json<CountResponse>> {
    let matched = state.store.with(|db| db.mark_notifications_read(&ids))?;
    Ok(Json(CountResponse {
        count: matched as i64,
    }))
}

async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.with(|db| {
        db.get_notification(&id)?;
        db.delete_notification(&id)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Reports ───

async fn list_reports(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(state.services.report.list(filter.status)?))
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Report>> {
    Ok(Json(state.services.report.find(&id)?))
}

/// Record the review outcome, then tell the content owner and the
/// reporters in the background.
async fn review_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<Json<Report>> {
    let report = state.services.report.review(&id, req.status)?;

    let notification = state.services.notification.clone();
    let reviewed = report.clone();
    state.fanout.submit("report-response", async move {
        notification.send_report_response_to_user(&reviewed)?;
        notification.send_report_response_to_reporters(&reviewed)?;
        Ok(())
    });

    Ok(Json(report))
}

async fn restore_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.services.report.restore(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn link_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(credential): Json<Credential>,
) -> ApiResult<Json<Committed>> {
    state
        .mutate(Mutation::UserWallet {
            user_id,
            credential,
            wallet: None,
        })
        .await
}

async fn report(
    State(state): State<AppState>,
    Path(reported_by): Path<String>,
    Json(detail): Json<ReportDetail>,
) -> ApiResult<Json<Committed>> {
    state
        .mutate(Mutation::UserReport {
            reported_by,
            detail,
        })
        .await
}

async fn link_social_media(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<SocialMediaRequest>,
) -> ApiResult<Json<Committed>> {
    state
        .mutate(Mutation::UserSocialMedia(NewUserSocialMedia {
            user_id,
            people_id: req.people_id,
            platform: req.platform,
            verified: req.verified,
            primary: req.primary,
        }))
        .await
}

// ─── Networks ───

async fn create_network(
    State(state): State<AppState>,
    Json(new): Json<NewNetwork>,
) -> ApiResult<Json<Network>> {
    if new.id.trim().is_empty() || new.rpc_url.trim().is_empty() {
        return Err(ApiError::BadRequest("Network id and rpcUrl are required".into()));
    }
    Ok(Json(state.store.with(|db| db.create_network(&new))?))
}

async fn add_currency(
    State(state): State<AppState>,
    Path(network_id): Path<String>,
    Json(raw): Json<RawCurrency>,
) -> ApiResult<Json<Committed>> {
    state
        .mutate(Mutation::NetworkCurrency {
            network_id,
            raw,
            verified: None,
        })
        .await
}

async fn list_currencies(State(state): State<AppState>) -> ApiResult<Json<Vec<Currency>>> {
    Ok(Json(state.store.with(|db| db.list_currencies())?))
}

async fn get_currency(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Currency>> {
    Ok(Json(state.services.currency.find(&id)?))
}

async fn update_currency(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<CurrencyUpdate>,
) -> ApiResult<Json<Currency>> {
    Ok(Json(state.store.with(|db| db.update_currency(&id, &update))?))
}

async fn delete_currency(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.with(|db| {
        db.get_currency(&id)?;
        db.delete_currency(&id)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Posts and comments ───

async fn create_post(
    State(state): State<AppState>,
    Json(new): Json<NewPost>,
) -> ApiResult<Json<Committed>> {
    state.mutate(Mutation::Post(new)).await
}

async fn read_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(viewer): Query<ViewerQuery>,
) -> ApiResult<Json<Option<PostView>>> {
    Ok(Json(state.reads.read_post(&id, viewer.user_id.as_deref())?))
}

async fn remove_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = state.store.with(|db| {
        db.get_post(&id)?;
        db.soft_delete_post(&id)
    })?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

async fn create_comment(
    State(state): State<AppState>,
    Json(new): Json<NewComment>,
) -> ApiResult<Json<Committed>> {
    state.mutate(Mutation::Comment(new)).await
}

async fn read_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Comment>>> {
    Ok(Json(state.reads.read_comment(&id)?))
}

async fn remove_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = state.store.with(|db| {
        db.get_comment(&id)?;
        db.soft_delete_comment(&id)
    })?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

// ─── Transactions, friends, votes, tags ───

async fn create_transaction(
    State(state): State<AppState>,
    Json(new): Json<NewTransaction>,
) -> ApiResult<Json<Committed>> {
    state.mutate(Mutation::Transaction(new)).await
}

async fn request_friend(
    State(state): State<AppState>,
    Json(request): Json<NewFriend>,
) -> ApiResult<Json<Committed>> {
    state
        .mutate(Mutation::Friend {
            request,
            plan: None,
        })
        .await
}

async fn create_vote(
    State(state): State<AppState>,
    Json(new): Json<NewVote>,
) -> ApiResult<Json<Committed>> {
    state.mutate(Mutation::Vote(new)).await
}

async fn cast_vote(
    State(state): State<AppState>,
    Json(new): Json<NewVote>,
) -> ApiResult<Json<VoteOutcome>> {
    Ok(Json(state.votes.call(VoteCall::Create(new))?))
}

async fn delete_vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VoteOutcome>> {
    Ok(Json(state.votes.call(VoteCall::DeleteById(id))?))
}

async fn create_tag(
    State(state): State<AppState>,
    Json(new): Json<NewTag>,
) -> ApiResult<Json<Committed>> {
    state.mutate(Mutation::Tag(new)).await
}

// ─── Experiences and people ───

async fn create_experience(
    State(state): State<AppState>,
    Json(new): Json<NewExperience>,
) -> ApiResult<Json<Experience>> {
    Ok(Json(state.store.with(|db| db.create_experience(&new))?))
}

async fn read_experience(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Experience>>> {
    Ok(Json(state.reads.read_experience(&id)?))
}

async fn add_experience_post(
    State(state): State<AppState>,
    Path((experience_id, post_id)): Path<(String, String)>,
) -> ApiResult<Json<Committed>> {
    state
        .mutate(Mutation::ExperiencePost {
            experience_id,
            post_id,
            experience_index: None,
        })
        .await
}

async fn create_people(
    State(state): State<AppState>,
    Json(new): Json<NewPeople>,
) -> ApiResult<Json<People>> {
    Ok(Json(state.store.with(|db| db.create_people(&new))?))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
