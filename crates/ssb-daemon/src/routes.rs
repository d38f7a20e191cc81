//! Axum router and all HTTP handlers for ssb-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Every `/v1/*` route except health and login sits behind
//! the bearer-session check.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use futures_util::{Stream, StreamExt};
use ssb_inventory::{
    adjust_zone_quantity, create_product, create_user, create_zone, delete_product, delete_user,
    delete_zone, list_consumption, list_products, list_users, list_zones, load_synthesis,
    load_zone_labels, reset_consumption, update_product, AuthError, InventoryError, NewProduct,
    NewZone, Session,
};
use ssb_schemas::{coerce, ConsumptionRecord, Product, UserProfile, ROLE_USER};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::{
    api_types::{
        CreateUserRequest, Entry, ErrorResponse, HealthResponse, LoginRequest, LoginResponse,
        ResetRequest, ResetResponse, SynthesisQuery, SynthesisResponse, SynthesisRowView,
        ZoneLabelsResponse, ZoneQuantityRequest, ZoneView,
    },
    state::{AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/v1/auth/logout", post(logout))
        .route("/v1/products", get(products_list).post(products_create))
        .route("/v1/products/:id", put(products_update).delete(products_delete))
        .route("/v1/zones", get(zones_list).post(zones_create))
        .route("/v1/zones/labels", get(zone_labels))
        .route("/v1/zones/:id", delete(zones_delete))
        .route("/v1/zones/:id/quantity", post(zones_quantity))
        .route("/v1/synthesis", get(synthesis))
        .route("/v1/synthesis/reset", post(synthesis_reset))
        .route("/v1/consumption", get(consumption_list))
        .route("/v1/users", get(users_list).post(users_create))
        .route("/v1/users/:id", delete(users_delete))
        .route("/v1/stream", get(stream))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_session,
        ));

    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/auth/login", post(login))
        .merge(protected)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Handler error: an [`InventoryError`] rendered as `{error, kind}`.
#[derive(Debug)]
pub(crate) struct ApiError(InventoryError);

impl From<InventoryError> for ApiError {
    fn from(e: InventoryError) -> Self {
        ApiError(e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError(InventoryError::Auth(e))
    }
}

pub(crate) fn status_for(e: &InventoryError) -> StatusCode {
    match e {
        InventoryError::Validation(_) => StatusCode::BAD_REQUEST,
        InventoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        InventoryError::Store(_) | InventoryError::ResetInterrupted { .. } => {
            StatusCode::BAD_GATEWAY
        }
        InventoryError::Auth(_) => StatusCode::UNAUTHORIZED,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!(kind = self.0.kind(), error = %self.0, "request failed");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            kind: self.0.kind().to_string(),
            code: match &self.0 {
                InventoryError::Auth(a) => Some(a.code().to_string()),
                _ => None,
            },
            deleted: match &self.0 {
                InventoryError::ResetInterrupted { deleted, .. } => Some(*deleted),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Session check
// ---------------------------------------------------------------------------

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub(crate) async fn require_session(
    State(st): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return ApiError::from(AuthError::InvalidCredential).into_response();
    };
    match st.accounts.validate(token).await {
        Ok(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            store_backend: st.store.backend_name().to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// /v1/auth
// ---------------------------------------------------------------------------

pub(crate) async fn login(
    State(st): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let session = st.accounts.sign_in(&req.email, &req.password).await?;
    Ok(Json(LoginResponse {
        token: session.token,
        uid: session.uid,
        email: session.email,
        expires_at: session.expires_at,
    }))
}

pub(crate) async fn logout(
    State(st): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<StatusCode, ApiError> {
    st.accounts.sign_out(&session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// /v1/products
// ---------------------------------------------------------------------------

pub(crate) async fn products_list(State(st): State<Arc<AppState>>) -> ApiResult<Vec<Entry<Product>>> {
    let products = list_products(st.store.as_ref()).await?;
    Ok(Json(
        products
            .into_iter()
            .map(|(id, record)| Entry { id, record })
            .collect(),
    ))
}

pub(crate) async fn products_create(
    State(st): State<Arc<AppState>>,
    Json(input): Json<NewProduct>,
) -> Result<(StatusCode, Json<Entry<Product>>), ApiError> {
    let (id, record) = create_product(st.store.as_ref(), input).await?;
    st.log("INFO", format!("produit ajouté: {}", record.designation));
    Ok((StatusCode::CREATED, Json(Entry { id, record })))
}

pub(crate) async fn products_update(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<NewProduct>,
) -> ApiResult<Entry<Product>> {
    let record = update_product(st.store.as_ref(), &id, input).await?;
    Ok(Json(Entry { id, record }))
}

pub(crate) async fn products_delete(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_product(st.store.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// /v1/zones
// ---------------------------------------------------------------------------

pub(crate) async fn zones_list(State(st): State<Arc<AppState>>) -> ApiResult<Vec<ZoneView>> {
    let zones = list_zones(st.store.as_ref()).await?;
    Ok(Json(
        zones
            .into_iter()
            .map(|(id, zone)| ZoneView::new(id, zone))
            .collect(),
    ))
}

pub(crate) async fn zones_create(
    State(st): State<Arc<AppState>>,
    Json(input): Json<NewZone>,
) -> Result<(StatusCode, Json<ZoneView>), ApiError> {
    let (id, zone) = create_zone(st.store.as_ref(), input).await?;
    st.log("INFO", format!("zone ajoutée: {}", zone.zone));
    Ok((StatusCode::CREATED, Json(ZoneView::new(id, zone))))
}

pub(crate) async fn zones_delete(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_zone(st.store.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn zones_quantity(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ZoneQuantityRequest>,
) -> ApiResult<ZoneView> {
    let zone = adjust_zone_quantity(
        st.store.as_ref(),
        &id,
        coerce::non_negative_int(req.lots),
        coerce::non_negative_int(req.units),
    )
    .await?;
    Ok(Json(ZoneView::new(id, zone)))
}

pub(crate) async fn zone_labels(State(st): State<Arc<AppState>>) -> ApiResult<ZoneLabelsResponse> {
    let zones = load_zone_labels(st.store.as_ref()).await?;
    Ok(Json(ZoneLabelsResponse { zones }))
}

// ---------------------------------------------------------------------------
// /v1/synthesis
// ---------------------------------------------------------------------------

pub(crate) async fn synthesis(
    State(st): State<Arc<AppState>>,
    Query(q): Query<SynthesisQuery>,
) -> ApiResult<SynthesisResponse> {
    let zone_filter = q.zone.filter(|z| !z.is_empty());
    let rows = load_synthesis(st.store.as_ref(), zone_filter.as_deref()).await?;
    Ok(Json(SynthesisResponse {
        zone_filter,
        rows: rows.into_iter().map(SynthesisRowView::from).collect(),
    }))
}

pub(crate) async fn synthesis_reset(
    State(st): State<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> ApiResult<ResetResponse> {
    let deleted = reset_consumption(st.store.as_ref(), &req.product, &req.zone).await?;
    info!(product = %req.product, zone = %req.zone, deleted, "synthesis/reset");
    st.log(
        "INFO",
        format!("sorties réinitialisées: {} / {} ({deleted})", req.product, req.zone),
    );
    Ok(Json(ResetResponse { deleted }))
}

pub(crate) async fn consumption_list(
    State(st): State<Arc<AppState>>,
) -> ApiResult<Vec<Entry<ConsumptionRecord>>> {
    let records = list_consumption(st.store.as_ref()).await?;
    Ok(Json(
        records
            .into_iter()
            .map(|(id, record)| Entry { id, record })
            .collect(),
    ))
}

// ---------------------------------------------------------------------------
// /v1/users
// ---------------------------------------------------------------------------

pub(crate) async fn users_list(State(st): State<Arc<AppState>>) -> ApiResult<Vec<Entry<UserProfile>>> {
    let users = list_users(st.store.as_ref()).await?;
    Ok(Json(
        users
            .into_iter()
            .map(|(id, record)| Entry { id, record })
            .collect(),
    ))
}

pub(crate) async fn users_create(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Entry<UserProfile>>), ApiError> {
    let explicit = req.password.as_deref().filter(|p| !p.is_empty());
    let initial = match (explicit, st.initial_password.as_deref()) {
        (Some(p), _) => p,
        (None, Some(p)) => p,
        (None, None) => {
            return Err(InventoryError::validation(
                "Aucun mot de passe initial n'est configuré; indiquez un mot de passe.",
            )
            .into())
        }
    };
    let role = req.role.as_deref().unwrap_or(ROLE_USER);

    let (id, record) = create_user(
        st.store.as_ref(),
        st.accounts.as_ref(),
        &req.email,
        explicit,
        initial,
        role,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(Entry { id, record })))
}

pub(crate) async fn users_delete(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_user(st.store.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(m.event_name()).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
