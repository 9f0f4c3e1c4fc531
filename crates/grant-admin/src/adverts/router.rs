use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{Actor, AdminId, AdvertId, SchemeId};
use super::repository::{AdvertEventPublisher, AdvertRepository, RepositoryError};
use super::response::PageResponse;
use super::service::{AdvertServiceError, GrantAdvertService};

/// Header the upstream session layer sets to the authenticated admin's id.
pub const ADMIN_ID_HEADER: &str = "x-admin-id";

pub struct AdvertRouterState<R, E> {
    service: Arc<GrantAdvertService<R, E>>,
    lambda_secret: Option<Arc<str>>,
}

impl<R, E> AdvertRouterState<R, E> {
    pub(crate) fn new(
        service: Arc<GrantAdvertService<R, E>>,
        lambda_secret: Option<String>,
    ) -> Self {
        Self {
            service,
            lambda_secret: lambda_secret.map(Arc::from),
        }
    }
}

impl<R, E> Clone for AdvertRouterState<R, E> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            lambda_secret: self.lambda_secret.clone(),
        }
    }
}

/// Router builder exposing the advert authoring and publishing endpoints.
pub fn advert_router<R, E>(
    service: Arc<GrantAdvertService<R, E>>,
    lambda_secret: Option<String>,
) -> Router
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    let state = AdvertRouterState::new(service, lambda_secret);

    Router::new()
        .route("/grant-advert", get(list_handler::<R, E>))
        .route("/grant-advert/create", post(create_handler::<R, E>))
        .route(
            "/grant-advert/:advert_id",
            get(get_handler::<R, E>).delete(delete_handler::<R, E>),
        )
        .route(
            "/grant-advert/:advert_id/sections",
            get(sections_handler::<R, E>),
        )
        .route(
            "/grant-advert/:advert_id/sections/:section_id/pages/:page_id",
            get(page_handler::<R, E>).post(update_page_handler::<R, E>),
        )
        .route(
            "/grant-advert/:advert_id/publish",
            post(publish_handler::<R, E>),
        )
        .route(
            "/grant-advert/:advert_id/unpublish",
            post(unpublish_handler::<R, E>),
        )
        .route(
            "/grant-advert/:advert_id/schedule",
            post(schedule_handler::<R, E>),
        )
        .route(
            "/grant-advert/:advert_id/publish-information",
            get(publishing_information_handler::<R, E>),
        )
        .route(
            "/grant-advert/lambda/:advert_id/publish",
            post(lambda_publish_handler::<R, E>),
        )
        .route(
            "/grant-advert/lambda/:advert_id/unpublish",
            post(lambda_unpublish_handler::<R, E>),
        )
        .route(
            "/grant-advert/lambda/:advert_id/unschedule",
            post(lambda_unschedule_handler::<R, E>),
        )
        .with_state(state)
}

/// Authenticated admin making an interactive request.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession(pub AdminId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ADMIN_ID_HEADER)
            .ok_or(AuthRejection::MissingSession)?;
        let admin_id = raw
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
            .ok_or(AuthRejection::InvalidSession)?;
        Ok(Self(AdminId(admin_id)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthRejection {
    #[error("no admin session present")]
    MissingSession,
    #[error("admin session is invalid")]
    InvalidSession,
    #[error("lambda credentials missing or incorrect")]
    InvalidLambdaSecret,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.to_string() });
        (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
    }
}

fn authorize_lambda(headers: &HeaderMap, secret: Option<&str>) -> Result<(), AuthRejection> {
    let presented = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    match (secret, presented) {
        (Some(expected), Some(presented)) if expected == presented => Ok(()),
        _ => Err(AuthRejection::InvalidLambdaSecret),
    }
}

impl IntoResponse for AdvertServiceError {
    fn into_response(self) -> Response {
        let (status, payload) = match &self {
            AdvertServiceError::NotFound(_)
            | AdvertServiceError::Repository(RepositoryError::NotFound) => {
                (StatusCode::NOT_FOUND, json!({ "error": self.to_string() }))
            }
            AdvertServiceError::AccessDenied { .. } => {
                (StatusCode::FORBIDDEN, json!({ "error": self.to_string() }))
            }
            AdvertServiceError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation failed",
                    "field_errors": errors.errors,
                }),
            ),
            AdvertServiceError::InvalidTransition { .. }
            | AdvertServiceError::Repository(RepositoryError::Conflict) => {
                (StatusCode::CONFLICT, json!({ "error": self.to_string() }))
            }
            AdvertServiceError::Repository(_) | AdvertServiceError::Cms(_) => {
                error!(error = %self, "grant advert request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error" }),
                )
            }
        };

        (status, Json(payload)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateAdvertRequest {
    pub(crate) grant_scheme_id: SchemeId,
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SchemeQuery {
    pub(crate) grant_scheme_id: SchemeId,
}

pub(crate) async fn list_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    AdminSession(admin): AdminSession,
    Query(query): Query<SchemeQuery>,
) -> Result<Response, AdvertServiceError>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    let adverts = state.service.list_for_scheme(admin, query.grant_scheme_id)?;
    Ok(Json(adverts).into_response())
}

pub(crate) async fn create_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    AdminSession(admin): AdminSession,
    Json(request): Json<CreateAdvertRequest>,
) -> Result<Response, AdvertServiceError>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    let advert = state
        .service
        .create(admin, request.grant_scheme_id, &request.name)?;
    Ok((StatusCode::CREATED, Json(advert.summary())).into_response())
}

pub(crate) async fn get_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    AdminSession(admin): AdminSession,
    Path(advert_id): Path<AdvertId>,
) -> Result<Response, AdvertServiceError>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    let advert = state.service.get(admin, advert_id)?;
    Ok(Json(advert).into_response())
}

pub(crate) async fn delete_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    AdminSession(admin): AdminSession,
    Path(advert_id): Path<AdvertId>,
) -> Result<Response, AdvertServiceError>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    state.service.delete(admin, advert_id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn sections_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    AdminSession(admin): AdminSession,
    Path(advert_id): Path<AdvertId>,
) -> Result<Response, AdvertServiceError>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    let view = state.service.sections_overview(admin, advert_id)?;
    Ok(Json(view).into_response())
}

pub(crate) async fn page_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    AdminSession(admin): AdminSession,
    Path((advert_id, section_id, page_id)): Path<(AdvertId, String, String)>,
) -> Result<Response, AdvertServiceError>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    let view = state
        .service
        .page(admin, advert_id, &section_id, &page_id)?;
    Ok(Json(view).into_response())
}

/// The page id in the path wins over any id in the body.
pub(crate) async fn update_page_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    AdminSession(admin): AdminSession,
    Path((advert_id, section_id, page_id)): Path<(AdvertId, String, String)>,
    Json(mut page): Json<PageResponse>,
) -> Result<Response, AdvertServiceError>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    page.id = page_id;
    let view = state
        .service
        .update_page(admin, advert_id, &section_id, page)?;
    Ok(Json(view).into_response())
}

pub(crate) async fn publish_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    AdminSession(admin): AdminSession,
    Path(advert_id): Path<AdvertId>,
) -> Result<Response, AdvertServiceError>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    let advert = state
        .service
        .publish(Actor::Admin(admin), advert_id)
        .await?;
    Ok(Json(advert.publishing_information()).into_response())
}

pub(crate) async fn unpublish_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    AdminSession(admin): AdminSession,
    Path(advert_id): Path<AdvertId>,
) -> Result<Response, AdvertServiceError>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    let advert = state
        .service
        .unpublish(Actor::Admin(admin), advert_id)
        .await?;
    Ok(Json(advert.publishing_information()).into_response())
}

pub(crate) async fn schedule_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    AdminSession(admin): AdminSession,
    Path(advert_id): Path<AdvertId>,
) -> Result<Response, AdvertServiceError>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    let advert = state.service.schedule(admin, advert_id)?;
    Ok(Json(advert.publishing_information()).into_response())
}

pub(crate) async fn publishing_information_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    AdminSession(admin): AdminSession,
    Path(advert_id): Path<AdvertId>,
) -> Result<Response, AdvertServiceError>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    let view = state.service.publishing_information(admin, advert_id)?;
    Ok(Json(view).into_response())
}

pub(crate) async fn lambda_publish_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    headers: HeaderMap,
    Path(advert_id): Path<AdvertId>,
) -> Response
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    if let Err(rejection) = authorize_lambda(&headers, state.lambda_secret.as_deref()) {
        return rejection.into_response();
    }
    match state.service.publish(Actor::Lambda, advert_id).await {
        Ok(advert) => Json(advert.publishing_information()).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn lambda_unpublish_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    headers: HeaderMap,
    Path(advert_id): Path<AdvertId>,
) -> Response
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    if let Err(rejection) = authorize_lambda(&headers, state.lambda_secret.as_deref()) {
        return rejection.into_response();
    }
    match state.service.unpublish(Actor::Lambda, advert_id).await {
        Ok(advert) => Json(advert.publishing_information()).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn lambda_unschedule_handler<R, E>(
    State(state): State<AdvertRouterState<R, E>>,
    headers: HeaderMap,
    Path(advert_id): Path<AdvertId>,
) -> Response
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    if let Err(rejection) = authorize_lambda(&headers, state.lambda_secret.as_deref()) {
        return rejection.into_response();
    }
    match state.service.unschedule(Actor::Lambda, advert_id) {
        Ok(advert) => Json(advert.publishing_information()).into_response(),
        Err(err) => err.into_response(),
    }
}
