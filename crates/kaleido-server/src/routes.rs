use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use kaleido_core::error::AppError;
use kaleido_core::models::{AskRequest, ModelKind};
use kaleido_core::traits::{ImageOrigin, ImageStore, LlmBackend, Portal};

use crate::dto::{
    AskAiRequest, AskAiResponse, ChangeEffectRequest, ChangeEffectResponse, EffectDto,
    EffectImageRequest, EffectImageResponse, EffectListRequest, EffectListResponse, HealthResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

/// Build the full router with all routes.
///
/// Each POST endpoint also answers `OPTIONS` with 204 for the CORS
/// preflight contract; wrong methods get axum's automatic 405.
pub fn router<P, S, O, L>(state: Arc<AppState<P, S, O, L>>) -> Router
where
    P: Portal + 'static,
    S: ImageStore + 'static,
    O: ImageOrigin + 'static,
    L: LlmBackend + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route(
            "/get-effect-list",
            post(get_effect_list::<P, S, O, L>).options(preflight),
        )
        .route(
            "/change-effect",
            post(change_effect::<P, S, O, L>).options(preflight),
        )
        .route(
            "/get-effect-image",
            post(get_effect_image::<P, S, O, L>).options(preflight),
        )
        .route("/ask-ai", post(ask_ai::<P, S, O, L>).options(preflight))
        .with_state(state)
}

/// CORS preflight: 204 with no body.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

// ---------------------------------------------------------------------------
// Effect list
// ---------------------------------------------------------------------------

pub async fn get_effect_list<P, S, O, L>(
    State(state): State<Arc<AppState<P, S, O, L>>>,
    Json(body): Json<EffectListRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    P: Portal,
    S: ImageStore,
    O: ImageOrigin,
    L: LlmBackend,
{
    let session_id = if body.session_id.is_empty() {
        state
            .portal
            .login(&body.mail_address, &body.password)
            .await?
    } else {
        body.session_id
    };

    let page = state.portal.effect_list(&session_id, body.page).await?;

    Ok(Json(EffectListResponse {
        session_id,
        dl_sec_key: page.dl_sec_key,
        effects: page.effects.into_iter().map(EffectDto::from).collect(),
        is_next: page.has_next,
    }))
}

// ---------------------------------------------------------------------------
// Change effect
// ---------------------------------------------------------------------------

pub async fn change_effect<P, S, O, L>(
    State(state): State<Arc<AppState<P, S, O, L>>>,
    Json(body): Json<ChangeEffectRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    P: Portal,
    S: ImageStore,
    O: ImageOrigin,
    L: LlmBackend,
{
    let outcome = state
        .portal
        .change_effect(&body.session_id, &body.hash_id, &body.dl_sec_key)
        .await?;

    Ok(Json(ChangeEffectResponse {
        succeed: outcome.succeed,
        session_id: outcome.session_id,
        dl_sec_key: outcome.dl_sec_key,
    }))
}

// ---------------------------------------------------------------------------
// Effect image
// ---------------------------------------------------------------------------

pub async fn get_effect_image<P, S, O, L>(
    State(state): State<Arc<AppState<P, S, O, L>>>,
    Json(body): Json<EffectImageRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    P: Portal,
    S: ImageStore,
    O: ImageOrigin,
    L: LlmBackend,
{
    let bytes = state.images.get_image(&body.effect_id).await?;

    Ok(Json(EffectImageResponse {
        succeed: true,
        image: BASE64.encode(bytes.as_slice()),
    }))
}

// ---------------------------------------------------------------------------
// Ask AI
// ---------------------------------------------------------------------------

pub async fn ask_ai<P, S, O, L>(
    State(state): State<Arc<AppState<P, S, O, L>>>,
    Json(body): Json<AskAiRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    P: Portal,
    S: ImageStore,
    O: ImageOrigin,
    L: LlmBackend,
{
    let model = body
        .model
        .parse::<ModelKind>()
        .map_err(AppError::InvalidInput)?;

    let reply = state
        .llm
        .ask(&AskRequest {
            model,
            prompt: body.prompt,
            image_data: body.image,
            system_instructions: body.system_instructions,
            temperature: body.temperature,
            response_format: body.response_format,
        })
        .await?;

    Ok(Json(AskAiResponse {
        message: reply.message,
    }))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}
