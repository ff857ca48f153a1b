//! Handlers for the Prompt Hub: prompts, versions and compilation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use llmscope_core::prompts::{
    compile, extract_variables, next_version, validate_prompt_name, validate_prompt_text,
    validate_tags, PromptVersion, VersionBump, VersionStatus, INITIAL_VERSION,
};
use llmscope_core::types::DbId;
use llmscope_db::models::prompt::{
    CompilePromptRequest, CompilePromptResponse, CreatePrompt, CreatePromptVersion,
    NewPromptVersion, Prompt, PromptDetail, PromptVersionRow,
};
use llmscope_db::repositories::PromptRepo;
use validator::Validate;

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::{PaginationParams, VersionParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/prompts
///
/// Create a prompt with its first version, `1.0.0`.
pub async fn create_prompt(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePrompt>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_prompt_name(&input.name)?;
    validate_prompt_text(&input.prompt)?;
    validate_tags(&input.tags)?;
    let status = parse_status(input.status.as_deref())?;

    let version: PromptVersion = INITIAL_VERSION.parse()?;
    let variables = extract_variables(&input.prompt);
    let meta_properties = input.meta_properties.unwrap_or_else(|| serde_json::json!({}));
    let first = new_version(
        INITIAL_VERSION,
        version,
        &input.prompt,
        &variables,
        &input.tags,
        &meta_properties,
        status,
    );

    auth.ensure_member(&state).await?;
    let (prompt, version) = PromptRepo::create(
        &state.pool,
        auth.org_id,
        auth.user_id,
        input.name.trim(),
        input.description.as_deref(),
        &first,
    )
    .await?;

    tracing::info!(prompt_id = prompt.id, user_id = auth.user_id, "Prompt created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PromptDetail {
                prompt,
                version: Some(version),
            },
        }),
    ))
}

/// GET /api/v1/prompts
pub async fn list_prompts(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.resolve();
    let prompts = PromptRepo::list(&state.pool, auth.org_id, limit, offset).await?;
    Ok(Json(DataResponse { data: prompts }))
}

/// GET /api/v1/prompts/{id}?version=
///
/// The prompt with the requested version, or the latest one.
pub async fn get_prompt(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<VersionParams>,
) -> AppResult<impl IntoResponse> {
    let prompt = find_prompt(&state, id, auth.org_id).await?;
    let version = resolve_version(&state, &prompt, params.version.as_deref()).await?;
    Ok(Json(DataResponse {
        data: PromptDetail {
            prompt,
            version: Some(version),
        },
    }))
}

/// DELETE /api/v1/prompts/{id}
pub async fn delete_prompt(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    auth.ensure_member(&state).await?;
    if !PromptRepo::delete(&state.pool, id, auth.org_id).await? {
        return Err(not_found("Prompt", id));
    }
    tracing::info!(prompt_id = id, user_id = auth.user_id, "Prompt deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/prompts/{id}/versions
///
/// Add a version that bumps the latest by `bump` (default `patch`).
pub async fn create_version(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreatePromptVersion>,
) -> AppResult<impl IntoResponse> {
    validate_prompt_text(&input.prompt)?;
    validate_tags(&input.tags)?;
    let bump = match input.bump.as_deref() {
        Some(b) => b.parse::<VersionBump>()?,
        None => VersionBump::default(),
    };
    let status = parse_status(input.status.as_deref())?;

    auth.ensure_member(&state).await?;
    find_prompt(&state, id, auth.org_id).await?;
    let version_string = match PromptRepo::latest_version(&state.pool, id).await? {
        Some(latest) => next_version(&latest.version, bump)?,
        None => INITIAL_VERSION.to_string(),
    };
    let version: PromptVersion = version_string.parse()?;

    let variables = extract_variables(&input.prompt);
    let meta_properties = input.meta_properties.unwrap_or_else(|| serde_json::json!({}));
    let row = PromptRepo::create_version(
        &state.pool,
        id,
        auth.user_id,
        &new_version(
            &version_string,
            version,
            &input.prompt,
            &variables,
            &input.tags,
            &meta_properties,
            status,
        ),
    )
    .await?;

    tracing::info!(
        prompt_id = id,
        version = %row.version,
        user_id = auth.user_id,
        "Prompt version created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: row })))
}

/// GET /api/v1/prompts/{id}/versions
///
/// All versions, newest first.
pub async fn list_versions(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_prompt(&state, id, auth.org_id).await?;
    let versions = PromptRepo::list_versions(&state.pool, id).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// POST /api/v1/prompts/{id}/compile
///
/// Substitute `{{ variables }}` into a version (latest by default).
pub async fn compile_prompt(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CompilePromptRequest>,
) -> AppResult<impl IntoResponse> {
    let prompt = find_prompt(&state, id, auth.org_id).await?;
    let version = resolve_version(&state, &prompt, input.version.as_deref()).await?;
    let compiled = compile(&version.prompt, &input.variables);

    Ok(Json(DataResponse {
        data: CompilePromptResponse {
            prompt_id: prompt.id,
            version: version.version,
            compiled: compiled.text,
            missing_variables: compiled.missing_variables,
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn find_prompt(
    state: &AppState,
    id: DbId,
    org_id: Option<DbId>,
) -> AppResult<Prompt> {
    PromptRepo::find_by_id(&state.pool, id, org_id)
        .await?
        .ok_or_else(|| not_found("Prompt", id))
}

/// The requested version of `prompt`, or its latest when `version` is
/// `None`.
pub(crate) async fn resolve_version(
    state: &AppState,
    prompt: &Prompt,
    version: Option<&str>,
) -> AppResult<PromptVersionRow> {
    let row = match version {
        Some(v) => {
            let v: PromptVersion = v.parse()?;
            PromptRepo::find_version(&state.pool, prompt.id, &v.to_string()).await?
        }
        None => PromptRepo::latest_version(&state.pool, prompt.id).await?,
    };
    // Unknown versions map to 404 like any missing row.
    row.ok_or(AppError::Database(sqlx::Error::RowNotFound))
}

fn parse_status(status: Option<&str>) -> AppResult<VersionStatus> {
    Ok(match status {
        Some(s) => s.parse()?,
        None => VersionStatus::default(),
    })
}

fn new_version<'a>(
    version_string: &'a str,
    version: PromptVersion,
    prompt: &'a str,
    variables: &'a [String],
    tags: &'a [String],
    meta_properties: &'a serde_json::Value,
    status: VersionStatus,
) -> NewPromptVersion<'a> {
    NewPromptVersion {
        version: version_string,
        major: version.major as i32,
        minor: version.minor as i32,
        patch: version.patch as i32,
        prompt,
        variables,
        tags,
        meta_properties,
        status: status.as_str(),
    }
}
