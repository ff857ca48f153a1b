//! Handlers for OpenGround: run one prompt against several providers and
//! keep the comparison.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use llmscope_core::openground::{
    validate_custom_prompt, validate_selections, PromptSource, ProviderSelection,
};
use llmscope_core::prompts::compile;
use llmscope_core::types::DbId;
use llmscope_db::models::openground::{NewOpengroundRequest, OpengroundRun, RunOpenground};
use llmscope_db::repositories::{OpengroundRepo, VaultRepo};
use llmscope_providers::{run_evaluation, ProviderError, ProviderTarget};

use super::prompts::{find_prompt, resolve_version};
use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// The prompt a run sends, after resolving its source.
struct ResolvedPrompt {
    text: String,
    prompt_id: Option<DbId>,
    version: Option<String>,
    variables: HashMap<String, String>,
}

/// POST /api/v1/openground
///
/// Call every selected provider concurrently, persist the results in input
/// order with the run's stats, and return the run. Provider failures are
/// recorded on their own result and never fail the request.
pub async fn run_openground(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RunOpenground>,
) -> AppResult<impl IntoResponse> {
    validate_selections(&input.providers)?;
    if let PromptSource::Custom { prompt } = &input.prompt_source {
        validate_custom_prompt(prompt)?;
    }

    auth.ensure_member(&state).await?;
    let prompt = resolve_prompt(&state, auth.org_id, &input.prompt_source).await?;

    let mut targets = Vec::with_capacity(input.providers.len());
    for selection in input.providers {
        let client = provider_key(&state, auth.org_id, &selection)
            .await?
            .and_then(|key| state.providers.client_for(selection.provider, key));
        targets.push(ProviderTarget { selection, client });
    }

    let (results, stats) = run_evaluation(&prompt.text, targets).await;

    let stats_json = serde_json::to_value(&stats)
        .map_err(|e| AppError::InternalError(format!("Stats serialization error: {e}")))?;
    let variables_json = serde_json::to_value(&prompt.variables)
        .map_err(|e| AppError::InternalError(format!("Variables serialization error: {e}")))?;

    let header = NewOpengroundRequest {
        org_id: auth.org_id,
        prompt_source: input.prompt_source.kind(),
        prompt: &prompt.text,
        prompt_id: prompt.prompt_id,
        prompt_version: prompt.version.as_deref(),
        variables: variables_json,
        stats: stats_json,
        total_providers: stats.total_providers as i32,
        error_count: stats.errors.len() as i32,
        created_by: auth.user_id,
    };
    let (request, rows) = OpengroundRepo::create(&state.pool, &header, &results).await?;

    tracing::info!(
        openground_id = request.id,
        providers = stats.total_providers,
        errors = stats.errors.len(),
        user_id = auth.user_id,
        "OpenGround run completed",
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: OpengroundRun {
                request,
                results: rows,
            },
        }),
    ))
}

/// GET /api/v1/openground
///
/// Run headers with their stats, newest first.
pub async fn list_runs(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.resolve();
    let runs = OpengroundRepo::list(&state.pool, auth.org_id, limit, offset).await?;
    Ok(Json(DataResponse { data: runs }))
}

/// GET /api/v1/openground/{id}
pub async fn get_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = OpengroundRepo::find_by_id(&state.pool, id, auth.org_id)
        .await?
        .ok_or_else(|| not_found("OpengroundRequest", id))?;
    let results = OpengroundRepo::list_results(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: OpengroundRun { request, results },
    }))
}

/// DELETE /api/v1/openground/{id}
pub async fn delete_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    auth.ensure_member(&state).await?;
    if !OpengroundRepo::delete(&state.pool, id, auth.org_id).await? {
        return Err(not_found("OpengroundRequest", id));
    }
    tracing::info!(openground_id = id, user_id = auth.user_id, "OpenGround run deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn resolve_prompt(
    state: &AppState,
    org_id: Option<DbId>,
    source: &PromptSource,
) -> AppResult<ResolvedPrompt> {
    match source {
        PromptSource::Custom { prompt } => Ok(ResolvedPrompt {
            text: prompt.clone(),
            prompt_id: None,
            version: None,
            variables: HashMap::new(),
        }),
        PromptSource::PromptHub {
            prompt_id,
            version,
            variables,
        } => {
            let prompt = find_prompt(state, *prompt_id, org_id).await?;
            let row = resolve_version(state, &prompt, version.as_deref()).await?;
            let compiled = compile(&row.prompt, variables);
            if !compiled.missing_variables.is_empty() {
                tracing::debug!(
                    prompt_id,
                    missing = ?compiled.missing_variables,
                    "Prompt compiled with unresolved placeholders",
                );
            }
            Ok(ResolvedPrompt {
                text: compiled.text,
                prompt_id: Some(prompt.id),
                version: Some(row.version),
                variables: variables.clone(),
            })
        }
    }
}

/// The API key a selection should use.
///
/// `Ok(Ok(None))` means "use the server-wide key". A secret that is missing
/// or cannot be decrypted is an error for this provider only; a database
/// failure fails the whole request.
async fn provider_key(
    state: &AppState,
    org_id: Option<DbId>,
    selection: &ProviderSelection,
) -> AppResult<Result<Option<String>, ProviderError>> {
    let Some(key) = &selection.api_key_secret else {
        return Ok(Ok(None));
    };
    let Some(secret) = VaultRepo::find_by_key(&state.pool, key, org_id).await? else {
        return Ok(Err(ProviderError::MissingApiKey(format!(
            "vault secret '{key}' not found"
        ))));
    };
    Ok(match state.cipher.decrypt(&secret.encrypted_value) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Vault secret could not be decrypted");
            Err(ProviderError::MissingApiKey(format!(
                "vault secret '{key}' could not be decrypted"
            )))
        }
    })
}
