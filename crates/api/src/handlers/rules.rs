//! Handlers for the rule engine: rule CRUD, entity bindings, trace
//! filtering and evaluation.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use llmscope_core::prompts::compile;
use llmscope_core::rules::limits::{validate_evaluate_fields, validate_rule_name};
use llmscope_core::rules::sql::compile_rule;
use llmscope_core::rules::{matching_rule_ids, EntityType, GroupOperator, RuleStatus};
use llmscope_core::types::DbId;
use llmscope_db::models::rule::{
    validate_entity, validate_groups, CreateRule, EntityData, EvaluateRequest, EvaluateResponse,
    ReplaceConditions, RuleEntity, RuleEntityInput, UpdateRule,
};
use llmscope_db::repositories::rule_repo::NewRule;
use llmscope_db::repositories::{PromptRepo, RuleEntityRepo, RuleRepo, TraceRepo};
use serde_json::json;

use crate::error::{not_found, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::{EntitySearchParams, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Column of `traces` that rule filters run against.
const TRACE_ATTRIBUTES_COLUMN: &str = "attributes";

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// POST /api/v1/rules
///
/// Create a rule, optionally with its condition groups and entity bindings.
pub async fn create_rule(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateRule>,
) -> AppResult<impl IntoResponse> {
    validate_rule_name(&input.name, input.description.as_deref())?;
    let group_operator = match &input.group_operator {
        Some(op) => op.parse()?,
        None => GroupOperator::And,
    };
    let status = match &input.status {
        Some(s) => s.parse()?,
        None => RuleStatus::Active,
    };
    let groups = validate_groups(&input.groups)?;
    let entities = input
        .entities
        .iter()
        .map(validate_entity)
        .collect::<Result<Vec<_>, _>>()?;

    let new_rule = NewRule {
        org_id: auth.org_id,
        name: input.name.trim(),
        description: input.description.as_deref(),
        group_operator,
        status,
        created_by: auth.user_id,
    };

    auth.ensure_member(&state).await?;
    let row = RuleRepo::create(&state.pool, &new_rule, &groups, &entities).await?;
    let detail = RuleRepo::find_detail(&state.pool, row.id, auth.org_id)
        .await?
        .ok_or_else(|| not_found("Rule", row.id))?;

    tracing::info!(rule_id = row.id, user_id = auth.user_id, "Rule created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /api/v1/rules
pub async fn list_rules(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.resolve();
    let rules = RuleRepo::list(&state.pool, auth.org_id, limit, offset).await?;
    Ok(Json(DataResponse { data: rules }))
}

/// GET /api/v1/rules/{id}
///
/// The rule with its groups, conditions and entity bindings.
pub async fn get_rule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = RuleRepo::find_detail(&state.pool, id, auth.org_id)
        .await?
        .ok_or_else(|| not_found("Rule", id))?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/rules/{id}
pub async fn update_rule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRule>,
) -> AppResult<impl IntoResponse> {
    let group_operator = input
        .group_operator
        .as_deref()
        .map(str::parse::<GroupOperator>)
        .transpose()?;
    let status = input
        .status
        .as_deref()
        .map(str::parse::<RuleStatus>)
        .transpose()?;

    auth.ensure_member(&state).await?;
    let existing = RuleRepo::find_by_id(&state.pool, id, auth.org_id)
        .await?
        .ok_or_else(|| not_found("Rule", id))?;
    validate_rule_name(
        input.name.as_deref().unwrap_or(&existing.name),
        input.description.as_deref(),
    )?;

    let rule = RuleRepo::update(
        &state.pool,
        id,
        auth.org_id,
        input.name.as_deref().map(str::trim),
        input.description.as_deref(),
        group_operator,
        status,
    )
    .await?
    .ok_or_else(|| not_found("Rule", id))?;

    tracing::info!(rule_id = id, user_id = auth.user_id, "Rule updated");
    Ok(Json(DataResponse { data: rule }))
}

/// DELETE /api/v1/rules/{id}
pub async fn delete_rule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    auth.ensure_member(&state).await?;
    if !RuleRepo::delete(&state.pool, id, auth.org_id).await? {
        return Err(not_found("Rule", id));
    }
    tracing::info!(rule_id = id, user_id = auth.user_id, "Rule deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/rules/{id}/conditions
///
/// Replace every condition group of the rule in one transaction.
pub async fn replace_conditions(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReplaceConditions>,
) -> AppResult<impl IntoResponse> {
    let group_operator = input
        .group_operator
        .as_deref()
        .map(str::parse::<GroupOperator>)
        .transpose()?;
    let groups = validate_groups(&input.groups)?;

    auth.ensure_member(&state).await?;
    ensure_rule(&state, id, auth.org_id).await?;
    RuleRepo::replace_conditions(&state.pool, id, group_operator, &groups).await?;

    let detail = RuleRepo::find_detail(&state.pool, id, auth.org_id)
        .await?
        .ok_or_else(|| not_found("Rule", id))?;

    tracing::info!(
        rule_id = id,
        groups = groups.len(),
        user_id = auth.user_id,
        "Rule conditions replaced",
    );
    Ok(Json(DataResponse { data: detail }))
}

// ---------------------------------------------------------------------------
// Entity bindings
// ---------------------------------------------------------------------------

/// GET /api/v1/rules/{id}/entities
pub async fn list_rule_entities(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_rule(&state, id, auth.org_id).await?;
    let entities = RuleEntityRepo::list_for_rule(&state.pool, id).await?;
    Ok(Json(DataResponse { data: entities }))
}

/// POST /api/v1/rules/{id}/entities
pub async fn add_rule_entity(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RuleEntityInput>,
) -> AppResult<impl IntoResponse> {
    let (entity_type, entity_id) = validate_entity(&input)?;
    auth.ensure_member(&state).await?;
    ensure_rule(&state, id, auth.org_id).await?;

    let binding = RuleEntityRepo::create(&state.pool, id, entity_type, &entity_id).await?;

    tracing::info!(
        rule_id = id,
        entity_type = entity_type.as_str(),
        entity_id = %entity_id,
        user_id = auth.user_id,
        "Rule bound to entity",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: binding })))
}

/// DELETE /api/v1/rules/{id}/entities/{entity_id}
///
/// `entity_id` is the id of the binding row.
pub async fn remove_rule_entity(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, binding_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    auth.ensure_member(&state).await?;
    ensure_rule(&state, id, auth.org_id).await?;
    if !RuleEntityRepo::delete(&state.pool, id, binding_id).await? {
        return Err(not_found("RuleEntity", binding_id));
    }
    tracing::info!(rule_id = id, binding_id, user_id = auth.user_id, "Rule binding removed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/rule-entities?entity_type=&entity_id=
pub async fn search_rule_entities(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<EntitySearchParams>,
) -> AppResult<impl IntoResponse> {
    let entity_type = params
        .entity_type
        .as_deref()
        .map(str::parse::<EntityType>)
        .transpose()?;
    let entities = RuleEntityRepo::search(
        &state.pool,
        auth.org_id,
        entity_type,
        params.entity_id.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse { data: entities }))
}

// ---------------------------------------------------------------------------
// Traces matching a rule
// ---------------------------------------------------------------------------

/// GET /api/v1/rules/{id}/traces
///
/// Spans whose attributes satisfy the rule, newest first. Works for
/// inactive rules too, so a rule can be previewed before activation.
pub async fn rule_traces(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.resolve();
    let rule = RuleRepo::load_rule(&state.pool, id, auth.org_id)
        .await?
        .ok_or_else(|| not_found("Rule", id))?;

    // $1 is the organisation.
    let filter = compile_rule(&rule, TRACE_ATTRIBUTES_COLUMN, 2);
    let traces = TraceRepo::list_matching(&state.pool, auth.org_id, &filter, limit, offset).await?;
    Ok(Json(DataResponse { data: traces }))
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// POST /api/v1/rules/evaluate
///
/// Evaluate the active rules bound to `entity_type` (and `entity_id`, when
/// given) against `fields`. Returns matching rule ids in rule order and
/// their bindings; with `include_entity_data` also the governed entities.
pub async fn evaluate(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<EvaluateRequest>,
) -> AppResult<impl IntoResponse> {
    let entity_type: EntityType = input.entity_type.parse()?;
    validate_evaluate_fields(&input.fields)?;
    let entity_id = input.entity_id.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let rules =
        RuleRepo::load_active_for_entity(&state.pool, auth.org_id, entity_type, entity_id).await?;
    let matched_rule_ids = matching_rule_ids(&rules, &input.fields);
    let entities =
        RuleEntityRepo::list_for_rules(&state.pool, &matched_rule_ids, entity_type, entity_id)
            .await?;

    tracing::debug!(
        entity_type = entity_type.as_str(),
        candidates = rules.len(),
        matched = matched_rule_ids.len(),
        "Rules evaluated",
    );

    let entity_data = if input.include_entity_data {
        let variables = input.entity_inputs.unwrap_or_default().variables;
        Some(load_entity_data(&state, auth.org_id, &entities, &variables).await?)
    } else {
        None
    };

    Ok(Json(DataResponse {
        data: EvaluateResponse {
            matched_rule_ids,
            entities,
            entity_data,
        },
    }))
}

/// Resolve each distinct bound entity to its data. Prompts resolve to
/// their latest version compiled with `variables`; other entity types have
/// no store here and resolve to `None`.
async fn load_entity_data(
    state: &AppState,
    org_id: Option<DbId>,
    bindings: &[RuleEntity],
    variables: &std::collections::HashMap<String, String>,
) -> AppResult<Vec<EntityData>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for binding in bindings {
        if !seen.insert((binding.entity_type.as_str(), binding.entity_id.as_str())) {
            continue;
        }
        let data = match binding.entity_type.parse::<EntityType>() {
            Ok(EntityType::Prompt) => match binding.entity_id.parse::<DbId>() {
                Ok(prompt_id) => prompt_data(state, org_id, prompt_id, variables).await?,
                Err(_) => None,
            },
            _ => None,
        };
        out.push(EntityData {
            entity_type: binding.entity_type.clone(),
            entity_id: binding.entity_id.clone(),
            data,
        });
    }
    Ok(out)
}

async fn prompt_data(
    state: &AppState,
    org_id: Option<DbId>,
    prompt_id: DbId,
    variables: &std::collections::HashMap<String, String>,
) -> AppResult<Option<serde_json::Value>> {
    let Some(prompt) = PromptRepo::find_by_id(&state.pool, prompt_id, org_id).await? else {
        return Ok(None);
    };
    let Some(version) = PromptRepo::latest_version(&state.pool, prompt_id).await? else {
        return Ok(None);
    };
    let compiled = compile(&version.prompt, variables);
    Ok(Some(json!({
        "prompt_id": prompt.id,
        "name": prompt.name,
        "version": version.version,
        "prompt": compiled.text,
        "missing_variables": compiled.missing_variables,
        "tags": version.tags,
        "meta_properties": version.meta_properties,
    })))
}

/// 404 unless the rule exists in the caller's organisation.
async fn ensure_rule(state: &AppState, id: DbId, org_id: Option<DbId>) -> AppResult<()> {
    RuleRepo::find_by_id(&state.pool, id, org_id)
        .await?
        .ok_or_else(|| not_found("Rule", id))?;
    Ok(())
}
