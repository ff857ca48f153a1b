//! Handlers for organisations and their members.

use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use llmscope_core::error::CoreError;
use llmscope_core::organisations::{validate_organisation_name, MemberRole};
use llmscope_core::types::DbId;
use llmscope_db::models::organisation::{AddMember, CreateOrganisation, UpdateOrganisation};
use llmscope_db::repositories::{OrganisationRepo, UserRepo};

use super::auth::issue_session;
use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::OrgMembership;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/organisations
pub async fn list_organisations(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let orgs = OrganisationRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: orgs }))
}

/// POST /api/v1/organisations
///
/// The caller becomes the organisation's owner.
pub async fn create_organisation(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateOrganisation>,
) -> AppResult<impl IntoResponse> {
    validate_organisation_name(&input.name)?;
    let org = OrganisationRepo::create(&state.pool, input.name.trim(), auth.user_id).await?;

    tracing::info!(org_id = org.id, user_id = auth.user_id, "Organisation created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: org })))
}

/// GET /api/v1/organisations/{id}
pub async fn get_organisation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let org = OrganisationRepo::find_for_user(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| not_found("Organisation", id))?;
    Ok(Json(DataResponse { data: org }))
}

/// PUT /api/v1/organisations/{id}
pub async fn update_organisation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOrganisation>,
) -> AppResult<impl IntoResponse> {
    let name = input
        .name
        .ok_or_else(|| AppError::BadRequest("name is required".into()))?;
    validate_organisation_name(&name)?;

    OrgMembership::load(&state, id, &auth).await?.require_manager()?;

    let org = OrganisationRepo::update(&state.pool, id, name.trim())
        .await?
        .ok_or_else(|| not_found("Organisation", id))?;

    tracing::info!(org_id = id, user_id = auth.user_id, "Organisation renamed");
    Ok(Json(DataResponse { data: org }))
}

/// DELETE /api/v1/organisations/{id}
///
/// Owners only. Everything scoped to the organisation is deleted with it.
pub async fn delete_organisation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    OrgMembership::load(&state, id, &auth).await?.require_owner()?;

    if !OrganisationRepo::delete(&state.pool, id).await? {
        return Err(not_found("Organisation", id));
    }
    tracing::info!(org_id = id, user_id = auth.user_id, "Organisation deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/organisations/{id}/members
pub async fn list_members(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    OrgMembership::load(&state, id, &auth).await?;
    let members = OrganisationRepo::list_members(&state.pool, id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// POST /api/v1/organisations/{id}/members
///
/// Add an existing user by email. Admins may grant up to `admin`; only
/// owners may add owners.
pub async fn add_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AddMember>,
) -> AppResult<impl IntoResponse> {
    let role = match input.role.as_deref() {
        Some(r) => r.parse::<MemberRole>()?,
        None => MemberRole::Member,
    };

    let membership = OrgMembership::load(&state, id, &auth).await?;
    membership.require_manager()?;
    if !membership.role.can_grant(role) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "A {} cannot grant the {} role",
            membership.role.as_str(),
            role.as_str()
        ))));
    }

    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("No user with email '{}'", input.email.trim())))?;

    let member = OrganisationRepo::add_member(&state.pool, id, user.id, role).await?;

    tracing::info!(
        org_id = id,
        member_user_id = user.id,
        role = role.as_str(),
        user_id = auth.user_id,
        "Organisation member added",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: member })))
}

/// DELETE /api/v1/organisations/{id}/members/{user_id}
///
/// Members may remove themselves. Removing someone else needs a manager;
/// removing an owner needs an owner. The last owner cannot be removed.
pub async fn remove_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, member_user_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let membership = OrgMembership::load(&state, id, &auth).await?;
    if member_user_id != auth.user_id {
        membership.require_manager()?;
    }

    let target: MemberRole = OrganisationRepo::member_role(&state.pool, id, member_user_id)
        .await?
        .ok_or_else(|| not_found("OrganisationMember", member_user_id))?
        .parse()?;

    if target == MemberRole::Owner {
        if member_user_id != auth.user_id && !membership.role.can_delete() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Only owners can remove an owner".into(),
            )));
        }
        if OrganisationRepo::count_owners(&state.pool, id).await? <= 1 {
            return Err(AppError::Core(CoreError::Conflict(
                "Cannot remove the last owner of an organisation".into(),
            )));
        }
    }

    OrganisationRepo::remove_member(&state.pool, id, member_user_id).await?;

    if let Some(user) = UserRepo::find_by_id(&state.pool, member_user_id).await? {
        if user.current_org_id == Some(id) {
            UserRepo::set_current_org(&state.pool, member_user_id, None).await?;
        }
    }

    tracing::info!(
        org_id = id,
        member_user_id,
        user_id = auth.user_id,
        "Organisation member removed",
    );
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/organisations/{id}/switch
///
/// Make `id` the caller's current organisation and return a token that
/// acts in it.
pub async fn switch_organisation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    OrgMembership::load(&state, id, &auth).await?;

    UserRepo::set_current_org(&state.pool, auth.user_id, Some(id)).await?;
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    tracing::info!(org_id = id, user_id = auth.user_id, "Switched organisation");

    let (cookie, response) = issue_session(&state, user, Some(id))?;
    Ok(([(SET_COOKIE, cookie)], Json(DataResponse { data: response })))
}
