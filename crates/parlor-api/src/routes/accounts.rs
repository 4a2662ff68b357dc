use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;

use parlor_graph::{BusinessProfile, MediaItem};
use parlor_inbox::Actor;
use parlor_store::{Account, AccountUpdate};

use crate::{
    actor::CurrentActor,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    pub page_id: String,
    pub ig_business_id: String,
    pub page_access_token: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub followers_count: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    pub username: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: Option<i64>,
    pub page_access_token: Option<String>,
}

/// Account as returned to clients. The page access token is deliberately
/// absent from this shape.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: String,
    pub user_id: String,
    pub page_id: String,
    pub ig_business_id: String,
    pub username: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: i64,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub username: Option<String>,
    pub name: Option<String>,
    pub biography: Option<String>,
    pub website: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: i64,
    pub media_count: i64,
    pub media: Vec<MediaItemResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MediaItemResponse {
    pub id: String,
    pub caption: Option<String>,
    pub media_type: Option<String>,
    pub media_url: Option<String>,
    pub permalink: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// Loads an active account the actor may act on: owners reach their own
/// accounts, admins reach all.
pub(crate) async fn visible_account(
    state: &AppState,
    account_id: ObjectId,
    actor: &Actor,
) -> ApiResult<Account> {
    let account = if actor.is_admin() {
        state.store.accounts().find_active_by_id(account_id).await?
    } else {
        state
            .store
            .accounts()
            .find_active_owned(account_id, actor.user_id)
            .await?
    };
    account.ok_or(ApiError::AccountNotFound)
}

/// Connect a new Instagram account
#[utoipa::path(
    post,
    path = "/v1/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account connected", body = AccountResponse),
        (status = 400, description = "Invalid request or account already connected")
    ),
    tag = "accounts"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let page_id = req.page_id.trim();
    let ig_business_id = req.ig_business_id.trim();
    if page_id.is_empty() || ig_business_id.is_empty() || req.page_access_token.is_empty() {
        return Err(ApiError::BadRequest(
            "page_id, ig_business_id and page_access_token are required".to_string(),
        ));
    }

    // The business id is globally unique across owners, including
    // soft-deleted accounts.
    if state
        .store
        .accounts()
        .business_id_taken(ig_business_id)
        .await?
    {
        return Err(ApiError::BadRequest(
            "Instagram account already connected".to_string(),
        ));
    }

    let mut account = Account::new(actor.user_id, page_id, ig_business_id, req.page_access_token);
    account.username = req
        .username
        .as_deref()
        .map(str::trim)
        .filter(|username| !username.is_empty())
        .map(str::to_string);
    account.profile_picture_url = req.profile_picture_url;
    account.followers_count = req.followers_count.unwrap_or(0);

    state.store.accounts().insert(&account).await?;

    tracing::info!(
        ig_business_id = %account.ig_business_id,
        user_id = %actor.user_id,
        "Instagram account connected"
    );
    Ok((StatusCode::CREATED, Json(account_to_response(account))))
}

/// List Instagram accounts
///
/// Admins see all accounts, users see only their own.
#[utoipa::path(
    get,
    path = "/v1/accounts",
    params(
        ("skip" = Option<u64>, Query, description = "Number of accounts to skip (default: 0)"),
        ("limit" = Option<i64>, Query, description = "Maximum number of accounts to return (default: 100, max: 100)")
    ),
    responses(
        (status = 200, description = "List of accounts", body = [AccountResponse])
    ),
    tag = "accounts"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<Json<Vec<AccountResponse>>> {
    let limit = query.limit.min(100); // Cap at 100

    let accounts = if actor.is_admin() {
        state.store.accounts().list_active(query.skip, limit).await?
    } else {
        state
            .store
            .accounts()
            .list_active_for_user(actor.user_id, query.skip, limit)
            .await?
    };

    Ok(Json(
        accounts.into_iter().map(account_to_response).collect(),
    ))
}

/// Get Instagram account details
#[utoipa::path(
    get,
    path = "/v1/accounts/{account_id}",
    params(
        ("account_id" = String, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account details", body = AccountResponse),
        (status = 404, description = "Account not found")
    ),
    tag = "accounts"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(account_id): Path<String>,
) -> ApiResult<Json<AccountResponse>> {
    let account_id = ObjectId::from_str(&account_id)
        .map_err(|_| ApiError::BadRequest("Invalid account ID format".to_string()))?;

    let account = visible_account(&state, account_id, &actor).await?;
    Ok(Json(account_to_response(account)))
}

/// Update Instagram account details
#[utoipa::path(
    patch,
    path = "/v1/accounts/{account_id}",
    params(
        ("account_id" = String, Path, description = "Account ID")
    ),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 404, description = "Account not found")
    ),
    tag = "accounts"
)]
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(account_id): Path<String>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let account_id = ObjectId::from_str(&account_id)
        .map_err(|_| ApiError::BadRequest("Invalid account ID format".to_string()))?;

    let account = visible_account(&state, account_id, &actor).await?;

    let update = AccountUpdate {
        username: req.username,
        profile_picture_url: req.profile_picture_url,
        followers_count: req.followers_count,
        page_access_token: req.page_access_token,
    };
    if !update.is_empty() {
        state
            .store
            .accounts()
            .update_profile(account.id, &update)
            .await?;
    }

    let account = state
        .store
        .accounts()
        .find_active_by_id(account.id)
        .await?
        .ok_or(ApiError::AccountNotFound)?;

    tracing::info!(account_id = %account.id, "Instagram account updated");
    Ok(Json(account_to_response(account)))
}

/// Disconnect an Instagram account (soft delete)
#[utoipa::path(
    delete,
    path = "/v1/accounts/{account_id}",
    params(
        ("account_id" = String, Path, description = "Account ID")
    ),
    responses(
        (status = 204, description = "Account disconnected"),
        (status = 404, description = "Account not found")
    ),
    tag = "accounts"
)]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(account_id): Path<String>,
) -> ApiResult<StatusCode> {
    let account_id = ObjectId::from_str(&account_id)
        .map_err(|_| ApiError::BadRequest("Invalid account ID format".to_string()))?;

    let account = visible_account(&state, account_id, &actor).await?;
    state.store.accounts().soft_delete(account.id).await?;

    tracing::info!(account_id = %account.id, "Instagram account disconnected");
    Ok(StatusCode::NO_CONTENT)
}

/// Get the public Instagram profile behind an account
///
/// Resolved live through the Graph API's business discovery, so it
/// requires the stored username to be set.
#[utoipa::path(
    get,
    path = "/v1/accounts/{account_id}/profile",
    params(
        ("account_id" = String, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Profile details", body = ProfileResponse),
        (status = 400, description = "Username not set or profile fetch failed"),
        (status = 404, description = "Account not found")
    ),
    tag = "accounts"
)]
pub async fn get_account_profile(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(account_id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let account_id = ObjectId::from_str(&account_id)
        .map_err(|_| ApiError::BadRequest("Invalid account ID format".to_string()))?;

    let account = visible_account(&state, account_id, &actor).await?;
    let username = account
        .username
        .as_deref()
        .filter(|username| !username.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Username not set for this account".to_string()))?;

    let profile = state
        .graph
        .business_profile(&account.ig_business_id, username, &account.page_access_token)
        .await
        .map_err(|error| {
            tracing::error!("Error fetching Instagram profile: {}", error);
            ApiError::BadRequest(format!("Failed to fetch profile: {error}"))
        })?;

    Ok(Json(profile_to_response(profile)))
}

fn account_to_response(account: Account) -> AccountResponse {
    AccountResponse {
        id: account.id.to_hex(),
        user_id: account.user_id.to_hex(),
        page_id: account.page_id,
        ig_business_id: account.ig_business_id,
        username: account.username,
        profile_picture_url: account.profile_picture_url,
        followers_count: account.followers_count,
        is_active: account.is_active,
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

fn profile_to_response(profile: BusinessProfile) -> ProfileResponse {
    ProfileResponse {
        username: profile.username,
        name: profile.name,
        biography: profile.biography,
        website: profile.website,
        profile_picture_url: profile.profile_picture_url,
        followers_count: profile.followers_count,
        media_count: profile.media_count,
        media: profile.media.into_iter().map(media_to_response).collect(),
    }
}

fn media_to_response(item: MediaItem) -> MediaItemResponse {
    MediaItemResponse {
        id: item.id,
        caption: item.caption,
        media_type: item.media_type,
        media_url: item.media_url,
        permalink: item.permalink,
        timestamp: item.timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_response_never_carries_the_access_token() {
        let account = Account::new(
            ObjectId::new(),
            "1234567890",
            "17841400000000000",
            "EAAG-very-secret",
        );

        let value = serde_json::to_value(account_to_response(account)).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("page_access_token"));
        assert_eq!(object["ig_business_id"], "17841400000000000");
    }
}
