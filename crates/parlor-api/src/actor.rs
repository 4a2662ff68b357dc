use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bson::oid::ObjectId;
use parlor_inbox::{Actor, Role};

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Authenticated actor as asserted by the fronting auth gateway.
///
/// The gateway terminates authentication and forwards the caller's user
/// id and role as headers; this service trusts them. The role header is
/// optional and defaults to the plain user role.
pub struct CurrentActor(pub Actor);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing x-actor-id header".to_string()))?;
        let user_id = ObjectId::parse_str(raw_id)
            .map_err(|_| ApiError::Unauthorized("Invalid x-actor-id header".to_string()))?;

        let role = match parts.headers.get(ACTOR_ROLE_HEADER) {
            None => Role::User,
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|raw| raw.parse::<Role>().ok())
                .ok_or_else(|| {
                    ApiError::Unauthorized("Invalid x-actor-role header".to_string())
                })?,
        };

        Ok(CurrentActor(Actor { user_id, role }))
    }
}
