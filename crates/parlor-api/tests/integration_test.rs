#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::extract::FromRequestParts;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use bson::oid::ObjectId;

    use parlor_api::actor::CurrentActor;
    use parlor_api::error::ApiError;
    use parlor_graph::GraphError;

    async fn response_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_maps_to_400() {
        let error = ApiError::BadRequest("Either text or attachment is required".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_body(response).await;
        assert_eq!(body["error"]["code"], 400);
        assert_eq!(
            body["error"]["message"],
            "Either text or attachment is required"
        );
    }

    #[tokio::test]
    async fn test_not_found_variants_map_to_404() {
        let response = ApiError::AccountNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response_body(response).await;
        assert_eq!(body["error"]["message"], "Instagram account not found");

        let response = ApiError::ConversationNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response_body(response).await;
        assert_eq!(body["error"]["message"], "Conversation not found");
    }

    #[tokio::test]
    async fn test_send_failure_maps_to_502_with_advice() {
        let error = ApiError::SendFailed(GraphError::Api {
            status: 400,
            code: Some(10),
            error_type: Some("OAuthException".to_string()),
            message: "(#10) This message is sent outside of allowed window".to_string(),
        });
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = response_body(response).await;
        assert_eq!(body["error"]["code"], 502);
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("Failed to send message:"));
        assert!(message.contains("24-hour messaging window"));
    }

    #[tokio::test]
    async fn test_send_failure_without_advice_keeps_upstream_detail() {
        let error = ApiError::SendFailed(GraphError::Api {
            status: 400,
            code: Some(190),
            error_type: Some("OAuthException".to_string()),
            message: "Invalid OAuth access token".to_string(),
        });
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = response_body(response).await;
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("Invalid OAuth access token"));
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::Internal.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response_body(response).await;
        assert_eq!(body["error"]["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_actor_extractor_reads_gateway_headers() {
        let user_id = ObjectId::new();
        let request = Request::builder()
            .uri("/v1/accounts")
            .header("x-actor-id", user_id.to_hex())
            .header("x-actor-role", "admin")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let CurrentActor(actor) = CurrentActor::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(actor.user_id, user_id);
        assert!(actor.is_admin());
    }

    #[tokio::test]
    async fn test_actor_extractor_defaults_to_user_role() {
        let user_id = ObjectId::new();
        let request = Request::builder()
            .uri("/v1/accounts")
            .header("x-actor-id", user_id.to_hex())
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let CurrentActor(actor) = CurrentActor::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(!actor.is_admin());
    }

    #[tokio::test]
    async fn test_actor_extractor_rejects_missing_id() {
        let request = Request::builder().uri("/v1/accounts").body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let rejection = CurrentActor::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_actor_extractor_rejects_malformed_id_and_role() {
        let request = Request::builder()
            .uri("/v1/accounts")
            .header("x-actor-id", "not-an-object-id")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        assert!(CurrentActor::from_request_parts(&mut parts, &())
            .await
            .is_err());

        let request = Request::builder()
            .uri("/v1/accounts")
            .header("x-actor-id", ObjectId::new().to_hex())
            .header("x-actor-role", "superuser")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        assert!(CurrentActor::from_request_parts(&mut parts, &())
            .await
            .is_err());
    }
}
