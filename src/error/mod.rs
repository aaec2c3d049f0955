pub mod types;

pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_error_display_messages() {
        let err = AppError::InvalidInput("requester is required".to_string());
        assert_eq!(err.to_string(), "Invalid input: requester is required");
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let response = AppError::InvalidInput("requester is required".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Invalid input: requester is required");
    }
}
