//! Extractors whose rejections use the API error body.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use clinic_api::ApiError;
use serde::de::DeserializeOwned;

/// `axum::Json` with malformed or missing bodies answered as 400.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ApiError::from)?;
        Ok(Self(value))
    }
}

/// `axum::extract::Path` with unparsable segments answered as 400.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(ApiError::from)?;
        Ok(Self(value))
    }
}

/// `axum::extract::Query` with malformed query strings answered as 400.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ApiError::from)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let req = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{\"name\":"))
            .unwrap();
        let err = ApiJson::<Payload>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn well_formed_json_extracts() {
        let req = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{\"name\":\"alice\"}"))
            .unwrap();
        let ApiJson(body) = ApiJson::<Payload>::from_request(req, &()).await.unwrap();
        assert_eq!(body.name, "alice");
    }

    #[tokio::test]
    async fn malformed_query_is_bad_request() {
        #[derive(Debug, Deserialize)]
        struct Params {
            #[allow(dead_code)]
            page: u32,
        }
        let req = axum::http::Request::builder().uri("/x?page=abc").body(Body::empty()).unwrap();
        let (mut parts, _) = req.into_parts();
        let err = ApiQuery::<Params>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
