//! JSON body extractor with standardized rejections.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;

/// JSON extractor whose rejection is an [`AppError`].
///
/// Axum's own `Json` rejects with a plain-text body; this wrapper keeps the
/// status code axum chose (400/415/422) but renders the standard JSON error
/// body with the `JSON_EXTRACTION` code.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use axum::routing::post;
/// use axum_helpers::extractors::JsonBody;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct CreateTodo {
///     task: String,
/// }
///
/// async fn create(JsonBody(payload): JsonBody<CreateTodo>) -> String {
///     format!("Creating: {}", payload.task)
/// }
///
/// let app = Router::new().route("/todos", post(create));
/// ```
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(data))
    }
}
