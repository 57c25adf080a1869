use crate::di::Container;
use crate::error::NestError;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Axum extractor handing a bound singleton to a handler.
///
/// Only types registered while the module graph was built can be extracted;
/// request handlers never bind new types.
///
/// # Example
/// ```rust,ignore
/// use nestrs::Inject;
/// use axum::extract::Path;
///
/// async fn get_user(
///     Inject(service): Inject<UserService>,
///     Path(id): Path<String>,
/// ) -> String {
///     service.find_one(&id)
/// }
/// ```
pub struct Inject<T>(pub Arc<T>);

/// Trait that router state must implement to expose the container
pub trait HasContainer {
    fn get_container(&self) -> &Container;
}

impl<S, T> FromRequestParts<S> for Inject<T>
where
    S: Send + Sync + HasContainer,
    T: 'static + Send + Sync,
{
    type Rejection = NestError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        state.get_container().get::<T>().map(Inject)
    }
}

impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Inject(Arc::clone(&self.0))
    }
}
