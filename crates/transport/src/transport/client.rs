use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::protocol::{BoxError, WireRequest, WireResponse};

/// The HTTP client the transport delegates to.
///
/// `send` takes the request by value: a wire request is consumed by the
/// attempt that sends it. Implementations should stop work promptly once
/// `cancel` fires; the transport races the token as well.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: WireRequest, cancel: &CancellationToken) -> Result<WireResponse, BoxError>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn send(&self, request: WireRequest, cancel: &CancellationToken) -> Result<WireResponse, BoxError> {
        (**self).send(request, cancel).await
    }
}
