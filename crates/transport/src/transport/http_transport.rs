use std::sync::Arc;

use http::Uri;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::buffer::{BufferPool, PooledSequence, SharedBufferPool};
use crate::config::TransportConfig;
use crate::context::{CallContext, PipelineContext};
use crate::protocol::{RequestMethod, TransportError};
use crate::transport::{HttpClient, TransportDriver};

/// The pipeline facing transport.
///
/// It owns the shared client and the buffer pool, creates call contexts and
/// sends them. One transport serves any number of concurrent calls.
#[derive(Debug)]
pub struct HttpTransport<C> {
    client: Arc<C>,
    pool: Arc<dyn BufferPool>,
    config: TransportConfig,
}

impl<C: HttpClient> HttpTransport<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, TransportConfig::default())
    }

    pub fn with_config(client: C, config: TransportConfig) -> Self {
        let pool = Arc::new(SharedBufferPool::new(&config));
        Self { client: Arc::new(client), pool, config }
    }

    /// Replaces the buffer pool, for callers that share one across transports.
    #[must_use]
    pub fn with_pool(mut self, pool: Arc<dyn BufferPool>) -> Self {
        self.pool = pool;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Creates the context of a new logical exchange.
    pub fn create_context(&self, method: RequestMethod, uri: Uri, cancel: CancellationToken) -> CallContext {
        let buffer = PooledSequence::new(Arc::clone(&self.pool), self.config.initial_buffer_size());
        CallContext::new(method, uri, buffer, cancel)
    }

    /// Sends the request of `context` and binds the response to it.
    pub async fn send(&self, context: &mut CallContext) -> Result<(), TransportError> {
        debug!(request = %context, attempt = context.attempts() + 1, "sending request");

        TransportDriver::new(&*self.client, context).run().await.inspect_err(|e| {
            if !e.is_cancelled() {
                error!("request failed: {}", e);
            }
        })
    }

    /// Entry point for the processing pipeline: sends `context` if it was
    /// created by an `HttpTransport`.
    pub async fn process(&self, context: &mut dyn PipelineContext) -> Result<(), TransportError> {
        let context = context.as_any_mut().downcast_mut::<CallContext>().ok_or(TransportError::IncompatibleContext)?;
        self.send(context).await
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use http::Response;

    use super::*;
    use crate::protocol::{ContentBody, WireContent};
    use crate::transport::MockHttpClient;

    #[derive(Debug)]
    struct ForeignContext;

    impl PipelineContext for ForeignContext {
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn transport() -> HttpTransport<MockHttpClient> {
        let mut client = MockHttpClient::new();
        client
            .expect_send()
            .returning(|_, _| Ok(Response::builder().status(204).body(WireContent::new(ContentBody::empty())).unwrap()));
        HttpTransport::new(client)
    }

    #[tokio::test]
    async fn process_sends_own_contexts() {
        let transport = transport();
        let mut ctx = transport.create_context(
            RequestMethod::Delete,
            "http://example.test/items/1".parse().unwrap(),
            CancellationToken::new(),
        );

        transport.process(&mut ctx).await.unwrap();
        assert_eq!(ctx.status().unwrap(), 204);
        assert!(ctx.read_content(16).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn process_rejects_foreign_contexts() {
        let transport = transport();
        let err = transport.process(&mut ForeignContext).await.unwrap_err();
        assert!(matches!(err, TransportError::IncompatibleContext));
    }

    #[test]
    fn contexts_rent_from_the_pool() {
        let pool = Arc::new(SharedBufferPool::default());
        let transport = HttpTransport::new(MockHttpClient::new()).with_pool(Arc::clone(&pool) as Arc<dyn BufferPool>);

        drop(transport.create_context(RequestMethod::Get, Uri::from_static("/"), CancellationToken::new()));
        assert_eq!(pool.idle(), 1);

        drop(transport.create_context(RequestMethod::Get, Uri::from_static("/"), CancellationToken::new()));
        assert_eq!(pool.idle(), 1);
    }
}
