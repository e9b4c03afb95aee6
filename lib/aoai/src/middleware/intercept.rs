//! Adapter between policy-shaped middleware and Tower layers.
//!
//! Tower middleware is a [`Service`] wrapping another service. Identity-style
//! policies are easier to write as a single function that receives the
//! request together with a continuation:
//!
//! ```ignore
//! fn intercept(&self, request, next: Next<S>) -> impl Future<Output = Result<Response>>
//! ```
//!
//! [`InterceptLayer`] turns any [`Interceptor`] into a Tower [`Layer`]. On
//! each call the inner service, already driven to readiness, is captured in
//! a [`Next`] and handed to the interceptor, which may mutate the request,
//! call [`Next::run`] once, or fail without calling it at all.
//!
//! The request travels through unchanged apart from what the interceptor
//! does to it: headers, body and extensions (including the
//! [`Deadline`](aoai_core::Deadline)) are the same values on both sides.

use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};

use crate::{Error, Request, Response, Result, ServiceFuture};

/// A policy-shaped middleware: sees the request and the rest of the chain.
///
/// Implementations must be stateless per call; anything shared between
/// concurrent calls has to be safe for concurrent use.
pub trait Interceptor: Send + Sync + 'static {
    /// Handle one request.
    ///
    /// The returned future must not borrow `self`: clone what it needs
    /// (typically `Arc`s) into it.
    fn intercept<S>(
        &self,
        request: Request<Bytes>,
        next: Next<S>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send + 'static
    where
        S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Send + 'static,
        S::Future: Send + 'static;
}

/// The continuation handed to an [`Interceptor`]: the rest of the chain.
#[derive(Debug)]
pub struct Next<S> {
    inner: S,
}

impl<S> Next<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>,
{
    /// Pass the request on to the rest of the chain.
    pub fn run(mut self, request: Request<Bytes>) -> S::Future {
        self.inner.call(request)
    }
}

/// Layer that applies an [`Interceptor`].
///
/// # Example
///
/// ```ignore
/// use aoai::middleware::{BearerTokenPolicy, InterceptLayer};
///
/// let client = HyperClient::builder()
///     .layer(InterceptLayer::new(BearerTokenPolicy::new(credential, [scope])))
///     .build();
/// ```
#[derive(Debug)]
pub struct InterceptLayer<I> {
    interceptor: Arc<I>,
}

impl<I> Clone for InterceptLayer<I> {
    fn clone(&self) -> Self {
        Self {
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

impl<I> InterceptLayer<I> {
    /// Create a new layer from an interceptor.
    pub fn new(interceptor: I) -> Self {
        Self {
            interceptor: Arc::new(interceptor),
        }
    }

    /// The wrapped interceptor.
    #[must_use]
    pub fn interceptor(&self) -> &I {
        &self.interceptor
    }
}

impl<S, I> Layer<S> for InterceptLayer<I> {
    type Service = Intercept<S, I>;

    fn layer(&self, inner: S) -> Self::Service {
        Intercept {
            inner,
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

/// Service that routes every request through an [`Interceptor`].
#[derive(Debug)]
pub struct Intercept<S, I> {
    inner: S,
    interceptor: Arc<I>,
}

impl<S: Clone, I> Clone for Intercept<S, I> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

impl<S, I> Service<Request<Bytes>> for Intercept<S, I>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send + 'static,
    I: Interceptor,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        // Hand the service that was polled ready to the continuation
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(self.interceptor.intercept(request, Next { inner }))
    }
}
