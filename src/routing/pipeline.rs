//! Late-bound request pipeline.
//!
//! Routes are built from configuration before the request pipeline exists,
//! and the pipeline itself is assembled around the built routes. Entries
//! therefore hold a [`RouteHandler`]: either a pipeline attached at build
//! time, or a deferred handle onto the shared [`PipelineSlot`] that is
//! filled once at startup.
//!
//! ```text
//! build routes ──▶ set_pipeline ──▶ serve traffic
//!      │                │
//!      └── Deferred ────┴──▶ PipelineSlot (read on every invocation)
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;

/// Future returned by a pipeline invocation.
pub type ResponseFuture = BoxFuture<'static, Response<Body>>;

/// The request-processing chain invoked for matched requests.
pub trait Pipeline: Send + Sync {
    fn call(&self, request: Request<Body>) -> ResponseFuture;
}

impl<F, Fut> Pipeline for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync,
    Fut: Future<Output = Response<Body>> + Send + 'static,
{
    fn call(&self, request: Request<Body>) -> ResponseFuture {
        (self)(request).boxed()
    }
}

/// Errors raised when invoking a route handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A request was dispatched before the pipeline was installed.
    #[error("pipeline not yet provided")]
    NotProvided,
}

/// Sized wrapper so the pipeline can live in an `ArcSwapOption`.
struct Installed(Arc<dyn Pipeline>);

/// Shared, settable reference to the request pipeline.
#[derive(Default)]
pub struct PipelineSlot {
    current: ArcSwapOption<Installed>,
}

impl PipelineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the pipeline. Later calls replace the previous one.
    pub fn set(&self, pipeline: Arc<dyn Pipeline>) {
        self.current.store(Some(Arc::new(Installed(pipeline))));
    }

    pub fn is_set(&self) -> bool {
        self.current.load().is_some()
    }

    /// The installed pipeline, or `NotProvided`.
    pub fn get(&self) -> Result<Arc<dyn Pipeline>, PipelineError> {
        self.current
            .load()
            .as_ref()
            .map(|installed| installed.0.clone())
            .ok_or(PipelineError::NotProvided)
    }
}

impl fmt::Debug for PipelineSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineSlot")
            .field("set", &self.is_set())
            .finish()
    }
}

/// Handler attached to a dispatch entry.
#[derive(Clone)]
pub enum RouteHandler {
    /// Pipeline supplied when the entry was built.
    Direct(Arc<dyn Pipeline>),
    /// Resolves the shared slot on each invocation.
    Deferred(Arc<PipelineSlot>),
}

impl RouteHandler {
    /// Invoke the handler. Fails immediately if the deferred slot is still empty.
    pub fn invoke(&self, request: Request<Body>) -> Result<ResponseFuture, PipelineError> {
        match self {
            RouteHandler::Direct(pipeline) => Ok(pipeline.call(request)),
            RouteHandler::Deferred(slot) => {
                let pipeline = slot.get()?;
                Ok(pipeline.call(request))
            }
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, RouteHandler::Deferred(_))
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteHandler::Direct(_) => f.write_str("Direct"),
            RouteHandler::Deferred(slot) => f.debug_tuple("Deferred").field(slot).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn teapot() -> Arc<dyn Pipeline> {
        Arc::new(|_req: Request<Body>| async {
            Response::builder()
                .status(StatusCode::IM_A_TEAPOT)
                .body(Body::empty())
                .unwrap()
        })
    }

    #[test]
    fn test_deferred_before_set_fails() {
        let slot = Arc::new(PipelineSlot::new());
        let handler = RouteHandler::Deferred(slot.clone());

        let result = handler.invoke(Request::new(Body::empty()));
        assert_eq!(result.err(), Some(PipelineError::NotProvided));
        assert!(!slot.is_set());
    }

    #[tokio::test]
    async fn test_deferred_forwards_after_set() {
        let slot = Arc::new(PipelineSlot::new());
        let handler = RouteHandler::Deferred(slot.clone());

        slot.set(teapot());

        let response = handler.invoke(Request::new(Body::empty())).unwrap().await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let slot = Arc::new(PipelineSlot::new());
        let handler = RouteHandler::Deferred(slot.clone());

        slot.set(teapot());
        slot.set(Arc::new(|_req: Request<Body>| async {
            Response::builder()
                .status(StatusCode::ACCEPTED)
                .body(Body::empty())
                .unwrap()
        }));

        let response = handler.invoke(Request::new(Body::empty())).unwrap().await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_slot_hands_out_the_installed_pipeline() {
        let slot = PipelineSlot::new();
        let pipeline = teapot();
        slot.set(pipeline.clone());

        let installed = slot.get().unwrap();
        assert!(Arc::ptr_eq(&installed, &pipeline));
    }

    #[tokio::test]
    async fn test_direct_ignores_slot() {
        let handler = RouteHandler::Direct(teapot());
        let response = handler.invoke(Request::new(Body::empty())).unwrap().await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
