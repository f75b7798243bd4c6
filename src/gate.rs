//! Readiness gate: requests that arrive before the store is connected (and
//! seeded) get `503 Service Unavailable` instead of reaching a handler.

use std::future::{ready, Ready};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, ResponseError};
use futures_util::future::LocalBoxFuture;

use crate::error::ApiError;

#[derive(Debug, Clone, Default)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn mark_ready(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

pub struct ReadinessGate {
    readiness: Readiness,
}

impl ReadinessGate {
    pub fn new(readiness: Readiness) -> Self {
        ReadinessGate { readiness }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ReadinessGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ReadinessGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ReadinessGateMiddleware {
            service,
            readiness: self.readiness.clone(),
        }))
    }
}

pub struct ReadinessGateMiddleware<S> {
    service: S,
    readiness: Readiness,
}

impl<S, B> Service<ServiceRequest> for ReadinessGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !self.readiness.is_ready() {
            let response = ApiError::NotReady.error_response().map_into_right_body();
            let (request, _) = req.into_parts();
            return Box::pin(async move { Ok(ServiceResponse::new(request, response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
