// Authentication middleware for YouTube Data API
//
// When enabled, every request must carry an `X-API-Key` header equal to the
// configured key. OPTIONS requests (CORS pre-flight), the health probe and the
// metrics endpoint are always allowed.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{Method, StatusCode},
    Error, HttpResponse, ResponseError,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{debug, info, warn};
use std::fmt;
use std::rc::Rc;

use crate::config::{defaults, AuthConfig};
use crate::metrics::Metrics;
use crate::models::ErrorResponse;

/// Paths reachable without an API key
const PUBLIC_PATHS: [&str; 2] = ["/health", "/metrics"];

const AUTH_FAILURE_MESSAGE: &str = "Could not validate API key";

/// Rejection returned for a missing or wrong API key
#[derive(Debug)]
pub struct AuthenticationError;

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(AUTH_FAILURE_MESSAGE)
    }
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: AUTH_FAILURE_MESSAGE.to_string(),
            kind: None,
        })
    }
}

/// Outcome of checking a request's credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthOutcome {
    Exempt,
    Accepted,
    Missing,
    Invalid,
}

impl AuthOutcome {
    fn metric_status(self) -> Option<&'static str> {
        match self {
            AuthOutcome::Exempt => None,
            AuthOutcome::Accepted => Some("success"),
            AuthOutcome::Missing => Some("missing"),
            AuthOutcome::Invalid => Some("invalid"),
        }
    }
}

/// Middleware factory for authentication
pub struct Authentication {
    config: Rc<AuthConfig>,
    metrics: Metrics,
}

impl Authentication {
    pub fn new(config: AuthConfig, metrics: Metrics) -> Self {
        Self {
            config: Rc::new(config),
            metrics,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        if !self.config.enabled {
            info!("Authentication requirement is disabled via configuration");
        }
        ok(AuthenticationMiddleware {
            service,
            config: Rc::clone(&self.config),
            metrics: self.metrics.clone(),
        })
    }
}

/// Authentication middleware implementation
pub struct AuthenticationMiddleware<S> {
    service: S,
    config: Rc<AuthConfig>,
    metrics: Metrics,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
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
        let outcome = authenticate(&req, &self.config);
        let metrics = self.metrics.clone();

        if matches!(outcome, AuthOutcome::Missing | AuthOutcome::Invalid) {
            return Box::pin(async move {
                if let Some(status) = outcome.metric_status() {
                    metrics.record_auth_attempt(status).await;
                }
                let response = AuthenticationError.error_response();
                Ok(req.into_response(response).map_into_right_body())
            });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            if let Some(status) = outcome.metric_status() {
                metrics.record_auth_attempt(status).await;
            }
            fut.await.map(ServiceResponse::map_into_left_body)
        })
    }
}

/// Check the API key header of a request
fn authenticate(req: &ServiceRequest, config: &AuthConfig) -> AuthOutcome {
    if req.method() == Method::OPTIONS {
        debug!("OPTIONS request - bypassing authentication check");
        return AuthOutcome::Exempt;
    }

    if PUBLIC_PATHS.contains(&req.path()) {
        return AuthOutcome::Exempt;
    }

    if !config.enabled {
        debug!("Authorization is disabled, allowing request without authentication");
        return AuthOutcome::Exempt;
    }

    let provided = match req.headers().get(defaults::API_KEY_HEADER) {
        Some(value) => value,
        None => {
            warn!("Missing {} header on {}", defaults::API_KEY_HEADER, req.path());
            return AuthOutcome::Missing;
        }
    };

    match (provided.to_str(), config.api_key.as_deref()) {
        (Ok(provided), Some(expected)) if !expected.is_empty() && provided == expected => {
            AuthOutcome::Accepted
        }
        (_, None) => {
            warn!("Authorization is enabled but no API key is configured, rejecting request");
            AuthOutcome::Invalid
        }
        _ => {
            warn!("Invalid {} header on {}", defaults::API_KEY_HEADER, req.path());
            AuthOutcome::Invalid
        }
    }
}
