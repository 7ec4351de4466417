//! Request correlation for the REST surface.
//!
//! [`Trace`] picks a [`TraceId`] per request (adopting a well-formed
//! `trace-id` request header), runs the handler inside that scope and copies
//! the identifier onto the response. Socket sessions outlive the upgrade
//! request, so they mint their own identifier per inbound frame.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, debug, info_span, warn};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Middleware scoping each request to a [`TraceId`].
///
/// ```
/// use actix_web::App;
/// use fleet_tracker::middleware::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware {
            inner: Rc::new(service),
        }))
    }
}

/// Service produced by [`Trace`].
pub struct TraceMiddleware<S> {
    inner: Rc<S>,
}

fn supplied_trace_id(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = TraceId::adopt_or_generate(supplied_trace_id(&req));
        let span = info_span!(
            "http_request",
            %trace_id,
            method = %req.method(),
            path = req.path(),
        );
        let inner = Rc::clone(&self.inner);

        Box::pin(
            async move {
                let mut res = TraceId::scope(trace_id, inner.call(req)).await?;
                debug!(status = res.status().as_u16(), "request finished");
                match HeaderValue::from_str(&trace_id.to_string()) {
                    Ok(value) => {
                        res.headers_mut()
                            .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                    }
                    Err(error) => warn!(%error, "trace id is not a valid header value"),
                }
                Ok(res)
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::BoxBody;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    use crate::domain::{ApiResult, Error as DomainError};

    async fn echo_trace_id() -> HttpResponse {
        let body = TraceId::current().map(|id| id.to_string()).unwrap_or_default();
        HttpResponse::Ok().body(body)
    }

    async fn missing_user() -> ApiResult<HttpResponse> {
        Err(DomainError::not_found("user 3 not found"))
    }

    async fn get(path: &str, supplied: Option<&str>) -> (ServiceResponse<BoxBody>, String) {
        let app = test::init_service(
            App::new()
                .wrap(Trace)
                .route("/echo", web::get().to(echo_trace_id))
                .route("/missing", web::get().to(missing_user)),
        )
        .await;
        let mut req = test::TestRequest::get().uri(path);
        if let Some(value) = supplied {
            req = req.insert_header((TRACE_ID_HEADER, value));
        }
        let res = test::call_service(&app, req.to_request()).await;
        let header = res
            .headers()
            .get(TRACE_ID_HEADER)
            .expect("trace id header")
            .to_str()
            .expect("ascii header")
            .to_owned();
        (res, header)
    }

    #[rstest]
    #[actix_web::test]
    async fn handler_sees_the_response_trace_id() {
        let (res, header) = get("/echo", None).await;
        let body = test::read_body(res).await;
        assert_eq!(body, header.as_bytes());
    }

    #[rstest]
    #[actix_web::test]
    async fn error_payload_carries_the_trace_id() {
        let (res, header) = get("/missing", None).await;
        let error: DomainError = test::read_body_json(res).await;
        assert_eq!(error.trace_id(), Some(header.as_str()));
    }

    #[rstest]
    #[actix_web::test]
    async fn well_formed_client_id_is_reused() {
        let supplied = "3f2b8c1e-9d4a-4f6b-8e2c-1a7d5b9c0e42";
        let (_, header) = get("/echo", Some(supplied)).await;
        assert_eq!(header, supplied);
    }

    #[rstest]
    #[actix_web::test]
    async fn requests_without_an_id_get_distinct_ones() {
        let (_, first) = get("/echo", None).await;
        let (_, second) = get("/echo", Some("not-a-uuid")).await;
        assert_ne!(first, second);
        assert_ne!(second, "not-a-uuid");
    }
}
