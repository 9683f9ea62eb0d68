//! Plain HTTP access to block confidence.
//!
//! `GET /v1/confidence/{block}` is rewritten into a `light_getBlockConfidence` call and answered
//! with the bare method result, so HTTP callers get the same JSON object as RPC callers.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::header::{HeaderValue, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Method, Uri};
use http_body_util::BodyExt;
use jsonrpsee::core::BoxError;
use jsonrpsee::server::http::response;
use jsonrpsee::server::{HttpBody, HttpRequest, HttpResponse};
use jsonrpsee::types::ErrorObjectOwned;
use serde::Deserialize;
use serde_json::json;
use tower::{Layer, Service};
use tracing::trace;

/// Path prefix of the confidence route. The block number is the single segment that follows.
pub const CONFIDENCE_PATH: &str = "/v1/confidence/";

const METHOD: &str = "light_getBlockConfidence";

/// Layer that applies [`ConfidenceRoute`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceRouteLayer;

impl<S> Layer<S> for ConfidenceRouteLayer {
    type Service = ConfidenceRoute<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ConfidenceRoute { inner }
    }
}

/// Serves `GET /v1/confidence/{block}` through the `light` RPC module. Other requests are passed
/// through untouched.
#[derive(Debug, Clone)]
pub struct ConfidenceRoute<S> {
    inner: S,
}

/// Returns the raw block segment of a confidence route request.
fn block_segment<B>(req: &HttpRequest<B>) -> Option<&str> {
    if *req.method() != Method::GET {
        return None;
    }

    req.uri()
        .path()
        .strip_prefix(CONFIDENCE_PATH)
        .filter(|segment| !segment.is_empty() && !segment.contains('/'))
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ErrorObjectOwned>,
}

impl<S, B> Service<HttpRequest<B>> for ConfidenceRoute<S>
where
    S: Service<HttpRequest, Response = HttpResponse>,
    S::Error: Into<BoxError> + 'static,
    S::Future: Send + 'static,
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = HttpResponse;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: HttpRequest<B>) -> Self::Future {
        let Some(block) = block_segment(&req).map(str::to_string) else {
            let fut = self.inner.call(req.map(HttpBody::new));
            return Box::pin(async move { fut.await.map_err(Into::into) });
        };

        trace!(target: "rpc", %block, "Serving confidence route.");

        let (mut parts, _) = req.into_parts();
        parts.method = Method::POST;
        parts.uri = Uri::from_static("/");
        parts.headers.remove(CONTENT_LENGTH);
        parts.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        parts.headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // The segment is passed as a string so malformed numbers come back in the `error` field.
        let call = json!({ "jsonrpc": "2.0", "id": 0, "method": METHOD, "params": [block] });
        let req = HttpRequest::from_parts(parts, HttpBody::from(call.to_string()));

        let fut = self.inner.call(req);

        Box::pin(async move {
            let res = fut.await.map_err(Into::into)?;
            let (parts, body) = res.into_parts();
            let bytes = body.collect().await?.to_bytes();

            let mut res = match serde_json::from_slice::<RpcResponse>(&bytes) {
                Ok(RpcResponse { result: Some(result), .. }) => {
                    response::ok_response(result.to_string())
                }
                Ok(RpcResponse { error: Some(error), .. }) => response::error_response(error),
                _ => response::internal_error(),
            };

            res.extensions_mut().extend(parts.extensions);
            Ok(res)
        })
    }
}
