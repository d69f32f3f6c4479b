use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use parley_core::RequestContext;

/// Middleware that captures a `RequestContext` for downstream handlers
pub async fn request_context_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let context = RequestContext::new(parts.clone());

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(context);

    next.run(request).await
}
