//! Bearer/JWT authentication as a [`plexus_core::Middleware`]. Reads
//! the `Authorization` header the way [`plexus_core::CsrfMiddleware`] reads
//! its submitted token — out of the context's `contains` bag, stashed there
//! upstream by the transport layer — and stores the validated identity back
//! into `contains` under `"identity"` for downstream handlers.

use std::sync::Arc;

use plexus_core::{AppError, BoxFuture, Middleware, MiddlewareContext, NextFn, Response};

use crate::error::SecurityError;
use crate::identity::{AuthenticatedUser, DefaultIdentityBuilder, IdentityBuilder};
use crate::jwt::JwtValidator;

const AUTH_HEADER_KEY: &str = "header_authorization";
const IDENTITY_KEY: &str = "identity";
const BEARER_PREFIX: &str = "Bearer ";

fn extract_bearer_token(ctx: &MiddlewareContext) -> Result<&str, SecurityError> {
    let header = ctx
        .contains
        .get(AUTH_HEADER_KEY)
        .and_then(|v| v.as_str())
        .ok_or(SecurityError::MissingAuthHeader)?;
    header
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
        .ok_or(SecurityError::InvalidAuthScheme)
}

/// Validates a bearer JWT on every request it wraps and rejects the request
/// with 401 if the token is missing or invalid. Unlike the session/CSRF
/// middlewares this one always fails closed — there is no "optional auth"
/// mode here; mount it only on routes that require an authenticated caller.
pub struct AuthMiddleware<B: IdentityBuilder = DefaultIdentityBuilder> {
    validator: Arc<JwtValidator<B>>,
}

impl AuthMiddleware<DefaultIdentityBuilder> {
    pub fn new(validator: Arc<JwtValidator<DefaultIdentityBuilder>>) -> Self {
        Self { validator }
    }
}

impl<B: IdentityBuilder> AuthMiddleware<B> {
    pub fn with_builder(validator: Arc<JwtValidator<B>>) -> Self {
        Self { validator }
    }
}

impl<B> Middleware for AuthMiddleware<B>
where
    B: IdentityBuilder + 'static,
    B::Identity: serde::Serialize,
{
    fn handle(&self, mut ctx: MiddlewareContext, next: NextFn) -> BoxFuture<Result<Response, AppError>> {
        let validator = Arc::clone(&self.validator);
        Box::pin(async move {
            let token = extract_bearer_token(&ctx)?.to_string();
            let identity = validator.validate(&token).await?;
            let claims = serde_json::to_value(identity_to_json(&identity)).unwrap_or_default();
            ctx.contains.insert(IDENTITY_KEY.to_string(), claims);
            next(ctx).await
        })
    }
}

// `IdentityBuilder::Identity` is generic, so we round-trip through JSON to
// stash it in the context's untyped bag rather than requiring every
// identity type to be `Serialize` at the trait level.
fn identity_to_json<I: serde::Serialize>(identity: &I) -> serde_json::Value {
    serde_json::to_value(identity).unwrap_or(serde_json::Value::Null)
}

/// Reads back the [`AuthenticatedUser`] an [`AuthMiddleware`] stashed into
/// the context, for handlers downstream in the pipeline.
pub fn authenticated_user(ctx: &MiddlewareContext) -> Option<AuthenticatedUser> {
    ctx.contains
        .get(IDENTITY_KEY)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Checks that the identity stashed by [`AuthMiddleware`] carries at least
/// one of `required_roles`, callable from within a handler or a further
/// middleware.
pub fn require_any_role(ctx: &MiddlewareContext, required_roles: &[&str]) -> Result<AuthenticatedUser, AppError> {
    let user = authenticated_user(ctx)
        .ok_or_else(|| AppError::Forbidden("no authenticated identity on this request".into()))?;
    if user.has_any_role(required_roles) {
        Ok(user)
    } else {
        Err(AppError::Forbidden("insufficient roles".into()))
    }
}
