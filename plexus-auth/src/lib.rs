pub mod config;
pub mod error;
pub mod identity;
pub mod jwks;
pub mod jwt;
pub mod keycloak;
pub mod middleware;
pub mod openid;

// Re-export primary public types for convenience.
pub use config::SecurityConfig;
pub use error::SecurityError;
pub use identity::{
    AuthenticatedUser, DefaultIdentityBuilder, DefaultRoleExtractor, IdentityBuilder,
    IdentityBuilderWith,
};
pub use jwks::JwksCache;
pub use jwt::{JwtClaimsValidator, JwtValidator};
pub use middleware::{authenticated_user, require_any_role, AuthMiddleware};

// Re-export the base RoleExtractor trait at crate root for convenience.
pub use openid::RoleExtractor;

pub mod prelude {
    //! Re-exports of the most commonly used security types.
    pub use crate::{
        authenticated_user, require_any_role, AuthMiddleware, AuthenticatedUser, JwtValidator,
        SecurityConfig,
    };
}
