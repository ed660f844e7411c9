//! Authentication and authorization module

pub mod hierarchy;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use hierarchy::{Level, RoleHierarchy};
pub use jwt::{AccessClaims, JwtService, RefreshClaims, TokenError, TokenPair};
pub use middleware::{
    extract_token, jwt_auth_middleware, role_gate_middleware, AuthContext, RoleGate,
};
pub use password::PasswordHasher;
