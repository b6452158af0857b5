pub mod access_gate;
pub mod api_auth;
pub mod response;

pub use access_gate::{access_gate, AccessGate, SessionUser};
pub use api_auth::{api_auth_middleware, ApiAuth, ApiClaims};
pub use response::ApiResponse;
