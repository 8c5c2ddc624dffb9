mod app;
mod middleware;
mod state;

pub use app::create_app;
pub use middleware::{expected_version, extract_bearer_token, AuthClaims};
pub use state::AppState;
