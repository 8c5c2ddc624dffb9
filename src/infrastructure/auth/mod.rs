mod claims;
mod jwt;

pub use claims::{Claims, CATALOG_MAINTAINER_ROLE, PLATFORM_ADMIN_ROLE};
pub use jwt::JwtValidator;
