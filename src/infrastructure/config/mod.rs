mod settings;

pub use settings::{
    DatabaseConfig, JwtConfig, LogFormat, LoggingConfig, OtelConfig, RedisConfig, ServerConfig,
    Settings, StoreConfig,
};
