/// URL for accessing the PostgreSQL database backing the task store
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. For formatting info, see
/// [tracing_subscriber's EnvFilter documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// Address the HTTP listener binds to, defaults to 0.0.0.0
pub const HOST: &str = "HOST";
/// Port the HTTP listener binds to, defaults to 8080
pub const PORT: &str = "PORT";

/// Origin of the frontend that is allowed to make credentialed cross-site requests
pub const FRONTEND_ORIGIN: &str = "FRONTEND_ORIGIN";
/// Set to "true" when the service is reached over TLS. Identity cookies are then
/// issued with the Secure flag and SameSite=None so cross-site frontends can send them.
pub const SECURE_COOKIES: &str = "SECURE_COOKIES";
