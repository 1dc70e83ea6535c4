//! Response message constants
//!
//! The client contract is a fixed set of plain-string bodies; handlers and
//! the error mapper must use these constants, never ad-hoc strings.

pub const OK: &str = "OK";
pub const NON_FIELD: &str = "non_field_errors";
pub const DUPLICATED_EMAIL: &str = "duplicated_email_error";
/// One generic string for every credential failure. Whether the identifier
/// was unknown or the password wrong must not be observable by the client.
pub const INVALID_CREDENTIALS: &str = "invalid_credentials_error";
pub const NOT_AUTH: &str = "not_auth_error";
pub const SERVER_ERROR: &str = "server_error";
