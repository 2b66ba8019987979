/// All database primary keys except upload sessions are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Upload sessions are keyed by an opaque UUIDv7 token.
pub type SessionId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
