use std::collections::BTreeMap;

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Recipient answers keyed by chapter id.
pub type Answers = BTreeMap<String, String>;

/// Phase 1 has no accounts: every story belongs to this owner.
pub const DEFAULT_OWNER_ID: uuid::Uuid = uuid::Uuid::from_u128(1);
