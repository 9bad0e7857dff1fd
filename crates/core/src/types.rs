/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Default number of candidate records committed per import transaction.
pub const DEFAULT_BATCH_SIZE: usize = 100;
