pub const APP_NAME: &str = "rocketblend";

/// Environment variable overriding the database directory.
pub const DB_DIR_ENV: &str = "ROCKETBLEND_DB_DIR";

/// Extension applied to every record file in the store.
pub const RECORD_EXTENSION: &str = "json";

/// Suffix of the transient file a record is staged in before rename.
pub const TEMP_SUFFIX: &str = ".tmp";
