//! Fixed names used when locating and overriding configuration

/// Directory under the platform config dir holding versolve files
pub const CONFIG_DIR_NAME: &str = "versolve";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_RESULT_CACHE: &str = "VERSOLVE_RESULT_CACHE";
pub const ENV_MISSING_PREVIOUS_IS_ERROR: &str = "VERSOLVE_MISSING_PREVIOUS_IS_ERROR";
pub const ENV_NUDGE_INTERVAL: &str = "VERSOLVE_NUDGE_INTERVAL";
pub const ENV_ALL_ANSWERS_LIMIT: &str = "VERSOLVE_ALL_ANSWERS_LIMIT";
pub const ENV_MAX_CONSTRAINTS_PER_PACKAGE: &str = "VERSOLVE_MAX_CONSTRAINTS_PER_PACKAGE";
