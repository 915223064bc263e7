pub mod app_config;
pub mod brands;
pub mod config;
pub mod credentials;
pub mod dates;
pub mod kinds;
pub mod records;
pub mod store;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use brands::{load_brands, BrandConfig, BrandsFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use credentials::{hash_password, Credentials, Operator};
pub use dates::{DashboardState, DatePreset, DateRange};
pub use kinds::MetricKind;
pub use records::{
    AdsRecord, IndexRecord, MetricRecord, NaturalKey, PostingsRecord, RankRecord, TrafficRecord,
};
pub use store::{ListQuery, MetricStore, StoreError, UpsertCounts};

#[cfg(feature = "memory-store")]
pub use store::memory::MemoryStore;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands file: {0}")]
    BrandsFileParse(#[source] serde_yaml::Error),

    #[error("brands validation failed: {0}")]
    Validation(String),

    #[error("invalid credential entry: {0}")]
    Credentials(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown record kind: {0}")]
    UnknownKind(String),

    #[error("unknown date preset: {0}")]
    UnknownPreset(String),

    #[error("login failed for user '{0}'")]
    LoginFailed(String),

    #[error("{field} must be at least {min}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        value: i64,
    },
}
