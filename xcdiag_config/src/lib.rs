mod schema;

pub use schema::{CONFIG_TEMPLATE, Config, DerivedDataConfig, LoggingConfig, expand_tilde};
