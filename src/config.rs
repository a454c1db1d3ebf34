use anyhow::{Context, Result};

pub const RAW_BUCKET_NAME_VAR: &str = "RAW_BUCKET_NAME";
pub const TABLE_NAME_VAR: &str = "TABLE_NAME";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub raw_bucket_name: String,
    pub table_name: String,
}

impl Config {
    pub fn new(raw_bucket_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            raw_bucket_name: raw_bucket_name.into(),
            table_name: table_name.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let raw_bucket_name = std::env::var(RAW_BUCKET_NAME_VAR)
            .with_context(|| format!("{RAW_BUCKET_NAME_VAR} env var not set"))?;
        let table_name = std::env::var(TABLE_NAME_VAR)
            .with_context(|| format!("{TABLE_NAME_VAR} env var not set"))?;

        Ok(Self::new(raw_bucket_name, table_name))
    }
}
