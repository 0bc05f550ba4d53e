use serde::{Deserialize, Serialize};

/// Default S3 region when none is configured.
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Where the object store lives and which account identity to use.
///
/// The account's secret key is not part of this config; it is resolved from
/// the secret provider at the start of every run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    pub account: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub path_style: bool,
}

impl StorageConfig {
    pub fn for_minio(endpoint: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            endpoint: Some(endpoint.into()),
            region: DEFAULT_S3_REGION.to_string(),
            path_style: true,
        }
    }

    pub fn for_aws(region: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            endpoint: None,
            region: region.into(),
            path_style: false,
        }
    }
}
