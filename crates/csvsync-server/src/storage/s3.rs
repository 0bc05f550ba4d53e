//! S3-compatible blob store

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
    Client,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    config::StorageConfig, BlobStore, BlobStoreConnector, StorageCredentials, StorageError,
};

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// [`BlobStore`] over an S3 client; containers map to buckets
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
}

impl S3BlobStore {
    pub fn new(config: &StorageConfig, credentials: StorageCredentials) -> Self {
        debug!(
            endpoint = ?config.endpoint,
            region = %config.region,
            account = %credentials.account,
            "Initializing S3 blob store"
        );

        let credentials = Credentials::new(
            &credentials.account,
            &credentials.key,
            None,
            None,
            "csvsync-storage",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    async fn exists(&self, container: &str, path: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(container)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(StorageError::io(
                        container,
                        path,
                        DisplayErrorContext(&service_error).to_string(),
                    ))
                }
            },
        }
    }
}

fn describe(container: &str, path: &str) -> String {
    format!("s3://{}/{}", container, path)
}

#[async_trait]
impl BlobStore for S3BlobStore {
    #[instrument(skip(self))]
    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(container)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| {
                    StorageError::io(container, prefix, DisplayErrorContext(&e).to_string())
                })?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match (response.is_truncated(), response.next_continuation_token()) {
                (Some(true), Some(token)) => continuation_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(count = keys.len(), "Listed {}", describe(container, prefix));

        Ok(keys)
    }

    #[instrument(skip(self))]
    async fn read_all(&self, container: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(container)
            .key(path)
            .send()
            .await
            .map_err(|err| {
                let service_error = err.into_service_error();
                if service_error.is_no_such_key() {
                    StorageError::not_found(container, path)
                } else {
                    StorageError::io(
                        container,
                        path,
                        DisplayErrorContext(&service_error).to_string(),
                    )
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::io(container, path, e.to_string()))?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from {}", data.len(), describe(container, path));

        Ok(data)
    }

    #[instrument(skip(self, content), fields(bytes = content.len()))]
    async fn write(
        &self,
        container: &str,
        path: &str,
        content: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        if !overwrite && self.exists(container, path).await? {
            return Err(StorageError::AlreadyExists {
                container: container.to_string(),
                path: path.to_string(),
            });
        }

        self.client
            .put_object()
            .bucket(container)
            .key(path)
            .content_type(CSV_CONTENT_TYPE)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|e| StorageError::io(container, path, DisplayErrorContext(&e).to_string()))?;

        info!("Uploaded {}", describe(container, path));

        Ok(())
    }
}

/// Connects [`S3BlobStore`]s using a fixed endpoint configuration
pub struct S3Connector {
    config: StorageConfig,
}

impl S3Connector {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BlobStoreConnector for S3Connector {
    async fn connect(
        &self,
        credentials: StorageCredentials,
    ) -> Result<Arc<dyn BlobStore>, StorageError> {
        if credentials.key.is_empty() {
            return Err(StorageError::Connect(format!(
                "empty storage key for account '{}'",
                credentials.account
            )));
        }

        Ok(Arc::new(S3BlobStore::new(&self.config, credentials)))
    }
}
