/*!
 * Object transfer between an object store and local working files.
 *
 * The pipeline only needs two operations: fetch an object into a local file
 * and store a local file as an object. Failures surface as `TransferError`,
 * which is fatal to a job and never confused with translation failures.
 */

use std::fmt;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::app_config::{StorageBackend, StorageConfig};
use crate::errors::TransferError;

/// Object address: bucket (or root sub-directory) plus key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    /// Bucket name
    pub container: String,
    /// Object key
    pub key: String,
}

impl Locator {
    /// Create a locator.
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }

    /// Last path segment of the key.
    pub fn basename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

/// Acknowledgement of a stored object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreReceipt {
    /// Where the object was written
    pub locator: Locator,
    /// Bytes uploaded
    pub bytes: u64,
    /// Entity tag reported by the store, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
}

/// Object storage trait
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Download an object into `destination` and return the local path.
    async fn fetch(&self, locator: &Locator, destination: &Path) -> Result<PathBuf, TransferError>;

    /// Upload a local file as an object.
    async fn store(&self, source: &Path, locator: &Locator) -> Result<StoreReceipt, TransferError>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Build the store described by the configuration.
pub async fn from_config(config: &StorageConfig) -> Box<dyn ObjectStore> {
    match config.backend {
        StorageBackend::S3 => Box::new(S3ObjectStore::connect(config).await),
        StorageBackend::Local => Box::new(LocalObjectStore::new(&config.local_root)),
    }
}

/// S3 (or S3-compatible) object store
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Wrap an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a client from the default credential chain.
    pub async fn connect(config: &StorageConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        // Custom endpoints (MinIO, LocalStack) need path-style addressing
        if let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.is_empty()) {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(Client::from_conf(s3_config_builder.build()))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn fetch(&self, locator: &Locator, destination: &Path) -> Result<PathBuf, TransferError> {
        info!("Downloading s3://{}", locator);
        let response = self
            .client
            .get_object()
            .bucket(&locator.container)
            .key(&locator.key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(service) if service.is_no_such_key() => TransferError::NotFound {
                    container: locator.container.clone(),
                    key: locator.key.clone(),
                },
                _ => TransferError::Backend(DisplayErrorContext(&e).to_string()),
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| TransferError::Backend(e.to_string()))?
            .into_bytes();

        tokio::fs::write(destination, &bytes).await?;
        debug!("Downloaded {} bytes to {}", bytes.len(), destination.display());
        Ok(destination.to_path_buf())
    }

    async fn store(&self, source: &Path, locator: &Locator) -> Result<StoreReceipt, TransferError> {
        info!("Uploading {} to s3://{}", source.display(), locator);
        let data = tokio::fs::read(source).await?;
        let size = data.len() as u64;

        let output = self
            .client
            .put_object()
            .bucket(&locator.container)
            .key(&locator.key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| TransferError::Backend(DisplayErrorContext(&e).to_string()))?;

        Ok(StoreReceipt {
            locator: locator.clone(),
            bytes: size,
            e_tag: output.e_tag().map(str::to_string),
        })
    }

    fn name(&self) -> &str {
        "s3"
    }
}

/// Directory-backed object store: containers are sub-directories of `root`
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Local path of an object; containers and keys may not escape the root.
    pub fn object_path(&self, locator: &Locator) -> Result<PathBuf, TransferError> {
        let mut components = Path::new(&locator.container).components();
        let container = match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => name,
            _ => {
                return Err(TransferError::Backend(format!(
                    "Invalid container name: {}",
                    locator.container
                )))
            }
        };

        let mut path = self.root.join(container);
        for component in Path::new(&locator.key).components() {
            match component {
                Component::Normal(segment) => path.push(segment),
                Component::CurDir => {}
                _ => return Err(TransferError::Backend(format!("Invalid object key: {}", locator.key))),
            }
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn fetch(&self, locator: &Locator, destination: &Path) -> Result<PathBuf, TransferError> {
        let source = self.object_path(locator)?;
        if !tokio::fs::try_exists(&source).await? {
            return Err(TransferError::NotFound {
                container: locator.container.clone(),
                key: locator.key.clone(),
            });
        }

        tokio::fs::copy(&source, destination).await?;
        debug!("Copied {} to {}", source.display(), destination.display());
        Ok(destination.to_path_buf())
    }

    async fn store(&self, source: &Path, locator: &Locator) -> Result<StoreReceipt, TransferError> {
        let target = self.object_path(locator)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = tokio::fs::copy(source, &target).await?;
        info!("Stored {}", target.display());
        Ok(StoreReceipt {
            locator: locator.clone(),
            bytes,
            e_tag: None,
        })
    }

    fn name(&self) -> &str {
        "local"
    }
}
