use std::env;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;

use crate::{MediaConfig, MediaError, MediaResult, MediaStore};

/// Static credentials, when the environment provides them.
///
/// Falls back to the default AWS provider chain otherwise.
#[derive(Debug)]
struct StaticKeys {
    access_key_id: String,
    secret_access_key: String,
}

impl StaticKeys {
    fn from_env() -> Option<Self> {
        let access_key_id = env::var("AWS_ACCESS_KEY").ok()?;
        let secret_access_key = env::var("AWS_SECRET_KEY").ok()?;
        Some(Self {
            access_key_id,
            secret_access_key,
        })
    }
}

/// S3 (or S3-compatible) media store
#[derive(Clone)]
pub struct S3MediaStore {
    client: Client,
    bucket: String,
}

impl S3MediaStore {
    pub async fn new(config: &MediaConfig) -> MediaResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(MediaError::invalid("media bucket must not be empty"));
        }
        let client = Self::create_client(config, StaticKeys::from_env()).await;
        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }

    async fn create_client(config: &MediaConfig, keys: Option<StaticKeys>) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(keys) = keys {
            loader = loader.credentials_provider(Credentials::new(
                keys.access_key_id,
                keys.secret_access_key,
                None,
                None,
                "suraksha-env",
            ));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let aws_config = loader.load().await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                // Custom endpoints are addressed path-style
                .force_path_style(config.endpoint_url.is_some())
                .build(),
        )
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn delete(&self, key: &str) -> MediaResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(MediaError::backend)?;
        Ok(())
    }

    async fn sign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in_secs: u64,
    ) -> MediaResult<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expires_in_secs))
            .map_err(MediaError::backend)?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(MediaError::backend)?;

        Ok(request.uri().to_string())
    }
}
