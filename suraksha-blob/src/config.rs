/// Configuration for media storage
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Bucket holding story media
    pub bucket: String,

    /// Region of the bucket; also part of the public object URL
    pub region: String,

    /// Custom S3-compatible endpoint (RustFS, MinIO). None means AWS.
    pub endpoint_url: Option<String>,

    /// Folder for uploaded story images
    pub image_folder: String,

    /// Folder for uploaded story audio
    pub audio_folder: String,

    /// Lifetime of presigned upload URLs
    pub presign_ttl_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            bucket: "soul-suraksha".to_string(),
            region: "ap-south-1".to_string(),
            endpoint_url: None,
            image_folder: "Uploads/Story-Images".to_string(),
            audio_folder: "Uploads/Story-Audio".to_string(),
            presign_ttl_secs: 900,
        }
    }
}

impl MediaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket<S: Into<String>>(mut self, bucket: S) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint_url = Some(endpoint.into());
        self
    }

    pub fn with_presign_ttl(mut self, secs: u64) -> Self {
        self.presign_ttl_secs = secs;
        self
    }

    /// Base URL under which objects are publicly addressable.
    ///
    /// Virtual-hosted style for AWS, path style for custom endpoints.
    pub fn public_base_url(&self) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}
