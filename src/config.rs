use std::env;

#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub api_token: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub replicate: ReplicateConfig,
    pub s3: S3Config,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        ReplicateConfig {
            api_token: None,
            api_base: None,
        }
    }
}

impl ReplicateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_token = env::var("REPLICATE_API_TOKEN").ok();
        let api_base = env::var("REPLICATE_API_BASE").ok();

        ReplicateConfig {
            api_token,
            api_base,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

impl Default for S3Config {
    fn default() -> Self {
        S3Config {
            bucket: None,
            region: None,
        }
    }
}

impl S3Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let bucket = env::var("S3_BUCKET").ok();
        // AWS_DEFAULT_REGION is what boto-based tooling exports; the SDK's own
        // variable is AWS_REGION. Accept either, preferring the former.
        let region = env::var("AWS_DEFAULT_REGION")
            .or_else(|_| env::var("AWS_REGION"))
            .ok();

        S3Config { bucket, region }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            replicate: ReplicateConfig::default(),
            s3: S3Config::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            replicate: ReplicateConfig::from_env(),
            s3: S3Config::from_env(),
        }
    }

    pub fn with_replicate(mut self, config: ReplicateConfig) -> Self {
        self.replicate = config;
        self
    }

    pub fn with_s3(mut self, config: S3Config) -> Self {
        self.s3 = config;
        self
    }
}
