//! AWS client configuration
//!
//! Clients are built once by the caller and handed to [`crate::S3Source`] and
//! [`crate::DynamoLedger`]; nothing in the library reaches for a global client.

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use std::env;
use tracing::{debug, info};

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    /// Endpoint override, e.g. LocalStack or MinIO
    pub endpoint: Option<String>,
    /// Static credentials; when unset the default provider chain is used
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub path_style: bool,
}

/// Handles for the services the loader talks to
#[derive(Clone)]
pub struct AwsClients {
    pub s3: aws_sdk_s3::Client,
    pub dynamodb: aws_sdk_dynamodb::Client,
}

impl AwsConfig {
    /// Environment variables:
    /// - `AWS_REGION` / `AWS_DEFAULT_REGION`
    /// - `AWS_ENDPOINT_URL`
    /// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
    /// - `S3_PATH_STYLE` (true/false)
    pub fn from_env() -> Self {
        Self {
            region: env::var("AWS_REGION")
                .or_else(|_| env::var("AWS_DEFAULT_REGION"))
                .unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            endpoint: env::var("AWS_ENDPOINT_URL").ok(),
            access_key: env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Configuration for a LocalStack endpoint with its dummy credentials.
    pub fn for_localstack(endpoint: impl Into<String>) -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: Some(endpoint.into()),
            access_key: Some("test".to_string()),
            secret_key: Some("test".to_string()),
            path_style: true,
        }
    }

    pub async fn connect(&self) -> AwsClients {
        debug!(region = %self.region, endpoint = ?self.endpoint, "Loading AWS configuration");

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()));

        if let Some(endpoint) = &self.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        if let (Some(access_key), Some(secret_key)) = (&self.access_key, &self.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "bookmark-loader",
            ));
        }

        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(self.path_style)
            .build();

        info!(region = %self.region, "AWS clients initialized");

        AwsClients {
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            dynamodb: aws_sdk_dynamodb::Client::new(&shared),
        }
    }
}
