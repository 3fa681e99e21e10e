//! Process configuration
//!
//! Everything is read from environment variables once at startup.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_FRESHNESS;
use crate::content::{ContentSources, GalleryFailurePolicy};
use crate::drive::client::{DEFAULT_API_BASE, DEFAULT_TOKEN_URL};
use crate::drive::DriveCredentials;
use crate::transform::{ImageUrlStrategy, TransformOptions, DEFAULT_EXCERPT_LENGTH, DEFAULT_THUMBNAIL_SIZE};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub sources: ContentSources,
    pub credentials: DriveCredentials,
    pub drive_api_base: String,
    pub oauth_token_url: String,
    /// Freshness window for cached aggregations
    pub cache_ttl: Duration,
    /// Deadline for each upstream call
    pub upstream_timeout: Duration,
    pub transform: TransformOptions,
    pub gallery_failures: GalleryFailurePolicy,
    /// Allowed CORS origin, `*` for any
    pub cors_origin: String,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host: IpAddr = parse_or(&get, "BIND_ADDR", IpAddr::from([0, 0, 0, 0]))?;
        let port: u16 = parse_or(&get, "PORT", DEFAULT_PORT)?;

        let strategy: ImageUrlStrategy = parse_or(&get, "IMAGE_URL_STRATEGY", ImageUrlStrategy::default())?;
        let image_urls = match strategy {
            ImageUrlStrategy::Thumbnail { .. } => ImageUrlStrategy::Thumbnail {
                size: parse_or(&get, "THUMBNAIL_SIZE", DEFAULT_THUMBNAIL_SIZE)?,
            },
            direct => direct,
        };

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            sources: ContentSources {
                root_folder_id: required(&get, "ROOT_FOLDER_ID")?,
                news_folder_id: required(&get, "NEWS_FOLDER_ID")?,
            },
            credentials: DriveCredentials {
                client_id: required(&get, "GOOGLE_CLIENT_ID")?,
                client_secret: required(&get, "GOOGLE_CLIENT_SECRET")?,
                refresh_token: required(&get, "GOOGLE_REFRESH_TOKEN")?,
            },
            drive_api_base: get("DRIVE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            oauth_token_url: get("OAUTH_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            cache_ttl: Duration::from_secs(parse_or(&get, "CACHE_TTL_SECS", DEFAULT_FRESHNESS.as_secs())?),
            upstream_timeout: Duration::from_secs(parse_or(
                &get,
                "UPSTREAM_TIMEOUT_SECS",
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?),
            transform: TransformOptions {
                image_urls,
                excerpt_length: parse_or(&get, "EXCERPT_LENGTH", DEFAULT_EXCERPT_LENGTH)?,
            },
            gallery_failures: parse_or(&get, "GALLERY_FAILURE_POLICY", GalleryFailurePolicy::default())?,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| "*".to_string()),
        })
    }
}

fn required<F>(get: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    get(key).ok_or_else(|| anyhow!("Missing required environment variable {}", key))
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("Invalid value '{}' for {}", raw, key)),
        None => Ok(default),
    }
}
