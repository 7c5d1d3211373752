use std::env;

use anyhow::{Context, Result, anyhow};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_S3_REGION: &str = "ap-southeast-1";
const DEFAULT_UPLOAD_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_UPLOAD_MAX_FILES: usize = 20;
const DEFAULT_SEED_USERNAME: &str = "staff-admin";
const DEFAULT_SEED_PASSWORD: &str = "change-me";

/// Runtime settings resolved from the process environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub storage: StorageConfig,
    pub cms: CmsConfig,
    pub uploads: UploadLimits,
    pub seed_staff: SeedStaff,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub public_base_url: Option<String>,
}

impl StorageConfig {
    /// Base URL that stored object keys are appended to when building public links.
    pub fn public_base(&self) -> String {
        if let Some(base) = &self.public_base_url {
            return base.trim_end_matches('/').to_string();
        }

        match &self.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CmsConfig {
    pub base_url: String,
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_bytes: usize,
    pub max_files: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_UPLOAD_MAX_FILE_BYTES,
            max_files: DEFAULT_UPLOAD_MAX_FILES,
        }
    }
}

impl UploadLimits {
    /// Upper bound for a whole multipart request, with headroom for form framing.
    pub fn request_body_limit(&self) -> usize {
        self.max_file_bytes
            .saturating_add(1024 * 1024)
            .saturating_mul(self.max_files)
    }
}

#[derive(Debug, Clone)]
pub struct SeedStaff {
    pub username: String,
    pub password: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |key: &str| read(key).ok_or_else(|| anyhow!("{key} env var is missing"));

        let port = parse_or(read("PORT"), DEFAULT_PORT, "PORT")?;
        let database_max_connections = parse_or(
            read("DATABASE_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
            "DATABASE_MAX_CONNECTIONS",
        )?;
        let max_file_bytes = parse_or(
            read("UPLOAD_MAX_FILE_BYTES"),
            DEFAULT_UPLOAD_MAX_FILE_BYTES,
            "UPLOAD_MAX_FILE_BYTES",
        )?;
        let max_files = parse_or(
            read("UPLOAD_MAX_FILES"),
            DEFAULT_UPLOAD_MAX_FILES,
            "UPLOAD_MAX_FILES",
        )?;

        Ok(Self {
            port,
            database_url: require("DATABASE_URL")?,
            database_max_connections,
            storage: StorageConfig {
                bucket: require("S3_BUCKET")?,
                region: read("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
                endpoint: read("S3_ENDPOINT"),
                public_base_url: read("S3_PUBLIC_BASE_URL"),
            },
            cms: CmsConfig {
                base_url: require("CMS_API_URL")?.trim_end_matches('/').to_string(),
                api_token: read("CMS_API_TOKEN"),
            },
            uploads: UploadLimits {
                max_file_bytes,
                max_files,
            },
            seed_staff: SeedStaff {
                username: read("SEED_STAFF_USERNAME")
                    .unwrap_or_else(|| DEFAULT_SEED_USERNAME.to_string()),
                password: read("SEED_STAFF_PASSWORD")
                    .unwrap_or_else(|| DEFAULT_SEED_PASSWORD.to_string()),
            },
        })
    }
}

fn parse_or<T>(value: Option<String>, default: T, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/estate"),
        ("S3_BUCKET", "listing-assets"),
        ("CMS_API_URL", "https://cms.example.com/"),
    ];

    #[test]
    fn applies_defaults_when_optional_values_missing() {
        let config = AppConfig::from_lookup(lookup_from(REQUIRED)).expect("config");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.storage.region, "ap-southeast-1");
        assert_eq!(config.cms.base_url, "https://cms.example.com");
        assert_eq!(config.uploads.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.seed_staff.username, "staff-admin");
    }

    #[test]
    fn missing_required_value_is_reported() {
        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .expect_err("bucket is required");
        assert!(err.to_string().contains("S3_BUCKET"));
    }

    #[test]
    fn invalid_number_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        let err = AppConfig::from_lookup(lookup_from(&pairs)).expect_err("bad port");
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn public_base_prefers_explicit_url() {
        let mut storage = StorageConfig {
            bucket: "assets".into(),
            region: "ap-southeast-1".into(),
            endpoint: None,
            public_base_url: None,
        };
        assert_eq!(
            storage.public_base(),
            "https://assets.s3.ap-southeast-1.amazonaws.com"
        );

        storage.endpoint = Some("https://r2.example.com/".into());
        assert_eq!(storage.public_base(), "https://r2.example.com/assets");

        storage.public_base_url = Some("https://cdn.example.com/".into());
        assert_eq!(storage.public_base(), "https://cdn.example.com");
    }
}
