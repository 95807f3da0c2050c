use std::str::FromStr;
use std::time::Duration;

use dealroom_cloud::S3Config;
use dealroom_core::storage::DEFAULT_URL_TTL;

use crate::auth::jwt::JwtConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT` directly; tracing is set up before the rest of the
    /// configuration is parsed.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub s3: S3Config,
    /// Lifetime of download URLs, never above one hour.
    pub download_url_ttl: Duration,
    /// `None` disables the background orphan sweep.
    pub orphan_sweep_interval: Option<Duration>,
    /// Minimum age of an unreferenced blob before the sweep removes it.
    pub orphan_sweep_grace: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `DATABASE_URL`               | **required**            |
    /// | `JWT_SECRET`                 | **required**            |
    /// | `S3_BUCKET`                  | **required**            |
    /// | `AWS_REGION`                 | SDK default             |
    /// | `S3_ENDPOINT`                | unset                   |
    /// | `S3_FORCE_PATH_STYLE`        | `false`                 |
    /// | `DOWNLOAD_URL_TTL_SECS`      | `3600` (capped)         |
    /// | `ORPHAN_SWEEP_INTERVAL_SECS` | `0` (disabled)          |
    /// | `ORPHAN_SWEEP_GRACE_SECS`    | `3600`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&var, "PORT", 3000)?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?;
        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            access_token_expiry_mins: parse_or(&var, "JWT_ACCESS_EXPIRY_MINS", 15)?,
        };

        let s3 = S3Config {
            bucket: required("S3_BUCKET")?,
            region: var("AWS_REGION"),
            endpoint: var("S3_ENDPOINT"),
            force_path_style: parse_or(&var, "S3_FORCE_PATH_STYLE", false)?,
        };

        let ttl_secs: u64 = parse_or(&var, "DOWNLOAD_URL_TTL_SECS", DEFAULT_URL_TTL.as_secs())?;
        if ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DOWNLOAD_URL_TTL_SECS",
                value: ttl_secs.to_string(),
                reason: "must be positive".into(),
            });
        }
        let download_url_ttl = Duration::from_secs(ttl_secs).min(DEFAULT_URL_TTL);

        let sweep_secs: u64 = parse_or(&var, "ORPHAN_SWEEP_INTERVAL_SECS", 0)?;
        let orphan_sweep_interval = (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs));
        let orphan_sweep_grace =
            Duration::from_secs(parse_or(&var, "ORPHAN_SWEEP_GRACE_SECS", 3600)?);

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            jwt,
            s3,
            download_url_ttl,
            orphan_sweep_interval,
            orphan_sweep_grace,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: key,
            value: raw,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|k| env.get(k).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/dealroom"),
        ("JWT_SECRET", "secret"),
        ("S3_BUCKET", "dealroom-documents"),
    ];

    #[test]
    fn defaults_apply() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.download_url_ttl, Duration::from_secs(3600));
        assert!(config.orphan_sweep_interval.is_none());
        assert!(!config.s3.force_path_style);
    }

    #[test]
    fn missing_required_values() {
        assert_matches!(load(&[]), Err(ConfigError::Missing("DATABASE_URL")));
        assert_matches!(
            load(&REQUIRED[..2]),
            Err(ConfigError::Missing("S3_BUCKET"))
        );
    }

    #[test]
    fn ttl_is_capped_and_sweep_enabled() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DOWNLOAD_URL_TTL_SECS", "86400"));
        pairs.push(("ORPHAN_SWEEP_INTERVAL_SECS", "600"));
        pairs.push(("CORS_ORIGINS", "https://a.example, https://b.example,"));
        let config = load(&pairs).unwrap();
        assert_eq!(config.download_url_ttl, Duration::from_secs(3600));
        assert_eq!(config.orphan_sweep_interval, Some(Duration::from_secs(600)));
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "http"));
        assert_matches!(load(&pairs), Err(ConfigError::Invalid { var: "PORT", .. }));
    }
}
