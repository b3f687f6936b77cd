use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Where the external account center lives and how we hand sessions back to the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthCenterConfig {
    pub base_url: String,
    pub callback_url: String,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub dashboard_path: String,
    pub login_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub cdn_domain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub auth_center: AuthCenterConfig,
    pub upload: Option<UploadConfig>,
    pub allowed_origins: Vec<String>,
}

const DEFAULT_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:3000",
];

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "notesync".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "notesync-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        let auth_center = AuthCenterConfig {
            base_url: std::env::var("AUTH_CENTER_URL")
                .unwrap_or_else(|_| "https://os.crazyaigc.com".into()),
            callback_url: std::env::var("AUTH_CALLBACK_URL").unwrap_or_else(|_| {
                "http://localhost:8080/api/v1/auth/wechat/callback".into()
            }),
            cookie_domain: std::env::var("AUTH_COOKIE_DOMAIN")
                .ok()
                .filter(|v| !v.is_empty()),
            cookie_secure: std::env::var("AUTH_COOKIE_SECURE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            dashboard_path: std::env::var("DASHBOARD_PATH").unwrap_or_else(|_| "/dashboard".into()),
            login_path: std::env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".into()),
        };
        let upload = match (
            std::env::var("QINIU_ACCESS_KEY"),
            std::env::var("QINIU_SECRET_KEY"),
            std::env::var("QINIU_BUCKET"),
            std::env::var("QINIU_DOMAIN"),
        ) {
            (Ok(access_key), Ok(secret_key), Ok(bucket), Ok(cdn_domain))
                if ![&access_key, &secret_key, &bucket, &cdn_domain]
                    .iter()
                    .any(|v| v.is_empty()) =>
            {
                Some(UploadConfig {
                    access_key,
                    secret_key,
                    bucket,
                    cdn_domain,
                })
            }
            _ => None,
        };
        let allowed_origins =
            parse_allowed_origins(&std::env::var("ALLOWED_ORIGINS").unwrap_or_default());

        Ok(Self {
            database_url,
            db_max_connections,
            jwt,
            auth_center,
            upload,
            allowed_origins,
        })
    }
}

/// Comma-separated origin list; falls back to the local dev servers when blank.
pub fn parse_allowed_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| o.starts_with("http://") || o.starts_with("https://"))
        .map(String::from)
        .collect();
    if origins.is_empty() {
        DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect()
    } else {
        origins
    }
}
