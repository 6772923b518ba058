use crate::error::{config_error, env_error, AppResult};
use crate::utils::time::parse_time;
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::str::FromStr;
use tracing::{info, warn};

/// Where the optional view overrides live
pub const VIEW_CONFIG_PATH: &str = "config/view.toml";

/// Default Google endpoints
pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";
pub const DEFAULT_SCOPE: &str =
    "openid profile https://www.googleapis.com/auth/calendar.events";

/// Settings for the week grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// First visible hour of the day
    pub min_hour: u32,
    /// Hour at which the grid stops
    pub max_hour: u32,
    /// Length of one slot in minutes
    pub step_minutes: u32,
    /// Number of slots per hour cell
    pub timeslots: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            min_hour: 7,
            max_hour: 23,
            step_minutes: 30,
            timeslots: 2,
        }
    }
}

impl ViewConfig {
    /// Reject grids that cannot be laid out
    pub fn validate(&self) -> AppResult<()> {
        if self.min_hour >= self.max_hour || self.max_hour > 24 {
            return Err(config_error("min_hour must be before max_hour (max 24)"));
        }
        if self.step_minutes == 0 || 60 % self.step_minutes != 0 {
            return Err(config_error("step_minutes must divide an hour"));
        }
        if self.timeslots == 0 {
            return Err(config_error("timeslots must be at least 1"));
        }
        Ok(())
    }

    /// Parse `HH:MM` bounds, used when overriding hours from the environment.
    ///
    /// The grid starts and ends on the hour, so only `HH:00` is accepted.
    pub fn with_bounds(mut self, min: &str, max: &str) -> AppResult<Self> {
        self.min_hour = whole_hour(min, "VIEW_MIN")?;
        self.max_hour = whole_hour(max, "VIEW_MAX")?;
        Ok(self)
    }
}

fn whole_hour(value: &str, name: &str) -> AppResult<u32> {
    match parse_time(value) {
        Some((hour, 0)) => Ok(hour),
        Some(_) => Err(config_error(&format!("{} must be on the hour: {}", name, value))),
        None => Err(config_error(&format!("Invalid {} format: {}", name, value))),
    }
}

/// Main configuration structure for the application
#[derive(Debug, Clone)]
pub struct Config {
    /// Google OAuth client ID
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Calendar to read events from
    pub google_calendar_id: String,
    /// OAuth redirect URI registered with Google
    pub google_redirect_uri: String,
    /// OAuth scope requested at sign in
    pub google_scope: String,
    /// OAuth authorization endpoint
    pub google_auth_url: String,
    /// OAuth token endpoint
    pub google_token_url: String,
    /// Base URL for the Calendar and userinfo APIs
    pub google_api_base: String,
    /// Maximum number of upcoming events fetched on sign in
    pub max_results: u32,
    /// Timezone used for every label and the week grid
    pub timezone: Tz,
    /// Port the web server listens on
    pub port: u16,
    /// Secret used to sign session cookies
    pub session_secret: String,
    /// Session lifetime in minutes
    pub session_expiration_minutes: i64,
    /// UI locale
    pub locale: String,
    /// Open the page in a browser once the server is up
    pub open_browser: bool,
    /// Week grid settings
    pub view: ViewConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_client_id: String::new(),
            google_client_secret: String::new(),
            google_calendar_id: "primary".to_string(),
            google_redirect_uri: "http://localhost:3000/oauth/callback".to_string(),
            google_scope: DEFAULT_SCOPE.to_string(),
            google_auth_url: DEFAULT_AUTH_URL.to_string(),
            google_token_url: DEFAULT_TOKEN_URL.to_string(),
            google_api_base: DEFAULT_API_BASE.to_string(),
            max_results: 10,
            timezone: chrono_tz::Asia::Tokyo,
            port: 3000,
            session_secret: "super_secret_key".to_string(),
            session_expiration_minutes: 60 * 24,
            locale: "ja".to_string(),
            open_browser: false,
            view: ViewConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        // Required environment variables
        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;

        let timezone = match env::var("TIMEZONE") {
            Ok(name) => Tz::from_str(&name)
                .map_err(|_| config_error(&format!("Unknown timezone: {}", name)))?,
            Err(_) => defaults.timezone,
        };

        let max_results = match env::var("MAX_RESULTS") {
            Ok(value) => value
                .parse::<u32>()
                .map_err(|_| env_error("Invalid MAX_RESULTS format"))?,
            Err(_) => defaults.max_results,
        };

        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| env_error("Invalid PORT format"))?,
            Err(_) => defaults.port,
        };

        let session_expiration_minutes = match env::var("SESSION_EXPIRATION_MINUTES") {
            Ok(value) => value
                .parse::<i64>()
                .map_err(|_| env_error("Invalid SESSION_EXPIRATION_MINUTES format"))?,
            Err(_) => defaults.session_expiration_minutes,
        };

        let session_secret = match env::var("SESSION_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                warn!("SESSION_SECRET not set, using the built-in development secret");
                defaults.session_secret.clone()
            }
        };

        let open_browser = env::var("OPEN_BROWSER")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let view = Self::load_view_config()?;

        Ok(Config {
            google_client_id,
            google_client_secret,
            google_calendar_id: env::var("GOOGLE_CALENDAR_ID")
                .unwrap_or(defaults.google_calendar_id),
            google_redirect_uri: env::var("GOOGLE_REDIRECT_URI")
                .unwrap_or(defaults.google_redirect_uri),
            google_scope: env::var("GOOGLE_SCOPE").unwrap_or(defaults.google_scope),
            google_auth_url: env::var("GOOGLE_AUTH_URL").unwrap_or(defaults.google_auth_url),
            google_token_url: env::var("GOOGLE_TOKEN_URL").unwrap_or(defaults.google_token_url),
            google_api_base: env::var("GOOGLE_API_BASE").unwrap_or(defaults.google_api_base),
            max_results,
            timezone,
            port,
            session_secret,
            session_expiration_minutes,
            locale: env::var("APP_LOCALE").unwrap_or(defaults.locale),
            open_browser,
            view,
        })
    }

    /// Read view overrides from `config/view.toml` when present
    fn load_view_config() -> AppResult<ViewConfig> {
        let view = match fs::read_to_string(VIEW_CONFIG_PATH) {
            Ok(content) => {
                info!("Loading view settings from {}", VIEW_CONFIG_PATH);
                Self::parse_view_config(&content)?
            }
            Err(_) => ViewConfig::default(),
        };

        let view = match (env::var("VIEW_MIN"), env::var("VIEW_MAX")) {
            (Ok(min), Ok(max)) => view.with_bounds(&min, &max)?,
            _ => view,
        };

        view.validate()?;
        Ok(view)
    }

    /// Parse a view override file; missing keys keep their defaults
    pub fn parse_view_config(content: &str) -> AppResult<ViewConfig> {
        let view: ViewConfig = toml::from_str(content)?;
        view.validate()?;
        Ok(view)
    }
}
