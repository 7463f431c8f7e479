//! Configuration for the interview coordinator
//!
//! Values resolve in order: built-in defaults, an optional TOML file, then
//! `INTERVIEW__SECTION__KEY` environment variables. A handful of common
//! variables are also honoured directly through each section's `from_env`.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("INTERVIEW")
                .prefix_separator("__")
                .separator("__"),
        );

        let loaded: Config = builder.build()?.try_deserialize()?;
        Ok(loaded.from_env())
    }

    /// Apply the direct environment overrides of every section
    pub fn from_env(self) -> Self {
        Self {
            session: self.session.from_env(),
            planner: self.planner.from_env(),
            generation: self.generation.from_env(),
            logging: self.logging.from_env(),
        }
    }
}

/// Session storage and lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Root directory for sessions, transcripts and evaluations
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Inactivity window before a session counts as timed out
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Autosave period
    #[serde(default = "default_autosave_secs")]
    pub autosave_interval_secs: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_timeout_secs() -> u64 {
    900
}

fn default_autosave_secs() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            timeout_secs: default_timeout_secs(),
            autosave_interval_secs: default_autosave_secs(),
        }
    }
}

impl SessionConfig {
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("INTERVIEW_DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("INTERVIEW_TIMEOUT_SECS") {
            if let Ok(num) = val.parse() {
                self.timeout_secs = num;
            }
        }

        if let Ok(val) = std::env::var("INTERVIEW_AUTOSAVE_SECS") {
            if let Ok(num) = val.parse() {
                self.autosave_interval_secs = num;
            }
        }

        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }
}

/// Topic planning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Planned interview length in minutes
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,

    /// Questions on a surface topic before it may deepen
    #[serde(default = "default_depth_threshold")]
    pub depth_progression_threshold: u32,

    /// Below this many remaining minutes depth never advances
    #[serde(default = "default_time_pressure_minutes")]
    pub time_pressure_minutes: u32,

    /// Remaining minutes assumed before any session time is known
    #[serde(default = "default_duration_minutes")]
    pub default_remaining_minutes: u32,
}

fn default_duration_minutes() -> u32 {
    45
}

fn default_depth_threshold() -> u32 {
    2
}

fn default_time_pressure_minutes() -> u32 {
    10
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_duration_minutes(),
            depth_progression_threshold: default_depth_threshold(),
            time_pressure_minutes: default_time_pressure_minutes(),
            default_remaining_minutes: default_duration_minutes(),
        }
    }
}

impl PlannerConfig {
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("INTERVIEW_DURATION_MINUTES") {
            if let Ok(num) = val.parse() {
                self.duration_minutes = num;
            }
        }

        self
    }
}

/// Text-generation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Prefer streamed completions for questions
    #[serde(default = "default_streaming")]
    pub streaming: bool,

    #[serde(default = "default_breaker_failures")]
    pub circuit_breaker_failures: usize,

    #[serde(default = "default_breaker_reset")]
    pub circuit_breaker_reset_secs: u64,

    #[serde(default)]
    pub temperatures: RoleTemperatures,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_max_tokens() -> u32 {
    300
}

fn default_streaming() -> bool {
    true
}

fn default_breaker_failures() -> usize {
    5
}

fn default_breaker_reset() -> u64 {
    30
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout(),
            max_attempts: default_max_attempts(),
            max_tokens: default_max_tokens(),
            streaming: default_streaming(),
            circuit_breaker_failures: default_breaker_failures(),
            circuit_breaker_reset_secs: default_breaker_reset(),
            temperatures: RoleTemperatures::default(),
        }
    }
}

impl GenerationConfig {
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("LLM_API_URL") {
            self.api_url = val;
        }

        if let Ok(val) = std::env::var("LLM_MODEL") {
            self.model = val;
        }

        if let Ok(val) = std::env::var("LLM_STREAMING") {
            self.streaming = val.to_lowercase() == "true" || val == "1";
        }

        self
    }

    /// API key, if the configured variable is set and non-empty
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn breaker_reset(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_reset_secs)
    }
}

/// Sampling temperature per role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleTemperatures {
    #[serde(default = "default_interviewer_temp")]
    pub interviewer: f32,

    #[serde(default = "default_evaluator_temp")]
    pub evaluator: f32,

    #[serde(default = "default_planner_temp")]
    pub topic_planner: f32,

    #[serde(default = "default_coordinator_temp")]
    pub coordinator: f32,
}

fn default_interviewer_temp() -> f32 {
    0.8
}

fn default_evaluator_temp() -> f32 {
    0.4
}

fn default_planner_temp() -> f32 {
    0.6
}

fn default_coordinator_temp() -> f32 {
    0.7
}

impl Default for RoleTemperatures {
    fn default() -> Self {
        Self {
            interviewer: default_interviewer_temp(),
            evaluator: default_evaluator_temp(),
            topic_planner: default_planner_temp(),
            coordinator: default_coordinator_temp(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("LOG_LEVEL") {
            self.level = val;
        }

        if let Ok(val) = std::env::var("LOG_FORMAT") {
            self.json = val.eq_ignore_ascii_case("json");
        }

        self
    }
}
