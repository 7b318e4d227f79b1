//! Pipeline configuration.
//!
//! The only knob that changes results is the rolling window. `from_env` reads
//! it (and the two execution settings) from the process environment, loading a
//! `.env` file first if one exists.

use crate::domain::{DateOrder, Window};
use crate::error::{AppError, ErrorKind};

pub const WINDOW_ENV: &str = "EPI_WINDOW";
pub const PARALLEL_ENV: &str = "EPI_PARALLEL";
pub const ORDER_ENV: &str = "EPI_ORDER";

/// Settings for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineConfig {
    /// Rolling-average window applied to every region.
    pub window: Window,
    /// Storage direction the input rows are expected in.
    pub order: DateOrder,
    /// Enrich regions on the rayon pool instead of sequentially.
    pub parallel: bool,
}

impl PipelineConfig {
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key → value source; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(WINDOW_ENV) {
            let size = raw.trim().parse::<usize>().map_err(|_| {
                AppError::new(
                    ErrorKind::Config,
                    format!("Invalid {WINDOW_ENV} '{raw}': expected a positive integer."),
                )
            })?;
            config.window = Window::new(size)?;
        }

        if let Some(raw) = lookup(PARALLEL_ENV) {
            config.parallel = parse_bool(&raw).ok_or_else(|| {
                AppError::new(
                    ErrorKind::Config,
                    format!("Invalid {PARALLEL_ENV} '{raw}': expected true/false."),
                )
            })?;
        }

        if let Some(raw) = lookup(ORDER_ENV) {
            config.order = match raw.trim().to_ascii_lowercase().as_str() {
                "newest-first" | "desc" => DateOrder::NewestFirst,
                "oldest-first" | "asc" => DateOrder::OldestFirst,
                _ => {
                    return Err(AppError::new(
                        ErrorKind::Config,
                        format!(
                            "Invalid {ORDER_ENV} '{raw}': expected newest-first or oldest-first."
                        ),
                    ));
                }
            };
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
