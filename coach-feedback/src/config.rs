//! Pipeline configuration from the TOML model
//!
//! Validates the string-typed settings in `coach_common::config` into the
//! pipeline's strong types. Invalid values are startup errors.

use crate::types::Category;
use crate::workflow::{FanOutConfig, Locale, PipelineConfig, Plan, DEFAULT_CATEGORY_PRIORITY};
use coach_common::config::{CoachConfig, PipelineSettings};
use coach_common::{Error, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Build the pipeline configuration from `[pipeline]` settings
pub fn pipeline_config(settings: &PipelineSettings) -> Result<PipelineConfig> {
    let plan: Plan = settings
        .plan
        .parse()
        .map_err(|e| Error::Config(format!("pipeline.plan: {}", e)))?;

    let locale: Locale = settings
        .locale
        .parse()
        .map_err(|e| Error::Config(format!("pipeline.locale: {}", e)))?;

    if settings.specialist_timeout_ms == 0 || settings.global_timeout_ms == 0 {
        return Err(Error::Config("pipeline timeouts must be positive".to_string()));
    }
    if settings.global_timeout_ms < settings.specialist_timeout_ms {
        warn!(
            specialist_timeout_ms = settings.specialist_timeout_ms,
            global_timeout_ms = settings.global_timeout_ms,
            "Global ceiling is shorter than the per-specialist timeout"
        );
    }

    let category_priority = match &settings.category_priority {
        Some(names) => parse_priority(names)?,
        None => DEFAULT_CATEGORY_PRIORITY.to_vec(),
    };

    Ok(PipelineConfig {
        fanout: FanOutConfig {
            specialist_timeout: Duration::from_millis(settings.specialist_timeout_ms),
            global_timeout: Duration::from_millis(settings.global_timeout_ms),
        },
        plan,
        max_suggestions_transcribed: settings.max_suggestions_transcribed,
        max_suggestions_typed: settings.max_suggestions_typed,
        category_priority,
        locale,
    })
}

/// Parse a configured priority order
///
/// Every name must be a known category and appear once. Categories left
/// out are appended in default order.
fn parse_priority(names: &[String]) -> Result<Vec<Category>> {
    let mut order = Vec::with_capacity(DEFAULT_CATEGORY_PRIORITY.len());
    for name in names {
        let category: Category = name
            .parse()
            .map_err(|e| Error::Config(format!("pipeline.category_priority: {}", e)))?;
        if order.contains(&category) {
            return Err(Error::Config(format!(
                "pipeline.category_priority: duplicate category {}",
                category
            )));
        }
        order.push(category);
    }

    for category in DEFAULT_CATEGORY_PRIORITY {
        if !order.contains(&category) {
            order.push(category);
        }
    }

    Ok(order)
}

/// Log the effective configuration at startup
pub fn log_effective(config: &CoachConfig, pipeline: &PipelineConfig) {
    info!(
        plan = %pipeline.plan,
        caps = ?pipeline.cap_policy(pipeline.plan),
        specialist_timeout_ms = config.pipeline.specialist_timeout_ms,
        global_timeout_ms = config.pipeline.global_timeout_ms,
        locale = ?pipeline.locale,
        model = %config.specialist.model,
        endpoint = %config.specialist.endpoint,
        "Effective pipeline configuration"
    );
}
