use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::AnalysisSettings;
use crate::impact::ImpactFallbacks;
use crate::search::{FieldWeights, SearchSettings, DEFAULT_FIELD_WEIGHTS, DEFAULT_THRESHOLD};
use crate::selector::DEFAULT_IMPROVEMENT_MARGIN;

pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub matching: MatchingConfig,
    pub selection: SelectionConfig,
    pub impact: ImpactFallbacks,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchingConfig {
    pub threshold: f64,
    pub name_weight: f64,
    pub material_weight: f64,
    pub brand_weight: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionConfig {
    pub improvement_margin: u8,
    pub exclude_self_matches: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub fetch_concurrency: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub matching_threshold: Option<f64>,
    pub improvement_margin: Option<u8>,
    pub exclude_self_matches: Option<bool>,
    pub fetch_concurrency: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            matching: MatchingConfig {
                threshold: DEFAULT_THRESHOLD,
                name_weight: DEFAULT_FIELD_WEIGHTS.name,
                material_weight: DEFAULT_FIELD_WEIGHTS.material,
                brand_weight: DEFAULT_FIELD_WEIGHTS.brand,
            },
            selection: SelectionConfig {
                improvement_margin: DEFAULT_IMPROVEMENT_MARGIN,
                exclude_self_matches: false,
            },
            impact: ImpactFallbacks::default(),
            analysis: AnalysisConfig { fetch_concurrency: DEFAULT_FETCH_CONCURRENCY },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl MatchingConfig {
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            threshold: self.threshold,
            weights: FieldWeights {
                name: self.name_weight,
                material: self.material_weight,
                brand: self.brand_weight,
            },
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("ecoswap.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            search: self.matching.search_settings(),
            improvement_margin: self.selection.improvement_margin,
            exclude_self_matches: self.selection.exclude_self_matches,
            fetch_concurrency: self.analysis.fetch_concurrency,
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(matching) = patch.matching {
            if let Some(threshold) = matching.threshold {
                self.matching.threshold = threshold;
            }
            if let Some(name_weight) = matching.name_weight {
                self.matching.name_weight = name_weight;
            }
            if let Some(material_weight) = matching.material_weight {
                self.matching.material_weight = material_weight;
            }
            if let Some(brand_weight) = matching.brand_weight {
                self.matching.brand_weight = brand_weight;
            }
        }

        if let Some(selection) = patch.selection {
            if let Some(improvement_margin) = selection.improvement_margin {
                self.selection.improvement_margin = improvement_margin;
            }
            if let Some(exclude_self_matches) = selection.exclude_self_matches {
                self.selection.exclude_self_matches = exclude_self_matches;
            }
        }

        if let Some(impact) = patch.impact {
            if let Some(original_carbon_kg) = impact.original_carbon_kg {
                self.impact.original_carbon_kg = original_carbon_kg;
            }
            if let Some(original_water_liters) = impact.original_water_liters {
                self.impact.original_water_liters = original_water_liters;
            }
            if let Some(alternative_carbon_kg) = impact.alternative_carbon_kg {
                self.impact.alternative_carbon_kg = alternative_carbon_kg;
            }
            if let Some(alternative_water_liters) = impact.alternative_water_liters {
                self.impact.alternative_water_liters = alternative_water_liters;
            }
        }

        if let Some(analysis) = patch.analysis {
            if let Some(fetch_concurrency) = analysis.fetch_concurrency {
                self.analysis.fetch_concurrency = fetch_concurrency;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ECOSWAP_MATCHING_THRESHOLD") {
            self.matching.threshold = parse_f64("ECOSWAP_MATCHING_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("ECOSWAP_MATCHING_NAME_WEIGHT") {
            self.matching.name_weight = parse_f64("ECOSWAP_MATCHING_NAME_WEIGHT", &value)?;
        }
        if let Some(value) = read_env("ECOSWAP_MATCHING_MATERIAL_WEIGHT") {
            self.matching.material_weight = parse_f64("ECOSWAP_MATCHING_MATERIAL_WEIGHT", &value)?;
        }
        if let Some(value) = read_env("ECOSWAP_MATCHING_BRAND_WEIGHT") {
            self.matching.brand_weight = parse_f64("ECOSWAP_MATCHING_BRAND_WEIGHT", &value)?;
        }

        if let Some(value) = read_env("ECOSWAP_SELECTION_IMPROVEMENT_MARGIN") {
            self.selection.improvement_margin =
                parse_u8("ECOSWAP_SELECTION_IMPROVEMENT_MARGIN", &value)?;
        }
        if let Some(value) = read_env("ECOSWAP_SELECTION_EXCLUDE_SELF_MATCHES") {
            self.selection.exclude_self_matches =
                parse_bool("ECOSWAP_SELECTION_EXCLUDE_SELF_MATCHES", &value)?;
        }

        if let Some(value) = read_env("ECOSWAP_IMPACT_ORIGINAL_CARBON_KG") {
            self.impact.original_carbon_kg =
                parse_f64("ECOSWAP_IMPACT_ORIGINAL_CARBON_KG", &value)?;
        }
        if let Some(value) = read_env("ECOSWAP_IMPACT_ORIGINAL_WATER_LITERS") {
            self.impact.original_water_liters =
                parse_f64("ECOSWAP_IMPACT_ORIGINAL_WATER_LITERS", &value)?;
        }
        if let Some(value) = read_env("ECOSWAP_IMPACT_ALTERNATIVE_CARBON_KG") {
            self.impact.alternative_carbon_kg =
                parse_f64("ECOSWAP_IMPACT_ALTERNATIVE_CARBON_KG", &value)?;
        }
        if let Some(value) = read_env("ECOSWAP_IMPACT_ALTERNATIVE_WATER_LITERS") {
            self.impact.alternative_water_liters =
                parse_f64("ECOSWAP_IMPACT_ALTERNATIVE_WATER_LITERS", &value)?;
        }

        if let Some(value) = read_env("ECOSWAP_ANALYSIS_FETCH_CONCURRENCY") {
            self.analysis.fetch_concurrency =
                parse_usize("ECOSWAP_ANALYSIS_FETCH_CONCURRENCY", &value)?;
        }

        let log_level = read_env("ECOSWAP_LOGGING_LEVEL").or_else(|| read_env("ECOSWAP_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ECOSWAP_LOGGING_FORMAT").or_else(|| read_env("ECOSWAP_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(threshold) = overrides.matching_threshold {
            self.matching.threshold = threshold;
        }
        if let Some(improvement_margin) = overrides.improvement_margin {
            self.selection.improvement_margin = improvement_margin;
        }
        if let Some(exclude_self_matches) = overrides.exclude_self_matches {
            self.selection.exclude_self_matches = exclude_self_matches;
        }
        if let Some(fetch_concurrency) = overrides.fetch_concurrency {
            self.analysis.fetch_concurrency = fetch_concurrency;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_matching(&self.matching)?;
        validate_impact(&self.impact)?;
        validate_analysis(&self.analysis)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("ecoswap.toml"), PathBuf::from("config/ecoswap.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_matching(matching: &MatchingConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&matching.threshold) {
        return Err(ConfigError::Validation(
            "matching.threshold must be in range 0.0..=1.0 (0 = exact, 1 = loose)".to_string(),
        ));
    }

    if !matching.search_settings().weights.is_valid() {
        return Err(ConfigError::Validation(
            "matching weights must be finite, non-negative, and sum to more than zero"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_impact(impact: &ImpactFallbacks) -> Result<(), ConfigError> {
    let values = [
        ("impact.original_carbon_kg", impact.original_carbon_kg),
        ("impact.original_water_liters", impact.original_water_liters),
        ("impact.alternative_carbon_kg", impact.alternative_carbon_kg),
        ("impact.alternative_water_liters", impact.alternative_water_liters),
    ];

    for (key, value) in values {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{key} must be a finite, non-negative number"
            )));
        }
    }

    Ok(())
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), ConfigError> {
    if analysis.fetch_concurrency == 0 || analysis.fetch_concurrency > 256 {
        return Err(ConfigError::Validation(
            "analysis.fetch_concurrency must be in range 1..=256".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.trim().parse::<u8>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| invalid_override(key, value))
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    matching: Option<MatchingPatch>,
    selection: Option<SelectionPatch>,
    impact: Option<ImpactPatch>,
    analysis: Option<AnalysisPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchingPatch {
    threshold: Option<f64>,
    name_weight: Option<f64>,
    material_weight: Option<f64>,
    brand_weight: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SelectionPatch {
    improvement_margin: Option<u8>,
    exclude_self_matches: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ImpactPatch {
    original_carbon_kg: Option<f64>,
    original_water_liters: Option<f64>,
    alternative_carbon_kg: Option<f64>,
    alternative_water_liters: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    fetch_concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
