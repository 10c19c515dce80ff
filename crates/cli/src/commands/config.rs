use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ecoswap_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "matching.threshold",
        &config.matching.threshold.to_string(),
        source("matching.threshold", &["ECOSWAP_MATCHING_THRESHOLD"]),
    ));
    lines.push(render_line(
        "matching.name_weight",
        &config.matching.name_weight.to_string(),
        source("matching.name_weight", &["ECOSWAP_MATCHING_NAME_WEIGHT"]),
    ));
    lines.push(render_line(
        "matching.material_weight",
        &config.matching.material_weight.to_string(),
        source("matching.material_weight", &["ECOSWAP_MATCHING_MATERIAL_WEIGHT"]),
    ));
    lines.push(render_line(
        "matching.brand_weight",
        &config.matching.brand_weight.to_string(),
        source("matching.brand_weight", &["ECOSWAP_MATCHING_BRAND_WEIGHT"]),
    ));

    lines.push(render_line(
        "selection.improvement_margin",
        &config.selection.improvement_margin.to_string(),
        source("selection.improvement_margin", &["ECOSWAP_SELECTION_IMPROVEMENT_MARGIN"]),
    ));
    lines.push(render_line(
        "selection.exclude_self_matches",
        &config.selection.exclude_self_matches.to_string(),
        source("selection.exclude_self_matches", &["ECOSWAP_SELECTION_EXCLUDE_SELF_MATCHES"]),
    ));

    lines.push(render_line(
        "impact.original_carbon_kg",
        &config.impact.original_carbon_kg.to_string(),
        source("impact.original_carbon_kg", &["ECOSWAP_IMPACT_ORIGINAL_CARBON_KG"]),
    ));
    lines.push(render_line(
        "impact.original_water_liters",
        &config.impact.original_water_liters.to_string(),
        source("impact.original_water_liters", &["ECOSWAP_IMPACT_ORIGINAL_WATER_LITERS"]),
    ));
    lines.push(render_line(
        "impact.alternative_carbon_kg",
        &config.impact.alternative_carbon_kg.to_string(),
        source("impact.alternative_carbon_kg", &["ECOSWAP_IMPACT_ALTERNATIVE_CARBON_KG"]),
    ));
    lines.push(render_line(
        "impact.alternative_water_liters",
        &config.impact.alternative_water_liters.to_string(),
        source("impact.alternative_water_liters", &["ECOSWAP_IMPACT_ALTERNATIVE_WATER_LITERS"]),
    ));

    lines.push(render_line(
        "analysis.fetch_concurrency",
        &config.analysis.fetch_concurrency.to_string(),
        source("analysis.fetch_concurrency", &["ECOSWAP_ANALYSIS_FETCH_CONCURRENCY"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["ECOSWAP_LOGGING_LEVEL", "ECOSWAP_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["ECOSWAP_LOGGING_FORMAT", "ECOSWAP_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("ecoswap.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/ecoswap.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use toml::Value;

    use super::{contains_path, field_source, render_line};

    #[test]
    fn contains_path_walks_nested_tables() {
        let doc: Value = "[selection]\nimprovement_margin = 10\n".parse().expect("toml");

        assert!(contains_path(&doc, "selection.improvement_margin"));
        assert!(!contains_path(&doc, "selection.exclude_self_matches"));
        assert!(!contains_path(&doc, "matching.threshold"));
    }

    #[test]
    fn file_source_names_the_config_path() {
        let doc: Value = "[matching]\nthreshold = 0.4\n".parse().expect("toml");
        let source = field_source(
            "matching.threshold",
            &["ECOSWAP_TEST_UNSET_THRESHOLD"],
            Some(&doc),
            Some(Path::new("config/ecoswap.toml")),
        );

        assert_eq!(source, "file (config/ecoswap.toml)");
        assert_eq!(
            render_line("matching.threshold", "0.4", source),
            "- matching.threshold = 0.4 (source: file (config/ecoswap.toml))"
        );
    }

    #[test]
    fn missing_everywhere_is_default() {
        let source = field_source("analysis.fetch_concurrency", &[], None, None);
        assert_eq!(source, "default");
    }
}
