use std::env;
use std::sync::{Mutex, OnceLock};

use ecoswap_cli::commands::config;
use ecoswap_cli::commands::demo::{self, DemoOptions};
use serde_json::Value;

#[test]
fn demo_reports_seed_catalog_pairings() {
    with_env(&[], || {
        let result = demo::run(DemoOptions::default());
        assert_eq!(result.exit_code, 0, "expected successful demo run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "demo");
        assert_eq!(payload["status"], "ok");
        assert!(payload.get("data").is_none(), "report is only embedded with --json");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.starts_with("analyzed 4 of 4 cart item(s) (run "));
        assert!(message.contains(
            "  - shop-toothbrush (Plastic Toothbrush, 40) -> green-bamboo-brush (Bamboo Toothbrush, 90)"
        ));
        assert!(message
            .contains("  - shop-detergent (Laundry Detergent Pods, 88) -> no greener alternative"));
        assert!(message.ends_with(
            "🌍 You could reduce your CO₂ by 14.4kg and water usage by 2760L by switching 3 items."
        ));
    });
}

#[test]
fn demo_json_embeds_camel_case_report() {
    with_env(&[], || {
        let result = demo::run(DemoOptions { json: true, ..DemoOptions::default() });
        assert_eq!(result.exit_code, 0, "expected successful demo run");

        let payload = parse_payload(&result.output);
        let data = &payload["data"];
        assert!(data["runId"].is_string());
        assert!(data["generatedAt"].is_string());
        assert_eq!(data["summary"]["switchedItems"], 3);
        assert_eq!(data["matches"].as_array().map(Vec::len), Some(4));
        assert_eq!(data["matches"][1]["alternative"]["id"], "green-steel-bottle");
        assert_eq!(data["matches"][3]["alternative"], Value::Null);
    });
}

#[test]
fn demo_with_custom_cart_drops_unknown_ids() {
    with_env(&[], || {
        let result = demo::run(DemoOptions {
            cart: vec!["shop-tote".to_string(), "no-such-product".to_string()],
            ..DemoOptions::default()
        });
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.starts_with("analyzed 1 of 2 cart item(s)"));
        assert!(message.contains("green-organic-tote"));
        assert!(message.ends_with("by switching 1 item."));
    });
}

#[test]
fn demo_margin_override_can_leave_cart_already_optimized() {
    with_env(&[], || {
        let result = demo::run(DemoOptions {
            cart: vec!["shop-tote".to_string()],
            improvement_margin: Some(50),
            ..DemoOptions::default()
        });
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.ends_with("✅ All your selected items are already eco-optimized!"));
    });
}

#[test]
fn demo_returns_config_failure_for_invalid_env() {
    with_env(&[("ECOSWAP_MATCHING_THRESHOLD", "1.5")], || {
        let result = demo::run(DemoOptions::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "demo");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_attributes_env_sources() {
    with_env(
        &[("ECOSWAP_SELECTION_IMPROVEMENT_MARGIN", "12"), ("ECOSWAP_LOG_LEVEL", "debug")],
        || {
            let output = config::run();

            assert!(output.starts_with("effective config (source precedence: env > file > default):"));
            assert!(output.contains(
                "- selection.improvement_margin = 12 (source: env (ECOSWAP_SELECTION_IMPROVEMENT_MARGIN))"
            ));
            assert!(output.contains("- logging.level = debug (source: env (ECOSWAP_LOG_LEVEL))"));
            assert!(output.contains("- matching.threshold = 0.5 (source: default)"));
            assert!(output.contains("- analysis.fetch_concurrency = 8 (source: default)"));
        },
    );
}

#[test]
fn config_reports_validation_failure() {
    with_env(&[("ECOSWAP_ANALYSIS_FETCH_CONCURRENCY", "0")], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed:"), "{output}");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "ECOSWAP_MATCHING_THRESHOLD",
        "ECOSWAP_MATCHING_NAME_WEIGHT",
        "ECOSWAP_MATCHING_MATERIAL_WEIGHT",
        "ECOSWAP_MATCHING_BRAND_WEIGHT",
        "ECOSWAP_SELECTION_IMPROVEMENT_MARGIN",
        "ECOSWAP_SELECTION_EXCLUDE_SELF_MATCHES",
        "ECOSWAP_IMPACT_ORIGINAL_CARBON_KG",
        "ECOSWAP_IMPACT_ORIGINAL_WATER_LITERS",
        "ECOSWAP_IMPACT_ALTERNATIVE_CARBON_KG",
        "ECOSWAP_IMPACT_ALTERNATIVE_WATER_LITERS",
        "ECOSWAP_ANALYSIS_FETCH_CONCURRENCY",
        "ECOSWAP_LOGGING_LEVEL",
        "ECOSWAP_LOGGING_FORMAT",
        "ECOSWAP_LOG_LEVEL",
        "ECOSWAP_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
