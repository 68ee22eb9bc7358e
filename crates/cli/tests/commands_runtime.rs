use std::env;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use smartcart_cli::commands::{config, doctor, products, recommend, shop, train};
use smartcart_core::config::{ConfigOverrides, LoadOptions};
use tempfile::TempDir;

const CATALOG: &str = "\
product,price,image
Ceramic Mug,40,mug.png
Bamboo Spoon,12,spoon.png
Tea Kettle,120,kettle.png
Cast Iron Pan,140,pan.png
Espresso Machine,890,espresso.png
\"Chef's Knife, 8in\",75.99,knife.png
";

#[test]
fn train_writes_artifacts_and_reports_summary() {
    with_env(&[], || {
        let workspace = Workspace::new();
        let result = train::run(&workspace.options(), None, None);
        assert_eq!(result.exit_code, 0, "expected successful training: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "train");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["details"]["samples"], 6);
        assert_eq!(payload["details"]["training_accuracy"], 1.0);

        for file in ["encoder.json", "scaler.json", "best_model.json"] {
            assert!(workspace.artifacts_dir().join(file).exists(), "{file} should be written");
        }
    });
}

#[test]
fn train_returns_catalog_failure_for_missing_catalog() {
    with_env(&[], || {
        let workspace = Workspace::new();
        let missing = workspace.dir.path().join("absent.csv");

        let result = train::run(&workspace.options(), Some(missing), None);
        assert_eq!(result.exit_code, 3, "expected catalog load failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "catalog_load");
    });
}

#[test]
fn commands_return_config_failure_for_invalid_env() {
    with_env(&[("SMARTCART_TRAINING_MIN_SAMPLES_SPLIT", "1")], || {
        let workspace = Workspace::new();
        let result = train::run(&workspace.options(), None, None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "train");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn recommend_requires_trained_artifacts() {
    with_env(&[], || {
        let workspace = Workspace::new();
        let result = recommend::run(&workspace.options(), "Ceramic Mug");
        assert_eq!(result.exit_code, 4, "expected artifact load failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "artifact_load");
    });
}

#[test]
fn recommend_stays_within_the_predicted_bucket() {
    with_env(&[], || {
        let workspace = Workspace::new();
        assert_eq!(train::run(&workspace.options(), None, None).exit_code, 0);

        let result = recommend::run(&workspace.options(), "Ceramic Mug");
        assert_eq!(result.exit_code, 0, "expected recommendation: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["details"]["product"], "Bamboo Spoon");
        assert_eq!(payload["details"]["strategy"]["kind"], "same_bucket");
        assert_eq!(payload["details"]["strategy"]["bucket"], 0);
    });
}

#[test]
fn recommend_echoes_unknown_products() {
    with_env(&[], || {
        let workspace = Workspace::new();
        assert_eq!(train::run(&workspace.options(), None, None).exit_code, 0);

        let result = recommend::run(&workspace.options(), "Laptop");
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["details"]["product"], "Laptop");
        assert_eq!(payload["details"]["strategy"]["kind"], "echo");
        assert_eq!(payload["details"]["strategy"]["reason"], "unknown_product");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("product was not seen during training"), "{message}");
    });
}

#[test]
fn shop_explains_echoed_recommendations_for_untrained_products() {
    with_env(&[], || {
        let workspace = Workspace::new();
        assert_eq!(train::run(&workspace.options(), None, None).exit_code, 0);
        fs::write(workspace.catalog_path(), format!("{CATALOG}Linen Apron,30,apron.png\n"))
            .expect("rewrite catalog");

        let mut transcript = Vec::new();
        let result = shop::run(
            &workspace.options(),
            Cursor::new("add Linen Apron\nrecommend\nquit\n"),
            &mut transcript,
        );
        assert_eq!(result.exit_code, 0, "expected clean session: {}", result.output);

        let transcript = String::from_utf8(transcript).expect("utf-8 transcript");
        assert!(
            transcript
                .contains("no recommendation for Linen Apron: product was not seen during training"),
            "{transcript}"
        );
    });
}

#[test]
fn products_filters_case_insensitively() {
    with_env(&[], || {
        let workspace = Workspace::new();

        let all = parse_payload(&products::run(&workspace.options(), None).output);
        assert_eq!(all["details"].as_array().map(Vec::len), Some(6));

        let filtered = parse_payload(&products::run(&workspace.options(), Some("KNIFE")).output);
        let details = filtered["details"].as_array().cloned().unwrap_or_default();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0]["name"], "Chef's Knife, 8in");
        assert_eq!(details[0]["price"], 75);
        assert_eq!(details[0]["bucket"], 1);
    });
}

#[test]
fn shop_session_follows_scripted_input() {
    with_env(&[], || {
        let workspace = Workspace::new();
        assert_eq!(train::run(&workspace.options(), None, None).exit_code, 0);

        let script = "help\nadd Laptop\nadd Tea Kettle\nadd Ceramic Mug\ncart\nrecommend\nclear\nrecommend\nquit\nadd Bamboo Spoon\n";
        let mut transcript = Vec::new();
        let result = shop::run(&workspace.options(), Cursor::new(script), &mut transcript);
        assert_eq!(result.exit_code, 0, "expected clean session: {}", result.output);

        let transcript = String::from_utf8(transcript).expect("utf-8 transcript");
        assert!(transcript.contains("`Laptop` is not in the catalog"));
        assert!(transcript.contains("total: $160"));
        assert!(transcript.contains("customers who bought Ceramic Mug may also like: Bamboo Spoon"));
        assert!(transcript.contains("add something to your cart"));

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "shop");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("0 items"), "input after quit must be ignored: {message}");
    });
}

#[test]
fn doctor_reports_missing_artifacts_then_passes_after_training() {
    with_env(&[], || {
        let workspace = Workspace::new();

        let before = doctor::run(&workspace.options(), true);
        assert_eq!(before.exit_code, 1);
        let report = parse_payload(&before.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(check_status(&report, "catalog_load"), "pass");
        assert_eq!(check_status(&report, "artifacts_load"), "fail");
        assert_eq!(check_status(&report, "vocabulary_coverage"), "skipped");

        assert_eq!(train::run(&workspace.options(), None, None).exit_code, 0);

        let after = doctor::run(&workspace.options(), true);
        assert_eq!(after.exit_code, 0, "expected passing doctor: {}", after.output);
        assert_eq!(parse_payload(&after.output)["overall_status"], "pass");
    });
}

#[test]
fn doctor_flags_products_added_after_training() {
    with_env(&[], || {
        let workspace = Workspace::new();
        assert_eq!(train::run(&workspace.options(), None, None).exit_code, 0);

        fs::write(workspace.catalog_path(), format!("{CATALOG}Linen Apron,30,apron.png\n"))
            .expect("rewrite catalog");

        let result = doctor::run(&workspace.options(), false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("- [fail] vocabulary_coverage"));
        assert!(result.output.contains("Linen Apron"));
    });
}

#[test]
fn config_reports_value_sources() {
    with_env(&[("SMARTCART_LOG_LEVEL", "debug")], || {
        let workspace = Workspace::new();
        let mut options = workspace.options();
        options.overrides = ConfigOverrides {
            recommendation_seed: Some(99),
            ..ConfigOverrides::default()
        };

        let result = config::run(&options);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("- catalog.path = "));
        assert!(result.output.contains("catalog.path") && result.output.contains("(source: file ("));
        assert!(result.output.contains("- logging.level = debug (source: env (SMARTCART_LOG_LEVEL))"));
        assert!(result.output.contains("- recommendation.seed = 99 (source: override (command line))"));
        assert!(result.output.contains("- training.min_samples_split = 2 (source: default)"));
    });
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let workspace = Self { dir };
        fs::write(workspace.catalog_path(), CATALOG).expect("write catalog");
        fs::write(
            workspace.config_path(),
            format!(
                "[catalog]\npath = {}\n\n[artifacts]\ndir = {}\n\n[recommendation]\nseed = 11\n",
                toml_string(&workspace.catalog_path()),
                toml_string(&workspace.artifacts_dir()),
            ),
        )
        .expect("write config");
        workspace
    }

    fn catalog_path(&self) -> std::path::PathBuf {
        self.dir.path().join("products.csv")
    }

    fn artifacts_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("artifacts")
    }

    fn config_path(&self) -> std::path::PathBuf {
        self.dir.path().join("smartcart.toml")
    }

    fn options(&self) -> LoadOptions {
        LoadOptions {
            config_path: Some(self.config_path()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        }
    }
}

fn toml_string(path: &Path) -> String {
    toml::Value::String(path.display().to_string()).to_string()
}

fn check_status(report: &Value, name: &str) -> String {
    report["checks"]
        .as_array()
        .and_then(|checks| checks.iter().find(|check| check["name"] == name))
        .and_then(|check| check["status"].as_str())
        .unwrap_or("missing")
        .to_string()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SMARTCART_CATALOG_PATH",
        "SMARTCART_CATALOG_HAS_HEADER",
        "SMARTCART_ARTIFACTS_DIR",
        "SMARTCART_ARTIFACTS_ENCODER_FILE",
        "SMARTCART_ARTIFACTS_SCALER_FILE",
        "SMARTCART_ARTIFACTS_CLASSIFIER_FILE",
        "SMARTCART_TRAINING_MAX_DEPTH",
        "SMARTCART_TRAINING_MIN_SAMPLES_SPLIT",
        "SMARTCART_RECOMMENDATION_SEED",
        "SMARTCART_LOGGING_LEVEL",
        "SMARTCART_LOGGING_FORMAT",
        "SMARTCART_LOG_LEVEL",
        "SMARTCART_LOG_FORMAT",
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
