use std::path::PathBuf;

use smartcart_core::catalog::Catalog;
use smartcart_core::config::LoadOptions;
use smartcart_core::errors::ApplicationError;
use smartcart_core::ml::train;
use tracing::info;

use crate::commands::{load_config, to_details, CommandResult};

const COMMAND: &str = "train";

pub fn run(options: &LoadOptions, catalog: Option<PathBuf>, out: Option<PathBuf>) -> CommandResult {
    let mut options = options.clone();
    if catalog.is_some() {
        options.overrides.catalog_path = catalog;
    }
    if out.is_some() {
        options.overrides.artifacts_dir = out;
    }

    let config = match load_config(COMMAND, &options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let outcome = (|| -> Result<_, ApplicationError> {
        let catalog = Catalog::load(&config.catalog.path, config.catalog.options())?;
        let trained = train(&catalog, config.training.options())?;
        let paths = config.artifacts.paths();
        trained.artifacts.save(&paths)?;
        Ok((trained.report, paths))
    })();

    match outcome {
        Ok((report, paths)) => {
            info!(
                event_name = "training.artifacts_written",
                dir = %config.artifacts.dir.display(),
                samples = report.samples,
                "wrote trained artifacts"
            );
            let message = format!(
                "trained on {} products ({} tree nodes, depth {}, training accuracy {:.3}); wrote {}, {}, {}",
                report.samples,
                report.node_count,
                report.depth,
                report.training_accuracy,
                paths.encoder.display(),
                paths.scaler.display(),
                paths.classifier.display(),
            );
            CommandResult::success_with_details(COMMAND, message, to_details(&report))
        }
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}
