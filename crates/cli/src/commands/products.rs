use smartcart_core::catalog::Catalog;
use smartcart_core::config::LoadOptions;
use smartcart_core::errors::ApplicationError;

use crate::commands::{load_config, to_details, CommandResult};

const COMMAND: &str = "products";

pub fn run(options: &LoadOptions, search: Option<&str>) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let catalog = match Catalog::load(&config.catalog.path, config.catalog.options()) {
        Ok(catalog) => catalog,
        Err(error) => return CommandResult::from_error(COMMAND, &ApplicationError::from(error)),
    };

    let matches = catalog.search(search);
    let message = match search.filter(|text| !text.is_empty()) {
        Some(text) => format!("{} of {} products match `{text}`", matches.len(), catalog.len()),
        None => format!("{} products", catalog.len()),
    };

    CommandResult::success_with_details(COMMAND, message, to_details(&matches))
}
