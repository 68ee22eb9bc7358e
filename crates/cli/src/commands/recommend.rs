use smartcart_core::config::LoadOptions;
use smartcart_core::errors::ApplicationError;
use smartcart_core::storefront::Storefront;
use smartcart_core::suggestions::{RandomPicker, ResolutionStrategy};

use crate::commands::{load_config, to_details, CommandResult};

const COMMAND: &str = "recommend";

pub fn run(options: &LoadOptions, product: &str) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let storefront = match Storefront::open(&config) {
        Ok(storefront) => storefront,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let mut picker = RandomPicker::from_seed_option(config.recommendation.seed);
    match storefront.resolve(product, &mut picker) {
        Ok(resolution) => {
            let message = match resolution.strategy {
                ResolutionStrategy::Echo { reason } => format!(
                    "no alternative for `{product}` ({}); echoing it back",
                    reason.description()
                ),
                _ => format!(
                    "customers who viewed `{product}` may also like `{}`",
                    resolution.product
                ),
            };
            CommandResult::success_with_details(COMMAND, message, to_details(&resolution))
        }
        Err(error) => CommandResult::from_error(COMMAND, &ApplicationError::from(error)),
    }
}
