use std::io::{self, BufRead, Write};

use smartcart_core::config::LoadOptions;
use smartcart_core::errors::{ApplicationError, DomainError};
use smartcart_core::ml::Artifacts;
use smartcart_core::storefront::{ShopperSession, Storefront};
use smartcart_core::suggestions::{Picker, RandomPicker, ResolutionStrategy};
use tracing::info;

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "shop";

const HELP: &str = "\
commands:
  list [text]    list products, optionally filtered by name
  add <name>     add a product to the cart
  cart           show cart contents and total
  clear          empty the cart
  recommend      suggest a product for the last cart item
  help           show this help
  quit           end the session";

enum Step {
    Continue,
    Quit,
}

/// Line-oriented shopping session. Prompts and replies go to `output`; the
/// returned outcome summarizes the session.
pub fn run<R: BufRead, W: Write>(options: &LoadOptions, input: R, output: &mut W) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let storefront = match Storefront::open(&config) {
        Ok(storefront) => storefront,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let mut session =
        storefront.session(RandomPicker::from_seed_option(config.recommendation.seed));
    info!(event_name = "session.started", session_id = %session.id(), "shopper session started");

    match drive(&storefront, &mut session, input, output) {
        Ok(()) => {}
        Err(SessionFailure::Io(error)) => {
            return CommandResult::failure(COMMAND, "io", error.to_string(), 1);
        }
        Err(SessionFailure::Domain(error)) => {
            return CommandResult::from_error(COMMAND, &ApplicationError::from(error));
        }
    }

    let total = match session.cart_total() {
        Ok(total) => total,
        Err(error) => return CommandResult::from_error(COMMAND, &ApplicationError::from(error)),
    };
    info!(
        event_name = "session.ended",
        session_id = %session.id(),
        items = session.cart().len(),
        total,
        "shopper session ended"
    );

    CommandResult::success(
        COMMAND,
        format!("session ended with {} items in the cart (total ${total})", session.cart().len()),
    )
}

enum SessionFailure {
    Io(io::Error),
    Domain(DomainError),
}

impl From<io::Error> for SessionFailure {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<DomainError> for SessionFailure {
    fn from(error: DomainError) -> Self {
        Self::Domain(error)
    }
}

fn drive<P: Picker, R: BufRead, W: Write>(
    storefront: &Storefront,
    session: &mut ShopperSession<'_, Artifacts, P>,
    input: R,
    output: &mut W,
) -> Result<(), SessionFailure> {
    writeln!(output, "welcome to SmartCart; type `help` for commands")?;

    for line in input.lines() {
        let line = line?;
        match handle_line(storefront, session, line.trim(), output)? {
            Step::Continue => {}
            Step::Quit => break,
        }
    }

    output.flush()?;
    Ok(())
}

fn handle_line<P: Picker, W: Write>(
    storefront: &Storefront,
    session: &mut ShopperSession<'_, Artifacts, P>,
    line: &str,
    output: &mut W,
) -> Result<Step, SessionFailure> {
    let (verb, argument) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb {
        "" => {}
        "list" => {
            let filter = (!argument.is_empty()).then_some(argument);
            let products = session.list_products(filter);
            if products.is_empty() {
                writeln!(output, "no products match `{argument}`")?;
            }
            for product in products {
                writeln!(output, "{} - ${}", product.name, product.price)?;
            }
        }
        "add" => {
            if argument.is_empty() {
                writeln!(output, "usage: add <name>")?;
            } else if !storefront.catalog().contains(argument) {
                writeln!(output, "`{argument}` is not in the catalog")?;
            } else {
                session.add_to_cart(argument)?;
                writeln!(output, "added {argument} ({} in cart)", session.cart().len())?;
            }
        }
        "cart" => {
            let lines = session.cart_contents()?;
            if lines.is_empty() {
                writeln!(output, "your cart is empty")?;
            }
            for line in &lines {
                writeln!(output, "{} - ${}", line.name, line.price)?;
            }
            writeln!(output, "total: ${}", session.cart_total()?)?;
        }
        "clear" => {
            session.clear_cart();
            writeln!(output, "cart cleared")?;
        }
        "recommend" => match session.resolve_for_last_cart_item()? {
            Some(resolution) => {
                let last = session.cart().last_item().unwrap_or_default();
                match resolution.strategy {
                    ResolutionStrategy::Echo { reason } => writeln!(
                        output,
                        "no recommendation for {last}: {}",
                        reason.description()
                    )?,
                    _ => writeln!(
                        output,
                        "customers who bought {last} may also like: {}",
                        resolution.product
                    )?,
                }
            }
            None => writeln!(output, "add something to your cart to get a recommendation")?,
        },
        "help" => writeln!(output, "{HELP}")?,
        "quit" | "exit" => return Ok(Step::Quit),
        other => writeln!(output, "unknown command `{other}`; type `help` for commands")?,
    }

    Ok(Step::Continue)
}
