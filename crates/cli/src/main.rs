use std::process::ExitCode;

fn main() -> ExitCode {
    smartcart_cli::run()
}
