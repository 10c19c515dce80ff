use std::process::ExitCode;

fn main() -> ExitCode {
    ecoswap_cli::run()
}
