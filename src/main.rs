use std::process::ExitCode;

fn main() -> ExitCode {
    descent::cli::run()
}
