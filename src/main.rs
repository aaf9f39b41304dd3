use std::process::ExitCode;

fn main() -> ExitCode {
    codescribe::cli::run()
}
