use std::process::ExitCode;

fn main() -> ExitCode {
    match ixa_lattice::runner::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
