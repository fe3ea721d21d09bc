use std::process::ExitCode;

fn main() -> ExitCode {
    match book_etl::app::run_enrich() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
