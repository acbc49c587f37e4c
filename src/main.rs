//! ggp - command-line porcelain for GeoGig repositories.

use std::process::ExitCode;

use geogig_porcelain::cli;
use geogig_porcelain::ui::output;
use geogig_porcelain::Error;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            if let Some(engine_err) = err.downcast_ref::<Error>() {
                let lines = engine_err.output();
                if lines.len() > 1 {
                    eprintln!("{}", output::format_list(lines, "  | "));
                }
            }
            ExitCode::FAILURE
        }
    }
}
