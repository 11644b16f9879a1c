// src/main.rs

use kristy::types::INTERNAL_ERROR_CODE;
use kristy::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = match cli::parse() {
        Ok(args) => args,
        Err(err) => {
            // --help / --version print to stdout and are not failures.
            let code = if err.use_stderr() { INTERNAL_ERROR_CODE } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    if let Err(err) = logging::init_logging(args.log_level, args.silent) {
        eprintln!("kristy error: {err:?}");
        std::process::exit(INTERNAL_ERROR_CODE);
    }

    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("kristy error: {err:?}");
            std::process::exit(INTERNAL_ERROR_CODE);
        }
    }
}
