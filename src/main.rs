use std::process::ExitCode;

use clap::Parser;

use maskmill::cli::{self, Cli};

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap renders --help/--version through this path too; those
            // go to stdout and exit 0, real argument errors exit 1
            let code = u8::from(e.use_stderr());
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let mut stdout = std::io::stdout().lock();
    match cli::execute(&cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}
