use std::{env::args_os, process::ExitCode};

use svd_image_codec::{run, CLIParser};

fn main() -> ExitCode {
    let mut cli_parser = CLIParser::default();
    let arguments = cli_parser.parse(args_os());
    match run(&arguments) {
        Ok(_) => {
            println!("{} successful", arguments.mode());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} failed because of: {}", arguments.mode(), e);
            ExitCode::FAILURE
        }
    }
}
