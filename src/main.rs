use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap_stdin::FileOrStdin;

/// Compiles a Jack class into Hack virtual machine instructions.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Source file, or - to read from stdin
    #[arg(default_value = "-")]
    input: FileOrStdin,

    /// Write the instructions to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match args.input.contents() {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let instructions = match jackc::compile(&source) {
        Ok(instructions) => instructions,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, instructions) {
                eprintln!("{}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
        None => print!("{}", instructions),
    }
    ExitCode::SUCCESS
}
