//! minicc — compiles one mini-c source file into one textual LLVM IR module.

mod cli;

use std::fs;

use anyhow::Result;
use log::info;

use cli::Cli;
use minic::CompileError;

fn main() -> Result<()> {
    let args = Cli::init();

    simple_logger::init_with_level(args.verbosity.into()).unwrap();

    let source = fs::read_to_string(&args.file)?;
    let module_name = args.file.to_string_lossy();

    let program = match minic::parse(&source) {
        Ok(program) => program,
        Err(error) => report(error),
    };

    if args.dump_ast {
        info!("Parsed AST:\n{program:#?}");
    }

    let module = match minic::emit(&program, &module_name) {
        Ok(module) => module,
        Err(error) => report(error),
    };

    fs::write(&args.output, module)?;
    info!("wrote IR module to {}", args.output.display());

    Ok(())
}

/// Prints the diagnostic in its `<line>:<column> Error: <message>` form and
/// terminates with a non-zero exit code.
fn report(error: CompileError) -> ! {
    eprintln!("{error}");
    std::process::exit(1);
}
