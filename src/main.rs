use bish::driver::{self, CompileOptions, Mode};
use bish::logging;
use bish::target::TargetShell;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process;

/// Compile bish scripts to bash.
#[derive(Parser, Debug)]
#[command(name = "bish", version, about = "Compile bish scripts to bash")]
struct Cli {
    /// Script to compile.
    input: Option<PathBuf>,

    /// Output shell dialect.
    #[arg(long, default_value_t = TargetShell::Bash)]
    target: TargetShell,

    /// Compile as a library: functions only, no entry call.
    #[arg(long)]
    library: bool,

    /// Write output to a file instead of stdout (sets the executable bit).
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: Option<PathBuf>,

    /// Do not set the executable bit on the output file.
    #[arg(long = "no-chmod-x")]
    no_chmod_x: bool,

    /// Run the whole pipeline without emitting code.
    #[arg(long, conflicts_with_all = ["emit_ast", "emit_ir"])]
    check: bool,

    /// Dump the parsed program (debug).
    #[arg(long = "emit-ast", conflicts_with = "emit_ir")]
    emit_ast: bool,

    /// Dump the lowered module (debug).
    #[arg(long = "emit-ir")]
    emit_ir: bool,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.check {
            Mode::Check
        } else if self.emit_ast {
            Mode::EmitAst
        } else if self.emit_ir {
            Mode::EmitIr
        } else {
            Mode::Default
        }
    }
}

fn main() {
    logging::init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too and are not failures.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    let Some(input) = cli.input.clone() else {
        eprintln!("error: no input file given");
        eprintln!("{}", Cli::command().render_usage());
        process::exit(1);
    };

    let mode = cli.mode();
    let writes_file = cli.out.is_some() && mode == Mode::Default;
    let options = CompileOptions {
        target: cli.target,
        compile_as_library: cli.library,
        out_path: if writes_file { cli.out.clone() } else { None },
        chmod_x: writes_file && !cli.no_chmod_x,
        mode,
    };

    match driver::compile_file(&input, options) {
        Ok(out) => {
            if writes_file {
                return;
            }
            match mode {
                Mode::Default => print!("{}", out),
                _ => println!("{}", out),
            }
        }
        Err(e) => {
            eprintln!("{}", e.msg);
            process::exit(e.code);
        }
    }
}
