pub mod bash;
pub mod context;

pub use bash::BashEmitter;

use crate::error::CompileError;
use crate::ir::Module;
pub use crate::target::TargetShell;

#[derive(Clone, Debug, Copy, Default)]
pub struct CodegenOptions {
    pub target: TargetShell,
    /// Skip the call to the entry function so the output can be sourced.
    pub compile_as_library: bool,
}

/// A backend that renders a whole module as script text for one shell.
pub trait CodeGenerator {
    fn target(&self) -> TargetShell;
    fn generate(&mut self, module: &Module) -> Result<String, CompileError>;
}

/// Returns the appropriate shebang line for the target shell
pub(crate) fn shebang(target: TargetShell) -> &'static str {
    match target {
        TargetShell::Bash => "#!/usr/bin/env bash",
    }
}

pub fn generator_for(opts: CodegenOptions) -> Box<dyn CodeGenerator> {
    match opts.target {
        TargetShell::Bash => Box::new(BashEmitter::new(opts.compile_as_library)),
    }
}

pub fn emit_with_options(module: &Module, opts: CodegenOptions) -> Result<String, CompileError> {
    generator_for(opts).generate(module)
}
