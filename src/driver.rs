use crate::codegen::{self, TargetShell};
use crate::error::CompileError;
use crate::loader;
use crate::lower;
use crate::span::Diagnostic;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Default,
    Check,
    EmitAst,
    EmitIr,
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub target: TargetShell,
    pub compile_as_library: bool,
    pub out_path: Option<PathBuf>,
    pub chmod_x: bool,
    pub mode: Mode,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: TargetShell::Bash,
            compile_as_library: false,
            out_path: None,
            chmod_x: false,
            mode: Mode::Default,
        }
    }
}

/// Exit code plus the message printed for it.
#[derive(Debug)]
pub struct DriverError {
    pub code: i32,
    pub msg: String,
}

impl DriverError {
    pub const IO: i32 = 1;
    pub const SOURCE: i32 = 2;
    pub const CODEGEN: i32 = 3;

    fn io(msg: String) -> Self {
        Self { code: Self::IO, msg }
    }

    fn source(d: &Diagnostic, base: Option<&Path>) -> Self {
        Self {
            code: Self::SOURCE,
            msg: d.format(base),
        }
    }

    fn codegen(e: CompileError) -> Self {
        Self {
            code: Self::CODEGEN,
            msg: format!("internal error: {}", e),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

impl std::error::Error for DriverError {}

pub fn compile_file(path: &Path, options: CompileOptions) -> Result<String, DriverError> {
    let diag_base_dir = path
        .parent()
        .map(|p| std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf()));

    // Unreadable input is an I/O failure (1), not a source error (2).
    if !path.exists() {
        return Err(DriverError::io(format!("File not found: {}", path.display())));
    }
    if let Err(e) = std::fs::File::open(path) {
        return Err(DriverError::io(format!("Unable to read file: {} ({})", path.display(), e)));
    }

    tracing::debug!(path = %path.display(), mode = ?options.mode, shell = %options.target, "compiling");

    let mut ast = loader::load(path).map_err(|d| DriverError::source(&d, diag_base_dir.as_deref()))?;

    if let Mode::EmitAst = options.mode {
        ast.strip_spans();
        ast.source_maps.clear();
        return Ok(format!("{:#?}", ast));
    }

    let ir = lower::lower_with_options(
        &ast,
        &lower::LowerOptions {
            compile_as_library: options.compile_as_library,
        },
    )
    .map_err(|d| DriverError::source(&d, diag_base_dir.as_deref()))?;

    if let Mode::EmitIr = options.mode {
        return Ok(format!("{:#?}", ir));
    }

    let out = codegen::emit_with_options(
        &ir,
        codegen::CodegenOptions {
            target: options.target,
            compile_as_library: options.compile_as_library,
        },
    )
    .map_err(DriverError::codegen)?;

    if let Mode::Check = options.mode {
        return Ok("OK".to_string());
    }

    if let Some(out_path) = &options.out_path {
        std::fs::write(out_path, &out)
            .map_err(|e| DriverError::io(format!("Failed to write to {}: {}", out_path.display(), e)))?;
        tracing::debug!(out = %out_path.display(), bytes = out.len(), "wrote script");

        #[cfg(unix)]
        {
            if options.chmod_x {
                if let Ok(metadata) = std::fs::metadata(out_path) {
                    let mut perms = metadata.permissions();
                    perms.set_mode(perms.mode() | 0o111);
                    let _ = std::fs::set_permissions(out_path, perms);
                }
            }
        }
    }

    Ok(out)
}
