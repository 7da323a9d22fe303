use crate::target::TargetShell;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// The backend has no rendering for a construct the IR can express.
    Unimplemented,
    /// The IR breaks an invariant the generator relies on.
    MalformedIr,
}

/// Failure raised while turning IR into shell text.
///
/// These are never caused by a typo in user source; front-end problems are
/// reported as [`crate::span::Diagnostic`] before code generation starts.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
    pub target: Option<TargetShell>,
}

impl CompileError {
    pub fn unimplemented(feature: impl Into<String>) -> Self {
        Self {
            kind: CompileErrorKind::Unimplemented,
            message: feature.into(),
            target: None,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: CompileErrorKind::MalformedIr,
            message: message.into(),
            target: None,
        }
    }

    pub fn with_target(mut self, target: TargetShell) -> Self {
        self.target = Some(target);
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CompileErrorKind::Unimplemented => write!(f, "unimplemented: {}", self.message)?,
            CompileErrorKind::MalformedIr => write!(f, "malformed IR: {}", self.message)?,
        }
        if let Some(target) = self.target {
            write!(f, " (target {})", target)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}
