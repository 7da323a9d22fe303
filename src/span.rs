use std::cmp::{max, min};
use std::path::Path;

/// Byte range into a single source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn merge(self, other: Span) -> Self {
        Span {
            start: min(self.start, other.start),
            end: max(self.end, other.end),
        }
    }
}

/// A located error in bish source, produced by the front end.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub msg: String,
    pub span: Span,
    pub sm: Option<SourceMap>,
    pub file: Option<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    /// A diagnostic with no source location (missing files, import cycles).
    pub fn bare(msg: impl Into<String>, file: Option<String>) -> Self {
        Diagnostic {
            msg: msg.into(),
            span: Span::default(),
            sm: None,
            file,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn format(&self, base: Option<&Path>) -> String {
        let main = match (&self.sm, &self.file) {
            (Some(sm), Some(file)) => sm.format_diagnostic(file, base, &self.msg, self.span),
            (None, Some(file)) => format!("{}: error: {}", display_path(file, base), self.msg),
            _ => format!("error: {}", self.msg),
        };
        match &self.help {
            Some(help) => format!("{}\nhelp: {}", main, help),
            None => main,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceMap {
    src: String,
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(src: String) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in src.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        SourceMap { src, line_starts }
    }

    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// 1-based line and character column of a byte offset.
    pub fn line_col(&self, pos: usize) -> (usize, usize) {
        let pos = min(pos, self.src.len());
        let line_idx = self
            .line_starts
            .binary_search(&pos)
            .unwrap_or_else(|x| x - 1);
        let line_start = self.line_starts[line_idx];
        let col = self.src[line_start..pos].chars().count() + 1;
        (line_idx + 1, col)
    }

    pub fn line_snippet(&self, line: usize) -> &str {
        if line < 1 || line > self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[line - 1];
        let end = if line == self.line_starts.len() {
            self.src.len()
        } else {
            self.line_starts[line] - 1
        };
        if start > end {
            return "";
        }
        &self.src[start..end]
    }

    pub fn format_diagnostic(&self, file: &str, base: Option<&Path>, msg: &str, span: Span) -> String {
        let (start_line, start_col) = self.line_col(span.start);
        let (end_line, _) = self.line_col(span.end);
        let snippet = self.line_snippet(start_line);

        let mut arrow = " ".repeat(start_col - 1);
        arrow.push('^');
        if start_line == end_line {
            let start = min(span.start, self.src.len());
            let end = min(span.end, self.src.len());
            let len = if end > start { self.src[start..end].chars().count() } else { 1 };
            for _ in 1..len {
                arrow.push('~');
            }
        }

        format!(
            "{}:{}:{}: {}\n{}\n{}",
            display_path(file, base),
            start_line,
            start_col,
            msg,
            snippet,
            arrow
        )
    }
}

/// Shortens `raw` for display: relative to `base` when it lies under it,
/// otherwise the bare file name for absolute paths.
pub fn display_path(raw: &str, base: Option<&Path>) -> String {
    let path = Path::new(raw);
    let shown = if path.is_relative() {
        raw.to_string()
    } else if let Some(rel) = base.and_then(|b| path.strip_prefix(b).ok()) {
        rel.to_string_lossy().to_string()
    } else {
        path.file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| raw.to_string())
    };
    shown.replace('\\', "/")
}
