use crate::ast::{Function, Program, Stmt, StmtKind, TopLevel};
use crate::lexer;
use crate::parser;
use crate::span::{Diagnostic, SourceMap, Span};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "bish";

struct Loader {
    // Canonical paths currently being visited (for cycle detection)
    visiting: HashSet<PathBuf>,
    // Stack of paths being visited (for error reporting)
    stack: Vec<PathBuf>,
    // Canonical paths already fully loaded (idempotency)
    loaded: HashSet<PathBuf>,
    functions: Vec<Function>,
    // Function name -> defining file, for conflicts across files
    defined_in: HashMap<String, String>,
    // Assignments from imported files, in load order
    imported_globals: Vec<TopLevel>,
    entry_top_level: Vec<TopLevel>,
    source_maps: HashMap<String, SourceMap>,
}

/// Where an import was written, so a missing module points at the statement.
struct ImportSite<'a> {
    file: &'a str,
    span: Span,
    module: &'a str,
}

impl Loader {
    fn new() -> Self {
        Loader {
            visiting: HashSet::new(),
            stack: Vec::new(),
            loaded: HashSet::new(),
            functions: Vec::new(),
            defined_in: HashMap::new(),
            imported_globals: Vec::new(),
            entry_top_level: Vec::new(),
            source_maps: HashMap::new(),
        }
    }

    fn located(&self, msg: String, file: &str, span: Span) -> Diagnostic {
        Diagnostic {
            msg,
            span,
            sm: self.source_maps.get(file).cloned(),
            file: Some(file.to_string()),
            help: None,
        }
    }
}

/// Path an `import name;` written in `importer` refers to.
pub fn resolve_import(importer: &Path, module: &str) -> PathBuf {
    let base_dir = importer.parent().unwrap_or(Path::new("."));
    let mut path = base_dir.join(module);
    if path.extension().is_none() {
        path.set_extension(EXTENSION);
    }
    path
}

fn nested_blocks(stmt: &Stmt) -> Vec<&[Stmt]> {
    match &stmt.node {
        StmtKind::If {
            then_body,
            elifs,
            else_body,
            ..
        } => {
            let mut blocks: Vec<&[Stmt]> = vec![then_body.as_slice()];
            blocks.extend(elifs.iter().map(|e| e.body.as_slice()));
            blocks.extend(else_body.as_deref());
            blocks
        }
        StmtKind::For { body, .. } => vec![body.as_slice()],
        _ => Vec::new(),
    }
}

fn check_nested_imports(loader: &Loader, body: &[Stmt], file: &str) -> Result<(), Diagnostic> {
    for stmt in body {
        if matches!(stmt.node, StmtKind::Import(_)) {
            return Err(loader
                .located("import is only allowed at the top level".to_string(), file, stmt.span)
                .with_help("move the import to the start of the file"));
        }
        for inner in nested_blocks(stmt) {
            check_nested_imports(loader, inner, file)?;
        }
    }
    Ok(())
}

fn load_file(loader: &mut Loader, path: &Path, site: Option<ImportSite<'_>>) -> Result<(), Diagnostic> {
    let canonical_path = match fs::canonicalize(path) {
        Ok(p) => p,
        Err(e) => {
            return Err(match site {
                Some(site) => loader
                    .located(format!("cannot find module '{}'", site.module), site.file, site.span)
                    .with_help(format!("looked for {}", path.display())),
                None => Diagnostic::bare(
                    format!("Failed to resolve path {}: {}", path.display(), e),
                    Some(path.to_string_lossy().to_string()),
                ),
            });
        }
    };

    // Idempotency: If already loaded, do nothing (no-op).
    if loader.loaded.contains(&canonical_path) {
        return Ok(());
    }

    if loader.visiting.contains(&canonical_path) {
        let mut cycle_msg = String::new();
        for p in &loader.stack {
            cycle_msg.push_str(&format!("{} -> ", p.display()));
        }
        cycle_msg.push_str(&format!("{}", canonical_path.display()));
        let err = Diagnostic::bare(format!("Import cycle detected: {}", cycle_msg), None);
        return Err(match site {
            Some(site) => Diagnostic {
                span: site.span,
                sm: loader.source_maps.get(site.file).cloned(),
                file: Some(site.file.to_string()),
                ..err
            },
            None => err,
        });
    }

    let is_entry = loader.stack.is_empty();
    loader.visiting.insert(canonical_path.clone());
    loader.stack.push(canonical_path.clone());

    let src = fs::read_to_string(&canonical_path).map_err(|e| {
        Diagnostic::bare(
            format!("Failed to read {}: {}", canonical_path.display(), e),
            Some(canonical_path.to_string_lossy().to_string()),
        )
    })?;

    let file_str = canonical_path.to_string_lossy().to_string();
    let sm = SourceMap::new(src);
    tracing::debug!(file = %file_str, bytes = sm.len(), entry = is_entry, "loading source");
    let tokens = lexer::lex(&sm, &file_str)?;
    let program = parser::parse(&tokens, &sm, &file_str)?;
    loader.source_maps.insert(file_str.clone(), sm);

    for func in &program.functions {
        if let Some(body) = &func.body {
            check_nested_imports(loader, body, &file_str)?;
        }
    }
    for t in &program.top_level {
        for inner in nested_blocks(&t.stmt) {
            check_nested_imports(loader, inner, &file_str)?;
        }
    }

    for t in &program.top_level {
        if let StmtKind::Import(module) = &t.stmt.node {
            let target = resolve_import(&canonical_path, module);
            let site = ImportSite {
                file: &file_str,
                span: t.stmt.span,
                module,
            };
            load_file(loader, &target, Some(site))?;
        }
    }

    for func in program.functions {
        if let Some(defined_at) = loader.defined_in.get(&func.name) {
            let msg = format!("Function '{}' is already defined in {}", func.name, defined_at);
            return Err(loader.located(msg, &func.file, func.span));
        }
        loader.defined_in.insert(func.name.clone(), func.file.clone());
        loader.functions.push(func);
    }

    if is_entry {
        loader.entry_top_level = program.top_level;
    } else {
        for t in program.top_level {
            if matches!(t.stmt.node, StmtKind::Import(_)) {
                continue;
            }
            if !matches!(t.stmt.node, StmtKind::Assign { .. }) {
                return Err(loader
                    .located(
                        "only assignments and imports are allowed at the top level of an imported file"
                            .to_string(),
                        &t.file,
                        t.stmt.span,
                    )
                    .with_help("move this statement into a function"));
            }
            loader.imported_globals.push(t);
        }
    }

    loader.visiting.remove(&canonical_path);
    loader.stack.pop();
    loader.loaded.insert(canonical_path);
    Ok(())
}

/// Reads `entry_path` and every file it imports into one program.
///
/// Imported functions come before the importer's own, and globals assigned
/// at the top of imported files run before the entry file's statements.
pub fn load(entry_path: &Path) -> Result<Program, Diagnostic> {
    let mut loader = Loader::new();
    load_file(&mut loader, entry_path, None)?;

    let entry_file = fs::canonicalize(entry_path)
        .map_err(|e| {
            Diagnostic::bare(
                format!("Failed to resolve path {}: {}", entry_path.display(), e),
                Some(entry_path.to_string_lossy().to_string()),
            )
        })?
        .to_string_lossy()
        .to_string();

    let mut top_level = loader.imported_globals;
    top_level.extend(loader.entry_top_level);

    Ok(Program {
        functions: loader.functions,
        top_level,
        span: Span::default(),
        source_maps: loader.source_maps,
        entry_file,
    })
}
