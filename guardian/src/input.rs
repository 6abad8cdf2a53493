//! Collecting code to review: explicit files, directory walks, stdin, and
//! staged git changes.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use walkdir::WalkDir;

use crate::review::ReviewRequest;

/// Reads each named file into a request. Unreadable files are logged and
/// skipped, as are empty ones; a bad path should not abort a batch.
pub fn from_files(paths: &[std::path::PathBuf]) -> Vec<ReviewRequest> {
    let mut requests = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path.display().to_string();
        match std::fs::read_to_string(path) {
            Ok(code) if code.trim().is_empty() => {
                tracing::warn!(file = %name, "skipping empty file");
            }
            Ok(code) => requests.push(ReviewRequest { source_name: name, code }),
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "skipping unreadable file");
            }
        }
    }
    requests
}

/// Walks `dir` recursively and reviews every `.py` file, in sorted path
/// order so runs are reproducible.
pub fn from_directory(dir: &Path) -> anyhow::Result<Vec<ReviewRequest>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("walking {}", dir.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "py")
        {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(from_files(&paths))
}

/// Reads a review subject from stdin. Blank input is an error rather than
/// a silent no-op request.
pub fn from_stdin() -> anyhow::Result<ReviewRequest> {
    let mut code = String::new();
    std::io::stdin()
        .read_to_string(&mut code)
        .context("reading code from stdin")?;
    if code.trim().is_empty() {
        anyhow::bail!("no code received on stdin");
    }
    Ok(ReviewRequest { source_name: "stdin".to_owned(), code })
}

/// Builds one request from the staged Python changes in the repository
/// containing `dir`. Returns `None` when nothing relevant is staged.
///
/// The diff text keeps the patch line prefixes (`+`, `-`, space) so the
/// model sees what changed, not just the final state. An unborn HEAD (no
/// commits yet) diffs the index against an empty tree.
pub fn staged_python_diff(dir: &Path) -> anyhow::Result<Option<ReviewRequest>> {
    let repo = git2::Repository::discover(dir)
        .with_context(|| format!("no git repository at {}", dir.display()))?;
    let head_tree = repo.head().ok().and_then(|head| head.peel_to_tree().ok());

    let mut opts = git2::DiffOptions::new();
    opts.pathspec("*.py");
    let diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
        .context("diffing HEAD against the index")?;

    let mut patch = String::new();
    diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
        match line.origin() {
            '+' | '-' | ' ' => patch.push(line.origin()),
            _ => {}
        }
        patch.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .context("formatting staged diff")?;

    if patch.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(ReviewRequest { source_name: "staged changes".to_owned(), code: patch }))
}

/// Loads the custom rules file, if one was given. A missing file is an
/// error; the user named it explicitly.
pub fn read_rules(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("reading rules file {}", p.display())),
        None => Ok(String::new()),
    }
}
