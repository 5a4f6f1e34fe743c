//! Editor actions built on [`Executor::execute`].

use std::path::PathBuf;

use tracing::{error, info};

use crate::client::escape::elisp_string;
use crate::client::{ClientRunner, Executor};
use crate::error::BridgeResult;
use crate::util::path::resolve_absolute;

pub const OPEN_FILE_FAILED: &str = "Failed to open file in Emacs";
pub const OPEN_MAGIT_FAILED: &str = "Failed to open Magit in Emacs";

/// Outcome of a successful action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Human-readable summary.
    pub message: String,
    /// Resolved absolute path the action targeted.
    pub path: PathBuf,
    /// Trimmed emacsclient output.
    pub result: String,
}

/// `(find-file "<path>")`.
pub fn find_file_script(path: &str) -> String {
    format!("(find-file {})", elisp_string(path))
}

/// `(progn (cd "<dir>") (magit-status))`.
pub fn magit_status_script(dir: &str) -> String {
    format!("(progn (cd {}) (magit-status))", elisp_string(dir))
}

/// Open `file_path` in an Emacs buffer; `None` targets the current directory.
pub async fn open_in_buffer<R: ClientRunner>(
    executor: &Executor<R>,
    file_path: Option<&str>,
) -> BridgeResult<ActionOutcome> {
    let result: BridgeResult<ActionOutcome> = async {
        let path = resolve_absolute(file_path)?;
        let shown = path.to_string_lossy().into_owned();
        info!(path = shown, "opening file in Emacs buffer");
        let result = executor.execute(&find_file_script(&shown)).await?;
        Ok(ActionOutcome {
            message: format!("File opened in Emacs: {shown}"),
            path,
            result,
        })
    }
    .await;

    result.map_err(|e| {
        error!(error = %e, "error opening file in buffer");
        e.context(OPEN_FILE_FAILED)
    })
}

/// Open `magit-status` for `repo_path`; `None` targets the current directory.
pub async fn open_magit<R: ClientRunner>(
    executor: &Executor<R>,
    repo_path: Option<&str>,
) -> BridgeResult<ActionOutcome> {
    let result: BridgeResult<ActionOutcome> = async {
        let path = resolve_absolute(repo_path)?;
        let shown = path.to_string_lossy().into_owned();
        info!(repo = shown, "opening Magit");
        let result = executor.execute(&magit_status_script(&shown)).await?;
        Ok(ActionOutcome {
            message: format!("Magit opened for repository: {shown}"),
            path,
            result,
        })
    }
    .await;

    result.map_err(|e| {
        error!(error = %e, "error opening Magit");
        e.context(OPEN_MAGIT_FAILED)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PROBE_SCRIPT;
    use crate::config::StderrPolicy;
    use crate::error::ErrorKind;
    use crate::test_support::FakeRunner;

    fn executor(fake: &FakeRunner) -> Executor<FakeRunner> {
        Executor::with_runner(fake.clone(), StderrPolicy::Fail)
    }

    #[test]
    fn test_scripts() {
        assert_eq!(find_file_script("/tmp/x.txt"), "(find-file \"/tmp/x.txt\")");
        assert_eq!(
            find_file_script("/tmp/say \"hi\".txt"),
            "(find-file \"/tmp/say \\\"hi\\\".txt\")"
        );
        assert_eq!(
            magit_status_script("/repo"),
            "(progn (cd \"/repo\") (magit-status))"
        );
    }

    #[tokio::test]
    async fn test_open_in_buffer_absolute_path() {
        let fake = FakeRunner::live();
        fake.push_ok("#<buffer x.txt>\n");

        let outcome = open_in_buffer(&executor(&fake), Some("/tmp/x.txt"))
            .await
            .expect("open");
        assert_eq!(outcome.message, "File opened in Emacs: /tmp/x.txt");
        assert_eq!(outcome.result, "#<buffer x.txt>");
        assert_eq!(
            fake.calls(),
            vec![PROBE_SCRIPT.to_owned(), "(find-file \"/tmp/x.txt\")".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_open_in_buffer_relative_path_resolved() {
        let fake = FakeRunner::live();
        fake.push_ok("nil\n");

        let outcome = open_in_buffer(&executor(&fake), Some("notes/todo.org"))
            .await
            .expect("open");
        let expected = std::env::current_dir().expect("cwd").join("notes/todo.org");
        assert_eq!(outcome.path, expected);
        assert!(fake.calls()[1].contains(&*expected.to_string_lossy()));
    }

    #[tokio::test]
    async fn test_open_magit_defaults_to_cwd() {
        let fake = FakeRunner::live();
        fake.push_ok("nil\n");

        let outcome = open_magit(&executor(&fake), None).await.expect("open");
        let cwd = std::env::current_dir().expect("cwd");
        assert_eq!(outcome.path, cwd);
        assert_eq!(
            outcome.message,
            format!("Magit opened for repository: {}", cwd.display())
        );

        let script = &fake.calls()[1];
        let cd = script.find("(cd ").expect("cd call");
        let status = script.find("(magit-status)").expect("magit-status call");
        assert!(cd < status);
    }

    #[tokio::test]
    async fn test_open_in_buffer_wraps_server_unavailable() {
        let fake = FakeRunner::new();

        let err = open_in_buffer(&executor(&fake), Some("/tmp/x.txt"))
            .await
            .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::ServerUnavailable);
        assert!(err.to_string().starts_with(OPEN_FILE_FAILED));
        assert!(err.to_string().contains("not running"));
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_open_magit_wraps_execution_failure() {
        let fake = FakeRunner::live();
        fake.push_exit(1, "", "*ERROR*: Symbol's function definition is void: magit-status");

        let err = open_magit(&executor(&fake), Some("/repo"))
            .await
            .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
        assert!(err.to_string().starts_with(OPEN_MAGIT_FAILED));
        assert!(err.stderr().is_some_and(|s| s.contains("magit-status")));
    }

    #[tokio::test]
    async fn test_path_resolution_failure_never_spawns() {
        let fake = FakeRunner::live();

        let err = open_in_buffer(&executor(&fake), Some("bad\0path"))
            .await
            .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::PathResolutionFailed);
        assert!(err.to_string().contains("Failed to resolve path"));
        assert!(fake.calls().is_empty());
    }
}
