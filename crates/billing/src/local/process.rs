//! Running external programs with input on stdin.

use std::io::{self, Write};
use std::process::{Command, Output, Stdio};

/// Run `program` with `args`, feed `input` on stdin and collect its output.
///
/// The exit status is not checked; callers decide what counts as failure.
///
/// # Errors
///
/// Returns the I/O error if the program cannot be spawned or fed.
pub fn run_with_stdin(program: &str, args: &[&str], input: &str) -> io::Result<Output> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(input.as_bytes()) {
            drop(stdin);
            // the child is reaped before reporting; it may already be gone
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
        // stdin is closed on drop so the program sees EOF
    }

    child.wait_with_output()
}

/// Lossy UTF-8 view of captured bytes.
#[must_use]
pub fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_feeds_stdin() {
        let output = run_with_stdin("sh", &["-c", "tr a-z A-Z"], "hello").unwrap();
        assert!(output.status.success());
        assert_eq!(text(&output.stdout), "HELLO");
    }

    #[test]
    fn test_captures_stderr_and_status() {
        let output = run_with_stdin("sh", &["-c", "echo oops >&2; exit 3"], "").unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(text(&output.stderr), "oops\n");
    }

    #[test]
    fn test_program_that_ignores_stdin() {
        let input = "x".repeat(1 << 20);
        let err = run_with_stdin("true", &[], &input).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_missing_program() {
        let err = run_with_stdin("subkit-no-such-program", &[], "").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
