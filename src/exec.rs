//! Shell-outs to `zip`, `unzip` and `md5sum`.
//!
//! Output of a child process is drained on two tasks so neither pipe can
//! fill up and block it.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::{MatrixError, Result};

/// Exit status and captured output lines of a finished command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `-1` when the process was killed by a signal.
    pub status: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs `program` with `args`, in `cwd` when given, and waits for it.
///
/// A non-zero exit is not an error here; callers decide.
pub async fn run(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    debug!(program, ?args, ?cwd, "running command");
    let mut child = command.spawn()?;
    let stdout = child.stdout.take().map(|out| tokio::spawn(read_lines(out)));
    let stderr = child.stderr.take().map(|err| tokio::spawn(read_lines(err)));

    let stdout = join_lines(stdout).await?;
    let stderr = join_lines(stderr).await?;
    let status = child.wait().await?.code().unwrap_or(-1);

    debug!(program, status, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
    })
}

async fn read_lines<R: AsyncRead + Unpin>(reader: R) -> std::io::Result<Vec<String>> {
    let mut lines = BufReader::new(reader).lines();
    let mut collected = Vec::new();
    while let Some(line) = lines.next_line().await? {
        collected.push(line);
    }
    Ok(collected)
}

async fn join_lines(
    task: Option<tokio::task::JoinHandle<std::io::Result<Vec<String>>>>,
) -> Result<Vec<String>> {
    match task {
        Some(task) => task
            .await
            .map_err(|err| MatrixError::Io(std::io::Error::other(err)))?
            .map_err(MatrixError::from),
        None => Ok(Vec::new()),
    }
}

fn command_failed(program: &str, output: &CommandOutput) -> MatrixError {
    MatrixError::Command {
        program: program.to_owned(),
        status: output.status,
        stderr: output.stderr.join("\n"),
    }
}

async fn run_checked(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput> {
    let output = run(program, args, cwd).await?;
    if !output.success() {
        return Err(command_failed(program, &output));
    }
    Ok(output)
}

/// `zip -r -q <zip_name> <files>...`, run from `source_dir`.
pub async fn zip_files(source_dir: &Path, zip_name: &str, files: &[&str]) -> Result<()> {
    let mut args = vec!["-r", "-q", zip_name];
    args.extend_from_slice(files);
    run_checked("zip", &args, Some(source_dir)).await?;
    Ok(())
}

/// `zip -q -j <zip_name> <file>`: one file, stored without its directory.
pub async fn zip_single_file(source_dir: &Path, zip_name: &str, file: &str) -> Result<()> {
    run_checked("zip", &["-q", "-j", zip_name, file], Some(source_dir)).await?;
    Ok(())
}

/// Extracts `zip` into `dest_dir`, overwriting. With `file` only that entry
/// is extracted. Fails when unzip reports an error line (`E|...`).
pub async fn unzip_file(zip: &Path, dest_dir: &Path, file: Option<&str>) -> Result<()> {
    let zip = zip.to_string_lossy();
    let dest = dest_dir.to_string_lossy();
    let mut args = vec!["-o", "-d", dest.as_ref(), zip.as_ref()];
    if let Some(file) = file {
        args.push(file);
    }
    let output = run("unzip", &args, None).await?;
    check_unzip_output(&output)
}

fn check_unzip_output(output: &CommandOutput) -> Result<()> {
    let failed = output
        .stdout
        .iter()
        .chain(&output.stderr)
        .any(|line| line.starts_with("E|"));
    if failed || !output.success() {
        return Err(command_failed("unzip", output));
    }
    Ok(())
}

/// MD5 digest of a file, as printed by `md5sum`.
pub async fn md5sum(file: &Path) -> Result<String> {
    let file = file.to_string_lossy();
    let output = run_checked("md5sum", &[file.as_ref()], None).await?;
    output
        .stdout
        .first()
        .and_then(|line| line.split(' ').next())
        .filter(|digest| !digest.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| command_failed("md5sum", &output))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{
        check_unzip_output, md5sum, run, unzip_file, zip_files, zip_single_file, CommandOutput,
    };
    use crate::MatrixError;

    async fn installed(program: &str) -> bool {
        let found = run(program, &["-v"], None).await.is_ok();
        if !found {
            eprintln!("skipping: {program} is not installed");
        }
        found
    }

    fn source_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.txt"), "beta").unwrap();
        dir
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn run_captures_both_streams() {
        let output = run("sh", &["-c", "echo out1; echo err1 >&2; echo out2"], None)
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, vec!["out1", "out2"]);
        assert_eq!(output.stderr, vec!["err1"]);
    }

    #[tokio::test]
    async fn run_reports_exit_code_and_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let output = run("sh", &["-c", "pwd; exit 3"], Some(dir.path()))
            .await
            .unwrap();
        assert_eq!(output.status, 3);
        let expected = dir.path().canonicalize().unwrap();
        let printed = std::path::Path::new(&output.stdout[0]).canonicalize().unwrap();
        assert_eq!(printed, expected);
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let err = run("definitely-not-a-real-program", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, MatrixError::Io(_)));
    }

    #[tokio::test]
    async fn md5sum_returns_digest_only() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hello.txt");
        std::fs::write(&file, "hello\n").unwrap();
        assert_eq!(
            md5sum(&file).await.unwrap(),
            "b1946ac92492d2347c6235b4d2611184"
        );
    }

    #[tokio::test]
    async fn zip_files_then_unzip_restores_the_tree() {
        if !installed("zip").await || !installed("unzip").await {
            return;
        }
        let source = source_tree();
        zip_files(source.path(), "bundle.zip", &["a.txt", "sub"])
            .await
            .unwrap();

        let dest = tempfile::tempdir().unwrap();
        unzip_file(&source.path().join("bundle.zip"), dest.path(), None)
            .await
            .unwrap();
        assert_eq!(read(&dest.path().join("a.txt")), "alpha");
        assert_eq!(read(&dest.path().join("sub").join("b.txt")), "beta");
    }

    #[tokio::test]
    async fn unzip_can_extract_a_single_entry() {
        if !installed("zip").await || !installed("unzip").await {
            return;
        }
        let source = source_tree();
        zip_files(source.path(), "bundle.zip", &["a.txt", "sub"])
            .await
            .unwrap();

        let dest = tempfile::tempdir().unwrap();
        unzip_file(&source.path().join("bundle.zip"), dest.path(), Some("a.txt"))
            .await
            .unwrap();
        assert!(dest.path().join("a.txt").is_file());
        assert!(!dest.path().join("sub").exists());
    }

    #[tokio::test]
    async fn zip_single_file_drops_the_directory() {
        if !installed("zip").await || !installed("unzip").await {
            return;
        }
        let source = source_tree();
        zip_single_file(source.path(), "one.zip", "sub/b.txt")
            .await
            .unwrap();

        let dest = tempfile::tempdir().unwrap();
        unzip_file(&source.path().join("one.zip"), dest.path(), None)
            .await
            .unwrap();
        assert_eq!(read(&dest.path().join("b.txt")), "beta");
        assert!(!dest.path().join("sub").exists());
    }

    #[tokio::test]
    async fn unzip_of_a_missing_archive_is_a_command_error() {
        if !installed("unzip").await {
            return;
        }
        let dest = tempfile::tempdir().unwrap();
        let err = unzip_file(&dest.path().join("absent.zip"), dest.path(), None)
            .await
            .unwrap_err();
        match err {
            MatrixError::Command { program, status, .. } => {
                assert_eq!(program, "unzip");
                assert_ne!(status, 0);
            }
            other => panic!("expected command error, got {other:?}"),
        }
    }

    #[test]
    fn error_line_fails_unzip_despite_zero_exit() {
        let output = CommandOutput {
            status: 0,
            stdout: vec!["  inflating: a.txt".to_owned()],
            stderr: vec!["E|bad entry".to_owned()],
        };
        let err = check_unzip_output(&output).unwrap_err();
        assert!(matches!(err, MatrixError::Command { status: 0, .. }));

        let clean = CommandOutput {
            stderr: Vec::new(),
            ..output
        };
        assert!(check_unzip_output(&clean).is_ok());
    }
}
