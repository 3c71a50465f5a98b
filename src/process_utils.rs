use std::process::Output;
use std::time::Duration;
use log::debug;
use tokio::process::Command;

// @module: Running external tools

/// Why an external command produced no exit status
#[derive(Debug)]
pub enum RunError {
    /// The program could not be started
    Spawn(std::io::Error),
    /// The program was still running when the timeout expired
    TimedOut(Duration),
}

/// Run `command` to completion, collecting its output.
///
/// Without a timeout this waits for as long as the program runs. With one,
/// the child is killed once the timeout expires.
pub async fn run_command(mut command: Command, timeout: Option<Duration>) -> Result<Output, RunError> {
    debug!("Running {:?}", command.as_std());
    command.kill_on_drop(true);

    let future = command.output();
    match timeout {
        None => future.await.map_err(RunError::Spawn),
        Some(limit) => tokio::select! {
            result = future => result.map_err(RunError::Spawn),
            _ = tokio::time::sleep(limit) => Err(RunError::TimedOut(limit)),
        },
    }
}

/// Describe an exit status for error messages
pub fn describe_status(output: &Output) -> String {
    match output.status.code() {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "no error output".to_string()
    } else {
        meaningful.join("\n")
    }
}
