/// Subprocess transport for the rrdtool binary
use std::ffi::OsStr;

use log::debug;
use tokio::process::Command;

use crate::error::DatabaseError;

/// Run rrdtool with the given arguments and return its stdout.
///
/// A spawn failure (rrdtool not installed, not on PATH) maps to
/// `DatabaseError::Spawn`; a non-zero exit to `DatabaseError::Tool` with
/// the captured stderr.
pub async fn run_rrdtool<I, S>(args: I) -> Result<String, DatabaseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().collect();
    debug!(
        "rrdtool {}",
        args.iter()
            .map(|a| a.as_ref().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let output = Command::new("rrdtool").args(&args).output().await?;
    if !output.status.success() {
        return Err(DatabaseError::Tool {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
