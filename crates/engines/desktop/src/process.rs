use autokw_core::Value;
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Start `filename` detached, optionally in `working_dir`, returning its pid.
///
/// `show_flag` is a window show-state hint; it has no effect on platforms
/// where new processes cannot be started hidden or minimised.
pub fn spawn(filename: &str, working_dir: &str, show_flag: Option<&Value>) -> io::Result<u32> {
    if filename.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "empty program name",
        ));
    }

    // A command line like `notepad.exe notes.txt` is split on whitespace,
    // unless the whole string names an existing file (paths with spaces).
    let mut command;
    let program;
    if Path::new(filename).exists() {
        program = filename;
        command = Command::new(program);
    } else {
        let mut parts = filename.split_whitespace();
        program = parts.next().unwrap_or(filename);
        command = Command::new(program);
        command.args(parts);
    }
    if !working_dir.is_empty() {
        command.current_dir(working_dir);
    }
    if let Some(flag) = show_flag {
        debug!(program, flag = %flag, "Show flag ignored by this launcher");
    }

    let child = command.spawn()?;
    debug!(program, pid = child.id(), "Process started");
    Ok(child.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_program_is_rejected() {
        let err = spawn("  ", "", None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_program_fails() {
        assert!(spawn("autokw-no-such-program-3f9a", "", None).is_err());
    }

    #[test]
    fn test_missing_working_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let result = spawn(
            "autokw-no-such-program-3f9a",
            missing.to_str().unwrap(),
            Some(&Value::Int(0)),
        );
        assert!(result.is_err());
    }
}
