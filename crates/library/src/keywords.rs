//! Native keywords: version accessors, screen images, and the run/wait
//! wrappers that turn engine return codes into errors.

use crate::capture;
use crate::library::KeywordLibrary;
use crate::native;
use autokw_core::*;
use std::path::{Path, PathBuf};
use tracing::warn;

/// The three window wait keywords share one failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowWait {
    Appear,
    Active,
    Close,
}

impl WindowWait {
    /// Keyword name, also the engine operation it wraps.
    fn keyword(self) -> &'static str {
        match self {
            WindowWait::Appear => "WinWait",
            WindowWait::Active => "WinWaitActive",
            WindowWait::Close => "WinWaitClose",
        }
    }

    fn outcome(self) -> &'static str {
        match self {
            WindowWait::Appear => "appear",
            WindowWait::Active => "be active",
            WindowWait::Close => "close",
        }
    }
}

/// Declared parameter names of a native keyword, used in its call trace.
fn declared_params(keyword: &str) -> Vec<&'static str> {
    native::lookup(keyword)
        .map(|k| k.param_names())
        .unwrap_or_default()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.is_empty(),
        _ => false,
    }
}

impl<E: AutomationEngine> KeywordLibrary<E> {
    /// Version of this library.
    pub fn get_version(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Version of the connected engine.
    pub fn get_engine_version(&self) -> String {
        format!("{} (automation engine)", self.engine.version())
    }

    /// Capture the full screen into `file_path`, relative to the output
    /// directory, and embed it in the host report.
    pub fn get_screen_image(&mut self, file_path: &str) -> Result<(), KeywordError> {
        let full_path = self.capture_target("GetScreenImage", file_path)?;
        self.save_capture(file_path, &full_path, None)
    }

    /// Capture the active window into `file_path`, relative to the output
    /// directory, and embed it in the host report.
    pub fn get_active_window_image(&mut self, file_path: &str) -> Result<(), KeywordError> {
        let full_path = self.capture_target("GetActiveWindowImage", file_path)?;
        let region = self.active_window_region()?;
        self.save_capture(file_path, &full_path, Some(region))
    }

    /// Check the capture capability and the artifact path, then log the call.
    /// Runs before anything touches the engine or the screen.
    fn capture_target(&mut self, keyword: &str, file_path: &str) -> Result<PathBuf, KeywordError> {
        if self.capture.is_none() {
            return Err(KeywordError::invalid(format!(
                "Screen capture support is not available, but is required for {}",
                keyword
            )));
        }
        let full_path = capture::artifact_path(&self.config().output_dir, file_path)?;
        self.logger
            .info(&format!("{}(FilePath={})", keyword, full_path.display()))?;
        Ok(full_path)
    }

    fn save_capture(
        &mut self,
        file_path: &str,
        full_path: &Path,
        region: Option<Region>,
    ) -> Result<(), KeywordError> {
        let grabber = self.capture.as_mut().ok_or_else(|| {
            KeywordError::invalid("Screen capture support is not available")
        })?;
        let image = grabber.grab(region)?;
        capture::save_image(&image, full_path)?;
        self.logger.html(&capture::embed_markup(file_path))?;
        Ok(())
    }

    /// Rectangle of the active window. Each geometry query is checked
    /// against the engine's error indicator as soon as it returns.
    fn active_window_region(&mut self) -> Result<Region, KeywordError> {
        let active = [Value::from("")];
        let mut query = |op: &str| -> Result<i64, KeywordError> {
            let value = self.engine.call(op, &active)?;
            if self.engine.error() != 0 {
                return Err(KeywordError::OperationFailed(format!(
                    "{} failed for the active window",
                    op
                )));
            }
            value.as_int().ok_or_else(|| {
                KeywordError::OperationFailed(format!("{} returned '{}'", op, value))
            })
        };
        let x = query("WinGetPosX")?;
        let y = query("WinGetPosY")?;
        let width = query("WinGetPosWidth")?;
        let height = query("WinGetPosHeight")?;
        Ok(Region::new(
            x.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            y.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            width.clamp(0, i64::from(u32::MAX)) as u32,
            height.clamp(0, i64::from(u32::MAX)) as u32,
        ))
    }

    /// Start a program. Returns the engine's result (its process id).
    ///
    /// Fails when the engine's error indicator is set after the call.
    pub fn run(
        &mut self,
        file_name: &str,
        working_dir: &str,
        flag: &Value,
    ) -> Result<Value, KeywordError> {
        let logged = [
            Value::from(file_name),
            Value::from(working_dir),
            flag.clone(),
        ];
        let params = declared_params("Run");
        self.logger
            .info_kw(&CallRecord::new("Run", &params, &logged, &[]))?;

        let (args, command) = if working_dir.is_empty() && is_blank(flag) {
            (
                vec![Value::from(file_name)],
                format!("FileName='{}'", file_name),
            )
        } else if is_blank(flag) {
            (
                vec![Value::from(file_name), Value::from(working_dir)],
                format!("FileName='{}', WorkingDir='{}'", file_name, working_dir),
            )
        } else {
            (
                logged.to_vec(),
                format!(
                    "FileName='{}', WorkingDir='{}', Flag='{}'",
                    file_name, working_dir, flag
                ),
            )
        };

        let result = self.engine.call("Run", &args)?;
        if self.engine.error() != 0 {
            return Err(KeywordError::OperationFailed(format!(
                "Failed to run {}",
                command
            )));
        }
        Ok(result)
    }

    /// Wait for a window to exist.
    pub fn win_wait(&mut self, title: &str, text: &str, timeout: i64) -> Result<(), KeywordError> {
        self.wait_window(WindowWait::Appear, title, text, timeout)
    }

    /// Wait for a window to be the active window.
    pub fn win_wait_active(
        &mut self,
        title: &str,
        text: &str,
        timeout: i64,
    ) -> Result<(), KeywordError> {
        self.wait_window(WindowWait::Active, title, text, timeout)
    }

    /// Wait for a window to go away.
    pub fn win_wait_close(
        &mut self,
        title: &str,
        text: &str,
        timeout: i64,
    ) -> Result<(), KeywordError> {
        self.wait_window(WindowWait::Close, title, text, timeout)
    }

    /// Wait for a window to appear, bring it to the front if needed, then
    /// wait for it to be active. Each step fails on its own terms.
    pub fn wait_for_active_window(
        &mut self,
        title: &str,
        text: &str,
        timeout: i64,
    ) -> Result<(), KeywordError> {
        let timeout = self.resolve_timeout(timeout);
        self.log_window_call("WaitForActiveWindow", title, text, timeout)?;

        self.win_wait(title, text, timeout)?;

        let target = [Value::from(title), Value::from(text)];
        if !self.engine.call("WinActive", &target)?.is_truthy() {
            self.engine.call("WinActivate", &target)?;
        }

        self.win_wait_active(title, text, timeout)
    }

    fn wait_window(
        &mut self,
        wait: WindowWait,
        title: &str,
        text: &str,
        timeout: i64,
    ) -> Result<(), KeywordError> {
        let timeout = self.resolve_timeout(timeout);
        self.log_window_call(wait.keyword(), title, text, timeout)?;

        let args = [Value::from(title), Value::from(text), Value::Int(timeout)];
        let result = self.engine.call(wait.keyword(), &args)?;
        if result.is_truthy() {
            return Ok(());
        }

        let message = format!(
            "Window '{}' ({}) failed to {} in {} seconds",
            title,
            text,
            wait.outcome(),
            timeout
        );
        if self.capture_on_error() {
            let artifact = format!("FAIL_{}_{}.png", wait.keyword(), self.failures.next());
            warn!(artifact = %artifact, "{}", message);
            self.get_screen_image(&artifact)?;
        }
        Err(KeywordError::Timeout(message))
    }

    fn log_window_call(
        &mut self,
        keyword: &str,
        title: &str,
        text: &str,
        timeout: i64,
    ) -> Result<(), KeywordError> {
        let args = [Value::from(title), Value::from(text), Value::Int(timeout)];
        let params = declared_params(keyword);
        self.logger
            .info_kw(&CallRecord::new(keyword, &params, &args, &[]))?;
        Ok(())
    }
}
