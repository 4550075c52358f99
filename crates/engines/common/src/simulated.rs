use autokw_core::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Configuration for the simulated engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedEngineConfig {
    /// Version string reported by the engine.
    pub version: String,
    /// First process id handed out by `Run`.
    pub first_pid: i64,
    /// Screen size used for full-screen geometry.
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Default for SimulatedEngineConfig {
    fn default() -> Self {
        Self {
            version: "3.3.16.1".to_string(),
            first_pid: 1000,
            screen_width: 1920,
            screen_height: 1080,
        }
    }
}

/// A top-level window tracked by the simulated desktop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedWindow {
    pub title: String,
    pub text: String,
    pub region: Region,
}

impl SimulatedWindow {
    pub fn new(title: &str, text: &str) -> Self {
        Self {
            title: title.to_string(),
            text: text.to_string(),
            region: Region::new(100, 100, 640, 480),
        }
    }

    pub fn at(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Title matches from the start; text matches anywhere. Empty text
    /// matches every window.
    fn matches(&self, title: &str, text: &str) -> bool {
        self.title.starts_with(title) && (text.is_empty() || self.text.contains(text))
    }
}

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub name: String,
    pub args: Vec<Value>,
    pub kwargs: KwArgs,
}

/// An in-memory automation engine.
///
/// Models a desktop with a stack of windows, a launchable program table and
/// the engine-wide error indicator. Wait operations answer immediately from
/// the current window state instead of polling.
pub struct SimulatedEngine {
    config: SimulatedEngineConfig,
    /// Open windows, most recently opened last.
    windows: Vec<SimulatedWindow>,
    /// Index into `windows` of the active window.
    active: Option<usize>,
    /// Launchable programs and the window each one opens (if any).
    programs: HashMap<String, Option<SimulatedWindow>>,
    next_pid: i64,
    error: i64,
    sent_keys: Vec<String>,
    calls: Vec<RecordedCall>,
}

const OPERATIONS: &[&str] = &[
    "Run",
    "Send",
    "Sleep",
    "WinActivate",
    "WinActive",
    "WinClose",
    "WinExists",
    "WinGetPosHeight",
    "WinGetPosWidth",
    "WinGetPosX",
    "WinGetPosY",
    "WinGetTitle",
    "WinWait",
    "WinWaitActive",
    "WinWaitClose",
    "_ResetState",
];

impl SimulatedEngine {
    pub fn new(config: SimulatedEngineConfig) -> Self {
        let next_pid = config.first_pid;
        Self {
            config,
            windows: Vec::new(),
            active: None,
            programs: HashMap::new(),
            next_pid,
            error: 0,
            sent_keys: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Make `Run` accept `filename`, optionally opening `window` when launched.
    pub fn register_program(&mut self, filename: &str, window: Option<SimulatedWindow>) {
        self.programs.insert(filename.to_string(), window);
    }

    /// Open a window and make it active.
    pub fn open_window(&mut self, window: SimulatedWindow) {
        debug!(title = %window.title, "Simulated window opened");
        self.windows.push(window);
        self.active = Some(self.windows.len() - 1);
    }

    /// Open a window without giving it focus.
    pub fn open_background_window(&mut self, window: SimulatedWindow) {
        self.windows.push(window);
        if self.active.is_none() {
            self.active = Some(self.windows.len() - 1);
        }
    }

    pub fn active_window(&self) -> Option<&SimulatedWindow> {
        self.active.and_then(|i| self.windows.get(i))
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    /// Names of the calls received so far, in order.
    pub fn call_names(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn sent_keys(&self) -> &[String] {
        &self.sent_keys
    }

    fn find(&self, title: &str, text: &str) -> Option<usize> {
        if title.is_empty() && text.is_empty() {
            return self.active;
        }
        self.windows.iter().rposition(|w| w.matches(title, text))
    }

    fn close(&mut self, index: usize) {
        self.windows.remove(index);
        self.active = match self.active {
            Some(a) if a == index => self.windows.len().checked_sub(1),
            Some(a) if a > index => Some(a - 1),
            other => other,
        };
    }

    fn launch(&mut self, filename: &str) -> Value {
        match self.programs.get(filename).cloned() {
            Some(window) => {
                if let Some(window) = window {
                    self.open_window(window);
                }
                let pid = self.next_pid;
                self.next_pid += 1;
                Value::Int(pid)
            }
            None => {
                debug!(filename, "Simulated program not found");
                self.error = 1;
                Value::Int(0)
            }
        }
    }

    fn geometry(&mut self, title: &str, text: &str, pick: fn(&Region) -> i64) -> Value {
        match self.find(title, text) {
            Some(i) => Value::Int(pick(&self.windows[i].region)),
            None => {
                self.error = 1;
                Value::Int(1)
            }
        }
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new(SimulatedEngineConfig::default())
    }
}

fn text_arg(args: &[Value], index: usize) -> String {
    args.get(index).map(|v| v.to_string()).unwrap_or_default()
}

fn flag(ok: bool) -> Value {
    Value::Int(i64::from(ok))
}

impl AutomationEngine for SimulatedEngine {
    fn operations(&self) -> Vec<String> {
        OPERATIONS.iter().map(|s| s.to_string()).collect()
    }

    fn invoke(
        &mut self,
        name: &str,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> Result<Value, EngineError> {
        self.calls.push(RecordedCall {
            name: name.to_string(),
            args: args.to_vec(),
            kwargs: kwargs.to_vec(),
        });
        self.error = 0;

        let title = text_arg(args, 0);
        let text = text_arg(args, 1);

        let result = match name {
            "Run" => {
                if args.is_empty() {
                    return Err(EngineError::bad_arguments(name, "a filename is required"));
                }
                self.launch(&title)
            }
            "Send" => {
                self.sent_keys.push(title);
                Value::Int(1)
            }
            "Sleep" | "_ResetState" => Value::Null,
            "WinWait" | "WinExists" => flag(self.find(&title, &text).is_some()),
            "WinWaitActive" | "WinActive" => {
                let found = self.find(&title, &text);
                flag(found.is_some() && found == self.active)
            }
            "WinWaitClose" => flag(self.find(&title, &text).is_none()),
            "WinActivate" => match self.find(&title, &text) {
                Some(i) => {
                    self.active = Some(i);
                    Value::Int(1)
                }
                None => Value::Int(0),
            },
            "WinClose" => match self.find(&title, &text) {
                Some(i) => {
                    self.close(i);
                    Value::Int(1)
                }
                None => Value::Int(0),
            },
            "WinGetTitle" => match self.find(&title, &text) {
                Some(i) => Value::Text(self.windows[i].title.clone()),
                None => {
                    self.error = 1;
                    Value::Int(0)
                }
            },
            "WinGetPosX" => self.geometry(&title, &text, |r| i64::from(r.x)),
            "WinGetPosY" => self.geometry(&title, &text, |r| i64::from(r.y)),
            "WinGetPosWidth" => self.geometry(&title, &text, |r| i64::from(r.width)),
            "WinGetPosHeight" => self.geometry(&title, &text, |r| i64::from(r.height)),
            other => return Err(EngineError::UnknownOperation(other.to_string())),
        };
        Ok(result)
    }

    fn error(&self) -> i64 {
        self.error
    }

    fn version(&self) -> String {
        format!("{} (simulated)", self.config.version)
    }
}
