use crate::process;
use autokw_core::*;
use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use std::time::Duration;
use tracing::{debug, info};

const OPERATIONS: &[&str] = &[
    "MouseClick",
    "MouseDown",
    "MouseGetPosX",
    "MouseGetPosY",
    "MouseMove",
    "MouseUp",
    "Run",
    "Send",
    "Sleep",
];

/// Desktop engine driving the real keyboard and mouse through `enigo`.
///
/// Window management is not available through input simulation, so the
/// window family of operations is absent from this engine's catalog.
pub struct DesktopEngine {
    enigo: Enigo,
    error: i64,
}

impl DesktopEngine {
    /// Open the input connection. Held for the lifetime of the engine.
    pub fn connect() -> Result<Self, EngineError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| EngineError::ConnectionFailed(e.to_string()))?;
        info!("Connected to desktop input");
        Ok(Self { enigo, error: 0 })
    }

    fn click(&mut self, name: &str, args: &[Value]) -> Result<Value, EngineError> {
        let button = parse_button(name, args.first())?;
        if let (Some(x), Some(y)) = (int_arg(args, 1), int_arg(args, 2)) {
            self.enigo
                .move_mouse(to_i32(name, x)?, to_i32(name, y)?, Coordinate::Abs)
                .map_err(input_err)?;
        }
        let clicks = int_arg(args, 3).unwrap_or(1).max(1);
        for _ in 0..clicks {
            self.enigo
                .button(button, Direction::Click)
                .map_err(input_err)?;
        }
        Ok(Value::Int(1))
    }
}

fn input_err(e: enigo::InputError) -> EngineError {
    EngineError::Other(e.to_string())
}

fn int_arg(args: &[Value], index: usize) -> Option<i64> {
    args.get(index).and_then(Value::as_int)
}

fn to_i32(name: &str, value: i64) -> Result<i32, EngineError> {
    i32::try_from(value)
        .map_err(|_| EngineError::bad_arguments(name, format!("coordinate {} out of range", value)))
}

fn parse_button(name: &str, value: Option<&Value>) -> Result<Button, EngineError> {
    let label = value.map(|v| v.to_string().to_lowercase()).unwrap_or_default();
    match label.as_str() {
        "" | "left" | "main" | "primary" => Ok(Button::Left),
        "right" | "menu" | "secondary" => Ok(Button::Right),
        "middle" => Ok(Button::Middle),
        other => Err(EngineError::bad_arguments(
            name,
            format!("unknown mouse button '{}'", other),
        )),
    }
}

impl AutomationEngine for DesktopEngine {
    fn operations(&self) -> Vec<String> {
        OPERATIONS.iter().map(|s| s.to_string()).collect()
    }

    fn invoke(
        &mut self,
        name: &str,
        args: &[Value],
        _kwargs: &[(String, Value)],
    ) -> Result<Value, EngineError> {
        self.error = 0;
        match name {
            "Send" => {
                let text = args.first().map(|v| v.to_string()).unwrap_or_default();
                self.enigo.text(&text).map_err(input_err)?;
                Ok(Value::Int(1))
            }
            "MouseMove" => {
                let (x, y) = match (int_arg(args, 0), int_arg(args, 1)) {
                    (Some(x), Some(y)) => (to_i32(name, x)?, to_i32(name, y)?),
                    _ => return Err(EngineError::bad_arguments(name, "x and y are required")),
                };
                self.enigo
                    .move_mouse(x, y, Coordinate::Abs)
                    .map_err(input_err)?;
                Ok(Value::Int(1))
            }
            "MouseClick" => self.click(name, args),
            "MouseDown" | "MouseUp" => {
                let button = parse_button(name, args.first())?;
                let direction = if name == "MouseDown" {
                    Direction::Press
                } else {
                    Direction::Release
                };
                self.enigo.button(button, direction).map_err(input_err)?;
                Ok(Value::Int(1))
            }
            "MouseGetPosX" | "MouseGetPosY" => {
                let (x, y) = self.enigo.location().map_err(input_err)?;
                Ok(Value::Int(i64::from(if name == "MouseGetPosX" { x } else { y })))
            }
            "Run" => {
                let filename = args.first().map(|v| v.to_string()).unwrap_or_default();
                let working_dir = args.get(1).map(|v| v.to_string()).unwrap_or_default();
                match process::spawn(&filename, &working_dir, args.get(2)) {
                    Ok(pid) => Ok(Value::Int(i64::from(pid))),
                    Err(e) => {
                        debug!(filename = %filename, error = %e, "Run failed");
                        self.error = 1;
                        Ok(Value::Int(0))
                    }
                }
            }
            "Sleep" => {
                let millis = int_arg(args, 0).unwrap_or(0).max(0) as u64;
                std::thread::sleep(Duration::from_millis(millis));
                Ok(Value::Null)
            }
            other => Err(EngineError::UnknownOperation(other.to_string())),
        }
    }

    fn error(&self) -> i64 {
        self.error
    }

    fn version(&self) -> String {
        format!("autokw desktop engine {}", env!("CARGO_PKG_VERSION"))
    }
}
