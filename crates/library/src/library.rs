use crate::config::LibraryConfig;
use crate::native::{self, NativeKeyword, NativeOp};
use crate::registry::KeywordRegistry;
use autokw_core::*;
use tracing::debug;

/// Name prefixed to every call-trace line.
pub const LIBRARY_NAME: &str = "KeywordLibrary";

/// Keyword library over an automation engine.
///
/// Native keywords are dispatched first; any other name the engine publishes
/// is forwarded to it unchanged. One host drives one instance at a time; the
/// type is not `Sync`.
pub struct KeywordLibrary<E: AutomationEngine = Box<dyn AutomationEngine>> {
    config: LibraryConfig,
    capture_on_error: bool,
    pub(crate) engine: E,
    pub(crate) capture: Option<Box<dyn ScreenCapture>>,
    pub(crate) logger: Logger,
    pub(crate) failures: FailureCounter,
    registry: KeywordRegistry,
}

/// Assembles a [`KeywordLibrary`].
pub struct LibraryBuilder<E: AutomationEngine> {
    config: LibraryConfig,
    engine: E,
    capture: Option<Box<dyn ScreenCapture>>,
    logger: Option<Logger>,
}

impl<E: AutomationEngine> LibraryBuilder<E> {
    /// Install a screen capture capability.
    pub fn capture(mut self, capture: Box<dyn ScreenCapture>) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Install a capability if one is available.
    pub fn maybe_capture(mut self, capture: Option<Box<dyn ScreenCapture>>) -> Self {
        self.capture = capture;
        self
    }

    /// Replace the default standard-output logger.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<KeywordLibrary<E>, KeywordError> {
        self.config
            .validate()
            .map_err(|e| KeywordError::invalid(e.to_string()))?;

        let mut library = KeywordLibrary {
            capture_on_error: self.config.capture_screen_on_error,
            config: self.config,
            engine: self.engine,
            capture: self.capture,
            logger: self.logger.unwrap_or_else(|| Logger::stdout(LIBRARY_NAME)),
            failures: FailureCounter::new(),
            registry: KeywordRegistry::new(),
        };

        if library.capture_on_error && library.capture.is_none() {
            library.logger.warn(
                "Screen capture support is not available, but is required for \
                 capture_screen_on_error... set False",
            )?;
            library.capture_on_error = false;
        }

        let version = library.get_version();
        library.logger.info(&format!("Running {}", version))?;
        let engine_version = library.get_engine_version();
        library.logger.info(&format!("Running {}", engine_version))?;

        Ok(library)
    }
}

impl<E: AutomationEngine> KeywordLibrary<E> {
    pub fn builder(config: LibraryConfig, engine: E) -> LibraryBuilder<E> {
        LibraryBuilder {
            config,
            engine,
            capture: None,
            logger: None,
        }
    }

    /// Library with no capture capability, logging to standard output.
    pub fn new(config: LibraryConfig, engine: E) -> Result<Self, KeywordError> {
        Self::builder(config, engine).build()
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Whether wait failures capture the screen.
    pub fn capture_on_error(&self) -> bool {
        self.capture_on_error
    }

    /// Number of diagnostic captures written so far.
    pub fn failure_count(&self) -> u64 {
        self.failures.current()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The complete keyword catalog advertised to the host.
    pub fn keyword_names(&self) -> Vec<String> {
        self.registry.keyword_names(&self.engine)
    }

    /// Whether `name` can be run, natively or by forwarding.
    pub fn has_keyword(&self, name: &str) -> bool {
        native::lookup(name).is_some() || self.registry.is_external(name, &self.engine)
    }

    /// Run a keyword by name.
    ///
    /// Native keywords win over engine operations of the same name. Forwarded
    /// calls pass arguments through and return the engine's result as is.
    pub fn run_keyword(
        &mut self,
        name: &str,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> Result<Value, KeywordError> {
        if let Some(keyword) = native::lookup(name) {
            return self.run_native(keyword, args, kwargs);
        }
        if self.registry.is_external(name, &self.engine) {
            debug!(keyword = name, "Forwarding to engine");
            return Ok(self.engine.invoke(name, args, kwargs)?);
        }
        Err(KeywordError::UnknownOperation(name.to_string()))
    }

    fn run_native(
        &mut self,
        keyword: &'static NativeKeyword,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> Result<Value, KeywordError> {
        let bound = keyword.bind(args, kwargs)?;
        match keyword.op {
            NativeOp::KeywordNames => Ok(Value::from(self.keyword_names())),
            NativeOp::Version => Ok(Value::Text(self.get_version())),
            NativeOp::EngineVersion => Ok(Value::Text(self.get_engine_version())),
            NativeOp::ScreenImage => {
                self.get_screen_image(&bound.text(0))?;
                Ok(Value::Null)
            }
            NativeOp::ActiveWindowImage => {
                self.get_active_window_image(&bound.text(0))?;
                Ok(Value::Null)
            }
            NativeOp::Run => self.run(&bound.text(0), &bound.text(1), bound.value(2)),
            NativeOp::WinWait => {
                self.win_wait(&bound.text(0), &bound.text(1), bound.int(2)?)?;
                Ok(Value::Null)
            }
            NativeOp::WinWaitActive => {
                self.win_wait_active(&bound.text(0), &bound.text(1), bound.int(2)?)?;
                Ok(Value::Null)
            }
            NativeOp::WinWaitClose => {
                self.win_wait_close(&bound.text(0), &bound.text(1), bound.int(2)?)?;
                Ok(Value::Null)
            }
            NativeOp::WaitForActiveWindow => {
                self.wait_for_active_window(&bound.text(0), &bound.text(1), bound.int(2)?)?;
                Ok(Value::Null)
            }
        }
    }

    /// The timeout to use for a call: the configured default when `timeout`
    /// is the unset sentinel, otherwise `timeout` itself.
    pub fn resolve_timeout(&self, timeout: i64) -> i64 {
        if timeout == crate::TIMEOUT_UNSET {
            self.config.timeout
        } else {
            timeout
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autokw_engines_common::{SimulatedEngine, SimulatedWindow};

    fn library(engine: SimulatedEngine) -> (KeywordLibrary<SimulatedEngine>, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let library = KeywordLibrary::builder(LibraryConfig::default(), engine)
            .logger(Logger::with_sink(LIBRARY_NAME, Box::new(buffer.clone())))
            .build()
            .unwrap();
        (library, buffer)
    }

    fn kw(name: &str, value: impl Into<Value>) -> (String, Value) {
        (name.to_string(), value.into())
    }

    #[test]
    fn test_construction_logs_versions() {
        let (_library, buffer) = library(SimulatedEngine::default());
        let output = buffer.contents();
        assert!(output.contains("*INFO* Running autokw-library"));
        assert!(output.contains("(simulated)"));
    }

    #[test]
    fn test_capture_flag_disabled_without_capability() {
        let buffer = SharedBuffer::new();
        let config = LibraryConfig {
            capture_screen_on_error: true,
            ..Default::default()
        };
        let library = KeywordLibrary::builder(config, SimulatedEngine::default())
            .logger(Logger::with_sink(LIBRARY_NAME, Box::new(buffer.clone())))
            .build()
            .unwrap();
        assert!(!library.capture_on_error());
        assert!(buffer.contents().starts_with("*WARN* Screen capture support"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = LibraryConfig {
            timeout: -5,
            ..Default::default()
        };
        let result = KeywordLibrary::new(config, SimulatedEngine::default());
        assert!(matches!(result, Err(KeywordError::InvalidArgument(_))));
    }

    #[test]
    fn test_forwarded_call_is_verbatim() {
        let mut engine = SimulatedEngine::default();
        engine.open_window(SimulatedWindow::new("Calculator", ""));
        let (mut library, buffer) = library(engine);
        buffer.take();

        let args = vec![Value::from("Calc"), Value::from("")];
        let kwargs = vec![kw("extra", 1)];
        let result = library.run_keyword("WinExists", &args, &kwargs).unwrap();

        assert_eq!(result, Value::Int(1));
        let call = library.engine().calls().last().unwrap();
        assert_eq!(call.name, "WinExists");
        assert_eq!(call.args, args);
        assert_eq!(call.kwargs, kwargs);
        // The forwarding layer itself does not log.
        assert_eq!(buffer.contents(), "");
    }

    #[test]
    fn test_forwarded_result_is_unchanged() {
        let mut engine = SimulatedEngine::default();
        engine.open_window(SimulatedWindow::new("Untitled - Notepad", ""));
        let (mut library, _) = library(engine);
        let title = library
            .run_keyword("WinGetTitle", &[Value::from("Untitled")], &[])
            .unwrap();
        assert_eq!(title, Value::from("Untitled - Notepad"));
    }

    #[test]
    fn test_unknown_keyword_names_identifier() {
        let (mut library, _) = library(SimulatedEngine::default());
        let err = library.run_keyword("NoSuchKeyword", &[], &[]).unwrap_err();
        assert!(matches!(&err, KeywordError::UnknownOperation(name) if name == "NoSuchKeyword"));
        assert!(err.to_string().contains("NoSuchKeyword"));
    }

    #[test]
    fn test_unpublished_engine_operations_are_not_forwarded() {
        let (mut library, _) = library(SimulatedEngine::default());
        for name in ["_ResetState", "Sleep"] {
            let err = library.run_keyword(name, &[], &[]).unwrap_err();
            assert!(matches!(err, KeywordError::UnknownOperation(_)), "{}", name);
        }
    }

    #[test]
    fn test_native_run_shadows_engine_run() {
        let mut engine = SimulatedEngine::default();
        engine.register_program("calc.exe", None);
        let (mut library, buffer) = library(engine);
        buffer.take();

        let names = library.keyword_names();
        assert_eq!(names.iter().filter(|n| *n == "Run").count(), 1);

        library
            .run_keyword("Run", &[Value::from("calc.exe")], &[])
            .unwrap();
        // Only the native wrapper logs its entry.
        assert!(buffer.contents().contains("KeywordLibrary.Run(FileName='calc.exe'"));
    }

    #[test]
    fn test_catalog_accessor_returns_catalog() {
        let (mut library, _) = library(SimulatedEngine::default());
        let listed = library.run_keyword("get_keyword_names", &[], &[]).unwrap();
        assert_eq!(listed, Value::from(library.keyword_names()));
        assert!(library.has_keyword("get_keyword_names"));
        assert!(library.has_keyword("WinClose"));
        assert!(!library.has_keyword("Sleep"));
    }

    #[test]
    fn test_catalog_is_stable() {
        let (library, _) = library(SimulatedEngine::default());
        assert_eq!(library.keyword_names(), library.keyword_names());
    }

    #[test]
    fn test_timeout_resolution() {
        let config = LibraryConfig {
            timeout: 5,
            ..Default::default()
        };
        let library = KeywordLibrary::builder(config, SimulatedEngine::default())
            .logger(Logger::with_sink(LIBRARY_NAME, Box::new(SharedBuffer::new())))
            .build()
            .unwrap();
        assert_eq!(library.resolve_timeout(crate::TIMEOUT_UNSET), 5);
        assert_eq!(library.resolve_timeout(12), 12);
        assert_eq!(library.resolve_timeout(0), 0);
    }

    #[test]
    fn test_native_binding_errors_surface() {
        let (mut library, _) = library(SimulatedEngine::default());
        let err = library.run_keyword("WinWait", &[], &[]).unwrap_err();
        assert!(matches!(err, KeywordError::InvalidArgument(_)));
    }
}
