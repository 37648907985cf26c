//! Runner configuration
//!
//! Which programs to spawn for the detector and the interpreter harness, what counts as a warning, and the process
//! limits. Built with `Default` plus `with_*` methods; [`RunnerConfig::from_env`] applies directory discovery and
//! environment overrides on top of the defaults.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Interpreter used when nothing else is configured.
pub const DEFAULT_INTERPRETER: &str = "python";
/// Directory holding the harness and detector scripts.
pub const SCRIPTS_DIR_NAME: &str = "python_scripts";
/// Harness script, invoked as `<interpreter> test.py <request> <target>`.
pub const HARNESS_SCRIPT: &str = "test.py";
/// Detector script, invoked as `<interpreter> detection_script.py <target>`.
pub const DETECTOR_SCRIPT: &str = "detection_script.py";
/// Detector output containing this text marks the target as suspicious.
pub const DEFAULT_WARNING_MARKER: &str = "Warning:";

/// Overrides the interpreter program.
pub const ENV_PYTHON: &str = "SCRIPTEST_PYTHON";
/// Overrides the scripts directory.
pub const ENV_SCRIPTS_DIR: &str = "SCRIPTEST_SCRIPTS_DIR";

/// A program plus its leading arguments. Per-call arguments are appended after these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Render for log lines and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(OsStr::to_string_lossy)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Harness invocation; the request file and target are appended
    pub interpreter: Invocation,
    /// Detector invocation; the target is appended
    pub detector: Invocation,
    /// Substring of detector output that flags a target
    pub warning_marker: String,
    /// Whether targets are scanned before they run
    pub scan_enabled: bool,
    /// Per-process limit for the detector and the interpreter
    pub timeout: Option<Duration>,
    /// Where the request file is written
    pub temp_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let scripts_dir = Path::new(SCRIPTS_DIR_NAME);
        Self {
            interpreter: Invocation::new(DEFAULT_INTERPRETER).arg(scripts_dir.join(HARNESS_SCRIPT)),
            detector: Invocation::new(DEFAULT_INTERPRETER).arg(scripts_dir.join(DETECTOR_SCRIPT)),
            warning_marker: DEFAULT_WARNING_MARKER.to_string(),
            scan_enabled: true,
            timeout: None,
            temp_dir: env::temp_dir(),
        }
    }
}

impl RunnerConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults plus scripts-directory discovery and `SCRIPTEST_*` overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = find_scripts_dir() {
            config = config.with_scripts_dir(&dir);
        }
        if let Some(python) = env::var_os(ENV_PYTHON).filter(|p| !p.is_empty()) {
            config = config.with_python(python);
        }
        config
    }

    /// Use `program` for both the harness and the detector.
    pub fn with_python(mut self, program: impl Into<OsString>) -> Self {
        let program = program.into();
        self.interpreter.program = program.clone();
        self.detector.program = program;
        self
    }

    /// Point both scripts at `dir`.
    pub fn with_scripts_dir(mut self, dir: &Path) -> Self {
        self.interpreter.args = vec![dir.join(HARNESS_SCRIPT).into_os_string()];
        self.detector.args = vec![dir.join(DETECTOR_SCRIPT).into_os_string()];
        self
    }

    pub fn with_interpreter(mut self, invocation: Invocation) -> Self {
        self.interpreter = invocation;
        self
    }

    pub fn with_detector(mut self, invocation: Invocation) -> Self {
        self.detector = invocation;
        self
    }

    pub fn with_warning_marker(mut self, marker: impl Into<String>) -> Self {
        self.warning_marker = marker.into();
        self
    }

    /// Enable or disable the safety scan. Disabled scans treat every target as clean.
    pub fn with_scan(mut self, enabled: bool) -> Self {
        self.scan_enabled = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }
}

/// Find the scripts directory: `$SCRIPTEST_SCRIPTS_DIR`, `./python_scripts`, then next to the executable.
pub fn find_scripts_dir() -> Option<PathBuf> {
    if let Some(dir) = env::var_os(ENV_SCRIPTS_DIR) {
        let path = PathBuf::from(dir);
        if path.is_dir() {
            return Some(path);
        }
    }

    // Development mode
    let local = Path::new(SCRIPTS_DIR_NAME);
    if local.is_dir() {
        return Some(local.to_path_buf());
    }

    // exe_dir, exe_dir/.. and exe_dir/../.. (target/debug -> project root)
    let exe_path = env::current_exe().ok()?;
    exe_path
        .ancestors()
        .skip(1)
        .take(3)
        .map(|dir| dir.join(SCRIPTS_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}
