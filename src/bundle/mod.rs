//! Schema Extraction
//!
//! Produces the [`DynamicSchemaMap`] of user-defined components, either by
//! reading an already-extracted schema file or by evaluating the project's
//! editor bundle.
//!
//! The bundle is untrusted JavaScript. It runs in a child interpreter process,
//! inside a fresh `vm` context where the registration hook is the only
//! binding, and that hook is itself defined inside the context. The process
//! runs under the interpreter's permission model when available: it may read
//! the driver script and nothing else, and cannot write files or spawn
//! processes. Module imports and `require` are refused, the heap is capped and
//! the process is killed if it outlives its timeout.

use crate::config::InterpreterConfig;
use crate::schema::DynamicSchemaMap;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Bundle location relative to the project directory after an editor build
pub const DEFAULT_BUNDLE_PATH: &str = "cache/js/_editor_bundle.cjs";

/// Defines `_registerEditor`, which forwards every exported component class
/// to the host hook
const PREAMBLE: &str = include_str!("preamble.js");

/// Browser globals that older bundles touch while loading
const LEGACY_GLOBALS: &str = include_str!("legacy.js");

const DRIVER: &str = include_str!("driver.js");

/// Driver exit code for a refused import
const EXIT_IMPORT_DISALLOWED: i32 = 3;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("could not open editor bundle {path}; build the project in the editor first")]
    BundleRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read editor extension script {path}")]
    ExtensionRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read schema file {path}")]
    SchemaFileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unexpected import in editor bundle: {specifier}")]
    ImportDisallowed { specifier: String },

    #[error("editor bundle threw while loading: {message}")]
    ScriptException { message: String },

    #[error("editor bundle did not finish within {millis} ms")]
    Timeout { millis: u64 },

    #[error("could not start interpreter \"{program}\"")]
    InterpreterUnavailable {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{origin} is not a component schema map")]
    MalformedOutput {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error while running the interpreter")]
    Io(#[source] io::Error),
}

/// Anything that can supply the user component declarations
pub trait SchemaSource {
    fn extract(&self) -> Result<DynamicSchemaMap, BundleError>;
}

/// Pre-extracted schema map stored as JSON
#[derive(Debug, Clone)]
pub struct SchemaFile {
    pub path: PathBuf,
}

impl SchemaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SchemaSource for SchemaFile {
    fn extract(&self) -> Result<DynamicSchemaMap, BundleError> {
        let text =
            std::fs::read_to_string(&self.path).map_err(|source| BundleError::SchemaFileRead {
                path: self.path.clone(),
                source,
            })?;
        let map: DynamicSchemaMap =
            serde_json::from_str(&text).map_err(|source| BundleError::MalformedOutput {
                origin: self.path.display().to_string(),
                source,
            })?;
        info!("Loaded {} component schemas from {}", map.len(), self.path.display());
        Ok(map)
    }
}

/// The editor bundle of a built project, plus an optional extension script
/// evaluated before it
#[derive(Debug, Clone)]
pub struct EditorBundle {
    pub path: PathBuf,
    pub extra_path: Option<PathBuf>,
    pub legacy_preamble: bool,
    pub interpreter: InterpreterConfig,
}

impl EditorBundle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            extra_path: None,
            legacy_preamble: false,
            interpreter: InterpreterConfig::default(),
        }
    }

    /// Read both scripts and join them into the module text to evaluate
    pub fn compose(&self) -> Result<String, BundleError> {
        let bundle =
            std::fs::read_to_string(&self.path).map_err(|source| BundleError::BundleRead {
                path: self.path.clone(),
                source,
            })?;

        let extension = match &self.extra_path {
            Some(path) => {
                std::fs::read_to_string(path).map_err(|source| BundleError::ExtensionRead {
                    path: path.clone(),
                    source,
                })?
            }
            None => String::new(),
        };

        Ok(compose_source(self.legacy_preamble, &extension, &bundle))
    }
}

impl SchemaSource for EditorBundle {
    fn extract(&self) -> Result<DynamicSchemaMap, BundleError> {
        let source = self.compose()?;

        let workspace = tempfile::TempDir::new().map_err(BundleError::Io)?;
        let driver_path = workspace.path().join("driver.cjs");
        std::fs::write(&driver_path, DRIVER).map_err(BundleError::Io)?;
        // The read allow-list is matched against the resolved path
        let driver_path = driver_path.canonicalize().map_err(BundleError::Io)?;

        info!("Evaluating editor bundle {}...", self.path.display());
        let output = run_interpreter(&self.interpreter, &driver_path, source)?;
        let map = interpret_output(output)?;
        info!("Registered {} component schemas", map.len());
        Ok(map)
    }
}

/// `preamble + [legacy globals] + extension + bundle`
pub fn compose_source(legacy_preamble: bool, extension: &str, bundle: &str) -> String {
    let legacy = if legacy_preamble { LEGACY_GLOBALS } else { "" };
    format!("{}\n{}\n{}\n{}", PREAMBLE, legacy, extension, bundle)
}

/// What the driver process left behind
#[derive(Debug)]
struct InterpreterOutput {
    /// `None` if killed by a signal
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// `major.minor` from `node --version` output such as `v20.11.1`
fn parse_version(text: &str) -> Option<(u32, u32)> {
    let mut parts = text.trim().trim_start_matches('v').split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

/// Flag enabling the permission model, which denies file system writes,
/// child processes and workers. It was renamed when it left experimental.
fn permission_flag((major, minor): (u32, u32)) -> Option<&'static str> {
    let stable = major >= 24 || (major == 23 && minor >= 5) || (major == 22 && minor >= 13);
    if stable {
        Some("--permission")
    } else if major >= 20 {
        Some("--experimental-permission")
    } else {
        None
    }
}

fn interpreter_version(program: &str) -> Result<Option<(u32, u32)>, BundleError> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map_err(|source| BundleError::InterpreterUnavailable {
            program: program.to_string(),
            source,
        })?;
    Ok(parse_version(&String::from_utf8_lossy(&output.stdout)))
}

fn run_interpreter(
    config: &InterpreterConfig,
    driver: &Path,
    source: String,
) -> Result<InterpreterOutput, BundleError> {
    let mut command = Command::new(&config.program);
    command
        .arg(format!("--max-old-space-size={}", config.memory_limit_mb))
        .arg("--experimental-vm-modules")
        .arg("--no-warnings");

    match interpreter_version(&config.program)?.and_then(permission_flag) {
        Some(flag) => {
            // Only the driver itself may be read; the bundle arrives on stdin
            command
                .arg(flag)
                .arg(format!("--allow-fs-read={}", driver.display()));
        }
        None => warn!(
            "Interpreter \"{}\" has no permission model; the bundle runs with only vm isolation",
            config.program
        ),
    }

    let mut child = command
        .arg(driver)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| BundleError::InterpreterUnavailable {
            program: config.program.clone(),
            source,
        })?;
    debug!(pid = child.id(), program = %config.program, "Spawned interpreter");

    // Dropping the handle at the end of the thread closes stdin
    let feeder = child.stdin.take().map(|mut stdin| {
        thread::spawn(move || {
            let _ = stdin.write_all(source.as_bytes());
        })
    });

    let output = wait_with_timeout(&mut child, Duration::from_millis(config.timeout_ms));
    if let Some(feeder) = feeder {
        let _ = feeder.join();
    }
    output
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> Result<InterpreterOutput, BundleError> {
    // Drain pipes on their own threads; a full pipe would stall the child
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let start = Instant::now();

    let status = loop {
        match child.try_wait().map_err(BundleError::Io)? {
            Some(status) => break status,
            None if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(BundleError::Timeout {
                    millis: timeout.as_millis() as u64,
                });
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    let collect = |handle: Option<thread::JoinHandle<Vec<u8>>>| {
        handle
            .and_then(|h| h.join().ok())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    };

    Ok(InterpreterOutput {
        code: status.code(),
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain(mut pipe: impl Read + Send + 'static) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        buffer
    })
}

fn interpret_output(output: InterpreterOutput) -> Result<DynamicSchemaMap, BundleError> {
    match output.code {
        Some(0) => {
            serde_json::from_str(&output.stdout).map_err(|source| BundleError::MalformedOutput {
                origin: "registration output".to_string(),
                source,
            })
        }
        Some(EXIT_IMPORT_DISALLOWED) => Err(BundleError::ImportDisallowed {
            specifier: output.stderr.trim().to_string(),
        }),
        Some(code) => Err(BundleError::ScriptException {
            message: script_message(&output.stderr, code),
        }),
        None => Err(BundleError::ScriptException {
            message: "interpreter was terminated (out of memory?)".to_string(),
        }),
    }
}

/// First line of the reported stack, which carries the error message
fn script_message(stderr: &str, code: i32) -> String {
    stderr
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("interpreter exited with status {}", code))
}
