//! Conversion of built presentations to PDF through an external renderer.
//!
//! The renderer is a black box invoked with one input file and one output
//! directory. Failures surface as [`Error::Conversion`], never as a
//! generation error, and temporary files are removed whether or not the
//! conversion succeeds.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default renderer executable.
pub const DEFAULT_PROGRAM: &str = "libreoffice";

/// Target passed to `--convert-to`.
const TARGET_FORMAT: &str = "pdf";

/// Default conversion timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Something that turns a presentation file into a fixed-layout file.
pub trait Converter {
    /// Convert `input`, writing the result into `out_dir`. Returns the path
    /// of the produced file.
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf>;

    /// Extension of the produced file.
    fn output_extension(&self) -> &str;
}

/// Options for the LibreOffice converter.
#[derive(Debug, Clone)]
pub struct ConverterOptions {
    /// Executable name or path
    pub program: PathBuf,

    /// Maximum time to wait for the renderer
    pub timeout: Duration,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ConverterOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the renderer executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Headless LibreOffice (`soffice --headless --convert-to`).
#[derive(Debug, Clone, Default)]
pub struct LibreOffice {
    options: ConverterOptions,
}

impl LibreOffice {
    /// Create a converter with the given options.
    pub fn new(options: ConverterOptions) -> Self {
        Self { options }
    }

    /// The converter options.
    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }
}

impl Converter for LibreOffice {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        // A private profile per run: concurrent instances sharing one
        // profile refuse to start.
        let profile = tempfile::tempdir()?;
        let mut log = tempfile::tempfile()?;

        let mut child = Command::new(&self.options.program)
            .arg(format!(
                "-env:UserInstallation=file://{}",
                profile.path().display()
            ))
            .arg("--headless")
            .arg("--convert-to")
            .arg(TARGET_FORMAT)
            .arg("--outdir")
            .arg(out_dir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log.try_clone()?))
            .spawn()
            .map_err(|e| {
                Error::Conversion(format!(
                    "failed to start {}: {}",
                    self.options.program.display(),
                    e
                ))
            })?;

        debug!(program = %self.options.program.display(), input = %input.display(), "started converter");

        let status = wait_with_timeout(&mut child, self.options.timeout)?;

        if !status.success() {
            let mut stderr = String::new();
            log.seek(SeekFrom::Start(0))?;
            log.read_to_string(&mut stderr)?;
            return Err(Error::Conversion(format!(
                "{} exited with {}: {}",
                self.options.program.display(),
                status,
                stderr.trim()
            )));
        }

        expected_output(input, out_dir, self.output_extension())
    }

    fn output_extension(&self) -> &str {
        TARGET_FORMAT
    }
}

/// The parts of a child process the wait loop drives.
trait Supervised {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;
    fn kill(&mut self) -> io::Result<()>;
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

impl Supervised for Child {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn kill(&mut self) -> io::Result<()> {
        Child::kill(self)
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        Child::wait(self)
    }
}

/// Poll until the process exits. On timeout or on a polling error the
/// process is killed and reaped before the error is returned.
fn wait_with_timeout<P: Supervised>(process: &mut P, timeout: Duration) -> Result<ExitStatus> {
    let started = Instant::now();
    loop {
        match process.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => {
                stop(process);
                return Err(Error::Conversion(format!("lost track of converter: {}", e)));
            }
        }
        if started.elapsed() >= timeout {
            stop(process);
            warn!(?timeout, "converter timed out");
            return Err(Error::Conversion(format!("timed out after {:?}", timeout)));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn stop<P: Supervised>(process: &mut P) {
    let _ = process.kill();
    let _ = process.wait();
}

/// Path the renderer is expected to produce, checked to exist and be
/// non-empty.
fn expected_output(input: &Path, out_dir: &Path, extension: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| Error::Conversion(format!("input has no file name: {}", input.display())))?;
    let output = out_dir.join(format!("{}.{}", stem.to_string_lossy(), extension));

    match std::fs::metadata(&output) {
        Ok(meta) if meta.len() > 0 => Ok(output),
        Ok(_) => Err(Error::Conversion(format!("empty output: {}", output.display()))),
        Err(_) => Err(Error::Conversion(format!("no output produced: {}", output.display()))),
    }
}

/// Convert an in-memory presentation and return the produced bytes.
///
/// Input and output live in a temporary directory that is removed when this
/// function returns, on success and on failure alike.
pub fn convert_bytes<C: Converter + ?Sized>(converter: &C, presentation: &[u8]) -> Result<Vec<u8>> {
    let workdir = tempfile::tempdir()?;
    let input = workdir.path().join("presentation.pptx");
    let out_dir = workdir.path().join("out");
    std::fs::create_dir(&out_dir)?;
    std::fs::write(&input, presentation)?;

    let output = converter.convert(&input, &out_dir)?;

    let mut bytes = Vec::new();
    File::open(&output)?.read_to_end(&mut bytes)?;
    debug!(bytes = bytes.len(), "conversion finished");
    Ok(bytes)
}
