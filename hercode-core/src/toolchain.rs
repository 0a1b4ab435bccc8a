//! Driving the system C compiler over generated code.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::error::CoreError;

pub const DEFAULT_CC: &str = "cc";

/// External C compiler used to turn generated C into an executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub cc: String,
    /// Extra arguments passed before `-o`.
    pub flags: Vec<String>,
    /// Keep the intermediate `.c` file next to the executable.
    pub keep_c_source: bool,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain {
            cc: DEFAULT_CC.to_string(),
            flags: Vec::new(),
            keep_c_source: false,
        }
    }
}

impl Toolchain {
    pub fn new(cc: impl Into<String>) -> Self {
        Toolchain {
            cc: cc.into(),
            ..Toolchain::default()
        }
    }

    /// Path of the intermediate C file for `output` (`out` → `out.c`).
    pub fn c_source_path(output: &Path) -> PathBuf {
        let mut path = output.as_os_str().to_owned();
        path.push(".c");
        PathBuf::from(path)
    }

    /// Write `c_source` next to `output` and compile it into `output`.
    ///
    /// Blocks until the compiler exits. A compiler that cannot be started
    /// is an I/O error; a non-zero exit carries the compiler's stderr.
    pub fn build(&self, c_source: &str, output: impl AsRef<Path>) -> Result<(), CoreError> {
        let output = output.as_ref();
        let c_path = Self::c_source_path(output);
        fs::write(&c_path, c_source)?;

        let mut command = Command::new(&self.cc);
        command.args(&self.flags).arg("-o").arg(output).arg(&c_path);
        info!("running {:?}", command);

        let result = command.output();
        if !self.keep_c_source {
            if let Err(err) = fs::remove_file(&c_path) {
                debug!("could not remove {}: {err}", c_path.display());
            }
        }

        let result = result?;
        if !result.status.success() {
            return Err(CoreError::ToolchainFailed {
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn derives_c_path_from_output() {
        assert_eq!(
            Toolchain::c_source_path(Path::new("build/hello")),
            PathBuf::from("build/hello.c")
        );
    }

    #[test]
    fn reports_missing_compiler_as_io_error() {
        let dir = tempdir().expect("tempdir");
        let toolchain = Toolchain::new("hercode-no-such-compiler");
        let err = toolchain
            .build("int main(void) { return 0; }\n", dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
        assert!(!dir.path().join("out.c").exists());
    }

    #[test]
    fn keeps_c_source_when_asked() {
        let dir = tempdir().expect("tempdir");
        let toolchain = Toolchain {
            keep_c_source: true,
            ..Toolchain::new("hercode-no-such-compiler")
        };
        let _ = toolchain.build("int main(void) { return 0; }\n", dir.path().join("out"));
        assert!(dir.path().join("out.c").exists());
    }
}
