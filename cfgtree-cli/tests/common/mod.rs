//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing:
//! - Test environment setup with a temporary directory
//! - Command builder helpers
//! - Sample override scripts

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A script exercising every statement form.
#[allow(dead_code)]
pub const VALID_SCRIPT: &str = "\
import pkg.sub
from pkg import Inner as I
# Inner.f
config.c.f=1.5
config.r.name='BBB'
config.r['BBB'].ll=[1, 2, 3]
config.c.retarget(pkg.sub.Sub)
";

/// A script with a syntax error on line 2, column 12.
#[allow(dead_code)]
pub const BROKEN_SCRIPT: &str = "config.a = 1\nconfig.b = = 2\n";

/// Test environment with an isolated temporary directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            temp_path,
        }
    }

    /// Get a command builder for the cfgtree binary.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cfgtree").expect("Failed to find cfgtree binary");
        cmd.current_dir(&self.temp_path);
        cmd.env_remove("CFGTREE_LOG_MODE");
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a script under the temporary directory and return its path.
    pub fn write_script(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::write(&path, contents).expect("Failed to write script");
        path
    }
}
