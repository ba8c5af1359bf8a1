//! Shared helpers: a shell-script stand-in for the real toolchain.
//!
//! The fake compiler copies the fixture to `<stem>.s`, the fake assembler
//! copies that to `a.out`, and the fake emulator runs `a.out` with `sh`.
//! Fixtures are therefore shell scripts whose `#` annotations are comments.
//! Markers inside a fixture steer the fake tools:
//! - `SLOW_COMPILE` makes the compiler hang
//! - `BAD_ASM` makes the assembler exit non-zero

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wacc_harness::ToolchainConfig;

const COMPILER: &str = r#"#!/bin/sh
if grep -q SLOW_COMPILE "$1"; then exec sleep 30; fi
cp "$1" "$(basename "$1" .wacc).s"
"#;

const ASSEMBLER: &str = r#"#!/bin/sh
[ -f "$1" ] || exit 1
if grep -q BAD_ASM "$1"; then echo "bad instruction" >&2; exit 2; fi
cp "$1" a.out
"#;

const EMULATOR: &str = r#"#!/bin/sh
exec sh "$1"
"#;

pub struct FakeToolchain {
    dir: TempDir,
}

impl FakeToolchain {
    pub fn install() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, body) in [
            ("compile", COMPILER),
            ("arm-gcc", ASSEMBLER),
            ("arm-run", EMULATOR),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, body).expect("write tool");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod tool");
        }
        Self { dir }
    }

    pub fn config(&self, timeout_secs: u64) -> ToolchainConfig {
        ToolchainConfig {
            compiler: self.dir.path().join("compile"),
            assembler: self.dir.path().join("arm-gcc"),
            emulator: self.dir.path().join("arm-run"),
            compile_timeout_secs: timeout_secs,
            assemble_timeout_secs: timeout_secs,
            execute_timeout_secs: timeout_secs,
        }
    }
}

/// Write a fixture under `root`, creating parent directories.
pub fn write_fixture(root: &Path, relative: &str, body: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(&path, body).expect("write fixture");
    path
}
