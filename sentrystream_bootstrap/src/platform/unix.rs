// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Unix Platform Implementation
//!
//! POSIX implementation backing `Platform` on Linux and macOS, via `libc`
//! and `/proc`.

use super::{Platform, PlatformError};
use async_trait::async_trait;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Unix platform implementation.
pub struct UnixPlatform;

impl UnixPlatform {
    pub fn new() -> Self {
        Self
    }

    fn read_meminfo_kb(key: &str) -> Option<u64> {
        let contents = std::fs::read_to_string("/proc/meminfo").ok()?;
        contents.lines().find_map(|line| {
            let rest = line.strip_prefix(key)?;
            rest.trim().strip_suffix(" kB")?.trim().parse::<u64>().ok()
        })
    }
}

impl Default for UnixPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for UnixPlatform {
    fn page_size(&self) -> usize {
        // SAFETY: sysconf(_SC_PAGESIZE) has no preconditions and never fails
        // in practice; a negative return just falls back to 4096.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            size as usize
        } else {
            4096
        }
    }

    fn cpu_count(&self) -> usize {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }

    fn total_memory(&self) -> Result<u64, PlatformError> {
        Self::read_meminfo_kb("MemTotal:").map(|kb| kb * 1024).ok_or_else(|| PlatformError::Other("MemTotal not found in /proc/meminfo".to_string()))
    }

    fn available_memory(&self) -> Result<u64, PlatformError> {
        Self::read_meminfo_kb("MemAvailable:").map(|kb| kb * 1024).ok_or_else(|| PlatformError::Other("MemAvailable not found in /proc/meminfo".to_string()))
    }

    fn line_separator(&self) -> &'static str {
        "\n"
    }

    fn path_separator(&self) -> char {
        ':'
    }

    fn platform_name(&self) -> &'static str {
        if cfg!(target_os = "macos") {
            "macos"
        } else {
            "linux"
        }
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn is_elevated(&self) -> bool {
        // SAFETY: geteuid takes no arguments and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), PlatformError> {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    fn is_executable(&self, path: &Path) -> bool {
        std::fs::metadata(path).map(|meta| meta.permissions().mode() & 0o111 != 0).unwrap_or(false)
    }

    async fn sync_file(&self, file: &tokio::fs::File) -> Result<(), PlatformError> {
        file.sync_all().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basics_report_sane_values() {
        let platform = UnixPlatform::new();
        assert!(platform.cpu_count() >= 1);
        let page_size = platform.page_size();
        assert!(page_size >= 512 && page_size <= 65536);
        assert_eq!(platform.line_separator(), "\n");
        assert_eq!(platform.path_separator(), ':');
    }

    #[test]
    fn executable_bit_is_honored() {
        let platform = UnixPlatform::new();
        assert!(platform.is_executable(Path::new("/bin/sh")));
        assert!(!platform.is_executable(Path::new("/etc/hostname")));
    }

    #[test]
    fn root_is_reported_elevated() {
        let platform = UnixPlatform::new();
        // SAFETY: geteuid takes no arguments and cannot fail.
        let expected = unsafe { libc::geteuid() == 0 };
        assert_eq!(platform.is_elevated(), expected);
    }
}
