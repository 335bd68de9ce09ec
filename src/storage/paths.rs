// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path utilities for wallet artifact files.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Default output directory for wallet artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// Timestamp suffix of artifact base names. No colons, so names stay portable.
pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Artifact path utilities rooted at an output directory.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    root: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl ArtifactPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<name>_<timestamp>`, shared by the files of one wallet.
    pub fn wallet_base(name: &str, at: DateTime<Utc>) -> String {
        format!("{name}_{}", at.format(ARTIFACT_TIMESTAMP_FORMAT))
    }

    /// Path to the mnemonic file.
    pub fn mnemonic(&self, base: &str) -> PathBuf {
        self.root.join(format!("{base}.mnemonic"))
    }

    /// Path to the address file.
    pub fn address(&self, base: &str) -> PathBuf {
        self.root.join(format!("{base}.addr"))
    }

    /// Path to the verification key hash file.
    pub fn vkey(&self, base: &str) -> PathBuf {
        self.root.join(format!("{base}.vkey"))
    }
}
