// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet artifact files: `<base>.mnemonic`, `<base>.addr`, `<base>.vkey`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::info;

use super::files::{create_dir, write_new_text, StorageResult};
use super::paths::ArtifactPaths;
use crate::blockchain::wallet::GeneratedWallet;

/// Files written for one wallet.
#[derive(Debug, Clone)]
pub struct WalletArtifacts {
    pub mnemonic: PathBuf,
    pub address: PathBuf,
    pub vkey: PathBuf,
}

impl WalletArtifacts {
    /// Write the three artifact files. The mnemonic goes first; a later
    /// failure leaves it in place.
    pub fn save(
        paths: &ArtifactPaths,
        name: &str,
        wallet: &GeneratedWallet,
        at: DateTime<Utc>,
    ) -> StorageResult<Self> {
        create_dir(paths.root())?;

        let base = ArtifactPaths::wallet_base(name, at);
        let artifacts = Self {
            mnemonic: paths.mnemonic(&base),
            address: paths.address(&base),
            vkey: paths.vkey(&base),
        };

        write_new_text(&artifacts.mnemonic, &wallet.mnemonic)?;
        write_new_text(&artifacts.address, &wallet.address)?;
        write_new_text(&artifacts.vkey, &wallet.vkey_hash)?;

        info!(base = %base, dir = %paths.root().display(), "Wallet artifacts written");
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::wallet::{parse_mnemonic, wallet_from_mnemonic};
    use crate::network::NetworkId;
    use crate::storage::files::StorageError;
    use chrono::TimeZone;
    use std::fs;

    const PHRASE: &str = "test walk nut penalty hip pave soap entry language right filter choice";

    fn wallet() -> GeneratedWallet {
        let mnemonic = parse_mnemonic(PHRASE).unwrap();
        wallet_from_mnemonic(&mnemonic, NetworkId::Preprod).unwrap()
    }

    #[test]
    fn writes_three_sibling_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path().join("wallets"));
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let wallet = wallet();

        let artifacts = WalletArtifacts::save(&paths, "buyer", &wallet, at).unwrap();

        assert_eq!(
            artifacts.mnemonic.file_name().unwrap(),
            "buyer_2025-01-02T03-04-05.mnemonic"
        );
        assert_eq!(fs::read_to_string(&artifacts.mnemonic).unwrap(), PHRASE);
        assert_eq!(fs::read_to_string(&artifacts.address).unwrap(), wallet.address);
        assert_eq!(fs::read_to_string(&artifacts.vkey).unwrap(), wallet.vkey_hash);
    }

    #[test]
    fn existing_bundle_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

        WalletArtifacts::save(&paths, "w", &wallet(), at).unwrap();
        let second = WalletArtifacts::save(&paths, "w", &wallet(), at);

        assert!(matches!(second, Err(StorageError::AlreadyExists(_))));
    }
}
