//! BranchBundle archive reader (v2)
//!
//! Reads .branchbundle.tar.zst archives and validates their contents.

use crate::branch_bundle::error::{BranchBundleError, BranchBundleResult};
use crate::branch_bundle::types::{
    paths, xxh3_hex, BundleBranchInfo, BundleManifest, BundleVerifyInfo,
    BRANCHBUNDLE_FORMAT_VERSION,
};
use crate::branch_bundle::wal_log::{BranchlogPayload, WalLogReader};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tar::Archive;

/// Reader for BranchBundle archives (v2)
///
/// Reads and validates .branchbundle.tar.zst files.
pub struct BranchBundleReader;

impl BranchBundleReader {
    /// Validate a bundle's integrity without fully parsing WAL entries
    ///
    /// Checks:
    /// - Archive can be decompressed
    /// - Required files exist (MANIFEST.json, BRANCH.json, WAL.branchlog)
    /// - Checksums match manifest
    /// - WAL.branchlog header is valid
    pub fn validate(path: &Path) -> BranchBundleResult<BundleVerifyInfo> {
        let files = Self::extract_all_files(path)?;

        // Check required files
        let manifest_data = files
            .get("MANIFEST.json")
            .ok_or_else(|| BranchBundleError::missing_file("MANIFEST.json"))?;
        let branch_data = files
            .get("BRANCH.json")
            .ok_or_else(|| BranchBundleError::missing_file("BRANCH.json"))?;
        let wal_data = files
            .get("WAL.branchlog")
            .ok_or_else(|| BranchBundleError::missing_file("WAL.branchlog"))?;

        // Parse manifest
        let manifest: BundleManifest = serde_json::from_slice(manifest_data)?;

        // Validate format version
        if manifest.format_version != BRANCHBUNDLE_FORMAT_VERSION {
            return Err(BranchBundleError::UnsupportedVersion {
                version: manifest.format_version,
            });
        }

        // Validate checksums
        let mut checksums_valid = true;

        if let Some(expected) = manifest.checksums.get("BRANCH.json") {
            let actual = xxh3_hex(branch_data);
            if expected != &actual {
                checksums_valid = false;
            }
        }

        if let Some(expected) = manifest.checksums.get("WAL.branchlog") {
            let actual = xxh3_hex(wal_data);
            if expected != &actual {
                checksums_valid = false;
            }
        }

        // Validate WAL header (without parsing entries)
        WalLogReader::validate(std::io::Cursor::new(wal_data))?;

        // Parse branch info for branch_id
        let branch_info: BundleBranchInfo = serde_json::from_slice(branch_data)?;

        Ok(BundleVerifyInfo {
            branch_id: branch_info.branch_id,
            format_version: manifest.format_version,
            wal_entry_count: manifest.contents.wal_entry_count,
            checksums_valid,
        })
    }

    /// Read and parse the manifest
    pub fn read_manifest(path: &Path) -> BranchBundleResult<BundleManifest> {
        let data = Self::extract_file(path, "MANIFEST.json")?;
        let manifest: BundleManifest = serde_json::from_slice(&data)?;

        if manifest.format_version != BRANCHBUNDLE_FORMAT_VERSION {
            return Err(BranchBundleError::UnsupportedVersion {
                version: manifest.format_version,
            });
        }

        Ok(manifest)
    }

    /// Read and parse the branch info
    pub fn read_branch_info(path: &Path) -> BranchBundleResult<BundleBranchInfo> {
        let data = Self::extract_file(path, "BRANCH.json")?;
        let branch_info: BundleBranchInfo = serde_json::from_slice(&data)?;
        Ok(branch_info)
    }

    /// Read and parse WAL payloads
    pub fn read_wal_entries(path: &Path) -> BranchBundleResult<Vec<BranchlogPayload>> {
        let data = Self::extract_file(path, "WAL.branchlog")?;
        WalLogReader::read_from_slice(&data)
    }

    /// Read and parse WAL payloads with checksum validation
    pub fn read_wal_entries_validated(path: &Path) -> BranchBundleResult<Vec<BranchlogPayload>> {
        let files = Self::extract_all_files(path)?;

        let manifest_data = files
            .get("MANIFEST.json")
            .ok_or_else(|| BranchBundleError::missing_file("MANIFEST.json"))?;
        let wal_data = files
            .get("WAL.branchlog")
            .ok_or_else(|| BranchBundleError::missing_file("WAL.branchlog"))?;

        let manifest: BundleManifest = serde_json::from_slice(manifest_data)?;

        // Validate WAL checksum
        if let Some(expected) = manifest.checksums.get("WAL.branchlog") {
            let actual = xxh3_hex(wal_data);
            if expected != &actual {
                return Err(BranchBundleError::ChecksumMismatch {
                    file: "WAL.branchlog".to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        WalLogReader::read_from_slice(wal_data)
    }

    /// Read all components from the bundle
    pub fn read_all(path: &Path) -> BranchBundleResult<BundleContents> {
        let files = Self::extract_all_files(path)?;

        let manifest_data = files
            .get("MANIFEST.json")
            .ok_or_else(|| BranchBundleError::missing_file("MANIFEST.json"))?;
        let branch_data = files
            .get("BRANCH.json")
            .ok_or_else(|| BranchBundleError::missing_file("BRANCH.json"))?;
        let wal_data = files
            .get("WAL.branchlog")
            .ok_or_else(|| BranchBundleError::missing_file("WAL.branchlog"))?;

        let manifest: BundleManifest = serde_json::from_slice(manifest_data)?;
        let branch_info: BundleBranchInfo = serde_json::from_slice(branch_data)?;
        let payloads = WalLogReader::read_from_slice(wal_data)?;

        Ok(BundleContents {
            manifest,
            branch_info,
            payloads,
        })
    }

    /// Extract a single file from the archive
    fn extract_file(path: &Path, file_name: &str) -> BranchBundleResult<Vec<u8>> {
        let file = File::open(path)?;
        let buf_reader = BufReader::new(file);
        let decoder = zstd::Decoder::new(buf_reader)
            .map_err(|e| BranchBundleError::compression(format!("zstd decode: {}", e)))?;

        let mut archive = Archive::new(decoder);
        let target_path = format!("{}/{}", paths::ROOT, file_name);

        for entry in archive
            .entries()
            .map_err(|e| BranchBundleError::archive(e.to_string()))?
        {
            let mut entry = entry.map_err(|e| BranchBundleError::archive(e.to_string()))?;
            let entry_path = entry
                .path()
                .map_err(|e| BranchBundleError::archive(e.to_string()))?
                .to_string_lossy()
                .to_string();

            if entry_path == target_path {
                let mut data = Vec::new();
                entry.read_to_end(&mut data).map_err(|e| {
                    BranchBundleError::archive(format!("read {}: {}", file_name, e))
                })?;
                return Ok(data);
            }
        }

        Err(BranchBundleError::missing_file(file_name))
    }

    /// Extract all files from the archive into a HashMap
    fn extract_all_files(path: &Path) -> BranchBundleResult<HashMap<String, Vec<u8>>> {
        let file = File::open(path)?;
        let buf_reader = BufReader::new(file);
        let decoder = zstd::Decoder::new(buf_reader)
            .map_err(|e| BranchBundleError::compression(format!("zstd decode: {}", e)))?;

        let mut archive = Archive::new(decoder);
        let mut files = HashMap::new();
        let prefix = format!("{}/", paths::ROOT);

        for entry in archive
            .entries()
            .map_err(|e| BranchBundleError::archive(e.to_string()))?
        {
            let mut entry = entry.map_err(|e| BranchBundleError::archive(e.to_string()))?;
            let entry_path = entry
                .path()
                .map_err(|e| BranchBundleError::archive(e.to_string()))?
                .to_string_lossy()
                .to_string();

            // Strip prefix to get relative file name
            if let Some(name) = entry_path.strip_prefix(&prefix) {
                if !name.is_empty() {
                    let mut data = Vec::new();
                    entry
                        .read_to_end(&mut data)
                        .map_err(|e| BranchBundleError::archive(format!("read {}: {}", name, e)))?;
                    files.insert(name.to_string(), data);
                }
            }
        }

        Ok(files)
    }

    /// Read from a byte slice (for testing)
    pub fn read_manifest_from_bytes(data: &[u8]) -> BranchBundleResult<BundleManifest> {
        let decoder = zstd::Decoder::new(data)
            .map_err(|e| BranchBundleError::compression(format!("zstd decode: {}", e)))?;

        let mut archive = Archive::new(decoder);
        let target_path = paths::MANIFEST;

        for entry in archive
            .entries()
            .map_err(|e| BranchBundleError::archive(e.to_string()))?
        {
            let mut entry = entry.map_err(|e| BranchBundleError::archive(e.to_string()))?;
            let entry_path = entry
                .path()
                .map_err(|e| BranchBundleError::archive(e.to_string()))?
                .to_string_lossy()
                .to_string();

            if entry_path == target_path {
                let mut data = Vec::new();
                entry.read_to_end(&mut data)?;
                let manifest: BundleManifest = serde_json::from_slice(&data)?;
                return Ok(manifest);
            }
        }

        Err(BranchBundleError::missing_file("MANIFEST.json"))
    }

    /// Read branch info from a byte slice (for testing)
    pub fn read_branch_info_from_bytes(data: &[u8]) -> BranchBundleResult<BundleBranchInfo> {
        let decoder = zstd::Decoder::new(data)
            .map_err(|e| BranchBundleError::compression(format!("zstd decode: {}", e)))?;

        let mut archive = Archive::new(decoder);
        let target_path = paths::BRANCH;

        for entry in archive
            .entries()
            .map_err(|e| BranchBundleError::archive(e.to_string()))?
        {
            let mut entry = entry.map_err(|e| BranchBundleError::archive(e.to_string()))?;
            let entry_path = entry
                .path()
                .map_err(|e| BranchBundleError::archive(e.to_string()))?
                .to_string_lossy()
                .to_string();

            if entry_path == target_path {
                let mut data = Vec::new();
                entry.read_to_end(&mut data)?;
                let branch_info: BundleBranchInfo = serde_json::from_slice(&data)?;
                return Ok(branch_info);
            }
        }

        Err(BranchBundleError::missing_file("BRANCH.json"))
    }

    /// Read WAL payloads from a byte slice (for testing)
    pub fn read_wal_entries_from_bytes(data: &[u8]) -> BranchBundleResult<Vec<BranchlogPayload>> {
        let decoder = zstd::Decoder::new(data)
            .map_err(|e| BranchBundleError::compression(format!("zstd decode: {}", e)))?;

        let mut archive = Archive::new(decoder);
        let target_path = paths::WAL;

        for entry in archive
            .entries()
            .map_err(|e| BranchBundleError::archive(e.to_string()))?
        {
            let mut entry = entry.map_err(|e| BranchBundleError::archive(e.to_string()))?;
            let entry_path = entry
                .path()
                .map_err(|e| BranchBundleError::archive(e.to_string()))?
                .to_string_lossy()
                .to_string();

            if entry_path == target_path {
                let mut wal_data = Vec::new();
                entry.read_to_end(&mut wal_data)?;
                return WalLogReader::read_from_slice(&wal_data);
            }
        }

        Err(BranchBundleError::missing_file("WAL.branchlog"))
    }
}

/// Complete bundle contents after reading (v2)
#[derive(Debug)]
pub struct BundleContents {
    /// Bundle manifest
    pub manifest: BundleManifest,
    /// Branch metadata
    pub branch_info: BundleBranchInfo,
    /// Transaction payloads
    pub payloads: Vec<BranchlogPayload>,
}
