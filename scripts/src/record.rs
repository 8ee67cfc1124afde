//! The deployment record written at the end of every script run.
//!
//! Each run writes exactly one file named `<unix-millis>_<suffix>.json`. The
//! file is opened with create-new semantics; when two runs land on the same
//! millisecond the timestamp is bumped until a free name is found, so a
//! record is never overwritten.

use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use alloy::primitives::{Address, Bytes};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Value};
use tracing::{info, warn};

use crate::{
    constants::{ARTIFACT_EXTENSION, RECORD_INDENT},
    errors::ScriptError,
};

/// The addresses, calldata archives and scalar values produced by one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeploymentRecord {
    /// Deployed or referenced contracts, keyed by role
    #[serde(flatten)]
    addresses: BTreeMap<String, Address>,
    /// Scalar outputs such as computed ticks or minted amounts
    #[serde(flatten)]
    values: BTreeMap<String, Value>,
    /// ABI-encoded argument archives, for verification and multisig replay
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    calldata: BTreeMap<String, Bytes>,
}

impl DeploymentRecord {
    /// An empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the address of the contract filling `role`
    pub fn set_address(&mut self, role: &str, address: Address) -> &mut Self {
        self.addresses.insert(role.to_string(), address);
        self
    }

    /// Archive the encoded arguments of `role`
    pub fn set_calldata(&mut self, role: &str, calldata: Bytes) -> &mut Self {
        self.calldata.insert(role.to_string(), calldata);
        self
    }

    /// Record a scalar output
    pub fn set_value(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// The address recorded for `role`
    pub fn address(&self, role: &str) -> Option<Address> {
        self.addresses.get(role).copied()
    }

    /// The calldata archived for `role`
    pub fn calldata(&self, role: &str) -> Option<&Bytes> {
        self.calldata.get(role)
    }

    /// The scalar recorded under `key`
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The record as pretty-printed JSON with a four space indent
    pub fn to_json(&self) -> Result<Vec<u8>, ScriptError> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(RECORD_INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| ScriptError::WriteOutput(e.to_string()))?;
        buf.push(b'\n');

        Ok(buf)
    }

    /// Write the record into `dir`, named after the current time and `suffix`
    pub fn write(&self, dir: &Path, suffix: &str) -> Result<PathBuf, ScriptError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ScriptError::WriteOutput(e.to_string()))?
            .as_millis();
        let millis = u64::try_from(millis).map_err(|e| ScriptError::WriteOutput(e.to_string()))?;

        self.write_at(dir, suffix, millis)
    }

    /// Write the record into `dir` using `millis` as the first candidate timestamp
    pub fn write_at(&self, dir: &Path, suffix: &str, millis: u64) -> Result<PathBuf, ScriptError> {
        if suffix.is_empty() {
            return Err(ScriptError::WriteOutput("empty record suffix".to_string()));
        }
        let json = self.to_json()?;
        fs::create_dir_all(dir)
            .map_err(|e| ScriptError::WriteOutput(format!("{}: {e}", dir.display())))?;

        let mut millis = millis;
        loop {
            let path = dir.join(record_file_name(millis, suffix));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    fill_record(file, &path, &json)?;
                    info!("deployment record written to {}", path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    millis = millis.checked_add(1).ok_or_else(|| {
                        ScriptError::WriteOutput("record timestamp overflowed".to_string())
                    })?;
                }
                Err(e) => {
                    return Err(ScriptError::WriteOutput(format!("{}: {e}", path.display())))
                }
            }
        }
    }
}

/// Write `json` into the newly created record file at `path`, removing the
/// file if the write fails so that no partial record is left behind
fn fill_record(mut file: impl Write, path: &Path, json: &[u8]) -> Result<(), ScriptError> {
    let written = file.write_all(json).and_then(|()| file.flush());
    drop(file);

    written.map_err(|e| {
        if let Err(remove_err) = fs::remove_file(path) {
            warn!("failed to remove partial record {}: {remove_err}", path.display());
        }
        ScriptError::WriteOutput(format!("{}: {e}", path.display()))
    })
}

/// `<millis>_<suffix>.json`
fn record_file_name(millis: u64, suffix: &str) -> String {
    format!("{millis}_{suffix}.{ARTIFACT_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn sample_record() -> DeploymentRecord {
        let mut record = DeploymentRecord::new();
        record
            .set_address("logic", Address::repeat_byte(0xaa))
            .set_address("proxy", Address::repeat_byte(0xbb))
            .set_calldata("proxy", Bytes::from(vec![0xca, 0xfe]))
            .set_value("lowerTick", -180);
        record
    }

    #[test]
    fn test_record_layout() {
        let json: Value = serde_json::from_slice(&sample_record().to_json().unwrap()).unwrap();

        let logic = Address::from_str(json["logic"].as_str().unwrap()).unwrap();
        assert_eq!(logic, Address::repeat_byte(0xaa));
        assert_eq!(json["lowerTick"], -180);
        assert_eq!(json["calldata"]["proxy"], "0xcafe");
    }

    #[test]
    fn test_record_indent() {
        let json = String::from_utf8(sample_record().to_json().unwrap()).unwrap();
        assert!(json.contains("\n    \"logic\""));
        assert!(json.contains("\n        \"proxy\": \"0xcafe\""));
    }

    #[test]
    fn test_empty_calldata_omitted() {
        let mut record = DeploymentRecord::new();
        record.set_address("logic", Address::repeat_byte(0x01));
        let json: Value = serde_json::from_slice(&record.to_json().unwrap()).unwrap();
        assert!(json.get("calldata").is_none());
    }

    #[test]
    fn test_write_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_record()
            .write_at(dir.path(), "deployed_dfxcad", 1_650_000_000_000)
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "1650000000000_deployed_dfxcad.json"
        );
        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["lowerTick"], -180);
    }

    #[test]
    fn test_same_millisecond_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first = sample_record().write_at(dir.path(), "logic", 42).unwrap();

        let mut other = DeploymentRecord::new();
        other.set_address("logic", Address::repeat_byte(0x01));
        let second = other.write_at(dir.path(), "logic", 42).unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("43_logic.json"));

        let first_json: Value =
            serde_json::from_str(&fs::read_to_string(&first).unwrap()).unwrap();
        assert_eq!(first_json["lowerTick"], -180);
    }

    /// A file handle whose writes always fail
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_leaves_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(record_file_name(42, "logic"));
        fs::write(&path, b"").unwrap();

        let json = sample_record().to_json().unwrap();
        let err = fill_record(FullDisk, &path, &json).unwrap_err();

        assert!(matches!(err, ScriptError::WriteOutput(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_uses_current_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_record().write(dir.path(), "logic").unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();

        let (millis, suffix) = name.split_once('_').unwrap();
        assert!(millis.parse::<u64>().unwrap() > 1_600_000_000_000);
        assert_eq!(suffix, "logic.json");
    }
}
