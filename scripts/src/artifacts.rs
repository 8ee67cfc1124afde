//! Loading of compiled contract artifacts and ABI encoding against them

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    hex,
    json_abi::{Function, JsonAbi},
    primitives::Bytes,
};
use serde::Deserialize;

use crate::{
    constants::{ARTIFACT_EXTENSION, SOLIDITY_EXTENSION, UNLINKED_LIBRARY_MARKER},
    errors::ScriptError,
};

/// The bytecode field of a compiled artifact.
///
/// Forge nests the hex under `bytecode.object`, other toolchains emit a bare string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// `{ "object": "0x..." }`
    Object {
        /// The hex-encoded creation code
        object: String,
    },
    /// `"0x..."`
    Hex(String),
}

/// The subset of a compiled artifact the scripts read
#[derive(Deserialize)]
struct RawArtifact {
    /// The contract ABI
    abi: JsonAbi,
    /// The creation code
    bytecode: RawBytecode,
}

/// A compiled contract: its interface and creation bytecode
#[derive(Debug, Clone, PartialEq)]
pub struct ContractArtifact {
    /// The name of the contract
    pub name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The creation bytecode, without constructor arguments
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Parse an artifact from its JSON representation
    pub fn from_json(name: &str, json: &str) -> Result<Self, ScriptError> {
        let raw: RawArtifact = serde_json::from_str(json)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{name}: {e}")))?;

        let hex_code = match raw.bytecode {
            RawBytecode::Object { object } => object,
            RawBytecode::Hex(s) => s,
        };
        if hex_code.contains(UNLINKED_LIBRARY_MARKER) {
            return Err(ScriptError::ArtifactParsing(format!(
                "{name}: bytecode references unlinked libraries"
            )));
        }

        let bytecode = hex::decode(hex_code.trim())
            .map_err(|e| ScriptError::ArtifactParsing(format!("{name}: {e}")))?;
        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{name}: artifact has no creation code (is it an interface?)"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            abi: raw.abi,
            bytecode: bytecode.into(),
        })
    }

    /// The types of the constructor parameters, empty if there is no constructor
    pub fn constructor_types(&self) -> Result<Vec<DynSolType>, ScriptError> {
        match self.abi.constructor() {
            Some(constructor) => constructor
                .inputs
                .iter()
                .map(|param| {
                    param
                        .resolve()
                        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", self.name)))
                })
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    /// ABI-encode constructor arguments, checking them against the constructor signature
    pub fn encode_constructor_args(&self, args: &[DynSolValue]) -> Result<Bytes, ScriptError> {
        let Some(constructor) = self.abi.constructor() else {
            if args.is_empty() {
                return Ok(Bytes::new());
            }
            return Err(ScriptError::CalldataConstruction(format!(
                "{} has no constructor but {} arguments were given",
                self.name,
                args.len()
            )));
        };

        if constructor.inputs.len() != args.len() {
            return Err(ScriptError::CalldataConstruction(format!(
                "{} constructor expects {} arguments, got {}",
                self.name,
                constructor.inputs.len(),
                args.len()
            )));
        }

        constructor
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| ScriptError::CalldataConstruction(format!("{}: {e}", self.name)))
    }

    /// The creation code followed by the encoded constructor arguments
    pub fn creation_code(&self, args: &[DynSolValue]) -> Result<Bytes, ScriptError> {
        let encoded_args = self.encode_constructor_args(args)?;
        Ok([self.bytecode.as_ref(), encoded_args.as_ref()]
            .concat()
            .into())
    }

    /// Look up a function by name and arity
    pub fn function(&self, name: &str, arity: usize) -> Result<&Function, ScriptError> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == arity))
            .ok_or_else(|| {
                ScriptError::Configuration(format!(
                    "{} has no function `{name}` taking {arity} arguments",
                    self.name
                ))
            })
    }

    /// The parameter types of the given function
    pub fn function_types(&self, name: &str, arity: usize) -> Result<Vec<DynSolType>, ScriptError> {
        self.function(name, arity)?
            .inputs
            .iter()
            .map(|param| {
                param
                    .resolve()
                    .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", self.name)))
            })
            .collect()
    }

    /// Encode a call to the named function, selector included
    pub fn encode_function_call(
        &self,
        name: &str,
        args: &[DynSolValue],
    ) -> Result<Bytes, ScriptError> {
        self.function(name, args.len())?
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| ScriptError::CalldataConstruction(format!("{}.{name}: {e}", self.name)))
    }
}

/// Reads artifacts out of a forge `out/` directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// The root of the artifacts directory
    root: PathBuf,
}

impl ArtifactStore {
    /// An artifact store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The path forge writes the artifact of the given contract to,
    /// `<root>/<Name>.sol/<Name>.json`
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{name}.{SOLIDITY_EXTENSION}"))
            .join(format!("{name}.{ARTIFACT_EXTENSION}"))
    }

    /// Load the artifact of the given contract
    pub fn load(&self, name: &str) -> Result<ContractArtifact, ScriptError> {
        if name.is_empty() {
            return Err(ScriptError::Configuration(
                "empty contract artifact name".to_string(),
            ));
        }
        load_artifact(name, &self.artifact_path(name))
    }
}

/// Load an artifact from an explicit path
pub fn load_artifact(name: &str, path: &Path) -> Result<ContractArtifact, ScriptError> {
    let json = fs::read_to_string(path)
        .map_err(|e| ScriptError::ReadFile(format!("{}: {e}", path.display())))?;
    ContractArtifact::from_json(name, &json)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, U256};

    use super::*;
    use crate::test_helpers::{proxy_artifact, twap_artifact, PROXY_ARTIFACT_JSON};

    #[test]
    fn test_parse_forge_artifact() {
        let artifact = proxy_artifact();
        assert_eq!(artifact.name, "ASCUpgradableProxy");
        assert!(!artifact.bytecode.is_empty());
        assert_eq!(
            artifact.constructor_types().unwrap(),
            vec![DynSolType::Address, DynSolType::Address, DynSolType::Bytes]
        );
    }

    #[test]
    fn test_parse_bare_hex_bytecode() {
        let json = r#"{"abi": [], "bytecode": "0x6080"}"#;
        let artifact = ContractArtifact::from_json("Bare", json).unwrap();
        assert_eq!(artifact.bytecode.as_ref(), &[0x60, 0x80]);
    }

    #[test]
    fn test_interface_artifact_rejected() {
        let json = r#"{"abi": [], "bytecode": {"object": "0x"}}"#;
        let err = ContractArtifact::from_json("IERC20", json).unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactParsing(_)));
    }

    #[test]
    fn test_unlinked_artifact_rejected() {
        let json = r#"{"abi": [], "bytecode": {"object": "0x60__$abcdef$__"}}"#;
        let err = ContractArtifact::from_json("Linked", json).unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactParsing(_)));
    }

    #[test]
    fn test_creation_code_appends_args() {
        let artifact = twap_artifact();
        let admin = Address::repeat_byte(0x11);
        let code = artifact
            .creation_code(&[DynSolValue::Address(admin)])
            .unwrap();

        assert_eq!(code.len(), artifact.bytecode.len() + 32);
        assert_eq!(&code[..artifact.bytecode.len()], artifact.bytecode.as_ref());
        assert_eq!(&code[code.len() - 20..], admin.as_slice());
    }

    #[test]
    fn test_constructor_arity_checked() {
        let artifact = twap_artifact();
        let err = artifact.encode_constructor_args(&[]).unwrap_err();
        assert!(matches!(err, ScriptError::CalldataConstruction(_)));
    }

    #[test]
    fn test_constructor_types_checked() {
        let artifact = twap_artifact();
        let err = artifact
            .encode_constructor_args(&[DynSolValue::Uint(U256::from(1), 256)])
            .unwrap_err();
        assert!(matches!(err, ScriptError::CalldataConstruction(_)));
    }

    #[test]
    fn test_store_reads_forge_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let path = store.artifact_path("ASCUpgradableProxy");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, PROXY_ARTIFACT_JSON).unwrap();

        let artifact = store.load("ASCUpgradableProxy").unwrap();
        assert_eq!(artifact, proxy_artifact());

        let err = store.load("Missing").unwrap_err();
        assert!(matches!(err, ScriptError::ReadFile(_)));
    }
}
