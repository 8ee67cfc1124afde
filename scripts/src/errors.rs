//! Definitions of errors that can occur during the execution of the deployment scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deployment scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// A submitted transaction was rejected, reverted, or never confirmed
    TransactionFailure(String),
    /// A configured value (address, ratio, plan step) is empty or malformed
    Configuration(String),
    /// Error reading an input file
    ReadFile(String),
    /// Error writing the deployment record
    WriteOutput(String),
    /// Error parsing a compiled contract artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error constructing calldata for a contract method or constructor
    CalldataConstruction(String),
    /// Error reading contract state
    ContractInteraction(String),
    /// A price or tick fell outside of the range supported by the pool math
    PoolMath(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::TransactionFailure(s) => write!(f, "transaction failed: {}", s),
            ScriptError::Configuration(s) => write!(f, "invalid configuration: {}", s),
            ScriptError::ReadFile(s) => write!(f, "error reading file: {}", s),
            ScriptError::WriteOutput(s) => write!(f, "error writing deployment record: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::PoolMath(s) => write!(f, "pool math error: {}", s),
        }
    }
}

impl Error for ScriptError {}
