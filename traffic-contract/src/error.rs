//! Error taxonomy for contract operations
//!
//! Denial, duplicate keys, absence, and incomplete transient input are all
//! surfaced to the caller and never retried by the contract. A business
//! no-match from violation matching is an outcome, not an error; it lives
//! in [`crate::matching::MatchOutcome`].

use crate::policy::Operation;
use crate::types::{AssetType, OrgId};
use ledger_substrate::SubstrateError;
use thiserror::Error;

/// Result type for contract operations
pub type Result<T> = std::result::Result<T, ContractError>;

/// Contract errors
#[derive(Error, Debug)]
pub enum ContractError {
    /// Caller organization is not permitted to perform the operation
    #[error("Organisation with mspid {org} cannot perform {operation}")]
    Unauthorized {
        /// Operation that was attempted
        operation: Operation,
        /// Caller organization
        org: OrgId,
    },

    /// Create against a key that is already present
    #[error("The {asset} {key} already exists")]
    AlreadyExists {
        /// Asset type of the registry
        asset: AssetType,
        /// Offending key
        key: String,
    },

    /// Referenced key is absent
    #[error("The {asset} {key} does not exist")]
    NotFound {
        /// Asset type of the registry
        asset: AssetType,
        /// Missing key
        key: String,
    },

    /// A required creation field was not supplied
    #[error("The expected key {field} was not specified in transient data")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// Accident report exists but under a different registration number
    #[error(
        "Accident report {accident_id} is registered under {stored}, not {supplied}"
    )]
    RegistrationMismatch {
        /// Accident report key
        accident_id: String,
        /// Registration number on record
        stored: String,
        /// Registration number supplied by the caller
        supplied: String,
    },

    /// Rich query found no vehicle for the registration number
    #[error("No vehicle with registration {registration} is on record")]
    NoMatchingVehicle {
        /// Registration number that was searched
        registration: String,
    },

    /// Operation name not in the contract surface (denied by default)
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Malformed or missing invocation arguments
    #[error("Invalid arguments: {0}")]
    BadArguments(String),

    /// Substrate I/O failure; the invocation commits nothing
    #[error("Substrate error: {0}")]
    Substrate(#[from] SubstrateError),

    /// Record serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
