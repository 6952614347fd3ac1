//! RoadGrid Traffic Contract
//!
//! Asset lifecycle and access-control state machine for a shared ledger
//! spanning four organizations: the Motor Vehicle Department, the Traffic
//! Management Authority, the Insurance Company, and Law Enforcement.
//!
//! # Architecture
//!
//! - **Policy before state**: every operation is authorized against the
//!   caller's organization before any ledger read or write
//! - **One registry per asset type**: create/exists/read/update share one
//!   generic implementation parameterized by partition and field set
//! - **Typed outcomes**: denial, absence, and business no-match are
//!   distinct values, never strings to parse
//! - **Replay determinism**: an invocation's effects are a pure function
//!   of committed ledger state and its inputs

#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod matching;
pub mod metrics;
pub mod policy;
pub mod query;
pub mod registry;
pub mod transient;
pub mod types;

pub use config::NetworkConfig;
pub use context::InvocationContext;
pub use contract::TrafficContract;
pub use error::{ContractError, Result};
pub use matching::{MatchOutcome, MatchingEngine, SearchFinding};
pub use metrics::Metrics;
pub use policy::{AccessPolicy, Operation};
pub use query::{HistoryRecord, QueryFacade, RecordHistory, RecordStream};
pub use registry::AssetRegistry;
pub use transient::{FieldMap, FieldSource, TransientInputs};
pub use types::{
    AccidentReport, AccidentStatus, Asset, AssetType, CreatableAsset, InsuranceRecord,
    InsuranceStatus, OrgId, Vehicle, VehicleStatus, Violation, ViolationStatus,
};
