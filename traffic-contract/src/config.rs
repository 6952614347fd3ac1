//! Network configuration

use ledger_substrate::RocksTuning;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one contract deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// MSP id of the Motor Vehicle Department
    pub motor_vehicle_dept_msp: String,

    /// MSP id of the Traffic Management Authority
    pub traffic_management_msp: String,

    /// MSP id of the Insurance Company
    pub insurance_company_msp: String,

    /// MSP id of Law Enforcement
    pub law_enforcement_msp: String,

    /// Private collection holding vehicles and violations
    pub vehicle_collection: String,

    /// Data directory for the RocksDB substrate
    pub data_dir: PathBuf,

    /// RocksDB tuning
    pub rocksdb: RocksTuning,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            motor_vehicle_dept_msp: "MVDMSP".to_string(),
            traffic_management_msp: "TrafficManagementMSP".to_string(),
            insurance_company_msp: "InsuranceCompanyMSP".to_string(),
            law_enforcement_msp: "LawEnforcementMSP".to_string(),
            vehicle_collection: "ViolationCollection".to_string(),
            data_dir: PathBuf::from("./data/roadgrid"),
            rocksdb: RocksTuning::default(),
        }
    }
}

impl NetworkConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(ledger_substrate::SubstrateError::from)?;
        let config: NetworkConfig = toml::from_str(&content).map_err(|e| {
            crate::ContractError::BadArguments(format!("Failed to parse config: {}", e))
        })?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        let mut config = NetworkConfig::default();

        if let Ok(data_dir) = std::env::var("ROADGRID_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(collection) = std::env::var("ROADGRID_VEHICLE_COLLECTION") {
            config.vehicle_collection = collection;
        }

        if let Ok(msp) = std::env::var("ROADGRID_MVD_MSP") {
            config.motor_vehicle_dept_msp = msp;
        }

        if let Ok(msp) = std::env::var("ROADGRID_TRAFFIC_MSP") {
            config.traffic_management_msp = msp;
        }

        if let Ok(msp) = std::env::var("ROADGRID_INSURANCE_MSP") {
            config.insurance_company_msp = msp;
        }

        if let Ok(msp) = std::env::var("ROADGRID_LAW_MSP") {
            config.law_enforcement_msp = msp;
        }

        config
    }
}
