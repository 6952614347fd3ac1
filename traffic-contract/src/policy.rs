//! Static access policy
//!
//! Maps (operation, caller organization) to allow/deny. Evaluation is pure
//! and total: every operation in the surface has an explicit rule, and
//! anything outside the surface is denied by default. Denial happens
//! before any ledger read, so an unauthorized caller learns nothing about
//! key existence.

use crate::config::NetworkConfig;
use crate::error::{ContractError, Result};
use crate::types::OrgId;
use std::fmt;

/// Invocable operations of the contract surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateVehicle,
    ReadVehicle,
    CreateTrafficViolation,
    ReadViolation,
    MatchViolation,
    CreateAccidentReport,
    ReadAccidentReport,
    SearchAccidentReport,
    GrantInsurance,
    ReadInsuranceRecord,
    QueryAllVehicles,
    QueryAllViolations,
    VehiclesByRange,
    VehicleHistory,
}

/// All operations, for exhaustive policy tests
pub const ALL_OPERATIONS: &[Operation] = &[
    Operation::CreateVehicle,
    Operation::ReadVehicle,
    Operation::CreateTrafficViolation,
    Operation::ReadViolation,
    Operation::MatchViolation,
    Operation::CreateAccidentReport,
    Operation::ReadAccidentReport,
    Operation::SearchAccidentReport,
    Operation::GrantInsurance,
    Operation::ReadInsuranceRecord,
    Operation::QueryAllVehicles,
    Operation::QueryAllViolations,
    Operation::VehiclesByRange,
    Operation::VehicleHistory,
];

impl Operation {
    /// External operation name as submitted by clients
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateVehicle => "createVehicle",
            Operation::ReadVehicle => "readVehicle",
            Operation::CreateTrafficViolation => "createTrafficViolation",
            Operation::ReadViolation => "readViolation",
            Operation::MatchViolation => "matchViolation",
            Operation::CreateAccidentReport => "createAccidentReport",
            Operation::ReadAccidentReport => "readAccidentReport",
            Operation::SearchAccidentReport => "searchAccidentReport",
            Operation::GrantInsurance => "grantInsuranceForAccident",
            Operation::ReadInsuranceRecord => "readInsuranceRecord",
            Operation::QueryAllVehicles => "queryAllVehicles",
            Operation::QueryAllViolations => "queryAllViolations",
            Operation::VehiclesByRange => "getVehiclesByRange",
            Operation::VehicleHistory => "getVehicleHistory",
        }
    }

    /// Parse an external operation name; `None` for anything outside the
    /// surface
    pub fn parse(name: &str) -> Option<Self> {
        ALL_OPERATIONS
            .iter()
            .copied()
            .find(|operation| operation.name() == name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The static authorization table
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    motor_vehicle_dept: OrgId,
    traffic_management: OrgId,
    insurance_company: OrgId,
    law_enforcement: OrgId,
}

impl AccessPolicy {
    /// Policy bound to the network's organization identifiers
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            motor_vehicle_dept: OrgId::new(config.motor_vehicle_dept_msp.clone()),
            traffic_management: OrgId::new(config.traffic_management_msp.clone()),
            insurance_company: OrgId::new(config.insurance_company_msp.clone()),
            law_enforcement: OrgId::new(config.law_enforcement_msp.clone()),
        }
    }

    /// Authorize or deny; denial carries the operation and caller
    pub fn authorize(&self, operation: Operation, caller: &OrgId) -> Result<()> {
        let allowed = match operation {
            Operation::CreateVehicle | Operation::MatchViolation => {
                caller == &self.motor_vehicle_dept
            }
            Operation::CreateTrafficViolation | Operation::CreateAccidentReport => {
                caller == &self.traffic_management
            }
            Operation::GrantInsurance => caller == &self.insurance_company,
            Operation::SearchAccidentReport => caller == &self.law_enforcement,
            Operation::ReadVehicle
            | Operation::ReadViolation
            | Operation::ReadAccidentReport
            | Operation::ReadInsuranceRecord
            | Operation::QueryAllVehicles
            | Operation::QueryAllViolations
            | Operation::VehiclesByRange
            | Operation::VehicleHistory => true,
        };

        if allowed {
            Ok(())
        } else {
            tracing::warn!(%operation, org = %caller, "Operation denied");
            Err(ContractError::Unauthorized {
                operation,
                org: caller.clone(),
            })
        }
    }
}
