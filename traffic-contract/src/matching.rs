//! Cross-organization matching
//!
//! Resolves violation→fine issuance and accident→insurance grant by
//! cross-referencing asset registries. Authorization has already happened
//! at the contract surface; this module assumes an authorized caller and
//! enforces only the business predicates.

use crate::error::{ContractError, Result};
use crate::registry::AssetRegistry;
use crate::types::{
    AccidentReport, Asset, AssetType, InsuranceRecord, Vehicle, Violation, ViolationStatus,
};
use ledger_substrate::{LedgerStore, Selector};
use rust_decimal::Decimal;
use std::fmt;

/// Result of a violation match attempt.
///
/// A no-match is an informational outcome, not an error: the caller asked
/// a question and got a negative answer.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Predicate held; the violation now carries `Fine Issued`
    FineIssued {
        vehicle_id: String,
        violation_id: String,
        fine_amount: Decimal,
    },
    /// Predicate failed; nothing changed
    NoMatch {
        vehicle_id: String,
        violation_id: String,
    },
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::FineIssued { .. })
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOutcome::FineIssued {
                vehicle_id,
                fine_amount,
                ..
            } => write!(f, "Vehicle with {} is fined with {}", vehicle_id, fine_amount),
            MatchOutcome::NoMatch { .. } => {
                write!(f, "Violation does not match the vehicle specifications")
            }
        }
    }
}

/// Result of a law-enforcement accident search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchFinding {
    /// Stored registration equals the queried one
    RegistrationMatches {
        accident_id: String,
        report: AccidentReport,
    },
    /// Report exists but under a different registration
    RegistrationDiffers {
        accident_id: String,
        stored: String,
        supplied: String,
    },
}

impl fmt::Display for SearchFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchFinding::RegistrationMatches { accident_id, .. } => {
                write!(f, "Accident report {} matches the registration number", accident_id)
            }
            SearchFinding::RegistrationDiffers {
                accident_id,
                stored,
                supplied,
            } => write!(
                f,
                "Accident report {} is registered under {}, not {}",
                accident_id, stored, supplied
            ),
        }
    }
}

/// Cross-references the asset registries
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    vehicles: AssetRegistry<Vehicle>,
    violations: AssetRegistry<Violation>,
    accidents: AssetRegistry<AccidentReport>,
    insurance: AssetRegistry<InsuranceRecord>,
}

impl MatchingEngine {
    pub fn new(
        vehicles: AssetRegistry<Vehicle>,
        violations: AssetRegistry<Violation>,
        accidents: AssetRegistry<AccidentReport>,
        insurance: AssetRegistry<InsuranceRecord>,
    ) -> Self {
        Self {
            vehicles,
            violations,
            accidents,
            insurance,
        }
    }

    /// Match a violation against a vehicle and issue the fine.
    ///
    /// Both records must exist. The fine is issued when the violation
    /// references the vehicle and the vehicle's registration number is
    /// lexicographically <= the violation's. The registration comparison
    /// is kept byte-for-byte compatible with earlier contract revisions;
    /// its business intent is undocumented, so do not "fix" it silently.
    pub fn match_violation<S: LedgerStore>(
        &self,
        store: &mut S,
        vehicle_id: &str,
        violation_id: &str,
        fine_amount: Decimal,
    ) -> Result<MatchOutcome> {
        if !self.vehicles.exists(store, vehicle_id)? {
            return Err(ContractError::NotFound {
                asset: AssetType::Vehicle,
                key: vehicle_id.to_string(),
            });
        }
        if !self.violations.exists(store, violation_id)? {
            return Err(ContractError::NotFound {
                asset: AssetType::Violation,
                key: violation_id.to_string(),
            });
        }

        let vehicle = self.vehicles.read(store, vehicle_id)?;
        let violation = self.violations.read(store, violation_id)?;

        let matches = vehicle.vehicle_id == violation.vehicle_id
            && vehicle.registration_number <= violation.registration_number;

        if !matches {
            tracing::info!(vehicle_id, violation_id, "Violation did not match vehicle");
            return Ok(MatchOutcome::NoMatch {
                vehicle_id: vehicle_id.to_string(),
                violation_id: violation_id.to_string(),
            });
        }

        self.violations.update(store, violation_id, |violation| {
            violation.status = ViolationStatus::FineIssued;
        })?;

        tracing::info!(
            vehicle_id,
            violation_id,
            %fine_amount,
            "Fine issued for matched violation"
        );

        Ok(MatchOutcome::FineIssued {
            vehicle_id: vehicle_id.to_string(),
            violation_id: violation_id.to_string(),
            fine_amount,
        })
    }

    /// Grant insurance for a reported accident.
    ///
    /// The accident report must exist and be stored under the supplied
    /// registration number. Every vehicle candidate the rich query returns
    /// is embedded in the granted record.
    pub fn grant_insurance<S: LedgerStore>(
        &self,
        store: &mut S,
        accident_id: &str,
        registration_number: &str,
    ) -> Result<InsuranceRecord> {
        let report = self.accidents.read(store, accident_id)?;

        if report.registration_number != registration_number {
            return Err(ContractError::RegistrationMismatch {
                accident_id: accident_id.to_string(),
                stored: report.registration_number.clone(),
                supplied: registration_number.to_string(),
            });
        }

        let selector = Selector::new()
            .field("assetType", AssetType::Vehicle.tag())
            .field("registrationNumber", registration_number);

        let mut candidates = Vec::new();
        let stream = store.get_query_result(self.vehicles.partition(), &selector)?;
        for item in stream {
            let (_, bytes) = item?;
            candidates.push(serde_json::from_slice::<Vehicle>(&bytes)?);
        }

        if candidates.is_empty() {
            return Err(ContractError::NoMatchingVehicle {
                registration: registration_number.to_string(),
            });
        }

        tracing::info!(
            accident_id,
            registration_number,
            candidates = candidates.len(),
            "Insurance granted"
        );

        let record = InsuranceRecord::granted(report, candidates);
        self.insurance.put_new(store, &record.key(), &record)?;
        Ok(record)
    }

    /// Compare a stored accident report against a queried registration.
    /// Read-only.
    pub fn search_accident_report<S: LedgerStore>(
        &self,
        store: &S,
        accident_id: &str,
        registration_number: &str,
    ) -> Result<SearchFinding> {
        let report = self.accidents.read(store, accident_id)?;

        if report.registration_number == registration_number {
            Ok(SearchFinding::RegistrationMatches {
                accident_id: accident_id.to_string(),
                report,
            })
        } else {
            Ok(SearchFinding::RegistrationDiffers {
                accident_id: accident_id.to_string(),
                stored: report.registration_number.clone(),
                supplied: registration_number.to_string(),
            })
        }
    }
}
