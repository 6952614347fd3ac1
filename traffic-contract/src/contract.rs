//! The contract operation surface
//!
//! Every exposed operation runs the same gauntlet: authorize the caller's
//! organization, validate inputs, then touch the ledger through the
//! registries or the matching engine. Authorization failures happen before
//! any ledger read, so unauthorized callers cannot probe key existence.
//!
//! Operations are available as typed methods and through [`invoke`], a
//! string dispatcher for submission surfaces; unknown operation names are
//! denied by default.
//!
//! [`invoke`]: TrafficContract::invoke

use crate::config::NetworkConfig;
use crate::context::InvocationContext;
use crate::error::{ContractError, Result};
use crate::matching::{MatchOutcome, MatchingEngine, SearchFinding};
use crate::metrics::Metrics;
use crate::policy::{AccessPolicy, Operation};
use crate::query::{QueryFacade, RecordHistory, RecordStream};
use crate::registry::AssetRegistry;
use crate::transient::FieldMap;
use crate::types::{
    default_partition, AccidentReport, AssetType, InsuranceRecord, Vehicle, Violation,
};
use ledger_substrate::LedgerStore;
use rust_decimal::Decimal;
use serde_json::json;

/// The traffic network contract
pub struct TrafficContract {
    policy: AccessPolicy,
    vehicles: AssetRegistry<Vehicle>,
    violations: AssetRegistry<Violation>,
    accidents: AssetRegistry<AccidentReport>,
    insurance: AssetRegistry<InsuranceRecord>,
    matching: MatchingEngine,
    metrics: Metrics,
}

impl TrafficContract {
    /// Contract bound to a network configuration
    pub fn new(config: &NetworkConfig) -> Self {
        let collection = config.vehicle_collection.as_str();
        let vehicles = AssetRegistry::new(default_partition(AssetType::Vehicle, collection));
        let violations = AssetRegistry::new(default_partition(AssetType::Violation, collection));
        let accidents =
            AssetRegistry::new(default_partition(AssetType::AccidentReport, collection));
        let insurance =
            AssetRegistry::new(default_partition(AssetType::InsuranceRecord, collection));

        let matching = MatchingEngine::new(
            vehicles.clone(),
            violations.clone(),
            accidents.clone(),
            insurance.clone(),
        );

        Self {
            policy: AccessPolicy::new(config),
            vehicles,
            violations,
            accidents,
            insurance,
            matching,
            metrics: Metrics::default(),
        }
    }

    /// Metrics collector for this contract instance
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Record the invocation and authorize before anything else
    fn authorize(&self, operation: Operation, ctx: &InvocationContext) -> Result<()> {
        self.metrics.record_invocation(operation);
        self.policy
            .authorize(operation, ctx.caller_org())
            .map_err(|err| {
                self.metrics.record_denial();
                err
            })
    }

    // Vehicle operations

    /// Register a vehicle; record fields come from the transient set
    pub fn create_vehicle<S: LedgerStore>(
        &self,
        store: &mut S,
        ctx: &InvocationContext,
        vehicle_id: &str,
    ) -> Result<Vehicle> {
        self.authorize(Operation::CreateVehicle, ctx)?;
        let vehicle = self.vehicles.create(store, vehicle_id, ctx.transient())?;
        self.metrics.record_write();
        tracing::info!(vehicle_id, "Vehicle created");
        Ok(vehicle)
    }

    pub fn read_vehicle<S: LedgerStore>(
        &self,
        store: &S,
        ctx: &InvocationContext,
        vehicle_id: &str,
    ) -> Result<Vehicle> {
        self.authorize(Operation::ReadVehicle, ctx)?;
        self.vehicles.read(store, vehicle_id)
    }

    // Violation operations

    /// File a traffic violation; record fields come from the transient set
    pub fn create_traffic_violation<S: LedgerStore>(
        &self,
        store: &mut S,
        ctx: &InvocationContext,
        violation_id: &str,
    ) -> Result<Violation> {
        self.authorize(Operation::CreateTrafficViolation, ctx)?;
        let violation = self.violations.create(store, violation_id, ctx.transient())?;
        self.metrics.record_write();
        tracing::info!(violation_id, "Traffic violation created");
        Ok(violation)
    }

    pub fn read_violation<S: LedgerStore>(
        &self,
        store: &S,
        ctx: &InvocationContext,
        violation_id: &str,
    ) -> Result<Violation> {
        self.authorize(Operation::ReadViolation, ctx)?;
        self.violations.read(store, violation_id)
    }

    /// Match a violation against a vehicle, issuing the fine on success
    pub fn match_violation<S: LedgerStore>(
        &self,
        store: &mut S,
        ctx: &InvocationContext,
        vehicle_id: &str,
        violation_id: &str,
        fine_amount: Decimal,
    ) -> Result<MatchOutcome> {
        self.authorize(Operation::MatchViolation, ctx)?;
        let outcome = self
            .matching
            .match_violation(store, vehicle_id, violation_id, fine_amount)?;
        if outcome.is_match() {
            self.metrics.record_write();
        }
        Ok(outcome)
    }

    // Accident operations

    /// File an accident report from direct arguments (public record)
    pub fn create_accident_report<S: LedgerStore>(
        &self,
        store: &mut S,
        ctx: &InvocationContext,
        accident_id: &str,
        registration_number: &str,
        accident_details: &str,
    ) -> Result<AccidentReport> {
        self.authorize(Operation::CreateAccidentReport, ctx)?;

        let mut fields = FieldMap::new();
        fields.insert("accidentId".to_string(), accident_id.to_string());
        fields.insert(
            "registrationNumber".to_string(),
            registration_number.to_string(),
        );
        fields.insert("accidentDetails".to_string(), accident_details.to_string());

        let report = self.accidents.create(store, accident_id, &fields)?;
        self.metrics.record_write();
        tracing::info!(accident_id, "Accident report created");
        Ok(report)
    }

    pub fn read_accident_report<S: LedgerStore>(
        &self,
        store: &S,
        ctx: &InvocationContext,
        accident_id: &str,
    ) -> Result<AccidentReport> {
        self.authorize(Operation::ReadAccidentReport, ctx)?;
        self.accidents.read(store, accident_id)
    }

    /// Law-enforcement check of a report against a registration number
    pub fn search_accident_report<S: LedgerStore>(
        &self,
        store: &S,
        ctx: &InvocationContext,
        accident_id: &str,
        registration_number: &str,
    ) -> Result<SearchFinding> {
        self.authorize(Operation::SearchAccidentReport, ctx)?;
        self.matching
            .search_accident_report(store, accident_id, registration_number)
    }

    // Insurance operations

    /// Grant insurance for a matched accident report
    pub fn grant_insurance_for_accident<S: LedgerStore>(
        &self,
        store: &mut S,
        ctx: &InvocationContext,
        accident_id: &str,
        registration_number: &str,
    ) -> Result<InsuranceRecord> {
        self.authorize(Operation::GrantInsurance, ctx)?;
        let record = self
            .matching
            .grant_insurance(store, accident_id, registration_number)?;
        self.metrics.record_write();
        Ok(record)
    }

    pub fn read_insurance_record<S: LedgerStore>(
        &self,
        store: &S,
        ctx: &InvocationContext,
        accident_id: &str,
        registration_number: &str,
    ) -> Result<InsuranceRecord> {
        self.authorize(Operation::ReadInsuranceRecord, ctx)?;
        let key = InsuranceRecord::storage_key(registration_number, accident_id);
        self.insurance.read(store, &key)
    }

    // Query operations

    pub fn query_all_vehicles<'a, S: LedgerStore>(
        &self,
        store: &'a S,
        ctx: &InvocationContext,
    ) -> Result<RecordStream<'a, Vehicle>> {
        self.authorize(Operation::QueryAllVehicles, ctx)?;
        QueryFacade::all_of_type(store, &self.vehicles)
    }

    pub fn query_all_violations<'a, S: LedgerStore>(
        &self,
        store: &'a S,
        ctx: &InvocationContext,
    ) -> Result<RecordStream<'a, Violation>> {
        self.authorize(Operation::QueryAllViolations, ctx)?;
        QueryFacade::all_of_type(store, &self.violations)
    }

    pub fn vehicles_by_range<'a, S: LedgerStore>(
        &self,
        store: &'a S,
        ctx: &InvocationContext,
        start: &str,
        end: &str,
    ) -> Result<RecordStream<'a, Vehicle>> {
        self.authorize(Operation::VehiclesByRange, ctx)?;
        QueryFacade::range(store, &self.vehicles, start, end)
    }

    pub fn vehicle_history<'a, S: LedgerStore>(
        &self,
        store: &'a S,
        ctx: &InvocationContext,
        vehicle_id: &str,
    ) -> Result<RecordHistory<'a, Vehicle>> {
        self.authorize(Operation::VehicleHistory, ctx)?;
        QueryFacade::history(store, &self.vehicles, vehicle_id)
    }

    /// Dispatch an operation by its external name.
    ///
    /// Returns the operation's result JSON-encoded (human-readable outcome
    /// text for match and search). Unknown names are denied without
    /// touching the ledger.
    pub fn invoke<S: LedgerStore>(
        &self,
        store: &mut S,
        ctx: &InvocationContext,
        operation: &str,
        args: &[String],
    ) -> Result<String> {
        let op = match Operation::parse(operation) {
            Some(op) => op,
            None => {
                self.metrics.record_denial();
                tracing::warn!(operation, "Unknown operation denied");
                return Err(ContractError::UnknownOperation(operation.to_string()));
            }
        };

        match op {
            Operation::CreateVehicle => {
                let args = expect_args::<4>(op, args)?;
                let vehicle = self.create_vehicle(store, ctx, &args[0])?;
                Ok(serde_json::to_string(&vehicle)?)
            }
            Operation::ReadVehicle => {
                let args = expect_args::<1>(op, args)?;
                let vehicle = self.read_vehicle(store, ctx, &args[0])?;
                Ok(serde_json::to_string(&vehicle)?)
            }
            Operation::CreateTrafficViolation => {
                let args = expect_args::<4>(op, args)?;
                let violation = self.create_traffic_violation(store, ctx, &args[0])?;
                Ok(serde_json::to_string(&violation)?)
            }
            Operation::ReadViolation => {
                let args = expect_args::<1>(op, args)?;
                let violation = self.read_violation(store, ctx, &args[0])?;
                Ok(serde_json::to_string(&violation)?)
            }
            Operation::MatchViolation => {
                let args = expect_args::<3>(op, args)?;
                let fine_amount: Decimal = args[2].parse().map_err(|_| {
                    ContractError::BadArguments(format!("invalid fine amount: {}", args[2]))
                })?;
                let outcome = self.match_violation(store, ctx, &args[0], &args[1], fine_amount)?;
                Ok(outcome.to_string())
            }
            Operation::CreateAccidentReport => {
                let args = expect_args::<3>(op, args)?;
                let report =
                    self.create_accident_report(store, ctx, &args[0], &args[1], &args[2])?;
                Ok(serde_json::to_string(&report)?)
            }
            Operation::ReadAccidentReport => {
                let args = expect_args::<1>(op, args)?;
                let report = self.read_accident_report(store, ctx, &args[0])?;
                Ok(serde_json::to_string(&report)?)
            }
            Operation::SearchAccidentReport => {
                let args = expect_args::<2>(op, args)?;
                let finding = self.search_accident_report(store, ctx, &args[0], &args[1])?;
                Ok(finding.to_string())
            }
            Operation::GrantInsurance => {
                let args = expect_args::<2>(op, args)?;
                let record =
                    self.grant_insurance_for_accident(store, ctx, &args[0], &args[1])?;
                Ok(serde_json::to_string(&record)?)
            }
            Operation::ReadInsuranceRecord => {
                let args = expect_args::<2>(op, args)?;
                let record = self.read_insurance_record(store, ctx, &args[0], &args[1])?;
                Ok(serde_json::to_string(&record)?)
            }
            Operation::QueryAllVehicles => {
                expect_args::<0>(op, args)?;
                let vehicles = self.query_all_vehicles(store, ctx)?.collect_all()?;
                Ok(serde_json::to_string(&keyed_records(vehicles))?)
            }
            Operation::QueryAllViolations => {
                expect_args::<0>(op, args)?;
                let violations = self.query_all_violations(store, ctx)?.collect_all()?;
                Ok(serde_json::to_string(&keyed_records(violations))?)
            }
            Operation::VehiclesByRange => {
                let args = expect_args::<2>(op, args)?;
                let vehicles = self
                    .vehicles_by_range(store, ctx, &args[0], &args[1])?
                    .collect_all()?;
                Ok(serde_json::to_string(&keyed_records(vehicles))?)
            }
            Operation::VehicleHistory => {
                let args = expect_args::<1>(op, args)?;
                let history = self.vehicle_history(store, ctx, &args[0])?.collect_all()?;
                let entries: Vec<serde_json::Value> = history
                    .into_iter()
                    .map(|entry| {
                        json!({
                            "TxId": entry.tx_id.to_string(),
                            "Timestamp": entry.timestamp.to_rfc3339(),
                            "Record": entry.record,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string(&entries)?)
            }
        }
    }
}

fn expect_args<const N: usize>(op: Operation, args: &[String]) -> Result<&[String; N]> {
    args.try_into().map_err(|_| {
        ContractError::BadArguments(format!(
            "{} expects {} arguments, got {}",
            op,
            N,
            args.len()
        ))
    })
}

fn keyed_records<A: serde::Serialize>(records: Vec<(String, A)>) -> Vec<serde_json::Value> {
    records
        .into_iter()
        .map(|(key, record)| json!({ "Key": key, "Record": record }))
        .collect()
}
