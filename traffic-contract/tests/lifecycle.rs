//! End-to-end lifecycle tests across the four organizations
//!
//! Each test drives the contract surface the way a submitting client
//! would: one unit of work per invocation, committed on success and
//! discarded on rejection.

use ledger_substrate::{Backend, MemoryBackend, RocksBackend, RocksTuning, TxMeta, UnitOfWork};
use rust_decimal::Decimal;
use traffic_contract::{
    ContractError, InvocationContext, NetworkConfig, OrgId, TrafficContract, TransientInputs,
    ViolationStatus,
};

fn contract() -> TrafficContract {
    TrafficContract::new(&NetworkConfig::default())
}

fn mvd() -> OrgId {
    OrgId::new("MVDMSP")
}

fn tma() -> OrgId {
    OrgId::new("TrafficManagementMSP")
}

fn insurer() -> OrgId {
    OrgId::new("InsuranceCompanyMSP")
}

fn law() -> OrgId {
    OrgId::new("LawEnforcementMSP")
}

fn vehicle_inputs(vehicle_id: &str, registration: &str) -> TransientInputs {
    TransientInputs::new()
        .with("vehicleId", vehicle_id)
        .with("ownerName", "R. Patel")
        .with("registrationNumber", registration)
        .with("model", "Axiom GT")
}

fn violation_inputs(violation_id: &str, vehicle_id: &str, registration: &str) -> TransientInputs {
    TransientInputs::new()
        .with("violationId", violation_id)
        .with("vehicleId", vehicle_id)
        .with("registrationNumber", registration)
        .with("description", "speeding")
}

fn create_vehicle(
    backend: &MemoryBackend,
    contract: &TrafficContract,
    seq: u64,
    vehicle_id: &str,
    registration: &str,
) {
    let ctx = InvocationContext::new(mvd(), vehicle_inputs(vehicle_id, registration));
    let mut uow = UnitOfWork::begin(backend);
    contract.create_vehicle(&mut uow, &ctx, vehicle_id).unwrap();
    uow.commit(TxMeta::derived(seq)).unwrap();
}

fn create_violation(
    backend: &MemoryBackend,
    contract: &TrafficContract,
    seq: u64,
    violation_id: &str,
    vehicle_id: &str,
    registration: &str,
) {
    let ctx = InvocationContext::new(tma(), violation_inputs(violation_id, vehicle_id, registration));
    let mut uow = UnitOfWork::begin(backend);
    contract
        .create_traffic_violation(&mut uow, &ctx, violation_id)
        .unwrap();
    uow.commit(TxMeta::derived(seq)).unwrap();
}

fn create_accident(
    backend: &MemoryBackend,
    contract: &TrafficContract,
    seq: u64,
    accident_id: &str,
    registration: &str,
) {
    let ctx = InvocationContext::without_transient(tma());
    let mut uow = UnitOfWork::begin(backend);
    contract
        .create_accident_report(&mut uow, &ctx, accident_id, registration, "rear-end")
        .unwrap();
    uow.commit(TxMeta::derived(seq)).unwrap();
}

#[test]
fn test_vehicle_create_read_round_trip() {
    let backend = MemoryBackend::new();
    let contract = contract();

    create_vehicle(&backend, &contract, 1, "VEH1", "REG1");

    let reader = UnitOfWork::begin(&backend);
    let ctx = InvocationContext::without_transient(law());
    let vehicle = contract.read_vehicle(&reader, &ctx, "VEH1").unwrap();

    assert_eq!(vehicle.vehicle_id, "VEH1");
    assert_eq!(vehicle.owner_name, "R. Patel");
    assert_eq!(vehicle.registration_number, "REG1");
    assert_eq!(vehicle.model, "Axiom GT");
    assert_eq!(
        serde_json::to_value(vehicle.status).unwrap(),
        serde_json::json!("Active")
    );
}

#[test]
fn test_duplicate_vehicle_rejected() {
    let backend = MemoryBackend::new();
    let contract = contract();

    create_vehicle(&backend, &contract, 1, "VEH1", "REG1");

    let ctx = InvocationContext::new(mvd(), vehicle_inputs("VEH1", "REG2"));
    let mut uow = UnitOfWork::begin(&backend);
    let err = contract.create_vehicle(&mut uow, &ctx, "VEH1").unwrap_err();
    assert!(matches!(err, ContractError::AlreadyExists { .. }));
}

#[test]
fn test_unauthorized_create_leaves_no_trace() {
    let backend = MemoryBackend::new();
    let contract = contract();
    let before = backend.fingerprint();

    for org in ["TrafficManagementMSP", "InsuranceCompanyMSP", "StrangerMSP"] {
        let ctx = InvocationContext::new(OrgId::new(org), vehicle_inputs("VEH1", "REG1"));
        let mut uow = UnitOfWork::begin(&backend);
        let err = contract.create_vehicle(&mut uow, &ctx, "VEH1").unwrap_err();
        assert!(matches!(err, ContractError::Unauthorized { .. }));
        uow.discard();
    }

    assert_eq!(backend.fingerprint(), before);
}

#[test]
fn test_duplicate_accident_report_rejected() {
    let backend = MemoryBackend::new();
    let contract = contract();

    create_accident(&backend, &contract, 1, "ACC1", "REG1");

    let ctx = InvocationContext::without_transient(tma());
    let mut uow = UnitOfWork::begin(&backend);
    let err = contract
        .create_accident_report(&mut uow, &ctx, "ACC1", "REG9", "second report")
        .unwrap_err();
    assert!(matches!(err, ContractError::AlreadyExists { .. }));
}

#[test]
fn test_violation_then_vehicle_then_match_issues_fine() {
    let backend = MemoryBackend::new();
    let contract = contract();

    // Violation is filed before the vehicle record exists.
    create_violation(&backend, &contract, 1, "V1", "VEH1", "REG1");
    create_vehicle(&backend, &contract, 2, "VEH1", "REG1");

    let ctx = InvocationContext::without_transient(mvd());
    let mut uow = UnitOfWork::begin(&backend);
    let outcome = contract
        .match_violation(&mut uow, &ctx, "VEH1", "V1", Decimal::from(100))
        .unwrap();
    uow.commit(TxMeta::derived(3)).unwrap();

    assert!(outcome.is_match());

    let reader = UnitOfWork::begin(&backend);
    let violation = contract.read_violation(&reader, &ctx, "V1").unwrap();
    assert_eq!(violation.status, ViolationStatus::FineIssued);
}

#[test]
fn test_match_only_mvd_may_run() {
    let backend = MemoryBackend::new();
    let contract = contract();

    create_violation(&backend, &contract, 1, "V1", "VEH1", "REG1");
    create_vehicle(&backend, &contract, 2, "VEH1", "REG1");

    let ctx = InvocationContext::without_transient(insurer());
    let mut uow = UnitOfWork::begin(&backend);
    let err = contract
        .match_violation(&mut uow, &ctx, "VEH1", "V1", Decimal::from(100))
        .unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));
}

#[test]
fn test_no_match_leaves_violation_pending() {
    let backend = MemoryBackend::new();
    let contract = contract();

    // Vehicle registration sorts lexicographically after the violation's.
    create_violation(&backend, &contract, 1, "V1", "VEH1", "REG1");
    create_vehicle(&backend, &contract, 2, "VEH1", "REG2");

    let ctx = InvocationContext::without_transient(mvd());
    let mut uow = UnitOfWork::begin(&backend);
    let outcome = contract
        .match_violation(&mut uow, &ctx, "VEH1", "V1", Decimal::from(100))
        .unwrap();
    uow.commit(TxMeta::derived(3)).unwrap();

    assert!(!outcome.is_match());
    assert_eq!(
        outcome.to_string(),
        "Violation does not match the vehicle specifications"
    );

    let reader = UnitOfWork::begin(&backend);
    let violation = contract.read_violation(&reader, &ctx, "V1").unwrap();
    assert_eq!(violation.status, ViolationStatus::Pending);
}

#[test]
fn test_grant_insurance_requires_existing_report() {
    let backend = MemoryBackend::new();
    let contract = contract();

    let ctx = InvocationContext::without_transient(insurer());
    let mut uow = UnitOfWork::begin(&backend);
    let err = contract
        .grant_insurance_for_accident(&mut uow, &ctx, "ACC404", "REG1")
        .unwrap_err();
    assert!(matches!(err, ContractError::NotFound { .. }));
}

#[test]
fn test_grant_insurance_registration_must_equal_stored() {
    let backend = MemoryBackend::new();
    let contract = contract();

    create_vehicle(&backend, &contract, 1, "VEH1", "REG1");
    create_accident(&backend, &contract, 2, "ACC1", "REG1");

    // A report exists under ACC1, but for a different registration.
    let ctx = InvocationContext::without_transient(insurer());
    let mut uow = UnitOfWork::begin(&backend);
    let err = contract
        .grant_insurance_for_accident(&mut uow, &ctx, "ACC1", "REG2")
        .unwrap_err();
    assert!(matches!(err, ContractError::RegistrationMismatch { .. }));
}

#[test]
fn test_grant_insurance_full_flow() {
    let backend = MemoryBackend::new();
    let contract = contract();

    create_vehicle(&backend, &contract, 1, "VEH1", "REG1");
    create_accident(&backend, &contract, 2, "ACC1", "REG1");

    let ctx = InvocationContext::without_transient(insurer());
    let mut uow = UnitOfWork::begin(&backend);
    let record = contract
        .grant_insurance_for_accident(&mut uow, &ctx, "ACC1", "REG1")
        .unwrap();
    uow.commit(TxMeta::derived(3)).unwrap();

    assert_eq!(record.matched_vehicles.len(), 1);
    assert_eq!(record.accident_report.accident_id, "ACC1");

    // The record is readable back under its derived key.
    let reader = UnitOfWork::begin(&backend);
    let stored = contract
        .read_insurance_record(&reader, &ctx, "ACC1", "REG1")
        .unwrap();
    assert_eq!(stored, record);
}

#[test]
fn test_search_accident_report_is_law_enforcement_only() {
    let backend = MemoryBackend::new();
    let contract = contract();

    create_accident(&backend, &contract, 1, "ACC1", "REG1");

    let reader = UnitOfWork::begin(&backend);

    let ctx = InvocationContext::without_transient(tma());
    let err = contract
        .search_accident_report(&reader, &ctx, "ACC1", "REG1")
        .unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));

    let ctx = InvocationContext::without_transient(law());
    let finding = contract
        .search_accident_report(&reader, &ctx, "ACC1", "REG1")
        .unwrap();
    assert_eq!(
        finding.to_string(),
        "Accident report ACC1 matches the registration number"
    );
}

#[test]
fn test_vehicle_history_one_entry_per_mutation() {
    let backend = MemoryBackend::new();
    let contract = contract();

    create_vehicle(&backend, &contract, 1, "VEH1", "REG1");

    // Unrelated commits must not show up in the vehicle's history.
    for seq in 2..=3u64 {
        let violation_id = format!("V{}", seq);
        let ctx = InvocationContext::new(tma(), violation_inputs(&violation_id, "VEH1", "REG1"));
        let mut uow = UnitOfWork::begin(&backend);
        contract
            .create_traffic_violation(&mut uow, &ctx, &violation_id)
            .unwrap();
        uow.commit(TxMeta::derived(seq)).unwrap();
    }

    let reader = UnitOfWork::begin(&backend);
    let ctx = InvocationContext::without_transient(law());
    let history = contract
        .vehicle_history(&reader, &ctx, "VEH1")
        .unwrap()
        .collect_all()
        .unwrap();

    // The vehicle itself was written exactly once.
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].tx_id, TxMeta::derived(1).tx_id);
    assert_eq!(history[0].record.vehicle_id, "VEH1");

    // Every stream was drained and closed.
    assert_eq!(backend.stream_stats().in_flight(), 0);
}

#[test]
fn test_query_all_vehicles_and_range() {
    let backend = MemoryBackend::new();
    let contract = contract();

    for (seq, vehicle_id) in ["VEH1", "VEH2", "VEH3"].iter().enumerate() {
        create_vehicle(
            &backend,
            &contract,
            seq as u64 + 1,
            vehicle_id,
            &format!("REG{}", seq + 1),
        );
    }

    let reader = UnitOfWork::begin(&backend);
    let ctx = InvocationContext::without_transient(insurer());

    let all = contract
        .query_all_vehicles(&reader, &ctx)
        .unwrap()
        .collect_all()
        .unwrap();
    assert_eq!(all.len(), 3);

    let ranged = contract
        .vehicles_by_range(&reader, &ctx, "VEH1", "VEH3")
        .unwrap()
        .collect_all()
        .unwrap();
    assert_eq!(ranged.len(), 2);
    assert_eq!(ranged[0].0, "VEH1");
    assert_eq!(ranged[1].0, "VEH2");
}

#[test]
fn test_full_lifecycle_on_rocksdb() {
    let temp = tempfile::tempdir().unwrap();
    let backend = RocksBackend::open(temp.path(), &RocksTuning::default()).unwrap();
    let contract = contract();

    // MVD registers the vehicle.
    let ctx = InvocationContext::new(mvd(), vehicle_inputs("VEH1", "REG1"));
    let mut uow = UnitOfWork::begin(&backend);
    contract.create_vehicle(&mut uow, &ctx, "VEH1").unwrap();
    uow.commit(TxMeta::derived(1)).unwrap();

    // TMA files the violation.
    let ctx = InvocationContext::new(tma(), violation_inputs("V1", "VEH1", "REG1"));
    let mut uow = UnitOfWork::begin(&backend);
    contract
        .create_traffic_violation(&mut uow, &ctx, "V1")
        .unwrap();
    uow.commit(TxMeta::derived(2)).unwrap();

    // MVD issues the fine.
    let ctx = InvocationContext::without_transient(mvd());
    let mut uow = UnitOfWork::begin(&backend);
    let outcome = contract
        .match_violation(&mut uow, &ctx, "VEH1", "V1", Decimal::from(250))
        .unwrap();
    uow.commit(TxMeta::derived(3)).unwrap();
    assert!(outcome.is_match());

    // TMA reports an accident and the insurer grants cover.
    let ctx = InvocationContext::without_transient(tma());
    let mut uow = UnitOfWork::begin(&backend);
    contract
        .create_accident_report(&mut uow, &ctx, "ACC1", "REG1", "rear-end")
        .unwrap();
    uow.commit(TxMeta::derived(4)).unwrap();

    let ctx = InvocationContext::without_transient(insurer());
    let mut uow = UnitOfWork::begin(&backend);
    let record = contract
        .grant_insurance_for_accident(&mut uow, &ctx, "ACC1", "REG1")
        .unwrap();
    uow.commit(TxMeta::derived(5)).unwrap();
    assert_eq!(record.matched_vehicles.len(), 1);

    // The violation's history shows both writes, newest first.
    let reader = UnitOfWork::begin(&backend);
    let ctx = InvocationContext::without_transient(law());
    let violation = contract.read_violation(&reader, &ctx, "V1").unwrap();
    assert_eq!(violation.status, ViolationStatus::FineIssued);
}
