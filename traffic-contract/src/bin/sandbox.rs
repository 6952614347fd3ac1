//! Local sandbox: replays the four-organization lifecycle against a
//! RocksDB substrate and prints each outcome.

use anyhow::Context;
use ledger_substrate::{RocksBackend, TxMeta, UnitOfWork};
use traffic_contract::{
    InvocationContext, NetworkConfig, OrgId, TrafficContract, TransientInputs,
};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting RoadGrid sandbox");

    let config = NetworkConfig::from_env();
    let backend = RocksBackend::open(&config.data_dir, &config.rocksdb)
        .with_context(|| format!("opening substrate at {:?}", config.data_dir))?;
    let contract = TrafficContract::new(&config);

    let mvd = OrgId::new(config.motor_vehicle_dept_msp.clone());
    let tma = OrgId::new(config.traffic_management_msp.clone());
    let insurer = OrgId::new(config.insurance_company_msp.clone());
    let law = OrgId::new(config.law_enforcement_msp.clone());

    let mut seq = 0u64;
    let mut run = |ctx: &InvocationContext, operation: &str, args: &[&str]| -> anyhow::Result<()> {
        seq += 1;
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        let mut uow = UnitOfWork::begin(&backend);

        match contract.invoke(&mut uow, ctx, operation, &args) {
            Ok(result) => {
                uow.commit(TxMeta::derived(seq))?;
                println!("{} -> {}", operation, result);
            }
            Err(err) => {
                uow.discard();
                println!("{} -> rejected: {}", operation, err);
            }
        }
        Ok(())
    };

    // MVD registers a vehicle; the sensitive fields travel transiently.
    let mvd_create = InvocationContext::new(
        mvd.clone(),
        TransientInputs::new()
            .with("vehicleId", "VEH1")
            .with("ownerName", "R. Patel")
            .with("registrationNumber", "REG1")
            .with("model", "Axiom GT"),
    );
    run(&mvd_create, "createVehicle", &["VEH1", "", "", ""])?;

    // TMA files a violation referencing the vehicle.
    let tma_create = InvocationContext::new(
        tma.clone(),
        TransientInputs::new()
            .with("violationId", "V1")
            .with("vehicleId", "VEH1")
            .with("registrationNumber", "REG1")
            .with("description", "speeding"),
    );
    run(&tma_create, "createTrafficViolation", &["V1", "", "", ""])?;

    // MVD matches the violation and issues the fine.
    let mvd_plain = InvocationContext::without_transient(mvd.clone());
    run(&mvd_plain, "matchViolation", &["VEH1", "V1", "250"])?;

    // TMA reports an accident; the insurer grants cover; law enforcement
    // verifies the registration.
    let tma_plain = InvocationContext::without_transient(tma.clone());
    run(
        &tma_plain,
        "createAccidentReport",
        &["ACC1", "REG1", "rear-end collision at junction 4"],
    )?;

    let insurer_plain = InvocationContext::without_transient(insurer.clone());
    run(&insurer_plain, "grantInsuranceForAccident", &["ACC1", "REG1"])?;

    let law_plain = InvocationContext::without_transient(law.clone());
    run(&law_plain, "searchAccidentReport", &["ACC1", "REG1"])?;

    // A cross-organization attempt that must be denied.
    run(&tma_plain, "createVehicle", &["VEH2", "", "", ""])?;

    // Full vehicle history, newest first.
    run(&mvd_plain, "getVehicleHistory", &["VEH1"])?;

    tracing::info!("Sandbox run complete");
    Ok(())
}
