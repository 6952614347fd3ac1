//! Generic asset registry
//!
//! One create/exists/read/update implementation shared by every asset
//! type, parameterized by storage partition. Existence checks on private
//! assets go through the content hash, so presence can be established
//! without reading content.
//!
//! Create order is fixed: existence, then required-field validation, then
//! the tagged write. Authorization happens before the registry is reached.

use crate::error::{ContractError, Result};
use crate::transient::FieldSource;
use crate::types::{Asset, CreatableAsset};
use ledger_substrate::{LedgerStore, Partition};
use std::marker::PhantomData;

/// Registry for one asset type in one partition
#[derive(Debug, Clone)]
pub struct AssetRegistry<A: Asset> {
    partition: Partition,
    _marker: PhantomData<A>,
}

impl<A: Asset> AssetRegistry<A> {
    pub fn new(partition: Partition) -> Self {
        Self {
            partition,
            _marker: PhantomData,
        }
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Whether a record exists, without exposing private content
    pub fn exists<S: LedgerStore>(&self, store: &S, key: &str) -> Result<bool> {
        match &self.partition {
            Partition::Private(collection) => {
                Ok(store.get_private_hash(collection, key)?.is_some())
            }
            Partition::Public => Ok(store.get_state(key)?.is_some()),
        }
    }

    /// Read and deserialize a record
    pub fn read<S: LedgerStore>(&self, store: &S, key: &str) -> Result<A> {
        let bytes = match &self.partition {
            Partition::Private(collection) => store.get_private(collection, key)?,
            Partition::Public => store.get_state(key)?,
        };

        let bytes = bytes.ok_or_else(|| ContractError::NotFound {
            asset: A::TYPE,
            key: key.to_string(),
        })?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Stage a record that must not exist yet
    pub fn put_new<S: LedgerStore>(&self, store: &mut S, key: &str, record: &A) -> Result<()> {
        if self.exists(store, key)? {
            return Err(ContractError::AlreadyExists {
                asset: A::TYPE,
                key: key.to_string(),
            });
        }
        self.write(store, key, record)
    }

    /// Read-modify-write; the mutated record is staged, not yet committed
    pub fn update<S, F>(&self, store: &mut S, key: &str, mutate: F) -> Result<A>
    where
        S: LedgerStore,
        F: FnOnce(&mut A),
    {
        let mut record = self.read(store, key)?;
        mutate(&mut record);
        self.write(store, key, &record)?;
        Ok(record)
    }

    fn write<S: LedgerStore>(&self, store: &mut S, key: &str, record: &A) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        match &self.partition {
            Partition::Private(collection) => store.put_private(collection, key, &bytes)?,
            Partition::Public => store.put_state(key, &bytes)?,
        }

        tracing::debug!(asset = %A::TYPE, key, partition = %self.partition, "Record staged");
        Ok(())
    }
}

impl<A: CreatableAsset> AssetRegistry<A> {
    /// Create a record from caller-supplied fields.
    ///
    /// Fails with `AlreadyExists` before field validation, and with
    /// `MissingField` before anything is staged.
    pub fn create<S: LedgerStore>(
        &self,
        store: &mut S,
        key: &str,
        fields: &dyn FieldSource,
    ) -> Result<A> {
        if self.exists(store, key)? {
            return Err(ContractError::AlreadyExists {
                asset: A::TYPE,
                key: key.to_string(),
            });
        }

        let record = A::from_fields(fields)?;
        self.write(store, key, &record)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transient::TransientInputs;
    use crate::types::{AssetType, Vehicle, VehicleStatus, Violation, ViolationStatus};
    use ledger_substrate::{MemoryBackend, TxMeta, UnitOfWork};

    const COLLECTION: &str = "ViolationCollection";

    fn vehicle_registry() -> AssetRegistry<Vehicle> {
        AssetRegistry::new(Partition::private(COLLECTION))
    }

    fn vehicle_inputs() -> TransientInputs {
        TransientInputs::new()
            .with("vehicleId", "VEH1")
            .with("ownerName", "R. Patel")
            .with("registrationNumber", "REG1")
            .with("model", "Axiom GT")
    }

    #[test]
    fn test_create_then_read_private() {
        let backend = MemoryBackend::new();

        let registry = vehicle_registry();
        let mut uow = UnitOfWork::begin(&backend);
        registry
            .create(&mut uow, "VEH1", &vehicle_inputs())
            .unwrap();
        uow.commit(TxMeta::derived(1)).unwrap();

        let reader = UnitOfWork::begin(&backend);
        assert!(registry.exists(&reader, "VEH1").unwrap());
        let vehicle = registry.read(&reader, "VEH1").unwrap();
        assert_eq!(vehicle.owner_name, "R. Patel");
        assert_eq!(vehicle.status, VehicleStatus::Active);
    }

    #[test]
    fn test_duplicate_create_rejected() {
        let backend = MemoryBackend::new();
        let registry = vehicle_registry();

        let mut uow = UnitOfWork::begin(&backend);
        registry
            .create(&mut uow, "VEH1", &vehicle_inputs())
            .unwrap();
        uow.commit(TxMeta::derived(1)).unwrap();

        let mut second = UnitOfWork::begin(&backend);
        let err = registry
            .create(&mut second, "VEH1", &vehicle_inputs())
            .unwrap_err();
        assert!(matches!(
            err,
            ContractError::AlreadyExists { asset: AssetType::Vehicle, .. }
        ));
        assert_eq!(second.staged(), 0);
    }

    #[test]
    fn test_missing_field_stages_nothing() {
        let backend = MemoryBackend::new();
        let registry = vehicle_registry();

        let incomplete = TransientInputs::new()
            .with("vehicleId", "VEH1")
            .with("ownerName", "R. Patel");

        let mut uow = UnitOfWork::begin(&backend);
        let err = registry.create(&mut uow, "VEH1", &incomplete).unwrap_err();
        assert!(matches!(err, ContractError::MissingField { .. }));
        assert_eq!(uow.staged(), 0);
    }

    #[test]
    fn test_read_absent_is_not_found() {
        let backend = MemoryBackend::new();
        let registry = vehicle_registry();
        let uow = UnitOfWork::begin(&backend);

        let err = registry.read(&uow, "VEH9").unwrap_err();
        assert!(matches!(err, ContractError::NotFound { .. }));
    }

    #[test]
    fn test_update_mutates_in_place() {
        let backend = MemoryBackend::new();
        let violations: AssetRegistry<Violation> =
            AssetRegistry::new(Partition::private(COLLECTION));

        let inputs = TransientInputs::new()
            .with("violationId", "V1")
            .with("vehicleId", "VEH1")
            .with("registrationNumber", "REG1")
            .with("description", "speeding");

        let mut uow = UnitOfWork::begin(&backend);
        violations.create(&mut uow, "V1", &inputs).unwrap();
        uow.commit(TxMeta::derived(1)).unwrap();

        let mut second = UnitOfWork::begin(&backend);
        let updated = violations
            .update(&mut second, "V1", |violation| {
                violation.status = ViolationStatus::FineIssued;
            })
            .unwrap();
        second.commit(TxMeta::derived(2)).unwrap();
        assert_eq!(updated.status, ViolationStatus::FineIssued);

        let reader = UnitOfWork::begin(&backend);
        let stored = violations.read(&reader, "V1").unwrap();
        assert_eq!(stored.status, ViolationStatus::FineIssued);
    }

    #[test]
    fn test_exists_via_hash_only() {
        let backend = MemoryBackend::new();
        let registry = vehicle_registry();

        let mut uow = UnitOfWork::begin(&backend);
        registry
            .create(&mut uow, "VEH1", &vehicle_inputs())
            .unwrap();
        uow.commit(TxMeta::derived(1)).unwrap();

        // Presence is answerable from the hash space alone.
        let reader = UnitOfWork::begin(&backend);
        assert!(reader
            .get_private_hash(COLLECTION, "VEH1")
            .unwrap()
            .is_some());
        assert!(registry.exists(&reader, "VEH1").unwrap());
        assert!(!registry.exists(&reader, "VEH2").unwrap());
    }
}
