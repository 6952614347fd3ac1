//! Ledger record types
//!
//! A closed set of tagged records. The `assetType` discriminator is set by
//! the constructors here and enforced by the registry; it is never taken
//! from caller input.

use crate::error::{ContractError, Result};
use crate::transient::FieldSource;
use ledger_substrate::Partition;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Organization (MSP) identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgId(String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset discriminator tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    #[serde(rename = "vehicle")]
    Vehicle,
    #[serde(rename = "violation")]
    Violation,
    #[serde(rename = "accidentReport")]
    AccidentReport,
    #[serde(rename = "insuranceRecord")]
    InsuranceRecord,
}

impl AssetType {
    /// Tag value as stored in the `assetType` field
    pub fn tag(&self) -> &'static str {
        match self {
            AssetType::Vehicle => "vehicle",
            AssetType::Violation => "violation",
            AssetType::AccidentReport => "accidentReport",
            AssetType::InsuranceRecord => "insuranceRecord",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationStatus {
    Pending,
    #[serde(rename = "Fine Issued")]
    FineIssued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccidentStatus {
    Reported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsuranceStatus {
    #[serde(rename = "Insurance Granted")]
    Granted,
}

/// A record stored under the shared read/write contract of the registry
pub trait Asset: Serialize + DeserializeOwned + Clone {
    /// Discriminator stamped into every record of this type
    const TYPE: AssetType;

    /// Storage key of this record
    fn key(&self) -> String;
}

/// An asset created directly from caller-supplied fields
pub trait CreatableAsset: Asset {
    /// Fields a create must supply (transient for private assets,
    /// direct arguments for public ones)
    const REQUIRED_FIELDS: &'static [&'static str];

    /// Build the record; fails on the first missing required field
    fn from_fields(fields: &dyn FieldSource) -> Result<Self>;
}

fn required(fields: &dyn FieldSource, name: &'static str) -> Result<String> {
    fields.field(name)?.ok_or(ContractError::MissingField {
        field: name.to_string(),
    })
}

/// Vehicle registered by the Motor Vehicle Department
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub asset_type: AssetType,
    pub vehicle_id: String,
    pub owner_name: String,
    pub registration_number: String,
    pub model: String,
    pub status: VehicleStatus,
}

impl Asset for Vehicle {
    const TYPE: AssetType = AssetType::Vehicle;

    fn key(&self) -> String {
        self.vehicle_id.clone()
    }
}

impl CreatableAsset for Vehicle {
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["vehicleId", "ownerName", "registrationNumber", "model"];

    fn from_fields(fields: &dyn FieldSource) -> Result<Self> {
        Ok(Self {
            asset_type: AssetType::Vehicle,
            vehicle_id: required(fields, "vehicleId")?,
            owner_name: required(fields, "ownerName")?,
            registration_number: required(fields, "registrationNumber")?,
            model: required(fields, "model")?,
            status: VehicleStatus::Active,
        })
    }
}

/// Traffic violation reported by the Traffic Management Authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub asset_type: AssetType,
    pub violation_id: String,
    /// Reference to a vehicle; not enforced as a foreign key by the
    /// store, validated at match time
    pub vehicle_id: String,
    pub registration_number: String,
    pub description: String,
    pub status: ViolationStatus,
}

impl Asset for Violation {
    const TYPE: AssetType = AssetType::Violation;

    fn key(&self) -> String {
        self.violation_id.clone()
    }
}

impl CreatableAsset for Violation {
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["violationId", "vehicleId", "registrationNumber", "description"];

    fn from_fields(fields: &dyn FieldSource) -> Result<Self> {
        Ok(Self {
            asset_type: AssetType::Violation,
            violation_id: required(fields, "violationId")?,
            vehicle_id: required(fields, "vehicleId")?,
            registration_number: required(fields, "registrationNumber")?,
            description: required(fields, "description")?,
            status: ViolationStatus::Pending,
        })
    }
}

/// Accident report filed by the Traffic Management Authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccidentReport {
    pub asset_type: AssetType,
    pub accident_id: String,
    pub registration_number: String,
    pub accident_details: String,
    pub status: AccidentStatus,
}

impl Asset for AccidentReport {
    const TYPE: AssetType = AssetType::AccidentReport;

    fn key(&self) -> String {
        self.accident_id.clone()
    }
}

impl CreatableAsset for AccidentReport {
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["accidentId", "registrationNumber", "accidentDetails"];

    fn from_fields(fields: &dyn FieldSource) -> Result<Self> {
        Ok(Self {
            asset_type: AssetType::AccidentReport,
            accident_id: required(fields, "accidentId")?,
            registration_number: required(fields, "registrationNumber")?,
            accident_details: required(fields, "accidentDetails")?,
            status: AccidentStatus::Reported,
        })
    }
}

/// Insurance determination derived from a matched accident report.
///
/// Embeds the report and every vehicle candidate the rich query returned;
/// ambiguous matches are preserved for the insurer, never resolved by an
/// implicit pick-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceRecord {
    pub asset_type: AssetType,
    pub registration_number: String,
    pub accident_id: String,
    pub status: InsuranceStatus,
    pub accident_report: AccidentReport,
    pub matched_vehicles: Vec<Vehicle>,
}

impl InsuranceRecord {
    /// Storage key: `insurance_{registrationNumber}_{accidentId}`
    pub fn storage_key(registration_number: &str, accident_id: &str) -> String {
        format!("insurance_{}_{}", registration_number, accident_id)
    }

    /// Grant insurance for a matched accident report
    pub fn granted(report: AccidentReport, matched_vehicles: Vec<Vehicle>) -> Self {
        Self {
            asset_type: AssetType::InsuranceRecord,
            registration_number: report.registration_number.clone(),
            accident_id: report.accident_id.clone(),
            status: InsuranceStatus::Granted,
            accident_report: report,
            matched_vehicles,
        }
    }
}

impl Asset for InsuranceRecord {
    const TYPE: AssetType = AssetType::InsuranceRecord;

    fn key(&self) -> String {
        Self::storage_key(&self.registration_number, &self.accident_id)
    }
}

/// Default partition of each asset type: vehicles and violations live in
/// the named private collection, accident reports and insurance records in
/// public world state.
pub fn default_partition(asset: AssetType, collection: &str) -> Partition {
    match asset {
        AssetType::Vehicle | AssetType::Violation => Partition::private(collection),
        AssetType::AccidentReport | AssetType::InsuranceRecord => Partition::Public,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transient::FieldMap;

    fn vehicle_fields() -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("vehicleId".to_string(), "VEH1".to_string());
        fields.insert("ownerName".to_string(), "R. Patel".to_string());
        fields.insert("registrationNumber".to_string(), "REG1".to_string());
        fields.insert("model".to_string(), "Axiom GT".to_string());
        fields
    }

    #[test]
    fn test_vehicle_from_fields_sets_tag_and_status() {
        let vehicle = Vehicle::from_fields(&vehicle_fields()).unwrap();
        assert_eq!(vehicle.asset_type, AssetType::Vehicle);
        assert_eq!(vehicle.status, VehicleStatus::Active);
        assert_eq!(vehicle.key(), "VEH1");
    }

    #[test]
    fn test_vehicle_missing_field() {
        let mut fields = vehicle_fields();
        fields.remove("model");

        let err = Vehicle::from_fields(&fields).unwrap_err();
        assert!(matches!(
            err,
            ContractError::MissingField { field } if field == "model"
        ));
    }

    #[test]
    fn test_serde_round_trip_preserves_tag() {
        let vehicle = Vehicle::from_fields(&vehicle_fields()).unwrap();
        let bytes = serde_json::to_vec(&vehicle).unwrap();
        let back: Vehicle = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, vehicle);

        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["assetType"], "vehicle");
        assert_eq!(doc["vehicleId"], "VEH1");
    }

    #[test]
    fn test_violation_status_wire_format() {
        let json = serde_json::to_value(ViolationStatus::FineIssued).unwrap();
        assert_eq!(json, "Fine Issued");
        let json = serde_json::to_value(ViolationStatus::Pending).unwrap();
        assert_eq!(json, "Pending");
    }

    #[test]
    fn test_insurance_storage_key() {
        assert_eq!(
            InsuranceRecord::storage_key("REG1", "ACC1"),
            "insurance_REG1_ACC1"
        );
    }

    #[test]
    fn test_insurance_granted_embeds_report_and_candidates() {
        let mut fields = FieldMap::new();
        fields.insert("accidentId".to_string(), "ACC1".to_string());
        fields.insert("registrationNumber".to_string(), "REG1".to_string());
        fields.insert("accidentDetails".to_string(), "rear-end".to_string());
        let report = AccidentReport::from_fields(&fields).unwrap();

        let vehicle = Vehicle::from_fields(&vehicle_fields()).unwrap();
        let record = InsuranceRecord::granted(report.clone(), vec![vehicle]);

        assert_eq!(record.status, InsuranceStatus::Granted);
        assert_eq!(record.accident_report, report);
        assert_eq!(record.matched_vehicles.len(), 1);
        assert_eq!(record.key(), "insurance_REG1_ACC1");
    }
}
