use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PARTNER_ID: &str = "DP001";
pub const DEFAULT_BASE_LOCATION: &str = "Koramangala, Bangalore";
pub const DEFAULT_SERVICE_RADIUS_KM: u32 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    #[default]
    Bike,
    Bicycle,
    Scooter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BankDetails {
    pub account_number: String,
    pub ifsc_code: String,
    pub account_holder_name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    ProfilePhoto,
    DrivingLicense,
    IdentityProof,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Partner {
    pub id: String,
    pub full_name: String,
    pub mobile: String,
    pub profile_photo: Option<String>,
    pub vehicle_type: VehicleType,
    pub vehicle_number: String,
    pub driving_license: Option<String>,
    pub identity_proof: Option<String>,
    pub bank_details: BankDetails,
    pub is_onboarded: bool,
    pub is_verified: bool,
    pub is_online: bool,
    pub base_location: String,
    pub service_radius_km: u32,
    pub rejection_count: u32,
    pub is_blocked: bool,
    pub block_ends_at: Option<DateTime<Utc>>,
}

impl Default for Partner {
    fn default() -> Self {
        Self {
            id: DEFAULT_PARTNER_ID.to_string(),
            full_name: String::new(),
            mobile: String::new(),
            profile_photo: None,
            vehicle_type: VehicleType::default(),
            vehicle_number: String::new(),
            driving_license: None,
            identity_proof: None,
            bank_details: BankDetails::default(),
            is_onboarded: false,
            is_verified: false,
            is_online: false,
            base_location: DEFAULT_BASE_LOCATION.to_string(),
            service_radius_km: DEFAULT_SERVICE_RADIUS_KM,
            rejection_count: 0,
            is_blocked: false,
            block_ends_at: None,
        }
    }
}

impl Partner {
    pub fn apply(&mut self, update: PartnerUpdate) {
        if let Some(full_name) = update.full_name {
            self.full_name = full_name;
        }
        if let Some(mobile) = update.mobile {
            self.mobile = mobile;
        }
        if let Some(vehicle_type) = update.vehicle_type {
            self.vehicle_type = vehicle_type;
        }
        if let Some(vehicle_number) = update.vehicle_number {
            self.vehicle_number = vehicle_number;
        }
        if let Some(bank_details) = update.bank_details {
            self.bank_details = bank_details;
        }
        if let Some(base_location) = update.base_location {
            self.base_location = base_location;
        }
        if let Some(service_radius_km) = update.service_radius_km {
            self.service_radius_km = service_radius_km;
        }
    }

    /// Stores the URI handed over by the media picker as-is.
    pub fn attach_document(&mut self, kind: DocumentKind, uri: String) {
        let slot = match kind {
            DocumentKind::ProfilePhoto => &mut self.profile_photo,
            DocumentKind::DrivingLicense => &mut self.driving_license,
            DocumentKind::IdentityProof => &mut self.identity_proof,
        };
        *slot = Some(uri);
    }

    /// First missing or malformed onboarding field, if any.
    pub fn onboarding_gap(&self) -> Option<&'static str> {
        if self.full_name.trim().is_empty() {
            return Some("Full name is required");
        }
        if self.mobile.trim().is_empty() {
            return Some("Mobile number is required");
        }
        if self.mobile.len() != 10 || !self.mobile.chars().all(|c| c.is_ascii_digit()) {
            return Some("Enter valid 10-digit mobile");
        }
        if self.profile_photo.is_none() {
            return Some("Profile photo is required");
        }
        if self.vehicle_number.trim().is_empty() {
            return Some("Vehicle number is required");
        }
        if self.driving_license.is_none() {
            return Some("Driving license is required");
        }
        if self.identity_proof.is_none() {
            return Some("Identity proof is required");
        }
        if self.bank_details.account_number.trim().is_empty() {
            return Some("Account number is required");
        }
        if self.bank_details.ifsc_code.trim().is_empty() {
            return Some("IFSC code is required");
        }
        if self.bank_details.account_holder_name.trim().is_empty() {
            return Some("Account holder name is required");
        }
        None
    }
}

/// Partial profile edit coming from the onboarding or profile screens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartnerUpdate {
    pub full_name: Option<String>,
    pub mobile: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub vehicle_number: Option<String>,
    pub bank_details: Option<BankDetails>,
    pub base_location: Option<String>,
    pub service_radius_km: Option<u32>,
}
