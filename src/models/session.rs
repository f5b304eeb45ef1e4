use serde::{Deserialize, Serialize};

use crate::models::partner::Partner;

/// Where the front end should be, derived from session state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Login,
    Onboarding,
    VerificationPending,
    Home,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DeviceConditions {
    pub low_battery: bool,
    pub poor_network: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub is_authenticated: bool,
    pub screen: Screen,
    pub partner: Option<Partner>,
    pub device: DeviceConditions,
    pub idle_ticks: u32,
}

/// Outcome of a user action: a success flag plus an optional message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}
