//! Payloads for provisioning LoRaWAN gateways on The Things Network.
//!
//! Gateways are registered on the EU1 identity server but their radio traffic
//! is served by the NAM1 gateway server, so every registration points
//! `gateway_server_address` at NAM1. This module only builds and interprets
//! the TTN v3 request/response bodies; it performs no I/O.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::time::Clock;
use crate::validators::{normalize_eui64, validate_uuid, ValidationError};

/// Identity server (global gateway registry)
pub const IDENTITY_BASE_URL: &str = "https://eu1.cloud.thethings.network";
/// Regional cluster serving gateway traffic
pub const REGIONAL_BASE_URL: &str = "https://nam1.cloud.thethings.network";
/// Value every gateway's `gateway_server_address` must hold
pub const GATEWAY_SERVER_HOST: &str = "nam1.cloud.thethings.network";
/// US 915 MHz, sub-band 2
pub const DEFAULT_FREQUENCY_PLAN: &str = "US_902_928_FSB_2";
pub const PROVISIONER_VERSION: &str =
    concat!("freshtrack-gateway-provisioner-v", env!("CARGO_PKG_VERSION"));

pub const LNS_PORT: u16 = 8887;
pub const CUPS_PORT: u16 = 443;
pub const UDP_FORWARDER_PORT: u16 = 1700;

/// Normalize a gateway EUI to 16 uppercase hex digits
pub fn normalize_gateway_eui(eui: &str) -> Result<String, ValidationError> {
    normalize_eui64(eui, "gateway_eui")
}

/// Name used when a provisioning request does not give one
pub const DEFAULT_GATEWAY_NAME: &str = "FrostGuard Gateway";
pub const MAX_GATEWAY_ID_LENGTH: usize = 36;

fn gateway_id_regex() -> &'static Regex {
    static GATEWAY_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    GATEWAY_ID_REGEX.get_or_init(|| Regex::new(r"^[a-z0-9](?:-?[a-z0-9]){2,}$").unwrap())
}

/// Gateway id used when none is supplied: `fg-gw-` plus the last 8 EUI digits
pub fn default_gateway_id(gateway_eui: &str) -> Result<String, ValidationError> {
    let eui = normalize_gateway_eui(gateway_eui)?;
    Ok(format!("fg-gw-{}", eui[eui.len() - 8..].to_ascii_lowercase()))
}

/// TTN ids: 3 to 36 lowercase letters, digits and single inner dashes
pub fn validate_gateway_id(gateway_id: &str) -> Result<(), ValidationError> {
    if gateway_id.len() > MAX_GATEWAY_ID_LENGTH {
        return Err(ValidationError::new(
            "gateway_id",
            format!(
                "Gateway id cannot exceed {} characters",
                MAX_GATEWAY_ID_LENGTH
            ),
        ));
    }
    if !gateway_id_regex().is_match(gateway_id) {
        return Err(ValidationError::new(
            "gateway_id",
            format!(
                "Gateway id '{}' must be lowercase letters, digits and single dashes",
                gateway_id
            ),
        ));
    }
    Ok(())
}

/// Owner a gateway is registered under
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOwner {
    User(String),
    Organization(String),
}

impl GatewayOwner {
    /// Identity server collection new gateways are POSTed to
    pub fn registration_url(&self) -> String {
        match self {
            GatewayOwner::User(id) => format!("{}/api/v3/users/{}/gateways", IDENTITY_BASE_URL, id),
            GatewayOwner::Organization(id) => {
                format!("{}/api/v3/organizations/{}/gateways", IDENTITY_BASE_URL, id)
            }
        }
    }
}

pub fn gateway_url(gateway_id: &str) -> String {
    format!("{}/api/v3/gateways/{}", IDENTITY_BASE_URL, gateway_id)
}

pub fn purge_url(gateway_id: &str) -> String {
    format!("{}/purge", gateway_url(gateway_id))
}

pub fn api_keys_url(gateway_id: &str) -> String {
    format!("{}/api-keys", gateway_url(gateway_id))
}

/// Connection stats live on the regional gateway server, not the identity server
pub fn connection_stats_url(gateway_id: &str) -> String {
    format!(
        "{}/api/v3/gs/gateways/{}/connection/stats",
        REGIONAL_BASE_URL, gateway_id
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayIds {
    pub gateway_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eui: Option<String>,
}

/// Registration options; defaults match a private, authenticated gateway
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySettings {
    pub frequency_plan: String,
    pub enforce_duty_cycle: bool,
    pub require_authenticated_connection: bool,
    pub status_public: bool,
    pub location_public: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            frequency_plan: DEFAULT_FREQUENCY_PLAN.to_string(),
            enforce_duty_cycle: true,
            require_authenticated_connection: true,
            status_public: false,
            location_public: false,
        }
    }
}

/// Gateway body for identity server registration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayRegistration {
    pub ids: GatewayIds,
    pub name: String,
    pub frequency_plan_ids: Vec<String>,
    pub gateway_server_address: String,
    pub enforce_duty_cycle: bool,
    pub require_authenticated_connection: bool,
    pub status_public: bool,
    pub location_public: bool,
}

impl GatewayRegistration {
    /// Build a registration; `gateway_id` falls back to [`default_gateway_id`]
    pub fn new(
        gateway_eui: &str,
        gateway_id: Option<&str>,
        name: &str,
        settings: &GatewaySettings,
    ) -> Result<Self, ValidationError> {
        let eui = normalize_gateway_eui(gateway_eui)?;
        let gateway_id = match gateway_id {
            Some(id) => id.trim().to_string(),
            None => default_gateway_id(&eui)?,
        };
        validate_gateway_id(&gateway_id)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::new("name", "Gateway name cannot be empty"));
        }

        Ok(Self {
            ids: GatewayIds {
                gateway_id,
                eui: Some(eui),
            },
            name: name.to_string(),
            frequency_plan_ids: vec![settings.frequency_plan.clone()],
            gateway_server_address: GATEWAY_SERVER_HOST.to_string(),
            enforce_duty_cycle: settings.enforce_duty_cycle,
            require_authenticated_connection: settings.require_authenticated_connection,
            status_public: settings.status_public,
            location_public: settings.location_public,
        })
    }

    pub fn gateway_id(&self) -> &str {
        &self.ids.gateway_id
    }

    /// Request body: `{"gateway": {...}}`
    pub fn to_request_body(&self) -> serde_json::Value {
        serde_json::json!({ "gateway": self })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub source: String,
}

impl AntennaLocation {
    /// Registry-sourced location; altitude defaults to 0 m
    pub fn new(
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
    ) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::new(
                "latitude",
                format!("Latitude {} must be between -90 and 90", latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::new(
                "longitude",
                format!("Longitude {} must be between -180 and 180", longitude),
            ));
        }

        Ok(Self {
            latitude,
            longitude,
            altitude: altitude.unwrap_or(0.0),
            source: "SOURCE_REGISTRY".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Antenna {
    pub location: AntennaLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayPatch {
    pub ids: GatewayIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_server_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antennas: Option<Vec<Antenna>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMask {
    pub paths: Vec<String>,
}

/// PUT body for partial gateway updates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayUpdate {
    pub gateway: GatewayPatch,
    pub field_mask: FieldMask,
}

impl GatewayUpdate {
    /// Repoint an existing gateway at the NAM1 gateway server
    pub fn server_address(gateway_id: &str) -> Self {
        Self {
            gateway: GatewayPatch {
                ids: GatewayIds {
                    gateway_id: gateway_id.to_string(),
                    eui: None,
                },
                gateway_server_address: Some(GATEWAY_SERVER_HOST.to_string()),
                antennas: None,
            },
            field_mask: FieldMask {
                paths: vec!["gateway_server_address".to_string()],
            },
        }
    }

    /// Replace the gateway's antennas with a single located antenna
    pub fn antenna_location(gateway_id: &str, location: AntennaLocation) -> Self {
        Self {
            gateway: GatewayPatch {
                ids: GatewayIds {
                    gateway_id: gateway_id.to_string(),
                    eui: None,
                },
                gateway_server_address: None,
                antennas: Some(vec![Antenna { location }]),
            },
            field_mask: FieldMask {
                paths: vec!["antennas".to_string()],
            },
        }
    }
}

/// Gateway as returned by the identity server (fields we inspect)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExistingGateway {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gateway_server_address: Option<String>,
    #[serde(default)]
    pub frequency_plan_ids: Vec<String>,
    #[serde(default)]
    pub require_authenticated_connection: Option<bool>,
}

impl ExistingGateway {
    pub fn needs_server_address_update(&self) -> bool {
        needs_server_address_update(self.gateway_server_address.as_deref())
    }
}

/// True unless the gateway already points at the NAM1 gateway server
pub fn needs_server_address_update(current: Option<&str>) -> bool {
    current != Some(GATEWAY_SERVER_HOST)
}

/// What a gateway API key is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyPurpose {
    /// Basics Station LNS link
    Lns,
    /// Basics Station configuration and update server
    Cups,
}

impl ApiKeyPurpose {
    pub fn rights(&self) -> &'static [&'static str] {
        match self {
            ApiKeyPurpose::Lns => &["RIGHT_GATEWAY_LINK"],
            ApiKeyPurpose::Cups => &[
                "RIGHT_GATEWAY_INFO",
                "RIGHT_GATEWAY_SETTINGS_BASIC",
                "RIGHT_GATEWAY_READ_SECRETS",
            ],
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ApiKeyPurpose::Lns => "LNS",
            ApiKeyPurpose::Cups => "CUPS",
        }
    }

    /// Key name, dated so rotated keys are distinguishable
    pub fn key_name(&self, clock: &dyn Clock) -> String {
        format!("FreshTrack {} Key - {}", self.label(), clock.today_compact())
    }

    pub fn key_file_name(&self, gateway_id: &str) -> String {
        format!("{}_{}.key", gateway_id, self.label().to_ascii_lowercase())
    }

    pub fn create_request(&self, clock: &dyn Clock) -> CreateApiKeyRequest {
        CreateApiKeyRequest {
            name: self.key_name(clock),
            rights: self.rights().iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
    pub rights: Vec<String>,
}

/// Identity server response to key creation; `key` is only ever shown once
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedApiKey {
    pub id: String,
    #[serde(default)]
    pub key: String,
}

/// Contents of a Basics Station `lns.key` / `cups.key` file
pub fn key_file_contents(key: &str) -> String {
    format!("Authorization: Bearer {}\r\n", key)
}

/// Shorten a secret for display: first 30 and last 10 characters
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 40 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..30].iter().collect();
    let tail: String = chars[chars.len() - 10..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Gateway status as stored in the `gateways` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Pending,
    Online,
    Degraded,
    Offline,
    Maintenance,
}

/// Row upserted into the FreshTrack `gateways` table, unique on
/// `(organization_id, gateway_eui)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayRecord {
    pub organization_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    pub gateway_eui: String,
    pub name: String,
    pub status: GatewayStatus,
    pub ttn_gateway_id: String,
    pub ttn_registered_at: String,
    pub description: String,
}

impl GatewayRecord {
    pub fn from_registration(
        registration: &GatewayRegistration,
        organization_id: &str,
        site_id: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        validate_uuid(organization_id, "organization_id")?;
        if let Some(site_id) = site_id {
            validate_uuid(site_id, "site_id")?;
        }

        let gateway_eui = registration
            .ids
            .eui
            .clone()
            .ok_or_else(|| ValidationError::new("gateway_eui", "Registration has no EUI"))?;
        let frequency_plan = registration
            .frequency_plan_ids
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_FREQUENCY_PLAN);

        Ok(Self {
            organization_id: organization_id.to_string(),
            site_id: site_id.map(str::to_string),
            gateway_eui,
            name: registration.name.clone(),
            status: GatewayStatus::Pending,
            ttn_gateway_id: registration.ids.gateway_id.clone(),
            ttn_registered_at: clock.now_rfc3339(),
            description: format!(
                "Provisioned via {} | freq: {} | cluster: nam1",
                PROVISIONER_VERSION, frequency_plan
            ),
        })
    }
}

/// Where the physical gateway should connect
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionInfo {
    pub gateway_id: String,
    pub frequency_plan: String,
    pub lns_url: String,
    pub cups_url: String,
    pub udp_host: String,
    pub udp_up_port: u16,
    pub udp_down_port: u16,
}

impl ConnectionInfo {
    pub fn new(gateway_id: &str, frequency_plan: &str) -> Self {
        Self {
            gateway_id: gateway_id.to_string(),
            frequency_plan: frequency_plan.to_string(),
            lns_url: format!("wss://{}:{}", GATEWAY_SERVER_HOST, LNS_PORT),
            cups_url: format!("https://{}:{}", GATEWAY_SERVER_HOST, CUPS_PORT),
            udp_host: GATEWAY_SERVER_HOST.to_string(),
            udp_up_port: UDP_FORWARDER_PORT,
            udp_down_port: UDP_FORWARDER_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub step: String,
    pub success: bool,
    pub message: String,
    pub timestamp: String,
}

/// Ordered record of one provisioning run. Holds key ids, never key material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisioningLog {
    pub gateway_id: String,
    pub script_version: String,
    pub steps: Vec<StepOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lns_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cups_key_id: Option<String>,
}

impl ProvisioningLog {
    pub fn new(gateway_id: &str) -> Self {
        Self {
            gateway_id: gateway_id.to_string(),
            script_version: PROVISIONER_VERSION.to_string(),
            steps: Vec::new(),
            lns_key_id: None,
            cups_key_id: None,
        }
    }

    pub fn record(
        &mut self,
        step: &str,
        success: bool,
        message: impl Into<String>,
        clock: &dyn Clock,
    ) {
        self.steps.push(StepOutcome {
            step: step.to_string(),
            success,
            message: message.into(),
            timestamp: clock.now_rfc3339(),
        });
    }

    /// Remember the id of a created key
    pub fn record_key(&mut self, purpose: ApiKeyPurpose, key: &CreatedApiKey) {
        match purpose {
            ApiKeyPurpose::Lns => self.lns_key_id = Some(key.id.clone()),
            ApiKeyPurpose::Cups => self.cups_key_id = Some(key.id.clone()),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.steps.iter().filter(|s| s.success).count()
    }

    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.success)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}/{} steps succeeded",
            self.succeeded(),
            self.steps.len()
        )
    }
}

/// Account type a batch entry is registered under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerType {
    #[default]
    User,
    Org,
}

impl OwnerType {
    pub fn owner(self, owner_id: &str) -> GatewayOwner {
        match self {
            OwnerType::User => GatewayOwner::User(owner_id.to_string()),
            OwnerType::Org => GatewayOwner::Organization(owner_id.to_string()),
        }
    }
}

/// One gateway in a batch provisioning file; every field is optional on the wire
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GatewayConfigEntry {
    #[serde(default)]
    pub gateway_eui: Option<String>,
    #[serde(default)]
    pub gateway_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub owner_type: Option<OwnerType>,
    #[serde(default)]
    pub frequency_plan: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub generate_lns_key: Option<bool>,
    #[serde(default)]
    pub generate_cups_key: Option<bool>,
    #[serde(default)]
    pub fg_org_id: Option<String>,
    #[serde(default)]
    pub fg_site_id: Option<String>,
}

/// Top level of a batch provisioning file
///
/// Either `{"gateways": [...]}` with shared owner fields, or a single
/// gateway object carrying `gateway_eui` itself.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub gateways: Option<Vec<GatewayConfigEntry>>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub owner_type: Option<OwnerType>,
}

/// A batch entry with every default applied
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayProvisionRequest {
    pub gateway_eui: String,
    pub gateway_id: String,
    pub name: String,
    pub owner: GatewayOwner,
    pub frequency_plan: String,
    pub location: Option<AntennaLocation>,
    pub generate_lns_key: bool,
    pub generate_cups_key: bool,
    pub organization_id: Option<String>,
    pub site_id: Option<String>,
}

impl GatewayProvisionRequest {
    pub fn registration(&self) -> Result<GatewayRegistration, ValidationError> {
        let settings = GatewaySettings {
            frequency_plan: self.frequency_plan.clone(),
            ..GatewaySettings::default()
        };
        GatewayRegistration::new(
            &self.gateway_eui,
            Some(&self.gateway_id),
            &self.name,
            &settings,
        )
    }

    /// Keys to create, LNS first
    pub fn key_purposes(&self) -> Vec<ApiKeyPurpose> {
        let mut purposes = Vec::new();
        if self.generate_lns_key {
            purposes.push(ApiKeyPurpose::Lns);
        }
        if self.generate_cups_key {
            purposes.push(ApiKeyPurpose::Cups);
        }
        purposes
    }
}

impl GatewayConfigEntry {
    /// Apply batch-level owner fields, then built-in defaults
    pub fn resolve(&self, batch: &BatchConfig) -> Result<GatewayProvisionRequest, ValidationError> {
        let gateway_eui = self
            .gateway_eui
            .as_deref()
            .ok_or_else(|| ValidationError::new("gateway_eui", "Gateway EUI is required"))
            .and_then(normalize_gateway_eui)?;

        let gateway_id = match self.gateway_id.as_deref() {
            Some(id) => id.trim().to_string(),
            None => default_gateway_id(&gateway_eui)?,
        };
        validate_gateway_id(&gateway_id)?;

        let owner_id = self
            .owner_id
            .as_deref()
            .or(batch.owner_id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ValidationError::new("owner_id", "Owner id is required"))?;
        let owner_type = self.owner_type.or(batch.owner_type).unwrap_or_default();

        let location = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                Some(AntennaLocation::new(latitude, longitude, self.altitude)?)
            }
            _ => None,
        };

        Ok(GatewayProvisionRequest {
            gateway_eui,
            gateway_id,
            name: self
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_GATEWAY_NAME.to_string()),
            owner: owner_type.owner(owner_id),
            frequency_plan: self
                .frequency_plan
                .clone()
                .unwrap_or_else(|| DEFAULT_FREQUENCY_PLAN.to_string()),
            location,
            generate_lns_key: self.generate_lns_key.unwrap_or(true),
            generate_cups_key: self.generate_cups_key.unwrap_or(false),
            organization_id: self.fg_org_id.clone(),
            site_id: self.fg_site_id.clone(),
        })
    }
}

/// Parse a batch provisioning file into fully defaulted requests
///
/// A file with neither `gateways` nor `gateway_eui` yields no requests. Errors
/// name the failing entry by index.
pub fn parse_batch_config(json: &str) -> Result<Vec<GatewayProvisionRequest>, ValidationError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| ValidationError::new("config", format!("Invalid batch config: {}", e)))?;
    let batch: BatchConfig = serde_json::from_value(value.clone())
        .map_err(|e| ValidationError::new("config", format!("Invalid batch config: {}", e)))?;

    let entries = match &batch.gateways {
        Some(gateways) => gateways.clone(),
        None if value.get("gateway_eui").is_some() => vec![serde_json::from_value(value)
            .map_err(|e| ValidationError::new("config", format!("Invalid gateway entry: {}", e)))?],
        None => Vec::new(),
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry.resolve(&batch).map_err(|e| {
                ValidationError::new(e.field, format!("gateways[{}]: {}", index, e.message))
            })
        })
        .collect()
}

/// Gateway server view of a registered gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Stats returned: the gateway holds a live connection
    Connected,
    /// 404 from the gateway server: registered but offline
    NotConnected,
    /// Any other status: the check itself failed
    Unreachable { status: u16 },
}

impl ConnectionState {
    /// Classify the status of a `connection/stats` request
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => ConnectionState::Connected,
            404 => ConnectionState::NotConnected,
            status => ConnectionState::Unreachable { status },
        }
    }

    /// A gateway that is registered but not yet online still counts as provisioned
    pub fn is_success(&self) -> bool {
        !matches!(self, ConnectionState::Unreachable { .. })
    }

    pub fn message(&self) -> String {
        match self {
            ConnectionState::Connected => "Gateway is connected to NAM1".to_string(),
            ConnectionState::NotConnected => {
                "Gateway registered but not connected (hardware offline)".to_string()
            }
            ConnectionState::Unreachable { status } => {
                format!("Could not check NAM1 connection (status {})", status)
            }
        }
    }

    /// Append the outcome as the `verify_nam1` step
    pub fn record(&self, log: &mut ProvisioningLog, clock: &dyn Clock) {
        log.record("verify_nam1", self.is_success(), self.message(), clock);
    }
}

/// One request in the gateway removal sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeprovisionStep {
    Check,
    Delete,
    Purge,
    Verify,
}

/// How a deprovision step's status affects the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepVerdict {
    Passed,
    /// Logged, the run still succeeds
    Warned,
    /// Stop here, the run failed
    Aborted,
}

impl DeprovisionStep {
    pub fn name(&self) -> &'static str {
        match self {
            DeprovisionStep::Check => "check",
            DeprovisionStep::Delete => "delete",
            DeprovisionStep::Purge => "purge",
            DeprovisionStep::Verify => "verify",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            DeprovisionStep::Check | DeprovisionStep::Verify => "GET",
            DeprovisionStep::Delete | DeprovisionStep::Purge => "DELETE",
        }
    }

    pub fn url(&self, gateway_id: &str) -> String {
        match self {
            DeprovisionStep::Purge => purge_url(gateway_id),
            _ => gateway_url(gateway_id),
        }
    }

    /// Verify expects the gateway to be gone; every other step needs a 2xx
    pub fn verdict(&self, status: u16) -> StepVerdict {
        match self {
            DeprovisionStep::Verify if status == 404 => StepVerdict::Passed,
            DeprovisionStep::Verify => StepVerdict::Warned,
            _ if (200..300).contains(&status) => StepVerdict::Passed,
            _ => StepVerdict::Aborted,
        }
    }
}

/// Check, soft delete, optional purge (frees the EUI for reuse), verify gone
pub fn deprovision_plan(purge: bool) -> Vec<DeprovisionStep> {
    let mut steps = vec![DeprovisionStep::Check, DeprovisionStep::Delete];
    if purge {
        steps.push(DeprovisionStep::Purge);
    }
    steps.push(DeprovisionStep::Verify);
    steps
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeprovisionOutcome {
    pub step: DeprovisionStep,
    pub status: u16,
    pub verdict: StepVerdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprovisionReport {
    pub gateway_id: String,
    pub outcomes: Vec<DeprovisionOutcome>,
}

impl DeprovisionReport {
    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.verdict != StepVerdict::Aborted)
    }

    pub fn warnings(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.verdict == StepVerdict::Warned)
            .count()
    }
}

/// Walk the removal plan, stopping at the first aborted step
///
/// `send` performs one request `(step, method, url)` and returns its status.
pub fn run_deprovision<F>(gateway_id: &str, purge: bool, mut send: F) -> DeprovisionReport
where
    F: FnMut(DeprovisionStep, &str, &str) -> u16,
{
    let mut outcomes = Vec::new();
    for step in deprovision_plan(purge) {
        let status = send(step, step.method(), &step.url(gateway_id));
        let verdict = step.verdict(status);
        outcomes.push(DeprovisionOutcome {
            step,
            status,
            verdict,
        });
        if verdict == StepVerdict::Aborted {
            break;
        }
    }

    DeprovisionReport {
        gateway_id: gateway_id.to_string(),
        outcomes,
    }
}
