use serde::{Deserialize, Serialize};

/// Response envelope returned by `stat/voucher`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoucherEnvelope {
    #[serde(default)]
    pub meta: Meta,
    pub data: Vec<AccessCode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub rc: String,
}

/// A guest access code (voucher) issued by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessCode {
    /// Validity in minutes once redeemed.
    pub duration: i64,
    pub qos_overwrite: bool,
    pub note: String,
    pub code: String,
    pub for_hotspot: bool,
    /// Unix seconds.
    pub create_time: i64,
    /// Number of allowed uses, 0 for unlimited.
    pub quota: i64,
    pub site_id: String,
    #[serde(rename = "_id")]
    pub id: String,
    pub admin_name: String,
    pub used: i64,
    pub status: String,
    pub status_expires: i64,
}
