//! `trust.cert-manager.io/v1alpha1` resources

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, Time};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Password applied to JKS trust stores when none is given
pub const DEFAULT_JKS_PASSWORD: &str = "changeit";

/// Password applied to PKCS#12 trust stores when none is given
pub const DEFAULT_PKCS12_PASSWORD: &str = "";

/// Desired state of a `Bundle`
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "trust.cert-manager.io",
    version = "v1alpha1",
    kind = "Bundle",
    status = "BundleStatus",
    derive = "Default",
    derive = "PartialEq",
    printcolumn = r#"{"name":"ConfigMap Target","type":"string","jsonPath":".spec.target.configMap.key"}"#,
    printcolumn = r#"{"name":"Secret Target","type":"string","jsonPath":".spec.target.secret.key"}"#
)]
pub struct BundleSpec {
    /// Sources the trust bundle is assembled from
    #[serde(default)]
    pub sources: Vec<BundleSource>,

    /// Where the assembled bundle is written
    #[serde(default)]
    pub target: BundleTarget,
}

/// A single source of trust data; exactly one field is expected to be set
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BundleSource {
    /// Key of a ConfigMap in the trust namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map: Option<SourceObjectKeySelector>,

    /// Key of a Secret in the trust namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<SourceObjectKeySelector>,

    /// PEM encoded certificates given inline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_line: Option<String>,

    /// Include the default CA package shipped with trust-manager
    #[serde(rename = "useDefaultCAs", skip_serializing_if = "Option::is_none")]
    pub use_default_cas: Option<bool>,
}

/// Reference to a key on a named object
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceObjectKeySelector {
    /// Name of the object; either this or `selector` is set
    #[serde(default)]
    pub name: String,

    /// Label selector matching the objects to read from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,

    #[serde(default)]
    pub key: String,

    /// Read every key of the matched objects instead of `key`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_all_keys: bool,
}

/// Where and in which formats the bundle is synced to
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BundleTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map: Option<KeySelector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<KeySelector>,

    /// Extra formats the bundle is written in, next to PEM
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_formats: Option<AdditionalFormats>,

    /// Restricts the namespaces the bundle is synced to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<LabelSelector>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeySelector {
    #[serde(default)]
    pub key: String,
}

/// Optional binary trust store formats
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalFormats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jks: Option<Jks>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkcs12: Option<Pkcs12>,
}

/// Java KeyStore output
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Jks {
    #[serde(default)]
    pub key: String,

    /// Password protecting the store; `changeit` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Checksum of `password`, filled in by the defaulting webhook
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<u32>,
}

/// PKCS#12 output
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pkcs12 {
    #[serde(default)]
    pub key: String,

    /// Password protecting the store; empty when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Checksum of `password`, filled in by the defaulting webhook
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<u32>,
}

impl Jks {
    /// Password in effect, falling back to [`DEFAULT_JKS_PASSWORD`]
    pub fn effective_password(&self) -> &str {
        self.password.as_deref().unwrap_or(DEFAULT_JKS_PASSWORD)
    }
}

impl Pkcs12 {
    /// Password in effect, falling back to [`DEFAULT_PKCS12_PASSWORD`]
    pub fn effective_password(&self) -> &str {
        self.password.as_deref().unwrap_or(DEFAULT_PKCS12_PASSWORD)
    }
}

/// Observed state of a `Bundle`
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BundleStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<BundleCondition>,

    /// Version of the default CA package last synced, if any
    #[serde(rename = "defaultCAVersion", skip_serializing_if = "Option::is_none")]
    pub default_ca_version: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BundleCondition {
    #[serde(default, rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Time>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}
