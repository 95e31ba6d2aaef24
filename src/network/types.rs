use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How an interface spec asks for its network namespace.
///
/// In the `--network` JSON this is the `namespace` field: `true` means
/// "resolve one for me", a string names one explicitly, `false` or absence
/// means no namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NamespaceRequest {
    #[default]
    Unset,
    Auto,
    Named(String),
}

impl NamespaceRequest {
    pub fn is_unset(&self) -> bool {
        matches!(self, NamespaceRequest::Unset)
    }
}

impl Serialize for NamespaceRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NamespaceRequest::Unset => serializer.serialize_bool(false),
            NamespaceRequest::Auto => serializer.serialize_bool(true),
            NamespaceRequest::Named(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for NamespaceRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Name(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Flag(true) => NamespaceRequest::Auto,
            Repr::Flag(false) => NamespaceRequest::Unset,
            Repr::Name(name) => NamespaceRequest::Named(name),
        })
    }
}

/// A requested network attachment, straight from user input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSpec {
    /// Host-side interface name (attachment order is externally meaningful
    /// for boot NIC selection)
    pub name: String,
    #[serde(default, skip_serializing_if = "NamespaceRequest::is_unset")]
    pub namespace: NamespaceRequest,
    /// Bridge the interface hangs off, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
}

/// A resolved network attachment: the namespace, if any, is now concrete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
}

/// Parse the `--network` argument: a JSON array of interface specs
pub fn parse_interface_specs(json: &str) -> crate::Result<Vec<InterfaceSpec>> {
    Ok(serde_json::from_str(json)?)
}
