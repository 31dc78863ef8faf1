//! Requirement declarations and resolution outcomes

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// How the icon library is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// CSS and web fonts
    #[default]
    Webfont,
    /// JavaScript replacing `<i>` tags with inline SVG
    Svg,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Webfont => "webfont",
            Method::Svg => "svg",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webfont" => Ok(Method::Webfont),
            "svg" => Ok(Method::Svg),
            other => Err(format!("unknown method '{}'", other)),
        }
    }
}

/// A client's stance on an optional feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    Require,
    Forbid,
}

/// One client's declared needs for a single resolution pass.
///
/// Every field except `name` is optional; `None` means no preference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequirement {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_preference"
    )]
    pub v4shim: Option<Preference>,

    #[serde(
        default,
        alias = "pseudo-elements",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_preference"
    )]
    pub pseudo_elements: Option<Preference>,

    /// Semver range the loaded release must satisfy
    #[serde(default, alias = "versionRange", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pro: Option<bool>,
}

impl ClientRequirement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_v4shim(mut self, preference: Preference) -> Self {
        self.v4shim = Some(preference);
        self
    }

    pub fn with_pseudo_elements(mut self, preference: Preference) -> Self {
        self.pseudo_elements = Some(preference);
        self
    }

    pub fn with_version(mut self, range: &str) -> Self {
        self.version = Some(range.to_string());
        self
    }

    pub fn with_pro(mut self, pro: bool) -> Self {
        self.pro = Some(pro);
        self
    }

    /// Whether this client states a preference on `kind`
    pub fn declares(&self, kind: RequirementKind) -> bool {
        match kind {
            RequirementKind::Method => self.method.is_some(),
            RequirementKind::V4shim => self.v4shim.is_some(),
            RequirementKind::PseudoElements => self.pseudo_elements.is_some(),
            RequirementKind::Version => self.version.is_some(),
            RequirementKind::Name => !self.name.trim().is_empty(),
        }
    }
}

/// Accepts `"require"`, `"forbid"`, `"allow"` (no preference) or a boolean
fn deserialize_preference<'de, D>(deserializer: D) -> Result<Option<Preference>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Flag(bool),
        Word(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Flag(true)) => Ok(Some(Preference::Require)),
        Some(Repr::Flag(false)) => Ok(Some(Preference::Forbid)),
        Some(Repr::Word(word)) => match word.as_str() {
            "require" => Ok(Some(Preference::Require)),
            "forbid" => Ok(Some(Preference::Forbid)),
            "allow" | "" => Ok(None),
            other => Err(D::Error::custom(format!(
                "expected \"require\", \"forbid\" or \"allow\", found \"{}\"",
                other
            ))),
        },
    }
}

/// The unified configuration every client agreed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSpec {
    pub method: Method,
    pub v4shim: bool,
    pub pseudo_elements: bool,
    pub pro: bool,
    pub version: String,
}

/// The dimension on which clients could not agree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequirementKind {
    #[serde(rename = "method")]
    Method,
    #[serde(rename = "v4shim")]
    V4shim,
    #[serde(rename = "pseudo-elements")]
    PseudoElements,
    #[serde(rename = "version")]
    Version,
    #[serde(rename = "name")]
    Name,
}

impl RequirementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementKind::Method => "method",
            RequirementKind::V4shim => "v4shim",
            RequirementKind::PseudoElements => "pseudo-elements",
            RequirementKind::Version => "version",
            RequirementKind::Name => "name",
        }
    }
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted when clients' requirements cannot be reconciled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub requirement_kind: RequirementKind,
    /// Every declaration active in the pass, in registration order
    pub client_requirements: Vec<ClientRequirement>,
}

impl ConflictReport {
    pub fn new(requirement_kind: RequirementKind, client_requirements: &[ClientRequirement]) -> Self {
        Self {
            requirement_kind,
            client_requirements: client_requirements.to_vec(),
        }
    }

    /// Whether a client with this name took part in the pass
    pub fn includes_client(&self, name: &str) -> bool {
        self.client_requirements.iter().any(|req| req.name == name)
    }

    /// Clients that stated a preference on the conflicting dimension
    pub fn contributors(&self) -> impl Iterator<Item = &ClientRequirement> {
        self.client_requirements
            .iter()
            .filter(|req| req.declares(self.requirement_kind))
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.contributors().map(|req| req.name.as_str()).collect();
        write!(
            f,
            "conflicting {} requirements among clients: {}",
            self.requirement_kind,
            names.join(", ")
        )
    }
}
