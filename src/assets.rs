//! Styles and scripts a resolved load specification maps to

use indexmap::IndexMap;
use serde::Serialize;

use crate::requirements::types::{LoadSpec, Method};

/// Handle of the main asset
pub const MAIN_HANDLE: &str = "font-awesome-official";

/// Handle of the version 4 compatibility asset
pub const V4SHIM_HANDLE: &str = "font-awesome-official-v4shim";

const FREE_CDN: &str = "https://use.fontawesome.com";
const PRO_CDN: &str = "https://pro.fontawesome.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Style,
    Script,
}

/// One asset to attach to a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub handle: &'static str,
    pub kind: AssetKind,
    pub url: String,
    /// Extra HTML attributes, in output order
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
}

/// Assets to enqueue for `spec`, main asset first
pub fn asset_plan(spec: &LoadSpec) -> Vec<Asset> {
    let host = if spec.pro { PRO_CDN } else { FREE_CDN };
    let base = format!("{}/releases/v{}", host, spec.version);

    let (kind, main_path, shim_path) = match spec.method {
        Method::Webfont => (AssetKind::Style, "css/all.css", "css/v4-shims.css"),
        Method::Svg => (AssetKind::Script, "js/all.js", "js/v4-shims.js"),
    };

    let mut main_attributes = IndexMap::new();
    if kind == AssetKind::Script {
        main_attributes.insert("defer".to_string(), String::new());
        if spec.pseudo_elements {
            main_attributes.insert("data-search-pseudo-elements".to_string(), String::new());
        }
    }

    let mut assets = vec![Asset {
        handle: MAIN_HANDLE,
        kind,
        url: format!("{}/{}", base, main_path),
        attributes: main_attributes,
    }];

    if spec.v4shim {
        assets.push(Asset {
            handle: V4SHIM_HANDLE,
            kind,
            url: format!("{}/{}", base, shim_path),
            attributes: IndexMap::new(),
        });
    }

    assets
}
