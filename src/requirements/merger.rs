//! Merging client declarations into one load specification
//!
//! Dimensions are checked in a fixed order (method, v4shim, pseudo-elements,
//! version) and the first conflict found is the one reported.

use std::convert::Infallible;

use semver::Version;
use tracing::{debug, warn};

use crate::requirements::types::{
    ClientRequirement, ConflictReport, LoadSpec, Method, Preference, RequirementKind,
};
use crate::version::range::{VersionConstraint, select_best_version};

/// Merge declarations into a [`LoadSpec`], or report the first conflict.
///
/// `candidates` must be ordered from newest to oldest; the first one
/// satisfying every client's range is chosen. Pro is enabled only when it
/// is available and at least one client asked for it.
pub fn merge(
    requirements: &[ClientRequirement],
    candidates: &[Version],
    pro_available: bool,
) -> Result<LoadSpec, ConflictReport> {
    match merge_with(
        requirements,
        || Ok::<_, Infallible>(candidates.to_vec()),
        pro_available,
    ) {
        Ok(merged) => merged,
        Err(never) => match never {},
    }
}

/// Like [`merge`], but candidates are only requested once method, v4shim
/// and pseudo-elements have merged cleanly.
///
/// An error from `candidates` is returned as the outer `Err`; conflicts on
/// the earlier dimensions are reported without calling it.
pub fn merge_with<E>(
    requirements: &[ClientRequirement],
    candidates: impl FnOnce() -> Result<Vec<Version>, E>,
    pro_available: bool,
) -> Result<Result<LoadSpec, ConflictReport>, E> {
    let conflict = |kind| -> Result<Result<LoadSpec, ConflictReport>, E> {
        Ok(Err(ConflictReport::new(kind, requirements)))
    };

    let Some(method) = merge_method(requirements) else {
        return conflict(RequirementKind::Method);
    };

    let Some(v4shim) = merge_preference(requirements.iter().filter_map(|r| r.v4shim)) else {
        return conflict(RequirementKind::V4shim);
    };
    let v4shim = v4shim.unwrap_or(true);

    let Some(pseudo_elements) =
        merge_preference(requirements.iter().filter_map(|r| r.pseudo_elements))
    else {
        return conflict(RequirementKind::PseudoElements);
    };
    if method == Method::Webfont && pseudo_elements == Some(false) {
        // Webfont CSS always honors pseudo-elements; the flag cannot switch them off
        warn!("Pseudo-elements are forbidden but cannot be disabled with the webfont method");
    }
    let pseudo_elements = pseudo_elements.unwrap_or(method == Method::Webfont);

    let candidates = candidates()?;
    let Some(version) = merge_version(requirements, &candidates) else {
        return conflict(RequirementKind::Version);
    };

    let pro = pro_available && requirements.iter().any(|r| r.pro == Some(true));

    let spec = LoadSpec {
        method,
        v4shim,
        pseudo_elements,
        pro,
        version: version.to_string(),
    };
    debug!("Merged {} client requirements into {:?}", requirements.len(), spec);

    Ok(Ok(spec))
}

/// None on conflict; default webfont when nobody cares
fn merge_method(requirements: &[ClientRequirement]) -> Option<Method> {
    let mut declared = requirements.iter().filter_map(|r| r.method);

    match declared.next() {
        None => Some(Method::default()),
        Some(first) => declared.all(|m| m == first).then_some(first),
    }
}

/// Outer None on require/forbid clash, inner None when nobody cares
fn merge_preference(preferences: impl Iterator<Item = Preference>) -> Option<Option<bool>> {
    let mut required = false;
    let mut forbidden = false;

    for preference in preferences {
        match preference {
            Preference::Require => required = true,
            Preference::Forbid => forbidden = true,
        }
    }

    match (required, forbidden) {
        (true, true) => None,
        (true, false) => Some(Some(true)),
        (false, true) => Some(Some(false)),
        (false, false) => Some(None),
    }
}

/// None when no candidate satisfies every declared range
fn merge_version(requirements: &[ClientRequirement], candidates: &[Version]) -> Option<Version> {
    let ranges = requirements
        .iter()
        .filter_map(|r| r.version.as_deref())
        .map(|range| VersionConstraint::parse(range).ok())
        .collect::<Option<Vec<_>>>()?;

    select_best_version(&ranges, candidates)
}
