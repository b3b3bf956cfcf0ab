//! Package requests: a normalized package name plus a PEP 440 specifier set.

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use log::{debug, warn};
use pep440_rs::VersionSpecifiers;

use crate::error::SyncError;

/// Normalizes a package name per PEP 503: lowercase, with every run of
/// `-`, `_` and `.` collapsed to a single `-`.
pub fn normalize_name(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.chars() {
        if matches!(ch, '-' | '_' | '.') {
            pending_separator = true;
        } else {
            if pending_separator && !normalized.is_empty() {
                normalized.push('-');
            }
            pending_separator = false;
            normalized.push(ch.to_ascii_lowercase());
        }
    }
    normalized
}

/// One requested package: normalized name plus version constraint.
/// Built once per run from CLI or file input, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PackageRequest {
    pub name: String,
    pub specifiers: VersionSpecifiers,
}

impl std::fmt::Display for PackageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name, self.specifiers)
    }
}

impl FromStr for PackageRequest {
    type Err = anyhow::Error;

    /// Parses a requirement line such as `requests`, `requests>=2.0,<3.0`
    /// or `requests[security]>=2.0`. Extras are accepted and ignored;
    /// an environment marker after `;` is dropped with a warning.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();

        let line = match line.split_once(';') {
            Some((requirement, marker)) => {
                warn!(
                    "ignoring environment marker {:?} in requirement {:?}",
                    marker.trim(),
                    line
                );
                requirement.trim_end()
            }
            None => line,
        };

        // The name is the leading run of characters valid in a PEP 508 name.
        let name_end = line
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
            .unwrap_or(line.len());
        let (name, rest) = line.split_at(name_end);

        if name.is_empty() {
            return Err(anyhow!("invalid requirement {:?}: missing package name", s));
        }
        let first = name.chars().next().unwrap_or_default();
        let last = name.chars().next_back().unwrap_or_default();
        if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
            return Err(anyhow!(
                "invalid requirement {:?}: package name must start and end with a letter or digit",
                s
            ));
        }

        let mut rest = rest.trim_start();
        if rest.starts_with('[') {
            let Some(close) = rest.find(']') else {
                return Err(anyhow!("invalid requirement {:?}: unclosed extras", s));
            };
            debug!("ignoring extras {} in requirement {:?}", &rest[..=close], s);
            rest = rest[close + 1..].trim_start();
        }

        let specifiers = VersionSpecifiers::from_str(rest.trim())
            .map_err(|err| anyhow!("invalid version specifier in {:?}: {}", s, err))?;

        Ok(PackageRequest {
            name: normalize_name(name),
            specifiers,
        })
    }
}

/// The collected requests for one run, keyed by normalized name.
#[derive(Debug, Default)]
pub struct RequestSet {
    requests: BTreeMap<String, PackageRequest>,
}

impl RequestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a request from the requirements file. A name seen twice keeps
    /// the later entry.
    pub fn append(&mut self, request: PackageRequest) {
        if self.requests.contains_key(&request.name) {
            debug!("requirement {} given twice, keeping the later entry", request.name);
        }
        self.requests.insert(request.name.clone(), request);
    }

    /// Adds the command-line request. A name already present from the
    /// requirements file is a hard user error.
    pub fn insert_unique(&mut self, request: PackageRequest) -> Result<(), SyncError> {
        if self.requests.contains_key(&request.name) {
            return Err(SyncError::DuplicatePackage(request.name));
        }
        self.requests.insert(request.name.clone(), request);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PackageRequest> {
        self.requests.get(name)
    }

    /// Iterates requests in name order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageRequest> {
        self.requests.values()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
