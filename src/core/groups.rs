//! Group-based transport routing
//!
//! A group binds a set of transport ids (and an optional minimum level)
//! to emissions tagged with the group's name. Emissions without any
//! defined group tag follow the [`Ungrouped`] policy.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

fn default_enabled() -> bool {
    true
}

/// Routing rule for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub transports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl GroupConfig {
    pub fn new<I, S>(transports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            transports: transports.into_iter().map(Into::into).collect(),
            level: None,
            enabled: true,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Routing policy for emissions with no defined group tag
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Ungrouped {
    /// Deliver to every transport
    #[default]
    All,
    /// Drop the emission
    None,
    /// Deliver only to these transport ids
    Transports(Vec<String>),
}

impl Serialize for Ungrouped {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Ungrouped::All => serializer.serialize_str("all"),
            Ungrouped::None => serializer.serialize_str("none"),
            Ungrouped::Transports(ids) => ids.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Ungrouped {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Keyword(String),
            List(Vec<String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Keyword(k) if k == "all" => Ok(Ungrouped::All),
            Repr::Keyword(k) if k == "none" => Ok(Ungrouped::None),
            Repr::Keyword(k) => Err(serde::de::Error::custom(format!(
                "expected \"all\", \"none\" or a list of transport ids, got \"{}\"",
                k
            ))),
            Repr::List(ids) => Ok(Ungrouped::Transports(ids)),
        }
    }
}

/// Parsed `name[:level],name2[:level2]` filter string
///
/// Names restrict the active groups; levels override the minimum level
/// of already defined groups.
///
/// ```
/// use rust_log_layer::{GroupFilter, LogLevel};
///
/// let filter: GroupFilter = "db:warn, auth".parse().unwrap();
/// assert_eq!(filter.names(), vec!["db", "auth"]);
/// assert_eq!(filter.level_for("db"), Some(LogLevel::Warn));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFilter {
    entries: Vec<(String, Option<LogLevel>)>,
}

impl GroupFilter {
    /// Parse, skipping malformed entries instead of failing
    pub fn parse_lenient(input: &str) -> Self {
        let entries = split_entries(input)
            .filter_map(|entry| parse_entry(entry).ok())
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn level_for(&self, name: &str) -> Option<LogLevel> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .and_then(|(_, level)| *level)
    }

    pub fn entries(&self) -> &[(String, Option<LogLevel>)] {
        &self.entries
    }
}

fn split_entries(input: &str) -> impl Iterator<Item = &str> {
    input.split(',').map(str::trim).filter(|e| !e.is_empty())
}

fn parse_entry(entry: &str) -> Result<(String, Option<LogLevel>)> {
    let (name, level) = match entry.split_once(':') {
        Some((name, level)) => (name.trim(), Some(level.trim())),
        None => (entry, None),
    };
    if name.is_empty() {
        return Err(LoggerError::group_filter(entry, "missing group name"));
    }
    let level = match level {
        Some(raw) => Some(
            raw.parse::<LogLevel>()
                .map_err(|_| LoggerError::group_filter(entry, format!("unknown level '{}'", raw)))?,
        ),
        None => None,
    };
    Ok((name.to_string(), level))
}

impl FromStr for GroupFilter {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        let entries = split_entries(s).map(parse_entry).collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }
}

impl fmt::Display for GroupFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .entries
            .iter()
            .map(|(name, level)| match level {
                Some(level) => format!("{}:{}", name, level.as_lowercase()),
                None => name.clone(),
            })
            .collect();
        write!(f, "{}", rendered.join(","))
    }
}

/// Which transports an emission may reach
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFilter {
    All,
    Only(BTreeSet<String>),
}

impl TransportFilter {
    #[inline]
    pub fn allows(&self, transport_id: &str) -> bool {
        match self {
            TransportFilter::All => true,
            TransportFilter::Only(ids) => ids.contains(transport_id),
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, TransportFilter::Only(ids) if ids.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
struct GroupState {
    groups: HashMap<String, GroupConfig>,
    active: Option<Vec<String>>,
    ungrouped: Ungrouped,
}

/// Runtime-mutable group routing table
///
/// Shared between a logger and its children; every change applies to
/// the next emission of all of them.
#[derive(Debug, Default)]
pub struct GroupRouter {
    state: RwLock<GroupState>,
}

impl GroupRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groups(
        groups: HashMap<String, GroupConfig>,
        active: Option<Vec<String>>,
        ungrouped: Ungrouped,
    ) -> Self {
        Self {
            state: RwLock::new(GroupState {
                groups,
                active,
                ungrouped,
            }),
        }
    }

    /// Restrict active groups and override levels from a filter string
    pub fn apply_filter(&self, filter: &GroupFilter) {
        if filter.is_empty() {
            return;
        }
        let mut state = self.state.write();
        state.active = Some(filter.names().into_iter().map(String::from).collect());
        for (name, level) in filter.entries() {
            if let (Some(level), Some(group)) = (level, state.groups.get_mut(name)) {
                group.level = Some(*level);
            }
        }
    }

    pub fn add_group(&self, name: impl Into<String>, config: GroupConfig) {
        self.state.write().groups.insert(name.into(), config);
    }

    pub fn remove_group(&self, name: &str) -> bool {
        self.state.write().groups.remove(name).is_some()
    }

    pub fn enable_group(&self, name: &str) -> bool {
        self.update(name, |g| g.enabled = true)
    }

    pub fn disable_group(&self, name: &str) -> bool {
        self.update(name, |g| g.enabled = false)
    }

    pub fn set_group_level(&self, name: &str, level: Option<LogLevel>) -> bool {
        self.update(name, |g| g.level = level)
    }

    pub fn set_active_groups<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.write().active = Some(names.into_iter().map(Into::into).collect());
    }

    pub fn clear_active_groups(&self) {
        self.state.write().active = None;
    }

    pub fn set_ungrouped(&self, ungrouped: Ungrouped) {
        self.state.write().ungrouped = ungrouped;
    }

    /// Copy of every group definition
    pub fn groups(&self) -> HashMap<String, GroupConfig> {
        self.state.read().groups.clone()
    }

    pub fn group(&self, name: &str) -> Option<GroupConfig> {
        self.state.read().groups.get(name).cloned()
    }

    pub fn active_groups(&self) -> Option<Vec<String>> {
        self.state.read().active.clone()
    }

    pub fn ungrouped(&self) -> Ungrouped {
        self.state.read().ungrouped.clone()
    }

    fn update(&self, name: &str, f: impl FnOnce(&mut GroupConfig)) -> bool {
        match self.state.write().groups.get_mut(name) {
            Some(group) => {
                f(group);
                true
            }
            None => false,
        }
    }

    /// Compute the transports an emission tagged with `tags` may reach
    pub fn route(&self, tags: &[String], level: LogLevel) -> TransportFilter {
        let state = self.state.read();

        let mut grouped = false;
        let mut eligible = BTreeSet::new();
        for tag in tags {
            let Some(group) = state.groups.get(tag) else {
                continue;
            };
            grouped = true;

            if !group.enabled {
                continue;
            }
            if let Some(active) = &state.active {
                if !active.iter().any(|a| a == tag) {
                    continue;
                }
            }
            if group.level.is_some_and(|min| level < min) {
                continue;
            }
            eligible.extend(group.transports.iter().cloned());
        }

        if grouped {
            return TransportFilter::Only(eligible);
        }

        match &state.ungrouped {
            Ungrouped::All => TransportFilter::All,
            Ungrouped::None => TransportFilter::Only(BTreeSet::new()),
            Ungrouped::Transports(ids) => TransportFilter::Only(ids.iter().cloned().collect()),
        }
    }
}
