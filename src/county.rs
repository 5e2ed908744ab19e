// 🏷️ County Identity - GEOID codes, display names, combined pair keys
//
// Names and locations live in two independent reference tables that only share
// the 5-digit code. Nothing here fails on a missing code: callers get an Option
// or a placeholder label.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Width of a county GEOID ("36061")
pub const COUNTY_CODE_LEN: usize = 5;

/// Split a combined key into (origin, destination) by position.
///
/// There is no delimiter between the halves, so this is only correct for
/// fixed-width 5-digit codes. Shorter keys behave like slicing: a 5-digit key
/// yields an empty destination.
pub fn split_combined_code(key: &str) -> (&str, &str) {
    match key.char_indices().nth(COUNTY_CODE_LEN) {
        Some((idx, _)) => key.split_at(idx),
        None => (key, ""),
    }
}

/// Which way people moved relative to a county
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::In => "In-Migration",
            Direction::Out => "Out-Migration",
        }
    }
}

/// Placeholder shown when a code has no entry in the name table
pub fn unknown_label(raw_key: &str) -> String {
    format!("Unknown ({})", raw_key)
}

// ============================================================================
// NAME TABLE
// ============================================================================

/// Code → display name table, keeping the source file's order.
///
/// The order matters: the county selector lists names exactly as the table
/// stores them, and a name that appears twice resolves to its first code.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CountyNames {
    order: Vec<String>,
    #[serde(skip)]
    by_code: HashMap<String, String>,
}

impl CountyNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (code, name) pairs. A repeated code keeps its first position
    /// but takes the later name, like re-assigning a dictionary key.
    pub fn from_pairs<I, C, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let mut names = Self::new();
        for (code, name) in pairs {
            names.insert(code.into(), name.into());
        }
        names
    }

    pub fn insert(&mut self, code: String, name: String) {
        if !self.by_code.contains_key(&code) {
            self.order.push(code.clone());
        }
        self.by_code.insert(code, name);
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.by_code.get(code).map(String::as_str)
    }

    /// Name for `code`, or `Unknown (<raw_key>)` when the table has no entry.
    pub fn label_or_unknown(&self, code: &str, raw_key: &str) -> String {
        match self.get(code) {
            Some(name) => name.to_string(),
            None => unknown_label(raw_key),
        }
    }

    /// Display names in table order (the county selector options)
    pub fn options(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter_map(|code| self.get(code))
            .collect()
    }

    /// Position of the first option equal to `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.options().iter().position(|option| *option == name)
    }

    /// Code behind the first option equal to `name`
    pub fn code_of(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.order[idx].as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .filter_map(move |code| self.get(code).map(|name| (code.as_str(), name)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
