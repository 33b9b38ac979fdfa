//! Transformer and inspection listings: search, filters, ordering, counts.

use std::cmp::Ordering;

use regex::Regex;
use thermal_inspect_common::types::{Inspection, InspectionStatus, Transformer};

/// Filter value meaning "no filter".
pub const ALL: &str = "All";

lazy_static::lazy_static! {
    static ref DIGITS_RE: Regex = Regex::new(r"\d+").unwrap();
    static ref CHUNK_RE: Regex = Regex::new(r"\d+|\D+").unwrap();
}

#[derive(Debug, Clone, Default)]
pub struct TransformerFilter {
    pub search: String,
    pub region: Option<String>,
    pub transformer_type: Option<String>,
}

impl TransformerFilter {
    /// Builds a filter from UI-style values where `"All"` or blank disables a field.
    pub fn new(search: &str, region: &str, transformer_type: &str) -> Self {
        Self {
            search: search.to_string(),
            region: selection(region),
            transformer_type: selection(transformer_type),
        }
    }

    pub fn matches(&self, t: &Transformer) -> bool {
        let q = self.search.trim().to_lowercase();
        if !q.is_empty() {
            let hit = [&t.transformer_no, &t.pole_no, &t.region, &t.transformer_type]
                .iter()
                .any(|f| f.to_lowercase().contains(&q));
            if !hit {
                return false;
            }
        }
        if let Some(want) = &self.region {
            if t.region.to_lowercase() != want.to_lowercase() {
                return false;
            }
        }
        if let Some(want) = &self.transformer_type {
            if t.transformer_type.to_lowercase() != want.to_lowercase() {
                return false;
            }
        }
        true
    }

    /// Matching transformers ordered by transformer number.
    pub fn apply<'a>(&self, transformers: &'a [Transformer]) -> Vec<&'a Transformer> {
        let mut out: Vec<&Transformer> = transformers.iter().filter(|t| self.matches(t)).collect();
        out.sort_by(|a, b| compare_transformer_no(&a.transformer_no, &b.transformer_no));
        out
    }
}

fn selection(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(ALL) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Orders transformer numbers so that "T-2" sorts before "T-10".
///
/// When both numbers share the same non-digit skeleton, the first digit run
/// decides; otherwise digit runs compare numerically and text case-insensitively.
pub fn compare_transformer_no(a: &str, b: &str) -> Ordering {
    let skeleton_a = DIGITS_RE.replace_all(a, "");
    let skeleton_b = DIGITS_RE.replace_all(b, "");
    let first_a = DIGITS_RE.find(a).map(|m| m.as_str());
    let first_b = DIGITS_RE.find(b).map(|m| m.as_str());
    if skeleton_a == skeleton_b && (first_a.is_some() || first_b.is_some()) {
        let ord = compare_digits(first_a.unwrap_or("0"), first_b.unwrap_or("0"));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    natural_cmp(a, b)
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = CHUNK_RE.find_iter(a).map(|m| m.as_str());
    let mut right = CHUNK_RE.find_iter(b).map(|m| m.as_str());
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let numeric = x.starts_with(|c: char| c.is_ascii_digit())
                    && y.starts_with(|c: char| c.is_ascii_digit());
                let ord = if numeric {
                    compare_digits(x, y)
                } else {
                    x.to_lowercase().cmp(&y.to_lowercase())
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Distinct regions, sorted, for filter pickers.
pub fn regions(transformers: &[Transformer]) -> Vec<String> {
    let mut out: Vec<String> = transformers
        .iter()
        .map(|t| t.region.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();
    out.sort_by_key(|r| r.to_lowercase());
    out.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectionCounts {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub closed: usize,
}

impl InspectionCounts {
    pub fn of(inspections: &[Inspection]) -> Self {
        let count = |s: InspectionStatus| inspections.iter().filter(|i| i.status == s).count();
        Self {
            total: inspections.len(),
            open: count(InspectionStatus::Open),
            in_progress: count(InspectionStatus::InProgress),
            closed: count(InspectionStatus::Closed),
        }
    }
}

/// Inspections with the given status, or all of them.
pub fn filter_inspections(inspections: &[Inspection], status: Option<InspectionStatus>) -> Vec<&Inspection> {
    inspections
        .iter()
        .filter(|i| status.map_or(true, |s| i.status == s))
        .collect()
}
