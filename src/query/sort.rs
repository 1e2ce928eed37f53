//! Client-side sorting of an already-fetched page.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Lead;

/// Column a lead table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Lead id.
    Id,
    /// Scraped name.
    Name,
    /// Given name.
    FirstName,
    /// Family name.
    LastName,
    /// E-mail.
    Email,
    /// Job title.
    Position,
    /// Location.
    Location,
    /// Industry.
    Industry,
    /// Source group name.
    GroupName,
    /// Source activity time.
    Timestamp,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "id" => Self::Id,
            "name" => Self::Name,
            "first_name" => Self::FirstName,
            "last_name" => Self::LastName,
            "email" => Self::Email,
            "position" => Self::Position,
            "location" => Self::Location,
            "industry" => Self::Industry,
            "group_name" => Self::GroupName,
            "timestamp" => Self::Timestamp,
            other => return Err(format!("unknown sort field: {other}")),
        })
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first; missing values first.
    #[default]
    Asc,
    /// Largest first; missing values last.
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// Field plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column to sort by.
    pub field: SortField,
    /// Direction.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Creates a sort spec.
    #[must_use]
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// The order after clicking the same column header again.
    #[must_use]
    pub const fn toggled(self) -> Self {
        let direction = match self.direction {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        };
        Self {
            field: self.field,
            direction,
        }
    }
}

enum SortKey<'a> {
    Int(i64),
    Text(&'a str),
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn sort_key(lead: &Lead, field: SortField) -> Option<SortKey<'_>> {
    match field {
        SortField::Id => Some(SortKey::Int(lead.id.get())),
        SortField::Name => non_empty(&lead.name).map(SortKey::Text),
        SortField::FirstName => lead.first_name.as_deref().map(SortKey::Text),
        SortField::LastName => lead.last_name.as_deref().map(SortKey::Text),
        SortField::Email => lead.email.as_deref().map(SortKey::Text),
        SortField::Position => non_empty(&lead.position).map(SortKey::Text),
        SortField::Location => non_empty(&lead.location).map(SortKey::Text),
        SortField::Industry => non_empty(&lead.industry).map(SortKey::Text),
        SortField::GroupName => lead.group_name.as_deref().map(SortKey::Text),
        SortField::Timestamp => lead.timestamp.map(|t| SortKey::Int(t.timestamp_millis())),
    }
}

fn compare_keys(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Int(x), SortKey::Int(y)) => x.cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        // A field always yields the same key variant.
        (SortKey::Int(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Int(_)) => Ordering::Greater,
    }
}

/// Stable-sorts `leads` in place.
///
/// Missing values sort before present ones ascending and after them
/// descending. Text compares case-insensitively.
pub fn sort_leads(leads: &mut [Lead], spec: SortSpec) {
    leads.sort_by(|a, b| {
        let ordering = match (sort_key(a, spec.field), sort_key(b, spec.field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => compare_keys(&x, &y),
        };
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}
