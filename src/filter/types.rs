use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::FilterError;

/// Value domain of a filter definition. Decides how range bounds are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    StringRange,
    NumberRange,
    DateRange,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::StringRange => "STRING_RANGE",
            FilterType::NumberRange => "NUMBER_RANGE",
            FilterType::DateRange => "DATE_RANGE",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STRING_RANGE" => Ok(FilterType::StringRange),
            "NUMBER_RANGE" => Ok(FilterType::NumberRange),
            "DATE_RANGE" => Ok(FilterType::DateRange),
            other => Err(FilterError::InvalidFilterType(other.to_string())),
        }
    }
}

/// Admin-managed description of a taggable attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub id: i64,
    pub name: String,
    pub hint: Option<String>,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub values: Vec<String>,
}

/// Create/update payload for a filter definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDefinitionInput {
    pub name: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

impl FilterDefinitionInput {
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.name.trim().is_empty() {
            return Err(FilterError::EmptyName);
        }
        Ok(())
    }
}

/// Value payload shared by associations and criteria: an exact `value`,
/// a `from`/`to` range, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl FilterValue {
    pub fn exact(value: impl Into<String>) -> Self {
        Self { value: Some(value.into()), ..Default::default() }
    }

    pub fn range(from: Option<impl Into<String>>, to: Option<impl Into<String>>) -> Self {
        Self {
            value: None,
            from: from.map(Into::into),
            to: to.map(Into::into),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.from.is_none() && self.to.is_none()
    }

    pub fn has_range(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }
}

/// Which entity an association row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    User,
    Child,
    Benefit,
}

impl OwnerKind {
    pub const ALL: [OwnerKind; 3] = [OwnerKind::User, OwnerKind::Child, OwnerKind::Benefit];

    pub fn table(&self) -> &'static str {
        match self {
            OwnerKind::User => "user_filters",
            OwnerKind::Child => "child_filters",
            OwnerKind::Benefit => "benefit_filters",
        }
    }

    pub fn owner_column(&self) -> &'static str {
        match self {
            OwnerKind::User => "user_id",
            OwnerKind::Child => "child_id",
            OwnerKind::Benefit => "benefit_id",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKind::User => f.write_str("user"),
            OwnerKind::Child => f.write_str("child"),
            OwnerKind::Benefit => f.write_str("benefit"),
        }
    }
}

/// A stored value (or range) linking one owner to one filter definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub id: i64,
    pub owner_id: i64,
    pub filter_id: i64,
    #[serde(flatten)]
    pub value: FilterValue,
}

/// `{filter_id, value?, from?, to?}` as supplied when tagging an owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterAssignment {
    pub filter_id: i64,
    #[serde(flatten)]
    pub value: FilterValue,
}

impl FilterAssignment {
    pub fn new(filter_id: i64, value: FilterValue) -> Self {
        Self { filter_id, value }
    }
}

/// A user's chosen value for one filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub filter_id: i64,
    pub value: String,
}

/// All selections one user has made
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFilters {
    pub user_id: i64,
    pub values: Vec<FilterSelection>,
}

/// `{filter_id, value?, from?, to?}` as supplied when narrowing a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriterion {
    pub filter_id: i64,
    #[serde(flatten)]
    pub value: FilterValue,
}

impl FilterCriterion {
    pub fn exact(filter_id: i64, value: impl Into<String>) -> Self {
        Self { filter_id, value: FilterValue::exact(value) }
    }

    pub fn range(filter_id: i64, from: Option<&str>, to: Option<&str>) -> Self {
        Self { filter_id, value: FilterValue::range(from, to) }
    }
}
