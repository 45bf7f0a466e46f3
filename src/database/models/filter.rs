use sqlx::types::Json;
use sqlx::FromRow;

use crate::database::DatabaseError;
use crate::filter::{Association, FilterDefinition, FilterType, FilterValue};

#[derive(Debug, Clone, FromRow)]
pub struct FilterRow {
    pub id: i64,
    pub name: String,
    pub hint: Option<String>,
    pub filter_type: String,
    pub allowed_values: Json<Vec<String>>,
}

impl TryFrom<FilterRow> for FilterDefinition {
    type Error = DatabaseError;

    fn try_from(row: FilterRow) -> Result<Self, Self::Error> {
        let filter_type = row
            .filter_type
            .parse::<FilterType>()
            .map_err(|e| DatabaseError::QueryError(format!("filter {}: {}", row.id, e)))?;

        Ok(FilterDefinition {
            id: row.id,
            name: row.name,
            hint: row.hint,
            filter_type,
            values: row.allowed_values.0,
        })
    }
}

/// Association row as read from any of the three association tables, with the
/// owner column aliased to `owner_id`
#[derive(Debug, Clone, FromRow)]
pub struct AssociationRow {
    pub id: i64,
    pub owner_id: i64,
    pub filter_id: i64,
    pub value: Option<String>,
    pub range_from: Option<String>,
    pub range_to: Option<String>,
}

impl From<AssociationRow> for Association {
    fn from(row: AssociationRow) -> Self {
        Association {
            id: row.id,
            owner_id: row.owner_id,
            filter_id: row.filter_id,
            value: FilterValue {
                value: row.value,
                from: row.range_from,
                to: row.range_to,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_with_unknown_type_is_rejected() {
        let row = FilterRow {
            id: 4,
            name: "Age".into(),
            hint: None,
            filter_type: "AGE".into(),
            allowed_values: Json(vec![]),
        };
        assert!(FilterDefinition::try_from(row).is_err());
    }

    #[test]
    fn association_row_maps_range_columns() {
        let row = AssociationRow {
            id: 1,
            owner_id: 2,
            filter_id: 3,
            value: None,
            range_from: Some("18".into()),
            range_to: Some("25".into()),
        };
        let a = Association::from(row);
        assert_eq!(a.value.from.as_deref(), Some("18"));
        assert_eq!(a.value.to.as_deref(), Some("25"));
    }
}
