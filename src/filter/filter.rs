use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, SqlResult};

/// Builds a single parameterized SELECT from a [`FilterData`] description.
pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !valid_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select {
            self.select(select)?;
        }
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(order)?;
        }
        if let Some(limit) = data.limit {
            self.limit(limit, data.offset)?;
        }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            if column != "*" && !valid_identifier(column) {
                return Err(FilterError::InvalidColumn(column.clone()));
            }
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit(
                "Limit must be non-negative".to_string(),
            ));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset(
                    "Offset must be non-negative".to_string(),
                ));
            }
        }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let (where_clause, params) = if let Some(ref where_data) = self.where_data {
            FilterWhere::generate(where_data, 0)?
        } else {
            (String::new(), vec![])
        };
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM \"{}\"", self.table_name),
            if where_clause.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", where_clause)
            },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

/// Table and column names must be plain SQL identifiers; everything else is
/// bound as a parameter.
pub(super) fn valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_sql(data: FilterData) -> SqlResult {
        let mut filter = Filter::new("weather_readings").unwrap();
        filter.assign(data).unwrap();
        filter.to_sql().unwrap()
    }

    #[test]
    fn bare_filter_selects_everything() {
        let sql = to_sql(FilterData::default());
        assert_eq!(sql.query, "SELECT * FROM \"weather_readings\"");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn projection_quotes_columns() {
        let sql = to_sql(FilterData {
            select: Some(vec!["device_name".to_string(), "time".to_string()]),
            ..Default::default()
        });
        assert_eq!(
            sql.query,
            "SELECT \"device_name\", \"time\" FROM \"weather_readings\""
        );
    }

    #[test]
    fn implicit_equality_and_range_share_param_numbering() {
        let sql = to_sql(FilterData {
            where_clause: Some(json!({
                "device_name": "sensor-a",
                "time": { "$gte": "2024-01-01T00:00:00Z" }
            })),
            ..Default::default()
        });
        assert_eq!(
            sql.query,
            "SELECT * FROM \"weather_readings\" WHERE \"device_name\" = $1 AND \"time\" >= $2"
        );
        assert_eq!(sql.params, vec![json!("sensor-a"), json!("2024-01-01T00:00:00Z")]);
    }

    #[test]
    fn order_string_preserves_tiebreak_column_order() {
        let sql = to_sql(FilterData {
            order: Some(json!("precipitation desc, time desc")),
            limit: Some(1),
            ..Default::default()
        });
        assert_eq!(
            sql.query,
            "SELECT * FROM \"weather_readings\" ORDER BY \"precipitation\" DESC, \"time\" DESC LIMIT 1"
        );
    }

    #[test]
    fn between_binds_two_params() {
        let sql = to_sql(FilterData {
            where_clause: Some(json!({
                "time": { "$between": ["2024-01-01T00:00:00Z", "2024-02-01T00:00:00Z"] }
            })),
            ..Default::default()
        });
        assert_eq!(
            sql.query,
            "SELECT * FROM \"weather_readings\" WHERE \"time\" BETWEEN $1 AND $2"
        );
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn in_with_empty_array_matches_nothing() {
        let sql = to_sql(FilterData {
            where_clause: Some(json!({ "role": { "$in": [] } })),
            ..Default::default()
        });
        assert_eq!(sql.query, "SELECT * FROM \"weather_readings\" WHERE 1=0");
    }

    #[test]
    fn or_combines_subtrees() {
        let sql = to_sql(FilterData {
            where_clause: Some(json!({
                "$or": [
                    { "humidity": { "$gt": 90.0 } },
                    { "precipitation": { "$gt": 10.0 } }
                ]
            })),
            ..Default::default()
        });
        assert_eq!(
            sql.query,
            "SELECT * FROM \"weather_readings\" WHERE (\"humidity\" > $1) OR (\"precipitation\" > $2)"
        );
    }

    #[test]
    fn rejects_hostile_identifiers() {
        assert!(Filter::new("weather; DROP TABLE users").is_err());
        assert!(Filter::new("").is_err());

        let mut filter = Filter::new("weather_readings").unwrap();
        assert!(filter
            .select(vec!["time\" FROM users --".to_string()])
            .is_err());
        assert!(filter
            .where_clause(json!({ "bad\"col": 1 }))
            .and_then(|f| f.to_sql())
            .is_err());
    }

    #[test]
    fn rejects_negative_limit() {
        let mut filter = Filter::new("weather_readings").unwrap();
        assert!(filter.limit(-1, None).is_err());
    }

    #[test]
    fn unsupported_operator_is_an_error() {
        let mut filter = Filter::new("weather_readings").unwrap();
        filter
            .where_clause(json!({ "humidity": { "$regex": ".*" } }))
            .unwrap();
        assert!(filter.to_sql().is_err());
    }
}
