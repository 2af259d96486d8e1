use serde_json::Value;

use super::error::FilterError;
use super::filter::valid_identifier;
use super::types::FilterOp;

/// Translates a JSON condition tree into a parameterized SQL WHERE clause.
///
/// Field conditions are `{ column: value }` (implicit equality) or
/// `{ column: { "$op": data } }`; `$and` / `$or` / `$not` combine subtrees.
pub struct FilterWhere {
    params: Vec<Value>,
    base_index: usize,
}

impl FilterWhere {
    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut builder = Self {
            params: vec![],
            base_index: starting_param_index,
        };
        let clause = builder.build_node(where_data)?;
        Ok((clause, builder.params))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        if where_data.is_null() {
            return Ok(());
        }
        match where_data {
            Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause(
                "WHERE must be an object".to_string(),
            )),
        }
    }

    fn build_node(&mut self, node: &Value) -> Result<String, FilterError> {
        let obj = match node {
            Value::Object(obj) => obj,
            _ => {
                return Err(FilterError::InvalidWhereClause(
                    "Unsupported WHERE format".to_string(),
                ))
            }
        };

        let mut parts = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                parts.push(self.build_logical(key, value)?);
            } else {
                parts.extend(self.build_field(key, value)?);
            }
        }

        Ok(parts.join(" AND "))
    }

    fn build_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData(format!("{} requires an array", op))
                })?;
                if arr.is_empty() {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "{} requires a non-empty array",
                        op
                    )));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                let subclauses = arr
                    .iter()
                    .map(|v| self.build_node(v).map(|sql| format!("({})", sql)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(subclauses.join(joiner))
            }
            "$not" => {
                let inner = self.build_node(value)?;
                Ok(format!("NOT ({})", inner))
            }
            other => Err(FilterError::UnsupportedOperator(other.to_string())),
        }
    }

    fn build_field(&mut self, column: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        if !valid_identifier(column) {
            return Err(FilterError::InvalidColumn(column.to_string()));
        }

        if let Value::Object(ops) = value {
            let mut parts = Vec::new();
            for (op_key, op_val) in ops {
                let op = Self::map_operator(op_key)?;
                parts.push(self.build_condition(column, &op, op_val)?);
            }
            Ok(parts)
        } else {
            // Implicit equality: { column: value }
            Ok(vec![self.build_condition(column, &FilterOp::Eq, value)?])
        }
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$between" => FilterOp::Between,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_condition(
        &mut self,
        column: &str,
        op: &FilterOp,
        data: &Value,
    ) -> Result<String, FilterError> {
        let quoted = format!("\"{}\"", column);
        match op {
            FilterOp::Eq => {
                if data.is_null() {
                    Ok(format!("{} IS NULL", quoted))
                } else {
                    Ok(format!("{} = {}", quoted, self.param(data.clone())))
                }
            }
            FilterOp::Ne => {
                if data.is_null() {
                    Ok(format!("{} IS NOT NULL", quoted))
                } else {
                    Ok(format!("{} <> {}", quoted, self.param(data.clone())))
                }
            }
            FilterOp::Gt => Ok(format!("{} > {}", quoted, self.param(data.clone()))),
            FilterOp::Gte => Ok(format!("{} >= {}", quoted, self.param(data.clone()))),
            FilterOp::Lt => Ok(format!("{} < {}", quoted, self.param(data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", quoted, self.param(data.clone()))),
            FilterOp::Like => Ok(format!("{} LIKE {}", quoted, self.param(data.clone()))),
            FilterOp::ILike => Ok(format!("{} ILIKE {}", quoted, self.param(data.clone()))),
            FilterOp::In => {
                let values = data.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData("$in requires an array".to_string())
                })?;
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                let placeholders: Vec<String> =
                    values.iter().map(|v| self.param(v.clone())).collect();
                Ok(format!("{} IN ({})", quoted, placeholders.join(", ")))
            }
            FilterOp::Between => {
                let values = data.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData(
                        "$between requires an array with 2 values".to_string(),
                    )
                })?;
                if values.len() != 2 {
                    return Err(FilterError::InvalidOperatorData(
                        "$between requires exactly 2 values".to_string(),
                    ));
                }
                let low = self.param(values[0].clone());
                let high = self.param(values[1].clone());
                Ok(format!("{} BETWEEN {} AND {}", quoted, low, high))
            }
            FilterOp::And | FilterOp::Or | FilterOp::Not => Err(FilterError::UnsupportedOperator(
                "logical operator in field position".to_string(),
            )),
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.base_index + self.params.len())
    }
}
