use crate::binding::POSITIONAL_MARKER;
use crate::types::SqlValue;

/// Comparison operators supported in a WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Lt,
}

impl Comparison {
    fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Gt => ">",
            Comparison::Lt => "<",
        }
    }
}

/// Represents a WHERE clause condition.
/// Supports basic comparison operations and logical combinations.
#[derive(Debug, Clone)]
pub enum WhereClause {
    /// column <op> value
    Compare(String, Comparison, SqlValue),
    /// clause AND clause
    And(Box<WhereClause>, Box<WhereClause>),
    /// clause OR clause
    Or(Box<WhereClause>, Box<WhereClause>),
}

impl WhereClause {
    /// Creates an equality condition: column = value
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        WhereClause::Compare(column.into(), Comparison::Eq, value.into())
    }

    pub fn ne(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        WhereClause::Compare(column.into(), Comparison::Ne, value.into())
    }

    pub fn gt(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        WhereClause::Compare(column.into(), Comparison::Gt, value.into())
    }

    pub fn lt(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        WhereClause::Compare(column.into(), Comparison::Lt, value.into())
    }

    /// Combines this clause with another using AND
    pub fn and(self, other: WhereClause) -> Self {
        WhereClause::And(Box::new(self), Box::new(other))
    }

    /// Combines this clause with another using OR
    pub fn or(self, other: WhereClause) -> Self {
        WhereClause::Or(Box::new(self), Box::new(other))
    }

    /// Builds the SQL fragment with `?` placeholders, appending the values
    /// to `params` in placeholder order.
    pub fn build_sql(&self, params: &mut Vec<SqlValue>) -> String {
        match self {
            WhereClause::Compare(column, op, value) => {
                params.push(value.clone());
                format!("{} {} {}", column, op.as_sql(), POSITIONAL_MARKER)
            }
            WhereClause::And(left, right) => {
                let left_sql = left.build_sql(params);
                let right_sql = right.build_sql(params);
                format!("({}) AND ({})", left_sql, right_sql)
            }
            WhereClause::Or(left, right) => {
                let left_sql = left.build_sql(params);
                let right_sql = right.build_sql(params);
                format!("({}) OR ({})", left_sql, right_sql)
            }
        }
    }
}
