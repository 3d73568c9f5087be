use std::sync::Arc;

use async_trait::async_trait;

use crate::clauses::WhereClause;
use crate::error::{DbError, Result};
use crate::querier::Querier;
use crate::traits::QueryBuilder;
use crate::types::{QueryResult, SqlValue};

/// Builds `SELECT` statements with `?` placeholders and runs them through
/// the attached [`Querier`].
#[derive(Default)]
pub struct SelectBuilder {
    querier: Option<Querier>,
    tables: Vec<String>,
    columns: Vec<String>,
    where_clause: Option<WhereClause>,
    limit: Option<u64>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boxed constructor for registry use.
    pub fn boxed() -> Box<dyn QueryBuilder> {
        Box::new(Self::new())
    }
}

#[async_trait]
impl QueryBuilder for SelectBuilder {
    fn attach(&mut self, querier: Querier) {
        self.querier = Some(querier);
    }

    fn reset(&mut self) {
        self.tables.clear();
        self.columns.clear();
        self.where_clause = None;
        self.limit = None;
    }

    fn table(&mut self, tables: &[&str]) -> &mut dyn QueryBuilder {
        self.tables.extend(tables.iter().map(|t| t.to_string()));
        self
    }

    fn columns(&mut self, columns: &[&str]) -> &mut dyn QueryBuilder {
        self.columns.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    fn filter(&mut self, clause: WhereClause) -> &mut dyn QueryBuilder {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(clause),
            None => clause,
        });
        self
    }

    fn limit(&mut self, n: u64) -> &mut dyn QueryBuilder {
        self.limit = Some(n);
        self
    }

    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        if self.tables.is_empty() {
            return Err(DbError::Builder("no table selected".to_string()));
        }

        let mut sql = String::with_capacity(256);
        let mut params = Vec::new();

        // SELECT clause
        sql.push_str("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }

        // FROM clause
        sql.push_str(" FROM ");
        sql.push_str(&self.tables.join(", "));

        // WHERE clause
        if let Some(ref where_clause) = self.where_clause {
            sql.push_str(" WHERE ");
            let where_sql = where_clause.build_sql(&mut params);
            sql.push_str(&where_sql);
        }

        // LIMIT clause
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&limit.to_string());
        }

        Ok((sql, params))
    }

    async fn get(&mut self) -> Result<Arc<QueryResult>> {
        let querier = self.querier.as_ref().ok_or(DbError::NoDriver)?;
        let (sql, params) = self.to_sql()?;
        querier.query(&sql, &params).await
    }
}
