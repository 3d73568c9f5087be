use std::sync::Arc;

use async_trait::async_trait;

use crate::clauses::WhereClause;
use crate::error::Result;
use crate::querier::Querier;
use crate::types::{QueryResult, SqlValue};

/// Optional query-construction helper attached to a driver by name.
///
/// The facade hands the builder its [`Querier`] once at selection time, then calls
/// [`QueryBuilder::reset`] before every [`QueryBuilder::table`] so each query
/// starts from a clean state.
#[async_trait]
pub trait QueryBuilder: Send + Sync {
    /// Gives the builder the querier its queries run on.
    fn attach(&mut self, querier: Querier);

    /// Forgets tables, columns, conditions and limit.
    fn reset(&mut self);

    fn table(&mut self, tables: &[&str]) -> &mut dyn QueryBuilder;

    fn columns(&mut self, columns: &[&str]) -> &mut dyn QueryBuilder;

    /// Adds a condition, AND-ed with any existing one.
    fn filter(&mut self, clause: WhereClause) -> &mut dyn QueryBuilder;

    fn limit(&mut self, n: u64) -> &mut dyn QueryBuilder;

    /// SQL template with `?` placeholders and the values for them.
    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)>;

    /// Binds and executes the built query through the attached querier.
    async fn get(&mut self) -> Result<Arc<QueryResult>>;
}
