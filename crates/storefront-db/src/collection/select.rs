//! # Select Builder
//!
//! A small SELECT model that collections mutate filter by filter and render
//! into a `sqlx::QueryBuilder` when they load.
//!
//! ## Why Not Build SQL Strings Directly?
//! Collections need to ask "is this join already there?" and tests need to
//! count joins. Keeping joins and predicates as data makes both trivial,
//! and all values still go through bind parameters.
//!
//! ## Rendered Shape
//! ```text
//! SELECT main_table.*, link.store_id, link.theme_id
//! FROM core_layout_update AS main_table
//! INNER JOIN core_layout_link AS link ON link.layout_update_id = main_table.layout_update_id
//! WHERE (link.theme_id = ?) AND (link.store_id = ?)
//! ORDER BY main_table.sort_order ASC
//! LIMIT ?
//! ```

use sqlx::{QueryBuilder, Sqlite};

/// Alias every collection uses for its own table.
pub const MAIN_TABLE: &str = "main_table";

// =============================================================================
// Building Blocks
// =============================================================================

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// One joined table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    /// Raw ON expression; never contains user input.
    pub on: String,
    /// Columns of the joined table added to the projection.
    pub columns: Vec<String>,
}

/// A bound value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Int(i64),
    Text(String),
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        BindValue::Int(value)
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Text(value)
    }
}

/// Comparison applied to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOperator {
    Eq(BindValue),
    Neq(BindValue),
    Lt(BindValue),
    IsNull,
    NotNull,
}

/// `column <operator>`, ANDed with the other conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    pub column: String,
    pub operator: QueryOperator,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

// =============================================================================
// Select
// =============================================================================

/// Mutable description of a single-table SELECT with joins.
#[derive(Debug, Clone)]
pub struct Select {
    table: String,
    joins: Vec<Join>,
    filters: Vec<QueryFilter>,
    order: Vec<(String, SortOrder)>,
    limit: Option<i64>,
}

impl Select {
    /// `SELECT main_table.* FROM <table> AS main_table`.
    pub fn from(table: impl Into<String>) -> Self {
        Select {
            table: table.into(),
            joins: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Adds an INNER JOIN.
    pub fn join(&mut self, table: &str, alias: &str, on: &str, columns: &[&str]) -> &mut Self {
        self.push_join(JoinKind::Inner, table, alias, on, columns)
    }

    /// Adds a LEFT JOIN.
    pub fn left_join(&mut self, table: &str, alias: &str, on: &str, columns: &[&str]) -> &mut Self {
        self.push_join(JoinKind::Left, table, alias, on, columns)
    }

    fn push_join(
        &mut self,
        kind: JoinKind,
        table: &str,
        alias: &str,
        on: &str,
        columns: &[&str],
    ) -> &mut Self {
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            alias: alias.to_string(),
            on: on.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// Adds `column <operator>` to the WHERE clause.
    pub fn filter(&mut self, column: &str, operator: QueryOperator) -> &mut Self {
        self.filters.push(QueryFilter {
            column: column.to_string(),
            operator,
        });
        self
    }

    /// Appends an ORDER BY term.
    pub fn order_by(&mut self, column: &str, direction: SortOrder) -> &mut Self {
        self.order.push((column.to_string(), direction));
        self
    }

    /// Sets or clears the LIMIT.
    pub fn limit(&mut self, limit: Option<i64>) -> &mut Self {
        self.limit = limit;
        self
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn filters(&self) -> &[QueryFilter] {
        &self.filters
    }

    /// Number of joins of `kind` against `table`.
    pub fn join_count(&self, kind: JoinKind, table: &str) -> usize {
        self.joins
            .iter()
            .filter(|j| j.kind == kind && j.table == table)
            .count()
    }

    /// Renders the query with `?` placeholders and the values bound.
    pub fn build(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(MAIN_TABLE).push(".*");
        for join in &self.joins {
            for column in &join.columns {
                qb.push(", ").push(&join.alias).push(".").push(column);
            }
        }

        qb.push(" FROM ").push(&self.table).push(" AS ").push(MAIN_TABLE);

        for join in &self.joins {
            qb.push(" ")
                .push(join.kind.keyword())
                .push(" ")
                .push(&join.table)
                .push(" AS ")
                .push(&join.alias)
                .push(" ON ")
                .push(&join.on);
        }

        for (i, filter) in self.filters.iter().enumerate() {
            qb.push(if i == 0 { " WHERE (" } else { " AND (" });
            qb.push(&filter.column);
            match &filter.operator {
                QueryOperator::Eq(value) => {
                    qb.push(" = ");
                    push_value(&mut qb, value);
                }
                QueryOperator::Neq(value) => {
                    qb.push(" <> ");
                    push_value(&mut qb, value);
                }
                QueryOperator::Lt(value) => {
                    qb.push(" < ");
                    push_value(&mut qb, value);
                }
                QueryOperator::IsNull => {
                    qb.push(" IS NULL");
                }
                QueryOperator::NotNull => {
                    qb.push(" IS NOT NULL");
                }
            }
            qb.push(")");
        }

        for (i, (column, direction)) in self.order.iter().enumerate() {
            qb.push(if i == 0 { " ORDER BY " } else { ", " });
            qb.push(column);
            qb.push(match direction {
                SortOrder::Asc => " ASC",
                SortOrder::Desc => " DESC",
            });
        }

        if let Some(limit) = self.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        qb
    }

    /// The SQL text [`Select::build`] would execute.
    pub fn to_sql(&self) -> String {
        self.build().sql().to_string()
    }
}

fn push_value(qb: &mut QueryBuilder<'static, Sqlite>, value: &BindValue) {
    match value {
        BindValue::Int(v) => {
            qb.push_bind(*v);
        }
        BindValue::Text(v) => {
            qb.push_bind(v.clone());
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
