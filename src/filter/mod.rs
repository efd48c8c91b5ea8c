use glob::Pattern;

use crate::model::{qualified_name, DatabaseSchema, Table};

/// Glob filter over table names. A pattern may match either the qualified
/// `schema.table` form or the bare table name.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl TableFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, glob::PatternError> {
        let include = include
            .iter()
            .map(|s| Pattern::new(s))
            .collect::<Result<Vec<_>, _>>()?;

        let exclude = exclude
            .iter()
            .map(|s| Pattern::new(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TableFilter { include, exclude })
    }

    pub fn excluding(exclude: &[String]) -> Result<Self, glob::PatternError> {
        Self::new(&[], exclude)
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    pub fn should_include(&self, qualified_name: &str, unqualified_name: &str) -> bool {
        let matches = |p: &Pattern| p.matches(qualified_name) || p.matches(unqualified_name);

        if self.exclude.iter().any(matches) {
            return false;
        }

        if !self.include.is_empty() {
            return self.include.iter().any(matches);
        }

        true
    }

    pub fn includes_table(&self, table: &Table) -> bool {
        self.should_include(
            &qualified_name(table.schema.as_deref(), &table.name),
            &table.name,
        )
    }
}

pub fn filter_schema(schema: &DatabaseSchema, filter: &TableFilter) -> DatabaseSchema {
    DatabaseSchema {
        tables: schema
            .tables
            .iter()
            .filter(|t| filter.includes_table(t))
            .cloned()
            .collect(),
    }
}
