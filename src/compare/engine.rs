use super::log::{CompareAttributes, CompareType};
use super::logger::{CompareLogger, CompareLogs};
use super::{columns, foreign_keys, keys, CompareOutcome, CompareSettings, ConstructError};
use crate::model::{qualified_name, DatabaseSchema, Table};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Compares every declared table against the introspected schema.
pub fn compare_schemas(
    declared: &DatabaseSchema,
    actual: &DatabaseSchema,
    settings: &CompareSettings,
) -> CompareOutcome {
    info!(
        provider = %settings.capabilities.provider,
        declared_tables = declared.tables.len(),
        actual_tables = actual.tables.len(),
        "comparing schemas"
    );

    let actual_by_key = index_tables(actual, settings);
    let mut matched: HashSet<usize> = HashSet::new();
    let mut outcome = CompareOutcome::default();

    for declared_table in &declared.tables {
        let table_display =
            qualified_name(declared_table.schema.as_deref(), &declared_table.name);
        let found = actual_by_key.get(&table_key(declared_table, settings)).copied();
        if let Some(index) = found {
            matched.insert(index);
        }

        if let Err(message) = check_supported(declared_table, settings) {
            warn!(table = %table_display, %message, "skipping table");
            outcome.construct_errors.push(ConstructError {
                table: table_display,
                message,
            });
            continue;
        }

        match found {
            Some(index) => {
                let table_logs = compare_table(declared_table, &actual.tables[index], settings);
                outcome.logs.merge(table_logs);
            }
            None => {
                CompareLogger::new(CompareType::Table, table_display.as_str(), &mut outcome.logs)
                    .not_in_database(Some(table_display.as_str()), CompareAttributes::NOT_SET, None);
            }
        }
    }

    for (index, actual_table) in actual.tables.iter().enumerate() {
        if matched.contains(&index) || !settings.table_filter.includes_table(actual_table) {
            continue;
        }
        let table_display = qualified_name(actual_table.schema.as_deref(), &actual_table.name);
        CompareLogger::new(CompareType::Table, table_display.as_str(), &mut outcome.logs)
            .extra_in_database(Some(table_display.as_str()), CompareAttributes::NOT_SET, None);
    }

    info!(
        entries = outcome.logs.len(),
        construct_errors = outcome.construct_errors.len(),
        has_errors = outcome.has_errors(),
        "comparison finished"
    );
    outcome
}

fn table_key(table: &Table, settings: &CompareSettings) -> (String, String) {
    let names = settings.name_comparison;
    (
        names.key(settings.effective_schema(table.schema.as_deref())),
        names.key(&table.name),
    )
}

/// First actual table wins when two normalize to the same key.
fn index_tables(actual: &DatabaseSchema, settings: &CompareSettings) -> HashMap<(String, String), usize> {
    let mut by_key = HashMap::new();
    for (index, table) in actual.tables.iter().enumerate() {
        by_key.entry(table_key(table, settings)).or_insert(index);
    }
    by_key
}

fn check_supported(table: &Table, settings: &CompareSettings) -> Result<(), String> {
    let capabilities = &settings.capabilities;
    let provider = capabilities.provider;

    if let Some(schema) = table.schema.as_deref() {
        if !capabilities.schemas && !settings.name_comparison.same(schema, capabilities.default_schema)
        {
            return Err(format!(
                "{provider} has no schemas other than '{}', found '{schema}'",
                capabilities.default_schema
            ));
        }
    }

    if !capabilities.computed_columns {
        if let Some(column) = table.columns.iter().find(|c| c.computed_sql.is_some()) {
            return Err(format!(
                "column '{}' is computed, which {provider} cannot introspect",
                column.name
            ));
        }
    }

    if !capabilities.named_constraints {
        if let Some(name) = table.primary_key.as_ref().and_then(|pk| pk.name.as_deref()) {
            return Err(format!(
                "primary key '{name}' is named, but {provider} does not keep constraint names"
            ));
        }
    }

    for index in &table.indexes {
        if let Some(method) = index.method {
            if !capabilities.supports_index_method(method) {
                return Err(format!(
                    "index '{}' uses method '{method}', which {provider} does not support",
                    index.name
                ));
            }
        }
    }

    Ok(())
}

fn compare_table(declared: &Table, actual: &Table, settings: &CompareSettings) -> CompareLogs {
    let names = settings.name_comparison;
    let table_display = qualified_name(declared.schema.as_deref(), &declared.name);
    let mut logs = CompareLogs::new();

    {
        let mut logger = CompareLogger::new(CompareType::Table, table_display.as_str(), &mut logs);
        let declared_schema = settings.effective_schema(declared.schema.as_deref());
        let actual_schema = settings.effective_schema(actual.schema.as_deref());
        if !names.same(declared_schema, actual_schema) {
            logger.different(
                Some(declared_schema),
                Some(actual_schema),
                CompareAttributes::SCHEMA,
                None,
            );
        }
        if !names.same(&declared.name, &actual.name) {
            logger.different(
                Some(declared.name.as_str()),
                Some(actual.name.as_str()),
                CompareAttributes::NAME,
                None,
            );
        }
        if logger.log_is_empty() {
            logger.mark_as_ok(Some(table_display.as_str()), None);
        }
    }

    columns::compare_columns(declared, actual, &table_display, settings, &mut logs);
    keys::compare_primary_key(declared, actual, &table_display, settings, &mut logs);
    keys::compare_unique_keys(declared, actual, &table_display, settings, &mut logs);
    keys::compare_indexes(declared, actual, &table_display, settings, &mut logs);
    foreign_keys::compare_foreign_keys(declared, actual, &table_display, settings, &mut logs);

    logs
}
