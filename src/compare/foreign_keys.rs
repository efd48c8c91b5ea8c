//! Foreign keys and relationships.
//!
//! A declared key with a constraint name is a `ForeignKey` and, where the
//! provider keeps constraint names, is matched by that name. A declared key
//! without one is a `Relationship` and is matched by shape: the same
//! referencing column set pointing at the same table. Each actual key can be
//! claimed by one declared key only.

use super::log::{CompareAttributes, CompareType};
use super::logger::{CompareLogger, CompareLogs};
use super::{join_columns, CompareSettings};
use crate::model::{qualified_name, ForeignKey, Table};

pub(super) fn compare_foreign_keys(
    declared: &Table,
    actual: &Table,
    table_display: &str,
    settings: &CompareSettings,
    logs: &mut CompareLogs,
) {
    let mut consumed = vec![false; actual.foreign_keys.len()];

    for declared_key in &declared.foreign_keys {
        let compare_type = if declared_key.name.is_some() {
            CompareType::ForeignKey
        } else {
            CompareType::Relationship
        };
        let display = display_name(declared_key);
        let mut logger =
            CompareLogger::new(compare_type, display.as_str(), logs).within_table(table_display);

        match find_match(declared_key, actual, &consumed, settings) {
            Some(index) => {
                consumed[index] = true;
                compare_matched(declared_key, &actual.foreign_keys[index], settings, &mut logger);
            }
            None => logger.not_in_database(
                Some(shape(declared_key).as_str()),
                CompareAttributes::NOT_SET,
                None,
            ),
        }
    }

    for (key, _) in actual.foreign_keys.iter().zip(&consumed).filter(|(_, c)| !**c) {
        CompareLogger::new(CompareType::ForeignKey, display_name(key), logs)
            .within_table(table_display)
            .extra_in_database(Some(shape(key).as_str()), CompareAttributes::NOT_SET, None);
    }
}

/// Index of the first unconsumed actual key the declared key maps to. A key
/// whose only candidates are already consumed has no match.
fn find_match(
    declared: &ForeignKey,
    actual: &Table,
    consumed: &[bool],
    settings: &CompareSettings,
) -> Option<usize> {
    let names = settings.name_comparison;
    let by_name = settings.capabilities.named_constraints;

    actual.foreign_keys.iter().enumerate().position(|(i, candidate)| {
        if consumed[i] {
            return false;
        }
        match (&declared.name, &candidate.name) {
            (Some(declared_name), Some(actual_name)) if by_name => {
                names.same(declared_name, actual_name)
            }
            (Some(_), None) if by_name => false,
            _ => {
                names.same_set(&declared.columns, &candidate.columns)
                    && names.same(
                        settings.effective_schema(declared.referenced_schema.as_deref()),
                        settings.effective_schema(candidate.referenced_schema.as_deref()),
                    )
                    && names.same(&declared.referenced_table, &candidate.referenced_table)
            }
        }
    })
}

fn compare_matched(
    declared: &ForeignKey,
    actual: &ForeignKey,
    settings: &CompareSettings,
    logger: &mut CompareLogger<'_>,
) {
    let names = settings.name_comparison;
    let mut different = false;

    let declared_schema = settings.effective_schema(declared.referenced_schema.as_deref());
    let actual_schema = settings.effective_schema(actual.referenced_schema.as_deref());
    if !names.same(declared_schema, actual_schema)
        || !names.same(&declared.referenced_table, &actual.referenced_table)
    {
        logger.different(
            Some(qualified_name(Some(declared_schema), &declared.referenced_table).as_str()),
            Some(qualified_name(Some(actual_schema), &actual.referenced_table).as_str()),
            CompareAttributes::PRINCIPAL_TABLE,
            None,
        );
        different = true;
    }

    if !names.same_set(&declared.columns, &actual.columns) {
        logger.different(
            Some(join_columns(&declared.columns).as_str()),
            Some(join_columns(&actual.columns).as_str()),
            CompareAttributes::COLUMN_NAMES,
            None,
        );
        different = true;
    }

    if !declared.referenced_columns.is_empty()
        && !names.same_set(&declared.referenced_columns, &actual.referenced_columns)
    {
        logger.different(
            Some(join_columns(&declared.referenced_columns).as_str()),
            Some(join_columns(&actual.referenced_columns).as_str()),
            CompareAttributes::PRINCIPAL_COLUMNS,
            None,
        );
        different = true;
    }

    different |= logger.check_different(
        Some(declared.on_delete.to_string().as_str()),
        Some(actual.on_delete.to_string().as_str()),
        CompareAttributes::DELETE_BEHAVIOR,
        None,
    );

    if !different {
        logger.mark_as_ok(Some(shape(declared).as_str()), None);
    }
}

fn display_name(key: &ForeignKey) -> String {
    match &key.name {
        Some(name) => name.clone(),
        None => shape(key),
    }
}

/// `(AuthorId) -> Authors(AuthorId)`
fn shape(key: &ForeignKey) -> String {
    let mut out = format!(
        "({}) -> {}",
        join_columns(&key.columns),
        qualified_name(key.referenced_schema.as_deref(), &key.referenced_table)
    );
    if !key.referenced_columns.is_empty() {
        out.push_str(&format!("({})", join_columns(&key.referenced_columns)));
    }
    out
}
