//! Primary keys, alternate (unique) keys and indexes.

use super::log::{CompareAttributes, CompareType};
use super::logger::{CompareLogger, CompareLogs};
use super::{join_columns, CompareSettings};
use crate::model::{Index, Table, UniqueKey};

const PRIMARY_KEY: &str = "PRIMARY KEY";

pub(super) fn compare_primary_key(
    declared: &Table,
    actual: &Table,
    table_display: &str,
    settings: &CompareSettings,
    logs: &mut CompareLogs,
) {
    let names = settings.name_comparison;
    let (declared_key, actual_key) = match (&declared.primary_key, &actual.primary_key) {
        (None, None) => return,
        (Some(declared_key), None) => {
            let name = declared_key.name.as_deref().unwrap_or(PRIMARY_KEY);
            CompareLogger::new(CompareType::PrimaryKey, name, logs)
                .within_table(table_display)
                .not_in_database(
                    Some(join_columns(&declared_key.columns).as_str()),
                    CompareAttributes::NOT_SET,
                    None,
                );
            return;
        }
        (None, Some(actual_key)) => {
            let name = actual_key.name.as_deref().unwrap_or(PRIMARY_KEY);
            CompareLogger::new(CompareType::PrimaryKey, name, logs)
                .within_table(table_display)
                .extra_in_database(
                    Some(join_columns(&actual_key.columns).as_str()),
                    CompareAttributes::NOT_SET,
                    None,
                );
            return;
        }
        (Some(declared_key), Some(actual_key)) => (declared_key, actual_key),
    };

    let name = declared_key.name.as_deref().unwrap_or(PRIMARY_KEY);
    let mut logger =
        CompareLogger::new(CompareType::PrimaryKey, name, logs).within_table(table_display);
    let mut different = false;

    if settings.capabilities.named_constraints {
        if let (Some(declared_name), Some(actual_name)) = (&declared_key.name, &actual_key.name) {
            if !names.same(declared_name, actual_name) {
                logger.different(
                    Some(declared_name.as_str()),
                    Some(actual_name.as_str()),
                    CompareAttributes::NAME,
                    None,
                );
                different = true;
            }
        }
    }

    if !names.same_set(&declared_key.columns, &actual_key.columns) {
        logger.different(
            Some(join_columns(&declared_key.columns).as_str()),
            Some(join_columns(&actual_key.columns).as_str()),
            CompareAttributes::COLUMN_NAMES,
            None,
        );
        different = true;
    }

    if !different {
        logger.mark_as_ok(Some(join_columns(&declared_key.columns).as_str()), None);
    }
}

/// Unique constraints are matched by name where the provider keeps
/// constraint names, otherwise by column set.
pub(super) fn compare_unique_keys(
    declared: &Table,
    actual: &Table,
    table_display: &str,
    settings: &CompareSettings,
    logs: &mut CompareLogs,
) {
    let names = settings.name_comparison;
    let by_name = settings.capabilities.named_constraints;
    let mut consumed = vec![false; actual.unique_keys.len()];

    for declared_key in &declared.unique_keys {
        let mut logger = CompareLogger::new(CompareType::AlternateKey, declared_key.name.as_str(), logs)
            .within_table(table_display);

        let found = actual.unique_keys.iter().enumerate().position(|(i, k)| {
            !consumed[i]
                && if by_name {
                    names.same(&k.name, &declared_key.name)
                } else {
                    names.same_set(&k.columns, &declared_key.columns)
                }
        });

        let Some(index) = found else {
            logger.not_in_database(
                Some(join_columns(&declared_key.columns).as_str()),
                CompareAttributes::NOT_SET,
                None,
            );
            continue;
        };
        consumed[index] = true;

        let actual_key: &UniqueKey = &actual.unique_keys[index];
        if names.same_set(&declared_key.columns, &actual_key.columns) {
            logger.mark_as_ok(Some(join_columns(&declared_key.columns).as_str()), None);
        } else {
            logger.different(
                Some(join_columns(&declared_key.columns).as_str()),
                Some(join_columns(&actual_key.columns).as_str()),
                CompareAttributes::COLUMN_NAMES,
                None,
            );
        }
    }

    for (key, _) in actual.unique_keys.iter().zip(&consumed).filter(|(_, c)| !**c) {
        CompareLogger::new(CompareType::AlternateKey, key.name.as_str(), logs)
            .within_table(table_display)
            .extra_in_database(
                Some(join_columns(&key.columns).as_str()),
                CompareAttributes::NOT_SET,
                None,
            );
    }
}

pub(super) fn compare_indexes(
    declared: &Table,
    actual: &Table,
    table_display: &str,
    settings: &CompareSettings,
    logs: &mut CompareLogs,
) {
    let names = settings.name_comparison;
    let mut matched = vec![false; actual.indexes.len()];

    for declared_index in &declared.indexes {
        let mut logger = CompareLogger::new(CompareType::Index, declared_index.name.as_str(), logs)
            .within_table(table_display);

        let found = actual
            .indexes
            .iter()
            .enumerate()
            .position(|(i, candidate)| {
                !matched[i] && names.same(&candidate.name, &declared_index.name)
            });
        match found {
            Some(index) => {
                matched[index] = true;
                compare_index(declared_index, &actual.indexes[index], settings, &mut logger);
            }
            None => logger.not_in_database(
                Some(join_columns(&declared_index.columns).as_str()),
                CompareAttributes::NOT_SET,
                None,
            ),
        }
    }

    for (index, _) in actual.indexes.iter().zip(&matched).filter(|(_, m)| !**m) {
        CompareLogger::new(CompareType::Index, index.name.as_str(), logs)
            .within_table(table_display)
            .extra_in_database(
                Some(join_columns(&index.columns).as_str()),
                CompareAttributes::NOT_SET,
                None,
            );
    }
}

fn compare_index(
    declared: &Index,
    actual: &Index,
    settings: &CompareSettings,
    logger: &mut CompareLogger<'_>,
) {
    let mut different = false;

    if !settings.name_comparison.same_set(&declared.columns, &actual.columns) {
        logger.different(
            Some(join_columns(&declared.columns).as_str()),
            Some(join_columns(&actual.columns).as_str()),
            CompareAttributes::COLUMN_NAMES,
            None,
        );
        different = true;
    }

    different |= logger.check_different(
        Some(uniqueness_text(declared.unique)),
        Some(uniqueness_text(actual.unique)),
        CompareAttributes::UNIQUE,
        None,
    );

    if let Some(method) = declared.method {
        different |= logger.check_different(
            Some(method.to_string().as_str()),
            actual.method.map(|m| m.to_string()).as_deref(),
            CompareAttributes::INDEX_METHOD,
            None,
        );
    }

    if !different {
        logger.mark_as_ok(Some(join_columns(&declared.columns).as_str()), None);
    }
}

fn uniqueness_text(unique: bool) -> &'static str {
    if unique {
        "UNIQUE"
    } else {
        "NOT UNIQUE"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::CompareState;
    use crate::introspect::Provider;
    use crate::model::{IndexMethod, PrimaryKey};

    fn key(name: Option<&str>, columns: &[&str]) -> PrimaryKey {
        PrimaryKey {
            name: name.map(str::to_string),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn unique(name: &str, columns: &[&str]) -> UniqueKey {
        UniqueKey {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn index(name: &str, columns: &[&str], unique: bool, method: Option<IndexMethod>) -> Index {
        Index {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique,
            method,
        }
    }

    fn states(logs: &CompareLogs) -> Vec<(CompareType, CompareState, &str, CompareAttributes)> {
        logs.iter()
            .map(|l| (l.compare_type(), l.state(), l.name(), l.attributes()))
            .collect()
    }

    #[test]
    fn composite_primary_key_ignores_column_order() {
        let mut declared = Table::new(None, "BookAuthors");
        declared.primary_key = Some(key(Some("PK_BookAuthors"), &["BookId", "AuthorId"]));
        let mut actual = Table::new(Some("public"), "BookAuthors");
        actual.primary_key = Some(key(Some("PK_BookAuthors"), &["AuthorId", "BookId"]));

        let mut logs = CompareLogs::new();
        let settings = CompareSettings::for_provider(Provider::Postgres);
        compare_primary_key(&declared, &actual, "BookAuthors", &settings, &mut logs);

        assert_eq!(
            states(&logs),
            vec![(
                CompareType::PrimaryKey,
                CompareState::Ok,
                "PK_BookAuthors",
                CompareAttributes::NOT_SET
            )]
        );
    }

    #[test]
    fn primary_key_name_checked_only_with_named_constraints() {
        let mut declared = Table::new(None, "Books");
        declared.primary_key = Some(key(Some("PK_Books"), &["BookId"]));
        let mut actual = Table::new(Some("public"), "Books");
        actual.primary_key = Some(key(Some("books_pkey"), &["BookId"]));

        let mut logs = CompareLogs::new();
        let settings = CompareSettings::for_provider(Provider::Postgres);
        compare_primary_key(&declared, &actual, "Books", &settings, &mut logs);

        let log = &logs.as_slice()[0];
        assert_eq!(log.state(), CompareState::Different);
        assert_eq!(log.attributes(), CompareAttributes::NAME);
        assert_eq!(log.found(), Some("books_pkey"));

        let mut logs = CompareLogs::new();
        let mut unnamed = actual.clone();
        unnamed.primary_key = Some(key(None, &["BookId"]));
        compare_primary_key(&declared, &unnamed, "Books", &settings, &mut logs);
        assert_eq!(logs.as_slice()[0].state(), CompareState::Ok);
    }

    #[test]
    fn primary_key_presence() {
        let mut declared = Table::new(None, "Books");
        declared.primary_key = Some(key(None, &["BookId"]));
        let actual = Table::new(Some("main"), "Books");
        let settings = CompareSettings::for_provider(Provider::Sqlite);

        let mut logs = CompareLogs::new();
        compare_primary_key(&declared, &actual, "Books", &settings, &mut logs);
        compare_primary_key(&actual, &declared, "Books", &settings, &mut logs);
        compare_primary_key(&actual, &actual, "Books", &settings, &mut logs);

        assert_eq!(
            states(&logs),
            vec![
                (
                    CompareType::PrimaryKey,
                    CompareState::NotInDatabase,
                    PRIMARY_KEY,
                    CompareAttributes::NOT_SET
                ),
                (
                    CompareType::PrimaryKey,
                    CompareState::ExtraInDatabase,
                    PRIMARY_KEY,
                    CompareAttributes::NOT_SET
                ),
            ]
        );
    }

    #[test]
    fn unique_keys_match_by_columns_without_constraint_names() {
        let mut declared = Table::new(None, "Books");
        declared.unique_keys = vec![unique("AK_Books_Isbn", &["Isbn"]), unique("AK_Books_Slug", &["Slug"])];
        let mut actual = Table::new(Some("main"), "Books");
        actual.unique_keys = vec![
            unique("sqlite_autoindex_Books_1", &["isbn"]),
            unique("sqlite_autoindex_Books_2", &["Code"]),
        ];

        let mut logs = CompareLogs::new();
        let settings = CompareSettings::for_provider(Provider::Sqlite);
        compare_unique_keys(&declared, &actual, "Books", &settings, &mut logs);

        assert_eq!(
            states(&logs),
            vec![
                (CompareType::AlternateKey, CompareState::Ok, "AK_Books_Isbn", CompareAttributes::NOT_SET),
                (
                    CompareType::AlternateKey,
                    CompareState::NotInDatabase,
                    "AK_Books_Slug",
                    CompareAttributes::NOT_SET
                ),
                (
                    CompareType::AlternateKey,
                    CompareState::ExtraInDatabase,
                    "sqlite_autoindex_Books_2",
                    CompareAttributes::NOT_SET
                ),
            ]
        );
    }

    #[test]
    fn named_unique_key_reports_column_drift() {
        let mut declared = Table::new(None, "Books");
        declared.unique_keys = vec![unique("AK_Books_Isbn", &["Isbn"])];
        let mut actual = Table::new(Some("public"), "Books");
        actual.unique_keys = vec![unique("AK_Books_Isbn", &["Isbn", "Edition"])];

        let mut logs = CompareLogs::new();
        let settings = CompareSettings::for_provider(Provider::Postgres);
        compare_unique_keys(&declared, &actual, "Books", &settings, &mut logs);

        let log = &logs.as_slice()[0];
        assert_eq!(log.state(), CompareState::Different);
        assert_eq!(log.attributes(), CompareAttributes::COLUMN_NAMES);
        assert_eq!(log.expected(), Some("Isbn"));
        assert_eq!(log.found(), Some("Isbn, Edition"));
    }

    #[test]
    fn index_facets() {
        let mut declared = Table::new(None, "Books");
        declared.indexes = vec![
            index("IX_Books_Title", &["Title"], true, Some(IndexMethod::Hash)),
            index("IX_Books_Price", &["Price"], false, None),
            index("IX_Books_Isbn", &["Isbn"], false, None),
        ];
        let mut actual = Table::new(Some("public"), "Books");
        actual.indexes = vec![
            index("IX_Books_Price", &["Price"], false, Some(IndexMethod::BTree)),
            index("IX_Books_Title", &["Title"], false, Some(IndexMethod::BTree)),
            index("IX_Books_Legacy", &["Code"], false, Some(IndexMethod::BTree)),
        ];

        let mut logs = CompareLogs::new();
        let settings = CompareSettings::for_provider(Provider::Postgres);
        compare_indexes(&declared, &actual, "Books", &settings, &mut logs);

        assert_eq!(
            states(&logs),
            vec![
                (CompareType::Index, CompareState::Different, "IX_Books_Title", CompareAttributes::UNIQUE),
                (
                    CompareType::Index,
                    CompareState::Different,
                    "IX_Books_Title",
                    CompareAttributes::INDEX_METHOD
                ),
                (CompareType::Index, CompareState::Ok, "IX_Books_Price", CompareAttributes::NOT_SET),
                (
                    CompareType::Index,
                    CompareState::NotInDatabase,
                    "IX_Books_Isbn",
                    CompareAttributes::NOT_SET
                ),
                (
                    CompareType::Index,
                    CompareState::ExtraInDatabase,
                    "IX_Books_Legacy",
                    CompareAttributes::NOT_SET
                ),
            ]
        );
        assert_eq!(logs.as_slice()[0].expected(), Some("UNIQUE"));
        assert_eq!(logs.as_slice()[1].found(), Some("btree"));
    }

    #[test]
    fn one_actual_index_is_claimed_once() {
        let mut declared = Table::new(None, "Books");
        declared.indexes = vec![
            index("IX_T", &["Title"], false, None),
            index("IX_T", &["Title"], false, None),
        ];
        let mut actual = Table::new(Some("public"), "Books");
        actual.indexes = vec![index("IX_T", &["Title"], false, Some(IndexMethod::BTree))];

        let mut logs = CompareLogs::new();
        let settings = CompareSettings::for_provider(Provider::Postgres);
        compare_indexes(&declared, &actual, "Books", &settings, &mut logs);

        assert_eq!(
            states(&logs),
            vec![
                (CompareType::Index, CompareState::Ok, "IX_T", CompareAttributes::NOT_SET),
                (
                    CompareType::Index,
                    CompareState::NotInDatabase,
                    "IX_T",
                    CompareAttributes::NOT_SET
                ),
            ]
        );
    }
}
