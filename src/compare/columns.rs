use super::log::{CompareAttributes, CompareType};
use super::logger::{CompareLogger, CompareLogs};
use super::CompareSettings;
use crate::model::{Column, Table};

pub(super) fn compare_columns(
    declared: &Table,
    actual: &Table,
    table_display: &str,
    settings: &CompareSettings,
    logs: &mut CompareLogs,
) {
    let names = settings.name_comparison;
    let mut matched = vec![false; actual.columns.len()];

    for declared_column in &declared.columns {
        let mut logger = CompareLogger::new(CompareType::Column, declared_column.name.as_str(), logs)
            .within_table(table_display);

        let found = actual
            .columns
            .iter()
            .enumerate()
            .position(|(i, c)| !matched[i] && names.same(&c.name, &declared_column.name));
        match found {
            Some(index) => {
                matched[index] = true;
                compare_column(declared_column, &actual.columns[index], &mut logger);
            }
            None => logger.not_in_database(
                Some(declared_column.store_type.as_str()),
                CompareAttributes::NOT_SET,
                None,
            ),
        }
    }

    for (column, _) in actual.columns.iter().zip(&matched).filter(|(_, m)| !**m) {
        CompareLogger::new(CompareType::Column, column.name.as_str(), logs)
            .within_table(table_display)
            .extra_in_database(Some(column.store_type.as_str()), CompareAttributes::NOT_SET, None);
    }
}

fn compare_column(declared: &Column, actual: &Column, logger: &mut CompareLogger<'_>) {
    let mut different = logger.check_different(
        Some(declared.store_type.as_str()),
        Some(actual.store_type.as_str()),
        CompareAttributes::STORE_TYPE,
        None,
    );

    different |= logger.check_different(
        Some(declared.nullability()),
        Some(actual.nullability()),
        CompareAttributes::NULLABILITY,
        None,
    );

    if let Some(max_length) = declared.max_length {
        different |= logger.check_different(
            Some(max_length.to_string().as_str()),
            actual.max_length.map(|l| l.to_string()).as_deref(),
            CompareAttributes::MAX_LENGTH,
            None,
        );
    }

    if let Some(precision) = declared.precision {
        // Scale is only part of the comparison when it is declared.
        let found = actual.precision.map(|p| match declared.scale {
            Some(_) => precision_text(p, actual.scale),
            None => p.to_string(),
        });
        different |= logger.check_different(
            Some(precision_text(precision, declared.scale).as_str()),
            found.as_deref(),
            CompareAttributes::PRECISION,
            None,
        );
    }

    different |= logger.check_different(
        declared.default_sql.as_deref(),
        actual.default_sql.as_deref(),
        CompareAttributes::DEFAULT_SQL,
        None,
    );

    different |= logger.check_different(
        declared.computed_sql.as_deref(),
        actual.computed_sql.as_deref(),
        CompareAttributes::COMPUTED_SQL,
        None,
    );

    different |= logger.check_different(
        Some(identity_text(declared.is_identity)),
        Some(identity_text(actual.is_identity)),
        CompareAttributes::IDENTITY,
        None,
    );

    if !different {
        logger.mark_as_ok(Some(declared.store_type.as_str()), None);
    }
}

fn precision_text(precision: i32, scale: Option<i32>) -> String {
    match scale {
        Some(scale) => format!("{precision},{scale}"),
        None => precision.to_string(),
    }
}

fn identity_text(is_identity: bool) -> &'static str {
    if is_identity {
        "IDENTITY"
    } else {
        "NOT IDENTITY"
    }
}
