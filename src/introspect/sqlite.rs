use super::{DbConnection, Provider, SchemaIntrospector};
use crate::model::*;
use crate::util::{Result, SchemaError};
use async_trait::async_trait;
use regex::Regex;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

static TYPE_ARGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z ]+?)\s*\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\)").unwrap());

pub struct SqliteIntrospector;

#[async_trait]
impl SchemaIntrospector for SqliteIntrospector {
    fn provider(&self) -> Provider {
        Provider::Sqlite
    }

    async fn introspect(
        &self,
        connection: &DbConnection,
        target_schemas: &[String],
    ) -> Result<DatabaseSchema> {
        let pool = connection.sqlite_pool()?;
        let main = Provider::Sqlite.capabilities().default_schema;
        for schema in target_schemas.iter().filter(|s| s.as_str() != main) {
            warn!(schema = %schema, "sqlite introspection only reads the main database");
        }

        let mut schema = DatabaseSchema::new();
        for name in introspect_table_names(pool).await? {
            debug!(table = %name, "introspecting");
            let mut table = Table::new(Some(main), name);
            let columns = introspect_columns(pool, &table.name).await?;

            table.primary_key = primary_key_from_columns(&columns);
            table.columns = columns.into_iter().map(|c| c.column).collect();

            let (unique_keys, indexes) = introspect_indexes(pool, &table.name).await?;
            table.unique_keys = unique_keys;
            table.indexes = indexes;
            table.foreign_keys = introspect_foreign_keys(pool, &table.name).await?;

            schema.tables.push(table);
        }

        fill_implicit_referenced_columns(&mut schema);
        Ok(schema)
    }
}

async fn introspect_table_names(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT name FROM sqlite_master
        WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch tables: {e}")))?;

    Ok(rows.into_iter().map(|row| row.get("name")).collect())
}

struct PragmaColumn {
    column: Column,
    pk_position: i64,
}

async fn introspect_columns(pool: &SqlitePool, table_name: &str) -> Result<Vec<PragmaColumn>> {
    let rows = sqlx::query(
        r#"
        SELECT name, type, "notnull" AS not_null, dflt_value, pk
        FROM pragma_table_xinfo(?1)
        WHERE hidden IN (0, 2, 3)
        ORDER BY cid
        "#,
    )
    .bind(table_name)
    .fetch_all(pool)
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch columns: {e}")))?;

    let pk_count = rows.iter().filter(|r| r.get::<i64, _>("pk") > 0).count();

    let mut columns = Vec::new();
    for row in rows {
        let name: String = row.get("name");
        let store_type: String = row.get("type");
        let not_null: i64 = row.get("not_null");
        let default_sql: Option<String> = row.get("dflt_value");
        let pk_position: i64 = row.get("pk");

        let (max_length, precision, scale) = type_arguments(&store_type);
        // An INTEGER PRIMARY KEY column aliases the rowid.
        let is_identity = pk_count == 1 && pk_position > 0 && store_type.eq_ignore_ascii_case("INTEGER");

        columns.push(PragmaColumn {
            column: Column {
                name,
                nullable: not_null == 0 && pk_position == 0,
                max_length,
                precision,
                scale,
                default_sql,
                computed_sql: None,
                is_identity,
                store_type,
            },
            pk_position,
        });
    }

    Ok(columns)
}

fn primary_key_from_columns(columns: &[PragmaColumn]) -> Option<PrimaryKey> {
    let mut key: Vec<&PragmaColumn> = columns.iter().filter(|c| c.pk_position > 0).collect();
    if key.is_empty() {
        return None;
    }
    key.sort_by_key(|c| c.pk_position);
    Some(PrimaryKey {
        name: None,
        columns: key.into_iter().map(|c| c.column.name.clone()).collect(),
    })
}

/// Splits `varchar(255)` / `decimal(9,2)` into length or precision and scale.
fn type_arguments(store_type: &str) -> (Option<i32>, Option<i32>, Option<i32>) {
    let Some(caps) = TYPE_ARGS.captures(store_type) else {
        return (None, None, None);
    };
    let base = caps[1].to_lowercase();
    let first = caps[2].parse::<i32>().ok();
    let second = caps.get(3).and_then(|m| m.as_str().parse::<i32>().ok());

    if base.contains("char") || base.contains("binary") || base.contains("clob") {
        (first, None, None)
    } else {
        (None, first, second)
    }
}

async fn introspect_indexes(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<(Vec<UniqueKey>, Vec<Index>)> {
    let rows = sqlx::query(
        r#"
        SELECT name, "unique" AS is_unique, origin
        FROM pragma_index_list(?1)
        ORDER BY name
        "#,
    )
    .bind(table_name)
    .fetch_all(pool)
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch indexes: {e}")))?;

    let mut unique_keys = Vec::new();
    let mut indexes = Vec::new();
    for row in rows {
        let name: String = row.get("name");
        let is_unique: i64 = row.get("is_unique");
        let origin: String = row.get("origin");
        let columns = introspect_index_columns(pool, &name).await?;

        match origin.as_str() {
            "pk" => {}
            "u" => unique_keys.push(UniqueKey { name, columns }),
            _ => indexes.push(Index {
                name,
                columns,
                unique: is_unique != 0,
                method: Some(IndexMethod::BTree),
            }),
        }
    }

    Ok((unique_keys, indexes))
}

async fn introspect_index_columns(pool: &SqlitePool, index_name: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT name FROM pragma_index_info(?1)
        ORDER BY seqno
        "#,
    )
    .bind(index_name)
    .fetch_all(pool)
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch index columns: {e}")))?;

    // Expression index members have no column name.
    Ok(rows
        .into_iter()
        .filter_map(|row| row.get::<Option<String>, _>("name"))
        .collect())
}

async fn introspect_foreign_keys(pool: &SqlitePool, table_name: &str) -> Result<Vec<ForeignKey>> {
    let rows = sqlx::query(
        r#"
        SELECT id, "table" AS referenced_table, "from" AS from_column, "to" AS to_column, on_delete
        FROM pragma_foreign_key_list(?1)
        ORDER BY id, seq
        "#,
    )
    .bind(table_name)
    .fetch_all(pool)
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch foreign keys: {e}")))?;

    let mut by_id: BTreeMap<i64, ForeignKey> = BTreeMap::new();
    for row in rows {
        let id: i64 = row.get("id");
        let referenced_table: String = row.get("referenced_table");
        let from_column: String = row.get("from_column");
        let to_column: Option<String> = row.get("to_column");
        let on_delete: String = row.get("on_delete");

        let foreign_key = by_id.entry(id).or_insert_with(|| ForeignKey {
            name: None,
            columns: Vec::new(),
            referenced_schema: Some(Provider::Sqlite.capabilities().default_schema.to_string()),
            referenced_table,
            referenced_columns: Vec::new(),
            on_delete: ReferentialAction::from_rule(&on_delete),
        });
        foreign_key.columns.push(from_column);
        if let Some(to_column) = to_column {
            foreign_key.referenced_columns.push(to_column);
        }
    }

    Ok(by_id.into_values().collect())
}

/// `REFERENCES parent` without a column list targets the parent's primary key.
fn fill_implicit_referenced_columns(schema: &mut DatabaseSchema) {
    let primary_keys: BTreeMap<String, Vec<String>> = schema
        .tables
        .iter()
        .filter_map(|t| {
            t.primary_key
                .as_ref()
                .map(|pk| (t.name.to_lowercase(), pk.columns.clone()))
        })
        .collect();

    for table in &mut schema.tables {
        for foreign_key in &mut table.foreign_keys {
            if foreign_key.referenced_columns.is_empty() {
                if let Some(columns) = primary_keys.get(&foreign_key.referenced_table.to_lowercase()) {
                    foreign_key.referenced_columns = columns.clone();
                }
            }
        }
    }
}
