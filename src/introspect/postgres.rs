use super::{DbConnection, Provider, SchemaIntrospector};
use crate::model::*;
use crate::util::{Result, SchemaError};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

pub struct PostgresIntrospector;

#[async_trait]
impl SchemaIntrospector for PostgresIntrospector {
    fn provider(&self) -> Provider {
        Provider::Postgres
    }

    async fn introspect(
        &self,
        connection: &DbConnection,
        target_schemas: &[String],
    ) -> Result<DatabaseSchema> {
        let pool = connection.postgres_pool()?;
        let target_schemas = if target_schemas.is_empty() {
            vec![Provider::Postgres.capabilities().default_schema.to_string()]
        } else {
            target_schemas.to_vec()
        };

        let mut schema = DatabaseSchema::new();
        for mut table in introspect_tables(pool, &target_schemas).await? {
            let table_schema = table.schema.clone().unwrap_or_default();
            debug!(table = %qualified_name(Some(&table_schema), &table.name), "introspecting");

            table.columns = introspect_columns(pool, &table_schema, &table.name).await?;
            table.primary_key = introspect_constraints(pool, &table_schema, &table.name, 'p')
                .await?
                .into_iter()
                .next()
                .map(|(name, columns)| PrimaryKey {
                    name: Some(name),
                    columns,
                });
            table.unique_keys = introspect_constraints(pool, &table_schema, &table.name, 'u')
                .await?
                .into_iter()
                .map(|(name, columns)| UniqueKey { name, columns })
                .collect();
            table.indexes = introspect_indexes(pool, &table_schema, &table.name).await?;
            table.foreign_keys = introspect_foreign_keys(pool, &table_schema, &table.name).await?;

            schema.tables.push(table);
        }

        Ok(schema)
    }
}

async fn introspect_tables(pool: &PgPool, target_schemas: &[String]) -> Result<Vec<Table>> {
    let rows = sqlx::query(
        r#"
        SELECT n.nspname AS table_schema, c.relname AS table_name
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relkind IN ('r', 'p')
          AND NOT c.relispartition
          AND n.nspname = ANY($1::text[])
        ORDER BY n.nspname, c.relname
        "#,
    )
    .bind(target_schemas)
    .fetch_all(pool)
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch tables: {e}")))?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let schema: String = row.get("table_schema");
            let name: String = row.get("table_name");
            Table::new(Some(&schema), name)
        })
        .collect())
}

async fn introspect_columns(
    pool: &PgPool,
    table_schema: &str,
    table_name: &str,
) -> Result<Vec<Column>> {
    let rows = sqlx::query(
        r#"
        SELECT c.column_name::text AS column_name,
               format_type(a.atttypid, a.atttypmod) AS store_type,
               c.is_nullable::text AS is_nullable,
               c.column_default::text AS column_default,
               c.character_maximum_length::int4 AS max_length,
               c.numeric_precision::int4 AS numeric_precision,
               c.numeric_scale::int4 AS numeric_scale,
               c.is_identity::text AS is_identity,
               c.is_generated::text AS is_generated,
               c.generation_expression::text AS generation_expression
        FROM information_schema.columns c
        JOIN pg_namespace n ON n.nspname = c.table_schema
        JOIN pg_class t ON t.relnamespace = n.oid AND t.relname = c.table_name
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attname = c.column_name
        WHERE c.table_schema = $1 AND c.table_name = $2
        ORDER BY c.ordinal_position
        "#,
    )
    .bind(table_schema)
    .bind(table_name)
    .fetch_all(pool)
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch columns: {e}")))?;

    let mut columns = Vec::new();
    for row in rows {
        let name: String = row.get("column_name");
        let store_type: String = row.get("store_type");
        let is_nullable: String = row.get("is_nullable");
        let column_default: Option<String> = row.get("column_default");
        let is_identity: Option<String> = row.get("is_identity");
        let is_generated: Option<String> = row.get("is_generated");
        let generation_expression: Option<String> = row.get("generation_expression");

        let (default_sql, is_identity) =
            split_identity_default(column_default, is_identity.as_deref() == Some("YES"));
        let computed_sql = if is_generated.as_deref() == Some("ALWAYS") {
            generation_expression
        } else {
            None
        };

        columns.push(Column {
            name,
            store_type,
            nullable: is_nullable == "YES",
            max_length: row.get("max_length"),
            precision: row.get("numeric_precision"),
            scale: row.get("numeric_scale"),
            default_sql,
            computed_sql,
            is_identity,
        });
    }

    Ok(columns)
}

/// `serial` columns surface as a `nextval(...)` default; they are reported as
/// identity columns with no default so they compare like `GENERATED ... AS IDENTITY`.
fn split_identity_default(default: Option<String>, is_identity: bool) -> (Option<String>, bool) {
    match default {
        Some(expr) if expr.starts_with("nextval(") => (None, true),
        other => (other, is_identity),
    }
}

/// Returns `(constraint name, columns)` for each constraint of `kind`
/// (`p` primary key, `u` unique), columns in key order.
async fn introspect_constraints(
    pool: &PgPool,
    table_schema: &str,
    table_name: &str,
    kind: char,
) -> Result<Vec<(String, Vec<String>)>> {
    let rows = sqlx::query(
        r#"
        SELECT con.conname::text AS name,
               array_agg(a.attname::text ORDER BY k.ord) AS columns
        FROM pg_constraint con
        JOIN pg_class c ON c.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
        JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum
        WHERE n.nspname = $1 AND c.relname = $2 AND con.contype::text = $3
        GROUP BY con.conname
        ORDER BY con.conname
        "#,
    )
    .bind(table_schema)
    .bind(table_name)
    .bind(kind.to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch constraints: {e}")))?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("name"), row.get("columns")))
        .collect())
}

async fn introspect_indexes(
    pool: &PgPool,
    table_schema: &str,
    table_name: &str,
) -> Result<Vec<Index>> {
    // Indexes that back a primary key, unique or exclusion constraint are
    // reported through the constraint instead.
    let rows = sqlx::query(
        r#"
        SELECT i.relname::text AS index_name,
               ix.indisunique AS is_unique,
               am.amname::text AS method,
               array_agg(a.attname::text ORDER BY k.ord) AS columns
        FROM pg_index ix
        JOIN pg_class t ON t.oid = ix.indrelid
        JOIN pg_class i ON i.oid = ix.indexrelid
        JOIN pg_am am ON am.oid = i.relam
        JOIN pg_namespace n ON n.oid = t.relnamespace
        CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
        WHERE n.nspname = $1 AND t.relname = $2
          AND NOT EXISTS (
              SELECT 1 FROM pg_constraint con
              WHERE con.conindid = ix.indexrelid AND con.contype IN ('p', 'u', 'x')
          )
        GROUP BY i.relname, ix.indisunique, am.amname
        ORDER BY i.relname
        "#,
    )
    .bind(table_schema)
    .bind(table_name)
    .fetch_all(pool)
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch indexes: {e}")))?;

    let mut indexes = Vec::new();
    for row in rows {
        let method: String = row.get("method");
        indexes.push(Index {
            name: row.get("index_name"),
            columns: row.get("columns"),
            unique: row.get("is_unique"),
            method: IndexMethod::from_am_name(&method),
        });
    }

    Ok(indexes)
}

async fn introspect_foreign_keys(
    pool: &PgPool,
    table_schema: &str,
    table_name: &str,
) -> Result<Vec<ForeignKey>> {
    let rows = sqlx::query(
        r#"
        SELECT
            con.conname::text AS name,
            ref_n.nspname::text AS referenced_schema,
            ref_class.relname::text AS referenced_table,
            array_agg(att.attname::text ORDER BY u.attposition) AS columns,
            array_agg(ref_att.attname::text ORDER BY u.attposition) AS referenced_columns,
            con.confdeltype
        FROM pg_constraint con
        JOIN pg_class class ON con.conrelid = class.oid
        JOIN pg_class ref_class ON con.confrelid = ref_class.oid
        JOIN pg_namespace n ON n.oid = class.relnamespace
        JOIN pg_namespace ref_n ON ref_n.oid = ref_class.relnamespace
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS u(attnum, ref_attnum, attposition)
        JOIN pg_attribute att ON att.attrelid = class.oid AND att.attnum = u.attnum
        JOIN pg_attribute ref_att ON ref_att.attrelid = ref_class.oid AND ref_att.attnum = u.ref_attnum
        WHERE n.nspname = $1 AND class.relname = $2 AND con.contype = 'f'
        GROUP BY con.conname, ref_n.nspname, ref_class.relname, con.confdeltype
        ORDER BY con.conname
        "#,
    )
    .bind(table_schema)
    .bind(table_name)
    .fetch_all(pool)
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch foreign keys: {e}")))?;

    let mut foreign_keys = Vec::new();
    for row in rows {
        let confdeltype: i8 = row.get::<i8, _>("confdeltype");
        foreign_keys.push(ForeignKey {
            name: Some(row.get("name")),
            columns: row.get("columns"),
            referenced_schema: Some(row.get("referenced_schema")),
            referenced_table: row.get("referenced_table"),
            referenced_columns: row.get("referenced_columns"),
            on_delete: map_referential_action(confdeltype as u8 as char)?,
        });
    }

    Ok(foreign_keys)
}

fn map_referential_action(action: char) -> Result<ReferentialAction> {
    match action {
        'a' => Ok(ReferentialAction::NoAction),
        'r' => Ok(ReferentialAction::Restrict),
        'c' => Ok(ReferentialAction::Cascade),
        'n' => Ok(ReferentialAction::SetNull),
        'd' => Ok(ReferentialAction::SetDefault),
        _ => Err(SchemaError::DatabaseError(format!(
            "Unknown referential action code from PostgreSQL: '{action}'"
        ))),
    }
}
