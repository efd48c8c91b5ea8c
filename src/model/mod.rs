use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseSchema {
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Table {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_key: Option<PrimaryKey>,
    #[serde(default)]
    pub unique_keys: Vec<UniqueKey>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub store_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub max_length: Option<i32>,
    #[serde(default)]
    pub precision: Option<i32>,
    #[serde(default)]
    pub scale: Option<i32>,
    #[serde(default)]
    pub default_sql: Option<String>,
    #[serde(default)]
    pub computed_sql: Option<String>,
    #[serde(default)]
    pub is_identity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrimaryKey {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UniqueKey {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub method: Option<IndexMethod>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IndexMethod {
    BTree,
    Hash,
    Gin,
    Gist,
    Brin,
    SpGist,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForeignKey {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub referenced_schema: Option<String>,
    pub referenced_table: String,
    #[serde(default)]
    pub referenced_columns: Vec<String>,
    #[serde(default)]
    pub on_delete: ReferentialAction,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl DatabaseSchema {
    pub fn new() -> Self {
        DatabaseSchema { tables: Vec::new() }
    }

    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let json = serde_json::to_string(self).unwrap_or_default();
        let hash = Sha256::digest(json.as_bytes());
        hex::encode(hash)
    }
}

impl Table {
    pub fn new(schema: Option<&str>, name: impl Into<String>) -> Self {
        Table {
            schema: schema.map(str::to_string),
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
            unique_keys: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl Column {
    pub fn new(name: impl Into<String>, store_type: impl Into<String>, nullable: bool) -> Self {
        Column {
            name: name.into(),
            store_type: store_type.into(),
            nullable,
            max_length: None,
            precision: None,
            scale: None,
            default_sql: None,
            computed_sql: None,
            is_identity: false,
        }
    }

    pub fn nullability(&self) -> &'static str {
        nullability_text(self.nullable)
    }
}

pub fn nullability_text(nullable: bool) -> &'static str {
    if nullable {
        "NULL"
    } else {
        "NOT NULL"
    }
}

/// How a backend compares identifiers when matching declared and actual
/// constructs by name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NameComparison {
    CaseSensitive,
    CaseInsensitive,
}

impl NameComparison {
    pub fn key(self, name: &str) -> String {
        match self {
            NameComparison::CaseSensitive => name.to_string(),
            NameComparison::CaseInsensitive => name.to_lowercase(),
        }
    }

    pub fn same(self, a: &str, b: &str) -> bool {
        match self {
            NameComparison::CaseSensitive => a == b,
            NameComparison::CaseInsensitive => a.to_lowercase() == b.to_lowercase(),
        }
    }

    /// Order-insensitive equality of two column lists.
    pub fn same_set(self, a: &[String], b: &[String]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let mut a: Vec<String> = a.iter().map(|n| self.key(n)).collect();
        let mut b: Vec<String> = b.iter().map(|n| self.key(n)).collect();
        a.sort();
        b.sort();
        a == b
    }
}

/// Formats `schema.name`, or just `name` when no schema is known.
pub fn qualified_name(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(schema) => format!("{schema}.{name}"),
        None => name.to_string(),
    }
}

impl IndexMethod {
    pub fn from_am_name(am_name: &str) -> Option<Self> {
        match am_name {
            "btree" => Some(IndexMethod::BTree),
            "hash" => Some(IndexMethod::Hash),
            "gin" => Some(IndexMethod::Gin),
            "gist" => Some(IndexMethod::Gist),
            "brin" => Some(IndexMethod::Brin),
            "spgist" => Some(IndexMethod::SpGist),
            _ => None,
        }
    }
}

impl fmt::Display for IndexMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndexMethod::BTree => "btree",
            IndexMethod::Hash => "hash",
            IndexMethod::Gin => "gin",
            IndexMethod::Gist => "gist",
            IndexMethod::Brin => "brin",
            IndexMethod::SpGist => "spgist",
        };
        write!(f, "{s}")
    }
}

impl ReferentialAction {
    /// Maps a rule as spelled by `information_schema` or `PRAGMA foreign_key_list`.
    pub fn from_rule(rule: &str) -> Self {
        match rule.to_uppercase().as_str() {
            "CASCADE" => ReferentialAction::Cascade,
            "RESTRICT" => ReferentialAction::Restrict,
            "SET NULL" => ReferentialAction::SetNull,
            "SET DEFAULT" => ReferentialAction::SetDefault,
            _ => ReferentialAction::NoAction,
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books_table() -> Table {
        let mut table = Table::new(Some("dbo"), "Books");
        table.columns.push(Column::new("BookId", "integer", false));
        table.columns.push(Column::new("Title", "text", false));
        table
    }

    #[test]
    fn same_schema_produces_same_fingerprint() {
        let schema1 = DatabaseSchema::new();
        let schema2 = DatabaseSchema::new();
        assert_eq!(schema1.fingerprint(), schema2.fingerprint());

        let schema3 = DatabaseSchema {
            tables: vec![books_table()],
        };
        let schema4 = DatabaseSchema {
            tables: vec![books_table()],
        };

        assert_eq!(schema3.fingerprint(), schema4.fingerprint());
        assert_ne!(schema1.fingerprint(), schema3.fingerprint());
    }

    #[test]
    fn qualified_name_omits_missing_schema() {
        assert_eq!(qualified_name(Some("dbo"), "Books"), "dbo.Books");
        assert_eq!(qualified_name(None, "Books"), "Books");
    }

    #[test]
    fn name_comparison_follows_backend_rule() {
        let columns = vec!["BookId".to_string(), "AuthorId".to_string()];
        let reordered = vec!["authorid".to_string(), "bookid".to_string()];

        assert!(NameComparison::CaseInsensitive.same("Books", "books"));
        assert!(!NameComparison::CaseSensitive.same("Books", "books"));
        assert!(NameComparison::CaseInsensitive.same_set(&columns, &reordered));
        assert!(!NameComparison::CaseSensitive.same_set(&columns, &reordered));
        assert!(NameComparison::CaseSensitive.same_set(&columns, &["AuthorId".into(), "BookId".into()]));
        assert!(!NameComparison::CaseSensitive.same_set(&columns, &["BookId".into()]));
    }

    #[test]
    fn referential_action_parses_catalog_rules() {
        assert_eq!(ReferentialAction::from_rule("CASCADE"), ReferentialAction::Cascade);
        assert_eq!(ReferentialAction::from_rule("set null"), ReferentialAction::SetNull);
        assert_eq!(ReferentialAction::from_rule("NO ACTION"), ReferentialAction::NoAction);
        assert_eq!(ReferentialAction::SetDefault.to_string(), "SET DEFAULT");
    }

    #[test]
    fn declared_model_deserializes_with_defaults() {
        let json = r#"{
            "tables": [{
                "schema": "dbo",
                "name": "Books",
                "columns": [{ "name": "Price", "store_type": "decimal(9,2)" }],
                "indexes": [{ "name": "IX_Books_Price", "columns": ["Price"], "method": "btree" }]
            }]
        }"#;

        let schema: DatabaseSchema = serde_json::from_str(json).unwrap();
        let table = &schema.tables[0];
        let price = table.column("Price").unwrap();

        assert!(!price.nullable);
        assert_eq!(price.nullability(), "NOT NULL");
        assert!(table.primary_key.is_none());
        assert_eq!(table.indexes[0].method, Some(IndexMethod::BTree));
        assert!(!table.indexes[0].unique);
    }
}
