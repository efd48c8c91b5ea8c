//! The record produced by every comparison step.

use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompareType {
    Table,
    Column,
    PrimaryKey,
    AlternateKey,
    Index,
    ForeignKey,
    Relationship,
}

impl CompareType {
    pub const ALL: [CompareType; 7] = [
        CompareType::Table,
        CompareType::Column,
        CompareType::PrimaryKey,
        CompareType::AlternateKey,
        CompareType::Index,
        CompareType::ForeignKey,
        CompareType::Relationship,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for CompareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareType::Table => "Table",
            CompareType::Column => "Column",
            CompareType::PrimaryKey => "PrimaryKey",
            CompareType::AlternateKey => "AlternateKey",
            CompareType::Index => "Index",
            CompareType::ForeignKey => "ForeignKey",
            CompareType::Relationship => "Relationship",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareState {
    Ok,
    Different,
    NotInDatabase,
    ExtraInDatabase,
}

impl CompareState {
    pub const ALL: [CompareState; 4] = [
        CompareState::Ok,
        CompareState::Different,
        CompareState::NotInDatabase,
        CompareState::ExtraInDatabase,
    ];

    pub fn is_error(self) -> bool {
        self != CompareState::Ok
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.to_string().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for CompareState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareState::Ok => "Ok",
            CompareState::Different => "Different",
            CompareState::NotInDatabase => "NotInDatabase",
            CompareState::ExtraInDatabase => "ExtraInDatabase",
        };
        write!(f, "{s}")
    }
}

/// Set of facets a finding is about. One finding can cover several facets,
/// e.g. `STORE_TYPE | NULLABILITY`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CompareAttributes(u32);

impl CompareAttributes {
    pub const NOT_SET: Self = Self(0);
    pub const SCHEMA: Self = Self(1 << 0);
    pub const NAME: Self = Self(1 << 1);
    pub const STORE_TYPE: Self = Self(1 << 2);
    pub const NULLABILITY: Self = Self(1 << 3);
    pub const MAX_LENGTH: Self = Self(1 << 4);
    pub const PRECISION: Self = Self(1 << 5);
    pub const DEFAULT_SQL: Self = Self(1 << 6);
    pub const COMPUTED_SQL: Self = Self(1 << 7);
    pub const IDENTITY: Self = Self(1 << 8);
    pub const COLUMN_NAMES: Self = Self(1 << 9);
    pub const UNIQUE: Self = Self(1 << 10);
    pub const INDEX_METHOD: Self = Self(1 << 11);
    pub const PRINCIPAL_TABLE: Self = Self(1 << 12);
    pub const PRINCIPAL_COLUMNS: Self = Self(1 << 13);
    pub const DELETE_BEHAVIOR: Self = Self(1 << 14);

    const NAMED: [(Self, &'static str); 15] = [
        (Self::SCHEMA, "Schema"),
        (Self::NAME, "Name"),
        (Self::STORE_TYPE, "StoreType"),
        (Self::NULLABILITY, "Nullability"),
        (Self::MAX_LENGTH, "MaxLength"),
        (Self::PRECISION, "Precision"),
        (Self::DEFAULT_SQL, "DefaultSql"),
        (Self::COMPUTED_SQL, "ComputedSql"),
        (Self::IDENTITY, "Identity"),
        (Self::COLUMN_NAMES, "ColumnNames"),
        (Self::UNIQUE, "Unique"),
        (Self::INDEX_METHOD, "IndexMethod"),
        (Self::PRINCIPAL_TABLE, "PrincipalTable"),
        (Self::PRINCIPAL_COLUMNS, "PrincipalColumns"),
        (Self::DELETE_BEHAVIOR, "DeleteBehavior"),
    ];

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("NotSet") {
            return Some(Self::NOT_SET);
        }
        Self::NAMED
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(flag, _)| *flag)
    }
}

impl BitOr for CompareAttributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CompareAttributes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for CompareAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NotSet");
        }
        write!(f, "{}", self.names().join(", "))
    }
}

impl fmt::Debug for CompareAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompareAttributes({self})")
    }
}

impl Serialize for CompareAttributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.names();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for CompareAttributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        let mut attributes = Self::NOT_SET;
        for name in names {
            attributes |= Self::from_name(&name)
                .ok_or_else(|| D::Error::custom(format!("unknown compare attribute '{name}'")))?;
        }
        Ok(attributes)
    }
}

/// One atomic finding. Fields are private so an entry cannot change once
/// it has been appended to a run's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompareLog {
    #[serde(rename = "type")]
    compare_type: CompareType,
    state: CompareState,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<String>,
    attributes: CompareAttributes,
    expected: Option<String>,
    found: Option<String>,
}

impl CompareLog {
    pub(crate) fn new(
        compare_type: CompareType,
        state: CompareState,
        name: String,
        table: Option<String>,
        attributes: CompareAttributes,
        expected: Option<String>,
        found: Option<String>,
    ) -> Self {
        Self {
            compare_type,
            state,
            name,
            table,
            attributes,
            expected,
            found,
        }
    }

    pub fn compare_type(&self) -> CompareType {
        self.compare_type
    }

    pub fn state(&self) -> CompareState {
        self.state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning table of a child construct (column, key, index...).
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn attributes(&self) -> CompareAttributes {
        self.attributes
    }

    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    pub fn found(&self) -> Option<&str> {
        self.found.as_deref()
    }
}

impl fmt::Display for CompareLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} '", self.state, self.compare_type)?;
        if let Some(table) = &self.table {
            write!(f, "{table}.")?;
        }
        write!(f, "{}'", self.name)?;
        if !self.attributes.is_empty() {
            write!(f, ", {}", self.attributes)?;
        }
        match (&self.expected, &self.found) {
            (Some(expected), Some(found)) => {
                write!(f, ": expected = {expected}, found = {found}")
            }
            (Some(expected), None) => write!(f, ": expected = {expected}"),
            (None, Some(found)) => write!(f, ": found = {found}"),
            (None, None) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_combine_as_a_set() {
        let attrs = CompareAttributes::STORE_TYPE | CompareAttributes::NULLABILITY;
        assert!(attrs.contains(CompareAttributes::STORE_TYPE));
        assert!(attrs.contains(CompareAttributes::NULLABILITY));
        assert!(!attrs.contains(CompareAttributes::DEFAULT_SQL));
        assert_eq!(attrs.names(), vec!["StoreType", "Nullability"]);
        assert_eq!(attrs.to_string(), "StoreType, Nullability");
    }

    #[test]
    fn not_set_is_empty() {
        assert!(CompareAttributes::NOT_SET.is_empty());
        assert_eq!(CompareAttributes::NOT_SET.to_string(), "NotSet");
        assert_eq!(CompareAttributes::default(), CompareAttributes::NOT_SET);
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(CompareType::from_name("column"), Some(CompareType::Column));
        assert_eq!(CompareState::from_name("notindatabase"), Some(CompareState::NotInDatabase));
        assert_eq!(
            CompareAttributes::from_name("defaultsql"),
            Some(CompareAttributes::DEFAULT_SQL)
        );
        assert_eq!(CompareType::from_name("View"), None);
    }

    #[test]
    fn compare_types_cover_only_emitted_constructs() {
        assert_eq!(CompareType::ALL.first(), Some(&CompareType::Table));
        assert_eq!(CompareType::from_name("Database"), None);
        assert!(serde_json::from_str::<CompareType>("\"Database\"").is_err());
    }

    #[test]
    fn display_includes_table_and_values() {
        let log = CompareLog::new(
            CompareType::Column,
            CompareState::Different,
            "Price".to_string(),
            Some("dbo.Books".to_string()),
            CompareAttributes::NULLABILITY,
            Some("NOT NULL".to_string()),
            Some("NULL".to_string()),
        );
        assert_eq!(
            log.to_string(),
            "Different Column 'dbo.Books.Price', Nullability: expected = NOT NULL, found = NULL"
        );
    }

    #[test]
    fn serializes_attributes_as_names() {
        let log = CompareLog::new(
            CompareType::Table,
            CompareState::Ok,
            "Books".to_string(),
            None,
            CompareAttributes::NOT_SET,
            Some("Books".to_string()),
            None,
        );
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["type"], "Table");
        assert_eq!(json["state"], "Ok");
        assert_eq!(json["attributes"], serde_json::json!([]));
        assert!(json.get("table").is_none());
    }

    #[test]
    fn attributes_deserialize_from_names() {
        let attrs: CompareAttributes =
            serde_json::from_str(r#"["StoreType", "nullability"]"#).unwrap();
        assert_eq!(attrs, CompareAttributes::STORE_TYPE | CompareAttributes::NULLABILITY);

        let err = serde_json::from_str::<CompareAttributes>(r#"["Colour"]"#).unwrap_err();
        assert!(err.to_string().contains("unknown compare attribute 'Colour'"));
    }
}
