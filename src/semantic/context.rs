//! Transformation context and metadata indices
//!
//! The context is the single source of truth during emission: the current
//! schema plus pre-built lookup indices over the source catalog (table
//! columns, type methods, package functions, synonyms). Indices are keyed by
//! lowercase qualified names; all lookups fold case, matching the
//! case-insensitive identifier rules of both dialects.
//!
//! The context is immutable per call. Query-local state (table aliases, CTE
//! names) belongs to the tree builder, not here.

use std::collections::{HashMap, HashSet};

/// Column metadata for one table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    /// Owning schema for user-defined column types; `None` for built-ins.
    pub type_owner: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            data_type: data_type.into(),
            type_owner: None,
        }
    }

    pub fn with_type_owner(mut self, owner: impl Into<String>) -> Self {
        self.type_owner = Some(owner.into().to_lowercase());
        self
    }

    pub fn is_custom_type(&self) -> bool {
        self.type_owner.is_some()
    }

    /// `owner.type` for custom types, the bare type otherwise.
    pub fn qualified_type(&self) -> String {
        match &self.type_owner {
            Some(owner) => format!("{owner}.{}", self.data_type),
            None => self.data_type.clone(),
        }
    }
}

/// Pre-built metadata lookup indices.
///
/// A pure data structure with no service dependencies; built once per
/// transformation session and shared read-only across calls.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndices {
    /// lowercase "schema.table" -> ordered columns
    table_columns: HashMap<String, Vec<ColumnInfo>>,
    /// lowercase "schema.type" -> lowercase method names
    type_methods: HashMap<String, HashSet<String>>,
    /// lowercase "schema.package.function"
    package_functions: HashSet<String>,
    /// lowercase schema -> (lowercase synonym -> "schema.table" target)
    synonyms: HashMap<String, HashMap<String, String>>,
    /// lowercase qualified composite-type names
    object_type_names: HashSet<String>,
}

impl MetadataIndices {
    pub fn builder() -> MetadataIndicesBuilder {
        MetadataIndicesBuilder::default()
    }

    /// Ordered columns of a table, or `None` when the table is unknown.
    pub fn table_columns(&self, qualified_table: &str) -> Option<&[ColumnInfo]> {
        self.table_columns
            .get(&qualified_table.to_lowercase())
            .map(Vec::as_slice)
    }

    pub fn column_info(&self, qualified_table: &str, column: &str) -> Option<&ColumnInfo> {
        let columns = self.table_columns(qualified_table)?;
        columns.iter().find(|c| c.name.eq_ignore_ascii_case(column))
    }

    pub fn has_column(&self, qualified_table: &str, column: &str) -> bool {
        self.column_info(qualified_table, column).is_some()
    }

    pub fn has_type_method(&self, qualified_type: &str, method: &str) -> bool {
        self.type_methods
            .get(&qualified_type.to_lowercase())
            .map(|methods| methods.contains(&method.to_lowercase()))
            .unwrap_or(false)
    }

    pub fn is_package_function(&self, qualified_name: &str) -> bool {
        self.package_functions
            .contains(&qualified_name.to_lowercase())
    }

    /// Resolves a synonym: current schema first, then PUBLIC.
    pub fn resolve_synonym(&self, current_schema: &str, name: &str) -> Option<&str> {
        let schema = current_schema.to_lowercase();
        let synonym = name.to_lowercase();

        if let Some(target) = self.synonyms.get(&schema).and_then(|m| m.get(&synonym)) {
            return Some(target);
        }
        self.synonyms
            .get("public")
            .and_then(|m| m.get(&synonym))
            .map(String::as_str)
    }

    pub fn is_object_type(&self, qualified_type: &str) -> bool {
        self.object_type_names.contains(&qualified_type.to_lowercase())
    }
}

/// Builder for [`MetadataIndices`]. All names are folded to lowercase on
/// insertion.
#[derive(Debug, Default)]
pub struct MetadataIndicesBuilder {
    indices: MetadataIndices,
}

impl MetadataIndicesBuilder {
    pub fn table(mut self, qualified_table: &str, columns: Vec<ColumnInfo>) -> Self {
        self.indices
            .table_columns
            .insert(qualified_table.to_lowercase(), columns);
        self
    }

    pub fn type_method(mut self, qualified_type: &str, method: &str) -> Self {
        self.indices
            .type_methods
            .entry(qualified_type.to_lowercase())
            .or_default()
            .insert(method.to_lowercase());
        self
    }

    pub fn package_function(mut self, qualified_name: &str) -> Self {
        self.indices
            .package_functions
            .insert(qualified_name.to_lowercase());
        self
    }

    pub fn synonym(mut self, schema: &str, name: &str, target: &str) -> Self {
        self.indices
            .synonyms
            .entry(schema.to_lowercase())
            .or_default()
            .insert(name.to_lowercase(), target.to_lowercase());
        self
    }

    pub fn object_type(mut self, qualified_type: &str) -> Self {
        self.indices
            .object_type_names
            .insert(qualified_type.to_lowercase());
        self
    }

    pub fn build(self) -> MetadataIndices {
        self.indices
    }
}

/// Shared context for one transformation call: current schema plus metadata
/// indices. Immutable for the duration of the call.
#[derive(Debug, Clone)]
pub struct TransformationContext {
    current_schema: String,
    indices: MetadataIndices,
}

impl TransformationContext {
    pub fn new(current_schema: impl Into<String>, indices: MetadataIndices) -> Self {
        Self {
            current_schema: current_schema.into().to_lowercase(),
            indices,
        }
    }

    /// Context with empty indices, enough for schema-free fragments.
    pub fn bare(current_schema: impl Into<String>) -> Self {
        Self::new(current_schema, MetadataIndices::default())
    }

    pub fn current_schema(&self) -> &str {
        &self.current_schema
    }

    pub fn indices(&self) -> &MetadataIndices {
        &self.indices
    }

    pub fn resolve_synonym(&self, name: &str) -> Option<&str> {
        self.indices.resolve_synonym(&self.current_schema, name)
    }

    /// Qualifies a bare table name against the current schema, following
    /// synonyms first.
    pub fn qualify_table(&self, name: &str) -> String {
        let lower = name.to_lowercase();
        if lower.contains('.') {
            return lower;
        }
        if let Some(target) = self.resolve_synonym(&lower) {
            return target.to_string();
        }
        format!("{}.{lower}", self.current_schema)
    }

    /// Qualifies a composite-type name: synonym first, then current schema,
    /// then PUBLIC, then SYS. Unresolvable names come back unqualified so the
    /// caller can still report what was written.
    pub fn qualify_type_name(&self, type_name: &str) -> String {
        let lower = type_name.to_lowercase();
        if lower.contains('.') {
            return lower;
        }

        if let Some(target) = self.resolve_synonym(&lower) {
            if self.indices.is_object_type(target) {
                return target.to_string();
            }
        }

        for schema in [self.current_schema.as_str(), "public", "sys"] {
            let qualified = format!("{schema}.{lower}");
            if self.indices.is_object_type(&qualified) {
                return qualified;
            }
        }

        lower
    }
}
