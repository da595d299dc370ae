//! Composite type descriptions
//!
//! A composite type is a user-defined structured type with named members.
//! Attribute types that reference another in-scope composite type carry the
//! referenced type's qualified name, which is what the dependency resolver
//! builds its graph from.

/// One attribute of a composite type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAttribute {
    pub name: String,
    pub data_type: String,
    /// Qualified name of the referenced composite type, when `data_type` is
    /// itself a user-defined type (`None` for built-ins).
    pub referenced_type: Option<String>,
}

impl TypeAttribute {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            referenced_type: None,
        }
    }

    pub fn referencing(
        name: impl Into<String>,
        data_type: impl Into<String>,
        referenced_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            referenced_type: Some(referenced_type.into().to_lowercase()),
        }
    }
}

/// A composite type scheduled for creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeType {
    pub schema: String,
    pub name: String,
    pub attributes: Vec<TypeAttribute>,
}

impl CompositeType {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<TypeAttribute>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Canonical lowercase `schema.name`, the graph key.
    pub fn qualified_name(&self) -> String {
        format!(
            "{}.{}",
            self.schema.to_lowercase(),
            self.name.to_lowercase()
        )
    }

    /// Qualified names of composite types this type's attributes reference.
    pub fn referenced_types(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter_map(|a| a.referenced_type.as_deref())
    }
}
