use serde::{Deserialize, Serialize};

use super::container::ElementContainer;
use super::operation::Operation;
use super::reference::{LangString, Qualifier, Reference};
use super::value_type::DataTypeDefXsd;

/// Closed set of element variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    Property,
    MultiLanguageProperty,
    Range,
    File,
    Blob,
    ReferenceElement,
    RelationshipElement,
    SubmodelElementCollection,
    SubmodelElementList,
    Entity,
    Operation,
    BasicEventElement,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Property => "Property",
            ModelType::MultiLanguageProperty => "MultiLanguageProperty",
            ModelType::Range => "Range",
            ModelType::File => "File",
            ModelType::Blob => "Blob",
            ModelType::ReferenceElement => "ReferenceElement",
            ModelType::RelationshipElement => "RelationshipElement",
            ModelType::SubmodelElementCollection => "SubmodelElementCollection",
            ModelType::SubmodelElementList => "SubmodelElementList",
            ModelType::Entity => "Entity",
            ModelType::Operation => "Operation",
            ModelType::BasicEventElement => "BasicEventElement",
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an Entity element stands for a managed asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    CoManagedEntity,
    SelfManagedEntity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateOfEvent {
    On,
    Off,
}

fn default_true() -> bool {
    true
}

/// Variant payload of an element, tagged by `modelType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelType", rename_all_fields = "camelCase")]
pub enum ElementValue {
    Property {
        value_type: DataTypeDefXsd,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    MultiLanguageProperty {
        #[serde(default)]
        value: Vec<LangString>,
    },
    Range {
        value_type: DataTypeDefXsd,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<String>,
    },
    File {
        content_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Blob {
        content_type: String,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "blob_base64"
        )]
        value: Option<Vec<u8>>,
    },
    ReferenceElement {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Reference>,
    },
    RelationshipElement {
        first: Reference,
        second: Reference,
    },
    #[serde(rename = "SubmodelElementCollection")]
    Collection {
        #[serde(default)]
        value: ElementContainer,
    },
    #[serde(rename = "SubmodelElementList")]
    List {
        type_value_list_element: ModelType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_type_list_element: Option<DataTypeDefXsd>,
        #[serde(default = "default_true")]
        order_relevant: bool,
        #[serde(default)]
        value: ElementContainer,
    },
    Entity {
        entity_type: EntityType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        global_asset_id: Option<String>,
        #[serde(default)]
        statements: ElementContainer,
    },
    Operation(Operation),
    BasicEventElement {
        observed: Reference,
        direction: Direction,
        state: StateOfEvent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_topic: Option<String>,
    },
}

impl ElementValue {
    pub fn model_type(&self) -> ModelType {
        match self {
            ElementValue::Property { .. } => ModelType::Property,
            ElementValue::MultiLanguageProperty { .. } => ModelType::MultiLanguageProperty,
            ElementValue::Range { .. } => ModelType::Range,
            ElementValue::File { .. } => ModelType::File,
            ElementValue::Blob { .. } => ModelType::Blob,
            ElementValue::ReferenceElement { .. } => ModelType::ReferenceElement,
            ElementValue::RelationshipElement { .. } => ModelType::RelationshipElement,
            ElementValue::Collection { .. } => ModelType::SubmodelElementCollection,
            ElementValue::List { .. } => ModelType::SubmodelElementList,
            ElementValue::Entity { .. } => ModelType::Entity,
            ElementValue::Operation(_) => ModelType::Operation,
            ElementValue::BasicEventElement { .. } => ModelType::BasicEventElement,
        }
    }
}

/// One node of the element tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmodelElement {
    /// Sibling-unique short name, the path segment for this node
    pub id_short: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,

    #[serde(flatten)]
    pub value: ElementValue,
}

impl SubmodelElement {
    /// Create an element with no metadata
    pub fn new(id_short: impl Into<String>, value: ElementValue) -> Self {
        Self {
            id_short: id_short.into(),
            category: None,
            semantic_id: None,
            qualifiers: Vec::new(),
            description: Vec::new(),
            value,
        }
    }

    pub fn property(
        id_short: impl Into<String>,
        value_type: DataTypeDefXsd,
        value: Option<String>,
    ) -> Self {
        Self::new(id_short, ElementValue::Property { value_type, value })
    }

    pub fn collection(
        id_short: impl Into<String>,
        elements: impl IntoIterator<Item = SubmodelElement>,
    ) -> Self {
        Self::new(
            id_short,
            ElementValue::Collection {
                value: elements.into_iter().collect(),
            },
        )
    }

    pub fn list(
        id_short: impl Into<String>,
        type_value_list_element: ModelType,
        elements: impl IntoIterator<Item = SubmodelElement>,
    ) -> Self {
        Self::new(
            id_short,
            ElementValue::List {
                type_value_list_element,
                value_type_list_element: None,
                order_relevant: true,
                value: elements.into_iter().collect(),
            },
        )
    }

    pub fn operation(id_short: impl Into<String>, operation: Operation) -> Self {
        Self::new(id_short, ElementValue::Operation(operation))
    }

    pub fn with_semantic_id(mut self, semantic_id: Reference) -> Self {
        self.semantic_id = Some(semantic_id);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn model_type(&self) -> ModelType {
        self.value.model_type()
    }

    /// Child elements, if this element is a container
    pub fn children(&self) -> Option<&ElementContainer> {
        match &self.value {
            ElementValue::Collection { value } | ElementValue::List { value, .. } => Some(value),
            ElementValue::Entity { statements, .. } => Some(statements),
            ElementValue::Property { .. }
            | ElementValue::MultiLanguageProperty { .. }
            | ElementValue::Range { .. }
            | ElementValue::File { .. }
            | ElementValue::Blob { .. }
            | ElementValue::ReferenceElement { .. }
            | ElementValue::RelationshipElement { .. }
            | ElementValue::Operation(_)
            | ElementValue::BasicEventElement { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut ElementContainer> {
        match &mut self.value {
            ElementValue::Collection { value } | ElementValue::List { value, .. } => Some(value),
            ElementValue::Entity { statements, .. } => Some(statements),
            ElementValue::Property { .. }
            | ElementValue::MultiLanguageProperty { .. }
            | ElementValue::Range { .. }
            | ElementValue::File { .. }
            | ElementValue::Blob { .. }
            | ElementValue::ReferenceElement { .. }
            | ElementValue::RelationshipElement { .. }
            | ElementValue::Operation(_)
            | ElementValue::BasicEventElement { .. } => None,
        }
    }

    pub fn as_operation(&self) -> Option<&Operation> {
        match &self.value {
            ElementValue::Operation(op) => Some(op),
            _ => None,
        }
    }

    /// Lexical value of a Property
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            ElementValue::Property { value, .. } => value.as_deref(),
            _ => None,
        }
    }

    /// Property value parsed as an integer
    pub fn as_i64(&self) -> Option<i64> {
        self.as_str().and_then(|v| v.trim().parse().ok())
    }

    /// Property value parsed as a float
    pub fn as_f64(&self) -> Option<f64> {
        self.as_str().and_then(|v| v.trim().parse().ok())
    }

    /// Property value parsed as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_str()?.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    /// Declared value type of a Property or Range
    pub fn value_type(&self) -> Option<DataTypeDefXsd> {
        match &self.value {
            ElementValue::Property { value_type, .. } | ElementValue::Range { value_type, .. } => {
                Some(*value_type)
            }
            _ => None,
        }
    }

    /// Set the lexical value of a Property; no-op for other variants
    pub fn set_property_value(&mut self, new_value: Option<String>) {
        if let ElementValue::Property { value, .. } = &mut self.value {
            *value = new_value;
        }
    }

    /// Copy of this element with every Blob payload dropped
    ///
    /// Reads that must not ship binary payloads work on this copy; the stored
    /// tree is left untouched.
    pub fn without_blob_values(&self) -> Self {
        let mut copy = self.clone();
        strip_blobs(&mut copy);
        copy
    }
}

fn strip_blobs(element: &mut SubmodelElement) {
    if let ElementValue::Blob { value, .. } = &mut element.value {
        *value = None;
    }
    if let Some(children) = element.children_mut() {
        for child in children.iter_mut() {
            strip_blobs(child);
        }
    }
}

mod blob_base64 {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer
                .serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| {
                base64::engine::general_purpose::STANDARD
                    .decode(s.as_bytes())
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
