use serde::Serialize;

// ── Attribute types ───────────────────────────────────────────────────────────

/// Value type of a schema attribute as exposed to the plugin host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    String,
    Int,
    Bool,
    List(Box<AttrType>),
    /// A nested object with its own attribute set, e.g. a user_authentication
    /// block or an entry in a list of ACL objects.
    Object(Vec<Attribute>),
}

// ── Attributes ────────────────────────────────────────────────────────────────

/// One attribute in a resource or provider schema.
///
/// `required`, `optional` and `computed` carry the host's semantics: required
/// must be set by the practitioner, computed is assigned by the remote system
/// and never user-supplied, optional may be left null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub attr_type: AttrType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub description: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, attr_type: AttrType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Declarative attribute schema for one resource kind or for the provider
/// configuration block itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub description: String,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
