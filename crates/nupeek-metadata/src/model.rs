use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Method,
    Field,
    Property,
    Event,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberDefinition {
    pub name: String,
    pub kind: MemberKind,
}

impl MemberDefinition {
    pub fn new(kind: MemberKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A type defined (not merely referenced) by a module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeDefinition {
    pub namespace: String,
    /// Metadata name, including any generic arity suffix such as `` `1 ``.
    pub name: String,
    pub members: Vec<MemberDefinition>,
}

impl TypeDefinition {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, kind: MemberKind, name: impl Into<String>) -> Self {
        self.members.push(MemberDefinition::new(kind, name));
        self
    }

    /// `Namespace.Name`, or just `Name` for the global namespace.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn declares_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModuleMetadata {
    /// Runtime version string from the metadata root, when read from an image.
    pub runtime_version: Option<String>,
    pub types: Vec<TypeDefinition>,
}

impl ModuleMetadata {
    pub fn new(types: Vec<TypeDefinition>) -> Self {
        Self {
            runtime_version: None,
            types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_joins_namespace() {
        assert_eq!(TypeDefinition::new("Polly", "Policy").full_name(), "Polly.Policy");
        assert_eq!(TypeDefinition::new("", "<Module>").full_name(), "<Module>");
    }

    #[test]
    fn member_lookup_is_ordinal() {
        let ty = TypeDefinition::new("Polly", "Policy").with_member(MemberKind::Method, "Handle");
        assert!(ty.declares_member("Handle"));
        assert!(!ty.declares_member("handle"));
    }
}
