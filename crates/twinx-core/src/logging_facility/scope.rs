//! Subject of a boundary event

/// What a boundary event is about
///
/// The entity is the Shell or Submodel id of the provider. An element path or
/// an Operation path narrows the event to one node of its element tree. Parts
/// left `None` are not recorded on the event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpScope<'a> {
    pub entity_id: Option<&'a str>,
    pub element_path: Option<&'a str>,
    pub operation_path: Option<&'a str>,
}

impl<'a> OpScope<'a> {
    /// Scope of a whole Shell or Submodel; `None` while a provider is unbound
    pub fn entity(entity_id: impl Into<Option<&'a str>>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    /// Narrow to the element at `path` (the root container when empty)
    pub fn element(mut self, path: &'a str) -> Self {
        self.element_path = Some(path);
        self
    }

    /// Narrow to the Operation at `path`
    pub fn operation(mut self, path: &'a str) -> Self {
        self.operation_path = Some(path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_entity_scope_is_empty() {
        assert_eq!(OpScope::entity(None::<&str>), OpScope::default());
    }

    #[test]
    fn test_scope_narrowing() {
        let scope = OpScope::entity("urn:sm:1").operation("ops.double");
        assert_eq!(scope.entity_id, Some("urn:sm:1"));
        assert_eq!(scope.operation_path, Some("ops.double"));
        assert!(scope.element_path.is_none());
    }
}
