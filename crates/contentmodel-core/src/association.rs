//! Association metadata between content models.
//!
//! Associations are declared at model-registration time and represented as
//! plain metadata records. Relation persistence itself lives behind the
//! [`RelationHandler`](crate::relations::RelationHandler) collaborator; this
//! module only describes shape and cardinality.

/// The nature of an association, as declared by the content model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationNature {
    /// Unidirectional to-one link.
    OneWay,
    /// Bidirectional to-one link.
    OneToOne,
    /// Many entries point at one target.
    ManyToOne,
    /// Polymorphic to-one link.
    OneToManyMorph,
    /// Unidirectional to-many link.
    ManyWay,
    /// One entry owns many targets.
    OneToMany,
    /// Many entries share many targets via a link table.
    ManyToMany,
    /// Polymorphic to-many link.
    ManyToManyMorph,
}

impl AssociationNature {
    /// Whether the alias holds a collection.
    ///
    /// Collection aliases empty out on unlink; singular aliases null out.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            AssociationNature::ManyWay
                | AssociationNature::OneToMany
                | AssociationNature::ManyToMany
                | AssociationNature::ManyToManyMorph
        )
    }
}

/// Metadata about one association alias on a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDef {
    /// The alias this association is addressed by in payloads.
    pub alias: String,
    /// Target model uid.
    pub target: String,
    /// Declared nature.
    pub nature: AssociationNature,
}

impl AssociationDef {
    /// Create a new association definition.
    pub fn new(
        alias: impl Into<String>,
        target: impl Into<String>,
        nature: AssociationNature,
    ) -> Self {
        Self {
            alias: alias.into(),
            target: target.into(),
            nature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_natures() {
        assert!(AssociationNature::OneToMany.is_collection());
        assert!(AssociationNature::ManyToMany.is_collection());
        assert!(AssociationNature::ManyWay.is_collection());
        assert!(AssociationNature::ManyToManyMorph.is_collection());
        assert!(!AssociationNature::OneWay.is_collection());
        assert!(!AssociationNature::OneToOne.is_collection());
        assert!(!AssociationNature::ManyToOne.is_collection());
        assert!(!AssociationNature::OneToManyMorph.is_collection());
    }
}
