use core::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::Fields;
use crate::info::{FieldInfo, PropertyFlags, PropertyInfo, ValueType, short_name};

/// Source constructor body, run on a freshly allocated instance.
pub type Constructor = Arc<dyn Fn(&mut Fields) + Send + Sync>;

/// Source change raiser of a class, called with the changed property name.
pub type ChangeRaiser = Arc<dyn Fn(&Fields, &str) + Send + Sync>;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct TypeFlags: u8 {
        const ABSTRACT = 1 << 0;
        /// Cannot be derived from.
        const SEALED = 1 << 1;
        /// Has an accessible parameterless constructor.
        const DEFAULT_CONSTRUCTOR = 1 << 2;
        /// Declares that instances raise change notifications themselves.
        const NOTIFIES_CHANGES = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Interface,
    Class,
}

/// The kind of a member that is neither a field nor a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method,
    Event,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method => f.write_str("method"),
            Self::Event => f.write_str("event"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    name: Arc<str>,
    kind: MemberKind,
}

impl MemberInfo {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Runtime description of an interface or class.
///
/// Interfaces only declare abstract properties. Classes own fields, may
/// extend one base class, implement interfaces and provide accessor bodies
/// for their properties.
///
/// # Examples
///
/// ```
/// use cl_reflect::info::{TypeInfo, ValueType};
///
/// let root = TypeInfo::interface("models::IRoot")
///     .property(cl_reflect::info::PropertyInfo::new("RootInt", ValueType::I32))
///     .build();
///
/// let class = TypeInfo::class("models::Root")
///     .implements(&root)
///     .auto_property("RootInt", ValueType::I32)
///     .build();
///
/// assert!(class.is_assignable_to("models::IRoot"));
/// assert!(class.field("<RootInt>k__BackingField").is_some());
/// assert!(root.properties()[0].is_abstract());
/// ```
pub struct TypeInfo {
    path: Arc<str>,
    kind: TypeKind,
    flags: TypeFlags,
    base: Option<Arc<TypeInfo>>,
    interfaces: Vec<Arc<TypeInfo>>,
    fields: Vec<FieldInfo>,
    properties: Vec<PropertyInfo>,
    members: Vec<MemberInfo>,
    constructor: Option<Constructor>,
    change_raiser: Option<ChangeRaiser>,
}

impl TypeInfo {
    /// Starts describing an interface. Interfaces are always abstract.
    pub fn interface(path: &str) -> TypeInfoBuilder {
        TypeInfoBuilder::new(path, TypeKind::Interface, TypeFlags::ABSTRACT)
    }

    /// Starts describing a class with a parameterless constructor.
    pub fn class(path: &str) -> TypeInfoBuilder {
        TypeInfoBuilder::new(path, TypeKind::Class, TypeFlags::DEFAULT_CONSTRUCTOR)
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn path_arc(&self) -> &Arc<str> {
        &self.path
    }

    /// The path without its module prefix.
    #[inline]
    pub fn name(&self) -> &str {
        short_name(&self.path)
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    #[inline]
    pub fn is_class(&self) -> bool {
        self.kind == TypeKind::Class
    }

    #[inline]
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.flags.contains(TypeFlags::SEALED)
    }

    #[inline]
    pub fn has_default_constructor(&self) -> bool {
        self.flags.contains(TypeFlags::DEFAULT_CONSTRUCTOR)
    }

    #[inline]
    pub fn notifies_changes(&self) -> bool {
        self.flags.contains(TypeFlags::NOTIFIES_CHANGES)
    }

    /// The base class, classes only.
    #[inline]
    pub fn base(&self) -> Option<&Arc<TypeInfo>> {
        self.base.as_ref()
    }

    /// Directly implemented (or, for interfaces, extended) interfaces.
    #[inline]
    pub fn interfaces(&self) -> &[Arc<TypeInfo>] {
        &self.interfaces
    }

    /// Every interface reachable from this type, including through base
    /// classes, without duplicates.
    ///
    /// Direct interfaces come first, each followed by its own interfaces,
    /// then the interfaces of the base class.
    pub fn all_interfaces(&self) -> Vec<Arc<TypeInfo>> {
        fn visit(info: &TypeInfo, out: &mut Vec<Arc<TypeInfo>>) {
            for interface in &info.interfaces {
                if !out.iter().any(|known| known.path == interface.path) {
                    out.push(Arc::clone(interface));
                    visit(interface, out);
                }
            }
            if let Some(base) = &info.base {
                visit(base, out);
            }
        }

        let mut out = Vec::new();
        visit(self, &mut out);
        out
    }

    /// The base class chain, nearest first.
    pub fn base_classes(&self) -> impl Iterator<Item = &Arc<TypeInfo>> {
        core::iter::successors(self.base.as_ref(), |info| info.base.as_ref())
    }

    /// Returns `true` if `path` names this type, a base class or an interface.
    pub fn is_assignable_to(&self, path: &str) -> bool {
        &*self.path == path
            || self.base_classes().any(|base| &*base.path == path)
            || self.all_interfaces().iter().any(|i| &*i.path == path)
    }

    /// Fields declared by this type, without inherited ones.
    #[inline]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Properties declared by this type, without inherited ones.
    #[inline]
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name() == name)
    }

    #[inline]
    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        self.members.iter().find(|m| m.name() == name)
    }

    #[inline]
    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    #[inline]
    pub fn change_raiser(&self) -> Option<&ChangeRaiser> {
        self.change_raiser.as_ref()
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .field("base", &self.base.as_ref().map(|b| b.path()))
            .field("interfaces", &self.interfaces.iter().map(|i| i.path()).collect::<Vec<_>>())
            .field("fields", &self.fields)
            .field("properties", &self.properties)
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

// -----------------------------------------------------------------------------
// TypeInfoBuilder

/// Builder returned by [`TypeInfo::interface`] and [`TypeInfo::class`].
pub struct TypeInfoBuilder {
    info: TypeInfo,
}

impl TypeInfoBuilder {
    fn new(path: &str, kind: TypeKind, flags: TypeFlags) -> Self {
        Self {
            info: TypeInfo {
                path: Arc::from(path),
                kind,
                flags,
                base: None,
                interfaces: Vec::new(),
                fields: Vec::new(),
                properties: Vec::new(),
                members: Vec::new(),
                constructor: None,
                change_raiser: None,
            },
        }
    }

    /// Sets the base class.
    pub fn extends(mut self, base: &Arc<TypeInfo>) -> Self {
        self.info.base = Some(Arc::clone(base));
        self
    }

    /// Adds a directly implemented interface.
    pub fn implements(mut self, interface: &Arc<TypeInfo>) -> Self {
        self.info.interfaces.push(Arc::clone(interface));
        self
    }

    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.info.flags |= flags;
        self
    }

    /// Removes the parameterless constructor.
    pub fn without_default_constructor(mut self) -> Self {
        self.info.flags -= TypeFlags::DEFAULT_CONSTRUCTOR;
        self
    }

    pub fn field(mut self, name: &str, value_type: ValueType) -> Self {
        self.info.fields.push(FieldInfo::new(name, value_type));
        self
    }

    /// Adds a property. Interface properties are made abstract.
    pub fn property(mut self, property: PropertyInfo) -> Self {
        let property = match self.info.kind {
            TypeKind::Interface => property.with_flags(PropertyFlags::ABSTRACT),
            TypeKind::Class => property,
        };
        self.info.properties.push(property);
        self
    }

    /// Adds a virtual property stored in a compiler-style backing field
    /// named `<Name>k__BackingField`.
    pub fn auto_property(self, name: &str, value_type: ValueType) -> Self {
        let field = format!("<{name}>k__BackingField");
        self.field(&field, value_type.clone())
            .property(PropertyInfo::backed(name, value_type, &field))
    }

    /// Declares a method or event, which only takes part in name checks.
    pub fn member(mut self, name: &str, kind: MemberKind) -> Self {
        self.info.members.push(MemberInfo {
            name: Arc::from(name),
            kind,
        });
        self
    }

    pub fn constructor(mut self, body: impl Fn(&mut Fields) + Send + Sync + 'static) -> Self {
        self.info.constructor = Some(Arc::new(body));
        self
    }

    /// Sets the change raiser. Implies [`TypeFlags::NOTIFIES_CHANGES`].
    pub fn change_raiser(mut self, raiser: impl Fn(&Fields, &str) + Send + Sync + 'static) -> Self {
        self.info.change_raiser = Some(Arc::new(raiser));
        self.info.flags |= TypeFlags::NOTIFIES_CHANGES;
        self
    }

    /// Declares change notification support without a raiser.
    pub fn notifies_changes(mut self) -> Self {
        self.info.flags |= TypeFlags::NOTIFIES_CHANGES;
        self
    }

    pub fn build(mut self) -> Arc<TypeInfo> {
        let path = Arc::clone(&self.info.path);
        for property in &mut self.info.properties {
            property.set_declaring_type(&path);
        }
        Arc::new(self.info)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{MemberKind, TypeInfo};
    use crate::info::{PropertyInfo, ValueType};

    #[test]
    fn interfaces_are_collected_once() {
        let root = TypeInfo::interface("models::IRoot")
            .property(PropertyInfo::new("RootInt", ValueType::I32))
            .build();
        let left = TypeInfo::interface("models::ILeft").implements(&root).build();
        let right = TypeInfo::interface("models::IRight").implements(&root).build();
        let both = TypeInfo::interface("models::IBoth")
            .implements(&left)
            .implements(&right)
            .build();

        let paths: Vec<_> = both.all_interfaces().iter().map(|i| i.name().to_owned()).collect();
        assert_eq!(paths, ["ILeft", "IRoot", "IRight"]);
        assert!(both.is_assignable_to("models::IRoot"));
        assert!(!root.is_assignable_to("models::IBoth"));
        assert_eq!(root.properties()[0].declaring_type(), "models::IRoot");
    }

    #[test]
    fn class_chain() {
        let base = TypeInfo::class("models::Base")
            .auto_property("Value", ValueType::I32)
            .member("PropertyChanged", MemberKind::Event)
            .build();
        let derived = TypeInfo::class("models::Derived")
            .extends(&base)
            .without_default_constructor()
            .build();

        assert_eq!(derived.base_classes().count(), 1);
        assert!(derived.is_assignable_to("models::Base"));
        assert!(!derived.has_default_constructor());
        assert!(base.has_default_constructor());
        assert_eq!(base.member("PropertyChanged").unwrap().kind(), MemberKind::Event);
        assert!(base.properties()[0].is_virtual());
    }
}
