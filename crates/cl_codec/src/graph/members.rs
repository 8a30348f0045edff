use std::sync::Arc;

use cl_reflect::info::{MemberKind, TypeInfo, ValueType};
use cl_utils::hash::HashMap;

/// What a member name of a type refers to.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Member {
    Field(ValueType),
    Property(ValueType),
    Other(MemberKind),
    /// A field declared by the build itself.
    Generated(ValueType),
}

impl Member {
    /// Used in `MemberWithNameIsAlreadyDeclared`.
    pub(crate) fn describe(&self, name: &str) -> String {
        match self {
            Self::Field(ty) | Self::Generated(ty) => format!("field {ty} {name}"),
            Self::Property(ty) => format!("property {ty} {name}"),
            Self::Other(kind) => format!("{kind} {name}"),
        }
    }
}

/// All member names visible on one type, own and inherited.
pub(crate) struct Members {
    by_name: HashMap<Arc<str>, Member>,
}

impl Members {
    pub(crate) fn of(info: &TypeInfo) -> Self {
        let mut members = Self {
            by_name: HashMap::default(),
        };
        members.add(info);
        if info.is_class() {
            for base in info.base_classes() {
                members.add(base);
            }
        } else {
            for interface in info.all_interfaces() {
                members.add(&interface);
            }
        }
        members
    }

    // Nearer declarations are added first and shadow inherited ones.
    fn add(&mut self, info: &TypeInfo) {
        for field in info.fields() {
            self.insert(field.name(), Member::Field(field.value_type().clone()));
        }
        for property in info.properties() {
            self.insert(property.name(), Member::Property(property.value_type().clone()));
        }
        for member in info.members() {
            self.insert(member.name(), Member::Other(member.kind()));
        }
    }

    fn insert(&mut self, name: &str, member: Member) {
        self.by_name.entry(Arc::from(name)).or_insert(member);
    }

    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<&Member> {
        self.by_name.get(name)
    }

    pub(crate) fn declare_field(&mut self, name: &str, value_type: ValueType) {
        self.by_name.insert(Arc::from(name), Member::Generated(value_type));
    }

    /// A field name for `property` that no member uses yet.
    pub(crate) fn unique_field_name(&self, property: &str) -> String {
        let base = format!("_{}", camel_case(property));
        if self.get(&base).is_none() {
            return base;
        }
        let mut suffix = 1_usize;
        loop {
            let name = format!("{base}{suffix}");
            if self.get(&name).is_none() {
                return name;
            }
            suffix += 1;
        }
    }
}

/// `RootInt` to `rootInt`.
pub(crate) fn camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Field names tried for a property without an explicit field.
pub(crate) fn conventional_field_names(property: &str) -> [String; 4] {
    let camel = camel_case(property);
    [
        format!("_{camel}"),
        camel.clone(),
        format!("m_{camel}"),
        format!("<{property}>k__BackingField"),
    ]
}

// -----------------------------------------------------------------------------
// Tests
