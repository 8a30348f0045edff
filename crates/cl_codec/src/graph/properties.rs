use core::panic::Location;
use std::sync::Arc;

use cl_config::options::{
    CollectionDefaultValue, FieldName, HasCollectionDefaultValue, HasDefaultValue, PropertyAccessMode,
    PropertySetterMode, UseDefaultValueHandling, UsePropertyAccessMode, UsePropertySetterMode,
};
use cl_config::options::{DefaultValueHandling, OptionDeclaration};
use cl_config::{IssueKind, IssueSource, OptionBag, PropertyConfig, TypeConfig};
use cl_reflect::Value;
use cl_reflect::info::{FieldInfo, PropertyInfo, TypeInfo, ValueType};

use super::members::{Member, Members, conventional_field_names};
use super::{Binding, GraphBuilder, GraphProperty, describe_property, render_value};

/// Per property reporting scope.
struct Scope {
    source: IssueSource,
    location: Option<&'static Location<'static>>,
}

impl GraphBuilder<'_> {
    /// Resolves properties of every declared node, ancestors first.
    pub(super) fn resolve_properties(&mut self) {
        let mut order = self.graph.declared.clone();
        order.sort_by_key(|&index| self.graph.nodes[index].base_nodes.len());
        for index in order {
            self.resolve_node(index);
        }
    }

    fn report(&mut self, scope: &Scope, kind: IssueKind) {
        self.issues.report(kind, scope.source.clone(), scope.location);
    }

    fn resolve_node(&mut self, index: usize) {
        let config = self.config;
        let info = Arc::clone(&self.graph.nodes[index].info);
        let Some(type_config) = config.type_config(info.path()) else {
            return;
        };
        let parent = self.graph.nodes[index].base_nodes.first().copied();

        let sources = self.source_properties(&info, type_config);

        // Inherited properties keep the parent's order.
        let mut ordered: Vec<&PropertyInfo> = Vec::with_capacity(sources.len());
        if let Some(parent) = parent {
            for inherited in &self.graph.nodes[parent].properties {
                if let Some(source) = sources.iter().find(|s| s.name() == inherited.name()) {
                    ordered.push(source);
                }
            }
        }
        for source in &sources {
            if !ordered.iter().any(|o| o.name() == source.name()) {
                ordered.push(source);
            }
        }

        for property_config in type_config.properties() {
            if let Some(name) = property_config.name()
                && !sources.iter().any(|s| s.name() == name)
            {
                let scope = Scope {
                    source: IssueSource::of_property(info.path_arc(), &Arc::from(name)),
                    location: property_config.location(),
                };
                self.report(&scope, IssueKind::PropertyNotFound);
            }
        }

        let mut members = Members::of(&info);
        let mut generated = Vec::new();
        let mut properties = Vec::with_capacity(ordered.len());
        for source in ordered {
            let property = self.resolve_property(&info, type_config, parent, source, &mut members, &mut generated);
            properties.push(property);
        }
        self.report_shared_fields(&info, &properties);

        let node = &mut self.graph.nodes[index];
        node.properties = properties;
        node.generated_fields = generated;
    }

    /// Properties of `info` and its ancestors, ancestors first.
    ///
    /// Redeclarations replace the inherited property in place.
    fn source_properties(&mut self, info: &Arc<TypeInfo>, type_config: &TypeConfig) -> Vec<PropertyInfo> {
        let mut out: Vec<PropertyInfo> = Vec::new();

        if info.is_class() {
            let mut chain: Vec<&Arc<TypeInfo>> = info.base_classes().collect();
            chain.reverse();
            chain.push(info);
            for ty in chain {
                for property in ty.properties() {
                    match out.iter_mut().find(|p| p.name() == property.name()) {
                        Some(slot) => *slot = property.clone(),
                        None => out.push(property.clone()),
                    }
                }
            }
            return out;
        }

        fn visit(
            info: &TypeInfo,
            visited: &mut Vec<Arc<str>>,
            out: &mut Vec<PropertyInfo>,
            collisions: &mut Vec<(Arc<str>, String, String)>,
        ) {
            for parent in info.interfaces() {
                if !visited.contains(parent.path_arc()) {
                    visited.push(Arc::clone(parent.path_arc()));
                    visit(parent, visited, out, collisions);
                }
            }
            for property in info.properties() {
                match out.iter_mut().find(|p| p.name() == property.name()) {
                    Some(existing) if existing.value_type() != property.value_type() => collisions.push((
                        Arc::clone(property.name_arc()),
                        describe_property(property),
                        describe_property(existing),
                    )),
                    Some(existing) => *existing = property.clone(),
                    None => out.push(property.clone()),
                }
            }
        }

        let mut collisions = Vec::new();
        visit(info, &mut Vec::new(), &mut out, &mut collisions);
        for (name, property, other) in collisions {
            let scope = Scope {
                source: IssueSource::of_property(info.path_arc(), &name),
                location: Some(type_config.location()),
            };
            self.report(&scope, IssueKind::PropertyCollisionBySignatureIsNotSupported { property, other });
        }
        out
    }

    fn resolve_property(
        &mut self,
        info: &Arc<TypeInfo>,
        type_config: &TypeConfig,
        parent: Option<usize>,
        source: &PropertyInfo,
        members: &mut Members,
        generated: &mut Vec<FieldInfo>,
    ) -> GraphProperty {
        let name = Arc::clone(source.name_arc());
        let own = type_config.property_config(&name);

        // Each step only fills options still missing.
        let mut options = own.map(|c| c.options().clone()).unwrap_or_default();
        if source.declaring_type() == info.path() {
            options.merge(type_config.any_property_config(false).options());
        }
        options.merge(type_config.any_property_config(true).options());
        if let Some(inherited) = parent.and_then(|p| self.graph.nodes[p].property(&name)) {
            options.merge(&inherited.options);
        }
        if let Some(any) = self.config.any_entity_config().any_property_config() {
            options.merge(any.options());
        }

        let scope = Scope {
            source: IssueSource::of_property(info.path_arc(), &name),
            location: own.and_then(PropertyConfig::location).or(Some(type_config.location())),
        };
        let own_has = |option: fn(&OptionBag) -> bool| own.is_some_and(|c| option(c.options()));
        let value_type = source.value_type().clone();

        let (access_mode, binding) = if info.is_interface() || source.is_abstract() {
            let binding = self.bind_abstract(info, &scope, &options, &name, &value_type, members, generated);
            (PropertyAccessMode::Field, binding)
        } else {
            let mode = options
                .value_or_default::<UsePropertyAccessMode>()
                .unwrap_or(PropertyAccessMode::FieldForGetterAndInitializationPropertyForSetter);
            let redundant_field = own_has(OptionBag::contains::<FieldName>);
            let binding = self.bind_concrete(&scope, &options, source, mode, members, redundant_field);
            (mode, binding)
        };

        let default_value = match options.get::<HasDefaultValue>() {
            Some(value) if !value_type.accepts(value) => {
                let kind = IssueKind::DefaultValueTypeMismatch {
                    value: render_value(value),
                    expected: value_type.to_string(),
                };
                self.report(&scope, kind);
                None
            }
            Some(value) if *value == value_type.system_default() => {
                if own_has(OptionBag::contains::<HasDefaultValue>) {
                    let kind = IssueKind::DefaultValueIsRedundant {
                        value: render_value(value),
                    };
                    self.report(&scope, kind);
                }
                None
            }
            Some(value) => Some(value.clone()),
            None => None,
        };

        let collection_default = options
            .value_or_default::<HasCollectionDefaultValue>()
            .unwrap_or(CollectionDefaultValue::Empty);
        let initial_value = match (&default_value, &value_type) {
            (Some(value), _) => Some(value.clone()),
            (None, ValueType::List(_)) if collection_default == CollectionDefaultValue::Empty => {
                Some(Value::List(Vec::new()))
            }
            _ => None,
        };

        GraphProperty {
            setter_mode: options
                .value_or_default::<UsePropertySetterMode>()
                .unwrap_or(PropertySetterMode::Set),
            default_handling: options
                .value_or_default::<UseDefaultValueHandling>()
                .unwrap_or(DefaultValueHandling::Include),
            name,
            value_type,
            source: source.clone(),
            options,
            access_mode,
            binding,
            default_value,
            initial_value,
            location: scope.location,
        }
    }

    /// Interface and abstract properties always live in a field.
    #[allow(clippy::too_many_arguments)]
    fn bind_abstract(
        &mut self,
        info: &TypeInfo,
        scope: &Scope,
        options: &OptionBag,
        name: &str,
        value_type: &ValueType,
        members: &mut Members,
        generated: &mut Vec<FieldInfo>,
    ) -> Binding {
        if options
            .get::<UsePropertyAccessMode>()
            .is_some_and(|&mode| mode != PropertyAccessMode::Field)
        {
            self.report(scope, IssueKind::OnlyFieldAccessModeIsAllowedOnInterfaceOrAbstractProperty);
        }

        let Some(field) = options.get::<FieldName>() else {
            let field = members.unique_field_name(name);
            members.declare_field(&field, value_type.clone());
            generated.push(FieldInfo::new(&field, value_type.clone()));
            return Binding::Field {
                name: Arc::from(field),
                generated: true,
            };
        };

        match members.get(field) {
            None => {
                members.declare_field(field, value_type.clone());
                generated.push(FieldInfo::new(field, value_type.clone()));
                Binding::Field {
                    name: Arc::from(field.as_str()),
                    generated: true,
                }
            }
            Some(Member::Generated(ty)) if ty == value_type => Binding::Field {
                name: Arc::from(field.as_str()),
                generated: true,
            },
            Some(Member::Field(ty)) if info.is_class() && ty == value_type => Binding::Field {
                name: Arc::from(field.as_str()),
                generated: false,
            },
            Some(Member::Generated(ty)) => {
                let kind = IssueKind::PropertyAndFieldTypeMismatch {
                    field_type: ty.to_string(),
                    field: field.clone(),
                };
                self.report(scope, kind);
                Binding::Accessors
            }
            Some(Member::Field(ty)) if info.is_class() => {
                let kind = IssueKind::PropertyAndFieldTypeMismatch {
                    field_type: ty.to_string(),
                    field: field.clone(),
                };
                self.report(scope, kind);
                Binding::Accessors
            }
            Some(member) => {
                let kind = IssueKind::MemberWithNameIsAlreadyDeclared {
                    member: member.describe(field),
                };
                self.report(scope, kind);
                Binding::Accessors
            }
        }
    }

    /// Concrete properties use their own accessors and, unless in
    /// `Property` mode, an existing field.
    fn bind_concrete(
        &mut self,
        scope: &Scope,
        options: &OptionBag,
        source: &PropertyInfo,
        mode: PropertyAccessMode,
        members: &Members,
        redundant_field: bool,
    ) -> Binding {
        if !source.is_virtual() {
            self.report(scope, IssueKind::PropertyMustBeDeclaredAsVirtual);
        }
        if mode.requires_getter() && source.getter().is_none() {
            self.report(scope, IssueKind::PropertyMustHaveGetter);
        }
        if mode.requires_setter() && source.setter().is_none() {
            self.report(scope, IssueKind::PropertyMustHaveSetter);
        }

        if !mode.requires_field() {
            if redundant_field {
                let kind = IssueKind::CallIsRedundantOnProperty { call: FieldName::NAME };
                self.report(scope, kind);
            }
            return Binding::Accessors;
        }

        let found = match options.get::<FieldName>() {
            Some(field) => match members.get(field) {
                Some(Member::Field(ty)) => Some((field.clone(), ty.clone())),
                _ => {
                    let kind = IssueKind::FieldNotFound { field: field.clone() };
                    self.report(scope, kind);
                    return Binding::Accessors;
                }
            },
            None => conventional_field_names(source.name())
                .into_iter()
                .find_map(|field| match members.get(&field) {
                    Some(Member::Field(ty)) => Some((field, ty.clone())),
                    _ => None,
                }),
        };

        match found {
            Some((field, ty)) if ty == *source.value_type() => Binding::Field {
                name: Arc::from(field),
                generated: false,
            },
            Some((field, ty)) => {
                let kind = IssueKind::PropertyAndFieldTypeMismatch {
                    field_type: ty.to_string(),
                    field,
                };
                self.report(scope, kind);
                Binding::Accessors
            }
            None => {
                self.report(scope, IssueKind::BackingFieldNotFound);
                Binding::Accessors
            }
        }
    }

    /// Warns when several properties of one type share a field.
    fn report_shared_fields(&mut self, info: &TypeInfo, properties: &[GraphProperty]) {
        let mut owners: Vec<(&str, &GraphProperty)> = Vec::new();
        for property in properties {
            let Some(field) = property.binding.field() else {
                continue;
            };
            match owners.iter().find(|(f, _)| *f == field) {
                Some(&(_, owner)) => {
                    let scope = Scope {
                        source: IssueSource::of_property(info.path_arc(), owner.name_arc()),
                        location: owner.location,
                    };
                    let kind = IssueKind::FieldIsReferencedMoreThanOnce {
                        field: field.to_string(),
                        other_property: property.name().to_string(),
                    };
                    self.report(&scope, kind);
                }
                None => owners.push((field, property)),
            }
        }
    }
}
