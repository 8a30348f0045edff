use core::fmt;
use core::panic::Location;
use std::sync::Arc;

use cl_reflect::Value;
use cl_reflect::info::TypeInfo;
use cl_utils::hash::HashMap;

use crate::bag::OptionBag;
use crate::issue::{Issue, IssueKind, IssueSource};
use crate::options::{CollectionDefaultValue, DefaultValueHandling, OptionDeclaration};
use crate::options::{FieldName, HasCollectionDefaultValue, HasDefaultValue, UseDefaultValueHandling};
use crate::options::{PropertyAccessMode, PropertySetterMode, UsePropertyAccessMode, UsePropertySetterMode};
use crate::request::PropertyRequest;

// -----------------------------------------------------------------------------
// TypeCharacter

/// How a declared type takes part in a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeCharacter {
    /// A root level document type.
    Entity,
    /// A type only used nested in properties of other types.
    Owned,
}

impl fmt::Display for TypeCharacter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => f.write_str("entity"),
            Self::Owned => f.write_str("owned type"),
        }
    }
}

// -----------------------------------------------------------------------------
// PropertyConfig

/// Options of one property scope.
///
/// Used for named properties as well as for the "any property" scopes of a
/// type and of the context.
#[derive(Clone, Debug)]
pub struct PropertyConfig {
    name: Option<Arc<str>>,
    options: OptionBag,
    location: Option<&'static Location<'static>>,
}

impl PropertyConfig {
    fn new(name: Option<Arc<str>>, location: Option<&'static Location<'static>>) -> Self {
        Self {
            name,
            options: OptionBag::new(),
            location,
        }
    }

    /// The property name, `None` for "any property" scopes.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn options(&self) -> &OptionBag {
        &self.options
    }

    /// Where the scope was first requested.
    #[inline]
    pub fn location(&self) -> Option<&'static Location<'static>> {
        self.location
    }

    /// Sets any option, including those declared by extensions.
    #[track_caller]
    pub fn set_option<D: OptionDeclaration>(&mut self, value: D::Value) -> &mut Self {
        self.options.set::<D>(value, Some(Location::caller()));
        self
    }

    #[track_caller]
    pub fn use_property_access_mode(&mut self, mode: PropertyAccessMode) -> &mut Self {
        self.set_option::<UsePropertyAccessMode>(mode)
    }

    /// Names the field backing the property.
    #[track_caller]
    pub fn has_field(&mut self, name: &str) -> &mut Self {
        self.set_option::<FieldName>(name.to_owned())
    }

    #[track_caller]
    pub fn use_property_setter_mode(&mut self, mode: PropertySetterMode) -> &mut Self {
        self.set_option::<UsePropertySetterMode>(mode)
    }

    #[track_caller]
    pub fn use_default_value_handling(&mut self, handling: DefaultValueHandling) -> &mut Self {
        self.set_option::<UseDefaultValueHandling>(handling)
    }

    #[track_caller]
    pub fn has_default_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.set_option::<HasDefaultValue>(value.into())
    }

    #[track_caller]
    pub fn has_collection_default_value(&mut self, value: CollectionDefaultValue) -> &mut Self {
        self.set_option::<HasCollectionDefaultValue>(value)
    }

    /// Applies every option present in `request`.
    #[track_caller]
    pub fn apply(&mut self, request: &PropertyRequest) -> &mut Self {
        if let Some(mode) = request.access_mode {
            self.use_property_access_mode(mode);
        }
        if let Some(field) = &request.field {
            self.has_field(field);
        }
        if let Some(mode) = request.setter_mode {
            self.use_property_setter_mode(mode);
        }
        if let Some(handling) = request.default_value_handling {
            self.use_default_value_handling(handling);
        }
        if let Some(value) = request.collection_default {
            self.has_collection_default_value(value);
        }
        self
    }
}

// -----------------------------------------------------------------------------
// TypeConfig

/// Configuration of one declared type.
#[derive(Clone, Debug)]
pub struct TypeConfig {
    info: Arc<TypeInfo>,
    character: TypeCharacter,
    options: OptionBag,
    properties: Vec<PropertyConfig>,
    any_declared_property: PropertyConfig,
    any_property: PropertyConfig,
    location: &'static Location<'static>,
}

impl TypeConfig {
    fn new(info: &Arc<TypeInfo>, character: TypeCharacter, location: &'static Location<'static>) -> Self {
        Self {
            info: Arc::clone(info),
            character,
            options: OptionBag::new(),
            properties: Vec::new(),
            any_declared_property: PropertyConfig::new(None, Some(location)),
            any_property: PropertyConfig::new(None, Some(location)),
            location,
        }
    }

    #[inline]
    pub fn info(&self) -> &Arc<TypeInfo> {
        &self.info
    }

    #[inline]
    pub fn character(&self) -> TypeCharacter {
        self.character
    }

    #[inline]
    pub fn options(&self) -> &OptionBag {
        &self.options
    }

    /// Where the type was first declared.
    #[inline]
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    #[track_caller]
    pub fn set_option<D: OptionDeclaration>(&mut self, value: D::Value) -> &mut Self {
        self.options.set::<D>(value, Some(Location::caller()));
        self
    }

    /// The scope of the property called `name`, created on first use.
    ///
    /// Whether the property exists is checked when the context is built.
    #[track_caller]
    pub fn property(&mut self, name: &str) -> &mut PropertyConfig {
        let index = match self.properties.iter().position(|p| p.name() == Some(name)) {
            Some(index) => index,
            None => {
                let config = PropertyConfig::new(Some(Arc::from(name)), Some(Location::caller()));
                self.properties.push(config);
                self.properties.len() - 1
            }
        };
        &mut self.properties[index]
    }

    /// Options applied to every property of this type.
    ///
    /// With `include_inherited` false only properties declared by the type
    /// itself are affected.
    #[inline]
    pub fn any_property(&mut self, include_inherited: bool) -> &mut PropertyConfig {
        if include_inherited {
            &mut self.any_property
        } else {
            &mut self.any_declared_property
        }
    }

    /// Explicitly configured properties, in request order.
    #[inline]
    pub fn properties(&self) -> &[PropertyConfig] {
        &self.properties
    }

    pub fn property_config(&self, name: &str) -> Option<&PropertyConfig> {
        self.properties.iter().find(|p| p.name() == Some(name))
    }

    #[inline]
    pub fn any_property_config(&self, include_inherited: bool) -> &PropertyConfig {
        if include_inherited {
            &self.any_property
        } else {
            &self.any_declared_property
        }
    }
}

// -----------------------------------------------------------------------------
// AnyEntityConfig

/// Options applied to every declared type.
#[derive(Clone, Debug, Default)]
pub struct AnyEntityConfig {
    options: OptionBag,
    any_property: Option<PropertyConfig>,
}

impl AnyEntityConfig {
    #[inline]
    pub fn options(&self) -> &OptionBag {
        &self.options
    }

    #[track_caller]
    pub fn set_option<D: OptionDeclaration>(&mut self, value: D::Value) -> &mut Self {
        self.options.set::<D>(value, Some(Location::caller()));
        self
    }

    /// Options applied to every property of every declared type.
    #[track_caller]
    pub fn any_property(&mut self) -> &mut PropertyConfig {
        let location = Location::caller();
        self.any_property
            .get_or_insert_with(|| PropertyConfig::new(None, Some(location)))
    }

    pub fn any_property_config(&self) -> Option<&PropertyConfig> {
        self.any_property.as_ref()
    }
}

// -----------------------------------------------------------------------------
// ContextConfig

/// The full set of configuration requests of a context.
///
/// # Examples
///
/// ```
/// use cl_config::{ContextConfig, TypeCharacter};
/// use cl_config::options::PropertyAccessMode;
/// use cl_reflect::info::{PropertyInfo, TypeInfo, ValueType};
///
/// let root = TypeInfo::interface("models::IRoot")
///     .property(PropertyInfo::new("RootInt", ValueType::I32))
///     .build();
///
/// let mut config = ContextConfig::new();
/// config
///     .entity(&root)
///     .property("RootInt")
///     .use_property_access_mode(PropertyAccessMode::Field)
///     .has_default_value(42);
///
/// let declared = config.type_config("models::IRoot").unwrap();
/// assert_eq!(declared.character(), TypeCharacter::Entity);
/// assert!(config.issues().is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ContextConfig {
    options: OptionBag,
    types: Vec<TypeConfig>,
    index: HashMap<Arc<str>, usize>,
    any_entity: AnyEntityConfig,
    issues: Vec<Issue>,
}

impl ContextConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `info` as a root level entity type.
    #[track_caller]
    pub fn entity(&mut self, info: &Arc<TypeInfo>) -> &mut TypeConfig {
        self.declare(info, TypeCharacter::Entity, Location::caller())
    }

    /// Declares `info` as an owned type, only used nested in properties.
    #[track_caller]
    pub fn owned_type(&mut self, info: &Arc<TypeInfo>) -> &mut TypeConfig {
        self.declare(info, TypeCharacter::Owned, Location::caller())
    }

    fn declare(
        &mut self,
        info: &Arc<TypeInfo>,
        character: TypeCharacter,
        location: &'static Location<'static>,
    ) -> &mut TypeConfig {
        let index = match self.index.get(info.path()) {
            Some(&index) => {
                let previous = self.types[index].character;
                if previous != character {
                    self.issues.push(Issue::new(
                        IssueKind::CannotChangeTypeCharacter { previous },
                        IssueSource::of_type(info.path_arc()),
                        Some(location),
                    ));
                }
                index
            }
            None => {
                self.types.push(TypeConfig::new(info, character, location));
                let index = self.types.len() - 1;
                self.index.insert(Arc::clone(info.path_arc()), index);
                index
            }
        };
        &mut self.types[index]
    }

    /// Options applied to every declared type.
    #[inline]
    pub fn any_entity_type(&mut self) -> &mut AnyEntityConfig {
        &mut self.any_entity
    }

    #[track_caller]
    pub fn set_option<D: OptionDeclaration>(&mut self, value: D::Value) -> &mut Self {
        self.options.set::<D>(value, Some(Location::caller()));
        self
    }

    #[inline]
    pub fn options(&self) -> &OptionBag {
        &self.options
    }

    /// Declared types, in declaration order.
    #[inline]
    pub fn types(&self) -> &[TypeConfig] {
        &self.types
    }

    pub fn type_config(&self, path: &str) -> Option<&TypeConfig> {
        self.index.get(path).map(|&index| &self.types[index])
    }

    #[inline]
    pub fn any_entity_config(&self) -> &AnyEntityConfig {
        &self.any_entity
    }

    /// Issues found while the configuration was being written.
    #[inline]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

// -----------------------------------------------------------------------------
// Tests
