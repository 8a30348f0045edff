//! Compiles graph nodes into [`EntityMeta`], the runtime form of a type.
//!
//! Every storage decision is made here once: which slot or source accessor
//! a property reads, writes and initializes through, what it is
//! initialized with, and which extension hooks its setter runs.

mod codec;

use core::fmt;
use std::sync::Arc;

use cl_config::TypeCharacter;
use cl_config::options::{DefaultValueHandling, PropertyAccessMode, PropertySetterMode};
use cl_reflect::info::{Constructor, Getter, Setter, TypeInfo, ValueType};
use cl_reflect::{FieldLayout, Fields, Value};

pub use codec::DISCRIMINATOR;

use crate::dispatch::DispatchTree;
use crate::error::InternalError;
use crate::extension::{Extension, ExtensionContext, SetterHooks, StateFactory};
use crate::graph::{GraphNode, GraphProperty, TypeGraph};
use crate::handler::TypeHandler;

// -----------------------------------------------------------------------------
// PropertyMeta

/// A storage access path.
#[derive(Clone)]
enum Access<T> {
    Slot(usize),
    Source(T),
}

/// The compiled form of one property.
pub struct PropertyMeta {
    index: usize,
    name: Arc<str>,
    value_type: ValueType,
    handler: TypeHandler,
    access_mode: PropertyAccessMode,
    setter_mode: PropertySetterMode,
    default_handling: DefaultValueHandling,
    slot: Option<usize>,
    read: Access<Getter>,
    write: Access<Setter>,
    init: Access<Setter>,
    initial_value: Option<Value>,
    omit_value: Value,
    hooks: SetterHooks,
}

impl PropertyMeta {
    /// Position in the type's property list.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[inline]
    pub fn handler(&self) -> &TypeHandler {
        &self.handler
    }

    #[inline]
    pub fn access_mode(&self) -> PropertyAccessMode {
        self.access_mode
    }

    #[inline]
    pub fn setter_mode(&self) -> PropertySetterMode {
        self.setter_mode
    }

    #[inline]
    pub fn default_handling(&self) -> DefaultValueHandling {
        self.default_handling
    }

    /// The bound field slot, if any.
    #[inline]
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    /// What new instances are initialized with beyond the system default.
    #[inline]
    pub fn initial_value(&self) -> Option<&Value> {
        self.initial_value.as_ref()
    }

    #[inline]
    pub fn hooks(&self) -> &SetterHooks {
        &self.hooks
    }

    /// Reads the value through the generated getter.
    pub(crate) fn read(&self, fields: &Fields) -> Value {
        match &self.read {
            Access::Slot(slot) => fields.get_at(*slot).cloned().unwrap_or_default(),
            Access::Source(getter) => getter(fields),
        }
    }

    /// Writes the value as the generated setter does, without hooks.
    pub(crate) fn write(&self, fields: &mut Fields, value: Value) {
        store(&self.write, fields, value);
    }

    /// Writes the value on creation and decoding.
    pub(crate) fn init(&self, fields: &mut Fields, value: Value) {
        store(&self.init, fields, value);
    }

    /// Returns `true` if encoding may skip `value`.
    pub(crate) fn is_omitted(&self, value: &Value) -> bool {
        self.default_handling == DefaultValueHandling::IgnoreAndPopulate && self.handler.compare(value, &self.omit_value)
    }
}

fn store(access: &Access<Setter>, fields: &mut Fields, value: Value) {
    match access {
        Access::Slot(slot) => {
            fields.set_at(*slot, value);
        }
        Access::Source(setter) => setter(fields, value),
    }
}

impl fmt::Debug for PropertyMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMeta")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("access_mode", &self.access_mode)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// EntityMeta

/// The compiled form of one declared type, shared by all its instances.
pub struct EntityMeta {
    type_path: Arc<str>,
    discriminator: Arc<str>,
    info: Arc<TypeInfo>,
    character: TypeCharacter,
    layout: Arc<FieldLayout>,
    constructors: Vec<Constructor>,
    properties: Vec<PropertyMeta>,
    property_tree: DispatchTree<usize>,
    states: Vec<StateFactory>,
}

impl EntityMeta {
    #[inline]
    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    #[inline]
    pub fn type_path_arc(&self) -> &Arc<str> {
        &self.type_path
    }

    #[inline]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
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
    pub fn layout(&self) -> &Arc<FieldLayout> {
        &self.layout
    }

    #[inline]
    pub fn properties(&self) -> &[PropertyMeta] {
        &self.properties
    }

    #[inline]
    pub fn property_at(&self, index: usize) -> Option<&PropertyMeta> {
        self.properties.get(index)
    }

    /// Looks a property up through the dispatch tree.
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.property_tree.lookup(name.as_bytes()).copied()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyMeta> {
        self.properties.get(self.property_index(name)?)
    }
}

impl fmt::Debug for EntityMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMeta")
            .field("type_path", &self.type_path)
            .field("discriminator", &self.discriminator)
            .field("character", &self.character)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Compilation

/// Compiles every declared node of `graph`.
///
/// `handlers` holds, per declared node in declaration order, the handler of
/// each property.
pub(crate) fn compile(
    graph: &TypeGraph,
    handlers: &[Vec<TypeHandler>],
    extensions: &[Box<dyn Extension>],
    cx: ExtensionContext<'_>,
) -> Result<Vec<Arc<EntityMeta>>, InternalError> {
    graph
        .declared()
        .zip(handlers)
        .map(|(node, handlers)| compile_node(node, handlers, extensions, cx).map(Arc::new))
        .collect()
}

fn compile_node(
    node: &GraphNode,
    handlers: &[TypeHandler],
    extensions: &[Box<dyn Extension>],
    cx: ExtensionContext<'_>,
) -> Result<EntityMeta, InternalError> {
    let info = node.info();
    let character = node
        .character()
        .ok_or_else(|| InternalError(format!("Type '{}' is not declared", node.path())))?;
    if handlers.len() != node.properties().len() {
        return Err(InternalError(format!("Handlers of '{}' are incomplete", node.path())));
    }

    // Class fields root first, then the generated ones.
    let mut layout = FieldLayout::new();
    let mut constructors = Vec::new();
    if info.is_class() {
        let mut chain: Vec<&Arc<TypeInfo>> = info.base_classes().collect();
        chain.reverse();
        chain.push(info);
        for ty in chain {
            for field in ty.fields() {
                layout.push(field.name(), field.value_type().clone());
            }
            constructors.extend(ty.constructor().cloned());
        }
    }
    for field in node.generated_fields() {
        layout.push(field.name(), field.value_type().clone());
    }
    let layout = layout.into_shared();

    let mut properties = Vec::with_capacity(node.properties().len());
    for (index, (property, handler)) in node.properties().iter().zip(handlers).enumerate() {
        let mut hooks = SetterHooks::default();
        for extension in extensions {
            extension.contribute_setter(cx, node, property, &mut hooks);
        }
        properties.push(compile_property(node, index, property, handler, &layout, hooks)?);
    }

    let property_tree = DispatchTree::new(properties.iter().map(|p| (p.name.as_bytes(), p.index)));

    let mut states = Vec::new();
    for extension in extensions {
        extension.contribute_type(cx, node, &mut states);
    }

    log::trace!(
        "compiled '{}': {} properties, {} slots",
        node.path(),
        properties.len(),
        layout.len()
    );

    Ok(EntityMeta {
        type_path: Arc::clone(info.path_arc()),
        discriminator: Arc::from(node.discriminator()),
        info: Arc::clone(info),
        character,
        layout,
        constructors,
        properties,
        property_tree,
        states,
    })
}

fn compile_property(
    node: &GraphNode,
    index: usize,
    property: &GraphProperty,
    handler: &TypeHandler,
    layout: &FieldLayout,
    hooks: SetterHooks,
) -> Result<PropertyMeta, InternalError> {
    let missing = |what: &str| {
        InternalError(format!(
            "Property '{}.{}' has no {what}",
            node.path(),
            property.name()
        ))
    };

    let slot = match property.binding().field() {
        Some(field) => Some(layout.slot(field).ok_or_else(|| missing("field slot"))?),
        None => None,
    };
    let source = property.source();
    let mode = property.access_mode();

    let access = |uses_field: bool, accessor: Option<&Setter>, what: &str| -> Result<Access<Setter>, InternalError> {
        match (uses_field, slot, accessor) {
            (true, Some(slot), _) => Ok(Access::Slot(slot)),
            (false, _, Some(setter)) => Ok(Access::Source(Arc::clone(setter))),
            _ => Err(missing(what)),
        }
    };

    let read = match (mode.reads_field(), slot, source.getter()) {
        (true, Some(slot), _) => Access::Slot(slot),
        (false, _, Some(getter)) => Access::Source(Arc::clone(getter)),
        _ => return Err(missing("getter")),
    };
    let write = access(mode.writes_field(), source.setter(), "setter")?;
    let init = access(mode.initializes_field(), source.setter(), "initializer")?;

    Ok(PropertyMeta {
        index,
        name: Arc::clone(property.name_arc()),
        value_type: property.value_type().clone(),
        handler: handler.clone(),
        access_mode: mode,
        setter_mode: property.setter_mode(),
        default_handling: property.default_handling(),
        slot,
        read,
        write,
        init,
        initial_value: property.initial_value().cloned(),
        omit_value: property
            .initial_value()
            .cloned()
            .unwrap_or_else(|| property.value_type().system_default()),
        hooks,
    })
}
