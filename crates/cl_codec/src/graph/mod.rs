//! The type graph of a context.
//!
//! Every declared type becomes a [`GraphNode`], together with every ancestor
//! it was reached through. Undeclared ancestors are kept in the graph but
//! only declared nodes take part in the inheritance chain: a node's
//! [`base_nodes`](GraphNode::base_nodes) are its declared ancestors,
//! nearest first.
//!
//! Building the graph validates the type-level rules (single inheritance,
//! character, sealed classes, constructors, discriminators) and resolves
//! every property of every declared type: merged options, access mode,
//! storage binding and default value. Problems are reported to an
//! [`IssueCollector`]; the graph is built completely either way.

mod members;
mod properties;

use core::panic::Location;
use std::sync::Arc;

use cl_config::options::{DefaultValueHandling, PropertyAccessMode, PropertySetterMode};
use cl_config::{ContextConfig, IssueCollector, IssueKind, IssueSource, OptionBag, TypeCharacter, TypeConfig};
use cl_reflect::Value;
use cl_reflect::info::{FieldInfo, PropertyInfo, TypeInfo, ValueType};
use cl_utils::hash::HashMap;

// -----------------------------------------------------------------------------
// GraphProperty

/// Where the generated accessors of a property keep the value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    /// Only the property's own getter and setter are used.
    Accessors,
    /// A field, either declared by the type or generated by the build.
    Field { name: Arc<str>, generated: bool },
}

impl Binding {
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Accessors => None,
            Self::Field { name, .. } => Some(name),
        }
    }
}

/// A resolved property of a declared type.
#[derive(Clone, Debug)]
pub struct GraphProperty {
    name: Arc<str>,
    value_type: ValueType,
    source: PropertyInfo,
    options: OptionBag,
    access_mode: PropertyAccessMode,
    setter_mode: PropertySetterMode,
    default_handling: DefaultValueHandling,
    binding: Binding,
    default_value: Option<Value>,
    initial_value: Option<Value>,
    location: Option<&'static Location<'static>>,
}

impl GraphProperty {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// The property as declared by its source type.
    #[inline]
    pub fn source(&self) -> &PropertyInfo {
        &self.source
    }

    #[inline]
    pub fn declaring_type(&self) -> &str {
        self.source.declaring_type()
    }

    /// Options after merging every applicable scope.
    #[inline]
    pub fn options(&self) -> &OptionBag {
        &self.options
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

    #[inline]
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// The configured default, unless it equals the system default.
    #[inline]
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// What a new instance is initialized with beyond the system default:
    /// the default value, or an empty list for collections.
    #[inline]
    pub fn initial_value(&self) -> Option<&Value> {
        self.initial_value.as_ref()
    }

    #[inline]
    pub fn location(&self) -> Option<&'static Location<'static>> {
        self.location
    }
}

// -----------------------------------------------------------------------------
// GraphNode

/// A type of the graph.
#[derive(Clone, Debug)]
pub struct GraphNode {
    index: usize,
    info: Arc<TypeInfo>,
    discriminator: Arc<str>,
    character: Option<TypeCharacter>,
    base_nodes: Vec<usize>,
    derived_nodes: Vec<usize>,
    options: OptionBag,
    properties: Vec<GraphProperty>,
    generated_fields: Vec<FieldInfo>,
    location: Option<&'static Location<'static>>,
}

impl GraphNode {
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn info(&self) -> &Arc<TypeInfo> {
        &self.info
    }

    #[inline]
    pub fn path(&self) -> &str {
        self.info.path()
    }

    /// The `_t` value of the type.
    #[inline]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// `None` for ancestors that are not declared.
    #[inline]
    pub fn character(&self) -> Option<TypeCharacter> {
        self.character
    }

    #[inline]
    pub fn is_declared(&self) -> bool {
        self.character.is_some()
    }

    /// Declared ancestors, nearest first.
    #[inline]
    pub fn base_nodes(&self) -> &[usize] {
        &self.base_nodes
    }

    /// Declared descendants.
    #[inline]
    pub fn derived_nodes(&self) -> &[usize] {
        &self.derived_nodes
    }

    /// Type level options, merged with the nearest ancestor and the context.
    #[inline]
    pub fn options(&self) -> &OptionBag {
        &self.options
    }

    /// Resolved properties, inherited ones first.
    #[inline]
    pub fn properties(&self) -> &[GraphProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&GraphProperty> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Fields the build adds to the type's own.
    #[inline]
    pub fn generated_fields(&self) -> &[FieldInfo] {
        &self.generated_fields
    }

    #[inline]
    pub fn location(&self) -> Option<&'static Location<'static>> {
        self.location
    }

    /// The node itself if declared, followed by its declared ancestors.
    fn chain(&self) -> Vec<usize> {
        let mut chain = Vec::with_capacity(self.base_nodes.len() + 1);
        if self.is_declared() {
            chain.push(self.index);
        }
        chain.extend_from_slice(&self.base_nodes);
        chain
    }
}

// -----------------------------------------------------------------------------
// TypeGraph

#[derive(Debug, Default)]
pub struct TypeGraph {
    nodes: Vec<GraphNode>,
    by_path: HashMap<Arc<str>, usize>,
    discriminators: HashMap<Arc<str>, usize>,
    declared: Vec<usize>,
}

impl TypeGraph {
    /// Builds the graph of every type declared in `config`.
    pub fn build(config: &ContextConfig, issues: &mut IssueCollector) -> Self {
        report_repeated_options(config, issues);

        let mut builder = GraphBuilder {
            config,
            issues,
            graph: Self::default(),
        };
        for type_config in config.types() {
            let index = builder.process(type_config.info());
            if !builder.graph.declared.contains(&index) {
                builder.graph.declared.push(index);
            }
        }
        builder.resolve_properties();

        log::trace!(
            "type graph: {} nodes, {} declared",
            builder.graph.nodes.len(),
            builder.graph.declared.len()
        );
        builder.graph
    }

    #[inline]
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.nodes.get(index)
    }

    pub fn node_by_path(&self, path: &str) -> Option<&GraphNode> {
        self.nodes.get(*self.by_path.get(path)?)
    }

    pub fn node_by_discriminator(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(*self.discriminators.get(name)?)
    }

    /// Declared nodes in declaration order.
    pub fn declared(&self) -> impl Iterator<Item = &GraphNode> {
        self.declared.iter().map(|&index| &self.nodes[index])
    }
}

// -----------------------------------------------------------------------------
// Building

struct GraphBuilder<'a> {
    config: &'a ContextConfig,
    issues: &'a mut IssueCollector,
    graph: TypeGraph,
}

impl GraphBuilder<'_> {
    /// Adds `info` and its ancestors, returning the node index.
    fn process(&mut self, info: &Arc<TypeInfo>) -> usize {
        if let Some(&index) = self.graph.by_path.get(info.path()) {
            return index;
        }

        let mut bases = Vec::new();
        for base in info.base().cloned().into_iter().chain(info.all_interfaces()) {
            bases.push(self.process(&base));
        }

        let chains: Vec<Vec<usize>> = bases.iter().map(|&base| self.graph.nodes[base].chain()).collect();
        // The longest chain wins, the first one on ties.
        let mut primary: &[usize] = &[];
        for chain in &chains {
            if chain.len() > primary.len() {
                primary = chain;
            }
        }

        let type_config = self.config.type_config(info.path());
        let mut node = GraphNode {
            index: self.graph.nodes.len(),
            info: Arc::clone(info),
            discriminator: Arc::from(info.name()),
            character: type_config.map(TypeConfig::character),
            base_nodes: primary.to_vec(),
            derived_nodes: Vec::new(),
            options: OptionBag::new(),
            properties: Vec::new(),
            generated_fields: Vec::new(),
            location: type_config.map(TypeConfig::location),
        };

        if let Some(type_config) = type_config {
            self.validate_type(&node, &chains);
            node.options = type_config.options().clone();
            if let Some(&nearest) = node.base_nodes.first() {
                node.options.merge(&self.graph.nodes[nearest].options);
            }
            node.options.merge(self.config.any_entity_config().options());
        }

        let index = node.index;
        for &base in &node.base_nodes {
            self.graph.nodes[base].derived_nodes.push(index);
        }
        self.graph.by_path.insert(Arc::clone(info.path_arc()), index);
        self.graph.nodes.push(node);
        index
    }

    fn validate_type(&mut self, node: &GraphNode, chains: &[Vec<usize>]) {
        let info = &node.info;
        let source = IssueSource::of_type(info.path_arc());

        if let Some(&first) = node.base_nodes.first()
            && let Some(other) = chains
                .iter()
                .find(|chain| chain.iter().any(|n| !node.base_nodes.contains(n)))
            && let Some(&second) = other.first()
        {
            let kind = IssueKind::MultiInheritanceIsNotSupported {
                first: self.graph.nodes[first].path().to_string(),
                second: self.graph.nodes[second].path().to_string(),
            };
            self.issues.report(kind, source.clone(), node.location);
        }

        if info.is_class() {
            if info.is_sealed() {
                self.issues
                    .report(IssueKind::SealedClassesAreNotSupported, source.clone(), node.location);
            }
            if !info.has_default_constructor() {
                self.issues
                    .report(IssueKind::ParameterlessConstructorNotFound, source.clone(), node.location);
            }
        }

        if let Some(&nearest) = node.base_nodes.first() {
            let base = &self.graph.nodes[nearest];
            if base.character != node.character {
                let kind = IssueKind::CannotDeriveFromOtherTypeCharacter {
                    base: base.path().to_string(),
                    base_character: base.character.unwrap_or(TypeCharacter::Entity),
                };
                self.issues.report(kind, source.clone(), node.location);
            }
        }

        match self.graph.discriminators.get(node.discriminator()) {
            Some(&other) => {
                let kind = IssueKind::TypeNameCollisionIsNotSupported {
                    type_path: node.path().to_string(),
                    other_path: self.graph.nodes[other].path().to_string(),
                };
                self.issues.report(kind, source, node.location);
            }
            None => {
                self.graph
                    .discriminators
                    .insert(Arc::clone(&node.discriminator), node.index);
            }
        }
    }
}

fn report_repeated(options: &OptionBag, source: &IssueSource, issues: &mut IssueCollector) {
    for repeated in options.repeated() {
        let kind = IssueKind::OptionIsSetMoreThanOnce {
            option: repeated.name,
            value: repeated.value,
        };
        issues.report(kind, source.clone(), repeated.location);
    }
}

fn report_repeated_options(config: &ContextConfig, issues: &mut IssueCollector) {
    report_repeated(config.options(), &IssueSource::Context, issues);
    let any_entity = config.any_entity_config();
    report_repeated(any_entity.options(), &IssueSource::Context, issues);
    if let Some(any_property) = any_entity.any_property_config() {
        report_repeated(any_property.options(), &IssueSource::Context, issues);
    }

    for type_config in config.types() {
        let path = type_config.info().path_arc();
        let source = IssueSource::of_type(path);
        report_repeated(type_config.options(), &source, issues);
        report_repeated(type_config.any_property_config(false).options(), &source, issues);
        report_repeated(type_config.any_property_config(true).options(), &source, issues);

        for property in type_config.properties() {
            if let Some(name) = property.name() {
                let source = IssueSource::of_property(path, &Arc::from(name));
                report_repeated(property.options(), &source, issues);
            }
        }
    }
}

/// `Type Declaring.Name`, used in collision reports.
fn describe_property(property: &PropertyInfo) -> String {
    let declaring = property.declaring_type();
    let short = declaring.rsplit("::").next().unwrap_or(declaring);
    format!("{} {short}.{}", property.value_type(), property.name())
}

/// A default value as shown in diagnostics.
fn render_value(value: &Value) -> String {
    match value {
        Value::Char(c) => c.escape_default().to_string(),
        value => value.to_string(),
    }
}
