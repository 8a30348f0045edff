use core::ops::{Deref, DerefMut};
use std::sync::Arc;

use cl_config::{ContextConfig, Issue, IssueCollector, IssueSource};
use cl_utils::hash::HashMap;

use crate::compiler::{self, DISCRIMINATOR, EntityMeta};
use crate::dispatch::DispatchTree;
use crate::entity::Entity;
use crate::error::{ClutchError, RuntimeError};
use crate::extension::{Extension, ExtensionContext};
use crate::graph::TypeGraph;
use crate::handler::HandlerRegistry;
use crate::json::{JsonReader, JsonWriter};
use crate::notify::NotifyPropertyChanged;

// -----------------------------------------------------------------------------
// Codecs

/// The compiled types of a context and the discriminator dispatch over them.
pub struct Codecs {
    metas: Vec<Arc<EntityMeta>>,
    by_path: HashMap<Arc<str>, usize>,
    discriminators: DispatchTree<usize>,
}

impl Codecs {
    fn new(metas: Vec<Arc<EntityMeta>>) -> Self {
        let by_path = metas
            .iter()
            .enumerate()
            .map(|(index, meta)| (Arc::clone(meta.type_path_arc()), index))
            .collect();
        let discriminators = DispatchTree::new(
            metas
                .iter()
                .enumerate()
                .map(|(index, meta)| (meta.discriminator().as_bytes(), index)),
        );
        Self {
            metas,
            by_path,
            discriminators,
        }
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Looks a type up by full path, then by discriminator.
    fn meta(&self, name: &str) -> Option<&Arc<EntityMeta>> {
        let index = match self.by_path.get(name) {
            Some(&index) => index,
            None => *self.discriminators.lookup(name.as_bytes())?,
        };
        self.metas.get(index)
    }

    fn owns(&self, meta: &Arc<EntityMeta>) -> bool {
        self.by_path
            .get(meta.type_path())
            .is_some_and(|&index| Arc::ptr_eq(&self.metas[index], meta))
    }

    /// Writes an instance compiled by this context.
    pub(crate) fn write_entity(&self, entity: &Entity, writer: &mut JsonWriter) -> Result<(), RuntimeError> {
        if !self.owns(entity.meta()) {
            return Err(RuntimeError::new(format!(
                "Type '{}' is not part of this context",
                entity.type_path()
            )));
        }
        entity.meta().write(entity, writer, self)
    }

    /// Reads one `{"_t": ..., ...}` object.
    pub(crate) fn read_entity(&self, reader: &mut JsonReader<'_>) -> Result<Entity, RuntimeError> {
        reader.begin_object()?;
        let start = reader.position();
        match reader.next_property(0)? {
            Some(name) if name == DISCRIMINATOR => {}
            _ => {
                return Err(RuntimeError::at(
                    "Discriminator ('_t') should be the first property",
                    start,
                ));
            }
        }

        if !reader.is_string_next()? {
            return Err(reader.error("String value for discriminator (property name) is expected"));
        }
        let start = reader.position();
        let name = reader.read_string()?;
        let meta = self
            .discriminators
            .lookup(name.as_bytes())
            .and_then(|&index| self.metas.get(index))
            .ok_or_else(|| RuntimeError::at(format!("Type '{name}' not found"), start))?;

        meta.read_body(reader, self)
    }
}

// -----------------------------------------------------------------------------
// Context

/// A compiled set of types: creates instances and encodes or decodes them.
///
/// A context is immutable once built and can be shared between threads.
pub struct Context {
    codecs: Codecs,
    issues: Vec<Issue>,
}

impl Context {
    #[inline]
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Builds a context from the configuration `configure` records.
    pub fn build(configure: impl FnOnce(&mut ContextBuilder)) -> Result<Self, ClutchError> {
        let mut builder = ContextBuilder::new();
        configure(&mut builder);
        builder.build()
    }

    /// Creates an instance of the type with full path or discriminator `name`.
    pub fn create(&self, name: &str) -> Result<Entity, RuntimeError> {
        Ok(self.meta(name)?.create())
    }

    /// A factory creating instances of one type without a lookup.
    pub fn factory(&self, name: &str) -> Result<EntityFactory, RuntimeError> {
        Ok(EntityFactory {
            meta: Arc::clone(self.meta(name)?),
        })
    }

    pub fn meta(&self, name: &str) -> Result<&Arc<EntityMeta>, RuntimeError> {
        self.codecs.meta(name).ok_or_else(|| RuntimeError::type_not_found(name))
    }

    /// Compiled types in declaration order.
    pub fn metas(&self) -> impl Iterator<Item = &Arc<EntityMeta>> {
        self.codecs.metas.iter()
    }

    /// Encodes `entities` as a JSON array.
    pub fn serialize(&self, entities: &[Entity]) -> Result<String, RuntimeError> {
        let mut writer = JsonWriter::new();
        writer.begin_array()?;
        for entity in entities {
            self.codecs.write_entity(entity, &mut writer)?;
        }
        writer.end_array();
        Ok(writer.into_string())
    }

    /// Decodes a JSON array of discriminated objects.
    pub fn deserialize(&self, input: &[u8]) -> Result<Vec<Entity>, RuntimeError> {
        let mut reader = JsonReader::new(input);
        reader.begin_array()?;
        let mut entities = Vec::new();
        while reader.next_item(entities.len())? {
            entities.push(self.codecs.read_entity(&mut reader)?);
        }
        reader.finish()?;
        Ok(entities)
    }

    #[inline]
    pub fn deserialize_str(&self, input: &str) -> Result<Vec<Entity>, RuntimeError> {
        self.deserialize(input.as_bytes())
    }

    /// Warnings and infos reported while building.
    #[inline]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

/// Creates instances of one compiled type.
#[derive(Clone, Debug)]
pub struct EntityFactory {
    meta: Arc<EntityMeta>,
}

impl EntityFactory {
    #[inline]
    pub fn create(&self) -> Entity {
        self.meta.create()
    }

    #[inline]
    pub fn meta(&self) -> &Arc<EntityMeta> {
        &self.meta
    }
}

// -----------------------------------------------------------------------------
// ContextBuilder

/// Configuration of a context plus the extensions taking part in the build.
///
/// Dereferences to [`ContextConfig`] for the configuration calls.
pub struct ContextBuilder {
    config: ContextConfig,
    extensions: Vec<Box<dyn Extension>>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    /// A builder with the built-in extensions.
    pub fn new() -> Self {
        Self {
            config: ContextConfig::new(),
            extensions: vec![Box::new(NotifyPropertyChanged::default())],
        }
    }

    pub fn add_extension(&mut self, extension: impl Extension) -> &mut Self {
        self.extensions.push(Box::new(extension));
        self
    }

    /// Validates the configuration and compiles every declared type.
    ///
    /// Issues are checked after the configuration, after the graph is built
    /// and once more after handlers are resolved. The first error aborts the
    /// build.
    pub fn build(self) -> Result<Context, ClutchError> {
        let Self { config, mut extensions } = self;

        let mut issues = IssueCollector::new();
        issues.extend(config.issues().iter().cloned());
        issues.check()?;

        let graph = TypeGraph::build(&config, &mut issues);
        let cx = ExtensionContext {
            config: &config,
            graph: &graph,
        };
        for extension in &mut extensions {
            extension.validate(cx, &mut issues);
        }
        issues.check()?;

        let mut registry = HandlerRegistry::new(graph.declared().map(|node| Arc::clone(node.info().path_arc())));
        let mut handlers = Vec::new();
        for node in graph.declared() {
            let mut node_handlers = Vec::with_capacity(node.properties().len());
            for property in node.properties() {
                match registry.get(property.value_type()) {
                    Ok(handler) => node_handlers.push(handler),
                    Err(kind) => issues.report(
                        kind,
                        IssueSource::of_property(node.info().path_arc(), property.name_arc()),
                        property.location(),
                    ),
                }
            }
            handlers.push(node_handlers);
        }
        issues.check()?;

        let metas = compiler::compile(&graph, &handlers, &extensions, cx)?;
        log::debug!(
            "context built: {} types, {} issues",
            metas.len(),
            issues.issues().len()
        );
        Ok(Context {
            codecs: Codecs::new(metas),
            issues: issues.into_issues(),
        })
    }
}

impl Deref for ContextBuilder {
    type Target = ContextConfig;

    #[inline]
    fn deref(&self) -> &ContextConfig {
        &self.config
    }
}

impl DerefMut for ContextBuilder {
    #[inline]
    fn deref_mut(&mut self) -> &mut ContextConfig {
        &mut self.config
    }
}
