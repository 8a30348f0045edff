use core::any::{Any, TypeId};
use core::fmt;
use core::panic::Location;
use std::sync::Arc;

use cl_utils::TypeIdMap;

use crate::options::OptionDeclaration;

// -----------------------------------------------------------------------------
// OptionCall

/// One recorded call of an option setter.
#[derive(Clone)]
pub struct OptionCall {
    value: Arc<dyn Any + Send + Sync>,
    rendered: Arc<str>,
    location: Option<&'static Location<'static>>,
}

impl OptionCall {
    /// The value as text, for diagnostics.
    #[inline]
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    #[inline]
    pub fn location(&self) -> Option<&'static Location<'static>> {
        self.location
    }
}

impl fmt::Debug for OptionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionCall")
            .field("value", &self.rendered)
            .field("location", &self.location)
            .finish()
    }
}

#[derive(Clone, Debug)]
struct OptionSlot {
    name: &'static str,
    calls: Vec<OptionCall>,
}

/// An option that was set more than once on the same bag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepeatedOption {
    pub name: &'static str,
    /// The effective, last value.
    pub value: String,
    pub location: Option<&'static Location<'static>>,
}

// -----------------------------------------------------------------------------
// OptionBag

/// Options of one configuration scope, keyed by declaration.
///
/// Every call is kept; the last one is effective. The bag never reports
/// anything by itself.
///
/// # Examples
///
/// ```
/// use cl_config::OptionBag;
/// use cl_config::options::{PropertySetterMode, UsePropertySetterMode};
///
/// let mut parent = OptionBag::new();
/// parent.set::<UsePropertySetterMode>(PropertySetterMode::CompareAndSet, None);
///
/// let mut child = OptionBag::new();
/// assert_eq!(child.value_or_default::<UsePropertySetterMode>(), Some(PropertySetterMode::Set));
///
/// child.merge(&parent);
/// assert_eq!(child.get::<UsePropertySetterMode>(), Some(&PropertySetterMode::CompareAndSet));
/// ```
#[derive(Clone, Debug, Default)]
pub struct OptionBag {
    slots: TypeIdMap<OptionSlot>,
}

impl OptionBag {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a call of `D` with `value`.
    pub fn set<D: OptionDeclaration>(&mut self, value: D::Value, location: Option<&'static Location<'static>>) {
        let call = OptionCall {
            rendered: Arc::from(value.to_string()),
            value: Arc::new(value),
            location,
        };
        let slot = self.slots.get_or_insert(TypeId::of::<D>(), || OptionSlot {
            name: D::NAME,
            calls: Vec::new(),
        });
        slot.calls.push(call);
    }

    /// The last call of `D`.
    pub fn call<D: OptionDeclaration>(&self) -> Option<&OptionCall> {
        self.slots.get_type::<D>()?.calls.last()
    }

    /// The effective value of `D`, if any scope set it.
    pub fn get<D: OptionDeclaration>(&self) -> Option<&D::Value> {
        self.call::<D>()?.value.downcast_ref::<D::Value>()
    }

    /// The effective value of `D`, or the declaration's default.
    pub fn value_or_default<D: OptionDeclaration>(&self) -> Option<D::Value> {
        self.get::<D>().cloned().or_else(D::default_value)
    }

    #[inline]
    pub fn contains<D: OptionDeclaration>(&self) -> bool {
        self.call::<D>().is_some()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|(_, slot)| slot.calls.is_empty())
    }

    /// Fills options missing here with the last call from `from`.
    ///
    /// Options already set here are never overwritten.
    pub fn merge(&mut self, from: &OptionBag) {
        for (id, slot) in from.slots.iter() {
            let Some(last) = slot.calls.last() else {
                continue;
            };
            let own = self.slots.get_or_insert(*id, || OptionSlot {
                name: slot.name,
                calls: Vec::new(),
            });
            if own.calls.is_empty() {
                own.calls.push(last.clone());
            }
        }
    }

    /// Options called more than once, sorted by name.
    pub fn repeated(&self) -> Vec<RepeatedOption> {
        let mut out: Vec<RepeatedOption> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.calls.len() > 1)
            .filter_map(|(_, slot)| {
                let last = slot.calls.last()?;
                Some(RepeatedOption {
                    name: slot.name,
                    value: last.rendered.to_string(),
                    location: last.location,
                })
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(b.name));
        out
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::OptionBag;
    use crate::options::{FieldName, HasDefaultValue, UseDefaultValueHandling, UsePropertyAccessMode};
    use crate::options::{DefaultValueHandling, PropertyAccessMode};
    use cl_reflect::Value;

    #[test]
    fn last_call_wins() {
        let mut bag = OptionBag::new();
        assert!(bag.is_empty());
        assert!(bag.get::<FieldName>().is_none());

        bag.set::<FieldName>("_a".to_owned(), None);
        bag.set::<FieldName>("_b".to_owned(), None);
        assert_eq!(bag.get::<FieldName>().map(String::as_str), Some("_b"));
        assert_eq!(bag.call::<FieldName>().unwrap().rendered(), "_b");
    }

    #[test]
    fn merge_only_fills_gaps() {
        let mut own = OptionBag::new();
        own.set::<UsePropertyAccessMode>(PropertyAccessMode::Property, None);

        let mut parent = OptionBag::new();
        parent.set::<UsePropertyAccessMode>(PropertyAccessMode::Field, None);
        parent.set::<UseDefaultValueHandling>(DefaultValueHandling::IgnoreAndPopulate, None);
        parent.set::<UseDefaultValueHandling>(DefaultValueHandling::Include, None);

        own.merge(&parent);
        assert_eq!(own.get::<UsePropertyAccessMode>(), Some(&PropertyAccessMode::Property));
        assert_eq!(own.get::<UseDefaultValueHandling>(), Some(&DefaultValueHandling::Include));

        // Merged options count as a single call.
        assert!(own.repeated().is_empty());
        assert_eq!(parent.repeated().len(), 1);
    }

    #[test]
    fn repeated_is_sorted_by_name() {
        let mut bag = OptionBag::new();
        bag.set::<UsePropertyAccessMode>(PropertyAccessMode::Field, None);
        bag.set::<UsePropertyAccessMode>(PropertyAccessMode::Property, None);
        bag.set::<HasDefaultValue>(Value::I32(1), None);
        bag.set::<HasDefaultValue>(Value::I32(2), None);

        let repeated = bag.repeated();
        let names: Vec<_> = repeated.iter().map(|r| r.name).collect();
        assert_eq!(names, ["has_default_value", "use_property_access_mode"]);
        assert_eq!(repeated[0].value, "2");
        assert_eq!(repeated[1].value, "Property");
    }

    #[test]
    fn declaration_defaults() {
        let bag = OptionBag::new();
        assert_eq!(
            bag.value_or_default::<UsePropertyAccessMode>(),
            Some(PropertyAccessMode::FieldForGetterAndInitializationPropertyForSetter)
        );
        assert_eq!(bag.value_or_default::<FieldName>(), None);
    }
}
