use serde::{Deserialize, Serialize};

use crate::options::{CollectionDefaultValue, DefaultValueHandling, PropertyAccessMode, PropertySetterMode};

/// A property configuration in data form.
///
/// Lets property options come from a file instead of code. Apply it with
/// [`PropertyConfig::apply`](crate::PropertyConfig::apply); absent entries
/// leave the scope untouched.
///
/// # Examples
///
/// ```
/// use cl_config::PropertyRequest;
/// use cl_config::options::PropertyAccessMode;
///
/// let request = PropertyRequest {
///     access_mode: Some(PropertyAccessMode::Property),
///     ..Default::default()
/// };
/// assert!(request.field.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertyRequest {
    pub access_mode: Option<PropertyAccessMode>,
    pub field: Option<String>,
    pub setter_mode: Option<PropertySetterMode>,
    pub default_value_handling: Option<DefaultValueHandling>,
    pub collection_default: Option<CollectionDefaultValue>,
}

// -----------------------------------------------------------------------------
// Tests
