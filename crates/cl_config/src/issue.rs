use core::fmt;
use core::panic::Location;
use std::sync::Arc;

use thiserror::Error;

use crate::config::TypeCharacter;

// -----------------------------------------------------------------------------
// Severity

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    #[inline]
    pub fn log_level(self) -> log::Level {
        match self {
            Self::Error => log::Level::Error,
            Self::Warning => log::Level::Warn,
            Self::Info => log::Level::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
            Self::Info => f.write_str("info"),
        }
    }
}

// -----------------------------------------------------------------------------
// IssueKind

/// Everything a context build can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IssueKind {
    #[error("Multiple inheritance is not supported: '{first}' and '{second}' are both base types")]
    MultiInheritanceIsNotSupported { first: String, second: String },

    #[error("Type cannot derive from '{base}' which is configured as {base_character}")]
    CannotDeriveFromOtherTypeCharacter {
        base: String,
        base_character: TypeCharacter,
    },

    #[error("Type is already configured as {previous}")]
    CannotChangeTypeCharacter { previous: TypeCharacter },

    #[error("Sealed classes are not supported")]
    SealedClassesAreNotSupported,

    #[error("Parameterless constructor not found")]
    ParameterlessConstructorNotFound,

    #[error("Type name collision: '{type_path}' and '{other_path}' have the same name")]
    TypeNameCollisionIsNotSupported { type_path: String, other_path: String },

    #[error("Property '{property}' collides with '{other}' which has a different type")]
    PropertyCollisionBySignatureIsNotSupported { property: String, other: String },

    #[error("Property not found")]
    PropertyNotFound,

    #[error("Property must be declared as virtual")]
    PropertyMustBeDeclaredAsVirtual,

    #[error("Property must have a getter")]
    PropertyMustHaveGetter,

    #[error("Property must have a setter")]
    PropertyMustHaveSetter,

    #[error("Field '{field}' not found")]
    FieldNotFound { field: String },

    #[error("Backing field not found")]
    BackingFieldNotFound,

    #[error("Property type does not match the type '{field_type}' of field '{field}'")]
    PropertyAndFieldTypeMismatch { field_type: String, field: String },

    #[error("Member with name '{member}' is already declared")]
    MemberWithNameIsAlreadyDeclared { member: String },

    #[error("Type '{value_type}' is not supported")]
    TypeIsNotSupported { value_type: String },

    #[error("Default value '{value}' is not a value of type '{expected}'")]
    DefaultValueTypeMismatch { value: String, expected: String },

    #[error("Raise property changed method not found")]
    RaisePropertyChangedNotFound,

    #[error("Type declares a property changed event without implementing change notification")]
    ContainsPropertyChangedEvent,

    #[error("Field '{field}' is also referenced by property '{other_property}'")]
    FieldIsReferencedMoreThanOnce { field: String, other_property: String },

    #[error("Only field access mode is allowed on interface or abstract properties")]
    OnlyFieldAccessModeIsAllowedOnInterfaceOrAbstractProperty,

    #[error("Option '{option}' is set more than once, the last value '{value}' is used")]
    OptionIsSetMoreThanOnce { option: &'static str, value: String },

    #[error("Extension is not enabled explicitly: call '{enable}' along with '{configure}'")]
    ExtensionIsNotEnabledExplicitly {
        enable: &'static str,
        configure: &'static str,
    },

    #[error("Extension is disabled but '{option}' is used")]
    ExtensionIsUsedWhileDisabled { option: &'static str },

    #[error("Call '{call}' is redundant on this property")]
    CallIsRedundantOnProperty { call: &'static str },

    #[error("Default value '{value}' is redundant")]
    DefaultValueIsRedundant { value: String },
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::FieldIsReferencedMoreThanOnce { .. }
            | Self::OnlyFieldAccessModeIsAllowedOnInterfaceOrAbstractProperty
            | Self::OptionIsSetMoreThanOnce { .. }
            | Self::ExtensionIsNotEnabledExplicitly { .. }
            | Self::ExtensionIsUsedWhileDisabled { .. } => Severity::Warning,
            Self::CallIsRedundantOnProperty { .. } | Self::DefaultValueIsRedundant { .. } => Severity::Info,
            _ => Severity::Error,
        }
    }
}

// -----------------------------------------------------------------------------
// IssueSource

/// The configuration scope an issue refers to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IssueSource {
    Context,
    Type { path: Arc<str> },
    Property { type_path: Arc<str>, name: Arc<str> },
}

impl IssueSource {
    #[inline]
    pub fn of_type(path: &Arc<str>) -> Self {
        Self::Type {
            path: Arc::clone(path),
        }
    }

    #[inline]
    pub fn of_property(type_path: &Arc<str>, name: &Arc<str>) -> Self {
        Self::Property {
            type_path: Arc::clone(type_path),
            name: Arc::clone(name),
        }
    }
}

impl fmt::Display for IssueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context => f.write_str("context"),
            Self::Type { path } => write!(f, "type '{path}'"),
            Self::Property { type_path, name } => write!(f, "property '{type_path}.{name}'"),
        }
    }
}

// -----------------------------------------------------------------------------
// Issue

/// A reported configuration problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub source: IssueSource,
    /// Call site of the configuration call the issue stems from.
    pub location: Option<&'static Location<'static>>,
}

impl Issue {
    #[inline]
    pub fn new(kind: IssueKind, source: IssueSource, location: Option<&'static Location<'static>>) -> Self {
        Self {
            kind,
            source,
            location,
        }
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({}", self.severity(), self.kind, self.source)?;
        if let Some(location) = self.location {
            write!(f, ", at {location}")?;
        }
        f.write_str(")")
    }
}

// -----------------------------------------------------------------------------
// ConfigurationError

/// A build was aborted. No partially built context exists.
#[derive(Debug, Error, Clone)]
#[error("Invalid configuration: {first}")]
pub struct ConfigurationError {
    /// The first error reported.
    pub first: Issue,
    /// Every issue reported until the build stopped, in report order.
    pub issues: Vec<Issue>,
}

// -----------------------------------------------------------------------------
// IssueCollector

/// Accumulates the issues of one build.
///
/// Each issue is logged at the level of its severity when it is pushed.
#[derive(Clone, Debug, Default)]
pub struct IssueCollector {
    issues: Vec<Issue>,
}

impl IssueCollector {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        log::log!(issue.severity().log_level(), "{issue}");
        self.issues.push(issue);
    }

    #[inline]
    pub fn report(&mut self, kind: IssueKind, source: IssueSource, location: Option<&'static Location<'static>>) {
        self.push(Issue::new(kind, source, location));
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    #[inline]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity() == Severity::Error)
    }

    /// Fails with the first error, if any was reported.
    pub fn check(&self) -> Result<(), ConfigurationError> {
        match self.issues.iter().find(|i| i.severity() == Severity::Error) {
            Some(first) => Err(ConfigurationError {
                first: first.clone(),
                issues: self.issues.clone(),
            }),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Issue, IssueCollector, IssueKind, IssueSource, Severity};

    #[test]
    fn check_returns_first_error() {
        let path: Arc<str> = Arc::from("models::IRoot");
        let name: Arc<str> = Arc::from("RootInt");

        let mut issues = IssueCollector::new();
        issues.report(
            IssueKind::DefaultValueIsRedundant { value: "0".into() },
            IssueSource::of_property(&path, &name),
            None,
        );
        assert!(issues.check().is_ok());

        issues.report(IssueKind::PropertyNotFound, IssueSource::of_property(&path, &name), None);
        issues.report(IssueKind::SealedClassesAreNotSupported, IssueSource::of_type(&path), None);

        let error = issues.check().unwrap_err();
        assert_eq!(error.first.kind, IssueKind::PropertyNotFound);
        assert_eq!(error.issues.len(), 3);
        assert_eq!(
            error.to_string(),
            "Invalid configuration: error: Property not found (property 'models::IRoot.RootInt')"
        );
    }

    #[test]
    fn severities() {
        assert_eq!(IssueKind::PropertyNotFound.severity(), Severity::Error);
        assert_eq!(
            IssueKind::OptionIsSetMoreThanOnce {
                option: "has_field",
                value: "_a".into()
            }
            .severity(),
            Severity::Warning
        );
        assert_eq!(
            IssueKind::CallIsRedundantOnProperty { call: "has_field" }.severity(),
            Severity::Info
        );

        let issue = Issue::new(IssueKind::ParameterlessConstructorNotFound, IssueSource::Context, None);
        assert_eq!(issue.to_string(), "error: Parameterless constructor not found (context)");
    }
}
