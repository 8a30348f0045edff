//! Builds contexts over the types in [`models`] and exercises them end to end.

mod access;
mod notify;
mod robustness;

use cl_config::{ConfigurationError, Issue, IssueKind, Severity};

use crate::{ClutchError, Context, ContextBuilder};

/// Builds a context, failing the test on any error.
fn build(configure: impl FnOnce(&mut ContextBuilder)) -> Context {
    match Context::build(configure) {
        Ok(context) => context,
        Err(err) => panic!("configuration failed: {err}"),
    }
}

/// Builds a context, failing the test unless the configuration is rejected.
fn build_fails(configure: impl FnOnce(&mut ContextBuilder)) -> ConfigurationError {
    match Context::build(configure) {
        Ok(_) => panic!("configuration succeeded"),
        Err(ClutchError::Configuration(err)) => err,
        Err(err) => panic!("unexpected error: {err}"),
    }
}

/// Builds a context and asserts it reports no warnings or infos.
fn build_clean(configure: impl FnOnce(&mut ContextBuilder)) -> Context {
    let context = build(configure);
    assert!(context.issues().is_empty(), "unexpected issues: {:?}", context.issues());
    context
}

fn kinds(issues: &[Issue], severity: Severity) -> Vec<&IssueKind> {
    issues
        .iter()
        .filter(|i| i.severity() == severity)
        .map(|i| &i.kind)
        .collect()
}
