use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::BindingError;

/// A single positional argument of a task invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// The task runner's execution-context handle. It is infrastructure,
    /// not data, so it carries no semantic identity for staleness.
    Context,
    Value(Value),
}

impl Arg {
    fn as_context_string(&self) -> String {
        match self {
            Arg::Context => "<context>".to_string(),
            Arg::Value(value) => display_value(value),
        }
    }
}

// The context marker hashes as a fixed sentinel if it ever appears past
// the leading position (the leading one is stripped before hashing).
impl Serialize for Arg {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Arg::Context => serializer.serialize_str("<context>"),
            Arg::Value(value) => value.serialize(serializer),
        }
    }
}

/// String form of an argument value for template substitution. Strings go
/// in bare, everything else uses its JSON rendering.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// The positional and named arguments of one call to a wrapped task.
/// Transient; exists only for the duration of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    pub(crate) positional: Vec<Arg>,
    pub(crate) named: BTreeMap<String, Value>,
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an invocation whose first positional argument is the task
    /// runner's execution context.
    pub fn with_context() -> Self {
        Self {
            positional: vec![Arg::Context],
            named: BTreeMap::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(Arg::Value(value.into()));
        self
    }

    /// Sets a named argument.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Positional arguments with the leading execution context stripped.
    pub(crate) fn semantic_args(&self) -> &[Arg] {
        match self.positional.first() {
            Some(Arg::Context) => &self.positional[1..],
            _ => &self.positional,
        }
    }
}

/// One declared parameter of a task's signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    default: Option<Value>,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(value.into()),
        }
    }
}

/// A task's declared parameter list, in positional order.
///
/// This is the statically known counterpart to runtime callable
/// introspection: template expansion binds an [`Invocation`] against it to
/// produce the substitution context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new(params: impl IntoIterator<Item = Param>) -> Self {
        Self {
            params: params.into_iter().collect(),
        }
    }

    /// Binds an invocation to the declared parameters: positional
    /// arguments in order, named arguments by name, declared defaults for
    /// the rest. Every parameter must end up bound.
    pub(crate) fn bind(
        &self,
        invocation: &Invocation,
    ) -> Result<BTreeMap<String, String>, BindingError> {
        if invocation.positional.len() > self.params.len() {
            return Err(BindingError::TooManyPositional {
                expected: self.params.len(),
                got: invocation.positional.len(),
            });
        }

        let mut bound = BTreeMap::new();
        for (param, arg) in self.params.iter().zip(&invocation.positional) {
            bound.insert(param.name.clone(), arg.as_context_string());
        }

        for (name, value) in &invocation.named {
            if !self.params.iter().any(|param| param.name == *name) {
                return Err(BindingError::UnknownArgument(name.clone()));
            }
            if bound.contains_key(name) {
                return Err(BindingError::DuplicateArgument(name.clone()));
            }
            bound.insert(name.clone(), display_value(value));
        }

        for param in &self.params {
            if !bound.contains_key(&param.name) {
                match &param.default {
                    Some(default) => {
                        bound.insert(param.name.clone(), display_value(default));
                    }
                    None => return Err(BindingError::MissingParameter(param.name.clone())),
                }
            }
        }

        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn binds_positional_named_and_defaults() {
        let signature = Signature::new([
            Param::required("name"),
            Param::required("count"),
            Param::with_default("mode", "debug"),
        ]);
        let invocation = Invocation::new().arg("main").named("count", 3);

        let bound = signature.bind(&invocation).unwrap();
        assert_eq!(bound["name"], "main");
        assert_eq!(bound["count"], "3");
        assert_eq!(bound["mode"], "debug");
    }

    #[test]
    fn context_binds_to_first_parameter() {
        let signature = Signature::new([Param::required("c"), Param::required("name")]);
        let invocation = Invocation::with_context().arg("main");

        let bound = signature.bind(&invocation).unwrap();
        assert_eq!(bound["c"], "<context>");
        assert_eq!(bound["name"], "main");
    }

    #[test]
    fn missing_required_parameter_errors() {
        let signature = Signature::new([Param::required("name")]);
        let err = signature.bind(&Invocation::new()).unwrap_err();
        assert_eq!(err, BindingError::MissingParameter("name".into()));
    }

    #[test]
    fn unknown_named_argument_errors() {
        let signature = Signature::new([Param::required("name")]);
        let invocation = Invocation::new().arg("main").named("nope", 1);
        let err = signature.bind(&invocation).unwrap_err();
        assert_eq!(err, BindingError::UnknownArgument("nope".into()));
    }

    #[test]
    fn parameter_bound_twice_errors() {
        let signature = Signature::new([Param::required("name")]);
        let invocation = Invocation::new().arg("main").named("name", "other");
        let err = signature.bind(&invocation).unwrap_err();
        assert_eq!(err, BindingError::DuplicateArgument("name".into()));
    }

    #[test]
    fn too_many_positional_errors() {
        let signature = Signature::new([Param::required("name")]);
        let invocation = Invocation::new().arg("a").arg("b");
        let err = signature.bind(&invocation).unwrap_err();
        assert_eq!(
            err,
            BindingError::TooManyPositional {
                expected: 1,
                got: 2
            }
        );
    }

    #[test]
    fn non_string_values_render_as_json() {
        assert_eq!(display_value(&json!("x")), "x");
        assert_eq!(display_value(&json!(3)), "3");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!([1, 2])), "[1,2]");
    }
}
