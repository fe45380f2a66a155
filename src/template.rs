use std::borrow::Cow;
use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::DependsError;
use crate::invocation::{Invocation, Signature};

/// One declared input or output path.
///
/// A concrete path passes through expansion unchanged; a pattern gets its
/// `${name}` placeholders substituted from the bound invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    Path(Utf8PathBuf),
    Pattern(String),
}

impl From<&str> for Template {
    fn from(pattern: &str) -> Self {
        Template::Pattern(pattern.to_string())
    }
}

impl From<String> for Template {
    fn from(pattern: String) -> Self {
        Template::Pattern(pattern)
    }
}

impl From<Utf8PathBuf> for Template {
    fn from(path: Utf8PathBuf) -> Self {
        Template::Path(path)
    }
}

impl From<&Utf8Path> for Template {
    fn from(path: &Utf8Path) -> Self {
        Template::Path(path.to_owned())
    }
}

/// A possibly-nested path declaration: scalars and nested sequences of
/// scalars, flattened in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Templates {
    One(Template),
    Many(Vec<Templates>),
}

impl Templates {
    pub(crate) fn flatten(self) -> Vec<Template> {
        let mut flat = Vec::new();
        self.collect_into(&mut flat);
        flat
    }

    fn collect_into(self, flat: &mut Vec<Template>) {
        match self {
            Templates::One(template) => flat.push(template),
            Templates::Many(items) => {
                for item in items {
                    item.collect_into(flat);
                }
            }
        }
    }
}

impl From<Template> for Templates {
    fn from(template: Template) -> Self {
        Templates::One(template)
    }
}

impl From<&str> for Templates {
    fn from(pattern: &str) -> Self {
        Templates::One(pattern.into())
    }
}

impl From<String> for Templates {
    fn from(pattern: String) -> Self {
        Templates::One(pattern.into())
    }
}

impl From<Utf8PathBuf> for Templates {
    fn from(path: Utf8PathBuf) -> Self {
        Templates::One(path.into())
    }
}

impl From<&Utf8Path> for Templates {
    fn from(path: &Utf8Path) -> Self {
        Templates::One(path.into())
    }
}

impl<T: Into<Templates>> From<Vec<T>> for Templates {
    fn from(items: Vec<T>) -> Self {
        Templates::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Templates>, const N: usize> From<[T; N]> for Templates {
    fn from(items: [T; N]) -> Self {
        Templates::Many(items.into_iter().map(Into::into).collect())
    }
}

/// Substitutes `${name}` placeholders from `context`, leaving unknown
/// names untouched rather than failing.
pub(crate) fn substitute<'a>(pattern: &'a str, context: &BTreeMap<String, String>) -> Cow<'a, str> {
    shellexpand::env_with_context_no_errors(pattern, |name| context.get(name).cloned())
}

/// Resolves path templates into concrete paths, same length and order as
/// the input. The invocation is bound to the declared signature once and
/// the resulting name → string map drives substitution.
pub(crate) fn expand(
    templates: &[Template],
    signature: &Signature,
    invocation: &Invocation,
) -> Result<Vec<Utf8PathBuf>, DependsError> {
    let context = signature.bind(invocation)?;

    Ok(templates
        .iter()
        .map(|template| match template {
            Template::Path(path) => path.clone(),
            Template::Pattern(pattern) => {
                Utf8PathBuf::from(substitute(pattern, &context).into_owned())
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::Param;

    #[test]
    fn nested_declarations_flatten_in_order() {
        let declared = Templates::from(vec![
            Templates::from("a.txt"),
            Templates::from(vec!["b.txt", "c.txt"]),
            Templates::from(Utf8PathBuf::from("d.txt")),
        ]);

        let flat = declared.flatten();
        assert_eq!(
            flat,
            vec![
                Template::Pattern("a.txt".into()),
                Template::Pattern("b.txt".into()),
                Template::Pattern("c.txt".into()),
                Template::Path("d.txt".into()),
            ]
        );
    }

    #[test]
    fn placeholders_resolve_from_bound_arguments() {
        let signature = Signature::new([
            Param::required("name"),
            Param::with_default("ext", "txt"),
        ]);
        let invocation = Invocation::new().named("name", "main");
        let templates = vec![Template::from("output-${name}.${ext}")];

        let paths = expand(&templates, &signature, &invocation).unwrap();
        assert_eq!(paths, vec![Utf8PathBuf::from("output-main.txt")]);
    }

    #[test]
    fn unknown_placeholders_pass_through() {
        let context = BTreeMap::new();
        assert_eq!(substitute("out-${mystery}.txt", &context), "out-${mystery}.txt");
    }

    #[test]
    fn concrete_paths_pass_through_unchanged() {
        let signature = Signature::default();
        let invocation = Invocation::new();
        let templates = vec![Template::Path("literal-${name}.txt".into())];

        let paths = expand(&templates, &signature, &invocation).unwrap();
        assert_eq!(paths, vec![Utf8PathBuf::from("literal-${name}.txt")]);
    }

    #[test]
    fn binding_errors_propagate() {
        let signature = Signature::new([Param::required("name")]);
        let invocation = Invocation::new();
        let templates = vec![Template::from("out.txt")];

        assert!(matches!(
            expand(&templates, &signature, &invocation),
            Err(DependsError::Binding(_))
        ));
    }
}
