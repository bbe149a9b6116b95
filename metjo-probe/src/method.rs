//! Method identity shared by the instrumenter and the runtime.

use std::fmt;

/// Separator between path segments of a fully-qualified method name.
pub const PATH_SEPARATOR: &str = "::";

/// Identity of an instrumentable function.
///
/// The declaring type is the module path for free functions, extended by the
/// `Self` type (impl methods) or the trait name (trait default methods).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    declaring_type: String,
    method_name: String,
    fully_qualified_name: String,
}

impl MethodKey {
    /// Build a key from its declaring type and bare name.
    #[must_use]
    pub fn new(declaring_type: impl Into<String>, method_name: impl Into<String>) -> Self {
        let declaring_type = declaring_type.into();
        let method_name = method_name.into();
        let fully_qualified_name = if declaring_type.is_empty() {
            method_name.clone()
        } else {
            format!("{declaring_type}{PATH_SEPARATOR}{method_name}")
        };
        Self { declaring_type, method_name, fully_qualified_name }
    }

    /// Split a fully-qualified name back into a key.
    ///
    /// Splits on the last `::`; dotted names (`com.acme.Service.compute`)
    /// split on the last `.` instead.
    #[must_use]
    pub fn parse(fully_qualified_name: &str) -> Self {
        let split = fully_qualified_name
            .rfind(PATH_SEPARATOR)
            .map(|i| (i, PATH_SEPARATOR.len()))
            .or_else(|| fully_qualified_name.rfind('.').map(|i| (i, 1)));

        match split {
            Some((i, len)) => Self {
                declaring_type: fully_qualified_name[..i].to_string(),
                method_name: fully_qualified_name[i + len..].to_string(),
                fully_qualified_name: fully_qualified_name.to_string(),
            },
            None => Self {
                declaring_type: String::new(),
                method_name: fully_qualified_name.to_string(),
                fully_qualified_name: fully_qualified_name.to_string(),
            },
        }
    }

    #[must_use]
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    #[must_use]
    pub fn fully_qualified_name(&self) -> &str {
        &self.fully_qualified_name
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_joins_with_path_separator() {
        let key = MethodKey::new("app::service::Orders", "place");
        assert_eq!(key.fully_qualified_name(), "app::service::Orders::place");
        assert_eq!(key.method_name(), "place");
        assert_eq!(key.to_string(), "app::service::Orders::place");
    }

    #[test]
    fn test_parse_rust_path() {
        let key = MethodKey::parse("app::service::Orders::place");
        assert_eq!(key, MethodKey::new("app::service::Orders", "place"));
    }

    #[test]
    fn test_parse_dotted_name() {
        let key = MethodKey::parse("com.acme.Service.compute");
        assert_eq!(key.declaring_type(), "com.acme.Service");
        assert_eq!(key.method_name(), "compute");
    }

    #[test]
    fn test_parse_bare_name() {
        let key = MethodKey::parse("handle");
        assert_eq!(key.declaring_type(), "");
        assert_eq!(key.fully_qualified_name(), "handle");
    }
}
