use std::collections::BTreeMap;

/// A named logical deployment a check can run in or observe.
///
/// Two environments are equal iff their names are equal within one
/// [`EnvironmentRegistry`] — the name is the stable identifier, `hostname` and
/// `metadata` are descriptive.
#[derive(Debug, Clone)]
pub struct Environment {
    name: String,
    hostname: Option<String>,
    metadata: BTreeMap<String, String>,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Environment {}

impl std::hash::Hash for Environment {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Immutable `name -> Environment` mapping built once at construction time.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentRegistry {
    by_name: BTreeMap<String, Environment>,
}

impl EnvironmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, env: Environment) -> &mut Self {
        self.by_name.insert(env.name().to_string(), env);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Environment> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Environment> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environments_equal_by_name_only() {
        let a = Environment::new("prod").with_hostname("prod.example.com");
        let b = Environment::new("prod").with_hostname("different.example.com");
        assert_eq!(a, b);
    }

    #[test]
    fn registry_lookup_and_membership() {
        let mut reg = EnvironmentRegistry::new();
        reg.insert(Environment::new("prod"));
        reg.insert(Environment::new("staging"));

        assert!(reg.contains("prod"));
        assert!(!reg.contains("dev"));
        assert_eq!(reg.get("staging").unwrap().name(), "staging");
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn registry_insert_with_same_name_overwrites() {
        let mut reg = EnvironmentRegistry::new();
        reg.insert(Environment::new("prod").with_hostname("a"));
        reg.insert(Environment::new("prod").with_hostname("b"));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("prod").unwrap().hostname(), Some("b"));
    }
}
