//! Chained variable scopes
//!
//! Every task file contributes one [`Scope`]. Scopes live in a
//! [`ScopeChain`] arena and point at their parent by [`ScopeId`]. A parent is
//! always built before its children, so parent ids are strictly smaller than
//! child ids and the chain cannot form a cycle.

use crate::error::{ResolveError, ResolveResult};
use crate::resolve::template::{contains_expression, Template};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Handle to a scope inside the [`ScopeChain`] that built it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

/// Variables currently being expanded, innermost last
pub(crate) type ExpansionStack = Vec<(ScopeId, String)>;

/// One level of variable bindings
#[derive(Debug, Clone)]
pub struct Scope {
    parent: Option<ScopeId>,
    origin: PathBuf,
    variables: HashMap<String, String>,
}

impl Scope {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Path of the task file that declared these variables
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Directory relative paths in this scope's values resolve against
    pub fn anchor_dir(&self) -> &Path {
        self.origin.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Raw, unresolved local values
    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }
}

/// Arena of scopes plus the directory registry used to find parents
#[derive(Debug, Default)]
pub struct ScopeChain {
    scopes: Vec<Scope>,
    registry: HashMap<PathBuf, ScopeId>,
}

impl ScopeChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scope from a task file's variables.
    ///
    /// Local entries are fixed here and never change afterwards.
    pub fn build_scope(
        &mut self,
        variables: HashMap<String, String>,
        parent: Option<ScopeId>,
        origin: impl Into<PathBuf>,
    ) -> ScopeId {
        debug_assert!(parent.map_or(true, |p| p.0 < self.scopes.len()));

        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent,
            origin: origin.into(),
            variables,
        });
        id
    }

    /// Access a scope. Panics if `id` came from a different chain.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Record the scope produced by the task file(s) of `dir`
    pub fn register(&mut self, dir: impl Into<PathBuf>, id: ScopeId) {
        self.registry.insert(dir.into(), id);
    }

    pub fn scope_for_dir(&self, dir: &Path) -> Option<ScopeId> {
        self.registry.get(dir).copied()
    }

    /// Scope of the closest directory at or above the one containing `file`
    pub fn nearest_ancestor(&self, file: &Path) -> Option<ScopeId> {
        file.ancestors()
            .skip(1)
            .find_map(|dir| self.scope_for_dir(dir))
    }

    /// Raw lookup: local entry first, then each ancestor in turn
    pub fn get(&self, id: ScopeId, name: &str) -> Option<&str> {
        self.lineage(id)
            .find_map(|scope| scope.variables.get(name))
            .map(String::as_str)
    }

    /// Fully resolved value of a variable as seen from scope `id`
    pub fn resolve(&self, id: ScopeId, name: &str) -> ResolveResult<String> {
        let mut stack = ExpansionStack::new();
        self.resolve_in(id, name, &mut stack)
    }

    pub(crate) fn resolve_in(
        &self,
        id: ScopeId,
        name: &str,
        stack: &mut ExpansionStack,
    ) -> ResolveResult<String> {
        let mut current = Some(id);

        while let Some(scope_id) = current {
            let scope = self.scope(scope_id);

            if let Some(value) = scope.variables.get(name) {
                if !contains_expression(value) {
                    return Ok(value.clone());
                }
                return self.expand(scope_id, name, value, stack);
            }

            current = scope.parent;
        }

        Err(ResolveError::NotFound {
            name: name.to_string(),
            origin: Some(self.scope(id).origin.clone()),
        })
    }

    /// Evaluate a templated value in the scope that defines it
    fn expand(
        &self,
        scope_id: ScopeId,
        name: &str,
        value: &str,
        stack: &mut ExpansionStack,
    ) -> ResolveResult<String> {
        if let Some(start) = stack
            .iter()
            .position(|(id, n)| *id == scope_id && n == name)
        {
            let mut names: Vec<&str> = stack[start..].iter().map(|(_, n)| n.as_str()).collect();
            names.push(name);
            return Err(ResolveError::Cyclic {
                chain: names.join(" -> "),
            });
        }

        let scope = self.scope(scope_id);
        stack.push((scope_id, name.to_string()));
        let result = Template::parse(value)
            .and_then(|template| template.render(self, scope_id, scope.anchor_dir(), stack));
        stack.pop();

        result.map_err(|source| ResolveError::Variable {
            name: name.to_string(),
            value: value.to_string(),
            origin: scope.origin.clone(),
            source: Box::new(source),
        })
    }

    fn lineage(&self, id: ScopeId) -> impl Iterator<Item = &Scope> + '_ {
        std::iter::successors(Some(self.scope(id)), |scope| {
            scope.parent.map(|p| self.scope(p))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_scope_cannot_resolve() {
        let mut chain = ScopeChain::new();
        let id = chain.build_scope(HashMap::new(), None, "/proj/a.arbor");

        let err = chain.resolve(id, "foo").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { ref name, .. } if name == "foo"));
        assert!(err.to_string().contains("/proj/a.arbor"));
    }

    #[test]
    fn test_resolves_local_simple_value() {
        let mut chain = ScopeChain::new();
        let id = chain.build_scope(vars(&[("foo", "bar")]), None, "/proj/a.arbor");

        assert_eq!(chain.resolve(id, "foo").unwrap(), "bar");
    }

    #[test]
    fn test_resolves_parent_simple_value() {
        let mut chain = ScopeChain::new();
        let parent = chain.build_scope(vars(&[("foo", "bar")]), None, "/proj/a.arbor");
        let child = chain.build_scope(HashMap::new(), Some(parent), "/proj/sub/b.arbor");

        assert_eq!(chain.get(child, "foo"), Some("bar"));
        assert_eq!(chain.resolve(child, "foo").unwrap(), "bar");
    }

    #[test]
    fn test_child_shadows_parent() {
        let mut chain = ScopeChain::new();
        let parent = chain.build_scope(vars(&[("a", "1")]), None, "/proj/a.arbor");
        let child = chain.build_scope(vars(&[("a", "2")]), Some(parent), "/proj/sub/b.arbor");

        assert_eq!(chain.get(child, "a"), Some("2"));
        assert_eq!(chain.get(parent, "a"), Some("1"));
    }

    #[test]
    fn test_missing_everywhere() {
        let mut chain = ScopeChain::new();
        let parent = chain.build_scope(vars(&[("b", "1")]), None, "/proj/a.arbor");
        let child = chain.build_scope(HashMap::new(), Some(parent), "/proj/sub/b.arbor");

        assert_eq!(chain.get(child, "a"), None);
        let err = chain.resolve(child, "a").unwrap_err();
        assert!(err.to_string().contains("\"a\""));
    }

    #[test]
    fn test_resolves_complex_local_value() {
        let mut chain = ScopeChain::new();
        let id = chain.build_scope(
            vars(&[("foo", "bar"), ("zoo", "{{ var `foo` }}")]),
            None,
            "/proj/a.arbor",
        );

        assert_eq!(chain.resolve(id, "zoo").unwrap(), "bar");
    }

    #[test]
    fn test_value_resolves_in_defining_scope() {
        let mut chain = ScopeChain::new();
        let parent = chain.build_scope(
            vars(&[("name", "parent"), ("greeting", "hello {{var \"name\"}}")]),
            None,
            "/proj/a.arbor",
        );
        let child = chain.build_scope(vars(&[("name", "child")]), Some(parent), "/proj/sub/b.arbor");

        assert_eq!(chain.resolve(child, "greeting").unwrap(), "hello parent");
    }

    #[test]
    fn test_path_anchors_at_defining_scope() {
        let mut chain = ScopeChain::new();
        let parent = chain.build_scope(vars(&[("out", "{{path \"build\"}}")]), None, "/proj/a.arbor");
        let child = chain.build_scope(HashMap::new(), Some(parent), "/proj/sub/b.arbor");

        assert_eq!(
            PathBuf::from(chain.resolve(child, "out").unwrap()),
            PathBuf::from("/proj/build")
        );
    }

    #[test]
    fn test_self_reference_is_cyclic() {
        let mut chain = ScopeChain::new();
        let id = chain.build_scope(vars(&[("a", "{{var \"a\"}}")]), None, "/proj/a.arbor");

        let err = chain.resolve(id, "a").unwrap_err();
        assert!(err.to_string().contains("cyclic variable reference: a -> a"));
    }

    #[test]
    fn test_transitive_cycle() {
        let mut chain = ScopeChain::new();
        let id = chain.build_scope(
            vars(&[("a", "{{var \"b\"}}"), ("b", "x{{var \"a\"}}")]),
            None,
            "/proj/a.arbor",
        );

        let err = chain.resolve(id, "a").unwrap_err();
        assert!(matches!(err, ResolveError::Variable { .. }));
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_diamond_reference_is_not_a_cycle() {
        let mut chain = ScopeChain::new();
        let id = chain.build_scope(
            vars(&[
                ("base", "/opt"),
                ("bin", "{{var \"base\"}}/bin"),
                ("both", "{{var \"base\"}}:{{var \"bin\"}}"),
            ]),
            None,
            "/proj/a.arbor",
        );

        assert_eq!(chain.resolve(id, "both").unwrap(), "/opt:/opt/bin");
    }

    #[test]
    fn test_nested_failure_names_variable_and_file() {
        let mut chain = ScopeChain::new();
        let parent = chain.build_scope(vars(&[("foo", "bar")]), None, "/proj/B.arbor");
        let child = chain.build_scope(
            vars(&[("zagbat", "{{ var `shoo` }}")]),
            Some(parent),
            "/proj/sub/A.arbor",
        );

        let err = chain.resolve(child, "zagbat").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("zagbat"));
        assert!(message.contains("shoo"));
        assert!(message.contains("/proj/sub/A.arbor"));
    }

    #[test]
    fn test_registry_and_nearest_ancestor() {
        let mut chain = ScopeChain::new();
        let root = chain.build_scope(HashMap::new(), None, "/proj/root.arbor");
        chain.register("/proj", root);

        assert_eq!(chain.scope_for_dir(Path::new("/proj")), Some(root));
        assert_eq!(
            chain.nearest_ancestor(Path::new("/proj/a/b/c.arbor")),
            Some(root)
        );
        assert_eq!(chain.nearest_ancestor(Path::new("/proj/x.arbor")), Some(root));
        assert_eq!(chain.nearest_ancestor(Path::new("/other/x.arbor")), None);

        let nested = chain.build_scope(HashMap::new(), Some(root), "/proj/a/a.arbor");
        chain.register("/proj/a", nested);
        assert_eq!(
            chain.nearest_ancestor(Path::new("/proj/a/b/c.arbor")),
            Some(nested)
        );
        assert_eq!(chain.scope(nested).parent(), Some(root));
        assert_eq!(chain.lineage(nested).count(), 2);
    }
}
