//! Pattern scopes: which MATCH or WHERE pattern introduced an element

/// Kind of clause a pattern appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternContext {
    Match,
    Where,
}

/// A clause kind plus the ordinal of the pattern within that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope {
    pub context: PatternContext,
    pub id: usize,
}

impl Scope {
    pub fn new(context: PatternContext, id: usize) -> Self {
        Scope { context, id }
    }

    /// Scope of the `id`-th MATCH clause.
    pub fn match_clause(id: usize) -> Self {
        Scope::new(PatternContext::Match, id)
    }

    /// Scope of the `id`-th pattern predicate found in WHERE clauses.
    pub fn where_clause(id: usize) -> Self {
        Scope::new(PatternContext::Where, id)
    }
}

/// Set of scopes an element belongs to. Elements rarely appear in more than
/// a couple of patterns so a vector is enough.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet {
    scopes: Vec<Scope>,
}

impl ScopeSet {
    pub fn new() -> Self {
        ScopeSet::default()
    }

    pub fn with(scope: Scope) -> Self {
        ScopeSet {
            scopes: vec![scope],
        }
    }

    /// Insert a scope, returns false if it was already present.
    pub fn insert(&mut self, scope: Scope) -> bool {
        if self.scopes.contains(&scope) {
            return false;
        }
        self.scopes.push(scope);
        true
    }

    pub fn contains(&self, scope: &Scope) -> bool {
        self.scopes.contains(scope)
    }

    /// Whether any scope of the set has the given context.
    pub fn has_context(&self, context: PatternContext) -> bool {
        self.scopes.iter().any(|s| s.context == context)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
