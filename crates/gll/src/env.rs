//! Environments for data-dependent grammars.
//!
//! A purely syntactic grammar only ever sees the empty [`Environment`]. When a
//! nonterminal declares parameters, or a symbol is labeled, values are bound
//! into a persistent environment that travels with descriptors and GSS edges.
//! Environments are immutable: binding returns a new environment sharing the
//! old chain.

use crate::input::Input;
use compact_str::CompactString;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

/// A value bound in an environment or passed as a call argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Str(CompactString),
    /// The extent `[start, end)` of a labeled symbol.
    Span { start: usize, end: usize },
}

impl Value {
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_span(&self) -> Option<(usize, usize)> {
        match self {
            Self::Span { start, end } => Some((*start, *end)),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "()"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Span { start, end } => write!(f, "[{start}, {end})"),
        }
    }
}

#[derive(Debug)]
struct Binding {
    name: CompactString,
    value: Value,
    parent: Option<Arc<Binding>>,
    /// Number of observable bindings in the chain ending here.
    len: usize,
    /// Wrapping sum of [`binding_hash`] over the observable bindings.
    digest: u64,
}

fn binding_hash(name: &str, value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    value.hash(&mut hasher);
    hasher.finish()
}

/// Persistent chain of name/value bindings.
///
/// Two environments are equal when their observable bindings are equal: the
/// innermost value of each name, compared in name order. Shadowed bindings
/// and binding order do not matter.
#[derive(Clone, Default)]
pub struct Environment {
    head: Option<Arc<Binding>>,
}

impl Environment {
    /// The empty environment.
    #[must_use]
    pub const fn new() -> Self {
        Self { head: None }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// A new environment with `name` bound to `value`, shadowing any outer binding.
    #[must_use]
    pub fn bind(&self, name: impl Into<CompactString>, value: Value) -> Self {
        let name = name.into();
        let (mut len, mut digest) = self.summary();
        match self.lookup(&name) {
            Some(shadowed) => digest = digest.wrapping_sub(binding_hash(&name, shadowed)),
            None => len += 1,
        }
        digest = digest.wrapping_add(binding_hash(&name, &value));
        Self {
            head: Some(Arc::new(Binding {
                name,
                value,
                parent: self.head.clone(),
                len,
                digest,
            })),
        }
    }

    /// Observable binding count and order-independent digest, kept up to date by [`Self::bind`].
    fn summary(&self) -> (usize, u64) {
        self.head.as_deref().map_or((0, 0), |binding| (binding.len, binding.digest))
    }

    /// The innermost value bound to `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut current = self.head.as_deref();
        while let Some(binding) = current {
            if binding.name == name {
                return Some(&binding.value);
            }
            current = binding.parent.as_deref();
        }
        None
    }

    #[must_use]
    pub fn int(&self, name: &str) -> Option<i64> {
        self.lookup(name).and_then(Value::as_int)
    }

    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.lookup(name).and_then(Value::as_bool)
    }

    #[must_use]
    pub fn span(&self, name: &str) -> Option<(usize, usize)> {
        self.lookup(name).and_then(Value::as_span)
    }

    /// Text of the span bound to `name`.
    #[must_use]
    pub fn text(&self, name: &str, input: &Input) -> Option<String> {
        self.span(name).map(|(start, end)| input.text(start, end))
    }

    /// Observable bindings: innermost value per name, sorted by name.
    #[must_use]
    pub fn bindings(&self) -> Vec<(&str, &Value)> {
        let mut seen: Vec<(&str, &Value)> = Vec::new();
        let mut current = self.head.as_deref();
        while let Some(binding) = current {
            if !seen.iter().any(|(name, _)| *name == binding.name) {
                seen.push((binding.name.as_str(), &binding.value));
            }
            current = binding.parent.as_deref();
        }
        seen.sort_unstable_by(|a, b| a.0.cmp(b.0));
        seen
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (None, None) => true,
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => true,
            _ if self.summary() != other.summary() => false,
            _ => self.bindings() == other.bindings(),
        }
    }
}

impl Eq for Environment {}

impl Hash for Environment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.summary().hash(state);
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.bindings()).finish()
    }
}

type ValueFn = dyn Fn(&Environment, &Input) -> Value + Send + Sync;
type PredicateFn = dyn Fn(&Environment, &Input) -> bool + Send + Sync;

/// An argument expression, evaluated in the caller's environment.
#[derive(Clone)]
pub enum Expr {
    Const(Value),
    /// The innermost binding of a name; unbound names evaluate to [`Value::Unit`].
    Var(CompactString),
    Fn(Arc<ValueFn>),
}

impl Expr {
    #[must_use]
    pub fn var(name: impl Into<CompactString>) -> Self {
        Self::Var(name.into())
    }

    #[must_use]
    pub fn func(f: impl Fn(&Environment, &Input) -> Value + Send + Sync + 'static) -> Self {
        Self::Fn(Arc::new(f))
    }

    #[must_use]
    pub fn eval(&self, env: &Environment, input: &Input) -> Value {
        match self {
            Self::Const(value) => value.clone(),
            Self::Var(name) => env.lookup(name).cloned().unwrap_or(Value::Unit),
            Self::Fn(f) => f(env, input),
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Const(value)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Self::Const(Value::Int(n))
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Self::Const(Value::Bool(b))
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "{value}"),
            Self::Var(name) => write!(f, "{name}"),
            Self::Fn(_) => write!(f, "<fn>"),
        }
    }
}

/// A boolean test over the current environment.
#[derive(Clone)]
pub struct Predicate {
    name: CompactString,
    test: Arc<PredicateFn>,
}

impl Predicate {
    #[must_use]
    pub fn new(
        name: impl Into<CompactString>,
        test: impl Fn(&Environment, &Input) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            test: Arc::new(test),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn holds(&self, env: &Environment, input: &Input) -> bool {
        (self.test)(env, input)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_of(env: &Environment) -> u64 {
        let mut hasher = DefaultHasher::new();
        env.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_shadowing() {
        let env = Environment::new().bind("n", Value::Int(1)).bind("n", Value::Int(2));
        assert_eq!(env.int("n"), Some(2));
        assert_eq!(env.bindings().len(), 1);
        assert_eq!(env.lookup("m"), None);
    }

    #[test]
    fn test_equality_ignores_order_and_shadowed_values() {
        let a = Environment::new()
            .bind("x", Value::Int(1))
            .bind("y", Value::Bool(true));
        let b = Environment::new()
            .bind("y", Value::Bool(false))
            .bind("y", Value::Bool(true))
            .bind("x", Value::Int(1));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let c = a.bind("x", Value::Int(3));
        assert_ne!(a, c);
    }

    #[test]
    fn test_digest_tracks_shadowing() {
        let direct = Environment::new().bind("n", Value::Int(2));
        let shadowed = Environment::new()
            .bind("n", Value::Int(1))
            .bind("m", Value::Unit)
            .bind("n", Value::Int(2));
        assert_eq!(shadowed.summary().0, 2);
        assert_eq!(direct.bind("m", Value::Unit), shadowed);
        assert_eq!(hash_of(&direct.bind("m", Value::Unit)), hash_of(&shadowed));

        let restored = shadowed.bind("n", Value::Int(1)).bind("n", Value::Int(2));
        assert_eq!(restored.summary(), shadowed.summary());
        assert_eq!(restored, shadowed);
        assert_ne!(direct.summary(), shadowed.summary());
        assert_eq!(Environment::new().summary(), (0, 0));
    }

    #[test]
    fn test_bind_does_not_mutate_parent() {
        let base = Environment::new().bind("n", Value::Int(1));
        let child = base.bind("n", Value::Int(5));
        assert_eq!(base.int("n"), Some(1));
        assert_eq!(child.int("n"), Some(5));
    }

    #[test]
    fn test_expr_eval() {
        let input = Input::new("abc");
        let env = Environment::new()
            .bind("n", Value::Int(4))
            .bind("x", Value::Span { start: 1, end: 3 });
        assert_eq!(Expr::from(7_i64).eval(&env, &input), Value::Int(7));
        assert_eq!(Expr::var("n").eval(&env, &input), Value::Int(4));
        assert_eq!(Expr::var("missing").eval(&env, &input), Value::Unit);
        let dec = Expr::func(|env, _| Value::Int(env.int("n").unwrap_or(0) - 1));
        assert_eq!(dec.eval(&env, &input), Value::Int(3));
        assert_eq!(env.text("x", &input).as_deref(), Some("bc"));
    }
}
