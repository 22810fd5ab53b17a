use super::condition::{CompiledCondition, Condition};
use super::sets::{GrammarSets, SymbolRef};
use super::slot::{
    BodySlot, GrammarGraph, HeadId, HeadSlot, NodeKind, SlotId, SlotKind, Terminal, TerminalId,
};
use super::test::{FollowTest, PredictionTest};
use crate::env::Expr;
use crate::error::GrammarError;
use crate::regex::{DfaMatcher, Pattern};
use compact_str::{CompactString, ToCompactString};
use hashbrown::HashMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// What a grammar symbol refers to.
#[derive(Debug, Clone)]
pub enum SymbolKind {
    Nonterminal {
        name: CompactString,
        args: Vec<Expr>,
    },
    Terminal {
        name: Option<CompactString>,
        pattern: Pattern,
    },
}

/// One symbol of an alternative, with its conditions and optional label.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub pre: Vec<Condition>,
    pub post: Vec<Condition>,
    pub label: Option<CompactString>,
}

impl Symbol {
    fn from_kind(kind: SymbolKind) -> Self {
        Self {
            kind,
            pre: Vec::new(),
            post: Vec::new(),
            label: None,
        }
    }

    /// A reference to a nonterminal without arguments.
    #[must_use]
    pub fn nt(name: &str) -> Self {
        Self::call(name, Vec::new())
    }

    /// A call to a parameterized nonterminal.
    #[must_use]
    pub fn call(name: &str, args: Vec<Expr>) -> Self {
        Self::from_kind(SymbolKind::Nonterminal {
            name: name.into(),
            args,
        })
    }

    #[must_use]
    pub fn char(c: char) -> Self {
        Self::terminal(Pattern::Char(c))
    }

    #[must_use]
    pub fn literal(text: &str) -> Self {
        Self::terminal(Pattern::literal(text))
    }

    #[must_use]
    pub fn terminal(pattern: Pattern) -> Self {
        Self::from_kind(SymbolKind::Terminal {
            name: None,
            pattern,
        })
    }

    /// A terminal displayed under `name` in slot labels and forests.
    #[must_use]
    pub fn terminal_named(name: &str, pattern: Pattern) -> Self {
        Self::from_kind(SymbolKind::Terminal {
            name: Some(name.into()),
            pattern,
        })
    }

    /// Add a condition checked before the symbol is attempted.
    #[must_use]
    pub fn pre(mut self, condition: Condition) -> Self {
        self.pre.push(condition);
        self
    }

    /// Add a condition checked on the symbol's extent once recognized.
    #[must_use]
    pub fn post(mut self, condition: Condition) -> Self {
        self.post.push(condition);
        self
    }

    /// Bind the symbol's extent to `label` in the environment.
    #[must_use]
    pub fn labeled(mut self, label: &str) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{label}:")?;
        }
        match &self.kind {
            SymbolKind::Nonterminal { name, args } if args.is_empty() => write!(f, "{name}"),
            SymbolKind::Nonterminal { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg:?}")?;
                }
                write!(f, ")")
            }
            SymbolKind::Terminal {
                name: Some(name), ..
            } => write!(f, "{name}"),
            SymbolKind::Terminal { pattern, .. } => write!(f, "{pattern}"),
        }
    }
}

/// A sequence of symbols, optionally guarded by conditions checked on entry.
#[derive(Debug, Clone, Default)]
pub struct Alternative {
    pub symbols: Vec<Symbol>,
    pub guards: Vec<Condition>,
}

impl Alternative {
    #[must_use]
    pub fn new(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
            guards: Vec::new(),
        }
    }

    /// The empty alternative.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn guard(mut self, condition: Condition) -> Self {
        self.guards.push(condition);
        self
    }
}

#[derive(Debug, Clone)]
struct Rule {
    head: CompactString,
    alternative: Alternative,
}

/// Builds a [`GrammarGraph`] from BNF rules.
///
/// Every call to [`GrammarBuilder::rule`] adds one alternative; alternatives
/// of a nonterminal keep the order in which they were added.
///
/// # Example
///
/// ```rust
/// use gll::grammar::{GrammarBuilder, Symbol};
///
/// let grammar = GrammarBuilder::new()
///     .rule("A", [Symbol::nt("B"), Symbol::char('a')])
///     .rule("B", [Symbol::char('b')])
///     .build()?;
/// assert!(grammar.slot_by_label("A ::= B . 'a'").is_ok());
/// # Ok::<(), gll::GrammarError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    rules: Vec<Rule>,
    params: Vec<(CompactString, Vec<CompactString>)>,
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the alternative `head ::= symbols`.
    #[must_use]
    pub fn rule(self, head: &str, symbols: impl IntoIterator<Item = Symbol>) -> Self {
        self.alternative(head, Alternative::new(symbols))
    }

    #[must_use]
    pub fn alternative(mut self, head: &str, alternative: Alternative) -> Self {
        self.rules.push(Rule {
            head: head.into(),
            alternative,
        });
        self
    }

    /// Declare the parameters of `head`. Arguments passed at call sites are
    /// bound to these names in the callee's environment.
    #[must_use]
    pub fn params<'a>(mut self, head: &str, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.params
            .push((head.into(), names.into_iter().map(Into::into).collect()));
        self
    }

    /// Compile the rules into a slot graph.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no rules, a referenced nonterminal has
    /// no rules, parameters are malformed, a call passes the wrong number of
    /// arguments, or a pattern contains an empty character class.
    pub fn build(self) -> Result<GrammarGraph, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::Empty);
        }

        let mut head_names: HashMap<CompactString, HeadId> = HashMap::new();
        let mut alternatives: Vec<Vec<&Alternative>> = Vec::new();
        let mut names: Vec<CompactString> = Vec::new();
        for rule in &self.rules {
            let id = *head_names.entry(rule.head.clone()).or_insert_with(|| {
                names.push(rule.head.clone());
                alternatives.push(Vec::new());
                HeadId::from_index(names.len() - 1)
            });
            alternatives[id.index()].push(&rule.alternative);
        }

        let mut params: Vec<Vec<CompactString>> = vec![Vec::new(); names.len()];
        for (head, declared) in &self.params {
            let id = head_names
                .get(head)
                .ok_or_else(|| GrammarError::ParamsWithoutRule(head.clone()))?;
            for (i, param) in declared.iter().enumerate() {
                if declared[..i].contains(param) {
                    return Err(GrammarError::DuplicateParameter {
                        name: head.clone(),
                        param: param.clone(),
                    });
                }
            }
            params[id.index()] = declared.clone();
        }

        let mut terminals: Vec<Terminal> = Vec::new();
        let mut terminal_ids: HashMap<Pattern, TerminalId> = HashMap::new();
        let mut productions: Vec<Vec<Vec<SymbolRef>>> = Vec::with_capacity(names.len());
        for (head, alts) in alternatives.iter().enumerate() {
            let head_name = &names[head];
            let mut resolved = Vec::with_capacity(alts.len());
            for alternative in alts {
                check_conditions(head_name, &alternative.guards)?;
                let mut refs = Vec::with_capacity(alternative.symbols.len());
                for symbol in &alternative.symbols {
                    check_conditions(head_name, &symbol.pre)?;
                    check_conditions(head_name, &symbol.post)?;
                    refs.push(match &symbol.kind {
                        SymbolKind::Nonterminal { name, args } => {
                            let callee = *head_names.get(name).ok_or_else(|| {
                                GrammarError::UndefinedNonterminal {
                                    name: name.clone(),
                                    from: head_name.clone(),
                                }
                            })?;
                            let expected = params[callee.index()].len();
                            if args.len() != expected {
                                return Err(GrammarError::ArityMismatch {
                                    name: name.clone(),
                                    expected,
                                    found: args.len(),
                                });
                            }
                            SymbolRef::Nonterminal(callee)
                        }
                        SymbolKind::Terminal { name, pattern } => {
                            check_pattern(head_name, pattern)?;
                            let id = *terminal_ids.entry(pattern.clone()).or_insert_with(|| {
                                terminals.push(Terminal {
                                    name: name.clone().unwrap_or_else(|| pattern.to_compact_string()),
                                    pattern: pattern.clone(),
                                    matcher: Arc::new(DfaMatcher::new(pattern)),
                                });
                                TerminalId::from_index(terminals.len() - 1)
                            });
                            SymbolRef::Terminal(id)
                        }
                    });
                }
                resolved.push(refs);
            }
            productions.push(resolved);
        }

        let patterns: Vec<Pattern> = terminals.iter().map(|t| t.pattern.clone()).collect();
        let sets = GrammarSets::compute(&productions, &patterns);

        let mut heads = Vec::with_capacity(names.len());
        let mut slots: Vec<BodySlot> = Vec::new();
        let mut slot_labels: HashMap<CompactString, SlotId> = HashMap::new();
        for (index, alts) in alternatives.iter().enumerate() {
            let head = HeadId::from_index(index);
            let mut first_slots = Vec::with_capacity(alts.len());
            let mut predictions = Vec::with_capacity(alts.len());
            for (alt_index, alternative) in alts.iter().enumerate() {
                let refs = &productions[index][alt_index];
                predictions.push(sets.follow_of(head, refs));
                first_slots.push(SlotId::from_index(slots.len()));

                let symbols = &alternative.symbols;
                for position in 0..=symbols.len() {
                    let id = SlotId::from_index(slots.len());
                    let label = slot_label(&names[index], symbols, position);
                    slot_labels.entry(label.clone()).or_insert(id);

                    let kind = match (symbols.get(position), refs.get(position)) {
                        (Some(symbol), Some(SymbolRef::Nonterminal(callee))) => SlotKind::Call {
                            head: *callee,
                            args: match &symbol.kind {
                                SymbolKind::Nonterminal { args, .. } => args.clone(),
                                SymbolKind::Terminal { .. } => Vec::new(),
                            },
                        },
                        (Some(_), Some(SymbolRef::Terminal(terminal))) => {
                            SlotKind::Terminal(*terminal)
                        }
                        _ => SlotKind::Last,
                    };

                    let mut pre: Vec<CompiledCondition> = Vec::new();
                    if position == 0 {
                        pre.extend(alternative.guards.iter().map(Condition::compile));
                    }
                    if let Some(symbol) = symbols.get(position) {
                        pre.extend(symbol.pre.iter().map(Condition::compile));
                    }
                    let previous = position.checked_sub(1).map(|p| &symbols[p]);

                    slots.push(BodySlot {
                        label,
                        head,
                        alternative: alt_index,
                        position,
                        previous: (position > 0).then(|| SlotId(id.0 - 1)),
                        kind,
                        pre,
                        post: previous
                            .map(|symbol| symbol.post.iter().map(Condition::compile).collect())
                            .unwrap_or_default(),
                        follow: FollowTest::new(&sets.follow_of(head, &refs[position..])),
                        node_kind: NodeKind::for_position(position),
                        binding: previous.and_then(|symbol| symbol.label.clone()),
                    });
                }
            }

            heads.push(HeadSlot {
                name: names[index].clone(),
                params: std::mem::take(&mut params[index]),
                first_slots,
                nullable: sets.nullable[index],
                prediction: PredictionTest::new(&predictions),
                follow: FollowTest::new(&sets.follow[index]),
            });
        }

        tracing::debug!(
            heads = heads.len(),
            slots = slots.len(),
            terminals = terminals.len(),
            "compiled grammar"
        );

        Ok(GrammarGraph {
            heads,
            slots,
            terminals,
            head_names,
            slot_labels,
        })
    }
}

fn check_pattern(rule: &CompactString, pattern: &Pattern) -> Result<(), GrammarError> {
    if pattern.is_well_formed() {
        Ok(())
    } else {
        Err(GrammarError::InvalidPattern {
            rule: rule.clone(),
            pattern: pattern.to_compact_string(),
        })
    }
}

fn check_conditions(rule: &CompactString, conditions: &[Condition]) -> Result<(), GrammarError> {
    conditions
        .iter()
        .filter_map(Condition::pattern)
        .try_for_each(|pattern| check_pattern(rule, pattern))
}

/// `X ::= a . b` style label for the slot at `position`.
fn slot_label(head: &str, symbols: &[Symbol], position: usize) -> CompactString {
    let mut label = CompactString::new(head);
    label.push_str(" ::=");
    for (i, symbol) in symbols.iter().enumerate() {
        if i == position {
            label.push_str(" .");
        }
        let _ = write!(label, " {symbol}");
    }
    if position == symbols.len() {
        label.push_str(" .");
    }
    label
}
