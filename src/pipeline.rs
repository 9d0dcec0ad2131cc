//! Top-level pipeline orchestration (spec.md §7), grounded on
//! `original_source/zebu/compile.go`'s `Main`: parse, resolve, optionally
//! dump, transform, analyze, LL(1)-check, emit — aborting immediately once
//! any stage has recorded a diagnostic, since every later stage assumes a
//! clean grammar.

use std::collections::HashSet;
use std::rc::Rc;

use crate::analysis;
use crate::arena::{Arena, NodeId, NodeKind};
use crate::diagnostics::{Category, Diagnostic, Diagnostics};
use crate::emit::{self, EmitOutput};
use crate::interner::SymbolTable;
use crate::parser;
use crate::transform;
use crate::util::Log;

#[derive(Clone)]
pub struct PipelineConfig {
    pub file_name: Rc<str>,
    pub log: Log,
    /// Pretty-print the resolved AST to stdout right after parsing
    /// (the `-d` CLI flag).
    pub dump_ast: bool,
    /// Pretty-print the AST again after left-factoring/direct-recursion
    /// removal (the `-t` CLI flag).
    pub dump_transformed: bool,
    /// Render the computed FIRST/FOLLOW sets into `PipelineOutput::sets`
    /// (the `-g` CLI flag).
    pub print_sets: bool,
    /// Test/debug hook: skip left-factoring and direct-recursion
    /// elimination entirely, so an ambiguous grammar reaches the LL(1)
    /// check unmodified (spec.md §8, "ambiguity without left-factoring").
    pub skip_transform: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            file_name: Rc::from("<grammar>"),
            log: Log::None,
            dump_ast: false,
            dump_transformed: false,
            print_sets: false,
            skip_transform: false,
        }
    }
}

pub struct PipelineOutput {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub code: Option<String>,
    pub sets: Option<String>,
}

pub fn run(src: &str, config: PipelineConfig) -> PipelineOutput {
    let mut out = parser::parse_file(config.file_name.clone(), src, config.log);
    if out.diagnostics.has_errors() {
        return abort(&mut out.diagnostics);
    }
    let root = match out.root {
        Some(r) => r,
        None => {
            out.diagnostics.push(
                crate::position::Position::synthetic(),
                Category::Internal,
                "parser produced no grammar node despite reporting no errors",
            );
            return abort(&mut out.diagnostics);
        }
    };

    if config.dump_ast {
        let _ = crate::dump::dump_tree(&out.arena, &out.symbols, &out.literals, root);
    }

    validate_resolved(&out.arena, &out.symbols, root, &mut out.diagnostics);
    if out.diagnostics.has_errors() {
        return abort(&mut out.diagnostics);
    }

    let (grammar_sym, mut decls, start) = match out.arena.kind(root) {
        NodeKind::Grammar { sym, decls, start } => (*sym, decls.clone(), *start),
        _ => unreachable!("validated above"),
    };

    if !config.skip_transform {
        transform::transform_rules(&mut out.arena, &mut out.symbols, out.grammars.local, &mut decls, &mut out.diagnostics);
        if let NodeKind::Grammar { decls: slot, .. } = &mut out.arena.get_mut(root).kind {
            *slot = decls.clone();
        }
    }
    if out.diagnostics.has_errors() {
        return abort(&mut out.diagnostics);
    }

    if config.dump_transformed {
        let _ = crate::dump::dump_tree(&out.arena, &out.symbols, &out.literals, root);
    }

    let rules: Vec<NodeId> = decls
        .iter()
        .copied()
        .filter(|&id| matches!(out.arena.kind(id), NodeKind::Rule { .. }))
        .collect();
    let ff = analysis::analyze(&out.arena, &rules, start);

    analysis::ll1::check(&out.arena, &out.symbols, &out.literals, &rules, &ff.first, &ff.follow, &mut out.diagnostics);
    if out.diagnostics.has_errors() {
        return abort(&mut out.diagnostics);
    }

    let sets = if config.print_sets {
        Some(render_sets(&out.arena, &out.symbols, &out.literals, &rules, &ff))
    } else {
        None
    };

    let grammar_name = out.symbols.get(grammar_sym).name.to_string();
    let emitted: EmitOutput = emit::emit(&out.arena, &out.symbols, &out.literals, &rules, &ff.first, &ff.follow, &grammar_name);

    PipelineOutput {
        success: true,
        diagnostics: out.diagnostics.flush(),
        code: Some(emitted.code),
        sets,
    }
}

fn abort(diags: &mut Diagnostics) -> PipelineOutput {
    PipelineOutput {
        success: false,
        diagnostics: diags.flush(),
        code: None,
        sets: None,
    }
}

/// Renders every rule's FIRST/FOLLOW set as plain text (the `-g` flag).
fn render_sets(
    arena: &Arena,
    symbols: &SymbolTable,
    literals: &crate::interner::LiteralTable,
    rules: &[NodeId],
    ff: &analysis::FirstFollow,
) -> String {
    use std::fmt::Write as _;
    let mut out = String::new();
    for &rule in rules {
        let name = match arena.kind(rule) {
            NodeKind::Rule { sym, .. } => symbols.get(*sym).name.to_string(),
            _ => continue,
        };
        let describe = |set: &[NodeId]| -> String {
            set.iter()
                .map(|&m| if arena.is_epsilon(m) { "<empty>".to_string() } else { describe_member(arena, symbols, literals, m) })
                .collect::<Vec<_>>()
                .join(", ")
        };
        let first = ff.first.get(&rule).map(|s| describe(s)).unwrap_or_default();
        let follow = ff.follow.get(&rule).map(|s| describe(s)).unwrap_or_default();
        writeln!(out, "{}: FIRST = {{ {} }}  FOLLOW = {{ {} }}", name, first, follow).unwrap();
    }
    out
}

fn describe_member(arena: &Arena, symbols: &SymbolTable, literals: &crate::interner::LiteralTable, member: NodeId) -> String {
    match arena.kind(member) {
        NodeKind::RegDef { sym, .. } => symbols.get(*sym).name.to_string(),
        NodeKind::Rule { sym, .. } => symbols.get(*sym).name.to_string(),
        NodeKind::StrLit { lit } => format!("'{}'", literals.get(*lit).content),
        _ => "<?>".to_string(),
    }
}

/// Walks every node reachable from the grammar root, recording a
/// diagnostic for each `NoName` placeholder still standing in for an
/// undeclared terminal/nonterminal (spec.md §5 invariant 2).
fn validate_resolved(arena: &Arena, symbols: &SymbolTable, root: NodeId, diags: &mut Diagnostics) {
    let mut visited = HashSet::new();
    walk(arena, symbols, root, &mut visited, diags);
}

fn walk(arena: &Arena, symbols: &SymbolTable, id: NodeId, visited: &mut HashSet<NodeId>, diags: &mut Diagnostics) {
    if !visited.insert(id) {
        return;
    }
    match arena.kind(id) {
        NodeKind::NoName { sym } => {
            diags.push(
                arena.pos(id),
                Category::Resolution,
                format!("unresolved symbol '{}'", symbols.get(*sym).name),
            );
        }
        NodeKind::Grammar { decls, .. } => {
            for &d in decls {
                walk(arena, symbols, d, visited, diags);
            }
        }
        NodeKind::Rule { prods, .. } => {
            for &p in prods {
                walk(arena, symbols, p, visited, diags);
            }
        }
        NodeKind::RegDef { body, .. } => walk(arena, symbols, *body, visited, diags),
        NodeKind::Prod { elems } => {
            for e in elems {
                walk(arena, symbols, e.left, visited, diags);
                if let Some(a) = e.action {
                    walk(arena, symbols, a, visited, diags);
                }
            }
        }
        NodeKind::Alt { left, right } | NodeKind::Cat { left, right } => {
            walk(arena, symbols, *left, visited, diags);
            walk(arena, symbols, *right, visited, diags);
        }
        NodeKind::Kleene { inner } | NodeKind::Plus { inner } | NodeKind::Repeat { inner, .. } => {
            walk(arena, symbols, *inner, visited, diags);
        }
        NodeKind::Class { members, .. } => {
            for &m in members {
                walk(arena, symbols, m, visited, diags);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_src(src: &str) -> PipelineOutput {
        run(src, PipelineConfig { file_name: Rc::from("g.llg"), ..Default::default() })
    }

    /// Seed scenario: a nullable chain of rules propagates epsilon through
    /// to the start rule and still compiles cleanly.
    #[test]
    fn nullable_chain_compiles_successfully() {
        let out = run_src("grammar g; start: a ; a: b ; b: 'x' | ;");
        assert!(out.success, "{:?}", out.diagnostics);
        assert!(out.code.unwrap().contains("parse_start"));
    }

    /// Seed scenario: productions sharing a prefix are silently
    /// left-factored, so the grammar still compiles despite what would
    /// otherwise be an LL(1) conflict.
    #[test]
    fn left_factoring_resolves_a_shared_prefix() {
        let out = run_src("grammar g; start: 'if' 'then' | 'if' 'else' ;");
        assert!(out.success, "{:?}", out.diagnostics);
    }

    /// Seed scenario: direct left recursion is rewritten away and the
    /// pipeline still succeeds.
    #[test]
    fn direct_left_recursion_is_eliminated() {
        let out = run_src("grammar g; start: expr ; expr: expr 'plus' 'n' | 'n' ;");
        assert!(out.success, "{:?}", out.diagnostics);
    }

    /// Seed scenario: with transformation disabled, the same shared-prefix
    /// grammar surfaces as a genuine LL(1) ambiguity instead.
    #[test]
    fn ambiguity_surfaces_when_left_factoring_is_disabled() {
        let out = run(
            "grammar g; start: 'if' 'then' | 'if' 'else' ;",
            PipelineConfig { file_name: Rc::from("g.llg"), skip_transform: true, ..Default::default() },
        );
        assert!(!out.success);
        assert!(out.diagnostics.iter().any(|d| matches!(d.category, Category::Ll1)));
    }

    /// Seed scenario: a reference to an undeclared nonterminal is reported
    /// and the pipeline does not proceed to emission.
    #[test]
    fn unresolved_symbol_aborts_before_emission() {
        let out = run_src("grammar g; start: Missing ;");
        assert!(!out.success);
        assert!(out.diagnostics.iter().any(|d| matches!(d.category, Category::Resolution)));
        assert!(out.code.is_none());
    }

    /// Seed scenario: a grammar with no rules at all is rejected for
    /// lacking a start rule.
    #[test]
    fn missing_start_rule_is_rejected() {
        let out = run_src("grammar g; Digit: [0-9] ;");
        assert!(!out.success);
        assert!(out.diagnostics.iter().any(|d| matches!(d.category, Category::Structural)));
    }

    /// Seed scenario 6: a grammar with rules, none of them named `start`,
    /// is rejected the same way as one with no rules at all.
    #[test]
    fn rule_not_named_start_is_rejected() {
        let out = run_src("grammar g; foo: 'x' ;");
        assert!(!out.success);
        assert!(out
            .diagnostics
            .iter()
            .any(|d| matches!(d.category, Category::Structural) && d.message.contains("start rule")));
    }
}
