//! Grammar transformation pipeline stage (spec.md §4.4): left-factoring
//! followed by direct-left-recursion elimination, run as two whole-grammar
//! passes in that order so that recursion elimination only ever has to
//! reconcile the single left-recursive production left-factoring should
//! have consolidated rules down to.
//!
//! Grounded on `original_source/zebu/type.go`'s `typeCheck` orchestration
//! (`leftFactor(top); removeDirectRecursion(top); ...`).

pub mod direct_recursion;
pub mod left_factor;

use crate::arena::{Arena, NodeId, NodeKind};
use crate::diagnostics::Diagnostics;
use crate::interner::{GrammarId, SymbolTable};

/// Appends `'` to `base` until an unused name is found in `grammar`,
/// mirroring `original_source/zebu/type.go`'s `primeName`.
pub(crate) fn prime_name(symbols: &mut SymbolTable, grammar: GrammarId, base: &str) -> crate::interner::SymbolId {
    let mut candidate = format!("{}'", base);
    loop {
        let id = symbols.lookup_in(&candidate, grammar);
        if symbols.get(id).defn.is_none() {
            return id;
        }
        candidate.push('\'');
    }
}

fn rule_ids(arena: &Arena, decls: &[NodeId]) -> Vec<NodeId> {
    decls
        .iter()
        .copied()
        .filter(|&id| matches!(arena.kind(id), NodeKind::Rule { .. }))
        .collect()
}

/// Runs left-factoring to a fixed point, then direct-recursion elimination
/// once over the resulting rule set. Any rules synthesized along the way
/// are appended to `decls` so later stages (FIRST/FOLLOW, LL(1), emission)
/// see them like any other rule.
pub fn transform_rules(
    arena: &mut Arena,
    symbols: &mut SymbolTable,
    grammar: GrammarId,
    decls: &mut Vec<NodeId>,
    diags: &mut Diagnostics,
) {
    let mut worklist = rule_ids(arena, decls);
    let mut i = 0;
    while i < worklist.len() {
        let rule = worklist[i];
        i += 1;
        let spawned = left_factor::left_factor_rule(arena, symbols, grammar, rule);
        for new_rule in spawned {
            decls.push(new_rule);
            worklist.push(new_rule);
        }
    }

    let all_rules = rule_ids(arena, decls);
    for rule in all_rules {
        if let Some(new_rule) = direct_recursion::remove_direct_recursion(arena, symbols, grammar, rule, diags) {
            decls.push(new_rule);
        }
    }
}
