//! LL(1) predict-set disjointness check (spec.md §4.6).
//!
//! `original_source/zebu/type.go` leaves `ll1Check` as an empty stub; this
//! is a from-scratch implementation built from the FIRST/FOLLOW tables
//! computed in [`super::first_follow`]: for each rule with more than one
//! production, the PREDICT set of each production (its FIRST, plus the
//! rule's FOLLOW when the production is nullable) must be pairwise
//! disjoint from every other production's PREDICT set.

use std::collections::HashMap;

use crate::arena::{Arena, NodeId, NodeKind};
use crate::diagnostics::{Category, Diagnostics};
use crate::interner::{LiteralTable, SymbolTable};

use super::first_follow::{first_of_suffix, SymbolSet};

fn describe_member(arena: &Arena, symbols: &SymbolTable, literals: &LiteralTable, member: NodeId) -> String {
    match arena.kind(member) {
        NodeKind::Epsilon => "<empty>".to_string(),
        NodeKind::RegDef { sym, .. } => symbols.get(*sym).name.to_string(),
        NodeKind::StrLit { lit } => format!("'{}'", literals.get(*lit).content),
        _ => "<?>".to_string(),
    }
}

fn predict_set(
    arena: &Arena,
    first: &HashMap<NodeId, SymbolSet>,
    follow: &HashMap<NodeId, SymbolSet>,
    rule: NodeId,
    prod: NodeId,
) -> Vec<NodeId> {
    let elems = match arena.kind(prod) {
        NodeKind::Prod { elems } => elems.clone(),
        _ => return Vec::new(),
    };
    let (mut set, nullable) = first_of_suffix(arena, first, &elems);
    if nullable {
        if let Some(f) = follow.get(&rule) {
            for &m in f {
                if !set.contains(&m) {
                    set.push(m);
                }
            }
        }
    }
    set
}

/// Checks every multi-production rule's productions for overlapping
/// predict sets, recording one diagnostic per conflicting pair found.
pub fn check(
    arena: &Arena,
    symbols: &SymbolTable,
    literals: &LiteralTable,
    rules: &[NodeId],
    first: &HashMap<NodeId, SymbolSet>,
    follow: &HashMap<NodeId, SymbolSet>,
    diags: &mut Diagnostics,
) {
    for &rule in rules {
        let (sym, prods, orig) = match arena.kind(rule) {
            NodeKind::Rule { sym, prods, orig, .. } => (*sym, prods.clone(), *orig),
            _ => continue,
        };
        if prods.len() < 2 {
            continue;
        }
        let pos = orig.map(|o| arena.pos(o)).unwrap_or_else(|| arena.pos(rule));
        let predicts: Vec<Vec<NodeId>> = prods.iter().map(|&p| predict_set(arena, first, follow, rule, p)).collect();
        for i in 0..predicts.len() {
            for j in (i + 1)..predicts.len() {
                let overlap: Vec<NodeId> = predicts[i]
                    .iter()
                    .copied()
                    .filter(|m| predicts[j].contains(m))
                    .collect();
                if !overlap.is_empty() {
                    let names: Vec<String> = overlap
                        .iter()
                        .map(|&m| describe_member(arena, symbols, literals, m))
                        .collect();
                    diags.push(
                        pos.clone(),
                        Category::Ll1,
                        format!(
                            "{} is ambiguous: productions {} and {} both predict on {}",
                            symbols.get(sym).name,
                            i + 1,
                            j + 1,
                            names.join(", ")
                        ),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::first_follow::analyze;
    use crate::parser::parse_file;
    use crate::util::Log;
    use std::rc::Rc;

    fn rules_of(out: &crate::parser::ParseOutput) -> (Vec<NodeId>, Option<NodeId>) {
        let root = out.root.unwrap();
        match out.arena.kind(root) {
            NodeKind::Grammar { decls, start, .. } => {
                let rules = decls
                    .iter()
                    .copied()
                    .filter(|&id| matches!(out.arena.kind(id), NodeKind::Rule { .. }))
                    .collect();
                (rules, *start)
            }
            _ => panic!(),
        }
    }

    #[test]
    fn disjoint_predict_sets_raise_nothing() {
        let out = parse_file(Rc::from("g.llg"), "grammar g; start: 'a' | 'b' ;", Log::None);
        let (rules, start) = rules_of(&out);
        let ff = analyze(&out.arena, &rules, start);
        let mut diags = Diagnostics::new();
        check(&out.arena, &out.symbols, &out.literals, &rules, &ff.first, &ff.follow, &mut diags);
        assert!(!diags.has_errors());
    }

    #[test]
    fn overlapping_predict_sets_are_reported() {
        let out = parse_file(Rc::from("g.llg"), "grammar g; start: 'a' 'x' | 'a' 'y' ;", Log::None);
        let (rules, start) = rules_of(&out);
        let ff = analyze(&out.arena, &rules, start);
        let mut diags = Diagnostics::new();
        check(&out.arena, &out.symbols, &out.literals, &rules, &ff.first, &ff.follow, &mut diags);
        assert!(diags.has_errors());
    }
}
