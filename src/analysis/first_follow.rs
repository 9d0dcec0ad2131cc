//! FIRST/FOLLOW fixed-point computation (spec.md §4.5), grounded on
//! `original_source/zebu/type.go`'s `buildFirst`/`buildFollow`: both sweep
//! every rule's productions repeatedly until a pass adds nothing new.
//!
//! Sets are kept as insertion-ordered `Vec<NodeId>` rather than a hash set
//! so iteration order — and therefore diagnostic ordering downstream in
//! [`crate::analysis::ll1`] — stays deterministic across runs.

use std::collections::HashMap;

use crate::arena::{Arena, NodeId, NodeKind, ProdElem};

pub type SymbolSet = Vec<NodeId>;

fn add_member(set: &mut SymbolSet, member: NodeId) -> bool {
    if set.contains(&member) {
        false
    } else {
        set.push(member);
        true
    }
}

fn add_all(dst: &mut SymbolSet, src: &[NodeId]) -> bool {
    let mut changed = false;
    for &m in src {
        if add_member(dst, m) {
            changed = true;
        }
    }
    changed
}

/// FIRST of a rule reference, used while walking a production's elements.
/// Stops at the production's first non-nullable element (or its end, in
/// which case the whole production is nullable).
fn build_first(arena: &Arena, rules: &[NodeId]) -> HashMap<NodeId, SymbolSet> {
    let mut first: HashMap<NodeId, SymbolSet> = rules.iter().map(|&r| (r, Vec::new())).collect();
    loop {
        let mut changed = false;
        for &rule in rules {
            let prods = match arena.kind(rule) {
                NodeKind::Rule { prods, .. } => prods.clone(),
                _ => continue,
            };
            for &prod in &prods {
                let elems = match arena.kind(prod) {
                    NodeKind::Prod { elems } => elems.clone(),
                    _ => continue,
                };
                if sweep_production(arena, &mut first, rule, &elems) {
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    first
}

/// Processes one production's elements left to right against the FIRST
/// table under construction, returning whether anything new was added.
fn sweep_production(
    arena: &Arena,
    first: &mut HashMap<NodeId, SymbolSet>,
    rule: NodeId,
    elems: &[ProdElem],
) -> bool {
    let mut changed = false;
    let mut nullable_so_far = true;
    for elem in elems {
        let e = elem.left;
        match arena.kind(e) {
            NodeKind::Epsilon => {
                changed |= add_member(first.get_mut(&rule).unwrap(), arena.epsilon);
                nullable_so_far = false;
                break;
            }
            NodeKind::RegDef { .. } | NodeKind::StrLit { .. } => {
                changed |= add_member(first.get_mut(&rule).unwrap(), e);
                nullable_so_far = false;
                break;
            }
            NodeKind::Rule { .. } => {
                let sub = first.get(&e).cloned().unwrap_or_default();
                let has_epsilon = sub.iter().any(|&m| arena.is_epsilon(m));
                let real_members: Vec<NodeId> = sub.into_iter().filter(|&m| !arena.is_epsilon(m)).collect();
                changed |= add_all(first.get_mut(&rule).unwrap(), &real_members);
                if !has_epsilon {
                    nullable_so_far = false;
                    break;
                }
            }
            _ => {
                nullable_so_far = false;
                break;
            }
        }
    }
    if nullable_so_far {
        changed |= add_member(first.get_mut(&rule).unwrap(), arena.epsilon);
    }
    changed
}

/// FIRST of an arbitrary element suffix (used by FOLLOW and by the LL(1)
/// predict-set check), reusing the same per-rule FIRST table.
pub fn first_of_suffix(arena: &Arena, first: &HashMap<NodeId, SymbolSet>, elems: &[ProdElem]) -> (SymbolSet, bool) {
    let mut set = Vec::new();
    let mut nullable = true;
    for elem in elems {
        let e = elem.left;
        match arena.kind(e) {
            NodeKind::Epsilon => {
                nullable = true;
                break;
            }
            NodeKind::RegDef { .. } | NodeKind::StrLit { .. } => {
                add_member(&mut set, e);
                nullable = false;
                break;
            }
            NodeKind::Rule { .. } => {
                let sub = first.get(&e).cloned().unwrap_or_default();
                let has_epsilon = sub.iter().any(|&m| arena.is_epsilon(m));
                for m in sub {
                    if !arena.is_epsilon(m) {
                        add_member(&mut set, m);
                    }
                }
                if !has_epsilon {
                    nullable = false;
                    break;
                }
            }
            _ => {
                nullable = false;
                break;
            }
        }
    }
    (set, nullable)
}

/// FOLLOW sets. The start rule's FOLLOW is seeded empty: there is no
/// end-of-input marker in this data model, and FOLLOW sets never contain
/// epsilon (spec.md §4.5).
fn build_follow(arena: &Arena, rules: &[NodeId], first: &HashMap<NodeId, SymbolSet>) -> HashMap<NodeId, SymbolSet> {
    let mut follow: HashMap<NodeId, SymbolSet> = rules.iter().map(|&r| (r, Vec::new())).collect();

    loop {
        let mut changed = false;
        for &rule in rules {
            let prods = match arena.kind(rule) {
                NodeKind::Rule { prods, .. } => prods.clone(),
                _ => continue,
            };
            for &prod in &prods {
                let elems = match arena.kind(prod) {
                    NodeKind::Prod { elems } => elems.clone(),
                    _ => continue,
                };
                for (i, elem) in elems.iter().enumerate() {
                    let target = elem.left;
                    if !matches!(arena.kind(target), NodeKind::Rule { .. }) {
                        continue;
                    }
                    let suffix = &elems[i + 1..];
                    let (members, nullable) = first_of_suffix(arena, first, suffix);
                    if follow.get(&target).is_none() {
                        continue;
                    }
                    if add_all(follow.get_mut(&target).unwrap(), &members) {
                        changed = true;
                    }
                    if nullable {
                        let from_rule_follow = follow.get(&rule).cloned().unwrap_or_default();
                        if add_all(follow.get_mut(&target).unwrap(), &from_rule_follow) {
                            changed = true;
                        }
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
    follow
}

pub struct FirstFollow {
    pub first: HashMap<NodeId, SymbolSet>,
    pub follow: HashMap<NodeId, SymbolSet>,
}

pub fn analyze(arena: &Arena, rules: &[NodeId], _start: Option<NodeId>) -> FirstFollow {
    let first = build_first(arena, rules);
    let follow = build_follow(arena, rules, &first);
    FirstFollow { first, follow }
}

#[cfg(test)]
mod tests {
    use super::*;
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
            _ => panic!("expected grammar node"),
        }
    }

    #[test]
    fn nullable_chain_propagates_epsilon_to_the_start_rule() {
        let out = parse_file(
            Rc::from("g.llg"),
            "grammar g; start: a ; a: b ; b: 'x' | ;",
            Log::None,
        );
        assert!(!out.diagnostics.has_errors());
        let (rules, start) = rules_of(&out);
        let ff = analyze(&out.arena, &rules, start);
        let start_rule = start.unwrap();
        let set = &ff.first[&start_rule];
        assert!(set.iter().any(|&m| out.arena.is_epsilon(m)));
        assert!(set.iter().any(|&m| matches!(out.arena.kind(m), NodeKind::StrLit { .. })));
    }

    #[test]
    fn follow_of_a_nonlast_rule_reference_is_the_next_elements_first_set() {
        let out = parse_file(
            Rc::from("g.llg"),
            "grammar g; start: a 'y' ; a: 'x' ;",
            Log::None,
        );
        assert!(!out.diagnostics.has_errors());
        let (rules, start) = rules_of(&out);
        let ff = analyze(&out.arena, &rules, start);
        let a_rule = rules
            .iter()
            .copied()
            .find(|&r| r != start.unwrap())
            .expect("rule 'a'");
        assert_eq!(ff.follow[&a_rule].len(), 1);
    }
}
