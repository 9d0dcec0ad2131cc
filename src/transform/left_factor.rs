//! Left-factoring: productions of a rule that share a leading element are
//! grouped and rewritten as `prefix primeRule`, with `primeRule` holding
//! each production's remaining suffix (spec.md §4.4, invariant "no two
//! productions of a rule share a common first element").
//!
//! Grounded on `original_source/zebu/type.go`'s `leftFactor` (grouping by
//! first-element identity, longest-common-prefix search) and
//! `original_source/zebu/node.go`'s `nodeRuleFromFactoring`.

use std::rc::Rc;

use crate::arena::{Arena, NodeId, NodeKind, ProdElem};
use crate::interner::{GrammarId, SymbolTable};

/// Left-factors one rule in place. Returns any prime rules synthesized so
/// the caller can fold them into the overall worklist (a synthesized
/// prime rule can itself need further factoring).
pub fn left_factor_rule(
    arena: &mut Arena,
    symbols: &mut SymbolTable,
    grammar: GrammarId,
    rule: NodeId,
) -> Vec<NodeId> {
    let (sym, prods, pos) = match arena.kind(rule) {
        NodeKind::Rule { sym, prods, .. } => (*sym, prods.clone(), arena.pos(rule)),
        _ => return Vec::new(),
    };
    if prods.len() < 2 {
        return Vec::new();
    }

    let mut groups: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
    let mut singles: Vec<NodeId> = Vec::new();
    for &prod in &prods {
        let elems = match arena.kind(prod) {
            NodeKind::Prod { elems } => elems.clone(),
            _ => continue,
        };
        let head = elems.first().map(|e| e.left).unwrap_or(arena.epsilon);
        if arena.is_epsilon(head) {
            singles.push(prod);
            continue;
        }
        match groups.iter_mut().find(|(key, _)| *key == head) {
            Some((_, members)) => members.push(prod),
            None => groups.push((head, vec![prod])),
        }
    }

    let rule_name: Rc<str> = symbols.get(sym).name.clone();
    let mut spawned = Vec::new();
    let mut new_prods: Vec<NodeId> = Vec::new();

    for (_, members) in groups {
        if members.len() < 2 {
            new_prods.push(members[0]);
            continue;
        }

        let member_elems: Vec<Vec<ProdElem>> = members
            .iter()
            .map(|&p| match arena.kind(p) {
                NodeKind::Prod { elems } => elems.clone(),
                _ => Vec::new(),
            })
            .collect();
        let min_len = member_elems.iter().map(|e| e.len()).min().unwrap_or(0);
        let mut prefix_len = 1; // members share elems[0].left by construction
        while prefix_len < min_len
            && member_elems
                .iter()
                .all(|e| e[prefix_len].left == member_elems[0][prefix_len].left)
        {
            prefix_len += 1;
        }

        let prime_sym = super::prime_name(symbols, grammar, &rule_name);
        let remains: Vec<NodeId> = member_elems
            .iter()
            .map(|full| {
                let tail: Vec<ProdElem> = full[prefix_len..].to_vec();
                if tail.is_empty() {
                    arena.alloc(
                        NodeKind::Prod {
                            elems: vec![ProdElem { left: arena.epsilon, var: None, action: None }],
                        },
                        pos.clone(),
                    )
                } else {
                    arena.alloc(NodeKind::Prod { elems: tail }, pos.clone())
                }
            })
            .collect();

        let prime_rule = arena.alloc(
            NodeKind::Rule { sym: prime_sym, ntype: None, prods: remains, orig: Some(rule) },
            pos.clone(),
        );
        symbols.get_mut(prime_sym).defn = Some(prime_rule);
        spawned.push(prime_rule);

        let mut prefix: Vec<ProdElem> = member_elems[0][..prefix_len].to_vec();
        prefix.push(ProdElem { left: prime_rule, var: None, action: None });
        new_prods.push(arena.alloc(NodeKind::Prod { elems: prefix }, pos.clone()));
    }

    new_prods.extend(singles);
    if let NodeKind::Rule { prods: slot, .. } = &mut arena.get_mut(rule).kind {
        *slot = new_prods;
    }
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use crate::util::Log;

    fn rule_prod_count(arena: &Arena, rule: NodeId) -> usize {
        match arena.kind(rule) {
            NodeKind::Rule { prods, .. } => prods.len(),
            _ => panic!("not a rule"),
        }
    }

    #[test]
    fn shared_prefix_is_factored_into_a_prime_rule() {
        let mut out = parse_file(
            Rc::from("g.llg"),
            "grammar g; start: 'if' 'then' | 'if' 'else' ;",
            Log::None,
        );
        assert!(!out.diagnostics.has_errors());
        let root = out.root.unwrap();
        let decls = match out.arena.kind(root) {
            NodeKind::Grammar { decls, .. } => decls.clone(),
            _ => panic!(),
        };
        let start = decls[0];
        let spawned = left_factor_rule(&mut out.arena, &mut out.symbols, out.grammars.local, start);
        assert_eq!(spawned.len(), 1);
        assert_eq!(rule_prod_count(&out.arena, start), 1);
        assert_eq!(rule_prod_count(&out.arena, spawned[0]), 2);
    }

    #[test]
    fn unrelated_productions_are_left_untouched() {
        let mut out = parse_file(
            Rc::from("g.llg"),
            "grammar g; start: 'a' | 'b' ;",
            Log::None,
        );
        let root = out.root.unwrap();
        let decls = match out.arena.kind(root) {
            NodeKind::Grammar { decls, .. } => decls.clone(),
            _ => panic!(),
        };
        let start = decls[0];
        let spawned = left_factor_rule(&mut out.arena, &mut out.symbols, out.grammars.local, start);
        assert!(spawned.is_empty());
        assert_eq!(rule_prod_count(&out.arena, start), 2);
    }
}
