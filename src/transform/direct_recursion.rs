//! Direct-left-recursion elimination: `R -> R alpha | beta` becomes
//! `R -> beta R'`, `R' -> alpha R' | ε` (spec.md §4.4).
//!
//! Grounded on `original_source/zebu/type.go`'s `removeDirectRecursion`,
//! which treats more than one left-recursive production surviving
//! left-factoring as a program invariant violation; the original panics,
//! this records an internal diagnostic instead so the pipeline can abort
//! gracefully (spec.md §7).

use std::rc::Rc;

use crate::arena::{Arena, NodeId, NodeKind, ProdElem};
use crate::diagnostics::{Category, Diagnostics};
use crate::interner::{GrammarId, SymbolTable};

/// Eliminates direct left recursion from one rule in place. Returns the
/// synthesized prime rule, if the rule was left-recursive.
pub fn remove_direct_recursion(
    arena: &mut Arena,
    symbols: &mut SymbolTable,
    grammar: GrammarId,
    rule: NodeId,
    diags: &mut Diagnostics,
) -> Option<NodeId> {
    let (sym, prods, pos) = match arena.kind(rule) {
        NodeKind::Rule { sym, prods, .. } => (*sym, prods.clone(), arena.pos(rule)),
        _ => return None,
    };

    let mut recursive: Vec<Vec<ProdElem>> = Vec::new();
    let mut base: Vec<NodeId> = Vec::new();
    for &prod in &prods {
        let elems = match arena.kind(prod) {
            NodeKind::Prod { elems } => elems.clone(),
            _ => continue,
        };
        let head = elems.first().map(|e| e.left).unwrap_or(arena.epsilon);
        if head == rule {
            recursive.push(elems);
        } else {
            base.push(prod);
        }
    }

    if recursive.is_empty() {
        return None;
    }
    if recursive.len() > 1 {
        diags.push(
            pos,
            Category::Internal,
            format!(
                "'{}' still has {} left-recursive productions after left-factoring",
                symbols.get(sym).name,
                recursive.len()
            ),
        );
        return None;
    }
    if base.is_empty() {
        diags.push(
            pos,
            Category::Structural,
            format!("'{}' is left-recursive with no non-recursive base production", symbols.get(sym).name),
        );
        return None;
    }

    let tail = recursive[0][1..].to_vec();
    let rule_name: Rc<str> = symbols.get(sym).name.clone();
    let prime_sym = super::prime_name(symbols, grammar, &rule_name);

    // Allocate the prime rule as a placeholder first so its own
    // recursive production can reference it by `NodeId`.
    let prime_rule = arena.alloc(NodeKind::NoName { sym: prime_sym }, pos.clone());
    symbols.get_mut(prime_sym).defn = Some(prime_rule);

    let mut recur_tail = tail;
    recur_tail.push(ProdElem { left: prime_rule, var: None, action: None });
    let recur_prod = arena.alloc(NodeKind::Prod { elems: recur_tail }, pos.clone());
    let eps_prod = arena.alloc(
        NodeKind::Prod {
            elems: vec![ProdElem { left: arena.epsilon, var: None, action: None }],
        },
        pos.clone(),
    );
    arena.redefine(
        prime_rule,
        NodeKind::Rule {
            sym: prime_sym,
            ntype: None,
            prods: vec![recur_prod, eps_prod],
            orig: Some(rule),
        },
        pos.clone(),
    );

    let new_base: Vec<NodeId> = base
        .iter()
        .map(|&p| {
            let mut elems = match arena.kind(p) {
                NodeKind::Prod { elems } => elems.clone(),
                _ => Vec::new(),
            };
            elems.push(ProdElem { left: prime_rule, var: None, action: None });
            arena.alloc(NodeKind::Prod { elems }, pos.clone())
        })
        .collect();

    if let NodeKind::Rule { prods: slot, .. } = &mut arena.get_mut(rule).kind {
        *slot = new_base;
    }
    Some(prime_rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use crate::util::Log;
    use std::rc::Rc as StdRc;

    fn prods_of(arena: &Arena, rule: NodeId) -> Vec<NodeId> {
        match arena.kind(rule) {
            NodeKind::Rule { prods, .. } => prods.clone(),
            _ => panic!("not a rule"),
        }
    }

    #[test]
    fn left_recursive_rule_gets_a_prime_rule_with_epsilon_base() {
        let mut out = parse_file(
            StdRc::from("g.llg"),
            "grammar g; expr: expr 'plus' 'n' | 'n' ;",
            Log::None,
        );
        assert!(!out.diagnostics.has_errors());
        let root = out.root.unwrap();
        let decls = match out.arena.kind(root) {
            NodeKind::Grammar { decls, .. } => decls.clone(),
            _ => panic!(),
        };
        let expr = decls[0];
        let mut diags = Diagnostics::new();
        let prime = remove_direct_recursion(&mut out.arena, &mut out.symbols, out.grammars.local, expr, &mut diags)
            .expect("rule is left-recursive");
        assert!(!diags.has_errors());

        let expr_prods = prods_of(&out.arena, expr);
        assert_eq!(expr_prods.len(), 1);

        let prime_prods = prods_of(&out.arena, prime);
        assert_eq!(prime_prods.len(), 2);
        let has_epsilon = prime_prods.iter().any(|&p| match out.arena.kind(p) {
            NodeKind::Prod { elems } => elems.len() == 1 && out.arena.is_epsilon(elems[0].left),
            _ => false,
        });
        assert!(has_epsilon);
    }

    #[test]
    fn non_recursive_rule_is_left_untouched() {
        let mut out = parse_file(StdRc::from("g.llg"), "grammar g; start: 'a' ;", Log::None);
        let root = out.root.unwrap();
        let decls = match out.arena.kind(root) {
            NodeKind::Grammar { decls, .. } => decls.clone(),
            _ => panic!(),
        };
        let mut diags = Diagnostics::new();
        let result =
            remove_direct_recursion(&mut out.arena, &mut out.symbols, out.grammars.local, decls[0], &mut diags);
        assert!(result.is_none());
        assert!(!diags.has_errors());
    }
}
