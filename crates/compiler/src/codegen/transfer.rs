//! Terminator lowering
//!
//! | Transfer                 | C                                           |
//! |--------------------------|---------------------------------------------|
//! | `Call(none, f, args)`    | `return f(args);`                           |
//! | `Call(L, f, args)`       | `p = f(args); goto L;` (`p` is L's formal)  |
//! | `Goto(L, args)`          | one `formal = arg;` per pair, `goto L;`     |
//! | `Return(x)`              | `return x;`                                 |
//! | `Match(x, clauses, else)`| `switch (fi_class(x))`, fields fetched into the clause block's formals |
//!
//! Every check runs before the terminator's first line is written.

use super::functions::LabelIndex;
use super::{CodeGen, Diagnostic};
use crate::error::CompileError;
use crate::ir::{Block, Clause, FuncDef, Transfer};
use std::collections::HashSet;
use std::fmt::Write as _;
use tracing::warn;

impl CodeGen<'_> {
    pub(super) fn emit_transfer(
        &mut self,
        func: &FuncDef,
        labels: &LabelIndex<'_>,
        block: &Block,
    ) -> Result<(), CompileError> {
        match &block.transfer {
            Transfer::Call {
                cont: None,
                callee,
                args,
            } => {
                let call = self.render_call(callee, args);
                writeln!(&mut self.output, "    return {};", call)?;
            }
            Transfer::Call {
                cont: Some(cont),
                callee,
                args,
            } => {
                let target = lookup(func, labels, cont)?;
                let call = self.render_call(callee, args);
                match target.params.as_slice() {
                    [] => writeln!(&mut self.output, "    {};", call)?,
                    [result] => writeln!(&mut self.output, "    {} = {};", result, call)?,
                    params => {
                        return Err(CompileError::Arity {
                            context: format!(
                                "continuation '{}' of the call to '{}' in function '{}'",
                                cont, callee, func.name
                            ),
                            expected: 1,
                            found: params.len(),
                        });
                    }
                }
                writeln!(&mut self.output, "    goto {};", cont)?;
            }
            Transfer::Goto { label, args } => {
                let target = lookup(func, labels, label)?;
                if target.params.len() != args.len() {
                    return Err(CompileError::Arity {
                        context: format!("goto '{}' in function '{}'", label, func.name),
                        expected: target.params.len(),
                        found: args.len(),
                    });
                }
                for (formal, arg) in target.params.iter().zip(args) {
                    writeln!(&mut self.output, "    {} = {};", formal, arg)?;
                }
                writeln!(&mut self.output, "    goto {};", label)?;
            }
            Transfer::Return(value) => {
                writeln!(&mut self.output, "    return {};", value)?;
            }
            Transfer::Match {
                scrutinee,
                clauses,
                otherwise,
                line,
            } => self.emit_match(func, labels, scrutinee, clauses, otherwise.as_deref(), *line)?,
        }
        Ok(())
    }

    fn emit_match(
        &mut self,
        func: &FuncDef,
        labels: &LabelIndex<'_>,
        scrutinee: &str,
        clauses: &[Clause],
        otherwise: Option<&str>,
        line: usize,
    ) -> Result<(), CompileError> {
        // Resolve every clause first so nothing is written on error
        let mut seen = HashSet::new();
        let mut cases = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let (class, arity) = self.lookup_class(&clause.constructor)?;
            let target = lookup(func, labels, &clause.label)?;
            if target.params.len() != arity as usize {
                return Err(CompileError::Arity {
                    context: format!(
                        "clause '{}' -> '{}' in function '{}'",
                        clause.constructor, clause.label, func.name
                    ),
                    expected: arity as usize,
                    found: target.params.len(),
                });
            }
            if !seen.insert(class.clone()) {
                let diagnostic = Diagnostic::DuplicateClause {
                    function: func.name.clone(),
                    constructor: clause.constructor.clone(),
                };
                warn!("{}", diagnostic);
                self.diagnostics.push(diagnostic);
                continue;
            }
            cases.push((class, target));
        }
        if let Some(label) = otherwise {
            lookup(func, labels, label)?;
        }

        let fetch = self.config.callee_symbol("fetch");
        writeln!(&mut self.output, "    switch (fi_class({})) {{", scrutinee)?;
        for (class, target) in cases {
            writeln!(&mut self.output, "    case {}:", class)?;
            for (i, formal) in field_order(&target.params, scrutinee) {
                writeln!(
                    &mut self.output,
                    "        {} = {}({}, fi_make_number({}));",
                    formal, fetch, scrutinee, i
                )?;
            }
            writeln!(&mut self.output, "        goto {};", target.label)?;
        }
        writeln!(&mut self.output, "    default:")?;
        match otherwise {
            Some(label) => writeln!(&mut self.output, "        goto {};", label)?,
            None => writeln!(
                &mut self.output,
                "        fi_match_failure({}, fi_class({}));",
                line, scrutinee
            )?,
        }
        writeln!(&mut self.output, "    }}")?;
        Ok(())
    }
}

/// `(field index, formal)` pairs in the order the fetches are emitted.
///
/// A formal named like the scrutinee overwrites it, so it is fetched last,
/// and only its final position is kept.
fn field_order<'f>(params: &'f [String], scrutinee: &str) -> Vec<(usize, &'f str)> {
    let last_alias = params.iter().rposition(|p| p == scrutinee);
    let mut order: Vec<(usize, &str)> = params
        .iter()
        .enumerate()
        .filter(|(i, p)| *p != scrutinee || Some(*i) == last_alias)
        .map(|(i, p)| (i, p.as_str()))
        .collect();
    order.sort_by_key(|(_, p)| *p == scrutinee);
    order
}

fn lookup<'f>(
    func: &FuncDef,
    labels: &LabelIndex<'f>,
    label: &str,
) -> Result<&'f Block, CompileError> {
    labels
        .get(label)
        .copied()
        .ok_or_else(|| CompileError::UnknownLabel {
            function: func.name.clone(),
            label: label.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use crate::codegen::Diagnostic;
    use crate::codegen::tests::generate;
    use crate::error::CompileError;

    #[test]
    fn test_tail_calls() {
        let (code, _) = generate(
            "(define (f x)
               (block B () (g x x)))
             (define (k x)
               (block B () (genTmp)))",
        )
        .unwrap();
        assert!(code.contains("B:\n    return g(x, x);\n"));
        assert!(code.contains("B:\n    return fi_prim_genTmp();\n"));
    }

    #[test]
    fn test_call_with_continuation() {
        let (code, _) = generate(
            "(define (f x)
               (block B1 () (goto B2 (g x)))
               (block B2 (r) (goto B3 (die r)))
               (block B3 () (return x)))",
        )
        .unwrap();
        assert!(code.contains("B1:\n    r = g(x);\n    goto B2;\n"));
        assert!(code.contains("B2:\n    fi_prim_die(r);\n    goto B3;\n"));
    }

    #[test]
    fn test_continuation_with_two_formals() {
        assert!(matches!(
            generate(
                "(define (f x)
                   (block B1 () (goto B2 (g x)))
                   (block B2 (a b) (return a)))"
            ),
            Err(CompileError::Arity {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_labels() {
        for input in [
            "(define (f x) (block B () (goto C x)))",
            "(define (f x) (block B () (goto C (g x))))",
            "(define (f x) (block B () (match x (case Nil C))))",
            "(define (f x) (block B () (match x (else C))))",
        ] {
            assert!(
                matches!(generate(input), Err(CompileError::UnknownLabel { .. })),
                "{}",
                input
            );
        }
    }

    #[test]
    fn test_match_on_builtin_classes() {
        let (code, _) = generate(
            "(define (len xs)
               (block B () (match xs (case Cons C) (case Nil N)))
               (block C (h t) (return t))
               (block N () (return xs)))",
        )
        .unwrap();
        let expected = "\
    switch (fi_class(xs)) {
    case CLASS_Cons:
        h = fi_prim_fetch(xs, fi_make_number(0));
        t = fi_prim_fetch(xs, fi_make_number(1));
        goto C;
    case CLASS_Nil:
        goto N;
    default:
        fi_match_failure(2, fi_class(xs));
    }
";
        assert!(code.contains(expected), "{}", code);
    }

    #[test]
    fn test_match_errors() {
        assert!(matches!(
            generate(
                "(define (f x)
                   (block B () (match x (case Triple C)))
                   (block C (a) (return a)))"
            ),
            Err(CompileError::UnknownConstructor(name)) if name == "Triple"
        ));
        assert!(matches!(
            generate(
                "(define (f x)
                   (block B () (match x (case Cons C)))
                   (block C (a) (return a)))"
            ),
            Err(CompileError::Arity {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_formal_shadowing_scrutinee_is_fetched_last() {
        let (code, _) = generate(
            "(define (Pair a b))
             (define (f v)
               (block B () (match v (case Pair P)))
               (block P (v r) (return r)))",
        )
        .unwrap();
        let expected = "\
    case CLASS_Pair:
        r = fi_prim_fetch(v, fi_make_number(1));
        v = fi_prim_fetch(v, fi_make_number(0));
        goto P;
";
        assert!(code.contains(expected), "{}", code);
    }

    #[test]
    fn test_field_order() {
        let params = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        assert_eq!(
            super::field_order(&params(&["a", "b"]), "x"),
            vec![(0, "a"), (1, "b")]
        );
        assert_eq!(
            super::field_order(&params(&["x", "b", "c"]), "x"),
            vec![(1, "b"), (2, "c"), (0, "x")]
        );
        // Repeated formal: the later field wins, as with in-order assignment
        assert_eq!(
            super::field_order(&params(&["x", "x"]), "x"),
            vec![(1, "x")]
        );
    }

    #[test]
    fn test_duplicate_clause_is_dropped() {
        let (code, diagnostics) = generate(
            "(define (f x)
               (block B () (match x (case Nil N) (case Nil M) (else N)))
               (block N () (return x))
               (block M () (return x)))",
        )
        .unwrap();
        assert_eq!(code.matches("case CLASS_Nil:").count(), 1);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::DuplicateClause {
                function: "f".to_string(),
                constructor: "Nil".to_string(),
            }]
        );
    }
}
