//! fi-IR parser
//!
//! ```text
//! top      := (define NAME literal)
//!           | (define (NAME ARG*))
//!           | (define (NAME ARG*) block+)
//! block    := (block LABEL (ARG*) (set NAME expr)* transfer)
//! expr     := NUMBER | STRING | NAME | (NAME NAME*)
//! transfer := (return NAME) | (goto LABEL NAME*) | (goto LABEL (NAME NAME*))
//!           | (NAME NAME*) | (match NAME (case CONS LABEL)* [(else LABEL)])
//! ```

use super::Forms;
use crate::error::CompileError;
use crate::ir::{Block, Clause, ConsDef, Definition, Expr, FuncDef, Program, Stmt, Transfer};
use crate::lexer::Keyword;
use crate::reader::Document;
use fi_core::{Heap, Word};

/// Parse every top-level form of `doc` as a fi-IR definition
pub fn parse_program(heap: &Heap, doc: &Document) -> Result<Program, CompileError> {
    let forms = Forms::new(heap, doc);
    let mut program = Program::default();
    for form in forms.top_level() {
        program.definitions.push(parse_definition(&forms, *form)?);
    }
    Ok(program)
}

fn parse_definition(forms: &Forms, form: Word) -> Result<Definition, CompileError> {
    let (line, rest) = forms.definition(form)?;
    let Some((head, body)) = rest.split_first() else {
        return Err(CompileError::parse(line, "empty definition"));
    };

    if let Some(name) = forms.name(*head) {
        return match body {
            [value] => Ok(Definition::Var {
                name,
                value: *value,
            }),
            _ => Err(CompileError::parse(
                line,
                format!("variable '{}' needs exactly one initial value", name),
            )),
        };
    }

    let (name, params) = forms.signature(*head, line)?;
    if body.is_empty() {
        return Ok(Definition::Cons(ConsDef {
            name,
            fields: params,
        }));
    }
    let blocks = body
        .iter()
        .map(|b| parse_block(forms, *b, line))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Definition::Func(FuncDef {
        name,
        params,
        blocks,
    }))
}

fn parse_block(forms: &Forms, word: Word, outer_line: usize) -> Result<Block, CompileError> {
    let line = forms.line(word).max(outer_line);
    let items = forms.expect_list(word, line, "(block LABEL (ARG*) ...)")?;
    match items.as_slice() {
        [head, label, params, body @ .., transfer] if forms.keyword(*head) == Some(Keyword::Block) => {
            let label = forms.expect_name(*label, line, "a block label")?;
            let params = forms.names(*params, line, "a block parameter list")?;
            let stmts = body
                .iter()
                .map(|s| parse_stmt(forms, *s, line))
                .collect::<Result<Vec<_>, _>>()?;
            let transfer = parse_transfer(forms, *transfer, line)?;
            Ok(Block {
                label,
                params,
                stmts,
                transfer,
            })
        }
        _ => Err(CompileError::parse(
            line,
            "expected (block LABEL (ARG*) stmt* transfer)",
        )),
    }
}

fn parse_stmt(forms: &Forms, word: Word, outer_line: usize) -> Result<Stmt, CompileError> {
    let line = forms.line(word).max(outer_line);
    let items = forms.expect_list(word, line, "(set NAME expr)")?;
    match items.as_slice() {
        [head, target, expr] if forms.keyword(*head) == Some(Keyword::Set) => Ok(Stmt {
            target: forms.expect_name(*target, line, "an assignment target")?,
            expr: parse_expr(forms, *expr, line)?,
        }),
        _ => Err(CompileError::parse(line, "expected (set NAME expr)")),
    }
}

fn parse_expr(forms: &Forms, word: Word, line: usize) -> Result<Expr, CompileError> {
    if forms.is_literal(word) {
        return Ok(Expr::Literal(word));
    }
    if let Some(name) = forms.name(word) {
        return Ok(Expr::Var(name));
    }
    let (callee, args) = parse_application(forms, word, line)?;
    Ok(Expr::Apply { callee, args })
}

/// `(NAME NAME*)`
fn parse_application(
    forms: &Forms,
    word: Word,
    outer_line: usize,
) -> Result<(String, Vec<String>), CompileError> {
    let line = forms.line(word).max(outer_line);
    let items = forms.expect_list(word, line, "an application (NAME NAME*)")?;
    let Some((head, args)) = items.split_first() else {
        return Err(CompileError::parse(line, "empty application"));
    };
    let callee = forms.expect_name(*head, line, "a function name")?;
    let args = args
        .iter()
        .map(|a| forms.expect_name(*a, line, "an argument name"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((callee, args))
}

fn parse_transfer(forms: &Forms, word: Word, outer_line: usize) -> Result<Transfer, CompileError> {
    let line = forms.line(word).max(outer_line);
    let items = forms.expect_list(word, line, "a transfer")?;
    let Some((head, rest)) = items.split_first() else {
        return Err(CompileError::parse(line, "empty transfer"));
    };

    match forms.keyword(*head) {
        Some(Keyword::Return) => match rest {
            [value] => Ok(Transfer::Return(forms.expect_name(
                *value,
                line,
                "a returned name",
            )?)),
            _ => Err(CompileError::parse(line, "expected (return NAME)")),
        },
        Some(Keyword::Goto) => {
            let Some((label, args)) = rest.split_first() else {
                return Err(CompileError::parse(line, "expected (goto LABEL ...)"));
            };
            let label = forms.expect_name(*label, line, "a goto label")?;
            match args {
                [call] if forms.is_list(*call) => {
                    let (callee, args) = parse_application(forms, *call, line)?;
                    return Ok(Transfer::Call {
                        cont: Some(label),
                        callee,
                        args,
                    });
                }
                _ => {}
            }
            let args = args
                .iter()
                .map(|a| forms.expect_name(*a, line, "a goto argument"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Transfer::Goto { label, args })
        }
        Some(Keyword::Match) => parse_match(forms, rest, line),
        Some(keyword) => Err(CompileError::parse(
            line,
            format!("'{}' cannot end a block", keyword.as_str()),
        )),
        None => {
            let (callee, args) = parse_application(forms, word, line)?;
            Ok(Transfer::Call {
                cont: None,
                callee,
                args,
            })
        }
    }
}

fn parse_match(forms: &Forms, rest: &[Word], line: usize) -> Result<Transfer, CompileError> {
    let Some((scrutinee, clause_words)) = rest.split_first() else {
        return Err(CompileError::parse(line, "expected (match NAME clause*)"));
    };
    let scrutinee = forms.expect_name(*scrutinee, line, "a match scrutinee")?;

    let mut clauses = Vec::new();
    let mut otherwise = None;
    for (i, word) in clause_words.iter().enumerate() {
        let clause_line = forms.line(*word).max(line);
        let items = forms.expect_list(*word, clause_line, "a match clause")?;
        match items.as_slice() {
            [head, constructor, label] if forms.keyword(*head) == Some(Keyword::Case) => {
                clauses.push(Clause {
                    constructor: forms.expect_name(*constructor, clause_line, "a constructor")?,
                    label: forms.expect_name(*label, clause_line, "a clause label")?,
                });
            }
            [head, label] if forms.keyword(*head) == Some(Keyword::Else) => {
                if i + 1 != clause_words.len() {
                    return Err(CompileError::parse(
                        clause_line,
                        "else must be the last clause",
                    ));
                }
                otherwise = Some(forms.expect_name(*label, clause_line, "an else label")?);
            }
            _ => {
                return Err(CompileError::parse(
                    clause_line,
                    "expected (case CONSTRUCTOR LABEL) or (else LABEL)",
                ));
            }
        }
    }

    Ok(Transfer::Match {
        scrutinee,
        clauses,
        otherwise,
        line,
    })
}
