//! hi-IR parser
//!
//! ```text
//! top   := (define NAME literal) | (define (NAME ARG*)) | (define (NAME ARG*) expr)
//! expr  := NUMBER | STRING | NAME | (NAME expr*) | (begin expr+)
//!        | (block (set NAME expr)* expr)
//!        | (match expr (case CONS (NAME*) expr)* [(else expr)])
//! ```

use super::Forms;
use crate::error::CompileError;
use crate::hir::{Arm, HiDefinition, HiExpr, HiProgram};
use crate::lexer::Keyword;
use crate::reader::Document;
use fi_core::{Heap, Word};

pub fn parse_program(heap: &Heap, doc: &Document) -> Result<HiProgram, CompileError> {
    let forms = Forms::new(heap, doc);
    let mut program = HiProgram::default();
    for form in forms.top_level() {
        program.definitions.push(parse_definition(&forms, *form)?);
    }
    Ok(program)
}

fn parse_definition(forms: &Forms, form: Word) -> Result<HiDefinition, CompileError> {
    let (line, rest) = forms.definition(form)?;
    let Some((head, body)) = rest.split_first() else {
        return Err(CompileError::parse(line, "empty definition"));
    };

    if let Some(name) = forms.name(*head) {
        return match body {
            [value] => Ok(HiDefinition::Var {
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
    match body {
        [] => Ok(HiDefinition::Cons {
            name,
            fields: params,
        }),
        [expr] => Ok(HiDefinition::Func {
            name,
            params,
            body: parse_expr(forms, *expr, line)?,
        }),
        _ => Err(CompileError::parse(
            line,
            format!("body of '{}' must be a single expression", name),
        )),
    }
}

fn parse_expr(forms: &Forms, word: Word, outer_line: usize) -> Result<HiExpr, CompileError> {
    if forms.is_literal(word) {
        return Ok(HiExpr::Literal(word));
    }
    if let Some(name) = forms.name(word) {
        return Ok(HiExpr::Var(name));
    }

    let line = forms.line(word).max(outer_line);
    if let Some(keyword) = forms.keyword(word) {
        return Err(CompileError::parse(
            line,
            format!("unexpected keyword '{}'", keyword.as_str()),
        ));
    }
    let items = forms.expect_list(word, line, "an expression")?;
    let Some((head, rest)) = items.split_first() else {
        return Err(CompileError::parse(line, "empty expression"));
    };

    match forms.keyword(*head) {
        Some(Keyword::Begin) => {
            if rest.is_empty() {
                return Err(CompileError::parse(line, "(begin) needs at least one form"));
            }
            let body = rest
                .iter()
                .map(|e| parse_expr(forms, *e, line))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(HiExpr::Begin(body))
        }
        Some(Keyword::Block) => parse_block(forms, rest, line),
        Some(Keyword::Match) => parse_match(forms, rest, line),
        Some(keyword @ (Keyword::Func | Keyword::Switch | Keyword::Branch)) => Err(
            CompileError::parse(line, format!("unsupported form '{}'", keyword.as_str())),
        ),
        Some(keyword) => Err(CompileError::parse(
            line,
            format!("unexpected keyword '{}'", keyword.as_str()),
        )),
        None => {
            let callee = forms.expect_name(*head, line, "a function or constructor name")?;
            let args = rest
                .iter()
                .map(|e| parse_expr(forms, *e, line))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(HiExpr::Apply { callee, args })
        }
    }
}

fn parse_block(forms: &Forms, rest: &[Word], line: usize) -> Result<HiExpr, CompileError> {
    let Some((body, bindings)) = rest.split_last() else {
        return Err(CompileError::parse(line, "(block) needs a body"));
    };
    let mut parsed = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let binding_line = forms.line(*binding).max(line);
        let items = forms.expect_list(*binding, binding_line, "(set NAME expr)")?;
        match items.as_slice() {
            [head, name, value] if forms.keyword(*head) == Some(Keyword::Set) => {
                let name = forms.expect_name(*name, binding_line, "a binding name")?;
                parsed.push((name, parse_expr(forms, *value, binding_line)?));
            }
            _ => return Err(CompileError::parse(binding_line, "expected (set NAME expr)")),
        }
    }
    Ok(HiExpr::Block {
        bindings: parsed,
        body: Box::new(parse_expr(forms, *body, line)?),
    })
}

fn parse_match(forms: &Forms, rest: &[Word], line: usize) -> Result<HiExpr, CompileError> {
    let Some((scrutinee, clause_words)) = rest.split_first() else {
        return Err(CompileError::parse(line, "expected (match expr clause*)"));
    };
    let scrutinee = parse_expr(forms, *scrutinee, line)?;

    let mut arms = Vec::new();
    let mut otherwise = None;
    for (i, word) in clause_words.iter().enumerate() {
        let clause_line = forms.line(*word).max(line);
        let items = forms.expect_list(*word, clause_line, "a match clause")?;
        match items.as_slice() {
            [head, constructor, binders, body] if forms.keyword(*head) == Some(Keyword::Case) => {
                arms.push(Arm {
                    constructor: forms.expect_name(*constructor, clause_line, "a constructor")?,
                    binders: forms.names(*binders, clause_line, "a pattern variable list")?,
                    body: parse_expr(forms, *body, clause_line)?,
                });
            }
            [head, body] if forms.keyword(*head) == Some(Keyword::Else) => {
                if i + 1 != clause_words.len() {
                    return Err(CompileError::parse(
                        clause_line,
                        "else must be the last clause",
                    ));
                }
                otherwise = Some(Box::new(parse_expr(forms, *body, clause_line)?));
            }
            _ => {
                return Err(CompileError::parse(
                    clause_line,
                    "expected (case CONSTRUCTOR (NAME*) expr) or (else expr)",
                ));
            }
        }
    }

    Ok(HiExpr::Match {
        scrutinee: Box::new(scrutinee),
        arms,
        otherwise,
        line,
    })
}
