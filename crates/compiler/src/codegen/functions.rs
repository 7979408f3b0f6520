//! Pass 3: function bodies
//!
//! A function's locals live in one flat pool: every block formal and every
//! assignment target, across all blocks, minus the function's parameters.
//! Two blocks that introduce the same name share one C variable.

use super::{CodeGen, Diagnostic, typed_params};
use crate::error::CompileError;
use crate::ir::{Block, Definition, Expr, FuncDef, Program};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use tracing::{debug, warn};

/// Blocks of one function by label
pub(super) type LabelIndex<'f> = HashMap<&'f str, &'f Block>;

impl CodeGen<'_> {
    pub(super) fn emit_functions(&mut self, program: &Program) -> Result<(), CompileError> {
        for definition in &program.definitions {
            if let Definition::Func(func) = definition {
                self.emit_function(func)?;
            }
        }
        Ok(())
    }

    fn emit_function(&mut self, func: &FuncDef) -> Result<(), CompileError> {
        debug!(function = %func.name, blocks = func.blocks.len(), "emitting function");
        let labels = index_labels(func)?;
        let Some(entry) = func.blocks.first() else {
            return Err(CompileError::Type(format!(
                "function '{}' has no blocks",
                func.name
            )));
        };
        let pool = self.variable_pool(func);

        writeln!(&mut self.output)?;
        writeln!(
            &mut self.output,
            "long {}({})",
            func.name,
            typed_params(&func.params)
        )?;
        writeln!(&mut self.output, "{{")?;
        if !pool.is_empty() {
            writeln!(&mut self.output, "    long {};", pool.join(", "))?;
        }
        writeln!(&mut self.output, "    goto {};", entry.label)?;

        for block in &func.blocks {
            writeln!(&mut self.output, "{}:", block.label)?;
            for stmt in &block.stmts {
                let expr = self.render_expr(&stmt.expr)?;
                writeln!(&mut self.output, "    {} = {};", stmt.target, expr)?;
            }
            self.emit_transfer(func, &labels, block)?;
        }

        writeln!(&mut self.output, "}}")?;
        Ok(())
    }

    /// Locals of `func` in first-introduction order.
    ///
    /// Records a [`Diagnostic::SharedVariable`] for each block that
    /// introduces a name an earlier block already introduced.
    fn variable_pool<'f>(&mut self, func: &'f FuncDef) -> Vec<&'f str> {
        let params: HashSet<&str> = func.params.iter().map(String::as_str).collect();
        let mut owner: HashMap<&str, &str> = HashMap::new();
        let mut reported: HashSet<(&str, &str)> = HashSet::new();
        let mut pool = Vec::new();

        for block in &func.blocks {
            let introduced = block
                .params
                .iter()
                .chain(block.stmts.iter().map(|s| &s.target));
            for name in introduced {
                let name = name.as_str();
                if params.contains(name) {
                    continue;
                }
                match owner.get(name) {
                    None => {
                        owner.insert(name, block.label.as_str());
                        pool.push(name);
                    }
                    Some(first) if *first != block.label => {
                        if reported.insert((name, block.label.as_str())) {
                            let diagnostic = Diagnostic::SharedVariable {
                                function: func.name.clone(),
                                name: name.to_string(),
                                first_block: first.to_string(),
                                block: block.label.clone(),
                            };
                            warn!("{}", diagnostic);
                            self.diagnostics.push(diagnostic);
                        }
                    }
                    Some(_) => {}
                }
            }
        }
        pool
    }

    fn render_expr(&self, expr: &Expr) -> Result<String, CompileError> {
        match expr {
            Expr::Literal(word) => self.render_literal(*word),
            Expr::Var(name) => Ok(name.clone()),
            Expr::Apply { callee, args } => Ok(self.render_call(callee, args)),
        }
    }

    /// `callee(args)`, with primitives renamed
    pub(super) fn render_call(&self, callee: &str, args: &[String]) -> String {
        format!("{}({})", self.config.callee_symbol(callee), args.join(", "))
    }
}

fn index_labels(func: &FuncDef) -> Result<LabelIndex<'_>, CompileError> {
    let mut labels = HashMap::with_capacity(func.blocks.len());
    for block in &func.blocks {
        if labels.insert(block.label.as_str(), block).is_some() {
            return Err(CompileError::DuplicateLabel {
                function: func.name.clone(),
                label: block.label.clone(),
            });
        }
    }
    Ok(labels)
}
