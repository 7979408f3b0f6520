//! hi-IR to fi-IR lowering
//!
//! Each function body becomes a graph of blocks. Expressions are lowered to
//! the name of a variable holding their value. A non-tail call ends the
//! current block with a `Call` whose continuation block receives the result
//! in its single formal; a non-tail `match` ends the block with a `Match`
//! whose arms each `goto` a join block. In tail position calls and arm
//! bodies end their blocks directly.
//!
//! Fresh names are `t_N` (values) and `L_N` (labels). Source identifiers
//! cannot contain `_`, so the two never collide, and every binder introduced
//! by `block` or a match arm gets a fresh name. That keeps the function's
//! flat variable namespace free of aliasing.

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::hir::{Arm, HiDefinition, HiExpr, HiProgram};
use crate::ir::{Block, Clause, ConsDef, Definition, Expr, FuncDef, Program, Stmt, Transfer};
use fi_core::Builtin;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Built-in classes the runtime header provides constructor functions for
const HEADER_CONSTRUCTORS: [Builtin; 3] = [Builtin::Nil, Builtin::Cons, Builtin::Id];

/// Top-level names visible from every function
struct Globals {
    vars: HashSet<String>,
    functions: HashMap<String, usize>,
    constructors: HashMap<String, usize>,
}

impl Globals {
    fn collect(program: &HiProgram) -> Self {
        let mut globals = Globals {
            vars: HashSet::new(),
            functions: HashMap::new(),
            constructors: HEADER_CONSTRUCTORS
                .iter()
                .map(|b| (b.name().to_string(), b.arity() as usize))
                .collect(),
        };
        for definition in &program.definitions {
            match definition {
                HiDefinition::Var { name, .. } => {
                    globals.vars.insert(name.clone());
                }
                HiDefinition::Func { name, params, .. } => {
                    globals.functions.insert(name.clone(), params.len());
                }
                HiDefinition::Cons { name, fields } => {
                    globals.constructors.insert(name.clone(), fields.len());
                }
            }
        }
        globals
    }

    /// Field count of a class usable in a match pattern
    fn pattern_arity(&self, constructor: &str) -> Option<usize> {
        self.constructors
            .get(constructor)
            .copied()
            .or_else(|| Builtin::from_name(constructor).map(|b| b.arity() as usize))
    }
}

/// Lower a whole hi program
pub fn lower_program(program: &HiProgram, config: &CompilerConfig) -> Result<Program, CompileError> {
    let globals = Globals::collect(program);
    let mut definitions = Vec::with_capacity(program.definitions.len());

    for definition in &program.definitions {
        definitions.push(match definition {
            HiDefinition::Var { name, value } => Definition::Var {
                name: name.clone(),
                value: *value,
            },
            HiDefinition::Cons { name, fields } => Definition::Cons(ConsDef {
                name: name.clone(),
                fields: fields.clone(),
            }),
            HiDefinition::Func { name, params, body } => {
                let lowerer = FunctionLowerer::new(name, params, &globals, config);
                let func = lowerer.lower(body)?;
                debug!(function = %func.name, blocks = func.blocks.len(), "lowered");
                Definition::Func(func)
            }
        });
    }

    Ok(Program { definitions })
}

struct BlockBuilder {
    label: String,
    params: Vec<String>,
    stmts: Vec<Stmt>,
    transfer: Option<Transfer>,
}

struct FunctionLowerer<'a> {
    name: String,
    params: Vec<String>,
    globals: &'a Globals,
    config: &'a CompilerConfig,
    blocks: Vec<BlockBuilder>,
    current: usize,
    /// Source name to lowered name, innermost last
    scope: Vec<(String, String)>,
    next_tmp: usize,
    next_label: usize,
}

impl<'a> FunctionLowerer<'a> {
    fn new(
        name: &str,
        params: &[String],
        globals: &'a Globals,
        config: &'a CompilerConfig,
    ) -> Self {
        let mut lowerer = FunctionLowerer {
            name: name.to_string(),
            params: params.to_vec(),
            globals,
            config,
            blocks: Vec::new(),
            current: 0,
            scope: params.iter().map(|p| (p.clone(), p.clone())).collect(),
            next_tmp: 0,
            next_label: 0,
        };
        let label = lowerer.fresh_label();
        lowerer.current = lowerer.push_block(label, Vec::new());
        lowerer
    }

    fn lower(mut self, body: &HiExpr) -> Result<FuncDef, CompileError> {
        self.tail(body)?;

        let mut blocks = Vec::with_capacity(self.blocks.len());
        for block in self.blocks {
            let Some(transfer) = block.transfer else {
                return Err(CompileError::Type(format!(
                    "block {} in function {} has no terminator",
                    block.label, self.name
                )));
            };
            blocks.push(Block {
                label: block.label,
                params: block.params,
                stmts: block.stmts,
                transfer,
            });
        }

        Ok(FuncDef {
            name: self.name,
            params: self.params,
            blocks,
        })
    }

    fn fresh_tmp(&mut self) -> String {
        let name = format!("t_{}", self.next_tmp);
        self.next_tmp += 1;
        name
    }

    fn fresh_label(&mut self) -> String {
        let name = format!("L_{}", self.next_label);
        self.next_label += 1;
        name
    }

    fn push_block(&mut self, label: String, params: Vec<String>) -> usize {
        self.blocks.push(BlockBuilder {
            label,
            params,
            stmts: Vec::new(),
            transfer: None,
        });
        self.blocks.len() - 1
    }

    fn emit(&mut self, target: String, expr: Expr) {
        self.blocks[self.current].stmts.push(Stmt { target, expr });
    }

    fn terminate(&mut self, transfer: Transfer) {
        self.blocks[self.current].transfer = Some(transfer);
    }

    fn resolve(&self, name: &str) -> Result<String, CompileError> {
        if let Some((_, lowered)) = self.scope.iter().rev().find(|(source, _)| source == name) {
            return Ok(lowered.clone());
        }
        if self.globals.vars.contains(name) {
            return Ok(name.to_string());
        }
        Err(CompileError::Unbound {
            function: self.name.clone(),
            name: name.to_string(),
        })
    }

    fn check_arity(&self, callee: &str, expected: usize, found: usize) -> Result<(), CompileError> {
        if expected != found {
            return Err(CompileError::Arity {
                context: format!("'{}' in function '{}'", callee, self.name),
                expected,
                found,
            });
        }
        Ok(())
    }

    fn values(&mut self, exprs: &[HiExpr]) -> Result<Vec<String>, CompileError> {
        exprs.iter().map(|e| self.value(e)).collect()
    }

    /// What an application of `callee` turns into
    fn classify(&self, callee: &str, argc: usize) -> Result<Callee, CompileError> {
        if self.scope.iter().any(|(source, _)| source == callee) {
            return Err(CompileError::Type(format!(
                "'{}' is a local value in function '{}' and cannot be called",
                callee, self.name
            )));
        }
        if self.config.is_primitive(callee) {
            return Ok(Callee::Inline);
        }
        if let Some(arity) = self.globals.constructors.get(callee) {
            self.check_arity(callee, *arity, argc)?;
            return Ok(Callee::Inline);
        }
        if let Some(arity) = self.globals.functions.get(callee) {
            self.check_arity(callee, *arity, argc)?;
            return Ok(Callee::Function);
        }
        Err(CompileError::Unbound {
            function: self.name.clone(),
            name: callee.to_string(),
        })
    }

    /// Lower `expr` in non-tail position, returning the variable holding it
    fn value(&mut self, expr: &HiExpr) -> Result<String, CompileError> {
        match expr {
            HiExpr::Literal(word) => {
                let tmp = self.fresh_tmp();
                self.emit(tmp.clone(), Expr::Literal(*word));
                Ok(tmp)
            }
            HiExpr::Var(name) => self.resolve(name),
            HiExpr::Apply { callee, args } => {
                let kind = self.classify(callee, args.len())?;
                let args = self.values(args)?;
                let result = self.fresh_tmp();
                match kind {
                    Callee::Inline => {
                        self.emit(
                            result.clone(),
                            Expr::Apply {
                                callee: callee.clone(),
                                args,
                            },
                        );
                    }
                    Callee::Function => {
                        let cont = self.fresh_label();
                        self.terminate(Transfer::Call {
                            cont: Some(cont.clone()),
                            callee: callee.clone(),
                            args,
                        });
                        self.current = self.push_block(cont, vec![result.clone()]);
                    }
                }
                Ok(result)
            }
            HiExpr::Begin(forms) => {
                let mut last = None;
                for form in forms {
                    last = Some(self.value(form)?);
                }
                last.ok_or_else(|| {
                    CompileError::Type(format!("empty begin in function '{}'", self.name))
                })
            }
            HiExpr::Block { bindings, body } => {
                let depth = self.bind_all(bindings)?;
                let result = self.value(body);
                self.scope.truncate(depth);
                result
            }
            HiExpr::Match {
                scrutinee,
                arms,
                otherwise,
                line,
            } => {
                let join = self.fresh_label();
                let result = self.fresh_tmp();
                let targets = self.dispatch(scrutinee, arms, otherwise.is_some(), *line)?;
                for (arm, target) in arms.iter().zip(&targets.arms) {
                    self.current = target.block;
                    let depth = self.bind_pattern(arm, &target.formals);
                    let value = self.value(&arm.body)?;
                    self.scope.truncate(depth);
                    self.terminate(Transfer::Goto {
                        label: join.clone(),
                        args: vec![value],
                    });
                }
                if let (Some(body), Some(block)) = (otherwise, targets.otherwise) {
                    self.current = block;
                    let value = self.value(body)?;
                    self.terminate(Transfer::Goto {
                        label: join.clone(),
                        args: vec![value],
                    });
                }
                self.current = self.push_block(join, vec![result.clone()]);
                Ok(result)
            }
        }
    }

    /// Lower `expr` in tail position, ending the current block
    fn tail(&mut self, expr: &HiExpr) -> Result<(), CompileError> {
        match expr {
            HiExpr::Apply { callee, args }
                if matches!(self.classify(callee, args.len())?, Callee::Function) =>
            {
                let args = self.values(args)?;
                self.terminate(Transfer::Call {
                    cont: None,
                    callee: callee.clone(),
                    args,
                });
                Ok(())
            }
            HiExpr::Begin(forms) => {
                let Some((last, init)) = forms.split_last() else {
                    return Err(CompileError::Type(format!(
                        "empty begin in function '{}'",
                        self.name
                    )));
                };
                for form in init {
                    self.value(form)?;
                }
                self.tail(last)
            }
            HiExpr::Block { bindings, body } => {
                let depth = self.bind_all(bindings)?;
                let result = self.tail(body);
                self.scope.truncate(depth);
                result
            }
            HiExpr::Match {
                scrutinee,
                arms,
                otherwise,
                line,
            } => {
                let targets = self.dispatch(scrutinee, arms, otherwise.is_some(), *line)?;
                for (arm, target) in arms.iter().zip(&targets.arms) {
                    self.current = target.block;
                    let depth = self.bind_pattern(arm, &target.formals);
                    let result = self.tail(&arm.body);
                    self.scope.truncate(depth);
                    result?;
                }
                if let (Some(body), Some(block)) = (otherwise, targets.otherwise) {
                    self.current = block;
                    self.tail(body)?;
                }
                Ok(())
            }
            _ => {
                let value = self.value(expr)?;
                self.terminate(Transfer::Return(value));
                Ok(())
            }
        }
    }

    /// Bind each `(set NAME expr)` to a fresh variable; returns the scope
    /// depth to restore afterwards
    fn bind_all(&mut self, bindings: &[(String, HiExpr)]) -> Result<usize, CompileError> {
        let depth = self.scope.len();
        for (name, expr) in bindings {
            let value = self.value(expr)?;
            let fresh = self.fresh_tmp();
            self.emit(fresh.clone(), Expr::Var(value));
            self.scope.push((name.clone(), fresh));
        }
        Ok(depth)
    }

    fn bind_pattern(&mut self, arm: &Arm, formals: &[String]) -> usize {
        let depth = self.scope.len();
        for (binder, formal) in arm.binders.iter().zip(formals) {
            self.scope.push((binder.clone(), formal.clone()));
        }
        depth
    }

    /// End the current block in a `Match` and create one block per arm
    fn dispatch(
        &mut self,
        scrutinee: &HiExpr,
        arms: &[Arm],
        has_else: bool,
        line: usize,
    ) -> Result<MatchTargets, CompileError> {
        let scrutinee = self.value(scrutinee)?;

        let mut targets = MatchTargets {
            arms: Vec::with_capacity(arms.len()),
            otherwise: None,
        };
        let mut clauses = Vec::with_capacity(arms.len());
        for arm in arms {
            let arity = self
                .globals
                .pattern_arity(&arm.constructor)
                .ok_or_else(|| CompileError::UnknownConstructor(arm.constructor.clone()))?;
            self.check_arity(&arm.constructor, arity, arm.binders.len())?;

            let formals: Vec<String> = (0..arity).map(|_| self.fresh_tmp()).collect();
            let label = self.fresh_label();
            let block = self.push_block(label.clone(), formals.clone());
            clauses.push(Clause {
                constructor: arm.constructor.clone(),
                label,
            });
            targets.arms.push(ArmTarget { block, formals });
        }

        let mut otherwise = None;
        if has_else {
            let label = self.fresh_label();
            targets.otherwise = Some(self.push_block(label.clone(), Vec::new()));
            otherwise = Some(label);
        }

        self.terminate(Transfer::Match {
            scrutinee,
            clauses,
            otherwise,
            line,
        });
        Ok(targets)
    }
}

enum Callee {
    /// Primitive or constructor: an expression inside the current block
    Inline,
    /// User function: a `Call` transfer
    Function,
}

struct ArmTarget {
    block: usize,
    formals: Vec<String>,
}

struct MatchTargets {
    arms: Vec<ArmTarget>,
    otherwise: Option<usize>,
}
