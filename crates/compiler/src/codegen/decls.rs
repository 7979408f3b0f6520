//! Passes 1 and 2: class tags and forward declarations

use super::{CodeGen, class_ident, typed_params};
use crate::error::CompileError;
use crate::ir::{Definition, Program};
use fi_core::MAX_ARITY;
use std::fmt::Write as _;
use tracing::debug;

impl CodeGen<'_> {
    /// Number user classes from `USER_CLASS_MIN` in definition order
    pub(super) fn emit_class_decls(&mut self, program: &Program) -> Result<(), CompileError> {
        let mut names = Vec::new();
        for definition in &program.definitions {
            let Definition::Cons(cons) = definition else {
                continue;
            };
            let arity = cons.fields.len();
            if arity > MAX_ARITY as usize {
                return Err(CompileError::Arity {
                    context: format!("constructor '{}'", cons.name),
                    expected: MAX_ARITY as usize,
                    found: arity,
                });
            }
            let tag = self.classes.declare_user_class(arity as u8)?;
            debug!(constructor = %cons.name, tag, arity, "declared class");
            self.constructors.insert(cons.name.clone(), tag);
            names.push(class_ident(&cons.name));
        }

        if names.is_empty() {
            return Ok(());
        }
        writeln!(&mut self.output)?;
        writeln!(&mut self.output, "enum {{")?;
        for (i, name) in names.iter().enumerate() {
            if i == 0 {
                writeln!(&mut self.output, "    {} = USER_CLASS_MIN,", name)?;
            } else {
                writeln!(&mut self.output, "    {},", name)?;
            }
        }
        writeln!(&mut self.output, "}};")?;
        Ok(())
    }

    pub(super) fn emit_forward_decls(&mut self, program: &Program) -> Result<(), CompileError> {
        if program.definitions.is_empty() {
            return Ok(());
        }
        writeln!(&mut self.output)?;
        for definition in &program.definitions {
            match definition {
                Definition::Var { name, .. } => writeln!(&mut self.output, "long {};", name)?,
                Definition::Func(func) => writeln!(
                    &mut self.output,
                    "long {}({});",
                    func.name,
                    typed_params(&func.params)
                )?,
                Definition::Cons(cons) => writeln!(
                    &mut self.output,
                    "long {}({});",
                    cons.name,
                    typed_params(&cons.fields)
                )?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::tests::generate;
    use crate::error::CompileError;

    #[test]
    fn test_class_enum_in_definition_order() {
        let (code, _) = generate("(define (Pair a b)) (define x 0) (define (Leaf))").unwrap();
        assert!(code.contains("enum {\n    CLASS_Pair = USER_CLASS_MIN,\n    CLASS_Leaf,\n};\n"));
    }

    #[test]
    fn test_no_enum_without_constructors() {
        let (code, _) = generate("(define x 0)").unwrap();
        assert!(!code.contains("enum"));
    }

    #[test]
    fn test_forward_declarations() {
        let (code, _) = generate(
            "(define count 0)
             (define (Leaf))
             (define (swap p q) (block b () (return p)))",
        )
        .unwrap();
        assert!(code.contains("\nlong count;\nlong Leaf(void);\nlong swap(long p, long q);\n"));
    }

    #[test]
    fn test_constructor_arity_limit() {
        assert!(matches!(
            generate("(define (Big a b c d e))"),
            Err(CompileError::Arity {
                expected: 4,
                found: 5,
                ..
            })
        ));
    }
}
