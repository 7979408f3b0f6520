//! Passes 4 and 5: constructor bodies and the initialization routine

use super::{CodeGen, class_ident, typed_params};
use crate::error::CompileError;
use crate::ir::{Definition, Program};
use std::fmt::Write as _;

impl CodeGen<'_> {
    pub(super) fn emit_constructors(&mut self, program: &Program) -> Result<(), CompileError> {
        for definition in &program.definitions {
            let Definition::Cons(cons) = definition else {
                continue;
            };
            let class = class_ident(&cons.name);
            let arity = cons.fields.len();
            let mut args = vec![class.clone()];
            args.extend(cons.fields.iter().cloned());

            writeln!(&mut self.output)?;
            writeln!(
                &mut self.output,
                "long {}({})",
                cons.name,
                typed_params(&cons.fields)
            )?;
            writeln!(&mut self.output, "{{")?;
            writeln!(
                &mut self.output,
                "    return fi_make_tuple{}({});",
                arity,
                args.join(", ")
            )?;
            writeln!(&mut self.output, "}}")?;

            // Pass 1 already rejected arities above MAX_ARITY
            self.registrations.push((class, arity as u8));
        }
        Ok(())
    }

    /// Registers constructor arities in tag order, then assigns globals
    pub(super) fn emit_init(&mut self, program: &Program) -> Result<(), CompileError> {
        let mut body = String::new();
        for (class, arity) in &self.registrations {
            writeln!(&mut body, "    fi_register_arity({}, {});", class, arity)?;
        }
        for definition in &program.definitions {
            if let Definition::Var { name, value } = definition {
                let value = self.render_literal(*value)?;
                writeln!(&mut body, "    {} = {};", name, value)?;
            }
        }

        writeln!(&mut self.output)?;
        writeln!(&mut self.output, "void {}(void)", self.config.init_symbol)?;
        writeln!(&mut self.output, "{{")?;
        self.output.push_str(&body);
        writeln!(&mut self.output, "}}")?;
        Ok(())
    }
}
