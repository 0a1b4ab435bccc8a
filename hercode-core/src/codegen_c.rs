//! C backend for HerCode.
//!
//! Lowers a parsed [`Program`] into a single C translation unit:
//! forward declarations, `main` for the start block, then one function
//! per definition. User functions are emitted as `hc_<name>` so they can
//! never clash with C keywords, `main` or libc symbols.

use std::collections::HashMap;

use log::debug;

use crate::ast::{FunctionDef, Program, Stmt};
use crate::error::CoreError;

/// Prefix applied to every user function in the generated C.
pub const FUNCTION_PREFIX: &str = "hc_";

/// Name → definition lookup for one generation pass.
///
/// Definitions keep their source order so the output is deterministic.
#[derive(Debug, Default)]
pub struct FunctionTable<'a> {
    order: Vec<&'a FunctionDef>,
    by_name: HashMap<&'a str, usize>,
}

impl<'a> FunctionTable<'a> {
    pub fn build(program: &'a Program) -> Result<Self, CoreError> {
        let mut table = FunctionTable::default();
        for def in program.functions() {
            if table.by_name.contains_key(def.name.as_str()) {
                return Err(CoreError::DuplicateFunction(def.name.clone()));
            }
            table.by_name.insert(def.name.as_str(), table.order.len());
            table.order.push(def);
        }
        Ok(table)
    }

    pub fn get(&self, name: &str) -> Option<&'a FunctionDef> {
        self.by_name.get(name).map(|index| self.order[*index])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a FunctionDef> + '_ {
        self.order.iter().copied()
    }
}

/// Generate C source for `program`.
///
/// `preamble` is foreign C code spliced verbatim at file scope, after the
/// standard include and before the forward declarations. Every call is
/// resolved against the program's definitions before anything is
/// emitted.
pub fn generate_c(program: &Program, preamble: Option<&str>) -> Result<String, CoreError> {
    let table = FunctionTable::build(program)?;
    check_calls(program.entry(), &table)?;
    for def in table.iter() {
        check_calls(def.body.iter(), &table)?;
    }

    let mut out = String::new();
    out.push_str("#include <stdio.h>\n\n");

    if let Some(preamble) = preamble {
        out.push_str(preamble);
        if !preamble.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }

    if !table.is_empty() {
        for def in table.iter() {
            out.push_str(&format!("void {}(void);\n", c_function_name(&def.name)));
        }
        out.push('\n');
    }

    out.push_str("int main(void) {\n");
    for stmt in program.entry() {
        emit_statement(stmt, &mut out);
    }
    out.push_str("    return 0;\n}\n");

    for def in table.iter() {
        out.push_str(&format!("\nvoid {}(void) {{\n", c_function_name(&def.name)));
        for stmt in &def.body {
            emit_statement(stmt, &mut out);
        }
        out.push_str("}\n");
    }

    debug!(
        "[codegen] emitted {} bytes of C for {} function(s)",
        out.len(),
        table.len()
    );
    Ok(out)
}

fn check_calls<'s>(
    statements: impl Iterator<Item = &'s Stmt>,
    table: &FunctionTable<'_>,
) -> Result<(), CoreError> {
    for stmt in statements {
        if let Stmt::Call(name) = stmt {
            if table.get(name).is_none() {
                return Err(CoreError::UndefinedFunction(name.clone()));
            }
        }
    }
    Ok(())
}

fn emit_statement(stmt: &Stmt, out: &mut String) {
    match stmt {
        Stmt::Say(text) => {
            out.push_str(&format!(
                "    printf(\"%s\\n\", \"{}\");\n",
                escape_c_string(text)
            ));
        }
        Stmt::Call(name) => {
            out.push_str(&format!("    {}();\n", c_function_name(name)));
        }
        // Emitted separately after `main`.
        Stmt::FunctionDef(_) => {}
    }
}

pub fn c_function_name(name: &str) -> String {
    format!("{FUNCTION_PREFIX}{name}")
}

/// Escape text for use inside a C string literal.
pub fn escape_c_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            // Three octal digits, so a following digit is never absorbed.
            _ if ch.is_ascii_control() => escaped.push_str(&format!("\\{:03o}", ch as u32)),
            _ => escaped.push(ch),
        }
    }
    escaped
}
