use std::path::Path;

use log::debug;

use crate::codegen_c::generate_c;
use crate::error::CoreError;
use crate::lexer::{Token, line_of, tokenize};
use crate::parser::parse;
use crate::preamble::{hercode_line_offset, split_preamble};
use crate::toolchain::Toolchain;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationArtifact {
    pub c_source: String,
    /// Names of the defined functions, in definition order.
    pub functions: Vec<String>,
    pub has_preamble: bool,
}

/// Compile a HerCode file (optionally headed by a C preamble) into C.
pub fn compile_to_c(source: &str) -> Result<CompilationArtifact, CoreError> {
    let (preamble, hercode) = split_preamble(source);
    let first_line = hercode_line_offset(source, hercode);
    let program = parse(hercode).map_err(|err| match err {
        CoreError::Syntax {
            line,
            expected,
            found,
        } => CoreError::Syntax {
            line: line + first_line,
            expected,
            found,
        },
        other => other,
    })?;
    let c_source = generate_c(&program, preamble)?;
    let functions = program.functions().map(|def| def.name.clone()).collect();
    debug!("compiled {} bytes of HerCode to C", hercode.len());

    Ok(CompilationArtifact {
        c_source,
        functions,
        has_preamble: preamble.is_some(),
    })
}

/// Compile all the way to an executable at `output`.
pub fn compile_executable(
    source: &str,
    output: impl AsRef<Path>,
    toolchain: &Toolchain,
) -> Result<CompilationArtifact, CoreError> {
    let artifact = compile_to_c(source)?;
    toolchain.build(&artifact.c_source, output)?;
    Ok(artifact)
}

/// Token listing of the HerCode part of `source`, one token per line.
pub fn dump_tokens(source: &str) -> String {
    let (_, hercode) = split_preamble(source);
    let first_line = hercode_line_offset(source, hercode);
    tokenize(hercode)
        .iter()
        .map(|token| render_token(line_of(hercode, token.offset) + first_line, token))
        .collect()
}

fn render_token(line: usize, token: &Token) -> String {
    let kind = format!("{:?}", token.kind);
    match &token.text {
        Some(text) => format!("{line:>4} {kind:<20} {text:?}\n"),
        None => format!("{line:>4} {kind}\n"),
    }
}
