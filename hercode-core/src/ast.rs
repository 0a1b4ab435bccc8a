/// A HerCode statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `say "text"`; the text is kept exactly as written between the quotes.
    Say(String),
    FunctionDef(FunctionDef),
    /// A bare identifier calls the function of that name.
    Call(String),
}

/// `function name:` ... `end`. The body only holds `Say` and `Call`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub body: Vec<Stmt>,
}

/// Top-level statements in source order: function definitions first,
/// then the statements of the `start` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.statements.iter().filter_map(|stmt| match stmt {
            Stmt::FunctionDef(def) => Some(def),
            _ => None,
        })
    }

    /// Statements that run from the entry point.
    pub fn entry(&self) -> impl Iterator<Item = &Stmt> {
        self.statements
            .iter()
            .filter(|stmt| !matches!(stmt, Stmt::FunctionDef(_)))
    }
}
