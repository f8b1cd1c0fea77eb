use std::collections::HashSet;

use log::{debug, trace};

use crate::compiler::CompilerError;

use super::{
    instruction::{ArithOp, Cmp, Condition, Op, Opcode, Operand, Segment, Statement, Template},
    ParseError,
};

pub type ParseResult<T> = Result<T, CompilerError<ParseError>>;

/// A primitive program: the ordered list of statements shared by the spatial
/// backend and the emulator.  Blank lines and comments do not survive
/// parsing, so both backends see exactly the same sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    statements: Vec<Statement>,
}

impl Program {
    /// Parse primitive source text.  Parsing stops at the first error, which
    /// carries the 1-based line number it was found on.
    pub fn parse(text: &str) -> ParseResult<Program> {
        debug!("Parse primitive program");
        let mut statements: Vec<Statement> = vec![];
        let mut declared = HashSet::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx as u32 + 1;
            let stmt = parse_line(raw, line, statements.last())
                .map_err(|e| CompilerError::new(line, e))?;

            if let Some(stmt) = stmt {
                if let Some(op) = stmt.op() {
                    check_declared(op, &mut declared).map_err(|e| CompilerError::new(line, e))?;
                }
                trace!("L{}: {}", line, stmt);
                statements.push(stmt);
            }
        }

        validate_structure(&statements)?;
        debug!("Parsed {} statements", statements.len());
        Ok(Program { statements })
    }

    /// Builds a program without structural validation.
    pub(crate) fn from_statements(statements: Vec<Statement>) -> Program {
        Program { statements }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn get(&self, idx: usize) -> Option<&Statement> {
        self.statements.get(idx)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Every register index referenced anywhere in the program.
    pub fn registers(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.statements.iter().flat_map(|s| {
            let line = s.line;
            s.op()
                .map(slot_refs)
                .unwrap_or_default()
                .into_iter()
                .filter_map(move |o| match o {
                    Operand::Register(r) => Some((*r, line)),
                    _ => None,
                })
        })
    }
}

/// Checks that the statement at `at` (an IF) is followed by ELSE then CLR.
pub fn if_structure(statements: &[Statement], at: usize) -> Result<(), ParseError> {
    let opcode_at = |i: usize| statements.get(i).and_then(|s| s.opcode());
    if opcode_at(at + 1) != Some(Opcode::Else) {
        return Err(ParseError::MissingElse);
    }
    if opcode_at(at + 2) != Some(Opcode::Clr) {
        return Err(ParseError::MissingClr);
    }
    Ok(())
}

fn validate_structure(statements: &[Statement]) -> ParseResult<()> {
    for (i, s) in statements.iter().enumerate() {
        match s.opcode() {
            Some(Opcode::If) => {
                if_structure(statements, i).map_err(|e| CompilerError::new(s.line, e))?
            }
            Some(Opcode::Slf) => {
                if statements.get(i + 1).and_then(|s| s.opcode()) != Some(Opcode::Call) {
                    return Err(CompilerError::new(s.line, ParseError::SlfWithoutCall));
                }
            }
            _ => (),
        }
    }
    Ok(())
}

fn check_declared(op: &Op, declared: &mut HashSet<String>) -> Result<(), ParseError> {
    if let Op::Var(name) = op {
        declared.insert(name.clone());
        return Ok(());
    }

    for o in slot_refs(op) {
        if let Operand::Variable(v) = o {
            if !declared.contains(v) {
                return Err(ParseError::UndeclaredVariable(v.clone()));
            }
        }
    }
    Ok(())
}

/// Storage operands read or written by an instruction.
fn slot_refs(op: &Op) -> Vec<&Operand> {
    match op {
        Op::Arith(_, d, s) => vec![d, s],
        Op::Show(o) => vec![o],
        Op::Say(t) => t.values().collect(),
        Op::If(c) | Op::Else(c) => vec![&c.lhs, &c.rhs],
        _ => vec![],
    }
}

/// Parses a single line.  Returns `None` for blank and comment lines.
pub fn parse_line(
    raw: &str,
    line: u32,
    prev: Option<&Statement>,
) -> Result<Option<Statement>, ParseError> {
    let text = strip_comment(raw).trim();
    if text.is_empty() {
        return Ok(None);
    }

    if let Some(name) = text.strip_prefix(':') {
        let name = name.trim();
        if !is_identifier(name) {
            return Err(ParseError::InvalidLabel(text.into()));
        }
        return Ok(Some(Statement::label(name, line)));
    }

    let (mnemonic, rest) = match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim()),
        None => (text, ""),
    };
    let opcode =
        Opcode::from_mnemonic(mnemonic).ok_or_else(|| ParseError::UnknownOpcode(mnemonic.into()))?;
    let op = parse_op(opcode, rest, prev)?;
    Ok(Some(Statement::instr(op, line)))
}

fn parse_op(opcode: Opcode, rest: &str, prev: Option<&Statement>) -> Result<Op, ParseError> {
    use Opcode::*;

    let ops: Vec<&str> = rest
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    let expect = |n: usize| {
        if ops.len() == n {
            Ok(())
        } else {
            Err(ParseError::OperandCount {
                opcode,
                expected: n,
                found: ops.len(),
            })
        }
    };

    let op = match opcode {
        Add | Sub | Mul | Div | Set => {
            expect(2)?;
            let arith = match opcode {
                Add => ArithOp::Add,
                Sub => ArithOp::Sub,
                Mul => ArithOp::Mul,
                Div => ArithOp::Div,
                _ => ArithOp::Set,
            };
            let dest = slot(ops[0])?;
            let src = value(ops[1])?;
            if src.is_immediate() && !arith.accepts_immediate() {
                return Err(ParseError::ImmediateNotAllowed(opcode));
            }
            Op::Arith(arith, dest, src)
        }
        Show => {
            expect(1)?;
            Op::Show(slot(ops[0])?)
        }
        Tag => {
            expect(1)?;
            Op::Tag(label(ops[0])?)
        }
        Goto => {
            expect(1)?;
            Op::Goto(label(ops[0])?)
        }
        Var => {
            expect(1)?;
            match slot(ops[0])? {
                Operand::Variable(name) => Op::Var(name),
                _ => return Err(ParseError::InvalidOperand(ops[0].into())),
            }
        }
        If => Op::If(parse_condition(&ops)?),
        Else => {
            expect(0)?;
            match prev.and_then(|s| s.op()) {
                Some(Op::If(c)) => Op::Else(c.clone()),
                _ => return Err(ParseError::ElseWithoutIf),
            }
        }
        Clr => {
            expect(0)?;
            Op::Clr
        }
        Slf => {
            expect(0)?;
            Op::Slf
        }
        Call => {
            expect(0)?;
            Op::Call
        }
        Ret => {
            expect(0)?;
            Op::Ret
        }
        Say => Op::Say(parse_template(rest)?),
    };
    Ok(op)
}

fn parse_condition(ops: &[&str]) -> Result<Condition, ParseError> {
    if ops.len() != 5 {
        return Err(ParseError::OperandCount {
            opcode: Opcode::If,
            expected: 5,
            found: ops.len(),
        });
    }

    let lhs = slot(ops[0])?;
    let cmp = Cmp::parse(ops[1]).ok_or_else(|| ParseError::InvalidComparison(ops[1].into()))?;
    let rhs = value(ops[2])?;
    if ops[3] != "GOTO" {
        return Err(ParseError::ExpectedGoto(ops[3].into()));
    }
    let target = label(ops[4])?;

    Ok(Condition {
        lhs,
        cmp,
        rhs,
        target,
    })
}

fn parse_template(rest: &str) -> Result<Template, ParseError> {
    let malformed = || ParseError::MalformedTemplate(rest.into());
    if rest.len() < 2 || !rest.starts_with('"') || !rest.ends_with('"') {
        return Err(malformed());
    }

    let inner = &rest[1..rest.len() - 1];
    let mut segments = vec![];
    let mut text = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(malformed());
                }
                let value = slot(name.trim()).map_err(|_| malformed())?;
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Value(value));
            }
            '}' => return Err(malformed()),
            c => text.push(c),
        }
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }

    Ok(Template::new(segments))
}

/// A register or variable reference.
fn slot(tok: &str) -> Result<Operand, ParseError> {
    if let Some(digits) = tok.strip_prefix('R') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return digits
                .parse()
                .map(Operand::Register)
                .map_err(|_| ParseError::InvalidOperand(tok.into()));
        }
    }

    if is_identifier(tok) {
        Ok(Operand::Variable(tok.into()))
    } else {
        Err(ParseError::InvalidOperand(tok.into()))
    }
}

/// A register, variable or `#` immediate.
fn value(tok: &str) -> Result<Operand, ParseError> {
    match tok.strip_prefix('#') {
        Some(imm) => imm
            .parse()
            .map(Operand::Immediate)
            .map_err(|_| ParseError::InvalidOperand(tok.into())),
        None => slot(tok),
    }
}

/// A label reference, with or without its leading sigil.
fn label(tok: &str) -> Result<String, ParseError> {
    let name = tok.strip_prefix(':').unwrap_or(tok);
    if is_identifier(name) {
        Ok(name.into())
    } else {
        Err(ParseError::InvalidLabel(tok.into()))
    }
}

/// Names of labels, variables and modules: a letter or `_`, then letters,
/// digits, `_`, and `.` as a namespace separator.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => (),
        _ => return false,
    }
    !s.ends_with('.')
        && !s.contains("..")
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Removes a trailing `--` comment that is not inside a quoted string.
pub fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let mut prev_space = true;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '-' if !in_quotes && prev_space && line[i..].starts_with("--") => return &line[..i],
            _ => (),
        }
        prev_space = c.is_whitespace();
    }
    line
}
