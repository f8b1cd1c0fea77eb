use std::fmt::{Display, Formatter, Result as FmtResult};

/// The closed set of primitive opcodes understood by every backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Div,
    Set,
    Show,
    Say,
    Clr,
    Tag,
    Slf,
    Call,
    Ret,
    Goto,
    If,
    Else,
    Var,
}

impl Opcode {
    pub fn from_mnemonic(s: &str) -> Option<Opcode> {
        use Opcode::*;
        let op = match s {
            "ADD" => Add,
            "SUB" => Sub,
            "MUL" => Mul,
            "DIV" => Div,
            "SET" => Set,
            "SHOW" => Show,
            "SAY" => Say,
            "CLR" => Clr,
            "TAG" => Tag,
            "SLF" => Slf,
            "CALL" => Call,
            "RET" => Ret,
            "GOTO" => Goto,
            "IF" => If,
            "ELSE" => Else,
            "VAR" => Var,
            _ => return None,
        };
        Some(op)
    }

    pub fn mnemonic(&self) -> &'static str {
        use Opcode::*;
        match self {
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Set => "SET",
            Show => "SHOW",
            Say => "SAY",
            Clr => "CLR",
            Tag => "TAG",
            Slf => "SLF",
            Call => "CALL",
            Ret => "RET",
            Goto => "GOTO",
            If => "IF",
            Else => "ELSE",
            Var => "VAR",
        }
    }

    /// Opcodes which unconditionally hand control to another cell.  The
    /// statement that follows one of these can only be reached by a jump.
    pub fn is_branch(&self) -> bool {
        matches!(self, Opcode::Goto | Opcode::Call | Opcode::Ret | Opcode::Else)
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.mnemonic())
    }
}

/// An operand of an instruction.  The kind is decided once, by the parser,
/// and every backend dispatches on it rather than on the spelling of a name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    Register(u32),
    Variable(String),
    Immediate(i32),
    Label(String),
}

impl Operand {
    /// The name of the storage slot this operand refers to, if it refers to
    /// one.  Registers and variables share a single namespace on the grid.
    pub fn slot_name(&self) -> Option<String> {
        match self {
            Operand::Register(r) => Some(format!("R{}", r)),
            Operand::Variable(v) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self, Operand::Immediate(_))
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Operand::Register(r) => write!(f, "R{}", r),
            Operand::Variable(v) => f.write_str(v),
            Operand::Immediate(i) => write!(f, "#{}", i),
            Operand::Label(l) => write!(f, ":{}", l),
        }
    }
}

/// Two operand arithmetic operations.  All of them are destructive: the
/// destination is also the left hand side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Set,
}

impl ArithOp {
    pub fn opcode(&self) -> Opcode {
        match self {
            ArithOp::Add => Opcode::Add,
            ArithOp::Sub => Opcode::Sub,
            ArithOp::Mul => Opcode::Mul,
            ArithOp::Div => Opcode::Div,
            ArithOp::Set => Opcode::Set,
        }
    }

    /// MUL and DIV only operate between two storage slots.
    pub fn accepts_immediate(&self) -> bool {
        !matches!(self, ArithOp::Mul | ArithOp::Div)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cmp {
    Gt,
    Lt,
    Eq,
    Ne,
    Le,
    Ge,
}

impl Cmp {
    pub fn parse(s: &str) -> Option<Cmp> {
        let cmp = match s {
            ">" => Cmp::Gt,
            "<" => Cmp::Lt,
            "=" => Cmp::Eq,
            "!=" => Cmp::Ne,
            "<=" => Cmp::Le,
            ">=" => Cmp::Ge,
            _ => return None,
        };
        Some(cmp)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Cmp::Gt => ">",
            Cmp::Lt => "<",
            Cmp::Eq => "=",
            Cmp::Ne => "!=",
            Cmp::Le => "<=",
            Cmp::Ge => ">=",
        }
    }

    /// The comparison which holds exactly when this one does not.
    pub fn negate(&self) -> Cmp {
        match self {
            Cmp::Gt => Cmp::Le,
            Cmp::Lt => Cmp::Ge,
            Cmp::Eq => Cmp::Ne,
            Cmp::Ne => Cmp::Eq,
            Cmp::Le => Cmp::Gt,
            Cmp::Ge => Cmp::Lt,
        }
    }

    pub fn holds(&self, a: i32, b: i32) -> bool {
        match self {
            Cmp::Gt => a > b,
            Cmp::Lt => a < b,
            Cmp::Eq => a == b,
            Cmp::Ne => a != b,
            Cmp::Le => a <= b,
            Cmp::Ge => a >= b,
        }
    }
}

impl Display for Cmp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.symbol())
    }
}

/// `lhs cmp rhs GOTO target`.  `lhs` is always a storage slot; `rhs` may
/// also be an immediate.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub lhs: Operand,
    pub cmp: Cmp,
    pub rhs: Operand,
    pub target: String,
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} {} {} GOTO :{}",
            self.lhs, self.cmp, self.rhs, self.target
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    Text(String),
    Value(Operand),
}

/// The text of a SAY instruction.  Values are referenced by name between
/// braces and are looked up by the executing backend, never at compile time.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn new(segments: Vec<Segment>) -> Template {
        Template { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn values(&self) -> impl Iterator<Item = &Operand> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Value(v) => Some(v),
            Segment::Text(_) => None,
        })
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("\"")?;
        for s in &self.segments {
            match s {
                Segment::Text(t) => f.write_str(t)?,
                Segment::Value(v) => write!(f, "{{{}}}", v)?,
            }
        }
        f.write_str("\"")
    }
}

/// A parsed primitive instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Arith(ArithOp, Operand, Operand),
    Show(Operand),
    Say(Template),
    Clr,
    Tag(String),
    Slf,
    Call,
    Ret,
    Goto(String),
    If(Condition),
    /// Carries a copy of the condition of the IF it follows.
    Else(Condition),
    Var(String),
}

impl Op {
    pub fn opcode(&self) -> Opcode {
        match self {
            Op::Arith(op, ..) => op.opcode(),
            Op::Show(_) => Opcode::Show,
            Op::Say(_) => Opcode::Say,
            Op::Clr => Opcode::Clr,
            Op::Tag(_) => Opcode::Tag,
            Op::Slf => Opcode::Slf,
            Op::Call => Opcode::Call,
            Op::Ret => Opcode::Ret,
            Op::Goto(_) => Opcode::Goto,
            Op::If(_) => Opcode::If,
            Op::Else(_) => Opcode::Else,
            Op::Var(_) => Opcode::Var,
        }
    }

    /// The label this instruction refers to, if any.  ELSE is excluded: its
    /// target is the cell after it, not its IF's label.
    pub fn label_ref(&self) -> Option<&str> {
        match self {
            Op::Tag(l) | Op::Goto(l) => Some(l),
            Op::If(c) => Some(&c.target),
            _ => None,
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Op::Arith(op, d, s) => write!(f, "{} {} {}", op.opcode(), d, s),
            Op::Show(o) => write!(f, "SHOW {}", o),
            Op::Say(t) => write!(f, "SAY {}", t),
            Op::Tag(l) => write!(f, "TAG :{}", l),
            Op::Goto(l) => write!(f, "GOTO :{}", l),
            Op::If(c) => write!(f, "IF {}", c),
            Op::Var(v) => write!(f, "VAR {}", v),
            Op::Clr | Op::Slf | Op::Call | Op::Ret | Op::Else(_) => {
                f.write_str(self.opcode().mnemonic())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatementKind {
    Label(String),
    Instr(Op),
}

/// One label declaration or instruction.  Every statement occupies exactly
/// one cell of the grid and one slot of the emulator's program counter.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: u32,
}

impl Statement {
    pub fn label(name: &str, line: u32) -> Statement {
        Statement {
            kind: StatementKind::Label(name.into()),
            line,
        }
    }

    pub fn instr(op: Op, line: u32) -> Statement {
        Statement {
            kind: StatementKind::Instr(op),
            line,
        }
    }

    /// The name declared, if this is a label.
    pub fn label_name(&self) -> Option<&str> {
        match &self.kind {
            StatementKind::Label(l) => Some(l),
            StatementKind::Instr(_) => None,
        }
    }

    pub fn op(&self) -> Option<&Op> {
        match &self.kind {
            StatementKind::Instr(op) => Some(op),
            StatementKind::Label(_) => None,
        }
    }

    pub fn opcode(&self) -> Option<Opcode> {
        self.op().map(|op| op.opcode())
    }

    /// True if control can never fall through from this statement into the
    /// next one.
    pub fn is_branch(&self) -> bool {
        self.opcode().map_or(false, |o| o.is_branch())
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            StatementKind::Label(l) => write!(f, ":{}", l),
            StatementKind::Instr(op) => write!(f, "{}", op),
        }
    }
}
