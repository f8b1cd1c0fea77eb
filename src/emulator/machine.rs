use std::{collections::HashMap, time::Duration};

use log::{debug, trace};

use crate::compiler::{
    isa::{
        if_structure, ArithOp, Condition, Op, Operand, Program, Segment, Statement, Template,
        CALL_RETURN_STEPS,
    },
    resolver::{index_labels, LabelTable},
    CompilerError,
};

use super::{EmulatorError, Sink};

pub type EmulatorResult<T> = Result<T, CompilerError<EmulatorError>>;

/// Runs a [`Program`] one statement at a time.  Statement indices play the
/// role that grid coordinates play for the spatial backend.
#[derive(Debug)]
pub struct Emulator<'p> {
    program: &'p Program,
    labels: LabelTable<usize>,
    registers: Vec<i32>,
    variables: HashMap<String, Option<i32>>,
    stack: Vec<usize>,
    pending: Option<usize>,
    pc: usize,

    /// Set when `pc` was reached by a jump rather than by running on from
    /// the previous statement.
    jumped: bool,
    halted: bool,
    tick: Duration,
    stack_depth: Option<usize>,
    steps: u64,
}

impl<'p> Emulator<'p> {
    /// Prepare `program` to run with `registers` zeroed registers.  Every
    /// label error and every out of range register is reported at once.
    pub fn new(
        program: &'p Program,
        registers: usize,
    ) -> Result<Emulator<'p>, Vec<CompilerError<EmulatorError>>> {
        let labels = index_labels(program).map_err(|errs| {
            errs.into_iter()
                .map(|e| e.map(EmulatorError::Label))
                .collect::<Vec<_>>()
        })?;

        let out_of_range: Vec<_> = program
            .registers()
            .filter(|(r, _)| *r as usize >= registers)
            .map(|(index, line)| {
                CompilerError::new(
                    line,
                    EmulatorError::RegisterOutOfRange {
                        index,
                        count: registers,
                    },
                )
            })
            .collect();
        if !out_of_range.is_empty() {
            return Err(out_of_range);
        }

        Ok(Emulator {
            program,
            labels,
            registers: vec![0; registers],
            variables: HashMap::new(),
            stack: vec![],
            pending: None,
            pc: 0,
            jumped: false,
            halted: false,
            tick: Duration::from_millis(0),
            stack_depth: None,
            steps: 0,
        })
    }

    /// Pause for `tick` per substrate tick: one for GOTO, CALL and RET and
    /// two for IF.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Fail when more than `depth` calls are in progress, as the grid would.
    pub fn with_stack_depth(mut self, depth: usize) -> Self {
        self.stack_depth = Some(depth);
        self
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn registers(&self) -> &[i32] {
        &self.registers
    }

    pub fn register(&self, idx: usize) -> Option<i32> {
        self.registers.get(idx).copied()
    }

    /// `None` if the variable was never declared, `Some(None)` if it is
    /// declared but not assigned yet.
    pub fn variable(&self, name: &str) -> Option<Option<i32>> {
        self.variables.get(name).copied()
    }

    pub fn stack(&self) -> &[usize] {
        &self.stack
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// True at the end of the program, or after running on into a label.
    pub fn is_halted(&self) -> bool {
        self.halted || self.pc >= self.program.len()
    }

    /// Run until the end of the program or the first error.
    pub fn run(&mut self, sink: &mut dyn Sink) -> EmulatorResult<()> {
        debug!("Run {} statements", self.program.len());
        while !self.is_halted() {
            self.step(sink)?;
        }
        debug!("Halted after {} steps", self.steps);
        Ok(())
    }

    /// Execute the statement at the program counter.  On error nothing is
    /// changed, so the failing statement can be inspected.
    pub fn step(&mut self, sink: &mut dyn Sink) -> EmulatorResult<()> {
        if self.halted {
            return Ok(());
        }
        let program = self.program;
        match program.get(self.pc) {
            Some(stmt) => self
                .execute(stmt, sink)
                .map_err(|e| CompilerError::new(stmt.line, e)),
            None => Ok(()),
        }
    }

    fn execute(&mut self, stmt: &Statement, sink: &mut dyn Sink) -> Result<(), EmulatorError> {
        let op = match stmt.op() {
            Some(op) => op,
            None => {
                // A label only runs when triggered by a jump; running on
                // into it ends the path, as an origin cell would.
                if !self.jumped {
                    debug!(
                        "L{}: stopped at :{}, entered by falling through",
                        stmt.line,
                        stmt.label_name().unwrap_or_default()
                    );
                    self.halted = true;
                    return Ok(());
                }
                self.steps += 1;
                self.pc += 1;
                self.jumped = false;
                return Ok(());
            }
        };
        trace!("{:>4}: {}", self.pc, op);

        let mut next = self.pc + 1;
        let mut jumped = false;
        match op {
            Op::Arith(a, dest, src) => {
                let value = self.arith(*a, dest, src)?;
                self.write(dest, value)?;
            }
            Op::Show(o) => self.emit(sink, &self.read(o)?.to_string())?,
            Op::Say(t) => self.emit(sink, &self.render(t)?)?,
            Op::Clr => (),
            Op::Var(name) => {
                self.variables.entry(name.clone()).or_insert(None);
            }
            Op::Tag(label) => self.pending = Some(self.resolve(label)?),
            Op::Slf => {
                if let Some(depth) = self.stack_depth {
                    if self.stack.len() >= depth {
                        return Err(EmulatorError::StackOverflow(depth));
                    }
                }
                self.stack.push(self.pc + CALL_RETURN_STEPS);
            }
            Op::Call => {
                next = self.pending.take().ok_or(EmulatorError::NoPendingCall)?;
                jumped = true;
                self.wait(1);
            }
            Op::Ret => {
                next = self.stack.pop().ok_or(EmulatorError::EmptyStack)?;
                jumped = true;
                self.wait(1);
            }
            Op::Goto(label) => {
                next = self.resolve(label)?;
                jumped = true;
                self.wait(1);
            }
            Op::If(cond) => {
                if_structure(self.program.statements(), self.pc)
                    .map_err(EmulatorError::Malformed)?;
                if self.holds(cond)? {
                    next = self.resolve(&cond.target)?;
                    jumped = true;
                }
                self.wait(2);
            }
            Op::Else(cond) => {
                // Only the complement of the IF passes control on to the
                // CLR; otherwise this path ends here.
                if self.holds(cond)? {
                    self.halted = true;
                }
            }
        }

        self.steps += 1;
        self.jumped = jumped;
        if !self.halted {
            self.pc = next;
        }
        Ok(())
    }

    fn emit(&self, sink: &mut dyn Sink, line: &str) -> Result<(), EmulatorError> {
        sink.emit(line)
            .map_err(|e| EmulatorError::Output(e.to_string()))
    }

    fn wait(&self, ticks: u32) {
        if self.tick > Duration::from_millis(0) {
            std::thread::sleep(self.tick * ticks);
        }
    }

    fn resolve(&self, label: &str) -> Result<usize, EmulatorError> {
        self.labels
            .resolve(label)
            .copied()
            .map_err(EmulatorError::Label)
    }

    fn holds(&self, cond: &Condition) -> Result<bool, EmulatorError> {
        Ok(cond.cmp.holds(self.read(&cond.lhs)?, self.read(&cond.rhs)?))
    }

    fn arith(&self, op: ArithOp, dest: &Operand, src: &Operand) -> Result<i32, EmulatorError> {
        let rhs = self.read(src)?;
        if op == ArithOp::Set {
            return Ok(rhs);
        }

        let lhs = self.read(dest)?;
        let value = match op {
            ArithOp::Add => lhs.wrapping_add(rhs),
            ArithOp::Sub => lhs.wrapping_sub(rhs),
            ArithOp::Mul => lhs.wrapping_mul(rhs),
            ArithOp::Div => floor_div(lhs, rhs)?,
            ArithOp::Set => rhs,
        };
        Ok(value)
    }

    fn read(&self, operand: &Operand) -> Result<i32, EmulatorError> {
        match operand {
            Operand::Register(r) => self.register(*r as usize).ok_or(
                EmulatorError::RegisterOutOfRange {
                    index: *r,
                    count: self.registers.len(),
                },
            ),
            Operand::Variable(v) => match self.variables.get(v) {
                Some(Some(value)) => Ok(*value),
                Some(None) => Err(EmulatorError::Unassigned(v.clone())),
                None => Err(EmulatorError::UndeclaredVariable(v.clone())),
            },
            Operand::Immediate(i) => Ok(*i),
            Operand::Label(_) => Err(EmulatorError::ExpectedValue(operand.clone())),
        }
    }

    fn write(&mut self, dest: &Operand, value: i32) -> Result<(), EmulatorError> {
        let count = self.registers.len();
        match dest {
            Operand::Register(r) => match self.registers.get_mut(*r as usize) {
                Some(slot) => *slot = value,
                None => {
                    return Err(EmulatorError::RegisterOutOfRange { index: *r, count });
                }
            },
            Operand::Variable(v) => match self.variables.get_mut(v) {
                Some(slot) => *slot = Some(value),
                None => return Err(EmulatorError::UndeclaredVariable(v.clone())),
            },
            _ => return Err(EmulatorError::ExpectedValue(dest.clone())),
        }
        Ok(())
    }

    /// SAY text with every reference replaced by its current value.  An
    /// unassigned variable shows as nothing.
    fn render(&self, template: &Template) -> Result<String, EmulatorError> {
        let mut out = String::new();
        for s in template.segments() {
            match s {
                Segment::Text(t) => out.push_str(t),
                Segment::Value(Operand::Variable(v)) => match self.variables.get(v) {
                    Some(Some(value)) => out.push_str(&value.to_string()),
                    Some(None) => (),
                    None => return Err(EmulatorError::UndeclaredVariable(v.clone())),
                },
                Segment::Value(o) => out.push_str(&self.read(o)?.to_string()),
            }
        }
        Ok(out)
    }
}

/// Integer division rounding toward negative infinity, as the substrate
/// does.  Overflow wraps.
pub fn floor_div(a: i32, b: i32) -> Result<i32, EmulatorError> {
    if b == 0 {
        return Err(EmulatorError::DivisionByZero);
    }
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}
