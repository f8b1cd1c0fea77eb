use log::{debug, trace, warn};
use stdext::function_name;

use crate::compiler::{
    isa::{Op, Program, Statement, StatementKind, CALL_RETURN_STEPS},
    layout::{Coord, Grid, Layout, Linkage, Walk},
    resolver::{self, LabelTable},
    CompilerError,
};
use crate::project::Config;

use super::{
    command::{
        arith, declare_objective, guard, guarded, park_marker, say, show, trigger, CALLEE_TAG,
        CLEAR_TRIGGER, RETURN_TAG,
    },
    prelude::{self, Routines},
    CodegenError,
};

pub type CodegenResult<T> = Result<T, Vec<CompilerError<CodegenError>>>;

/// A program placed on the grid, together with what each pass decided.
#[derive(Clone, Debug)]
pub struct Compilation {
    grid: Grid,
    labels: LabelTable<Coord>,
    placements: Vec<Coord>,
    routines: Routines,
    fallthrough: Vec<(String, u32)>,
}

impl Compilation {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Label coordinates found by pass 1.
    pub fn labels(&self) -> &LabelTable<Coord> {
        &self.labels
    }

    /// Cell of each statement as placed by pass 2, in program order.
    pub fn placements(&self) -> &[Coord] {
        &self.placements
    }

    pub fn routines(&self) -> &Routines {
        &self.routines
    }

    /// The cell which starts the program when triggered.
    pub fn entry(&self) -> Coord {
        self.routines.init
    }

    /// Labels which are entered by falling through from the previous
    /// statement, with their line.
    pub fn fallthrough(&self) -> &[(String, u32)] {
        &self.fallthrough
    }
}

/// Place `program` on a grid.  The runtime prelude is placed first; then
/// pass 1 finds every label coordinate and pass 2 emits one cell per
/// statement along the same walk.
pub fn generate(program: &Program, config: &Config) -> CodegenResult<Compilation> {
    debug!("Generate grid for {} statements", program.len());
    check_registers(program, config.registers)?;

    let mut layout = Layout::new(config.row_width).map_err(fatal)?;
    let routines = prelude::place(&mut layout, config).map_err(fatal)?;

    let labels = resolver::scan_layout(program, layout.walk().clone()).map_err(|errs| {
        errs.into_iter()
            .map(|e| e.map(CodegenError::from))
            .collect::<Vec<_>>()
    })?;

    let statements = program.statements();
    let mut placements = Vec::with_capacity(statements.len());
    let mut fallthrough = vec![];
    for (idx, stmt) in statements.iter().enumerate() {
        let prev = idx.checked_sub(1).and_then(|i| statements.get(i));
        let at = layout.position();

        if let StatementKind::Label(name) = &stmt.kind {
            if !prev.map_or(false, Statement::is_branch) {
                warn!(
                    "L{}: :{} is entered by falling through, which will not trigger it",
                    stmt.line, name
                );
                fallthrough.push((name.clone(), stmt.line));
            }
        }

        let command = encode(stmt, at, layout.walk(), &labels, &routines)
            .map_err(|e| vec![CompilerError::new(stmt.line, e)])?;
        let linkage = linkage(stmt, prev);
        trace!("{}: {} {:?} {}", function_name!(), at, linkage, command);

        layout
            .place(command, linkage, Some(stmt.line))
            .map_err(|e| vec![CompilerError::new(stmt.line, e.into())])?;
        placements.push(at);
    }

    let grid = layout.into_grid();
    debug!("Grid has {} rows of {}", grid.height(), grid.width());
    Ok(Compilation {
        grid,
        labels,
        placements,
        routines,
        fallthrough,
    })
}

fn fatal<E: Into<CodegenError>>(e: E) -> Vec<CompilerError<CodegenError>> {
    vec![CompilerError::new(0, e.into())]
}

fn check_registers(program: &Program, count: usize) -> CodegenResult<()> {
    let errors: Vec<_> = program
        .registers()
        .filter(|(r, _)| *r as usize >= count)
        .map(|(index, line)| {
            CompilerError::new(line, CodegenError::RegisterOutOfRange { index, count })
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Labels are jump targets and so are always origins, as is anything only
/// reachable through a jump.  Everything else runs after its predecessor.
fn linkage(stmt: &Statement, prev: Option<&Statement>) -> Linkage {
    match &stmt.kind {
        StatementKind::Label(_) => Linkage::Origin,
        StatementKind::Instr(_) if prev.map_or(false, Statement::is_branch) => Linkage::Origin,
        StatementKind::Instr(_) => Linkage::Chained,
    }
}

fn encode(
    stmt: &Statement,
    at: Coord,
    walk: &Walk,
    labels: &LabelTable<Coord>,
    routines: &Routines,
) -> Result<String, CodegenError> {
    let jump = |name: &str| -> Result<String, CodegenError> {
        Ok(trigger(at.delta_to(*labels.resolve(name)?)))
    };

    let op = match &stmt.kind {
        StatementKind::Label(_) => return Ok(CLEAR_TRIGGER.into()),
        StatementKind::Instr(op) => op,
    };

    let cmd = match op {
        Op::Arith(a, dest, src) => arith(*a, dest, src)?,
        Op::Show(o) => show(o)?,
        Op::Say(t) => say(t)?,
        Op::Clr => CLEAR_TRIGGER.into(),
        Op::Var(name) => declare_objective(name),
        Op::Goto(label) => jump(label)?,
        Op::Tag(label) => park_marker(CALLEE_TAG, at.delta_to(*labels.resolve(label)?)),
        Op::Slf => park_marker(
            RETURN_TAG,
            at.delta_to(walk.predict(CALL_RETURN_STEPS)),
        ),
        Op::Call => trigger(at.delta_to(routines.push)),
        Op::Ret => trigger(at.delta_to(routines.pop)),
        Op::If(cond) => guarded(&guard(cond, false)?, &jump(&cond.target)?),
        Op::Else(cond) => guarded(
            &guard(cond, true)?,
            &trigger(at.delta_to(walk.predict(1))),
        ),
    };
    Ok(cmd)
}
