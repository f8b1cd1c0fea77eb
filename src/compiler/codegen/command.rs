//! Text of the commands stored in grid cells.  Every jump is written as a
//! relative offset from the cell that executes it.

use serde_json::{json, Value};

use crate::compiler::{
    isa::{ArithOp, Cmp, Condition, Operand, Segment, Template},
    layout::Delta,
};

use super::CodegenError;

/// Score holder name under which every register and variable is stored.
pub const HOLDER: &str = "REG";

/// Every runtime marker carries this tag, so they can be cleared in one go.
pub const MARKER_TAG: &str = "serpent_marker";
pub const CALLEE_TAG: &str = "serpent_callee";
pub const RETURN_TAG: &str = "serpent_return";
pub const STACK_TAG: &str = "serpent_stack";

/// Objective holding the call stack index, and on each stack marker, its
/// position in the stack.
pub const STACK_OBJECTIVE: &str = "serpent_sp";
pub const STACK_HOLDER: &str = "SP";

pub const CLEAR_TRIGGER: &str = "setblock ~ ~1 ~ minecraft:air";

/// Position of the trigger block above the cell at `delta`.
pub fn offset(delta: Delta) -> String {
    format!("~{} ~1 ~{}", delta.rows, delta.cols)
}

/// Power the origin cell at `delta`.
pub fn trigger(delta: Delta) -> String {
    format!("setblock {} minecraft:redstone_block", offset(delta))
}

/// Move the marker carrying `tag` above the cell at `delta`.
pub fn park_marker(tag: &str, delta: Delta) -> String {
    format!("execute as {} run tp @s {}", selector(tag), offset(delta))
}

pub fn selector(tag: &str) -> String {
    format!("@e[type=armor_stand,tag={}]", tag)
}

pub fn declare_objective(name: &str) -> String {
    format!("scoreboard objectives add {} dummy", name)
}

pub fn slot(operand: &Operand) -> Result<String, CodegenError> {
    operand
        .slot_name()
        .ok_or_else(|| CodegenError::ExpectedSlot(operand.clone()))
}

/// `scoreboard players ...` for a two operand arithmetic instruction.
pub fn arith(op: ArithOp, dest: &Operand, src: &Operand) -> Result<String, CodegenError> {
    let d = slot(dest)?;
    let cmd = match (op, src) {
        (ArithOp::Set, Operand::Immediate(n)) => {
            format!("scoreboard players set {} {} {}", HOLDER, d, n)
        }
        (ArithOp::Add, Operand::Immediate(n)) => add_immediate(&d, *n as i64),
        (ArithOp::Sub, Operand::Immediate(n)) => add_immediate(&d, -(*n as i64)),
        (ArithOp::Mul, Operand::Immediate(_)) | (ArithOp::Div, Operand::Immediate(_)) => {
            return Err(CodegenError::ExpectedSlot(src.clone()))
        }
        (op, src) => {
            let symbol = match op {
                ArithOp::Set => "=",
                ArithOp::Add => "+=",
                ArithOp::Sub => "-=",
                ArithOp::Mul => "*=",
                ArithOp::Div => "/=",
            };
            format!(
                "scoreboard players operation {} {} {} {} {}",
                HOLDER,
                d,
                symbol,
                HOLDER,
                slot(src)?
            )
        }
    };
    Ok(cmd)
}

/// `add` and `remove` only take non-negative amounts.
fn add_immediate(dest: &str, n: i64) -> String {
    if n < 0 {
        format!("scoreboard players remove {} {} {}", HOLDER, dest, -n)
    } else {
        format!("scoreboard players add {} {} {}", HOLDER, dest, n)
    }
}

fn score(name: &str) -> Value {
    json!({"score": {"name": HOLDER, "objective": name}})
}

pub fn show(operand: &Operand) -> Result<String, CodegenError> {
    Ok(format!("tellraw @a {}", score(&slot(operand)?)))
}

pub fn say(template: &Template) -> Result<String, CodegenError> {
    let mut parts = vec![json!("")];
    for s in template.segments() {
        match s {
            Segment::Text(t) => parts.push(json!({ "text": t })),
            Segment::Value(v) => parts.push(score(&slot(v)?)),
        }
    }
    Ok(format!("tellraw @a {}", Value::Array(parts)))
}

/// `execute if|unless score ...` holding exactly when `cond` does, or when
/// it does not if `negate` is set.
pub fn guard(cond: &Condition, negate: bool) -> Result<String, CodegenError> {
    let lhs = slot(&cond.lhs)?;
    let (positive, test) = match &cond.rhs {
        Operand::Immediate(n) => {
            let n = *n;
            match cond.cmp {
                // Nothing is above the largest or below the smallest score:
                // fail a range that every score matches.
                Cmp::Gt if n == i32::MAX => (false, format!("matches ..{}", n)),
                Cmp::Lt if n == i32::MIN => (false, format!("matches {}..", n)),
                Cmp::Gt => (true, format!("matches {}..", n + 1)),
                Cmp::Ge => (true, format!("matches {}..", n)),
                Cmp::Lt => (true, format!("matches ..{}", n - 1)),
                Cmp::Le => (true, format!("matches ..{}", n)),
                Cmp::Eq => (true, format!("matches {}", n)),
                Cmp::Ne => (false, format!("matches {}", n)),
            }
        }
        rhs => {
            let rhs = slot(rhs)?;
            let (positive, symbol) = match cond.cmp {
                Cmp::Ne => (false, "="),
                cmp => (true, cmp.symbol()),
            };
            (positive, format!("{} {} {}", symbol, HOLDER, rhs))
        }
    };

    let keyword = if positive != negate { "if" } else { "unless" };
    Ok(format!(
        "execute {} score {} {} {}",
        keyword, HOLDER, lhs, test
    ))
}

/// Run `cmd` only when the guard holds.
pub fn guarded(guard: &str, cmd: &str) -> String {
    format!("{} run {}", guard, cmd)
}
