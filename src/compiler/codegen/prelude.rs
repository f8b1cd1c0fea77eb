//! Routines placed ahead of every program.  They implement the call stack,
//! which the substrate lacks, with armor stand markers: CALL and RET jump to
//! `push` and `pop`, and `init` prepares the markers and the storage before
//! flowing straight into the first statement of the program.

use log::debug;

use crate::compiler::layout::{Coord, Layout, LayoutError, Linkage};
use crate::project::Config;

use super::command::{
    declare_objective, selector, CALLEE_TAG, CLEAR_TRIGGER, HOLDER, MARKER_TAG, RETURN_TAG,
    STACK_HOLDER, STACK_OBJECTIVE, STACK_TAG,
};

/// Entry cells of the prelude routines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Routines {
    pub push: Coord,
    pub pop: Coord,
    pub init: Coord,
}

pub fn place(layout: &mut Layout, config: &Config) -> Result<Routines, LayoutError> {
    let push = routine(layout, &push_commands())?;
    let pop = routine(layout, &pop_commands())?;
    let init = routine(layout, &init_commands(config))?;
    debug!(
        "Prelude push at {}, pop at {}, init at {}",
        push, pop, init
    );
    Ok(Routines { push, pop, init })
}

/// Lay out a routine: an origin cell clearing its trigger, then the commands
/// chained after it.
fn routine(layout: &mut Layout, commands: &[String]) -> Result<Coord, LayoutError> {
    let entry = layout.place(CLEAR_TRIGGER.into(), Linkage::Origin, None)?;
    for cmd in commands {
        layout.place(cmd.clone(), Linkage::Chained, None)?;
    }
    Ok(entry)
}

/// Number of cells the prelude occupies for `config`.
pub fn cell_count(config: &Config) -> usize {
    3 + push_commands().len() + pop_commands().len() + init_commands(config).len()
}

fn stack_top() -> String {
    format!(
        "execute as {} if score @s {} = {} {}",
        selector(STACK_TAG),
        STACK_OBJECTIVE,
        STACK_HOLDER,
        STACK_OBJECTIVE
    )
}

/// The return cell is an origin that may already have run once.  Its old
/// trigger is removed here so that `pop` can power it again.
fn push_commands() -> Vec<String> {
    vec![
        format!(
            "execute at {} run setblock ~ ~ ~ minecraft:air",
            selector(RETURN_TAG)
        ),
        format!("scoreboard players add {} {} 1", STACK_HOLDER, STACK_OBJECTIVE),
        format!(
            "{} run tp @s @e[type=armor_stand,tag={},limit=1]",
            stack_top(),
            RETURN_TAG
        ),
        format!(
            "execute at {} run setblock ~ ~ ~ minecraft:redstone_block",
            selector(CALLEE_TAG)
        ),
    ]
}

fn pop_commands() -> Vec<String> {
    vec![
        format!("{} run tp {} @s", stack_top(), selector(RETURN_TAG)),
        format!(
            "scoreboard players remove {} {} 1",
            STACK_HOLDER, STACK_OBJECTIVE
        ),
        format!(
            "execute at {} run setblock ~ ~ ~ minecraft:redstone_block",
            selector(RETURN_TAG)
        ),
    ]
}

fn summon(tags: &[&str]) -> String {
    let tags: Vec<String> = tags.iter().map(|t| format!("\"{}\"", t)).collect();
    format!(
        "summon minecraft:armor_stand ~ ~1 ~ {{Tags:[{}],Marker:1b,Invisible:1b,NoGravity:1b}}",
        tags.join(",")
    )
}

fn init_commands(config: &Config) -> Vec<String> {
    let mut cmds = vec![
        format!("kill {}", selector(MARKER_TAG)),
        summon(&[MARKER_TAG, CALLEE_TAG]),
        summon(&[MARKER_TAG, RETURN_TAG]),
        declare_objective(STACK_OBJECTIVE),
        format!(
            "scoreboard players set {} {} 0",
            STACK_HOLDER, STACK_OBJECTIVE
        ),
    ];

    for i in 1..=config.stack_depth {
        let tag = format!("{}_{}", STACK_TAG, i);
        cmds.push(summon(&[MARKER_TAG, STACK_TAG, &tag]));
        cmds.push(format!(
            "scoreboard players set {} {} {}",
            selector(&tag),
            STACK_OBJECTIVE,
            i
        ));
    }

    for r in 0..config.registers {
        let name = format!("R{}", r);
        cmds.push(declare_objective(&name));
        cmds.push(format!("scoreboard players set {} {} 0", HOLDER, name));
    }
    cmds
}
