#[cfg(test)]
mod tests {
    use rand::{seq::SliceRandom, Rng};

    use crate::compiler::{
        codegen::{command, generate, prelude, CodegenError, Compilation},
        error::ErrorCategory,
        isa::{ArithOp, Cmp, Condition, Operand, Program},
        layout::{Coord, Linkage, Orientation},
        resolver::LabelError,
    };
    use crate::project::Config;

    fn config(row_width: usize) -> Config {
        Config {
            row_width,
            registers: 4,
            stack_depth: 2,
            ..Config::default()
        }
    }

    fn compile(text: &str, row_width: usize) -> Compilation {
        let program = Program::parse(text).unwrap();
        generate(&program, &config(row_width)).unwrap()
    }

    fn command_at(c: &Compilation, idx: usize) -> String {
        let at = c.placements()[idx];
        c.grid()
            .get(at)
            .and_then(|cell| cell.command.clone())
            .unwrap()
    }

    /// Cell addressed by the first relative offset in a command.
    fn jump_target(from: Coord, cmd: &str) -> Coord {
        let offsets: Vec<i64> = cmd
            .split_whitespace()
            .filter(|t| t.starts_with('~') && t.len() > 1)
            .map(|t| t[1..].parse().unwrap())
            .collect();
        assert_eq!(offsets[1], 1, "{}", cmd);
        Coord::new(
            (from.row as i64 + offsets[0]) as usize,
            (from.col as i64 + offsets[2]) as usize,
        )
    }

    #[test]
    fn test_arith_encodings() {
        let r1 = Operand::Register(1);
        let x = Operand::Variable("X".into());
        for (op, dest, src, expected) in vec![
            (
                ArithOp::Set,
                &r1,
                Operand::Immediate(5),
                "scoreboard players set REG R1 5",
            ),
            (
                ArithOp::Set,
                &x,
                Operand::Register(2),
                "scoreboard players operation REG X = REG R2",
            ),
            (
                ArithOp::Add,
                &r1,
                Operand::Immediate(3),
                "scoreboard players add REG R1 3",
            ),
            (
                ArithOp::Add,
                &r1,
                Operand::Immediate(-3),
                "scoreboard players remove REG R1 3",
            ),
            (
                ArithOp::Sub,
                &r1,
                Operand::Immediate(-3),
                "scoreboard players add REG R1 3",
            ),
            (
                ArithOp::Sub,
                &x,
                Operand::Variable("Y".into()),
                "scoreboard players operation REG X -= REG Y",
            ),
            (
                ArithOp::Mul,
                &r1,
                Operand::Register(0),
                "scoreboard players operation REG R1 *= REG R0",
            ),
            (
                ArithOp::Div,
                &r1,
                Operand::Register(0),
                "scoreboard players operation REG R1 /= REG R0",
            ),
        ] {
            assert_eq!(command::arith(op, dest, &src).unwrap(), expected);
        }
        assert_eq!(
            command::arith(ArithOp::Mul, &r1, &Operand::Immediate(2)),
            Err(CodegenError::ExpectedSlot(Operand::Immediate(2)))
        );
    }

    #[test]
    fn test_text_encodings() {
        assert_eq!(
            command::show(&Operand::Register(1)).unwrap(),
            r#"tellraw @a {"score":{"name":"REG","objective":"R1"}}"#
        );

        let program = Program::parse("VAR N\nSAY \"n = {N}\"").unwrap();
        let template = match program.get(1).and_then(|s| s.op()) {
            Some(crate::compiler::isa::Op::Say(t)) => t.clone(),
            _ => panic!("Expected SAY"),
        };
        assert_eq!(
            command::say(&template).unwrap(),
            r#"tellraw @a ["",{"text":"n = "},{"score":{"name":"REG","objective":"N"}}]"#
        );
    }

    #[test]
    fn test_guards() {
        let cond = |cmp, rhs| Condition {
            lhs: Operand::Register(1),
            cmp,
            rhs,
            target: "L".into(),
        };
        for (c, pos, neg) in vec![
            (
                cond(Cmp::Gt, Operand::Immediate(3)),
                "execute if score REG R1 matches 4..",
                "execute unless score REG R1 matches 4..",
            ),
            (
                cond(Cmp::Le, Operand::Immediate(-1)),
                "execute if score REG R1 matches ..-1",
                "execute unless score REG R1 matches ..-1",
            ),
            (
                cond(Cmp::Ne, Operand::Immediate(0)),
                "execute unless score REG R1 matches 0",
                "execute if score REG R1 matches 0",
            ),
            (
                cond(Cmp::Ge, Operand::Register(2)),
                "execute if score REG R1 >= REG R2",
                "execute unless score REG R1 >= REG R2",
            ),
            (
                cond(Cmp::Ne, Operand::Variable("X".into())),
                "execute unless score REG R1 = REG X",
                "execute if score REG R1 = REG X",
            ),
            (
                cond(Cmp::Gt, Operand::Immediate(i32::MAX)),
                "execute unless score REG R1 matches ..2147483647",
                "execute if score REG R1 matches ..2147483647",
            ),
            (
                cond(Cmp::Lt, Operand::Immediate(i32::MIN)),
                "execute unless score REG R1 matches -2147483648..",
                "execute if score REG R1 matches -2147483648..",
            ),
            (
                cond(Cmp::Ge, Operand::Immediate(i32::MAX)),
                "execute if score REG R1 matches 2147483647..",
                "execute unless score REG R1 matches 2147483647..",
            ),
        ] {
            assert_eq!(command::guard(&c, false).unwrap(), pos);
            assert_eq!(command::guard(&c, true).unwrap(), neg);
        }
    }

    #[test]
    fn test_program_starts_after_prelude() {
        let c = compile("SET R1 #1", 40);
        let cells = prelude::cell_count(&config(40));
        assert_eq!(c.placements(), &[Coord::new(0, cells + 1)]);
        assert_eq!(c.entry(), c.routines().init);
        assert_eq!(c.routines().push, Coord::new(0, 1));
        assert_eq!(
            c.grid().get(c.routines().pop).map(|cell| cell.linkage),
            Some(Linkage::Origin)
        );
    }

    #[test]
    fn test_push_rearms_return_cell() {
        let c = compile("SET R1 #1", 40);
        let cell = |row, col| {
            c.grid()
                .get(Coord::new(row, col))
                .and_then(|cell| cell.command.clone())
                .unwrap()
        };

        // Push clears the trigger that the previous pop left above the return
        // cell, before anything else runs.
        let push = c.routines().push;
        assert_eq!(
            cell(push.row, push.col + 1),
            "execute at @e[type=armor_stand,tag=serpent_return] run setblock ~ ~ ~ minecraft:air"
        );

        let pop = c.routines().pop;
        let last_pop = cell(pop.row, pop.col + 3);
        assert_eq!(
            last_pop,
            "execute at @e[type=armor_stand,tag=serpent_return] run setblock ~ ~ ~ minecraft:redstone_block"
        );
    }

    #[test]
    fn test_goto_jumps_to_label() {
        let c = compile(":L\nSET R1 #1\nGOTO :L", 40);
        assert_eq!(
            command_at(&c, 2),
            "setblock ~0 ~1 ~-2 minecraft:redstone_block"
        );
        assert_eq!(command_at(&c, 0), command::CLEAR_TRIGGER);
    }

    #[test]
    fn test_jump_across_rows() {
        let mut text = String::from(":TOP\n");
        for _ in 0..20 {
            text.push_str("ADD R1 #1\n");
        }
        text.push_str("GOTO :TOP");
        let c = compile(&text, 6);
        let last = c.placements().len() - 1;
        let from = c.placements()[last];
        assert_eq!(
            jump_target(from, &command_at(&c, last)),
            *c.labels().get("TOP").unwrap()
        );
        assert!(from.row > c.placements()[0].row);
    }

    #[test]
    fn test_linkage_and_fallthrough() {
        let c = compile("SET R1 #1\nGOTO :END\nSHOW R1\n:END\nSHOW R1", 40);
        let linkage: Vec<_> = c
            .placements()
            .iter()
            .map(|at| c.grid().get(*at).unwrap().linkage)
            .collect();
        assert_eq!(
            linkage,
            vec![
                Linkage::Chained,
                Linkage::Chained,
                Linkage::Origin,
                Linkage::Origin,
                Linkage::Chained
            ]
        );
        assert_eq!(c.fallthrough(), &[("END".to_string(), 4)]);
    }

    #[test]
    fn test_call_unit() {
        let c = compile(
            "TAG :F\nSLF\nCALL\nSHOW R1\nGOTO :X\n:F\nRET\n:X",
            40,
        );
        let p = c.placements();
        assert_eq!(jump_target(p[0], &command_at(&c, 0)), p[5]);
        assert_eq!(
            command_at(&c, 0),
            "execute as @e[type=armor_stand,tag=serpent_callee] run tp @s ~0 ~1 ~5"
        );
        assert_eq!(jump_target(p[1], &command_at(&c, 1)), p[3]);
        assert_eq!(jump_target(p[2], &command_at(&c, 2)), c.routines().push);
        assert_eq!(jump_target(p[6], &command_at(&c, 6)), c.routines().pop);
        assert_eq!(c.grid().get(p[3]).unwrap().linkage, Linkage::Origin);
    }

    #[test]
    fn test_return_cell_predicted_across_wrap() {
        // Place SLF on the last usable column so the return cell is on the
        // next row.
        let cfg = config(5);
        let cells = prelude::cell_count(&cfg);
        let mut text = String::new();
        let pad = (3 - (cells % 3) + 1) % 3;
        for _ in 0..pad {
            text.push_str("SHOW R0\n");
        }
        text.push_str("TAG :F\nSLF\nCALL\nSHOW R1\n:F\nRET");
        let program = Program::parse(&text).unwrap();
        let c = generate(&program, &cfg).unwrap();
        let p = c.placements();
        let slf = pad + 1;
        assert_ne!(p[slf].row, p[slf + 2].row);
        assert_eq!(jump_target(p[slf], &command_at(&c, slf)), p[slf + 2]);
    }

    #[test]
    fn test_if_else_targets() {
        let c = compile(
            "IF R1 > R2 GOTO :BIG\nELSE\nCLR\nSAY \"small\"\nGOTO :END\n:BIG\nSAY \"big\"\n:END",
            40,
        );
        let p = c.placements();
        let if_cmd = command_at(&c, 0);
        let else_cmd = command_at(&c, 1);
        assert!(if_cmd.starts_with("execute if score REG R1 > REG R2 run setblock"));
        assert!(else_cmd.starts_with("execute unless score REG R1 > REG R2 run setblock"));
        assert_eq!(jump_target(p[0], &if_cmd), p[5]);
        assert_eq!(jump_target(p[1], &else_cmd), p[2]);
        assert_eq!(command_at(&c, 2), command::CLEAR_TRIGGER);
        assert_eq!(c.grid().get(p[2]).unwrap().linkage, Linkage::Origin);
    }

    #[test]
    fn test_orientation_follows_direction() {
        let c = compile(&"SHOW R1\n".repeat(40), 8);
        for at in c.placements() {
            let expected = if at.row % 2 == 0 {
                Orientation::Forward
            } else {
                Orientation::Backward
            };
            assert_eq!(c.grid().get(*at).unwrap().orientation, expected);
        }
    }

    #[test]
    fn test_errors() {
        let program = Program::parse("SET R9 #1\nSHOW R4").unwrap();
        let errs = generate(&program, &config(40)).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert_eq!(
            errs[0].inner(),
            &CodegenError::RegisterOutOfRange { index: 9, count: 4 }
        );
        assert_eq!(errs[1].line(), 2);

        let program = Program::parse("GOTO :A\nGOTO :B").unwrap();
        let errs = generate(&program, &config(40)).unwrap_err();
        assert_eq!(
            errs.iter().map(|e| e.category()).collect::<Vec<_>>(),
            vec![ErrorCategory::UndefinedLabel, ErrorCategory::UndefinedLabel]
        );
        assert_eq!(
            errs[1].inner(),
            &CodegenError::Label(LabelError::Undefined("B".into()))
        );

        let program = Program::parse("SHOW R1").unwrap();
        let errs = generate(&program, &config(2)).unwrap_err();
        assert_eq!(errs[0].category(), ErrorCategory::Layout);
    }

    /// Random programs of labels, arithmetic and jumps: pass 1 must predict
    /// every label cell that pass 2 places, and every jump must land on its
    /// label, whatever the row width.
    #[test]
    fn test_passes_agree() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let width = rng.gen_range(3..16);
            let len = rng.gen_range(1..80);
            let mut labels = vec![];
            let mut lines = vec![];
            for i in 0..len {
                match rng.gen_range(0..4) {
                    0 => {
                        labels.push(format!("L{}", i));
                        lines.push(format!(":L{}", i));
                    }
                    1 => lines.push(format!("ADD R{} #{}", rng.gen_range(0..4), i)),
                    2 => lines.push("GOTO :L_END".into()),
                    _ => lines.push("IF R0 < R1 GOTO :L_END\nELSE\nCLR".into()),
                }
            }
            lines.push(":L_END".into());
            labels.push("L_END".into());
            if let Some(target) = labels.choose(&mut rng) {
                lines.push(format!("GOTO :{}", target));
            }

            let program = Program::parse(&lines.join("\n")).unwrap();
            let c = generate(&program, &config(width)).unwrap();

            for (idx, stmt) in program.statements().iter().enumerate() {
                let at = c.placements()[idx];
                let cell = c.grid().get(at).unwrap();
                assert_eq!(cell.source_line, Some(stmt.line));
                assert!(at.col >= 1 && at.col <= width - 2);

                if let Some(name) = stmt.label_name() {
                    assert_eq!(c.labels().get(name), Some(&at));
                }
                if let Some(name) = stmt.op().and_then(|op| op.label_ref()) {
                    let cmd = cell.command.as_ref().unwrap();
                    assert_eq!(
                        jump_target(at, cmd),
                        *c.labels().get(name).unwrap(),
                        "{}",
                        cmd
                    );
                }
            }
        }
    }
}
