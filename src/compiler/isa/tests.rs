#[cfg(test)]
mod tests {
    use crate::compiler::error::ErrorCategory;
    use crate::compiler::isa::*;

    fn op(text: &str) -> Op {
        let program = Program::parse(text).expect("Expected a valid program");
        program
            .statements()
            .last()
            .and_then(|s| s.op())
            .cloned()
            .expect("Expected an instruction")
    }

    #[test]
    fn test_arith_operands() {
        assert_eq!(
            op("ADD R1 #5"),
            Op::Arith(ArithOp::Add, Operand::Register(1), Operand::Immediate(5))
        );
        assert_eq!(
            op("VAR X\nSET X, R2"),
            Op::Arith(
                ArithOp::Set,
                Operand::Variable("X".into()),
                Operand::Register(2)
            )
        );
        assert_eq!(
            op("SUB R0 #-7"),
            Op::Arith(ArithOp::Sub, Operand::Register(0), Operand::Immediate(-7))
        );
    }

    #[test]
    fn test_blank_and_comment_lines() {
        let program = Program::parse(
            "
-- a comment
    SET R1 #1 -- trailing comment

:LOOP
    GOTO :LOOP",
        )
        .unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(program.get(0).unwrap().line, 3);
        assert_eq!(
            program.get(1).unwrap().kind,
            StatementKind::Label("LOOP".into())
        );
        assert_eq!(program.get(2).unwrap().line, 6);
    }

    #[test]
    fn test_label_with_and_without_sigil() {
        assert_eq!(op("GOTO :END"), Op::Goto("END".into()));
        assert_eq!(op("TAG MATH.START"), Op::Tag("MATH.START".into()));
    }

    #[test]
    fn test_say_template() {
        match op(r#"SAY "R1 is {R1}, total { R2 }!" -- not part"#) {
            Op::Say(t) => {
                assert_eq!(
                    t.segments(),
                    &[
                        Segment::Text("R1 is ".into()),
                        Segment::Value(Operand::Register(1)),
                        Segment::Text(", total ".into()),
                        Segment::Value(Operand::Register(2)),
                        Segment::Text("!".into()),
                    ]
                );
            }
            _ => panic!("Expected SAY"),
        }
    }

    #[test]
    fn test_say_keeps_dashes_inside_quotes() {
        match op(r#"SAY "a -- b""#) {
            Op::Say(t) => assert_eq!(t.segments(), &[Segment::Text("a -- b".into())]),
            _ => panic!("Expected SAY"),
        }
    }

    #[test]
    fn test_if_followed_by_else_carries_condition() {
        let program = Program::parse("IF R1 >= #3 GOTO :L\nELSE\nCLR\n:L").unwrap();
        let cond = Condition {
            lhs: Operand::Register(1),
            cmp: Cmp::Ge,
            rhs: Operand::Immediate(3),
            target: "L".into(),
        };
        assert_eq!(program.get(0).unwrap().op(), Some(&Op::If(cond.clone())));
        assert_eq!(program.get(1).unwrap().op(), Some(&Op::Else(cond)));
    }

    #[test]
    fn test_errors() {
        for (text, expected, category) in vec![
            (
                "JMP R1",
                ParseError::UnknownOpcode("JMP".into()),
                ErrorCategory::Syntax,
            ),
            (
                "ADD R1",
                ParseError::OperandCount {
                    opcode: Opcode::Add,
                    expected: 2,
                    found: 1,
                },
                ErrorCategory::Syntax,
            ),
            (
                "MUL R1 #2",
                ParseError::ImmediateNotAllowed(Opcode::Mul),
                ErrorCategory::StructuralViolation,
            ),
            (
                "DIV R1 #2",
                ParseError::ImmediateNotAllowed(Opcode::Div),
                ErrorCategory::StructuralViolation,
            ),
            (
                "IF R1 > R2 GOTO :L\nCLR\n:L",
                ParseError::MissingElse,
                ErrorCategory::StructuralViolation,
            ),
            (
                "IF R1 > R2 GOTO :L\nELSE\nSET R1 #1\n:L",
                ParseError::MissingClr,
                ErrorCategory::StructuralViolation,
            ),
            (
                "ELSE",
                ParseError::ElseWithoutIf,
                ErrorCategory::StructuralViolation,
            ),
            (
                "SLF\nRET",
                ParseError::SlfWithoutCall,
                ErrorCategory::StructuralViolation,
            ),
            (
                "IF R1 ~ R2 GOTO :L",
                ParseError::InvalidComparison("~".into()),
                ErrorCategory::Syntax,
            ),
            (
                "IF R1 > R2 THEN :L",
                ParseError::ExpectedGoto("THEN".into()),
                ErrorCategory::Syntax,
            ),
            (
                "SET X #1",
                ParseError::UndeclaredVariable("X".into()),
                ErrorCategory::Syntax,
            ),
            (
                "SAY hello",
                ParseError::MalformedTemplate("hello".into()),
                ErrorCategory::Syntax,
            ),
            (
                "SET R1 #abc",
                ParseError::InvalidOperand("#abc".into()),
                ErrorCategory::Syntax,
            ),
            (
                "VAR R3",
                ParseError::InvalidOperand("R3".into()),
                ErrorCategory::Syntax,
            ),
        ] {
            let err = Program::parse(text).expect_err(text);
            assert_eq!(err.inner(), &expected, "{}", text);
            assert_eq!(err.category(), category, "{}", text);
        }
    }

    #[test]
    fn test_error_reports_line() {
        let err = Program::parse("SET R1 #1\n\nFOO").unwrap_err();
        assert_eq!(err.line(), 3);
        assert_eq!(format!("{}", err), "L3: Unknown opcode FOO");
    }

    #[test]
    fn test_comparisons_negate() {
        for cmp in &[Cmp::Gt, Cmp::Lt, Cmp::Eq, Cmp::Ne, Cmp::Le, Cmp::Ge] {
            for a in -2..=2 {
                for b in -2..=2 {
                    assert_ne!(cmp.holds(a, b), cmp.negate().holds(a, b));
                }
            }
        }
    }

    #[test]
    fn test_registers_iterates_references() {
        let program = Program::parse("SET R1 #1\nADD R1 R7\nSAY \"{R3}\"").unwrap();
        let regs: Vec<_> = program.registers().collect();
        assert_eq!(regs, vec![(1, 1), (1, 2), (7, 2), (3, 3)]);
    }
}
