#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::compiler::{
        error::ErrorCategory,
        expander::*,
        isa::{ParseError, Program},
        CompilerError,
    };
    use crate::emulator::emulate;

    /// Modules held in memory, reported as `NAME.sasm`.
    struct Modules(HashMap<&'static str, &'static str>);

    impl Modules {
        fn new(modules: Vec<(&'static str, &'static str)>) -> Modules {
            Modules(modules.into_iter().collect())
        }
    }

    impl ModuleLoader for Modules {
        fn load(&self, name: &str) -> std::io::Result<Option<ModuleSource>> {
            Ok(self.0.get(name).map(|text| ModuleSource {
                unit: format!("{}.sasm", name),
                text: text.to_string(),
            }))
        }
    }

    fn fixed() -> FixedPoint {
        FixedPoint::new(4).unwrap()
    }

    fn lines(text: &str) -> Vec<String> {
        expand("main", text, &Library, fixed())
            .unwrap()
            .lines()
            .iter()
            .map(|l| l.text.clone())
            .collect()
    }

    fn run(text: &str, loader: &dyn ModuleLoader) -> Vec<String> {
        let expansion = expand("main", text, loader, fixed()).unwrap();
        let mut out: Vec<String> = vec![];
        emulate(&expansion.text(), 8, &mut out).unwrap();
        out
    }

    fn expand_err(text: &str, loader: &dyn ModuleLoader) -> CompilerError<ExpandError> {
        expand("main", text, loader, fixed()).unwrap_err()
    }

    #[test]
    fn test_primitive_lines_pass_through() {
        assert_eq!(
            lines("SET R1 #2 -- two\n\n:L\nSHOW R1"),
            vec!["SET R1 #2", ":L", "SHOW R1"]
        );
    }

    #[test]
    fn test_call_becomes_call_unit() {
        assert_eq!(
            lines("CALL :F\n:F\nSAY \"x\""),
            vec!["TAG :F", "SLF", "CALL", ":F", "SAY \"x\""]
        );
    }

    #[test]
    fn test_if_gains_else_and_clr() {
        assert_eq!(
            lines("IF R1 > #3 GOTO :L\n:L"),
            vec!["IF R1 > #3 GOTO :L", "ELSE", "CLR", ":L"]
        );
    }

    #[test]
    fn test_opr() {
        assert_eq!(
            lines("OPR ADD R1 R2 #3"),
            vec![
                "VAR SYS.OPR",
                "SET SYS.OPR R2",
                "ADD SYS.OPR #3",
                "SET R1 SYS.OPR"
            ]
        );
        assert_eq!(
            lines("OPR MUL R1 R2 #3"),
            vec![
                "VAR SYS.OPR",
                "VAR SYS.OPR_B",
                "SET SYS.OPR R2",
                "SET SYS.OPR_B #3",
                "MUL SYS.OPR SYS.OPR_B",
                "SET R1 SYS.OPR"
            ]
        );
        assert_eq!(
            run("SET R2 #9\nOPR DIV R1 R2 #-2\nSHOW R1", &Library),
            vec!["-5"]
        );
        assert_eq!(
            expand_err("OPR MOD R1 R2 R3", &Library).into_inner(),
            ExpandError::InvalidOperand("MOD".into())
        );
    }

    #[test]
    fn test_end_in_main_stops() {
        assert_eq!(
            lines("SAY \"a\"\nEND\nSAY \"b\""),
            vec![
                "SAY \"a\"",
                "GOTO :SYS.EXIT",
                "SAY \"b\"",
                "GOTO :SYS.EXIT",
                ":SYS.EXIT"
            ]
        );
        assert_eq!(run("SAY \"a\"\nEND\nSAY \"b\"", &Library), vec!["a"]);
    }

    #[test]
    fn test_fixed_point_arithmetic() {
        assert_eq!(
            run("VAR X\nFSET X #2.5\nFMUL X #4\nFSHOW \"x={X}\"", &Library),
            vec!["x=10.0000"]
        );
        assert_eq!(
            run(
                "VAR X\nVAR Y\nFSET X #1\nFSET Y #4\nFDIV X Y\nFSHOW \"{X} {Y}\"",
                &Library
            ),
            vec!["0.2500 4.0000"]
        );
        assert_eq!(
            run("VAR X\nFSET X #-2.5\nFSHOW \"{X}\"", &Library),
            vec!["-3.5000"]
        );
        assert_eq!(
            run("VAR X\nFSET X #0.0625\nFADD X #1\nFSUB X #0.5\nFSHOW \"{X}\"", &Library),
            vec!["0.5625"]
        );
    }

    #[test]
    fn test_fixed_point_header() {
        let text = lines("VAR X\nFSET X #1\nFMUL X #2");
        assert_eq!(
            &text[..9],
            &[
                "VAR SYS.FA",
                "VAR SYS.FB",
                "VAR SYS.FC",
                "VAR SYS.FD",
                "VAR SYS.FIX",
                "VAR SYS.FT",
                "VAR SYS.SCALE",
                "SET SYS.SCALE #10000",
                "VAR X"
            ]
        );
    }

    #[test]
    fn test_fixed_point_products_keep_scale() {
        let show = |setup: &str| {
            let text = format!("VAR X\nVAR Y\n{}\nFSHOW \"{{X}}\"", setup);
            run(&text, &Library)
        };
        for (setup, expected) in vec![
            ("FSET X #5\nFMUL X #5", "25.0000"),
            ("FSET X #22\nFDIV X #1", "22.0000"),
            ("FSET X #-2.5\nFMUL X #-2.5", "6.2500"),
            ("FSET X #-2.5\nFMUL X #2", "-5.0000"),
            ("FSET X #0.5\nFMUL X X", "0.2500"),
            ("FSET X #150.5\nFMUL X #100", "15050.0000"),
            ("FSET X #1000\nFDIV X #0.5", "2000.0000"),
            ("FSET X #1\nFSET Y #-4\nFDIV X Y", "-1.7500"),
            ("FSET X #10\nFDIV X X", "1.0000"),
            ("FSET X #2\nFDIV X #3", "0.6666"),
        ] {
            assert_eq!(show(setup), vec![expected], "{}", setup);
        }

        let expansion =
            expand("main", "VAR X\nFSET X #1\nFDIV X #0", &Library, fixed()).unwrap();
        let errs = emulate(&expansion.text(), 1, &mut Vec::<String>::new()).unwrap_err();
        assert_eq!(errs[0].category(), ErrorCategory::Arithmetic);
    }

    #[test]
    fn test_fixed_point_literals() {
        let fp = fixed();
        assert_eq!(fp.scale(), 10000);
        for (lit, expected) in vec![
            ("2.5", Some(25000)),
            ("-0.25", Some(-2500)),
            ("3", Some(30000)),
            ("1.23450", Some(12345)),
            ("1.23456", None),
            ("1.", None),
            (".5", None),
            ("1.2.3", None),
            ("abc", None),
            ("300000", None),
        ] {
            assert_eq!(fp.parse(lit), expected, "{}", lit);
        }

        assert_eq!(FixedPoint::new(0), None);
        assert_eq!(FixedPoint::new(10), None);
        assert_eq!(FixedPoint::from_scale(100).map(|f| f.digits()), Some(2));
        assert_eq!(FixedPoint::from_scale(250), None);

        assert_eq!(
            expand_err("VAR X\nFSET X #1.23456", &Library).into_inner(),
            ExpandError::InvalidFixed("#1.23456".into())
        );
    }

    #[test]
    fn test_modules_are_namespaced() {
        let modules = Modules::new(vec![
            ("A", ":START\nVAR N\nSET N #1\nSAY \"a{N}\"\nEND"),
            ("B", ":START\nVAR N\nSET N #2\nSAY \"b{N}\"\nEND"),
        ]);
        let expansion = expand("main", "IMPORT A\nIMPORT B\nIMPORT A", &modules, fixed()).unwrap();
        let text = expansion.text();
        assert!(text.starts_with("VAR A.N\nVAR B.N\nTAG :A.START\n"));
        assert_eq!(text.matches("TAG :A.START\n").count(), 2);
        assert_eq!(text.matches("\n:A.START\n").count(), 1);
        assert!(text.ends_with("RET\n:SYS.EXIT\n"));

        let program = Program::parse(&text).unwrap();
        assert!(!program.is_empty());

        assert_eq!(
            run("IMPORT A\nIMPORT B\nIMPORT A", &modules),
            vec!["a1", "b2", "a1"]
        );
    }

    #[test]
    fn test_module_origins() {
        let modules = Modules::new(vec![("A", "-- a module\n:START\nSAY \"a\"\nEND")]);
        let expansion = expand("main", "IMPORT A", &modules, fixed()).unwrap();
        let say = expansion
            .lines()
            .iter()
            .find(|l| l.text == "SAY \"a\"")
            .unwrap();
        assert_eq!(say.unit, "A.sasm");
        assert_eq!(say.line, 3);
    }

    #[test]
    fn test_library_math() {
        let out = run(
            "IMPORT MATH
SET R0 #-7
CALL :MATH.ABS
SHOW R0
SET R1 #3
CALL :MATH.MAX
SHOW R0
CALL :MATH.SQUARE
SHOW R0
SET R1 #-1
CALL :MATH.MIN
SHOW R0",
            &Library,
        );
        assert_eq!(out, vec!["7", "7", "49", "-1"]);
        assert!(builtin("MATH").is_some());
        assert!(builtin("TRIG").is_none());
    }

    #[test]
    fn test_import_errors() {
        let modules = Modules::new(vec![
            ("A", ":START\nIMPORT B\nEND"),
            ("B", ":START\nIMPORT A\nEND"),
            ("SELF", ":START\nIMPORT SELF\nEND"),
            ("C", ":BEGIN\nEND"),
        ]);

        let err = expand_err("IMPORT A", &modules);
        assert_eq!(
            err.inner(),
            &ExpandError::CyclicImport(vec!["A".into(), "B".into(), "A".into()])
        );
        assert_eq!(err.unit(), Some("B.sasm"));
        assert_eq!(err.line(), 2);
        assert_eq!(err.category(), ErrorCategory::StructuralViolation);

        assert_eq!(
            expand_err("IMPORT SELF", &modules).into_inner(),
            ExpandError::CyclicImport(vec!["SELF".into(), "SELF".into()])
        );

        let err = expand_err("SAY \"x\"\nIMPORT NOPE", &modules);
        assert_eq!(err.inner(), &ExpandError::ModuleNotFound("NOPE".into()));
        assert_eq!(err.unit(), Some("main"));
        assert_eq!(err.line(), 2);
        assert_eq!(err.category(), ErrorCategory::ModuleNotFound);

        assert_eq!(
            expand_err("IMPORT C", &modules).into_inner(),
            ExpandError::MissingStart("C".into())
        );
    }

    #[test]
    fn test_reserved_names() {
        for (text, name) in vec![
            (":SYS.X", "SYS.X"),
            ("SAY \"x\"\nVAR SYS.OPR", "SYS.OPR"),
            ("IMPORT SYS", "SYS"),
        ] {
            assert_eq!(
                expand_err(text, &Library).into_inner(),
                ExpandError::ReservedName(name.into()),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_syntax_errors_carry_unit_and_line() {
        let err = expand_err("SET R1 #1\nFROB R1", &Library);
        assert_eq!(err.inner(), &ExpandError::UnknownOpcode("FROB".into()));
        assert_eq!(err.category(), ErrorCategory::Syntax);
        assert_eq!(format!("{}", err), "main:L2: Unknown opcode FROB");

        assert_eq!(
            expand_err("CALL", &Library).into_inner(),
            ExpandError::OperandCount {
                mnemonic: "CALL".into(),
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn test_origin_and_locate() {
        let expansion = expand("main", "VAR X\nOPR ADD X #1 #2\nSHOW X", &Library, fixed()).unwrap();
        assert_eq!(expansion.origin(0), None);
        assert_eq!(expansion.origin(1).map(|l| l.line), Some(0));
        let origin = expansion.origin(4).unwrap();
        assert_eq!(origin.text, "ADD SYS.OPR #2");
        assert_eq!(origin.line, 2);

        let located = expansion.locate(CompilerError::new(5, ()));
        assert_eq!(located.line(), 2);
        assert_eq!(located.unit(), Some("main"));

        // Errors found while parsing the expanded text point at the source.
        let expansion = expand("main", "SAY \"hi\"\n\nMUL R1 #2", &Library, fixed()).unwrap();
        let err = Program::parse(&expansion.text()).unwrap_err();
        assert_eq!(err.line(), 2);
        let err = expansion.locate(err);
        assert_eq!(err.line(), 3);
        assert_eq!(err.unit(), Some("main"));
        assert!(matches!(err.inner(), ParseError::ImmediateNotAllowed(_)));
    }
}
