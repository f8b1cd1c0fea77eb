#[cfg(test)]
mod tests {
    use crate::compiler::{
        error::ErrorCategory,
        isa::Program,
        layout::{Coord, Walk},
        resolver::*,
    };

    #[test]
    fn test_table_is_write_once() {
        let mut table = LabelTable::new();
        table.insert("A", 1, 3).unwrap();
        assert_eq!(
            table.insert("A", 2, 9),
            Err(LabelError::Duplicate {
                name: "A".into(),
                first_line: 3
            })
        );
        assert_eq!(table.get("A"), Some(&1));
        assert_eq!(table.resolve("B"), Err(LabelError::Undefined("B".into())));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_index_labels() {
        let program = Program::parse(
            "
SET R1 #0
:LOOP
ADD R1 #1
-- comment lines are not statements
:DONE
GOTO :LOOP",
        )
        .unwrap();
        let labels = index_labels(&program).unwrap();
        assert_eq!(labels.get("LOOP"), Some(&1));
        assert_eq!(labels.get("DONE"), Some(&3));
        assert_eq!(
            labels.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            vec!["LOOP", "DONE"]
        );
    }

    #[test]
    fn test_scan_layout_follows_walk() {
        let program = Program::parse(":A\nSET R1 #1\nSET R1 #2\n:B\n:C").unwrap();
        let labels = scan_layout(&program, Walk::new(5).unwrap()).unwrap();
        assert_eq!(labels.get("A"), Some(&Coord::new(0, 1)));
        assert_eq!(labels.get("B"), Some(&Coord::new(1, 3)));
        assert_eq!(labels.get("C"), Some(&Coord::new(1, 2)));
    }

    #[test]
    fn test_scan_layout_starts_at_walk_position() {
        let program = Program::parse(":A").unwrap();
        let mut walk = Walk::new(5).unwrap();
        walk.skip(4);
        let labels = scan_layout(&program, walk).unwrap();
        assert_eq!(labels.get("A"), Some(&Coord::new(1, 2)));
    }

    #[test]
    fn test_errors_are_collected() {
        let program = Program::parse(
            ":A
GOTO :MISSING
:A
IF R1 > R2 GOTO :NOWHERE
ELSE
CLR
TAG :ALSO_MISSING",
        )
        .unwrap();
        let errs = index_labels(&program).unwrap_err();
        let found: Vec<_> = errs
            .iter()
            .map(|e| (e.line(), e.category(), e.inner().clone()))
            .collect();
        assert_eq!(
            found,
            vec![
                (
                    2,
                    ErrorCategory::UndefinedLabel,
                    LabelError::Undefined("MISSING".into())
                ),
                (
                    3,
                    ErrorCategory::DuplicateLabel,
                    LabelError::Duplicate {
                        name: "A".into(),
                        first_line: 1
                    }
                ),
                (
                    4,
                    ErrorCategory::UndefinedLabel,
                    LabelError::Undefined("NOWHERE".into())
                ),
                (
                    7,
                    ErrorCategory::UndefinedLabel,
                    LabelError::Undefined("ALSO_MISSING".into())
                ),
            ]
        );
        assert_eq!(format!("{}", errs[1]), "L3: Label :A is already defined on L1");
    }

    #[test]
    fn test_both_scans_report_same_errors() {
        let program = Program::parse(":X\n:X\nGOTO :Y").unwrap();
        let by_index = index_labels(&program).unwrap_err();
        let by_coord = scan_layout(&program, Walk::new(8).unwrap()).unwrap_err();
        assert_eq!(by_index, by_coord);
    }
}
