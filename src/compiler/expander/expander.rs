use std::collections::{BTreeSet, HashSet};

use log::{debug, trace};

use crate::compiler::{
    isa::{is_identifier, strip_comment, Opcode},
    CompilerError,
};

use super::{
    fixed::{self, FixedPoint},
    namespace::{is_reserved, Namespace},
    operands, split_mnemonic, ExpandError, ExpandResult, ExpandedLine, Expansion, ModuleLoader,
    EXIT_LABEL,
};

const OPR: &str = "SYS.OPR";
const OPR_B: &str = "SYS.OPR_B";

/// Expand the structured program `text`, reporting errors against `unit`.
pub fn expand(
    unit: &str,
    text: &str,
    loader: &dyn ModuleLoader,
    fixed: FixedPoint,
) -> ExpandResult<Expansion> {
    Expander::new(loader, fixed).expand(unit, text)
}

/// Collects the primitive lines lowered from one structured line, and the
/// system variables they use.
pub(super) struct Emitter<'e> {
    lines: Vec<String>,
    system: &'e mut BTreeSet<String>,
}

impl<'e> Emitter<'e> {
    pub(super) fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into())
    }

    /// Mark a system variable as used and return its name.
    pub(super) fn sys(&mut self, name: &str) -> String {
        self.system.insert(name.into());
        name.into()
    }
}

struct Site<'s> {
    unit: &'s str,
    line: u32,
}

impl Site<'_> {
    fn error(&self, e: ExpandError) -> CompilerError<ExpandError> {
        CompilerError::new(self.line, e).in_unit(self.unit)
    }
}

pub struct Expander<'a> {
    loader: &'a dyn ModuleLoader,
    fixed: FixedPoint,

    /// System variables used anywhere, declared once at the top.
    system: BTreeSet<String>,

    /// Module variable declarations, moved to the top so that they are
    /// declared before any use.
    hoisted: Vec<ExpandedLine>,

    /// Bodies of imported modules, appended after the main program.
    modules: Vec<ExpandedLine>,
    loaded: HashSet<String>,

    /// Modules whose expansion is in progress, outermost first.
    importing: Vec<String>,

    /// Set when the main program uses END.
    exits: bool,
}

impl<'a> Expander<'a> {
    pub fn new(loader: &'a dyn ModuleLoader, fixed: FixedPoint) -> Expander<'a> {
        Expander {
            loader,
            fixed,
            system: BTreeSet::new(),
            hoisted: vec![],
            modules: vec![],
            loaded: HashSet::new(),
            importing: vec![],
            exits: false,
        }
    }

    pub fn expand(mut self, unit: &str, text: &str) -> ExpandResult<Expansion> {
        debug!("Expand {}", unit);
        let main = self.lower_unit(unit, text, None)?;
        let exits = self.exits || !self.modules.is_empty();

        let mut lines = self.header(unit);
        lines.append(&mut self.hoisted);
        lines.extend(main);
        if exits {
            lines.push(synthetic(unit, format!("GOTO :{}", EXIT_LABEL)));
            lines.append(&mut self.modules);
            lines.push(synthetic(unit, format!(":{}", EXIT_LABEL)));
        }

        debug!("Expanded {} into {} primitive lines", unit, lines.len());
        Ok(Expansion::new(lines))
    }

    fn header(&self, unit: &str) -> Vec<ExpandedLine> {
        let mut text: Vec<String> = self
            .system
            .iter()
            .map(|name| format!("VAR {}", name))
            .collect();
        if self.system.contains(fixed::SCALE) {
            text.push(format!("SET {} #{}", fixed::SCALE, self.fixed.scale()));
        }
        if self.system.contains(fixed::TEN) {
            text.push(format!("SET {} #10", fixed::TEN));
        }
        text.into_iter().map(|t| synthetic(unit, t)).collect()
    }

    fn lower_unit(
        &mut self,
        unit: &str,
        text: &str,
        module: Option<&str>,
    ) -> ExpandResult<Vec<ExpandedLine>> {
        let ns = Namespace::scan(module, text)
            .map_err(|(line, e)| CompilerError::new(line, e).in_unit(unit))?;

        let mut out = vec![];
        for (idx, raw) in text.lines().enumerate() {
            let src = strip_comment(raw).trim();
            if src.is_empty() {
                continue;
            }

            let site = Site {
                unit,
                line: idx as u32 + 1,
            };
            let src = ns.rename(src);
            for text in self.lower_line(&site, &src, module)? {
                trace!("{}:L{}: {}", unit, site.line, text);
                out.push(ExpandedLine {
                    text,
                    unit: unit.into(),
                    line: site.line,
                });
            }
        }
        Ok(out)
    }

    fn lower_line(
        &mut self,
        site: &Site,
        line: &str,
        module: Option<&str>,
    ) -> ExpandResult<Vec<String>> {
        if line.starts_with(':') {
            return Ok(vec![line.into()]);
        }

        let (mnemonic, rest) = split_mnemonic(line);
        let ops = operands(rest);
        let arity = |n: usize| {
            if ops.len() == n {
                Ok(())
            } else {
                Err(site.error(ExpandError::OperandCount {
                    mnemonic: mnemonic.into(),
                    expected: n,
                    found: ops.len(),
                }))
            }
        };

        match mnemonic {
            "IMPORT" => {
                arity(1)?;
                return self.import(site, ops[0]);
            }
            "END" => {
                arity(0)?;
                let end = match module {
                    Some(_) => "RET".into(),
                    None => {
                        self.exits = true;
                        format!("GOTO :{}", EXIT_LABEL)
                    }
                };
                return Ok(vec![end]);
            }
            "VAR" if module.is_some() => {
                self.hoisted.push(ExpandedLine {
                    text: line.into(),
                    unit: site.unit.into(),
                    line: site.line,
                });
                return Ok(vec![]);
            }
            _ => (),
        }

        let fixed = self.fixed;
        let mut em = Emitter {
            lines: vec![],
            system: &mut self.system,
        };
        match mnemonic {
            "CALL" => {
                arity(1)?;
                for l in call_unit(ops[0]) {
                    em.line(l);
                }
            }
            "IF" => {
                em.line(line);
                em.line("ELSE");
                em.line("CLR");
            }
            "OPR" => {
                arity(4)?;
                opr(&mut em, &ops).map_err(|e| site.error(e))?;
            }
            "FSET" | "FADD" | "FSUB" | "FMUL" | "FDIV" => {
                arity(2)?;
                fixed::lower_arith(&fixed, mnemonic, ops[0], ops[1], &mut em)
                    .map_err(|e| site.error(e))?;
            }
            "FSHOW" => fixed::lower_show(&fixed, rest, &mut em).map_err(|e| site.error(e))?,
            m if Opcode::from_mnemonic(m).is_some() => em.line(line),
            m => return Err(site.error(ExpandError::UnknownOpcode(m.into()))),
        }
        Ok(em.lines)
    }

    /// Expand a module the first time it is imported and call its START.
    fn import(&mut self, site: &Site, name: &str) -> ExpandResult<Vec<String>> {
        if !is_identifier(name) || name.contains('.') {
            return Err(site.error(ExpandError::InvalidOperand(name.into())));
        }
        if is_reserved(name) {
            return Err(site.error(ExpandError::ReservedName(name.into())));
        }
        if self.importing.iter().any(|m| m == name) {
            let mut chain = self.importing.clone();
            chain.push(name.into());
            return Err(site.error(ExpandError::CyclicImport(chain)));
        }

        if !self.loaded.contains(name) {
            let source = self
                .loader
                .load(name)
                .map_err(|e| {
                    site.error(ExpandError::ModuleUnreadable {
                        name: name.into(),
                        reason: e.to_string(),
                    })
                })?
                .ok_or_else(|| site.error(ExpandError::ModuleNotFound(name.into())))?;
            debug!("Import {} from {}", name, source.unit);

            self.importing.push(name.into());
            let body = self.lower_unit(&source.unit, &source.text, Some(name));
            self.importing.pop();
            let body = body?;

            let start = format!(":{}.START", name);
            if !body.iter().any(|l| l.text == start) {
                return Err(site.error(ExpandError::MissingStart(name.into())));
            }
            self.loaded.insert(name.into());
            self.modules.extend(body);
        }

        Ok(call_unit(&format!("{}.START", name)))
    }
}

fn synthetic(unit: &str, text: String) -> ExpandedLine {
    ExpandedLine {
        text,
        unit: unit.into(),
        line: 0,
    }
}

fn call_unit(target: &str) -> Vec<String> {
    let target = target.strip_prefix(':').unwrap_or(target);
    vec![format!("TAG :{}", target), "SLF".into(), "CALL".into()]
}

/// `OPR op dest a b` as `dest = a op b`.
fn opr(em: &mut Emitter, ops: &[&str]) -> Result<(), ExpandError> {
    let (op, dest, a, b) = (ops[0], ops[1], ops[2], ops[3]);
    if !matches!(op, "ADD" | "SUB" | "MUL" | "DIV") {
        return Err(ExpandError::InvalidOperand(op.into()));
    }

    let scratch = em.sys(OPR);
    em.line(format!("SET {} {}", scratch, a));
    if b.starts_with('#') && matches!(op, "MUL" | "DIV") {
        let rhs = em.sys(OPR_B);
        em.line(format!("SET {} {}", rhs, b));
        em.line(format!("{} {} {}", op, scratch, rhs));
    } else {
        em.line(format!("{} {} {}", op, scratch, b));
    }
    em.line(format!("SET {} {}", dest, scratch));
    Ok(())
}
