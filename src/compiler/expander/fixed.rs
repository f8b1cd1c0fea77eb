//! Fixed point numbers are integers scaled by `10^k`.  Addition and
//! subtraction work on the raw values; multiplication and division must
//! re-normalize by the scale.  Both are split into parts so that no
//! intermediate value is much larger than the result.

use std::convert::TryFrom;

use super::{expander::Emitter, ExpandError};

pub const SCALE: &str = "SYS.SCALE";
pub const TEN: &str = "SYS.TEN";
const FIX: &str = "SYS.FIX";
const TEMP: &str = "SYS.FT";
const PART_A: &str = "SYS.FA";
const PART_B: &str = "SYS.FB";
const PART_C: &str = "SYS.FC";
const PART_D: &str = "SYS.FD";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedPoint {
    scale: i32,
    digits: u32,
}

impl FixedPoint {
    /// A scale of `10^digits`, for `digits` from 1 to 9.
    pub fn new(digits: u32) -> Option<FixedPoint> {
        if !(1..=9).contains(&digits) {
            return None;
        }
        Some(FixedPoint {
            scale: 10i32.pow(digits),
            digits,
        })
    }

    pub fn from_scale(scale: i32) -> Option<FixedPoint> {
        (1..=9)
            .find(|&k| 10i32.pow(k) == scale)
            .and_then(FixedPoint::new)
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Scale a decimal literal such as `2.5` or `-0.25` without going
    /// through floating point.  Literals with more significant fractional
    /// digits than the scale holds are rejected.
    pub fn parse(&self, lit: &str) -> Option<i32> {
        let (negative, body) = match lit.strip_prefix('-') {
            Some(b) => (true, b),
            None => (false, lit),
        };
        let (int, frac) = match body.split_once('.') {
            Some((i, f)) if !f.is_empty() => (i, f),
            Some(_) => return None,
            None => (body, ""),
        };
        if int.is_empty() || !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        let k = self.digits as usize;
        let (kept, dropped) = frac.split_at(frac.len().min(k));
        if dropped.bytes().any(|b| b != b'0') {
            return None;
        }

        let mut value: i64 = int.parse().ok()?;
        value = value.checked_mul(self.scale as i64)?;
        if !kept.is_empty() {
            let frac: i64 = format!("{:0<width$}", kept, width = k).parse().ok()?;
            value += frac;
        }
        if negative {
            value = -value;
        }
        i32::try_from(value).ok()
    }
}

/// `FSET`, `FADD`, `FSUB`, `FMUL` and `FDIV`.  `src` is a `#` literal or a
/// slot which already holds a fixed point value.
pub(super) fn lower_arith(
    fp: &FixedPoint,
    mnemonic: &str,
    dest: &str,
    src: &str,
    em: &mut Emitter,
) -> Result<(), ExpandError> {
    let literal = match src.strip_prefix('#') {
        Some(lit) => Some(
            fp.parse(lit)
                .ok_or_else(|| ExpandError::InvalidFixed(src.into()))?,
        ),
        None => None,
    };
    let operand = match literal {
        Some(v) => format!("#{}", v),
        None => src.to_string(),
    };

    match mnemonic {
        "FSET" => em.line(format!("SET {} {}", dest, operand)),
        "FADD" => em.line(format!("ADD {} {}", dest, operand)),
        "FSUB" => em.line(format!("SUB {} {}", dest, operand)),
        "FMUL" => lower_mul(dest, &operand, em),
        _ => lower_div(fp, dest, &operand, em),
    }
    Ok(())
}

/// Emit `hi = floor(src / SCALE)` and `lo = src - hi * SCALE`.
fn split(src: &str, hi: &str, lo: &str, em: &mut Emitter) {
    let scale = em.sys(SCALE);
    let temp = em.sys(TEMP);
    em.line(format!("SET {} {}", hi, src));
    em.line(format!("DIV {} {}", hi, scale));
    em.line(format!("SET {} {}", temp, hi));
    em.line(format!("MUL {} {}", temp, scale));
    em.line(format!("SET {} {}", lo, src));
    em.line(format!("SUB {} {}", lo, temp));
}

/// With `x = xh*S + xl` and `y = yh*S + yl`, `x*y/S` is
/// `xh*yh*S + xh*yl + xl*yh + floor(xl*yl/S)`.  Only the last product
/// depends on both fractions; it stays below `S^2`, which fits for scales
/// up to `10^4`.
fn lower_mul(dest: &str, factor: &str, em: &mut Emitter) {
    let fix = em.sys(FIX);
    let scale = em.sys(SCALE);
    let temp = em.sys(TEMP);
    let (xh, xl) = (em.sys(PART_A), em.sys(PART_B));
    let (yh, yl) = (em.sys(PART_C), em.sys(PART_D));

    // The factor is copied first so that `FMUL X X` still sees the old X.
    em.line(format!("SET {} {}", fix, factor));
    split(dest, &xh, &xl, em);
    split(&fix, &yh, &yl, em);

    em.line(format!("SET {} {}", dest, xh));
    em.line(format!("MUL {} {}", dest, yh));
    em.line(format!("MUL {} {}", dest, scale));
    for (a, b) in &[(&xh, &yl), (&xl, &yh)] {
        em.line(format!("SET {} {}", temp, a));
        em.line(format!("MUL {} {}", temp, b));
        em.line(format!("ADD {} {}", dest, temp));
    }
    em.line(format!("SET {} {}", temp, xl));
    em.line(format!("MUL {} {}", temp, yl));
    em.line(format!("DIV {} {}", temp, scale));
    em.line(format!("ADD {} {}", dest, temp));
}

/// Long division: the integer quotient, then one decimal digit of the
/// remainder at a time, so the largest intermediate is `10 * divisor`.
fn lower_div(fp: &FixedPoint, dest: &str, divisor: &str, em: &mut Emitter) {
    let fix = em.sys(FIX);
    let ten = em.sys(TEN);
    let temp = em.sys(TEMP);
    let quot = em.sys(PART_A);
    let rem = em.sys(PART_B);
    let digit = em.sys(PART_C);

    em.line(format!("SET {} {}", fix, divisor));
    em.line(format!("SET {} {}", quot, dest));
    em.line(format!("DIV {} {}", quot, fix));
    em.line(format!("SET {} {}", temp, quot));
    em.line(format!("MUL {} {}", temp, fix));
    em.line(format!("SET {} {}", rem, dest));
    em.line(format!("SUB {} {}", rem, temp));
    em.line(format!("SET {} {}", dest, quot));

    for _ in 0..fp.digits() {
        em.line(format!("MUL {} {}", rem, ten));
        em.line(format!("SET {} {}", digit, rem));
        em.line(format!("DIV {} {}", digit, fix));
        em.line(format!("SET {} {}", temp, digit));
        em.line(format!("MUL {} {}", temp, fix));
        em.line(format!("SUB {} {}", rem, temp));
        em.line(format!("MUL {} {}", dest, ten));
        em.line(format!("ADD {} {}", dest, digit));
    }
}

/// `FSHOW "template"`: every `{NAME}` is split into its integer part and one
/// scratch variable per fractional digit, which SAY then prints.
pub(super) fn lower_show(
    fp: &FixedPoint,
    template: &str,
    em: &mut Emitter,
) -> Result<(), ExpandError> {
    let malformed = || ExpandError::MalformedTemplate(template.into());
    let inner = template
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(malformed)?;

    let mut said = String::from("SAY \"");
    let mut rest = inner;
    let mut count = 0;
    while let Some(open) = rest.find('{') {
        said.push_str(&rest[..open]);
        let close = rest[open..].find('}').ok_or_else(malformed)? + open;
        let name = rest[open + 1..close].trim();
        if name.is_empty() {
            return Err(malformed());
        }
        said.push_str(&decompose(fp, name, count, em));
        count += 1;
        rest = &rest[close + 1..];
    }
    said.push_str(rest);
    said.push('"');
    em.line(said);
    Ok(())
}

/// Emit the digit extraction for one value and return the text that shows it.
fn decompose(fp: &FixedPoint, name: &str, idx: usize, em: &mut Emitter) -> String {
    let ten = em.sys(TEN);
    let temp = em.sys(TEMP);
    let int = em.sys(&format!("SYS.F{}.INT", idx));
    let rem = em.sys(&format!("SYS.F{}.REM", idx));
    split(name, &int, &rem, em);

    let digits: Vec<String> = (1..=fp.digits())
        .map(|d| em.sys(&format!("SYS.F{}.D{}", idx, d)))
        .collect();
    for d in digits.iter().rev() {
        em.line(format!("SET {} {}", d, rem));
        em.line(format!("DIV {} {}", rem, ten));
        em.line(format!("SET {} {}", temp, rem));
        em.line(format!("MUL {} {}", temp, ten));
        em.line(format!("SUB {} {}", d, temp));
    }

    let mut shown = format!("{{{}}}.", int);
    for d in &digits {
        shown.push_str(&format!("{{{}}}", d));
    }
    shown
}
