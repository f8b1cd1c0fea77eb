use std::collections::HashSet;

use crate::compiler::isa::strip_comment;

use super::{operands, split_mnemonic, ExpandError};

pub const SYSTEM: &str = "SYS";

/// Names under `SYS.` belong to the expander.
pub fn is_reserved(name: &str) -> bool {
    name == SYSTEM || name.starts_with("SYS.")
}

/// The labels and variables a unit declares.  Inside a module each of them
/// is rewritten to `MODULE.NAME`, so that two modules can use the same names
/// without colliding.  The main unit keeps its names as written.
#[derive(Debug)]
pub struct Namespace {
    prefix: Option<String>,
    locals: HashSet<String>,
}

impl Namespace {
    /// Collect the declarations of `text`.  Fails on the first declaration
    /// of a reserved name, with its line.
    pub fn scan(prefix: Option<&str>, text: &str) -> Result<Namespace, (u32, ExpandError)> {
        let mut locals = HashSet::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = strip_comment(raw).trim();
            let declared = match line.strip_prefix(':') {
                Some(label) => Some(label.trim()),
                None => match split_mnemonic(line) {
                    ("VAR", rest) => operands(rest).first().copied(),
                    _ => None,
                },
            };

            if let Some(name) = declared {
                if is_reserved(name) {
                    return Err((idx as u32 + 1, ExpandError::ReservedName(name.into())));
                }
                locals.insert(name.to_string());
            }
        }

        Ok(Namespace {
            prefix: prefix.map(String::from),
            locals,
        })
    }

    pub fn qualify(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) if self.locals.contains(name) => format!("{}.{}", prefix, name),
            _ => name.into(),
        }
    }

    /// Rewrite every local name in an already trimmed, comment free line.
    pub fn rename(&self, line: &str) -> String {
        if self.prefix.is_none() {
            return line.into();
        }
        if let Some(label) = line.strip_prefix(':') {
            return format!(":{}", self.qualify(label.trim()));
        }

        let (mnemonic, rest) = split_mnemonic(line);
        if rest.starts_with('"') {
            return format!("{} {}", mnemonic, self.rename_template(rest));
        }

        let mut out = mnemonic.to_string();
        for tok in operands(rest) {
            out.push(' ');
            match tok.strip_prefix(':') {
                Some(label) => {
                    out.push(':');
                    out.push_str(&self.qualify(label));
                }
                None => out.push_str(&self.qualify(tok)),
            }
        }
        out
    }

    fn rename_template(&self, template: &str) -> String {
        let mut out = String::new();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            let close = match rest[open..].find('}') {
                Some(c) => c + open,
                None => break,
            };
            out.push_str(&rest[..=open]);
            out.push_str(&self.qualify(rest[open + 1..close].trim()));
            rest = &rest[close..];
        }
        out.push_str(rest);
        out
    }
}
