use std::collections::HashMap;

use super::LabelError;

/// Maps label names to the place they resolve to.  A label is written once,
/// when it is first encountered, and is read any number of times after.
///
/// `T` is whatever a backend jumps to: a statement index for the emulator or
/// a grid coordinate for the spatial backend.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelTable<T> {
    index: HashMap<String, usize>,
    entries: Vec<Entry<T>>,
}

#[derive(Clone, Debug, PartialEq)]
struct Entry<T> {
    name: String,
    target: T,
    line: u32,
}

impl<T> Default for LabelTable<T> {
    fn default() -> Self {
        LabelTable {
            index: HashMap::new(),
            entries: vec![],
        }
    }
}

impl<T> LabelTable<T> {
    pub fn new() -> LabelTable<T> {
        Self::default()
    }

    /// Define `name`.  Fails if the label was already defined, leaving the
    /// first definition in place.
    pub fn insert(&mut self, name: &str, target: T, line: u32) -> Result<(), LabelError> {
        if let Some(&idx) = self.index.get(name) {
            return Err(LabelError::Duplicate {
                name: name.into(),
                first_line: self.entries[idx].line,
            });
        }

        self.index.insert(name.into(), self.entries.len());
        self.entries.push(Entry {
            name: name.into(),
            target,
            line,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&idx| &self.entries[idx].target)
    }

    /// Like [`get`](Self::get) but reports a missing label as an error.
    pub fn resolve(&self, name: &str) -> Result<&T, LabelError> {
        self.get(name)
            .ok_or_else(|| LabelError::Undefined(name.into()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels in the order they were defined.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.target))
    }
}
