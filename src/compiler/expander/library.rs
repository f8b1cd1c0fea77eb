use super::{ModuleLoader, ModuleSource};

/// Source of a module which ships with the toolchain.
pub fn builtin(name: &str) -> Option<&'static str> {
    match name {
        "MATH" => Some(include_str!("library/math.sasm")),
        _ => None,
    }
}

/// Finds only the built-in modules.
#[derive(Clone, Copy, Debug, Default)]
pub struct Library;

impl ModuleLoader for Library {
    fn load(&self, name: &str) -> std::io::Result<Option<ModuleSource>> {
        Ok(builtin(&name.to_ascii_uppercase()).map(|text| ModuleSource {
            unit: format!("<library>/{}", name),
            text: text.into(),
        }))
    }
}
