use std::path::{Path, PathBuf};

use log::debug;

use crate::compiler::expander::{Library, ModuleLoader, ModuleSource};

/// Extension of structured source files.
pub const SOURCE_EXT: &str = "sasm";

/// Extension of primitive source files.
pub const PRIMITIVE_EXT: &str = "asm";

/// Whether `path` holds primitive text, which skips expansion.
pub fn is_primitive(path: &Path) -> bool {
    match path.extension() {
        Some(ex) => ex.to_ascii_lowercase() == PRIMITIVE_EXT,
        None => false,
    }
}

/// Name errors in `path` are reported under.
pub fn unit_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Finds modules next to the main source file, falling back to the built in
/// library.  `IMPORT NAME` looks for `NAME.sasm` and then `name.sasm`.
#[derive(Clone, Debug)]
pub struct FsLoader {
    dir: PathBuf,
}

impl FsLoader {
    pub fn new(dir: &Path) -> FsLoader {
        FsLoader { dir: dir.into() }
    }

    /// A loader for the modules of the program in `src`.
    pub fn beside(src: &Path) -> FsLoader {
        FsLoader::new(src.parent().unwrap_or_else(|| Path::new(".")))
    }

    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut files = vec![self.dir.join(format!("{}.{}", name, SOURCE_EXT))];
        let lower = name.to_ascii_lowercase();
        if lower != name {
            files.push(self.dir.join(format!("{}.{}", lower, SOURCE_EXT)));
        }
        files
    }
}

impl ModuleLoader for FsLoader {
    fn load(&self, name: &str) -> std::io::Result<Option<ModuleSource>> {
        for path in self.candidates(name) {
            if path.is_file() {
                debug!("Module {} is {}", name, path.display());
                let text = std::fs::read_to_string(&path)?;
                return Ok(Some(ModuleSource {
                    unit: unit_name(&path),
                    text,
                }));
            }
        }
        Library.load(name)
    }
}
