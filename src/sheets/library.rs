//! Sheet library: named YAML sheet definitions resolved into `Arc<Sheet>`
//! trees.
//!
//! Definitions reference nested sheets by name, so unlike `Arc`-built trees
//! they can form cycles. [`SheetLibrary::resolve`] walks references
//! depth-first and fails with [`EccError::SheetCycle`] naming the full chain.
//! A sheet referenced several times is built once and shared.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::diagnostics::{default_sink, DiagnosticEvent, SharedSink};
use crate::error::{EccError, Result};

use super::registry::TemplateRegistry;
use super::sheet::Sheet;
use super::sheet_def::SheetDef;

/// Sheet definitions indexed by name.
pub struct SheetLibrary {
    defs: BTreeMap<String, SheetDef>,
    sink: SharedSink,
}

impl SheetLibrary {
    pub fn new() -> Self {
        Self::with_sink(default_sink())
    }

    pub fn with_sink(sink: SharedSink) -> Self {
        Self {
            defs: BTreeMap::new(),
            sink,
        }
    }

    /// Add a parsed definition. Names must be unique.
    pub fn add(&mut self, def: SheetDef) -> Result<()> {
        let name = def.name().to_string();
        if self.defs.contains_key(&name) {
            return Err(EccError::DuplicateSheet(name));
        }
        self.defs.insert(name, def);
        Ok(())
    }

    /// Parse and add one definition, returning its name.
    pub fn load_yaml(&mut self, yaml: &str) -> Result<String> {
        let def = SheetDef::from_yaml(yaml)?;
        let name = def.name().to_string();
        self.add(def)?;
        Ok(name)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let def = SheetDef::from_yaml_file(path)?;
        let name = def.name().to_string();
        self.add(def)?;
        Ok(name)
    }

    /// Load every `.yaml`/`.yml` file under `dir`, recursively.
    ///
    /// Files that fail to load are reported as warnings and skipped. A
    /// missing directory loads nothing. Returns the number of sheets added.
    pub fn load_directory(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(0);
        }

        let mut entries = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        let mut count = 0;
        for path in entries {
            if path.is_dir() {
                count += self.load_directory(&path)?;
            } else if path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
            {
                match self.load_file(&path) {
                    Ok(_) => count += 1,
                    Err(e) => self.sink.emit(
                        DiagnosticEvent::warning("skipping sheet file")
                            .with("path", path.display())
                            .with("error", &e),
                    ),
                }
            }
        }
        Ok(count)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&SheetDef> {
        self.defs.get(name)
    }

    /// Known sheet names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Build the sheet tree rooted at `name`.
    pub fn resolve(&self, name: &str, registry: &TemplateRegistry) -> Result<Arc<Sheet>> {
        let mut resolver = Resolver::new(self, registry);
        resolver.build(name)
    }

    /// Build several roots, sharing sub-sheets between them.
    pub fn resolve_many<'n, I>(&self, names: I, registry: &TemplateRegistry) -> Result<Vec<Arc<Sheet>>>
    where
        I: IntoIterator<Item = &'n str>,
    {
        let mut resolver = Resolver::new(self, registry);
        names.into_iter().map(|name| resolver.build(name)).collect()
    }
}

impl Default for SheetLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SheetLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetLibrary")
            .field("sheets", &self.defs.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Depth-first resolution state: the current reference chain and every
/// sheet built so far.
struct Resolver<'l> {
    library: &'l SheetLibrary,
    registry: &'l TemplateRegistry,
    chain: Vec<String>,
    built: HashMap<String, Arc<Sheet>>,
}

impl<'l> Resolver<'l> {
    fn new(library: &'l SheetLibrary, registry: &'l TemplateRegistry) -> Self {
        Self {
            library,
            registry,
            chain: Vec::new(),
            built: HashMap::new(),
        }
    }

    fn build(&mut self, name: &str) -> Result<Arc<Sheet>> {
        if let Some(sheet) = self.built.get(name) {
            return Ok(Arc::clone(sheet));
        }
        if let Some(pos) = self.chain.iter().position(|n| n == name) {
            let mut chain = self.chain[pos..].to_vec();
            chain.push(name.to_string());
            return Err(EccError::SheetCycle { chain });
        }

        let library = self.library;
        let def = library
            .get(name)
            .ok_or_else(|| EccError::SheetNotFound(name.to_string()))?;
        let inner = &def.sheet;

        self.chain.push(name.to_string());
        let mut builder = Sheet::builder(&inner.name);
        for slot in &inner.components {
            let template = slot
                .as_ref()
                .map(|d| self.registry.component_template(d, name))
                .transpose()?;
            builder = builder.component_slot(template);
        }
        for slot in &inner.capabilities {
            let template = slot
                .as_ref()
                .map(|d| self.registry.capability_template(d, name))
                .transpose()?;
            builder = builder.capability_slot(template);
        }
        for slot in &inner.sheets {
            let child = slot.as_deref().map(|child| self.build(child)).transpose()?;
            builder = builder.sheet_slot(child);
        }
        self.chain.pop();

        let sheet = builder.build();
        self.built.insert(name.to_string(), Arc::clone(&sheet));
        Ok(sheet)
    }
}
