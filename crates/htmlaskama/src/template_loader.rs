//! Template loader for resolving `include` / `extends` references.
//!
//! References are resolved against a canonicalized root directory and must
//! stay within it. Loaded documents are cached by reference path.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use htmlaskama_ast::Document;

use crate::error::{HtmlaskamaError, Result};
use crate::outline::Outline;
use crate::validator;

pub struct TemplateLoader {
    root: PathBuf,
    cache: HashMap<String, Document>,
}

impl TemplateLoader {
    /// Create a loader rooted at `root`. The directory must exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root
            .as_ref()
            .canonicalize()
            .map_err(|e| HtmlaskamaError::TemplateError {
                message: format!("invalid template root: {e}"),
            })?;
        Ok(Self {
            root,
            cache: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load and parse the template referenced by `name`, e.g.
    /// `partials/nav.html`. Results are cached.
    pub fn load(&mut self, name: &str) -> Result<&Document> {
        if !self.cache.contains_key(name) {
            let document = self.read_and_parse(name)?;
            self.cache.insert(name.to_string(), document);
        }
        Ok(&self.cache[name])
    }

    /// Every template transitively reachable from `document` through
    /// `extends` and `include` references, in breadth-first order. A visited
    /// set makes reference cycles and diamond includes terminate.
    pub fn linked_templates(&mut self, document: &Document) -> Result<Vec<String>> {
        let mut queue: VecDeque<String> = Outline::of(document).references().into();
        let mut visited: HashSet<String> = HashSet::new();
        let mut order: Vec<String> = Vec::new();

        while let Some(name) = queue.pop_front() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let linked = self.load(&name)?;
            let outline = Outline::of(linked);
            order.push(name);
            for reference in outline.references() {
                if !visited.contains(&reference) {
                    queue.push_back(reference);
                }
            }
        }

        Ok(order)
    }

    fn read_and_parse(&self, name: &str) -> Result<Document> {
        validator::validate_template_path(name)?;
        let path = self.resolve(name)?;
        let source = fs::read_to_string(path)?;
        Ok(htmlaskama_ast::parse(&source)?)
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for segment in name.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        let path = path
            .canonicalize()
            .map_err(|_| HtmlaskamaError::TemplateError {
                message: format!("template not found: {name}"),
            })?;
        if !path.starts_with(&self.root) {
            return Err(HtmlaskamaError::TemplateError {
                message: format!("template '{name}' resolves outside the template root"),
            });
        }
        Ok(path)
    }
}
