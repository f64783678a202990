//! Project and solution index.
//!
//! A solution manifest names project directories; each project indexes the
//! source units under its directory and derives a [`Compilation`] from
//! them. Source change events mutate the unit maps through
//! [`Solution::process_change`]; compilations are recomputed lazily by
//! [`Solution::rebuild_all`] so a batch of events costs one rebuild per
//! touched project.

use crate::error::{Error, Result};
use crate::frontend::{self, ast::SourceFile, SyntaxError};
use crate::model::Compilation;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Deserialize;
use smol_str::SmolStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What happened to a source file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

/// A single filesystem event, already filtered to source units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// One parsed source unit. Replaced wholesale on change, never mutated.
#[derive(Debug)]
pub struct CompiledUnit {
    pub path: PathBuf,
    pub text: String,
    pub ast: SourceFile,
    pub errors: Vec<SyntaxError>,
}

impl CompiledUnit {
    fn parse(path: PathBuf, text: String) -> Self {
        let parse = frontend::parse(&text);
        Self {
            path,
            text,
            ast: parse.file,
            errors: parse.errors,
        }
    }
}

/// A project: a named directory of source units and their compilation.
pub struct Project {
    name: SmolStr,
    root: PathBuf,
    units: IndexMap<PathBuf, CompiledUnit>,
    compilation: Compilation,
    dirty: bool,
}

impl Project {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn compilation(&self) -> &Compilation {
        &self.compilation
    }

    pub fn unit_paths(&self) -> impl Iterator<Item = &Path> {
        self.units.keys().map(PathBuf::as_path)
    }

    pub fn unit(&self, path: &Path) -> Option<&CompiledUnit> {
        self.units.get(path)
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }

    fn rebuild(&mut self) {
        self.compilation =
            Compilation::build(self.units.values().map(|u| (u.path.as_path(), &u.ast)));
        self.dirty = false;
    }
}

#[derive(Deserialize)]
struct Manifest {
    projects: Vec<String>,
}

/// The loaded solution: every indexed project plus the manifest root all
/// project directories are resolved against.
pub struct Solution {
    root: PathBuf,
    projects: Vec<Project>,
    verbose: bool,
}

impl Solution {
    /// Loads the manifest at `path`, indexes the selected projects and
    /// parses their units. `filter` is a comma-separated list of glob
    /// patterns over the manifest's project entries; `None` selects all.
    pub fn load(path: &Path, filter: Option<&str>, verbose: bool) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let manifest: Manifest =
            serde_json::from_str(&text).map_err(|e| Error::Manifest {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let patterns = match filter {
            Some(filter) => filter
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| {
                    glob::Pattern::new(p).map_err(|e| Error::Manifest {
                        path: path.to_path_buf(),
                        message: format!("invalid project filter `{p}`: {e}"),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let selected: Vec<&str> = manifest
            .projects
            .iter()
            .map(String::as_str)
            .filter(|entry| patterns.is_empty() || patterns.iter().any(|p| p.matches(entry)))
            .collect();

        let projects: Vec<Project> = selected
            .par_iter()
            .map(|entry| Self::load_project(&root, entry, verbose))
            .collect::<Result<Vec<_>>>()?;

        for project in &projects {
            info!(
                project = project.name(),
                units = project.unit_count(),
                "indexed project"
            );
        }

        Ok(Self {
            root,
            projects,
            verbose,
        })
    }

    fn load_project(solution_root: &Path, entry: &str, verbose: bool) -> Result<Project> {
        let root = solution_root.join(entry);
        // The full manifest entry, so "Server/Core" and "Shared/Core" stay
        // distinct names.
        let name: SmolStr = entry.into();

        let mut paths = Vec::new();
        collect_units(&root, &mut paths)?;
        paths.sort();

        let parsed: Vec<CompiledUnit> = paths
            .into_par_iter()
            .map(|p| {
                let text = fs::read_to_string(&p)?;
                Ok(CompiledUnit::parse(p, text))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut units = IndexMap::new();
        for unit in parsed {
            if verbose && !unit.errors.is_empty() {
                warn!(
                    path = %unit.path.display(),
                    count = unit.errors.len(),
                    "syntax errors in source unit"
                );
            }
            units.insert(unit.path.clone(), unit);
        }

        let mut project = Project {
            name,
            root,
            units,
            compilation: Compilation::default(),
            dirty: true,
        };
        project.rebuild();
        Ok(project)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Applies one source change to the index. Compilations are left stale
    /// until [`rebuild_all`](Self::rebuild_all).
    pub fn process_change(&mut self, change: &FileChange) -> Result<()> {
        match change.kind {
            ChangeKind::Added => self.apply_upsert(&change.path, true),
            ChangeKind::Changed => self.apply_upsert(&change.path, false),
            ChangeKind::Removed => {
                let mut removed = false;
                for project in &mut self.projects {
                    if project.units.shift_remove(&change.path).is_some() {
                        project.dirty = true;
                        removed = true;
                    }
                }
                if !removed {
                    debug!(path = %change.path.display(), "removal of unindexed unit, ignored");
                }
                Ok(())
            }
        }
    }

    /// Added inserts into the owning project (deepest root containing the
    /// path); Changed replaces in every project already holding it. An
    /// Added path with no owner, or a Changed path nobody holds, is a
    /// logged no-op.
    fn apply_upsert(&mut self, path: &Path, insert: bool) -> Result<()> {
        if insert {
            let owner = self
                .projects
                .iter_mut()
                .filter(|p| p.contains(path))
                .max_by_key(|p| p.root.components().count());
            let Some(project) = owner else {
                debug!(path = %path.display(), "unit outside every project root, ignored");
                return Ok(());
            };
            let text = fs::read_to_string(path)?;
            let unit = CompiledUnit::parse(path.to_path_buf(), text);
            if self.verbose && !unit.errors.is_empty() {
                warn!(
                    path = %path.display(),
                    count = unit.errors.len(),
                    "syntax errors in source unit"
                );
            }
            project.units.insert(path.to_path_buf(), unit);
            project.dirty = true;
            return Ok(());
        }

        if !self.projects.iter().any(|p| p.units.contains_key(path)) {
            debug!(path = %path.display(), "change to unindexed unit, stale event ignored");
            return Ok(());
        }
        let text = fs::read_to_string(path)?;
        for project in &mut self.projects {
            if !project.units.contains_key(path) {
                continue;
            }
            let unit = CompiledUnit::parse(path.to_path_buf(), text.clone());
            if self.verbose && !unit.errors.is_empty() {
                warn!(
                    path = %path.display(),
                    count = unit.errors.len(),
                    "syntax errors in source unit"
                );
            }
            project.units.insert(path.to_path_buf(), unit);
            project.dirty = true;
        }
        Ok(())
    }

    /// Recomputes the compilation of every project touched since the last
    /// rebuild.
    pub fn rebuild_all(&mut self) {
        for project in &mut self.projects {
            if project.dirty {
                debug!(project = project.name(), "recomputing compilation");
                project.rebuild();
            }
        }
    }
}

fn collect_units(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_units(&path, out)?;
        } else if frontend::is_source_path(&path) {
            out.push(path);
        }
    }
    Ok(())
}
