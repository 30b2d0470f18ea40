//! scaffold
//!
//! Create a new project from a template directory.
//!
//! # Flow
//!
//! 1. Choose a configured template (or take `--template`)
//! 2. Ask for the project name; it must not already exist as a directory
//! 3. Copy the template tree into `<base>/<name>`
//! 4. Set `name` in `package.json`, keeping every other key in place
//! 5. Run `npm install` in the new directory unless skipped
//!
//! A failed install is reported as a failed outcome. The copied tree is
//! left in place so the install can be retried by hand.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::core::config::TemplateConfig;
use crate::engine::report::{self, Classification};
use crate::engine::Outcome;
use crate::git::{CommandRunner, RunOptions};
use crate::ui::prompts::{choose_one, Choice, PromptError, Prompter};

/// Directories never copied out of a template.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

/// Manifest whose `name` is rewritten.
pub const MANIFEST: &str = "package.json";

/// Errors from scaffolding.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// No `[[templates]]` entries are configured.
    #[error("no project templates configured; add a [[templates]] entry to the config file")]
    NoTemplates,

    /// `--template` named something that is not configured.
    #[error("unknown template '{name}', expected one of: {available}")]
    UnknownTemplate {
        /// Requested name
        name: String,
        /// Configured names
        available: String,
    },

    /// The template directory does not exist.
    #[error("template directory '{}' does not exist", path.display())]
    TemplateMissing {
        /// Configured path
        path: PathBuf,
    },

    /// The project name was rejected.
    #[error("invalid project name '{name}': {reason}")]
    InvalidName {
        /// Requested name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Walking the template failed.
    #[error("failed to read template: {0}")]
    Walk(#[from] walkdir::Error),

    /// Copying a file failed.
    #[error("failed to copy '{}': {source}", path.display())]
    Copy {
        /// File being written
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// `package.json` could not be read or rewritten.
    #[error("failed to update '{}': {message}", path.display())]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// The operator could not be asked.
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// What the caller already knows about the project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRequest {
    /// Template name; asked for when `None`
    pub template: Option<String>,
    /// Project name; asked for when `None`
    pub name: Option<String>,
    /// Skip `npm install`
    pub skip_install: bool,
}

/// Creates projects under a base directory.
pub struct Scaffolder<'a> {
    runner: &'a dyn CommandRunner,
    prompter: &'a dyn Prompter,
    base_dir: PathBuf,
}

impl<'a> Scaffolder<'a> {
    /// Scaffolder creating projects inside `base_dir`.
    pub fn new(
        runner: &'a dyn CommandRunner,
        prompter: &'a dyn Prompter,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            prompter,
            base_dir: base_dir.into(),
        }
    }

    /// Run the whole flow.
    ///
    /// # Errors
    ///
    /// Returns [`ScaffoldError`] when the template or name is unusable or
    /// the copy fails. Install problems are a failed [`Outcome`] instead.
    pub fn create(
        &self,
        templates: &[TemplateConfig],
        request: &ProjectRequest,
    ) -> Result<Outcome, ScaffoldError> {
        let template = self.select_template(templates, request.template.as_deref())?;
        if !template.path.is_dir() {
            return Err(ScaffoldError::TemplateMissing {
                path: template.path.clone(),
            });
        }

        let name = self.project_name(request.name.as_deref())?;
        let target = self.base_dir.join(&name);

        let copied = copy_tree(&template.path, &target)?;
        info!(template = %template.name, target = %target.display(), copied, "template copied");

        if rename_package(&target, &name)? {
            debug!(%name, "package.json name updated");
        }

        if request.skip_install {
            return Ok(Outcome::succeeded(format!(
                "Created {} at {} (install skipped)",
                name,
                target.display()
            )));
        }

        let install = self.runner.run(
            "npm",
            &["install"],
            &RunOptions::in_dir(Some(&target)).interactive(),
        );
        let report = report::classify("npm install", &install);
        match report.classification {
            Classification::Success => Ok(Outcome::succeeded(format!(
                "Created {} at {}",
                name,
                target.display()
            ))),
            _ => Ok(Outcome::failed(format!(
                "project copied to {} but {}",
                target.display(),
                report.failure_text()
            ))),
        }
    }

    fn select_template<'t>(
        &self,
        templates: &'t [TemplateConfig],
        requested: Option<&str>,
    ) -> Result<&'t TemplateConfig, ScaffoldError> {
        if templates.is_empty() {
            return Err(ScaffoldError::NoTemplates);
        }
        match requested {
            Some(name) => templates.iter().find(|t| t.name == name).ok_or_else(|| {
                ScaffoldError::UnknownTemplate {
                    name: name.to_string(),
                    available: templates
                        .iter()
                        .map(|t| t.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                }
            }),
            None => {
                let options = templates
                    .iter()
                    .map(|t| Choice::new(t.name.clone(), t))
                    .collect();
                Ok(choose_one(
                    self.prompter,
                    "Which template do you want to use?",
                    options,
                )?)
            }
        }
    }

    fn project_name(&self, given: Option<&str>) -> Result<String, ScaffoldError> {
        let base = self.base_dir.as_path();
        match given {
            Some(name) => {
                validate_project_name(base, name).map_err(|reason| {
                    ScaffoldError::InvalidName {
                        name: name.to_string(),
                        reason,
                    }
                })?;
                Ok(name.trim().to_string())
            }
            None => {
                let validate = |input: &str| validate_project_name(base, input);
                let name = self
                    .prompter
                    .ask_text("What is the name of your new project?", &validate)?;
                Ok(name.trim().to_string())
            }
        }
    }
}

/// Check that `name` can become a new directory under `base`.
pub fn validate_project_name(base: &Path, name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("a project name is required".to_string());
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err("the name must be a single directory name".to_string());
    }
    if base.join(name).exists() {
        return Err(format!("'{}' already exists", name));
    }
    Ok(())
}

/// Copy a directory tree, skipping VCS and dependency directories.
///
/// Returns the number of files copied.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize, ScaffoldError> {
    let mut copied = 0;
    let walker = WalkDir::new(from).into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !(entry.file_type().is_dir()
                && SKIPPED_DIRS.iter().any(|skip| entry.file_name() == *skip))
    });

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| ScaffoldError::Copy {
                path: entry.path().to_path_buf(),
                source: io::Error::new(io::ErrorKind::Other, e.to_string()),
            })?;
        let dest = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|source| ScaffoldError::Copy {
                path: dest.clone(),
                source,
            })?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|source| ScaffoldError::Copy {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::copy(entry.path(), &dest).map_err(|source| ScaffoldError::Copy {
                path: dest.clone(),
                source,
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Set `name` in `<dir>/package.json` if the file exists.
///
/// Key order is preserved. Returns whether a manifest was rewritten.
pub fn rename_package(dir: &Path, name: &str) -> Result<bool, ScaffoldError> {
    let path = dir.join(MANIFEST);
    if !path.exists() {
        return Ok(false);
    }
    let manifest_error = |message: String| ScaffoldError::Manifest {
        path: path.clone(),
        message,
    };

    let text = fs::read_to_string(&path).map_err(|e| manifest_error(e.to_string()))?;
    let mut manifest: Value =
        serde_json::from_str(&text).map_err(|e| manifest_error(e.to_string()))?;
    let object = manifest
        .as_object_mut()
        .ok_or_else(|| manifest_error("top level is not an object".to_string()))?;
    object.insert("name".to_string(), Value::String(name.to_string()));

    let mut out =
        serde_json::to_string_pretty(&manifest).map_err(|e| manifest_error(e.to_string()))?;
    out.push('\n');
    fs::write(&path, out).map_err(|e| manifest_error(e.to_string()))?;
    Ok(true)
}
