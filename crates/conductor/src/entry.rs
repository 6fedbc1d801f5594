//! Entry - one named deployable unit
//!
//! An entry pairs a backend stack name with the template and parameter
//! locators needed to provision it, plus the names of the entries that
//! must exist before it does.

use crate::error::ValidationError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A single deployable unit in a manifest.
///
/// Entries are immutable once constructed; [`Entry::new`] is the only way
/// to build one and rejects malformed field combinations up front, so a
/// collection of entries is always individually well-formed before graph
/// construction looks at the relationships between them.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    name: String,
    stack_name: String,
    template: PathBuf,
    parameters: Option<PathBuf>,
    capabilities: Vec<String>,
    depends_on: Vec<String>,
}

impl Entry {
    /// Construct a validated entry.
    ///
    /// Rejects an empty `name` or `stack_name` and a `depends_on` list
    /// containing the entry's own name. Duplicate dependency names are
    /// dropped, keeping the first occurrence.
    pub fn new(
        name: impl Into<String>,
        stack_name: impl Into<String>,
        template: impl Into<PathBuf>,
        parameters: Option<PathBuf>,
        capabilities: Vec<String>,
        depends_on: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let stack_name = stack_name.into();

        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if stack_name.trim().is_empty() {
            return Err(ValidationError::EmptyStackName { entry: name });
        }

        let mut deps: Vec<String> = Vec::with_capacity(depends_on.len());
        for dep in depends_on {
            if dep == name {
                return Err(ValidationError::SelfDependency { entry: name });
            }
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }

        Ok(Self {
            name,
            stack_name,
            template: template.into(),
            parameters,
            capabilities,
            depends_on: deps,
        })
    }

    /// Unique key of this entry within its manifest
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target resource name at the provisioning backend
    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Opaque template locator, resolved by the backend or a loader beneath it
    pub fn template(&self) -> &Path {
        &self.template
    }

    /// Opaque parameter-file locator, if any
    pub fn parameters(&self) -> Option<&Path> {
        self.parameters.as_deref()
    }

    /// Capability flags forwarded verbatim to the backend
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Names of the entries that must reach a terminal success before this one submits
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }
}
