//! Ordered extension registry attached to an event.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use super::{BoxedExtension, Extension};
use crate::error::AttributeResult;
use crate::foundation::value::{AttributeType, AttributeValue};

/// The ordered set of extensions attached to one event.
///
/// The set tracks which extension first claimed each attribute name, which
/// makes attaching idempotent without comparing extension identities.
#[derive(Clone, Default)]
pub struct ExtensionSet {
    extensions: Vec<BoxedExtension>,
    owners: HashMap<String, usize>,
}

impl ExtensionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from an ordered list.
    pub fn from_slice(extensions: &[BoxedExtension]) -> Self {
        let mut set = Self::new();
        for ext in extensions {
            set.register(ext.clone());
        }
        set
    }

    /// Registers an extension.
    ///
    /// Returns `false` without changing the set when every name the
    /// extension owns is already owned by an extension of the same name.
    pub fn register(&mut self, extension: BoxedExtension) -> bool {
        let names: Vec<String> = extension
            .attribute_names()
            .into_iter()
            .map(str::to_ascii_lowercase)
            .collect();

        let already_bound = !names.is_empty()
            && names.iter().all(|name| {
                self.owners
                    .get(name)
                    .is_some_and(|&idx| self.extensions[idx].name() == extension.name())
            });
        if already_bound {
            trace!(extension = extension.name(), "Extension already attached");
            return false;
        }

        let index = self.extensions.len();
        for name in names {
            self.owners.entry(name).or_insert(index);
        }
        self.extensions.push(extension);
        true
    }

    /// Returns the type the first constraining extension declares for
    /// `name`.
    pub fn attribute_type(&self, name: &str) -> Option<AttributeType> {
        self.extensions
            .iter()
            .find_map(|ext| ext.attribute_type(name))
    }

    /// Runs `value` through the extensions in order.
    ///
    /// Returns `Ok(None)` when every extension declines the name.
    pub fn normalize(
        &self,
        name: &str,
        value: &AttributeValue,
    ) -> AttributeResult<Option<AttributeValue>> {
        for ext in &self.extensions {
            if let Some(normalized) = ext.validate_and_normalize(name, value)? {
                return Ok(Some(normalized));
            }
        }
        Ok(None)
    }

    /// Returns the extension that first claimed `name`.
    pub fn owner_of(&self, name: &str) -> Option<&dyn Extension> {
        let index = *self.owners.get(&name.to_ascii_lowercase())?;
        self.extensions.get(index).map(|ext| ext.as_ref())
    }

    /// Iterates over the extensions in order.
    pub fn iter(&self) -> impl Iterator<Item = &BoxedExtension> {
        self.extensions.iter()
    }

    /// Returns the extensions as a slice.
    pub fn as_slice(&self) -> &[BoxedExtension] {
        &self.extensions
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl fmt::Debug for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.extensions.iter().map(|ext| ext.name()))
            .finish()
    }
}
