//! Record space loader and in-memory registry
//!
//! - Record spaces stored at metadata/record_spaces/<slug>.json
//! - One file per record space
//! - Unreadable or malformed files cause startup failure (FATAL)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use super::errors::{SchemaError, SchemaResult};
use super::provider::FieldSchemaProvider;
use super::types::{FieldDefinition, RecordSpace};
use crate::observability::Logger;

/// Loads record spaces from disk and keeps them indexed by slug.
pub struct SchemaLoader {
    /// Directory containing record space files
    space_dir: PathBuf,
    /// Registered record spaces indexed by slug
    spaces: BTreeMap<String, RecordSpace>,
}

impl SchemaLoader {
    /// Creates a loader for the given data directory.
    ///
    /// Record space files are expected at `<data_dir>/metadata/record_spaces/`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            space_dir: data_dir.join("metadata").join("record_spaces"),
            spaces: BTreeMap::new(),
        }
    }

    /// Returns the record space directory path.
    pub fn space_dir(&self) -> &Path {
        &self.space_dir
    }

    /// Loads every record space file from the directory.
    pub fn load_all(&mut self) -> SchemaResult<()> {
        if !self.space_dir.exists() {
            fs::create_dir_all(&self.space_dir).map_err(|e| {
                SchemaError::unreadable(
                    self.space_dir.display().to_string(),
                    format!("Failed to create record space directory: {}", e),
                )
            })?;
            return Ok(());
        }

        let entries = fs::read_dir(&self.space_dir).map_err(|e| {
            SchemaError::unreadable(
                self.space_dir.display().to_string(),
                format!("Failed to read record space directory: {}", e),
            )
        })?;

        // Sorted so duplicate-slug failures are reported deterministically
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::unreadable(
                    self.space_dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            self.load_space_file(&path)?;
        }

        Logger::info(
            "RECORD_SPACES_LOADED",
            &[("count", self.spaces.len().to_string().as_str())],
        );

        Ok(())
    }

    fn load_space_file(&mut self, path: &Path) -> SchemaResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::unreadable(path.display().to_string(), format!("Failed to read file: {}", e))
        })?;

        let space: RecordSpace = serde_json::from_str(&content).map_err(|e| {
            SchemaError::unreadable(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        space
            .validate_structure()
            .map_err(|e| SchemaError::unreadable(path.display().to_string(), e))?;

        if self.spaces.contains_key(&space.slug) {
            return Err(SchemaError::unreadable(
                path.display().to_string(),
                format!("Record space slug '{}' defined twice", space.slug),
            ));
        }

        self.spaces.insert(space.slug.clone(), space);
        Ok(())
    }

    /// Registers a record space directly.
    pub fn register(&mut self, space: RecordSpace) -> SchemaResult<()> {
        space
            .validate_structure()
            .map_err(|e| SchemaError::malformed(&space.slug, e))?;

        if self.spaces.contains_key(&space.slug) {
            return Err(SchemaError::already_exists(&space.slug));
        }

        Logger::info(
            "RECORD_SPACE_REGISTERED",
            &[
                ("fields", space.fields.len().to_string().as_str()),
                ("record_space", space.slug.as_str()),
            ],
        );

        self.spaces.insert(space.slug.clone(), space);
        Ok(())
    }

    /// Gets a record space by slug.
    pub fn get(&self, slug: &str) -> Option<&RecordSpace> {
        self.spaces.get(slug)
    }

    /// Gets a record space by id.
    pub fn get_by_id(&self, id: Uuid) -> Option<&RecordSpace> {
        self.spaces.values().find(|space| space.id == id)
    }

    /// Returns all registered record spaces, ordered by slug.
    pub fn all_spaces(&self) -> impl Iterator<Item = &RecordSpace> {
        self.spaces.values()
    }

    /// Returns the number of registered record spaces.
    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }

    /// Replaces the searchable field list of a record space.
    ///
    /// Every name must be a field of the space. Returns whether the stored
    /// list actually changed.
    pub fn update_searchable_fields(
        &mut self,
        slug: &str,
        searchable_fields: &[String],
    ) -> SchemaResult<bool> {
        let space = self
            .spaces
            .get_mut(slug)
            .ok_or_else(|| SchemaError::not_found(slug))?;

        let invalid: Vec<String> = searchable_fields
            .iter()
            .filter(|name| !space.fields.iter().any(|f| &f.name == *name))
            .cloned()
            .collect();

        if !invalid.is_empty() {
            Logger::warn(
                "SEARCHABLE_FIELDS_INVALID",
                &[("fields", invalid.join(",").as_str()), ("record_space", slug)],
            );
            return Err(SchemaError::invalid_searchable_fields(slug, &invalid));
        }

        let changed = space.searchable_fields.len() != searchable_fields.len()
            || searchable_fields
                .iter()
                .any(|name| !space.searchable_fields.contains(name));

        if changed {
            space.searchable_fields = searchable_fields.to_vec();
            space.updated_at = Utc::now();
            Logger::info("SEARCHABLE_FIELDS_UPDATED", &[("record_space", slug)]);
        }

        Ok(changed)
    }

    /// Saves a record space to disk, overwriting an earlier file for the same slug.
    pub fn save_space(&self, space: &RecordSpace) -> SchemaResult<PathBuf> {
        let path = self.space_dir.join(format!("{}.json", space.slug));

        if !self.space_dir.exists() {
            fs::create_dir_all(&self.space_dir).map_err(|e| {
                SchemaError::unreadable(
                    self.space_dir.display().to_string(),
                    format!("Failed to create record space directory: {}", e),
                )
            })?;
        }

        let content = serde_json::to_string_pretty(space).map_err(|e| {
            SchemaError::unreadable(
                path.display().to_string(),
                format!("Failed to serialize record space: {}", e),
            )
        })?;

        fs::write(&path, content).map_err(|e| {
            SchemaError::unreadable(path.display().to_string(), format!("Failed to write file: {}", e))
        })?;

        Ok(path)
    }
}

impl FieldSchemaProvider for SchemaLoader {
    fn get_fields(&self, record_space_id: Uuid) -> SchemaResult<Vec<FieldDefinition>> {
        self.get_by_id(record_space_id)
            .map(|space| space.fields.clone())
            .ok_or_else(|| SchemaError::not_found(record_space_id.to_string()))
    }

    fn record_space(&self, slug: &str) -> SchemaResult<RecordSpace> {
        self.get(slug)
            .cloned()
            .ok_or_else(|| SchemaError::not_found(slug))
    }
}
