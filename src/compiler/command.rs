//! Command compiler
//!
//! Turns a flat `{field name -> JSON value}` body into the ordered field
//! contents of an insert or update.
//!
//! The scan is a fold over the schema in field order:
//! - Omitted required fields with a default take the default
//! - Omitted required fields without one are reported, once each
//! - Present values are type-checked
//! - Unique values are checked against the store while no error is pending
//! - A conflict with another record is fatal and ends the scan
//!
//! Hashing runs only after the scan finished with zero errors, so a rejected
//! or duplicate command never pays for it.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::coerce::content_for;
use super::errors::{CommandRejection, CompileError};
use crate::crypto::Hasher;
use crate::observability::{Logger, ObservationScope};
use crate::schema::FieldDefinition;
use crate::store::{ContentValue, FieldContent, UniquenessChecker};

/// Output of command compilation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledCommand {
    pub record_space: Uuid,
    /// In schema order
    pub field_contents: Vec<FieldContent>,
}

impl CompiledCommand {
    /// True when the body produced no content ("nothing to do")
    pub fn is_empty(&self) -> bool {
        self.field_contents.is_empty()
    }
}

/// Per-call switches
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandOptions {
    /// Partial update: omitted required fields are skipped
    pub required_fields_are_optional: bool,
    /// Record being updated; its own values never count as duplicates
    pub active_record: Option<Uuid>,
    /// Check types, omissions and unknown keys only; no uniqueness lookups,
    /// no hashing (hashed contents stay plaintext)
    pub validate_only: bool,
}

impl CommandOptions {
    pub fn create() -> Self {
        Self::default()
    }

    pub fn update(record: Uuid) -> Self {
        Self {
            required_fields_are_optional: true,
            active_record: Some(record),
            validate_only: false,
        }
    }

    /// Target-independent check of a partial update body
    pub fn validate_update() -> Self {
        Self {
            required_fields_are_optional: true,
            active_record: None,
            validate_only: true,
        }
    }
}

/// Scan state
#[derive(Default)]
struct Fold<'f> {
    wrongly_omitted: Vec<CompileError>,
    validation: Vec<CompileError>,
    pending: Vec<(&'f FieldDefinition, ContentValue)>,
}

impl Fold<'_> {
    fn has_errors(&self) -> bool {
        !self.wrongly_omitted.is_empty() || !self.validation.is_empty()
    }
}

/// Compiles commands against one record space's fields
pub struct CommandCompiler<'a> {
    record_space_id: Uuid,
    record_space_slug: &'a str,
    fields: &'a [FieldDefinition],
    uniqueness: &'a dyn UniquenessChecker,
    hasher: &'a dyn Hasher,
}

impl<'a> CommandCompiler<'a> {
    pub fn new(
        record_space_id: Uuid,
        record_space_slug: &'a str,
        fields: &'a [FieldDefinition],
        uniqueness: &'a dyn UniquenessChecker,
        hasher: &'a dyn Hasher,
    ) -> Self {
        Self {
            record_space_id,
            record_space_slug,
            fields,
            uniqueness,
            hasher,
        }
    }

    pub async fn compile(
        &self,
        body: &Map<String, Value>,
        options: CommandOptions,
    ) -> Result<CompiledCommand, CommandRejection> {
        let field_count = body.len().to_string();
        let scope = ObservationScope::with_fields(
            "COMMAND_COMPILE",
            &[("record_space", self.record_space_slug), ("body_fields", field_count.as_str())],
        );

        match self.compile_inner(body, options).await {
            Ok(compiled) => {
                let contents = compiled.field_contents.len().to_string();
                scope.complete_with_fields(&[("contents", contents.as_str())]);
                Ok(compiled)
            }
            Err(rejection) => {
                scope.fail(&rejection.codes());
                Err(rejection)
            }
        }
    }

    async fn compile_inner(
        &self,
        body: &Map<String, Value>,
        options: CommandOptions,
    ) -> Result<CompiledCommand, CommandRejection> {
        let mut unconsumed = body.clone();
        let mut fold = Fold::default();

        for field in self.fields {
            let supplied = unconsumed.remove(&field.name);

            let value = match supplied {
                Some(value) => value,
                None if field.required && !options.required_fields_are_optional => {
                    match &field.default_value {
                        Some(default) => default.clone(),
                        None => {
                            fold.wrongly_omitted.push(CompileError::MissingRequiredField {
                                field: field.slug.clone(),
                            });
                            continue;
                        }
                    }
                }
                None => continue,
            };

            let content = match content_for(field, &value) {
                Ok(content) => content,
                Err(e) => {
                    fold.validation.push(e);
                    continue;
                }
            };

            if fold.has_errors() {
                continue;
            }

            if field.unique && !options.validate_only {
                self.assert_unique(field, &content, options.active_record)
                    .await
                    .map_err(CommandRejection::Fatal)?;
            }

            fold.pending.push((field, content));
        }

        let mut errors = fold.validation;
        errors.append(&mut fold.wrongly_omitted);
        errors.extend(unconsumed.keys().map(|key| CompileError::UnknownField {
            key: key.clone(),
            record_space: self.record_space_slug.to_string(),
            existing: crate::schema::existing_keys_with_type(self.fields),
        }));

        if !errors.is_empty() {
            return Err(CommandRejection::Rejected(errors));
        }

        let mut field_contents = Vec::with_capacity(fold.pending.len());
        for (field, content) in fold.pending {
            let content = if field.hashed && !options.validate_only {
                self.hash_content(field, content).await?
            } else {
                content
            };
            field_contents.push(FieldContent::new(field.id, content));
        }

        Ok(CompiledCommand {
            record_space: self.record_space_id,
            field_contents,
        })
    }

    async fn assert_unique(
        &self,
        field: &FieldDefinition,
        content: &ContentValue,
        active_record: Option<Uuid>,
    ) -> Result<(), CompileError> {
        let conflict = self
            .uniqueness
            .find_conflict(field, content, active_record)
            .await
            .map_err(|e| CompileError::Collaborator(e.to_string()))?;

        match conflict {
            Some(record) if Some(record) != active_record => {
                Logger::warn(
                    "DUPLICATE_VALUE_REJECTED",
                    &[
                        ("record_space", self.record_space_slug),
                        ("field", field.slug.as_str()),
                        ("conflicting_record", record.to_string().as_str()),
                    ],
                );
                Err(CompileError::DuplicateValue {
                    field: field.name.clone(),
                    conflicting_record: record,
                })
            }
            _ => Ok(()),
        }
    }

    async fn hash_content(
        &self,
        field: &FieldDefinition,
        content: ContentValue,
    ) -> Result<ContentValue, CommandRejection> {
        let plaintext = content.encoded();
        let digest = self.hasher.hash(&plaintext).await.map_err(|e| {
            Logger::error(
                "FIELD_HASH_FAILED",
                &[("record_space", self.record_space_slug), ("field", field.slug.as_str())],
            );
            CommandRejection::Fatal(CompileError::Collaborator(e.to_string()))
        })?;
        Ok(ContentValue::Text(digest))
    }
}
