//! # Record Service
//!
//! Wires the compilers, the hash reconciler, and a record store into the
//! record operations callers use. Every call resolves the record space
//! through the schema provider and passes everything else explicitly.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::errors::ServiceResult;
use crate::compiler::{
    CommandCompiler, CommandOptions, CommandRejection, CompileError, CompiledCommand,
    CompiledQuery, QueryCompiler,
};
use crate::crypto::Hasher;
use crate::observability::{Logger, ObservationScope};
use crate::predicate::Conjunction;
use crate::reconcile::{project, HashReconciler, PublicRecord};
use crate::schema::{FieldDefinition, FieldSchemaProvider, RecordSpace};
use crate::store::{FieldContent, RecordStore, StoreUniquenessChecker, StoredRecord};

/// Record operations over one schema provider and one store
pub struct RecordService {
    schema: Arc<dyn FieldSchemaProvider>,
    store: Arc<dyn RecordStore>,
    hasher: Arc<dyn Hasher>,
    uniqueness: StoreUniquenessChecker,
}

impl RecordService {
    pub fn new(
        schema: Arc<dyn FieldSchemaProvider>,
        store: Arc<dyn RecordStore>,
        hasher: Arc<dyn Hasher>,
    ) -> Self {
        let uniqueness = StoreUniquenessChecker::new(Arc::clone(&store), Arc::clone(&hasher));
        Self {
            schema,
            store,
            hasher,
            uniqueness,
        }
    }

    /// Compile a query without running it
    pub fn compile_query(
        &self,
        space_slug: &str,
        query: &BTreeMap<String, String>,
        mode: Conjunction,
    ) -> ServiceResult<CompiledQuery> {
        let (space, fields) = self.resolve(space_slug)?;
        Ok(QueryCompiler::new(space.id, &space.slug, &fields).compile(query, mode)?)
    }

    /// Compile a create command without persisting it
    pub async fn compile_command(
        &self,
        space_slug: &str,
        body: &Map<String, Value>,
        options: CommandOptions,
    ) -> ServiceResult<CompiledCommand> {
        let (space, fields) = self.resolve(space_slug)?;
        Ok(self.command_compiler(&space, &fields).compile(body, options).await?)
    }

    /// Every record matching the query, projected
    pub async fn find(
        &self,
        space_slug: &str,
        query: &BTreeMap<String, String>,
        mode: Conjunction,
    ) -> ServiceResult<Vec<PublicRecord>> {
        let scope = ObservationScope::with_fields("RECORD_FIND", &[("record_space", space_slug)]);

        match self.find_inner(space_slug, query, mode).await {
            Ok((candidates, records)) => {
                let candidate_count = candidates.to_string();
                let match_count = records.len().to_string();
                scope.complete_with_fields(&[
                    ("candidates", candidate_count.as_str()),
                    ("matches", match_count.as_str()),
                ]);
                Ok(records)
            }
            Err(e) => {
                scope.fail(e.code());
                Err(e)
            }
        }
    }

    async fn find_inner(
        &self,
        space_slug: &str,
        query: &BTreeMap<String, String>,
        mode: Conjunction,
    ) -> ServiceResult<(usize, Vec<PublicRecord>)> {
        let (space, fields) = self.resolve(space_slug)?;
        let compiled = QueryCompiler::new(space.id, &space.slug, &fields).compile(query, mode)?;

        let candidates = self.store.find(&compiled.storage_filter).await?;
        let records = HashReconciler::new(self.hasher.as_ref())
            .reconcile_all(&candidates, &fields, &compiled.hashed_field_matchers)
            .await?;
        Ok((candidates.len(), records))
    }

    /// First record matching the query, if any
    pub async fn find_one(
        &self,
        space_slug: &str,
        query: &BTreeMap<String, String>,
        mode: Conjunction,
    ) -> ServiceResult<Option<PublicRecord>> {
        let (space, fields) = self.resolve(space_slug)?;
        let compiled = QueryCompiler::new(space.id, &space.slug, &fields).compile(query, mode)?;
        let reconciler = HashReconciler::new(self.hasher.as_ref());

        for candidate in self.store.find(&compiled.storage_filter).await? {
            if let Some(public) = reconciler
                .reconcile(&candidate, &fields, &compiled.hashed_field_matchers)
                .await?
            {
                return Ok(Some(public));
            }
        }
        Ok(None)
    }

    /// Create a record; every required field is enforced
    pub async fn create(
        &self,
        space_slug: &str,
        body: &Map<String, Value>,
    ) -> ServiceResult<PublicRecord> {
        let (space, fields) = self.resolve(space_slug)?;
        let compiled = self
            .command_compiler(&space, &fields)
            .compile(body, CommandOptions::create())
            .await?;

        let record = self
            .store
            .insert(StoredRecord::new(space.id, compiled.field_contents))
            .await?;

        Logger::info(
            "RECORD_CREATED",
            &[
                ("record_space", space.slug.as_str()),
                ("record", record.id.to_string().as_str()),
            ],
        );
        Ok(project(&record, &fields))
    }

    /// Partially update every record matching the query.
    ///
    /// Supplied values replace stored ones; untouched fields keep their
    /// content. The rewritten content list follows schema order.
    ///
    /// The body is validated before any record is fetched, and every target
    /// compiles before the first write, so a rejected update changes nothing.
    pub async fn update(
        &self,
        space_slug: &str,
        query: &BTreeMap<String, String>,
        mode: Conjunction,
        body: &Map<String, Value>,
    ) -> ServiceResult<Vec<PublicRecord>> {
        let (space, fields) = self.resolve(space_slug)?;
        let compiler = self.command_compiler(&space, &fields);

        let validated = compiler
            .compile(body, CommandOptions::validate_update())
            .await?;
        let targets = self.matching(&space, &fields, query, mode).await?;

        if targets.len() > 1 {
            if let Some(field) = unique_field_set(&fields, &validated) {
                Logger::warn(
                    "UNIQUE_VALUE_ON_MANY_RECORDS",
                    &[
                        ("field", field.slug.as_str()),
                        ("record_space", space.slug.as_str()),
                        ("targets", targets.len().to_string().as_str()),
                    ],
                );
                return Err(CommandRejection::Fatal(CompileError::DuplicateValue {
                    field: field.name.clone(),
                    conflicting_record: targets[0].id,
                })
                .into());
            }
        }

        let mut planned = Vec::with_capacity(targets.len());
        for target in targets {
            let compiled = if validated.is_empty() {
                validated.clone()
            } else {
                compiler
                    .compile(body, CommandOptions::update(target.id))
                    .await?
            };
            planned.push((target, compiled));
        }

        let mut updated = Vec::with_capacity(planned.len());
        for (target, compiled) in planned {
            if compiled.is_empty() {
                updated.push(project(&target, &fields));
                continue;
            }

            let merged = merge_contents(&fields, &target, compiled.field_contents);
            let record = self.store.replace_contents(target.id, merged).await?;
            Logger::info(
                "RECORD_UPDATED",
                &[
                    ("record_space", space.slug.as_str()),
                    ("record", record.id.to_string().as_str()),
                ],
            );
            updated.push(project(&record, &fields));
        }
        Ok(updated)
    }

    /// Delete every record matching the query, returning how many went
    pub async fn delete(
        &self,
        space_slug: &str,
        query: &BTreeMap<String, String>,
        mode: Conjunction,
    ) -> ServiceResult<usize> {
        let (space, fields) = self.resolve(space_slug)?;
        let targets = self.matching(&space, &fields, query, mode).await?;

        let mut deleted = 0;
        for target in targets {
            if self.store.delete(target.id).await? {
                deleted += 1;
            }
        }

        Logger::info(
            "RECORDS_DELETED",
            &[
                ("count", deleted.to_string().as_str()),
                ("record_space", space.slug.as_str()),
            ],
        );
        Ok(deleted)
    }

    fn resolve(&self, space_slug: &str) -> ServiceResult<(RecordSpace, Vec<FieldDefinition>)> {
        let space = self.schema.record_space(space_slug)?;
        let fields = self.schema.get_fields(space.id)?;
        Ok((space, fields))
    }

    fn command_compiler<'a>(
        &'a self,
        space: &'a RecordSpace,
        fields: &'a [FieldDefinition],
    ) -> CommandCompiler<'a> {
        CommandCompiler::new(
            space.id,
            &space.slug,
            fields,
            &self.uniqueness,
            self.hasher.as_ref(),
        )
    }

    /// Stored records matching the query after hash reconciliation
    async fn matching(
        &self,
        space: &RecordSpace,
        fields: &[FieldDefinition],
        query: &BTreeMap<String, String>,
        mode: Conjunction,
    ) -> ServiceResult<Vec<StoredRecord>> {
        let compiled = QueryCompiler::new(space.id, &space.slug, fields).compile(query, mode)?;
        let reconciler = HashReconciler::new(self.hasher.as_ref());

        let mut matched = Vec::new();
        for candidate in self.store.find(&compiled.storage_filter).await? {
            if reconciler
                .reconcile(&candidate, fields, &compiled.hashed_field_matchers)
                .await?
                .is_some()
            {
                matched.push(candidate);
            }
        }
        Ok(matched)
    }
}

/// First unique field the command writes, if any
fn unique_field_set<'f>(
    fields: &'f [FieldDefinition],
    command: &CompiledCommand,
) -> Option<&'f FieldDefinition> {
    fields
        .iter()
        .filter(|field| field.unique)
        .find(|field| command.field_contents.iter().any(|c| c.field == field.id))
}

/// New contents override stored ones; result is in schema order and drops
/// content for fields no longer in the schema.
fn merge_contents(
    fields: &[FieldDefinition],
    existing: &StoredRecord,
    mut supplied: Vec<FieldContent>,
) -> Vec<FieldContent> {
    let mut merged = Vec::with_capacity(fields.len());
    for field in fields {
        if let Some(pos) = supplied.iter().position(|c| c.field == field.id) {
            merged.push(supplied.swap_remove(pos));
        } else if let Some(content) = existing.content_for(field.id) {
            merged.push(FieldContent::new(field.id, content.clone()));
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ContentValue;
    use uuid::Uuid;

    #[test]
    fn test_merge_contents_keeps_schema_order() {
        let fields = vec![
            FieldDefinition::text("a"),
            FieldDefinition::text("b"),
            FieldDefinition::text("c"),
        ];
        let existing = StoredRecord::new(
            Uuid::new_v4(),
            vec![
                FieldContent::text(fields[0].id, "old-a"),
                FieldContent::text(fields[2].id, "old-c"),
                FieldContent::text(Uuid::new_v4(), "dropped"),
            ],
        );

        let merged = merge_contents(
            &fields,
            &existing,
            vec![
                FieldContent::text(fields[2].id, "new-c"),
                FieldContent::text(fields[1].id, "new-b"),
            ],
        );

        let values: Vec<_> = merged.iter().map(|c| c.content.clone()).collect();
        assert_eq!(
            values,
            vec![
                ContentValue::Text("old-a".into()),
                ContentValue::Text("new-b".into()),
                ContentValue::Text("new-c".into()),
            ]
        );
    }
}
