//! Query and command compilers for recordspace
//!
//! Both compilers take the record space's ordered field definitions as a
//! plain argument and hold no state between calls.
//!
//! ```ignore
//! let compiled = QueryCompiler::new(space.id, &space.slug, &space.fields)
//!     .compile(&query, Conjunction::And)?;
//! let records = store.find(&compiled.storage_filter).await?;
//! ```

mod coerce;
mod command;
mod errors;
mod query;

pub use coerce::{canonical_json, coerce_query_value, content_for};
pub use command::{CommandCompiler, CommandOptions, CompiledCommand};
pub use errors::{CommandRejection, CompileError, CompileResult};
pub use query::{CompiledQuery, HashedFieldMatcher, NormalizedQuery, QueryCompiler};
