//! Request translation pipeline.
//!
//! One entry point takes an HTTP-shaped request and runs it through
//! normalize, resolve, build, execute, reshape, trigger, envelope. Every
//! failure short-circuits into a failure envelope; nothing partial escapes.

use crate::definition::DefinitionStore;
use crate::error::ApiError;
use crate::executor::StatementExecutor;
use crate::reshape::{self, ReshapeSpec};
use crate::response::Envelope;
use crate::sql;
use crate::trigger::TriggerRegistry;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The slice of an HTTP request the engine consumes.
#[derive(Debug, Default)]
pub struct EngineRequest {
    pub method: String,
    pub path: String,
    /// Original URL including the query string, echoed in the envelope.
    pub url: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

/// Split a request path into a route key and an optional record id: a
/// trailing numeric segment becomes the id and is replaced by `{id}`; the
/// whole key is lower-cased to match the snapshot's route map.
pub fn normalize_path(path: &str) -> (String, Option<i64>) {
    let trimmed = path.trim_end_matches('/');
    if let Some((prefix, last)) = trimmed.rsplit_once('/') {
        if let Ok(id) = last.parse::<i64>() {
            return (format!("{}/{{id}}", prefix.to_lowercase()), Some(id));
        }
    }
    (trimmed.to_lowercase(), None)
}

pub struct Engine {
    definitions: Arc<DefinitionStore>,
    triggers: Arc<TriggerRegistry>,
    executor: Arc<dyn StatementExecutor>,
}

impl Engine {
    pub fn new(
        definitions: Arc<DefinitionStore>,
        triggers: Arc<TriggerRegistry>,
        executor: Arc<dyn StatementExecutor>,
    ) -> Self {
        Engine {
            definitions,
            triggers,
            executor,
        }
    }

    /// Translate and execute one request. Always produces an envelope.
    pub async fn process(&self, req: &EngineRequest) -> Envelope {
        match self.run(req).await {
            Ok((result, paging)) => Envelope::success(&req.method, &req.url, result, paging),
            Err(err) => {
                tracing::warn!(method = %req.method, path = %req.path, error = %err, "request failed");
                Envelope::failure(&req.method, &req.url, &err)
            }
        }
    }

    async fn run(
        &self,
        req: &EngineRequest,
    ) -> Result<(Value, Option<reshape::PagingInfo>), ApiError> {
        // Requests keep the snapshot they started with even if a reload
        // lands mid-flight.
        let snapshot = self.definitions.snapshot();
        let method = req.method.to_lowercase();
        let (route_key, id) = normalize_path(&req.path);
        let def = snapshot.resolve(&method, &route_key)?;
        let schema = snapshot.schema(&def.table).ok_or(ApiError::RouteNotFound)?;

        let built = sql::build(
            &method,
            &def.table,
            schema,
            &snapshot,
            &req.query,
            req.body.as_ref(),
            id,
        )?;

        let rows = self.executor.fetch(&built.sql, built.params.params()).await?;

        let mut records = if built.reshape {
            let spec = ReshapeSpec {
                base_table: built.base_table.clone(),
                to_many: built.to_many_tables.clone(),
                to_one: built.to_one_tables.clone(),
            };
            reshape::reshape(&rows, &spec)
        } else {
            rows
        };

        let paging = built.paging.map(|p| reshape::paging_info(&records, p));
        reshape::strip_total_rows(&mut records);

        let result = Value::Array(records.into_iter().map(Value::Object).collect());
        let result = self.triggers.apply(&def.table, &method, result);
        Ok((result, paging))
    }
}
