//! In-memory record store implementing [`RecordClient`] for tests

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::client::{FieldInfo, RecordClient, RecordId, RecordValues, RemoteCallError};
use super::domain::{Domain, Filter, Operator};

#[derive(Default)]
struct State {
    models: HashMap<String, BTreeMap<RecordId, RecordValues>>,
    next_id: RecordId,
    /// (model, field) -> comodel receiving `[0, 0, values]` children
    comodels: HashMap<(String, String), String>,
    fields: HashMap<String, BTreeMap<String, FieldInfo>>,
    failing: HashSet<(String, String)>,
    create_calls: usize,
    write_calls: usize,
}

#[derive(Default)]
pub struct MemoryClient {
    state: Mutex<State>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `[0, 0, values]` commands on `model.field` into `comodel`
    pub fn with_comodel(self, model: &str, field: &str, comodel: &str) -> Self {
        self.lock()
            .comodels
            .insert((model.to_string(), field.to_string()), comodel.to_string());
        self
    }

    /// Answer `fields_get` for `model` with the given `(name, type)` pairs
    pub fn with_fields(self, model: &str, fields: &[(&str, &str)]) -> Self {
        let map = fields
            .iter()
            .map(|(name, field_type)| {
                (
                    name.to_string(),
                    FieldInfo {
                        string: name.to_string(),
                        field_type: field_type.to_string(),
                        readonly: false,
                        required: false,
                        relation: None,
                    },
                )
            })
            .collect();
        self.lock().fields.insert(model.to_string(), map);
        self
    }

    /// Make every `method` call on `model` fail
    pub fn failing(self, model: &str, method: &str) -> Self {
        self.lock()
            .failing
            .insert((model.to_string(), method.to_string()));
        self
    }

    /// Seed a record without counting it as a create call
    pub fn insert(&self, model: &str, values: Value) -> RecordId {
        let mut state = self.lock();
        let values = values.as_object().cloned().unwrap_or_default();
        state.insert_record(model, values)
    }

    pub fn count(&self, model: &str) -> usize {
        self.lock().models.get(model).map_or(0, |m| m.len())
    }

    pub fn records(&self, model: &str) -> Vec<RecordValues> {
        self.lock()
            .models
            .get(model)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, model: &str, id: RecordId) -> Option<RecordValues> {
        self.lock().models.get(model).and_then(|m| m.get(&id).cloned())
    }

    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    pub fn write_calls(&self) -> usize {
        self.lock().write_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl State {
    fn check(&self, model: &str, method: &str) -> Result<(), RemoteCallError> {
        if self.failing.contains(&(model.to_string(), method.to_string())) {
            return Err(RemoteCallError::new(model, method, "simulated failure"));
        }
        Ok(())
    }

    fn insert_record(&mut self, model: &str, values: RecordValues) -> RecordId {
        self.next_id += 1;
        let id = self.next_id;
        let mut record = RecordValues::new();
        record.insert("id".into(), Value::from(id));
        self.models
            .entry(model.to_string())
            .or_default()
            .insert(id, record);
        self.apply(model, id, values);
        id
    }

    fn apply(&mut self, model: &str, id: RecordId, values: RecordValues) {
        for (field, value) in values {
            let stored = match as_commands(&value) {
                Some(commands) => {
                    let current = self
                        .models
                        .get(model)
                        .and_then(|m| m.get(&id))
                        .and_then(|r| r.get(&field))
                        .cloned();
                    self.apply_commands(model, &field, current, commands)
                }
                None => value,
            };
            if let Some(record) = self.models.get_mut(model).and_then(|m| m.get_mut(&id)) {
                record.insert(field, stored);
            }
        }
    }

    fn apply_commands(
        &mut self,
        model: &str,
        field: &str,
        current: Option<Value>,
        commands: Vec<Vec<Value>>,
    ) -> Value {
        let mut ids: Vec<Value> = current
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default();

        for command in commands {
            match command.first().and_then(|c| c.as_i64()) {
                Some(0) => {
                    let comodel = self
                        .comodels
                        .get(&(model.to_string(), field.to_string()))
                        .cloned()
                        .unwrap_or_else(|| format!("{}.{}", model, field));
                    let child = command
                        .get(2)
                        .and_then(|v| v.as_object())
                        .cloned()
                        .unwrap_or_default();
                    let child_id = self.insert_record(&comodel, child);
                    ids.push(Value::from(child_id));
                }
                Some(4) => {
                    if let Some(target) = command.get(1) {
                        if !ids.contains(target) {
                            ids.push(target.clone());
                        }
                    }
                }
                Some(6) => {
                    ids = command
                        .get(2)
                        .and_then(|v| v.as_array())
                        .cloned()
                        .unwrap_or_default();
                }
                _ => {}
            }
        }
        Value::Array(ids)
    }
}

/// Relation command lists look like `[[6, 0, [1, 2]], [0, 0, {...}]]`
fn as_commands(value: &Value) -> Option<Vec<Vec<Value>>> {
    let list = value.as_array()?;
    if list.is_empty() {
        return None;
    }
    list.iter()
        .map(|item| {
            let command = item.as_array()?;
            command.first()?.as_i64()?;
            Some(command.clone())
        })
        .collect()
}

fn matches(record: &RecordValues, filter: &Filter) -> bool {
    let actual = record.get(&filter.field).unwrap_or(&Value::Null);
    match filter.operator {
        Operator::Eq => actual == &filter.value,
        Operator::NotEq => actual != &filter.value,
        Operator::ILike => match (actual.as_str(), filter.value.as_str()) {
            (Some(actual), Some(needle)) => {
                actual.to_lowercase().contains(&needle.to_lowercase())
            }
            _ => false,
        },
        Operator::In => filter
            .value
            .as_array()
            .is_some_and(|values| values.contains(actual)),
    }
}

#[async_trait]
impl RecordClient for MemoryClient {
    async fn search(
        &self,
        model: &str,
        domain: &Domain,
        limit: Option<usize>,
    ) -> Result<Vec<RecordId>, RemoteCallError> {
        let state = self.lock();
        state.check(model, "search")?;
        let Some(records) = state.models.get(model) else {
            return Ok(Vec::new());
        };
        let ids = records
            .iter()
            .filter(|(_, record)| domain.filters().iter().all(|f| matches(record, f)))
            .map(|(id, _)| *id)
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        Ok(ids)
    }

    async fn read(
        &self,
        model: &str,
        ids: &[RecordId],
        fields: &[&str],
    ) -> Result<Vec<RecordValues>, RemoteCallError> {
        let state = self.lock();
        state.check(model, "read")?;
        let Some(records) = state.models.get(model) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| records.get(id))
            .map(|record| {
                let mut row = RecordValues::new();
                row.insert("id".into(), record["id"].clone());
                for field in fields {
                    let value = record.get(*field).cloned().unwrap_or(Value::Bool(false));
                    row.insert(field.to_string(), value);
                }
                row
            })
            .collect())
    }

    async fn create(&self, model: &str, values: &RecordValues) -> Result<RecordId, RemoteCallError> {
        let mut state = self.lock();
        state.create_calls += 1;
        state.check(model, "create")?;
        Ok(state.insert_record(model, values.clone()))
    }

    async fn write(
        &self,
        model: &str,
        ids: &[RecordId],
        values: &RecordValues,
    ) -> Result<bool, RemoteCallError> {
        let mut state = self.lock();
        state.write_calls += 1;
        state.check(model, "write")?;
        for id in ids {
            let exists = state.models.get(model).is_some_and(|m| m.contains_key(id));
            if !exists {
                return Err(RemoteCallError::new(
                    model,
                    "write",
                    format!("record {} does not exist", id),
                ));
            }
            state.apply(model, *id, values.clone());
        }
        Ok(true)
    }

    async fn fields_get(&self, model: &str) -> Result<BTreeMap<String, FieldInfo>, RemoteCallError> {
        let state = self.lock();
        state.check(model, "fields_get")?;
        Ok(state.fields.get(model).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_relation_commands() {
        let client = MemoryClient::new().with_comodel(
            "product.template",
            "seller_ids",
            "product.supplierinfo",
        );
        let id = client.insert("product.template", json!({"name": "Widget"}));

        let values = json!({
            "route_ids": [[6, 0, [3, 4]]],
            "seller_ids": [[0, 0, {"partner_id": 9}]],
            "optional_product_ids": [[4, 11, 0], [4, 11, 0]]
        });
        client
            .write("product.template", &[id], values.as_object().unwrap())
            .await
            .unwrap();

        let record = client.get("product.template", id).unwrap();
        assert_eq!(record["route_ids"], json!([3, 4]));
        assert_eq!(record["optional_product_ids"], json!([11]));
        assert_eq!(client.count("product.supplierinfo"), 1);
    }

    #[tokio::test]
    async fn test_search_filters() {
        let client = MemoryClient::new();
        client.insert("stock.route", json!({"name": "Receive in 2 steps"}));
        client.insert("stock.route", json!({"name": "Buy"}));

        let ids = client
            .search("stock.route", &Filter::ilike("name", "receive").into(), None)
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);

        let all = client.search("stock.route", &Domain::all(), None).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
