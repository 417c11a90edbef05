//! Qdrant client.
//!
//! Talks to Qdrant over gRPC with `qdrant-client`. Payloads, filters and
//! point ids cross the boundary as JSON on our side and as protobuf values
//! on theirs; the conversions live at the bottom of this file.

use crate::error::{Error, Result};
use qdrant_client::qdrant::{
    self, point_id::PointIdOptions, value::Kind, Condition,
    CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, FieldType, Filter, NamedVectors,
    PointId, Query, QueryPointsBuilder, Range, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder, VectorsConfigBuilder,
};
use qdrant_client::Qdrant;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

use super::{
    Distance, Payload, PayloadSchemaType, PointStruct, QueryRequest, ScoredPoint, VectorParams,
    VectorStore,
};

/// Request timeout for all Qdrant calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Qdrant gRPC client.
pub struct QdrantClient {
    client: Qdrant,
}

impl QdrantClient {
    /// Create a client for the Qdrant instance at `url`.
    ///
    /// No connection is made until the first call.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the URL is not an http(s) URL or the
    /// client cannot be built.
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| Error::Config(format!("Invalid QDRANT_URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Invalid QDRANT_URL '{url}': expected an http or https URL"
            )));
        }

        let mut builder = Qdrant::from_url(url)
            .timeout(REQUEST_TIMEOUT)
            .skip_compatibility_check();
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build Qdrant client: {e}")))?;
        Ok(Self { client })
    }
}

impl VectorStore for QdrantClient {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.client.collection_exists(name).await?)
    }

    async fn create_collection(&self, name: &str, vectors: &BTreeMap<String, VectorParams>) -> Result<()> {
        let mut config = VectorsConfigBuilder::default();
        for (slot, params) in vectors {
            config.add_named_vector_params(
                slot,
                VectorParamsBuilder::new(params.size as u64, qdrant_distance(params.distance)),
            );
        }

        debug!(collection = name, slots = vectors.len(), "Creating Qdrant collection");
        self.client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(config))
            .await?;
        Ok(())
    }

    async fn create_payload_index(
        &self,
        collection: &str,
        field: &str,
        schema: PayloadSchemaType,
    ) -> Result<()> {
        self.client
            .create_field_index(
                CreateFieldIndexCollectionBuilder::new(collection, field, field_type(schema)).wait(true),
            )
            .await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<()> {
        let points: Vec<qdrant::PointStruct> = points.into_iter().map(to_qdrant_point).collect();
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await?;
        Ok(())
    }

    async fn query(&self, collection: &str, request: QueryRequest) -> Result<Vec<ScoredPoint>> {
        let mut builder = QueryPointsBuilder::new(collection)
            .query(Query::new_nearest(request.vector))
            .using(request.using)
            .limit(request.limit as u64)
            .with_payload(true);
        if let Some(filter) = &request.filter {
            builder = builder.filter(filter_from_json(filter)?);
        }

        let response = self.client.query(builder).await?;
        Ok(response.result.into_iter().map(from_qdrant_point).collect())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let response = self.client.list_collections().await?;
        Ok(response.collections.into_iter().map(|c| c.name).collect())
    }
}

fn qdrant_distance(distance: Distance) -> qdrant::Distance {
    match distance {
        Distance::Cosine => qdrant::Distance::Cosine,
        Distance::Euclid => qdrant::Distance::Euclid,
        Distance::Dot => qdrant::Distance::Dot,
        Distance::Manhattan => qdrant::Distance::Manhattan,
    }
}

fn field_type(schema: PayloadSchemaType) -> FieldType {
    match schema {
        PayloadSchemaType::Keyword => FieldType::Keyword,
        PayloadSchemaType::Integer => FieldType::Integer,
        PayloadSchemaType::Float => FieldType::Float,
        PayloadSchemaType::Geo => FieldType::Geo,
        PayloadSchemaType::Text => FieldType::Text,
        PayloadSchemaType::Bool => FieldType::Bool,
        PayloadSchemaType::Datetime => FieldType::Datetime,
        PayloadSchemaType::Uuid => FieldType::Uuid,
    }
}

fn to_qdrant_point(point: PointStruct) -> qdrant::PointStruct {
    let vectors = point
        .vector
        .into_iter()
        .fold(NamedVectors::default(), |named, (slot, vector)| named.add_vector(slot, vector));
    let payload: HashMap<String, QdrantValue> = point
        .payload
        .into_iter()
        .map(|(key, value)| (key, json_to_qdrant_value(value)))
        .collect();
    qdrant::PointStruct::new(point.id, vectors, payload)
}

fn from_qdrant_point(point: qdrant::ScoredPoint) -> ScoredPoint {
    let payload: Payload = point
        .payload
        .into_iter()
        .map(|(key, value)| (key, qdrant_value_to_json(value)))
        .collect();
    ScoredPoint {
        id: point_id_to_json(point.id),
        score: Some(point.score),
        payload: Some(payload),
    }
}

fn point_id_to_json(id: Option<PointId>) -> Value {
    match id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => Value::String(uuid),
        Some(PointIdOptions::Num(num)) => Value::from(num),
        None => Value::Null,
    }
}

/// JSON to protobuf value. Nulls are kept so `metadata: null` survives.
fn json_to_qdrant_value(value: Value) -> QdrantValue {
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Kind::StringValue(s),
        Value::Array(items) => Kind::ListValue(qdrant::ListValue {
            values: items.into_iter().map(json_to_qdrant_value).collect(),
        }),
        Value::Object(map) => Kind::StructValue(qdrant::Struct {
            fields: map
                .into_iter()
                .map(|(key, value)| (key, json_to_qdrant_value(value)))
                .collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

fn qdrant_value_to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::from(i),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(object)) => Value::Object(
            object
                .fields
                .into_iter()
                .map(|(key, value)| (key, qdrant_value_to_json(value)))
                .collect(),
        ),
    }
}

/// Translate a JSON filter in Qdrant's REST shape into a gRPC [`Filter`].
///
/// Supported: `must` / `should` / `must_not` lists of field conditions with
/// `match` (`value`, `any` or `text`) or `range` (`gt`, `gte`, `lt`, `lte`).
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for anything outside that subset.
pub fn filter_from_json(value: &Value) -> Result<Filter> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid_filter("filter must be a JSON object"))?;

    let mut filter = Filter::default();
    for (clause, conditions) in object {
        let conditions = conditions
            .as_array()
            .ok_or_else(|| invalid_filter(format!("'{clause}' must be a list of conditions")))?
            .iter()
            .map(condition_from_json)
            .collect::<Result<Vec<_>>>()?;

        match clause.as_str() {
            "must" => filter.must = conditions,
            "should" => filter.should = conditions,
            "must_not" => filter.must_not = conditions,
            other => return Err(invalid_filter(format!("unsupported clause '{other}'"))),
        }
    }
    Ok(filter)
}

fn condition_from_json(value: &Value) -> Result<Condition> {
    let key = value
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_filter("every condition needs a string 'key'"))?;

    if let Some(spec) = value.get("match") {
        return match_condition(key, spec);
    }
    if let Some(spec) = value.get("range") {
        let bound = |name: &str| spec.get(name).and_then(Value::as_f64);
        return Ok(Condition::range(
            key,
            Range {
                gt: bound("gt"),
                gte: bound("gte"),
                lt: bound("lt"),
                lte: bound("lte"),
            },
        ));
    }
    Err(invalid_filter(format!("condition on '{key}' needs 'match' or 'range'")))
}

fn match_condition(key: &str, spec: &Value) -> Result<Condition> {
    if let Some(value) = spec.get("value") {
        return match value {
            Value::String(s) => Ok(Condition::matches(key, s.clone())),
            Value::Bool(b) => Ok(Condition::matches(key, *b)),
            Value::Number(n) => n
                .as_i64()
                .map(|i| Condition::matches(key, i))
                .ok_or_else(|| invalid_filter(format!("match on '{key}' needs an integer"))),
            _ => Err(invalid_filter(format!("unsupported match value for '{key}'"))),
        };
    }

    if let Some(Value::Array(items)) = spec.get("any") {
        if let Some(keywords) = items.iter().map(|v| v.as_str().map(str::to_string)).collect::<Option<Vec<_>>>() {
            return Ok(Condition::matches(key, keywords));
        }
        if let Some(integers) = items.iter().map(Value::as_i64).collect::<Option<Vec<_>>>() {
            return Ok(Condition::matches(key, integers));
        }
        return Err(invalid_filter(format!("'any' on '{key}' must be all strings or all integers")));
    }

    if let Some(Value::String(text)) = spec.get("text") {
        return Ok(Condition::matches_text(key, text.clone()));
    }

    Err(invalid_filter(format!("unsupported match on '{key}'")))
}

fn invalid_filter(message: impl Into<String>) -> Error {
    Error::InvalidArgument(format!("Invalid filter: {}", message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::condition::ConditionOneOf;
    use serde_json::json;

    fn condition_key(condition: &Condition) -> Option<&str> {
        match &condition.condition_one_of {
            Some(ConditionOneOf::Field(field)) => Some(field.key.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        assert!(matches!(QdrantClient::new("not a url", None), Err(Error::Config(_))));
        assert!(matches!(QdrantClient::new("ftp://qdrant:6334", None), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_new_does_not_connect() {
        // Nothing listens here; building must still succeed
        let client = QdrantClient::new("http://127.0.0.1:1", Some("secret".into()));
        assert!(client.is_ok());
    }

    #[test]
    fn test_filter_clauses() {
        let filter = filter_from_json(&json!({
            "must": [{ "key": "metadata.platform", "match": { "value": "Reddit" } }],
            "must_not": [{ "key": "metadata.likes", "range": { "lt": 10 } }],
        }))
        .unwrap();

        assert_eq!(filter.must.len(), 1);
        assert_eq!(condition_key(&filter.must[0]), Some("metadata.platform"));
        assert!(filter.should.is_empty());

        let Some(ConditionOneOf::Field(field)) = &filter.must_not[0].condition_one_of else {
            panic!("expected a field condition");
        };
        let range = field.range.as_ref().unwrap();
        assert_eq!(range.lt, Some(10.0));
        assert_eq!(range.gte, None);
    }

    #[test]
    fn test_filter_match_variants() {
        let filter = filter_from_json(&json!({
            "should": [
                { "key": "a", "match": { "value": true } },
                { "key": "b", "match": { "value": 3 } },
                { "key": "c", "match": { "any": ["x", "y"] } },
                { "key": "d", "match": { "any": [1, 2] } },
                { "key": "e", "match": { "text": "hike" } },
            ]
        }))
        .unwrap();
        let keys: Vec<_> = filter.should.iter().filter_map(condition_key).collect();
        assert_eq!(keys, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_unsupported_filters_are_invalid_arguments() {
        for bad in [
            json!([]),
            json!({ "must": { "key": "a" } }),
            json!({ "filter": [] }),
            json!({ "must": [{ "match": { "value": "x" } }] }),
            json!({ "must": [{ "key": "a" }] }),
            json!({ "must": [{ "key": "a", "match": { "value": 1.5 } }] }),
            json!({ "must": [{ "key": "a", "match": { "any": ["x", 1] } }] }),
        ] {
            let err = filter_from_json(&bad).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(ref msg) if msg.starts_with("Invalid filter")), "{bad}");
        }
    }

    #[test]
    fn test_payload_values_survive_conversion() {
        let original = json!({
            "document": "Sunrise hike",
            "metadata": { "likes": 12, "ratio": 0.5, "tags": ["a", "b"], "draft": false, "extra": null },
        });
        let converted = json_to_qdrant_value(original.clone());
        assert_eq!(qdrant_value_to_json(converted), original);

        assert_eq!(qdrant_value_to_json(json_to_qdrant_value(Value::Null)), Value::Null);
    }

    #[test]
    fn test_point_conversion_uses_named_vectors() {
        let mut payload = Payload::new();
        payload.insert("document".into(), json!("hello"));
        payload.insert("metadata".into(), Value::Null);
        let point = to_qdrant_point(PointStruct {
            id: "6f1c2f5e-4f7a-4f4e-9c55-0f3f7d0a8b21".into(),
            vector: HashMap::from([("text_dense".to_string(), vec![0.5, 0.5])]),
            payload,
        });

        assert_eq!(
            point_id_to_json(point.id.clone()),
            json!("6f1c2f5e-4f7a-4f4e-9c55-0f3f7d0a8b21")
        );
        assert_eq!(point.payload.len(), 2);
        assert_eq!(qdrant_value_to_json(point.payload["metadata"].clone()), Value::Null);
        assert!(point.vectors.is_some());
    }

    #[test]
    fn test_scored_point_conversion() {
        let hit = qdrant::ScoredPoint {
            id: Some(PointId::from(42u64)),
            payload: HashMap::from([("document".to_string(), QdrantValue::from("x".to_string()))]),
            score: 0.75,
            ..Default::default()
        };
        let point = from_qdrant_point(hit);
        assert_eq!(point.id, json!(42));
        assert_eq!(point.score, Some(0.75));
        assert_eq!(point.payload.unwrap()["document"], "x");
    }
}
