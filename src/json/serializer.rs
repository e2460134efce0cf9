//! Payload writer

use super::names::*;
use crate::cas::{Cas, FsBody};
use crate::core::config::{CodecConfig, FsLayout};
use crate::core::error::Result;
use crate::types::{ArrayData, FsId, TypeSystem, Value};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Number, Value as Json};
use std::collections::HashSet;

/// Build the JSON document for a whole graph
pub(crate) fn write(cas: &Cas, config: &CodecConfig) -> Result<Json> {
    let ts = cas.type_system();
    let mut root = Map::new();

    if config.include_types {
        let types = write_types(ts);
        if !types.is_empty() {
            root.insert(TYPES_FIELD.to_string(), Json::Object(types));
        }
    }

    let order = record_order(cas);
    let records = match config.fs_layout {
        FsLayout::Array => Json::Array(
            order
                .iter()
                .map(|&id| write_record(cas, id, true).map(Json::Object))
                .collect::<Result<Vec<_>>>()?,
        ),
        FsLayout::Map => {
            let mut map = Map::new();
            for &id in &order {
                map.insert(id.to_string(), Json::Object(write_record(cas, id, false)?));
            }
            Json::Object(map)
        }
    };
    root.insert(FEATURE_STRUCTURES_FIELD.to_string(), records);

    let mut views = Map::new();
    for view in cas.views() {
        let mut entry = Map::new();
        entry.insert(VIEW_SOFA_FIELD.to_string(), Json::from(view.sofa().get()));
        let members = view.index().members().into_iter().map(|id| Json::from(id.get()));
        entry.insert(VIEW_MEMBERS_FIELD.to_string(), Json::Array(members.collect()));
        views.insert(view.name().to_string(), Json::Object(entry));
    }
    root.insert(VIEWS_FIELD.to_string(), Json::Object(views));

    Ok(Json::Object(root))
}

/// Sofas first, each after the array holding its data, then the rest by id
fn record_order(cas: &Cas) -> Vec<FsId> {
    let mut order = Vec::with_capacity(cas.len());
    let mut emitted = HashSet::new();
    for view in cas.views() {
        if let Some(array) = cas.sofa_data_array(view.name()) {
            if emitted.insert(array) {
                order.push(array);
            }
        }
        if emitted.insert(view.sofa()) {
            order.push(view.sofa());
        }
    }
    order.extend(cas.ids().filter(|id| !emitted.contains(id)));
    order
}

fn write_types(ts: &TypeSystem) -> Map<String, Json> {
    let mut types = Map::new();
    for t in ts.type_ids().filter(|&t| ts.is_user_type(t)) {
        let mut entry = Map::new();
        entry.insert(NAME_FIELD.to_string(), Json::from(ts.type_name(t)));
        if let Some(parent) = ts.supertype(t) {
            entry.insert(SUPER_TYPE_FIELD.to_string(), Json::from(ts.type_name(parent)));
        }
        for (name, range) in ts.declared_features(t) {
            let mut feature = Map::new();
            feature.insert(NAME_FIELD.to_string(), Json::from(name));
            feature.insert(RANGE_FIELD.to_string(), Json::from(ts.type_name(range)));
            entry.insert(name.to_string(), Json::Object(feature));
        }
        types.insert(ts.type_name(t).to_string(), Json::Object(entry));
    }
    types
}

fn write_record(cas: &Cas, id: FsId, with_id: bool) -> Result<Map<String, Json>> {
    let ts = cas.type_system();
    let record = cas.record(id)?;
    let mut fields = Map::new();
    if with_id {
        fields.insert(ID_FIELD.to_string(), Json::from(id.get()));
    }
    fields.insert(TYPE_FIELD.to_string(), Json::from(ts.type_name(record.type_id)));

    match &record.body {
        FsBody::Array(data) => {
            fields.insert(ELEMENTS_FIELD.to_string(), write_elements(data));
        }
        FsBody::Features(slots) => {
            for (decl, value) in ts.features(record.type_id).iter().zip(slots) {
                match value {
                    Value::Null => {}
                    Value::Ref(target) => {
                        fields.insert(format!("{}{}", REF_FEATURE_PREFIX, decl.name), Json::from(target.get()));
                    }
                    other => {
                        fields.insert(decl.name.to_string(), write_primitive(other));
                    }
                }
            }
        }
    }
    Ok(fields)
}

fn write_primitive(value: &Value) -> Json {
    match value {
        Value::Null | Value::Ref(_) => Json::Null,
        Value::Boolean(v) => Json::Bool(*v),
        Value::Byte(v) => Json::from(*v),
        Value::Short(v) => Json::from(*v),
        Value::Integer(v) => Json::from(*v),
        Value::Long(v) => Json::from(*v),
        Value::Float(v) => write_float(*v),
        Value::Double(v) => write_double(*v),
        Value::String(v) => Json::from(v.as_ref()),
    }
}

fn write_elements(data: &ArrayData) -> Json {
    match data {
        ArrayData::Fs(v) => v
            .iter()
            .map(|id| id.map_or(Json::Null, |id| Json::from(id.get())))
            .collect(),
        ArrayData::Boolean(v) => v.iter().map(|&b| Json::Bool(b)).collect(),
        ArrayData::Byte(v) => {
            let bytes: Vec<u8> = v.iter().map(|&b| b as u8).collect();
            Json::String(STANDARD.encode(bytes))
        }
        ArrayData::Short(v) => v.iter().map(|&x| Json::from(x)).collect(),
        ArrayData::Integer(v) => v.iter().map(|&x| Json::from(x)).collect(),
        ArrayData::Long(v) => v.iter().map(|&x| Json::from(x)).collect(),
        ArrayData::Float(v) => v.iter().map(|&x| write_float(x)).collect(),
        ArrayData::Double(v) => v.iter().map(|&x| write_double(x)).collect(),
        ArrayData::String(v) => v
            .iter()
            .map(|s| s.as_deref().map_or(Json::Null, Json::from))
            .collect(),
    }
}

/// Shortest decimal form of the float, so `0.1f32` is written as `0.1`
fn write_float(v: f32) -> Json {
    match v.to_string().parse::<f64>() {
        Ok(wide) if v.is_finite() => write_double(wide),
        _ => write_double(f64::from(v)),
    }
}

fn write_double(v: f64) -> Json {
    match Number::from_f64(v) {
        Some(n) => Json::Number(n),
        None if v.is_nan() => Json::from(NUMBER_NAN),
        None if v > 0.0 => Json::from(NUMBER_POSITIVE_INFINITY),
        None => Json::from(NUMBER_NEGATIVE_INFINITY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::tests::sample_type_system;
    use crate::index::Span;
    use crate::types::builtin::{FLOAT_ARRAY, INITIAL_VIEW_NAME};

    #[test]
    fn test_non_finite_floats_become_strings() {
        assert_eq!(write_double(f64::NAN), Json::from("NaN"));
        assert_eq!(write_double(f64::INFINITY), Json::from("Infinity"));
        assert_eq!(write_float(f32::NEG_INFINITY), Json::from("-Infinity"));
        assert_eq!(write_float(0.1), serde_json::json!(0.1));
    }

    #[test]
    fn test_sofa_first_and_null_features_omitted() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        let token = cas.type_system().type_by_name("example.Token").unwrap();
        let loose = cas.create_instance(token).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "abc").unwrap();
        cas.set_span(loose, Span::new(0, 3)).unwrap();

        let doc = write(&cas, &CodecConfig::default()).unwrap();
        let records = doc[FEATURE_STRUCTURES_FIELD].as_array().unwrap();
        assert_eq!(records[0][TYPE_FIELD], "uima.cas.Sofa");
        assert_eq!(records[0]["sofaString"], "abc");

        let token_json = records.iter().find(|r| r[ID_FIELD] == loose.get()).unwrap();
        assert!(token_json.get("pos").is_none());
        assert!(token_json.get("@next").is_none());
        assert_eq!(token_json["score"], serde_json::json!(0.0));
        assert_eq!(token_json["end"], 3);

        let types = doc[TYPES_FIELD].as_object().unwrap();
        assert_eq!(types["example.Token"][SUPER_TYPE_FIELD], "uima.tcas.Annotation");
        assert_eq!(types["example.Token"]["next"][RANGE_FIELD], "example.Token");
    }

    #[test]
    fn test_sofa_array_written_before_its_sofa() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.create_view("audio");
        let samples = cas.create_array(FLOAT_ARRAY, 2).unwrap();
        cas.set_sofa_data_array("audio", samples, Some("audio/raw")).unwrap();

        let order = record_order(&cas);
        let audio_sofa = cas.view("audio").unwrap().sofa();
        let array_pos = order.iter().position(|&id| id == samples).unwrap();
        let sofa_pos = order.iter().position(|&id| id == audio_sofa).unwrap();
        assert_eq!(array_pos + 1, sofa_pos);
        assert_eq!(order.len(), cas.len());
    }

    #[test]
    fn test_map_layout_and_members() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "abc").unwrap();
        let config = CodecConfig {
            fs_layout: FsLayout::Map,
            include_types: false,
            ..CodecConfig::default()
        };
        let doc = write(&cas, &config).unwrap();
        assert!(doc.get(TYPES_FIELD).is_none());

        let records = doc[FEATURE_STRUCTURES_FIELD].as_object().unwrap();
        assert_eq!(records.len(), cas.len());
        assert!(records["1"].get(ID_FIELD).is_none());

        let view = &doc[VIEWS_FIELD][INITIAL_VIEW_NAME];
        assert_eq!(view[VIEW_SOFA_FIELD], 1);
        assert_eq!(view[VIEW_MEMBERS_FIELD], serde_json::json!([2]));
    }
}
