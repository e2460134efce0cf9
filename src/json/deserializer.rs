//! Payload reader.
//!
//! Records are created in file order. A reference to an id that has not been
//! read yet is parked in a pending map keyed by that id and applied as soon as
//! the record shows up; anything still parked at the end is dangling.
//! Indexing happens last, once every record exists.

use super::names::*;
use crate::cas::{Cas, DocumentAnnotationMarks};
use crate::core::error::{Error, Result, SerializationError};
use crate::system::metrics::Metrics;
use crate::types::builtin::{
    self, FEATURE_BASE_NAME_SOFA, FEATURE_BASE_NAME_SOFAID, FEATURE_BASE_NAME_SOFAMIME,
    FEATURE_BASE_NAME_SOFANUM, FEATURE_BASE_NAME_SOFASTRING, FEATURE_BASE_NAME_SOFAURI, SOFA_SLOT_MIME,
};
use crate::types::{ArrayData, ArrayKind, Feature, FsId, PrimitiveKind, TypeId, TypeKind, TypeSystem, Value};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value as Json};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

const SOFA_ARRAY_REF: &str = "@sofaArray";

/// Assignment waiting for its target record
#[derive(Debug, Clone, Copy)]
enum Pending {
    Feature { fs: FsId, feature: Feature },
    ArrayElement { array: FsId, index: usize },
}

struct Loader<'a> {
    cas: &'a mut Cas,
    ts: Arc<TypeSystem>,
    /// Payload id to graph id
    ids: HashMap<i64, FsId>,
    pending: HashMap<i64, Vec<Pending>>,
    /// Awaited ids in the order they were first deferred
    awaited: Vec<i64>,
    /// Payload id to the views listing it
    membership: HashMap<i64, Vec<String>>,
    /// (payload id, view) pairs in payload order
    members: Vec<(i64, String)>,
    view_names: Vec<String>,
    sofas: HashSet<String>,
    marks: DocumentAnnotationMarks,
}

/// Populate an empty graph from a parsed payload
pub(crate) fn read(cas: &mut Cas, payload: Json) -> Result<()> {
    let Json::Object(mut root) = payload else {
        return Err(Error::malformed("payload must be a JSON object"));
    };
    let mut loader = Loader::new(cas);

    if let Some(views) = root.remove(VIEWS_FIELD) {
        loader.read_views(views)?;
    }
    if let Some(types) = root.get(TYPES_FIELD) {
        if !types.is_object() {
            return Err(Error::malformed(format!("{} must be an object", TYPES_FIELD)));
        }
    }

    match root.remove(FEATURE_STRUCTURES_FIELD) {
        None | Some(Json::Null) => {}
        Some(Json::Array(records)) => {
            debug!(records = records.len(), layout = "array", "reading feature structures");
            for record in records {
                loader.read_record(None, into_object(record, FEATURE_STRUCTURES_FIELD)?)?;
            }
        }
        Some(Json::Object(records)) => {
            debug!(records = records.len(), layout = "map", "reading feature structures");
            for (key, record) in records {
                let id = key
                    .parse::<i64>()
                    .map_err(|_| Error::malformed(format!("record key {} is not an id", key)))?;
                loader.read_record(Some(id), into_object(record, FEATURE_STRUCTURES_FIELD)?)?;
            }
        }
        Some(_) => {
            return Err(Error::malformed(format!(
                "{} must be an array or an object",
                FEATURE_STRUCTURES_FIELD
            )))
        }
    }

    loader.finish()
}

impl<'a> Loader<'a> {
    fn new(cas: &'a mut Cas) -> Self {
        let ts = Arc::clone(cas.type_system());
        Self {
            cas,
            ts,
            ids: HashMap::new(),
            pending: HashMap::new(),
            awaited: Vec::new(),
            membership: HashMap::new(),
            members: Vec::new(),
            view_names: Vec::new(),
            sofas: HashSet::new(),
            marks: DocumentAnnotationMarks::new(),
        }
    }

    fn read_views(&mut self, views: Json) -> Result<()> {
        for (name, view) in into_object(views, VIEWS_FIELD)? {
            let view = into_object(view, &name)?;
            if let Some(members) = view.get(VIEW_MEMBERS_FIELD) {
                let Json::Array(members) = members else {
                    return Err(Error::malformed(format!("{} of view {} must be an array", VIEW_MEMBERS_FIELD, name)));
                };
                for member in members {
                    let id = payload_id(member)?;
                    self.membership.entry(id).or_default().push(name.clone());
                    self.members.push((id, name.clone()));
                }
            }
            self.view_names.push(name);
        }
        debug!(views = self.view_names.len(), members = self.members.len(), "views read");
        Ok(())
    }

    fn read_record(&mut self, key_id: Option<i64>, fields: Map<String, Json>) -> Result<()> {
        let mut entries = fields.into_iter().peekable();
        let leading = entries.next_if(|(k, _)| k.as_str() == ID_FIELD).map(|(_, v)| v);
        let id = match (key_id, leading) {
            (None, None) => return Err(Error::malformed(format!("record must start with {}", ID_FIELD))),
            (None, Some(v)) => payload_id(&v)?,
            (Some(key), None) => key,
            (Some(key), Some(v)) => {
                let id = payload_id(&v)?;
                if id != key {
                    return Err(Error::malformed(format!("record keyed {} carries {} {}", key, ID_FIELD, id)));
                }
                id
            }
        };
        if self.ids.contains_key(&id) {
            return Err(Error::malformed(format!("duplicate record id {}", id)));
        }

        let type_name = match entries.next() {
            Some((k, Json::String(name))) if k == TYPE_FIELD => name,
            _ => {
                return Err(Error::malformed(format!(
                    "record {} must have {} right after {}",
                    id, TYPE_FIELD, ID_FIELD
                )))
            }
        };
        let t = self
            .ts
            .type_by_name(&type_name)
            .ok_or_else(|| Error::malformed(format!("unknown type {} on record {}", type_name, id)))?;

        let fields: Vec<(String, Json)> = entries.collect();
        match self.ts.kind(t) {
            Some(TypeKind::Array(kind)) => self.read_array(id, kind, fields),
            Some(TypeKind::Structure) if t == builtin::SOFA => self.read_sofa(id, fields),
            Some(TypeKind::Structure) => self.read_structure(id, t, fields),
            Some(TypeKind::Primitive(_)) | None => Err(Error::malformed(format!(
                "record {} has primitive type {}",
                id, type_name
            ))),
        }
    }

    fn read_sofa(&mut self, id: i64, fields: Vec<(String, Json)>) -> Result<()> {
        let mut sofa_id = None;
        let mut mime = None;
        let mut text = None;
        let mut uri = None;
        let mut array = None;

        for (key, value) in fields {
            match key.as_str() {
                FEATURE_BASE_NAME_SOFANUM => {}
                FEATURE_BASE_NAME_SOFAID => sofa_id = string_value(&key, value)?,
                FEATURE_BASE_NAME_SOFAMIME => mime = string_value(&key, value)?,
                FEATURE_BASE_NAME_SOFASTRING => text = string_value(&key, value)?,
                FEATURE_BASE_NAME_SOFAURI => uri = string_value(&key, value)?,
                SOFA_ARRAY_REF => {
                    if value.is_null() {
                        continue;
                    }
                    let target = payload_id(&value)?;
                    let resolved = self.ids.get(&target).copied().ok_or_else(|| {
                        Error::malformed(format!("sofa array {} must precede sofa {}", target, id))
                    })?;
                    array = Some(resolved);
                }
                _ => return Err(Error::malformed(format!("unexpected field {} on sofa {}", key, id))),
            }
        }

        let name = sofa_id.ok_or_else(|| Error::malformed(format!("sofa {} has no {}", id, FEATURE_BASE_NAME_SOFAID)))?;
        if !self.sofas.insert(name.clone()) {
            return Err(Error::malformed(format!("second sofa for view {}", name)));
        }
        let sofa = self.cas.create_view(&name).sofa();
        match (text, uri, array) {
            (Some(text), _, _) => self.cas.write_sofa_string(&name, &text, mime.as_deref())?,
            (None, Some(uri), _) => self.cas.set_sofa_data_uri(&name, &uri, mime.as_deref())?,
            (None, None, Some(array)) => self.cas.set_sofa_data_array(&name, array, mime.as_deref())?,
            (None, None, None) => {
                if let Some(mime) = mime {
                    self.cas.write_slot(sofa, SOFA_SLOT_MIME, Value::from(mime))?;
                }
            }
        }
        self.register(id, sofa)
    }

    fn read_array(&mut self, id: i64, kind: ArrayKind, fields: Vec<(String, Json)>) -> Result<()> {
        let mut elements = Json::Null;
        for (key, value) in fields {
            if key != ELEMENTS_FIELD {
                return Err(Error::malformed(format!("unexpected field {} on array {}", key, id)));
            }
            elements = value;
        }

        if kind == ArrayKind::Fs {
            let targets = match elements {
                Json::Null => Vec::new(),
                Json::Array(items) => items
                    .iter()
                    .map(|item| if item.is_null() { Ok(None) } else { payload_id(item).map(Some) })
                    .collect::<Result<Vec<_>>>()?,
                other => return Err(incompatible(ELEMENTS_FIELD, builtin::TYPE_NAME_FS_ARRAY, &other)),
            };
            let array = self.cas.create_array_with(ArrayData::Fs(vec![None; targets.len()]))?;
            self.register(id, array)?;
            for (index, target) in targets.into_iter().enumerate() {
                if let Some(target) = target {
                    self.resolve(target, Pending::ArrayElement { array, index })?;
                }
            }
            return Ok(());
        }

        let data = primitive_array(kind, elements)?;
        let array = self.cas.create_array_with(data)?;
        self.register(id, array)
    }

    fn read_structure(&mut self, id: i64, t: TypeId, fields: Vec<(String, Json)>) -> Result<()> {
        let ts = Arc::clone(&self.ts);
        let fs = if ts.subsumes(builtin::DOCUMENT_ANNOTATION, t) {
            match self.membership.get(&id).map(Vec::as_slice) {
                None | Some([]) => self.cas.create_instance(t)?,
                Some([view]) => self.cas.reconcile_document_annotation(view, t, &mut self.marks)?,
                Some(_) => {
                    return Err(Error::malformed(format!(
                        "document annotation {} is a member of several views",
                        id
                    )))
                }
            }
        } else {
            self.cas.create_instance(t)?
        };
        self.register(id, fs)?;

        for (key, value) in fields {
            if key.starts_with(RESERVED_FIELD_PREFIX) {
                return Err(Error::malformed(format!("unexpected field {} on record {}", key, id)));
            }
            if let Some(base) = key.strip_prefix(REF_FEATURE_PREFIX) {
                if base == FEATURE_BASE_NAME_SOFA && ts.is_annotation_base(t) {
                    continue;
                }
                let feature = feature_of(&ts, t, base, id)?;
                if ts.primitive_kind(feature.range()).is_some() {
                    return Err(Error::malformed(format!("feature {} on record {} is not a reference", base, id)));
                }
                if value.is_null() {
                    continue;
                }
                let target = payload_id(&value)
                    .map_err(|_| incompatible(base, ts.type_name(feature.range()), &value))?;
                self.resolve(target, Pending::Feature { fs, feature })?;
                continue;
            }

            let feature = feature_of(&ts, t, &key, id)?;
            let range = feature.range();
            match ts.primitive_kind(range) {
                Some(kind) => {
                    let converted = primitive_value(kind, &value, &key, ts.type_name(range))?;
                    self.cas.set_feature_value(fs, feature, converted)?;
                }
                None if value.is_null() => {}
                None => return Err(incompatible(&key, ts.type_name(range), &value)),
            }
        }
        Ok(())
    }

    /// Apply `action` now if `target` is known, otherwise park it
    fn resolve(&mut self, target: i64, action: Pending) -> Result<()> {
        if let Some(&resolved) = self.ids.get(&target) {
            return self.apply(action, resolved);
        }
        trace!(awaited = target, ?action, "reference deferred");
        let waiting = self.pending.entry(target).or_default();
        if waiting.is_empty() {
            self.awaited.push(target);
        }
        waiting.push(action);
        Ok(())
    }

    /// Record the graph id of a payload id and drain what was waiting on it
    fn register(&mut self, id: i64, fs: FsId) -> Result<()> {
        self.ids.insert(id, fs);
        if let Some(waiting) = self.pending.remove(&id) {
            Metrics::global().codec.deferred_references.inc_by(waiting.len() as u64);
            for action in waiting {
                self.apply(action, fs)?;
            }
        }
        Ok(())
    }

    fn apply(&mut self, action: Pending, target: FsId) -> Result<()> {
        match action {
            Pending::Feature { fs, feature } => self.cas.set_feature_value(fs, feature, Value::Ref(target)),
            Pending::ArrayElement { array, index } => self.cas.set_array_element(array, index, Value::Ref(target)),
        }
    }

    fn finish(self) -> Result<()> {
        if let Some(&id) = self.awaited.iter().find(|&&id| self.pending.contains_key(&id)) {
            return Err(SerializationError::DanglingReference { id }.into());
        }
        for name in &self.view_names {
            self.cas.create_view(name);
        }
        for (id, view) in &self.members {
            let fs = self
                .ids
                .get(id)
                .copied()
                .ok_or(SerializationError::DanglingReference { id: *id })?;
            self.cas.add_to_indexes(fs, view)?;
        }
        debug!(records = self.ids.len(), indexed = self.members.len(), "payload loaded");
        Ok(())
    }
}

fn into_object(value: Json, context: &str) -> Result<Map<String, Json>> {
    match value {
        Json::Object(map) => Ok(map),
        other => Err(Error::malformed(format!(
            "expected an object in {}, found {}",
            context,
            json_kind(&other)
        ))),
    }
}

fn payload_id(value: &Json) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| Error::malformed(format!("expected a record id, found {}", json_kind(value))))
}

fn feature_of(ts: &TypeSystem, t: TypeId, name: &str, id: i64) -> Result<Feature> {
    ts.feature_by_base_name(t, name).ok_or_else(|| {
        Error::malformed(format!(
            "type {} of record {} has no feature {}",
            ts.type_name(t),
            id,
            name
        ))
    })
}

fn string_value(feature: &str, value: Json) -> Result<Option<String>> {
    match value {
        Json::Null => Ok(None),
        Json::String(s) => Ok(Some(s)),
        other => Err(incompatible(feature, builtin::TYPE_NAME_STRING, &other)),
    }
}

/// Convert a JSON scalar to a value of the given primitive range
fn primitive_value(kind: PrimitiveKind, value: &Json, feature: &str, range: &str) -> Result<Value> {
    let fail = || incompatible(feature, range, value);
    Ok(match kind {
        PrimitiveKind::Boolean => Value::Boolean(value.as_bool().ok_or_else(fail)?),
        PrimitiveKind::Byte => Value::Byte(integral(value).ok_or_else(fail)? as i8),
        PrimitiveKind::Short => Value::Short(integral(value).ok_or_else(fail)? as i16),
        PrimitiveKind::Integer => Value::Integer(integral(value).ok_or_else(fail)? as i32),
        PrimitiveKind::Long => Value::Long(integral(value).ok_or_else(fail)?),
        PrimitiveKind::Float => Value::Float(floating(value).ok_or_else(fail)? as f32),
        PrimitiveKind::Double => Value::Double(floating(value).ok_or_else(fail)?),
        PrimitiveKind::String => match value {
            Json::Null => Value::Null,
            Json::String(s) => Value::from(s.as_str()),
            _ => return Err(fail()),
        },
    })
}

/// Integral JSON number, wrapped into 64 bits
fn integral(value: &Json) -> Option<i64> {
    value.as_i64().or_else(|| value.as_u64().map(|v| v as i64))
}

/// Float token or one of the special value strings; integer tokens are refused
fn floating(value: &Json) -> Option<f64> {
    match value {
        Json::Number(n) if n.is_f64() => n.as_f64(),
        Json::String(s) => match s.as_str() {
            NUMBER_NAN => Some(f64::NAN),
            NUMBER_POSITIVE_INFINITY => Some(f64::INFINITY),
            NUMBER_NEGATIVE_INFINITY => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

fn primitive_array(kind: ArrayKind, elements: Json) -> Result<ArrayData> {
    let element = element_kind(kind);
    let range = array_type_name(kind);
    let items = match elements {
        Json::Null => Vec::new(),
        Json::String(encoded) if kind == ArrayKind::Byte => {
            let bytes = STANDARD.decode(encoded).map_err(SerializationError::from)?;
            return Ok(ArrayData::Byte(bytes.into_iter().map(|b| b as i8).collect()));
        }
        Json::Array(items) => items,
        other => return Err(incompatible(ELEMENTS_FIELD, range, &other)),
    };

    let mut data = ArrayData::new(kind, items.len());
    if let Some(element) = element {
        for (index, item) in items.iter().enumerate() {
            let value = primitive_value(element, item, ELEMENTS_FIELD, range)?;
            data.set(index, value)?;
        }
    }
    Ok(data)
}

fn element_kind(kind: ArrayKind) -> Option<PrimitiveKind> {
    match kind {
        ArrayKind::Fs => None,
        ArrayKind::Boolean => Some(PrimitiveKind::Boolean),
        ArrayKind::Byte => Some(PrimitiveKind::Byte),
        ArrayKind::Short => Some(PrimitiveKind::Short),
        ArrayKind::Integer => Some(PrimitiveKind::Integer),
        ArrayKind::Long => Some(PrimitiveKind::Long),
        ArrayKind::Float => Some(PrimitiveKind::Float),
        ArrayKind::Double => Some(PrimitiveKind::Double),
        ArrayKind::String => Some(PrimitiveKind::String),
    }
}

fn array_type_name(kind: ArrayKind) -> &'static str {
    match kind {
        ArrayKind::Fs => builtin::TYPE_NAME_FS_ARRAY,
        ArrayKind::Boolean => builtin::TYPE_NAME_BOOLEAN_ARRAY,
        ArrayKind::Byte => builtin::TYPE_NAME_BYTE_ARRAY,
        ArrayKind::Short => builtin::TYPE_NAME_SHORT_ARRAY,
        ArrayKind::Integer => builtin::TYPE_NAME_INTEGER_ARRAY,
        ArrayKind::Long => builtin::TYPE_NAME_LONG_ARRAY,
        ArrayKind::Float => builtin::TYPE_NAME_FLOAT_ARRAY,
        ArrayKind::Double => builtin::TYPE_NAME_DOUBLE_ARRAY,
        ArrayKind::String => builtin::TYPE_NAME_STRING_ARRAY,
    }
}

fn incompatible(feature: &str, range: &str, value: &Json) -> Error {
    SerializationError::IncompatibleFeatureType {
        feature: feature.to_string(),
        range: range.to_string(),
        json_kind: json_kind(value).to_string(),
    }
    .into()
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(n) if n.is_f64() => "float",
        Json::Number(_) => "integer",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
