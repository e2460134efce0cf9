//! Feature structure graph.
//!
//! A [`Cas`] owns every record in an arena addressed by [`FsId`]. References
//! between records are stored as ids, so cycles need no special handling.
//! Each view owns a sofa record and an [`IndexRepository`]; indexes are kept
//! up to date as records are added, removed or have their span changed.

mod document;
mod query;
mod record;
mod view;

pub use document::DocumentAnnotationMarks;
pub use view::View;

pub(crate) use record::{FsBody, FsRecord};

use crate::core::error::{Error, GraphError, Result, TypeSystemError};
use crate::index::{IndexRepository, Span};
use crate::system::metrics::Metrics;
use crate::types::builtin::{
    self, ANNOTATION_SLOT_BEGIN, ANNOTATION_SLOT_END, ANNOTATION_SLOT_SOFA, INITIAL_VIEW_NAME,
    SOFA_SLOT_ID, SOFA_SLOT_NUM,
};
use crate::types::value::array_element_name;
use crate::types::{ArrayData, Feature, FsId, TypeId, TypeKind, TypeSystem, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Typed, mutable graph of feature structures bound to one type system
#[derive(Clone, Debug)]
pub struct Cas {
    type_system: Arc<TypeSystem>,
    records: Vec<FsRecord>,
    views: Vec<View>,
    view_names: HashMap<String, usize>,
    sofa_views: HashMap<FsId, usize>,
}

impl Cas {
    /// Create a graph with an `_InitialView`. The type system must be committed.
    pub fn new(type_system: Arc<TypeSystem>) -> Result<Self> {
        if !type_system.is_committed() {
            return Err(TypeSystemError::NotCommitted.into());
        }
        let mut cas = Self {
            type_system,
            records: Vec::new(),
            views: Vec::new(),
            view_names: HashMap::new(),
            sofa_views: HashMap::new(),
        };
        cas.ensure_view(INITIAL_VIEW_NAME);
        Ok(cas)
    }

    /// Empty graph bound to the same type system
    pub fn new_instance(&self) -> Self {
        let mut cas = Self {
            type_system: Arc::clone(&self.type_system),
            records: Vec::new(),
            views: Vec::new(),
            view_names: HashMap::new(),
            sofa_views: HashMap::new(),
        };
        cas.ensure_view(INITIAL_VIEW_NAME);
        cas
    }

    /// Type system the graph is bound to
    pub fn type_system(&self) -> &Arc<TypeSystem> {
        &self.type_system
    }

    /// Drop every record and view, then recreate `_InitialView`
    pub fn reset(&mut self) {
        self.records.clear();
        self.views.clear();
        self.view_names.clear();
        self.sofa_views.clear();
        self.ensure_view(INITIAL_VIEW_NAME);
    }

    /// Number of records, sofas included
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the graph holds no records at all
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True if `id` names a record of this graph
    pub fn contains(&self, id: FsId) -> bool {
        id.get() >= 1 && id.slot() < self.records.len()
    }

    /// Every record id in creation order
    pub fn ids(&self) -> impl Iterator<Item = FsId> {
        (0..self.records.len()).map(FsId::from_slot)
    }

    /// Type of a record
    pub fn type_of(&self, id: FsId) -> Result<TypeId> {
        Ok(self.record(id)?.type_id)
    }

    /// Create a record of type `t` with default feature values.
    ///
    /// Array types get a zero-length array. Primitive types, `uima.cas.Sofa`
    /// and `uima.cas.ArrayBase` are not creatable.
    pub fn create_instance(&mut self, t: TypeId) -> Result<FsId> {
        self.type_system.check(t)?;
        match self.type_system.kind(t) {
            Some(TypeKind::Array(kind)) => Ok(self.push(t, FsBody::Array(ArrayData::new(kind, 0)))),
            Some(TypeKind::Primitive(_)) | None => Err(self.not_creatable(t)),
            Some(TypeKind::Structure) if t == builtin::SOFA || t == builtin::ARRAY_BASE => {
                Err(self.not_creatable(t))
            }
            Some(TypeKind::Structure) => {
                let slots = self.default_slots(t);
                Ok(self.push(t, FsBody::Features(slots)))
            }
        }
    }

    /// Create an array of `len` default elements
    pub fn create_array(&mut self, t: TypeId, len: usize) -> Result<FsId> {
        self.type_system.check(t)?;
        match self.type_system.array_kind(t) {
            Some(kind) => Ok(self.push(t, FsBody::Array(ArrayData::new(kind, len)))),
            None => Err(self.not_creatable(t)),
        }
    }

    /// Create an array holding `data`; reference elements must exist
    pub fn create_array_with(&mut self, data: ArrayData) -> Result<FsId> {
        for target in data.references() {
            self.record(target)?;
        }
        let t = array_type(data.kind());
        Ok(self.push(t, FsBody::Array(data)))
    }

    /// Elements of an array record
    pub fn array(&self, id: FsId) -> Result<&ArrayData> {
        self.record(id)?
            .array()
            .ok_or_else(|| GraphError::NotAnArray { id: id.get() }.into())
    }

    /// Length of an array record
    pub fn array_len(&self, id: FsId) -> Result<usize> {
        Ok(self.array(id)?.len())
    }

    /// Element of an array record
    pub fn get_array_element(&self, id: FsId, index: usize) -> Result<Value> {
        let data = self.array(id)?;
        data.get(index).ok_or_else(|| {
            GraphError::IndexOutOfBounds {
                index,
                length: data.len(),
            }
            .into()
        })
    }

    /// Overwrite an element of an array record
    pub fn set_array_element(&mut self, id: FsId, index: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if let Value::Ref(target) = value {
            self.record(target)?;
        }
        match &mut self.record_mut(id)?.body {
            FsBody::Array(data) => data.set(index, value),
            FsBody::Features(_) => Err(GraphError::NotAnArray { id: id.get() }.into()),
        }
    }

    /// Resolve a feature of the record's type by base name
    pub fn feature(&self, id: FsId, base_name: &str) -> Result<Feature> {
        let t = self.type_of(id)?;
        self.type_system.get_feature(t, base_name)
    }

    /// Read a feature value
    pub fn get_feature_value(&self, id: FsId, feature: Feature) -> Result<Value> {
        let record = self.record(id)?;
        self.check_feature(record.type_id, feature)?;
        Ok(record.slot(feature.slot()).cloned().unwrap_or_default())
    }

    /// Read a feature value by base name
    pub fn get_value(&self, id: FsId, base_name: &str) -> Result<Value> {
        let feature = self.feature(id, base_name)?;
        self.get_feature_value(id, feature)
    }

    /// Write a feature value.
    ///
    /// The value kind must match the feature range; null is accepted for
    /// string and reference ranges only. `AnnotationBase.sofa` and the sofa
    /// features are reserved. Moving the span of an indexed annotation
    /// re-validates it and repositions it in its view index.
    pub fn set_feature_value(&mut self, id: FsId, feature: Feature, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let t = self.type_of(id)?;
        self.check_feature(t, feature)?;
        if is_reserved(feature) {
            return Err(GraphError::ReservedFeature {
                feature: self.type_system.feature_name(feature).to_string(),
            }
            .into());
        }
        self.check_value(feature, &value)?;

        if feature.domain() == builtin::ANNOTATION
            && (feature.slot() == ANNOTATION_SLOT_BEGIN || feature.slot() == ANNOTATION_SLOT_END)
        {
            let v = value.as_i32().unwrap_or_default();
            let mut span = self.span(id)?;
            if feature.slot() == ANNOTATION_SLOT_BEGIN {
                span.begin = v;
            } else {
                span.end = v;
            }
            return self.set_span(id, span);
        }

        self.write_slot(id, feature.slot(), value)
    }

    /// Write a feature value by base name
    pub fn set_value(&mut self, id: FsId, base_name: &str, value: impl Into<Value>) -> Result<()> {
        let feature = self.feature(id, base_name)?;
        self.set_feature_value(id, feature, value)
    }

    /// Span of an annotation
    pub fn span(&self, id: FsId) -> Result<Span> {
        let record = self.record(id)?;
        if !self.type_system.is_annotation(record.type_id) {
            return Err(GraphError::NotAnAnnotation { id: id.get() }.into());
        }
        let get = |slot| {
            record
                .slot(slot)
                .and_then(Value::as_i32)
                .unwrap_or_default()
        };
        Ok(Span::new(get(ANNOTATION_SLOT_BEGIN), get(ANNOTATION_SLOT_END)))
    }

    /// Set both offsets of an annotation at once.
    ///
    /// If the annotation is indexed the new span is validated against the
    /// view text first.
    pub fn set_span(&mut self, id: FsId, span: Span) -> Result<()> {
        self.span(id)?;
        if let Some(vi) = self.indexed_view_of(id) {
            let view = &mut self.views[vi];
            check_span(span, view.text_len)?;
            view.index.reposition(id, span);
        }
        self.write_slot(id, ANNOTATION_SLOT_BEGIN, Value::Integer(span.begin))?;
        self.write_slot(id, ANNOTATION_SLOT_END, Value::Integer(span.end))
    }

    /// Create a view, or return the existing one with that name
    pub fn create_view(&mut self, name: &str) -> &View {
        let vi = self.ensure_view(name);
        &self.views[vi]
    }

    /// Look a view up by name
    pub fn view(&self, name: &str) -> Option<&View> {
        self.view_names.get(name).map(|&vi| &self.views[vi])
    }

    /// View names in creation order
    pub fn view_names(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(View::name)
    }

    /// Views in creation order
    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.iter()
    }

    /// View owning a sofa record
    pub fn view_of_sofa(&self, sofa: FsId) -> Option<&View> {
        self.sofa_views.get(&sofa).map(|&vi| &self.views[vi])
    }

    /// Index a record in a view, creating the view if needed.
    ///
    /// Annotation-base records are bound to the view's sofa on first
    /// indexing and cannot be indexed in another view afterwards. Returns
    /// false if the record was already indexed there.
    pub fn add_to_indexes(&mut self, id: FsId, view: &str) -> Result<bool> {
        let t = self.type_of(id)?;
        let vi = self.ensure_view(view);
        let ts = Arc::clone(&self.type_system);

        let mut span = None;
        if ts.is_annotation_base(t) {
            let sofa = self.views[vi].sofa;
            if let Some(bound) = self.bound_sofa(id) {
                if bound != sofa {
                    return Err(GraphError::ViewMismatch {
                        id: id.get(),
                        bound: self.sofa_view_name(bound).to_string(),
                        requested: view.to_string(),
                    }
                    .into());
                }
            }
            if ts.is_annotation(t) {
                let s = self.span(id)?;
                check_span(s, self.views[vi].text_len)?;
                span = Some(s);
            }
            self.write_slot(id, ANNOTATION_SLOT_SOFA, Value::Ref(sofa))?;
        }

        let added = self.views[vi].index.add(id, t, span);
        if added {
            Metrics::global().graph.records_indexed.inc();
        }
        Ok(added)
    }

    /// Remove a record from a view index. Returns false if it was not indexed.
    pub fn remove_from_indexes(&mut self, id: FsId, view: &str) -> Result<bool> {
        let t = self.type_of(id)?;
        let vi = self.ensure_view(view);
        let target = &mut self.views[vi];
        let removed = target.index.remove(id, t);
        if removed && target.document_annotation == Some(id) {
            target.document_annotation = None;
        }
        Ok(removed)
    }

    /// True if `id` is indexed in the named view
    pub fn is_indexed(&self, id: FsId, view: &str) -> bool {
        self.view(view).is_some_and(|v| v.contains(id))
    }

    /// Names of the views indexing `id`, in view creation order
    pub fn views_containing(&self, id: FsId) -> Vec<&str> {
        self.views
            .iter()
            .filter(|v| v.contains(id))
            .map(View::name)
            .collect()
    }

    /// Rebind the graph to a new type system.
    ///
    /// Records keep their ids and are moved to the type of the same name.
    /// Feature values move by base name; values of features that vanished
    /// or whose range no longer accepts them are dropped. Indexes are
    /// rebuilt in their original insertion order. Fails with `UnknownType`,
    /// leaving the graph unchanged, if a record's type is missing.
    pub fn type_system_changed(&mut self, type_system: Arc<TypeSystem>) -> Result<()> {
        if !type_system.is_committed() {
            return Err(TypeSystemError::NotCommitted.into());
        }
        let old = Arc::clone(&self.type_system);

        let mut type_map: HashMap<TypeId, TypeId> = HashMap::new();
        for record in &self.records {
            if type_map.contains_key(&record.type_id) {
                continue;
            }
            let name = old.type_name(record.type_id);
            let new_type = type_system.get_type(name)?;
            if old.kind(record.type_id) != type_system.kind(new_type) {
                return Err(Error::unknown_type(name));
            }
            type_map.insert(record.type_id, new_type);
        }

        let mut records = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let new_type = type_map[&record.type_id];
            let body = match &record.body {
                FsBody::Array(data) => FsBody::Array(data.clone()),
                FsBody::Features(values) => {
                    let mut slots = default_slots(&type_system, new_type);
                    for decl in old.features(record.type_id) {
                        let Some(target) = type_system.feature_by_base_name(new_type, &decl.name) else {
                            continue;
                        };
                        let value = &values[decl.feature.slot()];
                        let type_of = |id: FsId| {
                            let record = self.records.get(id.slot())?;
                            type_map.get(&record.type_id).copied()
                        };
                        if range_accepts(&type_system, target.range(), value, type_of) {
                            slots[target.slot()] = value.clone();
                        }
                    }
                    FsBody::Features(slots)
                }
            };
            records.push(FsRecord {
                type_id: new_type,
                body,
            });
        }

        self.type_system = type_system;
        self.records = records;
        for vi in 0..self.views.len() {
            let order = self.views[vi].index.insertion_order();
            let mut index = IndexRepository::new();
            for id in order {
                let t = self.records[id.slot()].type_id;
                let span = if self.type_system.is_annotation(t) {
                    Some(self.span(id)?)
                } else {
                    None
                };
                index.add(id, t, span);
            }
            self.views[vi].index = index;
        }
        debug!(records = self.records.len(), "graph rebound to new type system");
        Ok(())
    }

    // ----- internals -----

    pub(crate) fn record(&self, id: FsId) -> Result<&FsRecord> {
        if id.get() == 0 {
            return Err(Error::unknown_record(id.get()));
        }
        self.records
            .get(id.slot())
            .ok_or_else(|| Error::unknown_record(id.get()))
    }

    fn record_mut(&mut self, id: FsId) -> Result<&mut FsRecord> {
        if id.get() == 0 {
            return Err(Error::unknown_record(id.get()));
        }
        self.records
            .get_mut(id.slot())
            .ok_or_else(|| Error::unknown_record(id.get()))
    }

    /// Write a slot without range or reservation checks
    pub(crate) fn write_slot(&mut self, id: FsId, slot: usize, value: Value) -> Result<()> {
        let record = self.record_mut(id)?;
        match record.slot_mut(slot) {
            Some(target) => {
                *target = value;
                Ok(())
            }
            None => Err(GraphError::NotAnArray { id: id.get() }.into()),
        }
    }

    /// Index of the named view, creating it with its sofa if needed
    pub(crate) fn ensure_view(&mut self, name: &str) -> usize {
        if let Some(&vi) = self.view_names.get(name) {
            return vi;
        }
        let sofa_num = self.views.len() as i32 + 1;
        let mut slots = self.default_slots(builtin::SOFA);
        slots[SOFA_SLOT_NUM] = Value::Integer(sofa_num);
        slots[SOFA_SLOT_ID] = Value::from(name);
        let sofa = self.push(builtin::SOFA, FsBody::Features(slots));

        let vi = self.views.len();
        self.views.push(View::new(name, sofa, sofa_num));
        self.view_names.insert(name.to_string(), vi);
        self.sofa_views.insert(sofa, vi);
        Metrics::global().graph.views_created.inc();
        debug!(view = name, sofa_num, sofa = sofa.get(), "view created");
        vi
    }

    pub(crate) fn view_mut(&mut self, name: &str) -> &mut View {
        let vi = self.ensure_view(name);
        &mut self.views[vi]
    }

    fn push(&mut self, t: TypeId, body: FsBody) -> FsId {
        let id = FsId::from_slot(self.records.len());
        self.records.push(FsRecord { type_id: t, body });
        Metrics::global().graph.records_created.inc();
        id
    }

    fn default_slots(&self, t: TypeId) -> Vec<Value> {
        default_slots(&self.type_system, t)
    }

    fn not_creatable(&self, t: TypeId) -> Error {
        GraphError::NotCreatable {
            type_name: self.type_system.type_name(t).to_string(),
        }
        .into()
    }

    fn check_feature(&self, t: TypeId, feature: Feature) -> Result<()> {
        let ts = &self.type_system;
        let valid = feature.domain().index() < ts.type_count()
            && ts.subsumes(feature.domain(), t)
            && ts.features(t).get(feature.slot()).map(|d| d.feature) == Some(feature);
        if valid {
            Ok(())
        } else {
            Err(TypeSystemError::UnknownFeature {
                type_name: ts.type_name(t).to_string(),
                feature: format!("{}:{}", feature.domain(), feature.slot()),
            }
            .into())
        }
    }

    fn check_value(&self, feature: Feature, value: &Value) -> Result<()> {
        let ts = &self.type_system;
        let range = feature.range();
        let ok = match (ts.primitive_kind(range), value) {
            (Some(kind), v) => v.matches_primitive(kind),
            (None, Value::Null) => true,
            (None, Value::Ref(target)) => {
                let target_type = self.type_of(*target)?;
                ts.subsumes(range, target_type)
            }
            (None, _) => false,
        };
        if ok {
            return Ok(());
        }
        let actual = match value {
            Value::Ref(target) => ts.type_name(self.type_of(*target)?).to_string(),
            other => other.kind_name().to_string(),
        };
        Err(GraphError::TypeMismatch {
            feature: ts.feature_name(feature).to_string(),
            expected: match ts.array_kind(range) {
                Some(kind) => format!("{} of {}", ts.type_name(range), array_element_name(kind)),
                None => ts.type_name(range).to_string(),
            },
            actual,
        }
        .into())
    }

    fn bound_sofa(&self, id: FsId) -> Option<FsId> {
        self.records
            .get(id.slot())?
            .slot(ANNOTATION_SLOT_SOFA)?
            .as_fs()
    }

    /// View an annotation-base record is bound to and indexed in
    fn indexed_view_of(&self, id: FsId) -> Option<usize> {
        let vi = *self.sofa_views.get(&self.bound_sofa(id)?)?;
        self.views[vi].contains(id).then_some(vi)
    }

    /// View an annotation-base record is bound to
    pub(crate) fn bound_view(&self, id: FsId) -> Result<&View> {
        self.record(id)?;
        self.bound_sofa(id)
            .and_then(|sofa| self.view_of_sofa(sofa))
            .ok_or_else(|| GraphError::UnboundAnnotation { id: id.get() }.into())
    }

    fn sofa_view_name(&self, sofa: FsId) -> &str {
        self.view_of_sofa(sofa).map(View::name).unwrap_or_default()
    }
}

fn is_reserved(feature: Feature) -> bool {
    feature.domain() == builtin::SOFA
        || (feature.domain() == builtin::ANNOTATION_BASE && feature.slot() == ANNOTATION_SLOT_SOFA)
}

fn check_span(span: Span, text_len: Option<usize>) -> Result<()> {
    let valid = match text_len {
        Some(length) => span.is_valid_for(length),
        None => span.begin >= 0 && span.begin <= span.end,
    };
    if valid {
        Ok(())
    } else {
        Err(GraphError::InvalidSpan {
            begin: span.begin,
            end: span.end,
            length: text_len.unwrap_or_default(),
        }
        .into())
    }
}

fn default_slots(ts: &TypeSystem, t: TypeId) -> Vec<Value> {
    ts.features(t)
        .iter()
        .map(|d| Value::default_for(ts.primitive_kind(d.feature.range())))
        .collect()
}

/// True if `value` may live in a slot with range `range`; `type_of` maps a
/// referenced record to its type in the same type system as `range`.
fn range_accepts<F>(ts: &TypeSystem, range: TypeId, value: &Value, type_of: F) -> bool
where
    F: Fn(FsId) -> Option<TypeId>,
{
    match (ts.primitive_kind(range), value) {
        (Some(kind), v) => v.matches_primitive(kind),
        (None, Value::Null) => true,
        (None, Value::Ref(target)) => type_of(*target).is_some_and(|t| ts.subsumes(range, t)),
        (None, _) => false,
    }
}

fn array_type(kind: crate::types::ArrayKind) -> TypeId {
    use crate::types::ArrayKind;
    match kind {
        ArrayKind::Fs => builtin::FS_ARRAY,
        ArrayKind::Boolean => builtin::BOOLEAN_ARRAY,
        ArrayKind::Byte => builtin::BYTE_ARRAY,
        ArrayKind::Short => builtin::SHORT_ARRAY,
        ArrayKind::Integer => builtin::INTEGER_ARRAY,
        ArrayKind::Long => builtin::LONG_ARRAY,
        ArrayKind::Float => builtin::FLOAT_ARRAY,
        ArrayKind::Double => builtin::DOUBLE_ARRAY,
        ArrayKind::String => builtin::STRING_ARRAY,
    }
}
