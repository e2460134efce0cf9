//! Type system: type definitions, feature declarations and subsumption.
//!
//! Types are registered before use and frozen by [`TypeSystem::commit`].
//! Committing compiles every type's inherited and declared features into one
//! flattened table, so a [`Feature`] handle resolves to a slot with a single
//! index lookup. Inherited features always come first, which keeps a slot
//! valid for every subtype of the declaring type.

use crate::core::error::{Result, TypeSystemError};
use crate::types::builtin::{self, BUILTIN_FEATURES, BUILTIN_TYPES};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Dense identifier of a type inside one type system
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Position of the type in registration order
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Primitive value kinds usable as feature ranges
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `uima.cas.Boolean`
    Boolean,
    /// `uima.cas.Byte`
    Byte,
    /// `uima.cas.Short`
    Short,
    /// `uima.cas.Integer`
    Integer,
    /// `uima.cas.Long`
    Long,
    /// `uima.cas.Float`
    Float,
    /// `uima.cas.Double`
    Double,
    /// `uima.cas.String`
    String,
}

/// Element kinds of the built-in array types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArrayKind {
    /// Array of references
    Fs,
    /// Array of booleans
    Boolean,
    /// Array of bytes
    Byte,
    /// Array of shorts
    Short,
    /// Array of 32-bit integers
    Integer,
    /// Array of 64-bit integers
    Long,
    /// Array of floats
    Float,
    /// Array of doubles
    Double,
    /// Array of strings
    String,
}

/// What instances of a type look like
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Value type, only usable as a feature range
    Primitive(PrimitiveKind),
    /// Built-in array type
    Array(ArrayKind),
    /// Record with features
    Structure,
}

/// Handle to a feature, valid on the declaring type and all its subtypes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Feature {
    domain: TypeId,
    slot: u32,
    range: TypeId,
}

impl Feature {
    /// Type that declares the feature
    pub fn domain(&self) -> TypeId {
        self.domain
    }

    /// Position in the flattened feature table
    pub fn slot(&self) -> usize {
        self.slot as usize
    }

    /// Declared range type
    pub fn range(&self) -> TypeId {
        self.range
    }
}

/// Entry of a flattened feature table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureDecl {
    /// Base name, unique within the type
    pub name: String,
    /// Resolved handle
    pub feature: Feature,
}

#[derive(Clone, Debug)]
struct TypeDef {
    name: String,
    supertype: Option<TypeId>,
    kind: TypeKind,
    declared: Vec<(String, TypeId)>,
    subtypes: Vec<TypeId>,
}

/// Set of types and features shared by every graph bound to it
#[derive(Clone, Debug)]
pub struct TypeSystem {
    types: Vec<TypeDef>,
    by_name: HashMap<String, TypeId>,
    tables: Vec<Vec<FeatureDecl>>,
    pre_order: Vec<u32>,
    post_order: Vec<u32>,
    sealed: bool,
}

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeSystem {
    /// Create an uncommitted type system holding the built-in types
    pub fn new() -> Self {
        let mut ts = Self {
            types: Vec::with_capacity(BUILTIN_TYPES.len()),
            by_name: HashMap::new(),
            tables: Vec::new(),
            pre_order: Vec::new(),
            post_order: Vec::new(),
            sealed: false,
        };

        for (name, supertype) in BUILTIN_TYPES {
            let supertype = supertype.and_then(|s| ts.by_name.get(s).copied());
            let kind = builtin_kind(name);
            ts.register(name, supertype, kind);
        }
        for (domain, name, range) in BUILTIN_FEATURES {
            ts.types[domain.index()].declared.push((name.to_string(), *range));
        }
        ts
    }

    /// Declare a new structure type under `supertype`
    pub fn add_type(&mut self, name: &str, supertype: TypeId) -> Result<TypeId> {
        self.ensure_open()?;
        self.check(supertype)?;
        if self.by_name.contains_key(name) {
            return Err(TypeSystemError::DuplicateType {
                name: name.to_string(),
            }
            .into());
        }
        let parent = &self.types[supertype.index()];
        if parent.kind != TypeKind::Structure || supertype == builtin::SOFA {
            return Err(TypeSystemError::NotExtensible {
                type_name: parent.name.clone(),
            }
            .into());
        }
        Ok(self.register(name, Some(supertype), TypeKind::Structure))
    }

    /// Declare a feature on `domain` with the given range type.
    ///
    /// Handles become available through [`feature_by_base_name`](Self::feature_by_base_name)
    /// once the type system is committed.
    pub fn add_feature(&mut self, domain: TypeId, name: &str, range: TypeId) -> Result<()> {
        self.ensure_open()?;
        self.check(domain)?;
        self.check(range)?;
        let builtin_count = BUILTIN_TYPES.len();
        if domain.index() < builtin_count && domain != builtin::DOCUMENT_ANNOTATION {
            return Err(TypeSystemError::NotExtensible {
                type_name: self.type_name(domain).to_string(),
            }
            .into());
        }
        let mut cursor = Some(domain);
        while let Some(t) = cursor {
            let def = &self.types[t.index()];
            if def.declared.iter().any(|(n, _)| n == name) {
                return Err(TypeSystemError::DuplicateFeature {
                    type_name: self.type_name(domain).to_string(),
                    feature: name.to_string(),
                }
                .into());
            }
            cursor = def.supertype;
        }
        self.types[domain.index()]
            .declared
            .push((name.to_string(), range));
        Ok(())
    }

    /// Freeze the type system and compile feature tables and subsumption.
    ///
    /// Committing twice is a no-op.
    pub fn commit(&mut self) -> Result<()> {
        if self.sealed {
            return Ok(());
        }

        // Supertypes are always registered before their subtypes
        let mut tables: Vec<Vec<FeatureDecl>> = Vec::with_capacity(self.types.len());
        for (index, def) in self.types.iter().enumerate() {
            let mut table = match def.supertype {
                Some(parent) => tables[parent.index()].clone(),
                None => Vec::new(),
            };
            for (name, range) in &def.declared {
                if table.iter().any(|d| &d.name == name) {
                    return Err(TypeSystemError::DuplicateFeature {
                        type_name: def.name.clone(),
                        feature: name.clone(),
                    }
                    .into());
                }
                let feature = Feature {
                    domain: TypeId(index as u32),
                    slot: table.len() as u32,
                    range: *range,
                };
                table.push(FeatureDecl {
                    name: name.clone(),
                    feature,
                });
            }
            tables.push(table);
        }

        let (pre_order, post_order) = self.number_hierarchy();
        self.tables = tables;
        self.pre_order = pre_order;
        self.post_order = post_order;
        self.sealed = true;
        tracing::debug!(types = self.types.len(), "type system committed");
        Ok(())
    }

    /// True once [`commit`](Self::commit) succeeded
    pub fn is_committed(&self) -> bool {
        self.sealed
    }

    /// Number of registered types, built-ins included
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Look a type up by name
    pub fn type_by_name(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Look a type up by name, failing with `UnknownType`
    pub fn get_type(&self, name: &str) -> Result<TypeId> {
        self.type_by_name(name).ok_or_else(|| {
            TypeSystemError::UnknownType {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Fail with `UnknownType` if the id does not belong to this type system
    pub fn check(&self, t: TypeId) -> Result<()> {
        if t.index() < self.types.len() {
            Ok(())
        } else {
            Err(TypeSystemError::UnknownType {
                name: t.to_string(),
            }
            .into())
        }
    }

    /// Name of a type, empty for an id this system never issued
    pub fn type_name(&self, t: TypeId) -> &str {
        self.types.get(t.index()).map_or("", |def| def.name.as_str())
    }

    /// Direct supertype, `None` for the root or an unknown id
    pub fn supertype(&self, t: TypeId) -> Option<TypeId> {
        self.types.get(t.index())?.supertype
    }

    /// Kind of a type, `None` for an unknown id
    pub fn kind(&self, t: TypeId) -> Option<TypeKind> {
        self.types.get(t.index()).map(|def| def.kind)
    }

    /// True if `b` is `a` or a descendant of `a`
    pub fn subsumes(&self, a: TypeId, b: TypeId) -> bool {
        if a.index() >= self.types.len() || b.index() >= self.types.len() {
            return false;
        }
        if self.sealed {
            return self.pre_order[a.index()] <= self.pre_order[b.index()]
                && self.post_order[b.index()] <= self.post_order[a.index()];
        }
        let mut cursor = Some(b);
        while let Some(t) = cursor {
            if t == a {
                return true;
            }
            cursor = self.types[t.index()].supertype;
        }
        false
    }

    /// Immediate subtypes in registration order
    pub fn direct_subtypes(&self, t: TypeId) -> &[TypeId] {
        self.types
            .get(t.index())
            .map(|def| def.subtypes.as_slice())
            .unwrap_or(&[])
    }

    /// All descendants of `t`, excluding `t`, in depth-first order
    pub fn proper_subtypes(&self, t: TypeId) -> Vec<TypeId> {
        let mut out = Vec::new();
        let mut stack: Vec<TypeId> = self.direct_subtypes(t).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.direct_subtypes(next).iter().rev().copied());
        }
        out
    }

    /// Flattened feature table (inherited first). Empty until committed.
    pub fn features(&self, t: TypeId) -> &[FeatureDecl] {
        self.tables.get(t.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Features declared directly on `t`: (base name, range)
    pub fn declared_features(&self, t: TypeId) -> impl Iterator<Item = (&str, TypeId)> {
        self.types
            .get(t.index())
            .into_iter()
            .flat_map(|def| def.declared.iter())
            .map(|(name, range)| (name.as_str(), *range))
    }

    /// Resolve a feature by base name on a type (declared or inherited)
    pub fn feature_by_base_name(&self, t: TypeId, name: &str) -> Option<Feature> {
        self.features(t)
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.feature)
    }

    /// Like [`feature_by_base_name`](Self::feature_by_base_name), failing with `UnknownFeature`
    pub fn get_feature(&self, t: TypeId, name: &str) -> Result<Feature> {
        if !self.sealed {
            return Err(TypeSystemError::NotCommitted.into());
        }
        self.feature_by_base_name(t, name).ok_or_else(|| {
            TypeSystemError::UnknownFeature {
                type_name: self.type_name(t).to_string(),
                feature: name.to_string(),
            }
            .into()
        })
    }

    /// Base name of a feature
    pub fn feature_name(&self, f: Feature) -> &str {
        self.features(f.domain)
            .get(f.slot())
            .map_or("", |d| d.name.as_str())
    }

    /// Primitive kind of a range type, `None` for reference ranges
    pub fn primitive_kind(&self, t: TypeId) -> Option<PrimitiveKind> {
        match self.kind(t) {
            Some(TypeKind::Primitive(kind)) => Some(kind),
            _ => None,
        }
    }

    /// Element kind if `t` is an array type
    pub fn array_kind(&self, t: TypeId) -> Option<ArrayKind> {
        match self.kind(t) {
            Some(TypeKind::Array(kind)) => Some(kind),
            _ => None,
        }
    }

    /// True for `uima.tcas.Annotation` and its subtypes
    pub fn is_annotation(&self, t: TypeId) -> bool {
        self.subsumes(builtin::ANNOTATION, t)
    }

    /// True for `uima.cas.AnnotationBase` and its subtypes
    pub fn is_annotation_base(&self, t: TypeId) -> bool {
        self.subsumes(builtin::ANNOTATION_BASE, t)
    }

    /// True for types registered after the built-ins
    pub fn is_user_type(&self, t: TypeId) -> bool {
        t.index() >= BUILTIN_TYPES.len()
    }

    /// Every type id in registration order
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> {
        (0..self.types.len() as u32).map(TypeId)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.sealed {
            Err(TypeSystemError::Sealed.into())
        } else {
            Ok(())
        }
    }

    fn register(&mut self, name: &str, supertype: Option<TypeId>, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeDef {
            name: name.to_string(),
            supertype,
            kind,
            declared: Vec::new(),
            subtypes: Vec::new(),
        });
        if let Some(parent) = supertype {
            self.types[parent.index()].subtypes.push(id);
        }
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Depth-first pre/post numbering from the root; `a` subsumes `b` iff
    /// `b`'s interval nests inside `a`'s.
    fn number_hierarchy(&self) -> (Vec<u32>, Vec<u32>) {
        let mut pre = vec![0u32; self.types.len()];
        let mut post = vec![0u32; self.types.len()];
        let mut counter = 0u32;
        let mut stack: Vec<(TypeId, usize)> = vec![(builtin::TOP, 0)];
        pre[builtin::TOP.index()] = counter;
        counter += 1;

        while let Some((t, child)) = stack.pop() {
            let subtypes = &self.types[t.index()].subtypes;
            if child < subtypes.len() {
                stack.push((t, child + 1));
                let next = subtypes[child];
                pre[next.index()] = counter;
                counter += 1;
                stack.push((next, 0));
            } else {
                post[t.index()] = counter;
                counter += 1;
            }
        }
        (pre, post)
    }
}

fn builtin_kind(name: &str) -> TypeKind {
    use builtin::*;
    match name {
        TYPE_NAME_BOOLEAN => TypeKind::Primitive(PrimitiveKind::Boolean),
        TYPE_NAME_BYTE => TypeKind::Primitive(PrimitiveKind::Byte),
        TYPE_NAME_SHORT => TypeKind::Primitive(PrimitiveKind::Short),
        TYPE_NAME_INTEGER => TypeKind::Primitive(PrimitiveKind::Integer),
        TYPE_NAME_LONG => TypeKind::Primitive(PrimitiveKind::Long),
        TYPE_NAME_FLOAT => TypeKind::Primitive(PrimitiveKind::Float),
        TYPE_NAME_DOUBLE => TypeKind::Primitive(PrimitiveKind::Double),
        TYPE_NAME_STRING => TypeKind::Primitive(PrimitiveKind::String),
        TYPE_NAME_FS_ARRAY => TypeKind::Array(ArrayKind::Fs),
        TYPE_NAME_BOOLEAN_ARRAY => TypeKind::Array(ArrayKind::Boolean),
        TYPE_NAME_BYTE_ARRAY => TypeKind::Array(ArrayKind::Byte),
        TYPE_NAME_SHORT_ARRAY => TypeKind::Array(ArrayKind::Short),
        TYPE_NAME_INTEGER_ARRAY => TypeKind::Array(ArrayKind::Integer),
        TYPE_NAME_LONG_ARRAY => TypeKind::Array(ArrayKind::Long),
        TYPE_NAME_FLOAT_ARRAY => TypeKind::Array(ArrayKind::Float),
        TYPE_NAME_DOUBLE_ARRAY => TypeKind::Array(ArrayKind::Double),
        TYPE_NAME_STRING_ARRAY => TypeKind::Array(ArrayKind::String),
        _ => TypeKind::Structure,
    }
}
