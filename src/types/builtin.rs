//! Names and ids of the built-in types and features.
//!
//! Built-ins are registered by [`TypeSystem::new`](super::TypeSystem::new) in
//! the order of [`BUILTIN_TYPES`], so their ids are fixed.

use super::type_system::TypeId;

/// Root of the type hierarchy
pub const TYPE_NAME_TOP: &str = "uima.cas.TOP";
/// Boolean primitive
pub const TYPE_NAME_BOOLEAN: &str = "uima.cas.Boolean";
/// 8-bit integer primitive
pub const TYPE_NAME_BYTE: &str = "uima.cas.Byte";
/// 16-bit integer primitive
pub const TYPE_NAME_SHORT: &str = "uima.cas.Short";
/// 32-bit integer primitive
pub const TYPE_NAME_INTEGER: &str = "uima.cas.Integer";
/// 64-bit integer primitive
pub const TYPE_NAME_LONG: &str = "uima.cas.Long";
/// 32-bit float primitive
pub const TYPE_NAME_FLOAT: &str = "uima.cas.Float";
/// 64-bit float primitive
pub const TYPE_NAME_DOUBLE: &str = "uima.cas.Double";
/// String primitive
pub const TYPE_NAME_STRING: &str = "uima.cas.String";
/// Abstract array root
pub const TYPE_NAME_ARRAY_BASE: &str = "uima.cas.ArrayBase";
/// Array of feature structure references
pub const TYPE_NAME_FS_ARRAY: &str = "uima.cas.FSArray";
/// Boolean array
pub const TYPE_NAME_BOOLEAN_ARRAY: &str = "uima.cas.BooleanArray";
/// Byte array
pub const TYPE_NAME_BYTE_ARRAY: &str = "uima.cas.ByteArray";
/// Short array
pub const TYPE_NAME_SHORT_ARRAY: &str = "uima.cas.ShortArray";
/// Integer array
pub const TYPE_NAME_INTEGER_ARRAY: &str = "uima.cas.IntegerArray";
/// Long array
pub const TYPE_NAME_LONG_ARRAY: &str = "uima.cas.LongArray";
/// Float array
pub const TYPE_NAME_FLOAT_ARRAY: &str = "uima.cas.FloatArray";
/// Double array
pub const TYPE_NAME_DOUBLE_ARRAY: &str = "uima.cas.DoubleArray";
/// String array
pub const TYPE_NAME_STRING_ARRAY: &str = "uima.cas.StringArray";
/// Subject of analysis
pub const TYPE_NAME_SOFA: &str = "uima.cas.Sofa";
/// Records bound to a view
pub const TYPE_NAME_ANNOTATION_BASE: &str = "uima.cas.AnnotationBase";
/// Text span records
pub const TYPE_NAME_ANNOTATION: &str = "uima.tcas.Annotation";
/// Whole-document annotation
pub const TYPE_NAME_DOCUMENT_ANNOTATION: &str = "uima.tcas.DocumentAnnotation";

/// Sofa number feature
pub const FEATURE_BASE_NAME_SOFANUM: &str = "sofaNum";
/// Sofa id (view name) feature
pub const FEATURE_BASE_NAME_SOFAID: &str = "sofaID";
/// Sofa MIME type feature
pub const FEATURE_BASE_NAME_SOFAMIME: &str = "mimeType";
/// Sofa array payload feature
pub const FEATURE_BASE_NAME_SOFAARRAY: &str = "sofaArray";
/// Sofa text payload feature
pub const FEATURE_BASE_NAME_SOFASTRING: &str = "sofaString";
/// Sofa URI payload feature
pub const FEATURE_BASE_NAME_SOFAURI: &str = "sofaURI";
/// Link from an annotation-base record to its sofa
pub const FEATURE_BASE_NAME_SOFA: &str = "sofa";
/// Annotation begin offset
pub const FEATURE_BASE_NAME_BEGIN: &str = "begin";
/// Annotation end offset
pub const FEATURE_BASE_NAME_END: &str = "end";
/// Document language
pub const FEATURE_BASE_NAME_LANGUAGE: &str = "language";

/// Name of the view every graph starts with
pub const INITIAL_VIEW_NAME: &str = "_InitialView";

/// Language of a document annotation nobody set a language on
pub const DEFAULT_LANGUAGE: &str = "x-unspecified";

/// `uima.cas.TOP`
pub const TOP: TypeId = TypeId(0);
/// `uima.cas.Boolean`
pub const BOOLEAN: TypeId = TypeId(1);
/// `uima.cas.Byte`
pub const BYTE: TypeId = TypeId(2);
/// `uima.cas.Short`
pub const SHORT: TypeId = TypeId(3);
/// `uima.cas.Integer`
pub const INTEGER: TypeId = TypeId(4);
/// `uima.cas.Long`
pub const LONG: TypeId = TypeId(5);
/// `uima.cas.Float`
pub const FLOAT: TypeId = TypeId(6);
/// `uima.cas.Double`
pub const DOUBLE: TypeId = TypeId(7);
/// `uima.cas.String`
pub const STRING: TypeId = TypeId(8);
/// `uima.cas.ArrayBase`
pub const ARRAY_BASE: TypeId = TypeId(9);
/// `uima.cas.FSArray`
pub const FS_ARRAY: TypeId = TypeId(10);
/// `uima.cas.BooleanArray`
pub const BOOLEAN_ARRAY: TypeId = TypeId(11);
/// `uima.cas.ByteArray`
pub const BYTE_ARRAY: TypeId = TypeId(12);
/// `uima.cas.ShortArray`
pub const SHORT_ARRAY: TypeId = TypeId(13);
/// `uima.cas.IntegerArray`
pub const INTEGER_ARRAY: TypeId = TypeId(14);
/// `uima.cas.LongArray`
pub const LONG_ARRAY: TypeId = TypeId(15);
/// `uima.cas.FloatArray`
pub const FLOAT_ARRAY: TypeId = TypeId(16);
/// `uima.cas.DoubleArray`
pub const DOUBLE_ARRAY: TypeId = TypeId(17);
/// `uima.cas.StringArray`
pub const STRING_ARRAY: TypeId = TypeId(18);
/// `uima.cas.Sofa`
pub const SOFA: TypeId = TypeId(19);
/// `uima.cas.AnnotationBase`
pub const ANNOTATION_BASE: TypeId = TypeId(20);
/// `uima.tcas.Annotation`
pub const ANNOTATION: TypeId = TypeId(21);
/// `uima.tcas.DocumentAnnotation`
pub const DOCUMENT_ANNOTATION: TypeId = TypeId(22);

/// Built-in types in registration order: (name, supertype name)
pub(crate) const BUILTIN_TYPES: &[(&str, Option<&str>)] = &[
    (TYPE_NAME_TOP, None),
    (TYPE_NAME_BOOLEAN, Some(TYPE_NAME_TOP)),
    (TYPE_NAME_BYTE, Some(TYPE_NAME_TOP)),
    (TYPE_NAME_SHORT, Some(TYPE_NAME_TOP)),
    (TYPE_NAME_INTEGER, Some(TYPE_NAME_TOP)),
    (TYPE_NAME_LONG, Some(TYPE_NAME_TOP)),
    (TYPE_NAME_FLOAT, Some(TYPE_NAME_TOP)),
    (TYPE_NAME_DOUBLE, Some(TYPE_NAME_TOP)),
    (TYPE_NAME_STRING, Some(TYPE_NAME_TOP)),
    (TYPE_NAME_ARRAY_BASE, Some(TYPE_NAME_TOP)),
    (TYPE_NAME_FS_ARRAY, Some(TYPE_NAME_ARRAY_BASE)),
    (TYPE_NAME_BOOLEAN_ARRAY, Some(TYPE_NAME_ARRAY_BASE)),
    (TYPE_NAME_BYTE_ARRAY, Some(TYPE_NAME_ARRAY_BASE)),
    (TYPE_NAME_SHORT_ARRAY, Some(TYPE_NAME_ARRAY_BASE)),
    (TYPE_NAME_INTEGER_ARRAY, Some(TYPE_NAME_ARRAY_BASE)),
    (TYPE_NAME_LONG_ARRAY, Some(TYPE_NAME_ARRAY_BASE)),
    (TYPE_NAME_FLOAT_ARRAY, Some(TYPE_NAME_ARRAY_BASE)),
    (TYPE_NAME_DOUBLE_ARRAY, Some(TYPE_NAME_ARRAY_BASE)),
    (TYPE_NAME_STRING_ARRAY, Some(TYPE_NAME_ARRAY_BASE)),
    (TYPE_NAME_SOFA, Some(TYPE_NAME_TOP)),
    (TYPE_NAME_ANNOTATION_BASE, Some(TYPE_NAME_TOP)),
    (TYPE_NAME_ANNOTATION, Some(TYPE_NAME_ANNOTATION_BASE)),
    (TYPE_NAME_DOCUMENT_ANNOTATION, Some(TYPE_NAME_ANNOTATION)),
];

/// Built-in features: (domain, base name, range)
pub(crate) const BUILTIN_FEATURES: &[(TypeId, &str, TypeId)] = &[
    (SOFA, FEATURE_BASE_NAME_SOFANUM, INTEGER),
    (SOFA, FEATURE_BASE_NAME_SOFAID, STRING),
    (SOFA, FEATURE_BASE_NAME_SOFAMIME, STRING),
    (SOFA, FEATURE_BASE_NAME_SOFAARRAY, TOP),
    (SOFA, FEATURE_BASE_NAME_SOFASTRING, STRING),
    (SOFA, FEATURE_BASE_NAME_SOFAURI, STRING),
    (ANNOTATION_BASE, FEATURE_BASE_NAME_SOFA, SOFA),
    (ANNOTATION, FEATURE_BASE_NAME_BEGIN, INTEGER),
    (ANNOTATION, FEATURE_BASE_NAME_END, INTEGER),
    (DOCUMENT_ANNOTATION, FEATURE_BASE_NAME_LANGUAGE, STRING),
];

/// Slot of `sofaNum` in the sofa feature table
pub(crate) const SOFA_SLOT_NUM: usize = 0;
/// Slot of `sofaID`
pub(crate) const SOFA_SLOT_ID: usize = 1;
/// Slot of `mimeType`
pub(crate) const SOFA_SLOT_MIME: usize = 2;
/// Slot of `sofaArray`
pub(crate) const SOFA_SLOT_ARRAY: usize = 3;
/// Slot of `sofaString`
pub(crate) const SOFA_SLOT_STRING: usize = 4;
/// Slot of `sofaURI`
pub(crate) const SOFA_SLOT_URI: usize = 5;
/// Slot of `AnnotationBase.sofa` in every annotation-base table
pub(crate) const ANNOTATION_SLOT_SOFA: usize = 0;
/// Slot of `Annotation.begin`
pub(crate) const ANNOTATION_SLOT_BEGIN: usize = 1;
/// Slot of `Annotation.end`
pub(crate) const ANNOTATION_SLOT_END: usize = 2;
/// Slot of `DocumentAnnotation.language`
pub(crate) const DOCUMENT_SLOT_LANGUAGE: usize = 3;
