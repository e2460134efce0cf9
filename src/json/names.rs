//! Reserved field names of the JSON exchange format

/// Type declarations section
pub const TYPES_FIELD: &str = "%TYPES";
/// Feature structures section
pub const FEATURE_STRUCTURES_FIELD: &str = "%FEATURE_STRUCTURES";
/// Views section
pub const VIEWS_FIELD: &str = "%VIEWS";

/// Record id
pub const ID_FIELD: &str = "%ID";
/// Record type name
pub const TYPE_FIELD: &str = "%TYPE";
/// Array elements
pub const ELEMENTS_FIELD: &str = "%ELEMENTS";

/// Sofa of a view
pub const VIEW_SOFA_FIELD: &str = "%SOFA";
/// Records indexed in a view
pub const VIEW_MEMBERS_FIELD: &str = "%MEMBERS";

/// Name of a declared type or feature
pub const NAME_FIELD: &str = "%NAME";
/// Supertype of a declared type
pub const SUPER_TYPE_FIELD: &str = "%SUPER_TYPE";
/// Range of a declared feature
pub const RANGE_FIELD: &str = "%RANGE";

/// Prefix of reserved fields
pub const RESERVED_FIELD_PREFIX: char = '%';
/// Prefix of reference-valued features
pub const REF_FEATURE_PREFIX: char = '@';

/// Not-a-number float
pub const NUMBER_NAN: &str = "NaN";
/// Positive infinity
pub const NUMBER_POSITIVE_INFINITY: &str = "Infinity";
/// Negative infinity
pub const NUMBER_NEGATIVE_INFINITY: &str = "-Infinity";
