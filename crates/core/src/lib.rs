pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod format;
pub mod normalize;
pub mod validate;

pub use catalog::{Catalog, CatalogError, MatchCandidate};
pub use domain::outcome::{
    ErrorClass, ExpectedShape, Failure, FailureKind, NormalizedResult, RawOutcome, ThrownError,
    EMPTY_SUCCESS_CODE,
};
pub use domain::product::{CatalogEntry, ProductId};
pub use errors::GatewayError;
pub use format::Service;
pub use normalize::normalize;
pub use validate::{
    apply_defaults, validate, Args, Conditional, DefaultValue, OperationDescriptor, ParamKind,
    ParamSpec, Setting, SettingSource, Trigger, ValidationError,
};
