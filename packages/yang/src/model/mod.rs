//! Data model
//!
//! Corresponds to §3. Split one file per entity kind, separating AST-style
//! data definitions from the passes that build and consume them: this
//! module only holds shapes, never builder/resolver logic.

pub mod deviation;
pub mod feature;
pub mod growable;
pub mod identity;
pub mod ids;
pub mod module;
pub mod node;
pub mod restriction;
pub mod typedef;
pub mod types;

pub use deviation::{Deviation, Pristine};
pub use feature::{Feature, IfFeature};
pub use growable::Growable;
pub use identity::{Identity, IdentityBase};
pub use ids::*;
pub use module::{ExternalFlag, Import, Include, Module, Revision};
pub use node::*;
pub use restriction::{Must, Restriction, When};
pub use typedef::Typedef;
pub use types::*;
