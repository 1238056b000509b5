//! Go data-access code generation
//!
//! This crate handles:
//! - Mapping query and field names to Go identifiers
//! - Resolving package prefixes of field types to imports
//! - Rendering query accessors and the library scaffold from templates
//! - Passing generated code through the external formatter

pub mod emitter;
pub mod format;
pub mod generator;
pub mod imports;
pub mod naming;
pub mod view;

pub use emitter::{EmitError, Emitter, GoEmitter, Metadata};
pub use format::{FormatError, Gofmt, SourceFormatter, Verbatim};
pub use generator::{package_name, Generator, DEFAULT_PACKAGE};
pub use imports::{Import, ImportSet, ImportTable};
pub use naming::{identifier, GoNaming, Naming};
