//! Collection tree nodes.

pub mod encoded;
pub mod model;
pub mod path;
pub mod request;

pub use encoded::{Encoded, EncodedForm};
pub use model::{Collection, Folder, TreeContainer};
pub use path::FolderPath;
pub use request::{AuthDescriptor, RequestPatch, RequestRecord};
