pub mod color;
pub mod error;
pub mod filter;
pub mod image_buf;
pub mod operation;
pub mod parameter;
pub mod pipeline;
pub mod representation;
pub mod source;

pub use error::{CatalogError, LookupError, MixerError, ParameterError};
pub use filter::{FilterClass, FilterKind};
pub use image_buf::{ImageBuf, Orientation};
pub use operation::lookup::{IdentityLookups, LookupResolver, LookupTable};
pub use operation::{ImageOperation, Operation};
pub use parameter::{Color, ParameterDescriptor, ParameterValue, Position, Size};
pub use pipeline::preview::PreviewRenderer;
pub use pipeline::{Chain, FilterMixer, PipelineState};
pub use representation::OperationRepresentation;
