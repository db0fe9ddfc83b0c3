//! HTML source tree to Notion blocks.
//!
//! [`classify`] decides what each element becomes, [`converter`] walks the
//! tree, [`tables`] handles table shape, [`markers`] moves blocks out of
//! positions Notion does not allow, and [`media`] resolves image sources.

pub mod classify;
pub mod context;
pub mod converter;
pub mod markers;
pub mod media;
pub mod order;
mod tables;

pub use classify::{classify, BlockDecision, BlockKind, CalloutStyle, ListItemKind};
pub use context::{ConversionContext, ExtractionContext, ListKind};
pub use converter::{convert, Conversion};
pub use markers::{resolve_markers, BlockSlot, DeferredBlockMap, DeferredEntry};
pub use media::resolve_media;
pub use order::{sort_by_key_order, OrderIndex};
