mod catalog;
mod error;
mod flatten;
mod geometry;
mod layout;
mod panel;
mod projection;
mod raster;
mod session;
mod transform;
mod viewport;

pub use catalog::{BaseLayer, LayerCatalog};
pub use error::MapError;
pub use flatten::{densify, Flattener, ScreenPolyline, CURVE_STEPS, VECTOR_COLOR};
pub use geometry::{Coord, Geometry, GeometryKind, LineKind, MultiKind};
pub use layout::{Control, ControlLayout, LayoutConfig, ScreenRect};
pub use panel::{Panel, PanelState};
pub use projection::{project, rescale_factor, unproject};
pub use raster::{sample, try_sample, PixelBuffer, RasterBand, Rgb, BACKGROUND, FOREGROUND};
pub use session::{MapSession, RenderSet};
pub use transform::{CoordinateTransform, SpatialReference};
pub use viewport::{fit, ViewportFit};
