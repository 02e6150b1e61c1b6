//! Primitive contract consumed from the 3D render surface.

mod primitive;
mod surface;

pub use primitive::{
    AltitudeMode, Color, MarkerPrimitive, PolygonPrimitive, PolylinePrimitive, Primitive,
};
pub use surface::{LayerRenderHandle, PrimitiveHandle, RenderSurface};
