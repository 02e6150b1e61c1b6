use serde::Serialize;

use super::primitive::Primitive;
use crate::overlay::LayerId;

/// Opaque token returned by the surface for one attached primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PrimitiveHandle(pub u64);

/// The render surface. Only the lifecycle manager calls these.
pub trait RenderSurface: Send + Sync {
    fn attach(&self, primitive: Primitive) -> PrimitiveHandle;
    fn detach(&self, handle: PrimitiveHandle);
}

/// Every primitive attached on behalf of one layer.
#[derive(Debug)]
pub struct LayerRenderHandle {
    layer: LayerId,
    primitives: Vec<PrimitiveHandle>,
}

impl LayerRenderHandle {
    pub(crate) fn attach_all<S>(surface: &S, layer: LayerId, primitives: Vec<Primitive>) -> Self
    where
        S: RenderSurface + ?Sized,
    {
        let primitives = primitives
            .into_iter()
            .map(|primitive| surface.attach(primitive))
            .collect();
        Self { layer, primitives }
    }

    pub(crate) fn release<S>(self, surface: &S)
    where
        S: RenderSurface + ?Sized,
    {
        for handle in self.primitives {
            surface.detach(handle);
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}
