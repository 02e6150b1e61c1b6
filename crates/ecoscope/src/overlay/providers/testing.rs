use std::collections::BTreeMap;
use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::gateway::{GatewayError, NearbySearch, Place, PlacesGateway};
use crate::geo::{BoundingBox, LatLng};

/// Places fake answering by type filter; unknown types return nothing.
#[derive(Debug, Default)]
pub(crate) struct ScriptedPlaces {
    by_type: BTreeMap<&'static str, Vec<Place>>,
    failing: Vec<&'static str>,
    pub(crate) requests: Mutex<Vec<NearbySearch>>,
}

impl ScriptedPlaces {
    pub(crate) fn with(mut self, kind: &'static str, places: Vec<Place>) -> Self {
        self.by_type.insert(kind, places);
        self
    }

    pub(crate) fn failing(mut self, kind: &'static str) -> Self {
        self.failing.push(kind);
        self
    }
}

impl PlacesGateway for ScriptedPlaces {
    fn nearby_search(&self, request: NearbySearch) -> BoxFuture<'_, Result<Vec<Place>, GatewayError>> {
        let outcome = if request.types.iter().any(|kind| self.failing.contains(kind)) {
            Err(GatewayError::Rejected("OVER_QUERY_LIMIT".into()))
        } else {
            let mut seen = Vec::new();
            let mut places: Vec<Place> = Vec::new();
            for kind in &request.types {
                for place in self.by_type.get(kind).into_iter().flatten() {
                    if !seen.contains(&place.place_id) {
                        seen.push(place.place_id.clone());
                        places.push(place.clone());
                    }
                }
            }
            Ok(places)
        };
        self.requests
            .lock()
            .expect("request log mutex poisoned")
            .push(request);
        async move { outcome }.boxed()
    }

    fn geocode(&self, place_id: String) -> BoxFuture<'_, Result<LatLng, GatewayError>> {
        async move { Err(GatewayError::Rejected(format!("unknown place {place_id}"))) }.boxed()
    }
}

pub(crate) fn place(id: &str, name: &str, location: LatLng, types: &[&str]) -> Place {
    Place {
        place_id: id.to_string(),
        name: name.to_string(),
        location,
        types: types.iter().map(|kind| kind.to_string()).collect(),
        ..Place::default()
    }
}

pub(crate) fn square(center: LatLng, half_side_deg: f64) -> BoundingBox {
    BoundingBox {
        sw: LatLng::new(center.lat - half_side_deg, center.lng - half_side_deg),
        ne: LatLng::new(center.lat + half_side_deg, center.lng + half_side_deg),
    }
}
