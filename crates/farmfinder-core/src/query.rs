//! Store-agnostic description of a proximity search.
//!
//! A [`ProximityQuery`] is a conjunction of named [`Predicate`] clauses plus a
//! result limit. Building one does no I/O; the storage layer renders it.
//!
//! The limit applies per fulfillment mode: the store runs one query per mode
//! (see [`ProximityQuery::for_mode`]) so a crowd of pickup-only locations can
//! never push delivery locations out of the result, or the reverse.

use crate::geo::StorePoint;
use crate::locations::{BusinessType, Practice};
use crate::search::normalize_limit;
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentMode {
    Pickup,
    Delivery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Stored point lies within `radius_miles` of `center`.
    WithinRadius {
        center: StorePoint,
        radius_miles: f64,
    },
    /// Location offers pickup or delivery.
    OffersFulfillment,
    /// Location is eligible for this mode. For delivery that includes the
    /// location's own delivery range.
    Supports(FulfillmentMode),
    /// Business-type tags contain this type.
    HasBusinessType(BusinessType),
    /// Practice tags contain every listed practice.
    HasAllPractices(Vec<Practice>),
}

impl Predicate {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Predicate::WithinRadius { .. } => "within_radius",
            Predicate::OffersFulfillment => "offers_fulfillment",
            Predicate::Supports(FulfillmentMode::Pickup) => "supports_pickup",
            Predicate::Supports(FulfillmentMode::Delivery) => "supports_delivery",
            Predicate::HasBusinessType(_) => "business_type",
            Predicate::HasAllPractices(_) => "practices",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProximityQuery {
    center: StorePoint,
    radius_miles: f64,
    predicates: Vec<Predicate>,
    limit: i64,
}

impl ProximityQuery {
    #[must_use]
    pub fn builder(center: StorePoint, radius_miles: f64) -> ProximityQueryBuilder {
        ProximityQueryBuilder {
            center,
            radius_miles,
            business_type: None,
            practices: Vec::new(),
            limit: None,
        }
    }

    #[must_use]
    pub fn center(&self) -> StorePoint {
        self.center
    }

    #[must_use]
    pub fn radius_miles(&self) -> f64 {
        self.radius_miles
    }

    /// The clauses to conjoin. The radius clause is always first.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Row cap. Applied separately to each fulfillment mode.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Narrow the query to one fulfillment mode, replacing the
    /// [`Predicate::OffersFulfillment`] clause.
    #[must_use]
    pub fn for_mode(&self, mode: FulfillmentMode) -> ProximityQuery {
        let predicates = self
            .predicates
            .iter()
            .map(|predicate| match predicate {
                Predicate::OffersFulfillment | Predicate::Supports(_) => {
                    Predicate::Supports(mode)
                }
                other => other.clone(),
            })
            .collect();
        ProximityQuery {
            predicates,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProximityQueryBuilder {
    center: StorePoint,
    radius_miles: f64,
    business_type: Option<BusinessType>,
    practices: Vec<Practice>,
    limit: Option<i64>,
}

impl ProximityQueryBuilder {
    #[must_use]
    pub fn business_type(mut self, business_type: Option<BusinessType>) -> Self {
        self.business_type = business_type;
        self
    }

    #[must_use]
    pub fn practices(mut self, practices: impl IntoIterator<Item = Practice>) -> Self {
        for practice in practices {
            if !self.practices.contains(&practice) {
                self.practices.push(practice);
            }
        }
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRadius`] when the radius is zero, negative
    /// or not finite.
    pub fn build(self) -> Result<ProximityQuery, CoreError> {
        if !self.radius_miles.is_finite() || self.radius_miles <= 0.0 {
            return Err(CoreError::InvalidRadius(self.radius_miles));
        }

        let mut predicates = vec![
            Predicate::WithinRadius {
                center: self.center,
                radius_miles: self.radius_miles,
            },
            Predicate::OffersFulfillment,
        ];
        if let Some(business_type) = self.business_type {
            predicates.push(Predicate::HasBusinessType(business_type));
        }
        if !self.practices.is_empty() {
            predicates.push(Predicate::HasAllPractices(self.practices));
        }

        Ok(ProximityQuery {
            center: self.center,
            radius_miles: self.radius_miles,
            predicates,
            limit: normalize_limit(self.limit),
        })
    }
}
