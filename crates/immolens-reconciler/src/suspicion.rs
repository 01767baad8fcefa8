//! Detection of values that look like extraction failures

use crate::config::SuspicionRules;
use immolens_domain::{FieldName, FieldSet, FieldValue};
use std::fmt;

/// Why a present value is suspected to be wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspicion {
    /// Recurring cost under the configured floor
    CostBelowFloor,
    /// Recurring cost implausibly low for the unit's size
    CostPerSqmTooLow,
    /// Repair fund contribution under the configured floor
    RepairFundBelowFloor,
    /// Construction year outside the plausible range
    YearOutOfRange,
    /// Floor number higher than any plausible building
    FloorTooHigh,
    /// No bedrooms although the room count says otherwise
    ZeroBedrooms,
    /// No bathrooms in a unit large enough to have one
    ZeroBathrooms,
}

impl Suspicion {
    /// Predicate name used in decision logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Suspicion::CostBelowFloor => "cost_below_floor",
            Suspicion::CostPerSqmTooLow => "cost_per_sqm_too_low",
            Suspicion::RepairFundBelowFloor => "repair_fund_below_floor",
            Suspicion::YearOutOfRange => "year_out_of_range",
            Suspicion::FloorTooHigh => "floor_too_high",
            Suspicion::ZeroBedrooms => "zero_bedrooms",
            Suspicion::ZeroBathrooms => "zero_bathrooms",
        }
    }
}

impl fmt::Display for Suspicion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SuspicionRules {
    /// Check one value of `field`; `context` supplies related fields such as
    /// the room count for a bedroom check
    pub fn check(&self, field: FieldName, value: &FieldValue, context: &FieldSet) -> Option<Suspicion> {
        match field {
            FieldName::MonthlyRecurringCost => {
                let cost = value.as_f64()?;
                if cost < self.recurring_cost_floor {
                    return Some(Suspicion::CostBelowFloor);
                }
                let size = context.number(FieldName::SizeSqm)?;
                (size > 0.0 && cost / size < self.cost_per_sqm_floor)
                    .then_some(Suspicion::CostPerSqmTooLow)
            }
            FieldName::RepairFundContribution => {
                let cost = value.as_f64()?;
                (cost < self.repair_fund_floor).then_some(Suspicion::RepairFundBelowFloor)
            }
            FieldName::YearBuilt => {
                let year = value.as_i64()?;
                (year < self.year_min || year > self.year_max).then_some(Suspicion::YearOutOfRange)
            }
            FieldName::Floor => {
                let floor = value.as_i64()?;
                (floor > self.max_plausible_floor).then_some(Suspicion::FloorTooHigh)
            }
            FieldName::Bedrooms => {
                let rooms = context.number(FieldName::Rooms)?;
                (value.as_i64()? == 0 && rooms >= self.bedroom_rooms_threshold)
                    .then_some(Suspicion::ZeroBedrooms)
            }
            FieldName::Bathrooms => {
                let size = context.number(FieldName::SizeSqm)?;
                (value.as_i64()? == 0 && size > self.bathroom_size_threshold)
                    .then_some(Suspicion::ZeroBathrooms)
            }
            _ => None,
        }
    }

    /// Every suspicious value in `fields`, in canonical field order
    pub fn scan(&self, fields: &FieldSet) -> Vec<(FieldName, Suspicion)> {
        fields
            .iter()
            .filter_map(|(field, value)| self.check(field, value, fields).map(|s| (field, s)))
            .collect()
    }

    /// Whether a replacement for a suspicious cost is clearly better
    ///
    /// The candidate must clear the floor and exceed the current value by
    /// the override margin.
    pub(crate) fn cost_replacement_ok(&self, field: FieldName, current: f64, candidate: f64) -> bool {
        let floor = match field {
            FieldName::MonthlyRecurringCost => self.recurring_cost_floor,
            FieldName::RepairFundContribution => self.repair_fund_floor,
            _ => return true,
        };
        candidate >= floor && candidate > current * self.cost_override_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[(FieldName, FieldValue)]) -> FieldSet {
        values.iter().cloned().collect()
    }

    #[test]
    fn test_cost_floor() {
        let rules = SuspicionRules::default();
        let empty = FieldSet::new();
        assert_eq!(
            rules.check(FieldName::MonthlyRecurringCost, &FieldValue::Number(12.0), &empty),
            Some(Suspicion::CostBelowFloor)
        );
        assert_eq!(
            rules.check(FieldName::MonthlyRecurringCost, &FieldValue::Number(145.0), &empty),
            None
        );
    }

    #[test]
    fn test_cost_per_sqm() {
        let rules = SuspicionRules::default();
        let context = set(&[(FieldName::SizeSqm, FieldValue::Number(200.0))]);
        assert_eq!(
            rules.check(FieldName::MonthlyRecurringCost, &FieldValue::Number(60.0), &context),
            Some(Suspicion::CostPerSqmTooLow)
        );
        assert_eq!(
            rules.check(FieldName::MonthlyRecurringCost, &FieldValue::Number(250.0), &context),
            None
        );
    }

    #[test]
    fn test_bedrooms_need_room_context() {
        let rules = SuspicionRules::default();
        let zero = FieldValue::Integer(0);
        assert_eq!(rules.check(FieldName::Bedrooms, &zero, &FieldSet::new()), None);

        let studio = set(&[(FieldName::Rooms, FieldValue::Number(1.0))]);
        assert_eq!(rules.check(FieldName::Bedrooms, &zero, &studio), None);

        let flat = set(&[(FieldName::Rooms, FieldValue::Number(3.0))]);
        assert_eq!(rules.check(FieldName::Bedrooms, &zero, &flat), Some(Suspicion::ZeroBedrooms));
        assert_eq!(rules.check(FieldName::Bedrooms, &FieldValue::Integer(2), &flat), None);
    }

    #[test]
    fn test_year_and_floor() {
        let rules = SuspicionRules::default();
        let empty = FieldSet::new();
        assert_eq!(
            rules.check(FieldName::YearBuilt, &FieldValue::Integer(1750), &empty),
            Some(Suspicion::YearOutOfRange)
        );
        assert_eq!(rules.check(FieldName::YearBuilt, &FieldValue::Integer(1990), &empty), None);
        assert_eq!(
            rules.check(FieldName::Floor, &FieldValue::Integer(24), &empty),
            Some(Suspicion::FloorTooHigh)
        );
    }

    #[test]
    fn test_scan_in_field_order() {
        let rules = SuspicionRules::default();
        let fields = set(&[
            (FieldName::MonthlyRecurringCost, FieldValue::Number(5.0)),
            (FieldName::YearBuilt, FieldValue::Integer(1200)),
            (FieldName::Price, FieldValue::Number(250000.0)),
        ]);
        assert_eq!(
            rules.scan(&fields),
            vec![
                (FieldName::YearBuilt, Suspicion::YearOutOfRange),
                (FieldName::MonthlyRecurringCost, Suspicion::CostBelowFloor),
            ]
        );
    }

    #[test]
    fn test_cost_replacement_margin() {
        let rules = SuspicionRules::default();
        assert!(rules.cost_replacement_ok(FieldName::MonthlyRecurringCost, 12.0, 145.0));
        // above the floor but not twice the current value
        assert!(!rules.cost_replacement_ok(FieldName::MonthlyRecurringCost, 20.0, 35.0));
        // twice the current value but still under the floor
        assert!(!rules.cost_replacement_ok(FieldName::MonthlyRecurringCost, 5.0, 25.0));
    }
}
