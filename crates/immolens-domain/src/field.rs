//! Field module - the closed vocabulary of listing attributes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The value type a field carries once accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Decimal quantity, stored rounded to two decimal places
    Number,

    /// Whole quantity (bedrooms, floor, year)
    Integer,

    /// Feature flag
    Boolean,

    /// Free or enumerated text
    Text,
}

impl FieldKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Text => "text",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named attribute of an apartment listing
///
/// The declaration order is the canonical field order: records, decision
/// logs, and serialized output all iterate fields in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    /// Listing headline
    Title,
    /// Purchase price in EUR
    Price,
    /// Living area in m²
    SizeSqm,
    /// Room count (half rooms allowed)
    Rooms,
    /// Bedroom count
    Bedrooms,
    /// Bathroom count
    Bathrooms,
    /// Floor number, 0 = ground floor
    Floor,
    /// Construction year
    YearBuilt,
    /// Condition category (Erstbezug, saniert, ...)
    Condition,
    /// Building category (Altbau, Neubau, ...)
    BuildingType,
    /// Energy efficiency class
    EnergyRating,
    /// Heating energy demand in kWh/m²a
    HwbValue,
    /// Total energy efficiency factor
    FgeeValue,
    /// Heating system
    HeatingType,
    /// Monthly operating costs (Betriebskosten) in EUR
    MonthlyRecurringCost,
    /// Monthly maintenance reserve (Reparaturrücklage) in EUR
    RepairFundContribution,
    /// Broker commission in percent of price
    CommissionPercent,
    /// Building has an elevator
    Elevator,
    /// Unit has a balcony
    Balcony,
    /// Unit has a terrace
    Terrace,
    /// Unit has a loggia
    Loggia,
    /// Unit has a private garden
    Garden,
    /// Parking category
    Parking,
    /// Unit has a cellar compartment
    Cellar,
    /// Unit has a storage room
    Storage,
    /// Unit is sold furnished
    Furnished,
    /// Step-free access
    BarrierFree,
    /// No broker commission
    CommissionFree,
    /// Street address
    Address,
    /// Postal code
    PostalCode,
    /// City or district
    City,
    /// Short free-text summary
    DescriptionSummary,
}

impl FieldName {
    /// Number of fields in the vocabulary
    pub const COUNT: usize = 32;

    /// Every field, in canonical order
    pub const ALL: [FieldName; FieldName::COUNT] = [
        FieldName::Title,
        FieldName::Price,
        FieldName::SizeSqm,
        FieldName::Rooms,
        FieldName::Bedrooms,
        FieldName::Bathrooms,
        FieldName::Floor,
        FieldName::YearBuilt,
        FieldName::Condition,
        FieldName::BuildingType,
        FieldName::EnergyRating,
        FieldName::HwbValue,
        FieldName::FgeeValue,
        FieldName::HeatingType,
        FieldName::MonthlyRecurringCost,
        FieldName::RepairFundContribution,
        FieldName::CommissionPercent,
        FieldName::Elevator,
        FieldName::Balcony,
        FieldName::Terrace,
        FieldName::Loggia,
        FieldName::Garden,
        FieldName::Parking,
        FieldName::Cellar,
        FieldName::Storage,
        FieldName::Furnished,
        FieldName::BarrierFree,
        FieldName::CommissionFree,
        FieldName::Address,
        FieldName::PostalCode,
        FieldName::City,
        FieldName::DescriptionSummary,
    ];

    /// Position of this field in [`FieldName::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Get the field name as a snake_case string
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Title => "title",
            FieldName::Price => "price",
            FieldName::SizeSqm => "size_sqm",
            FieldName::Rooms => "rooms",
            FieldName::Bedrooms => "bedrooms",
            FieldName::Bathrooms => "bathrooms",
            FieldName::Floor => "floor",
            FieldName::YearBuilt => "year_built",
            FieldName::Condition => "condition",
            FieldName::BuildingType => "building_type",
            FieldName::EnergyRating => "energy_rating",
            FieldName::HwbValue => "hwb_value",
            FieldName::FgeeValue => "fgee_value",
            FieldName::HeatingType => "heating_type",
            FieldName::MonthlyRecurringCost => "monthly_recurring_cost",
            FieldName::RepairFundContribution => "repair_fund_contribution",
            FieldName::CommissionPercent => "commission_percent",
            FieldName::Elevator => "elevator",
            FieldName::Balcony => "balcony",
            FieldName::Terrace => "terrace",
            FieldName::Loggia => "loggia",
            FieldName::Garden => "garden",
            FieldName::Parking => "parking",
            FieldName::Cellar => "cellar",
            FieldName::Storage => "storage",
            FieldName::Furnished => "furnished",
            FieldName::BarrierFree => "barrier_free",
            FieldName::CommissionFree => "commission_free",
            FieldName::Address => "address",
            FieldName::PostalCode => "postal_code",
            FieldName::City => "city",
            FieldName::DescriptionSummary => "description_summary",
        }
    }

    /// Parse a field from its snake_case name
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_ascii_lowercase();
        FieldName::ALL.iter().copied().find(|f| f.as_str() == key)
    }

    /// The value type this field carries
    pub fn kind(&self) -> FieldKind {
        use FieldName::*;
        match self {
            Price | SizeSqm | Rooms | HwbValue | FgeeValue | MonthlyRecurringCost
            | RepairFundContribution | CommissionPercent => FieldKind::Number,
            Bedrooms | Bathrooms | Floor | YearBuilt => FieldKind::Integer,
            Elevator | Balcony | Terrace | Loggia | Garden | Cellar | Storage | Furnished
            | BarrierFree | CommissionFree => FieldKind::Boolean,
            Title | Condition | BuildingType | EnergyRating | HeatingType | Parking
            | Address | PostalCode | City | DescriptionSummary => FieldKind::Text,
        }
    }

    /// Whether the field is a monthly cost that free text reports more
    /// reliably than structured metadata
    pub fn is_recurring_cost(&self) -> bool {
        matches!(
            self,
            FieldName::MonthlyRecurringCost | FieldName::RepairFundContribution
        )
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::parse(s).ok_or_else(|| format!("Unknown field: {}", s))
    }
}
