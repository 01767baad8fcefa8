//! Prompt construction for listing field extraction

use immolens_domain::{Bound, FieldName, FieldSet, PlausibilityBounds};

/// Builds prompts for the model to extract listing fields
pub struct PromptBuilder {
    text: String,
    fields: Vec<FieldName>,
    existing: Option<FieldSet>,
    bounds: Option<PlausibilityBounds>,
}

impl PromptBuilder {
    /// Create a new prompt builder over preprocessed page text
    ///
    /// All fields are requested until [`with_fields`](Self::with_fields)
    /// narrows the list.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fields: FieldName::ALL.to_vec(),
            existing: None,
            bounds: None,
        }
    }

    /// Restrict the requested fields
    pub fn with_fields(mut self, fields: &[FieldName]) -> Self {
        self.fields = fields.to_vec();
        self
    }

    /// Values found by the other extractors, for the model to verify
    pub fn with_existing(mut self, existing: &FieldSet) -> Self {
        if !existing.is_empty() {
            self.existing = Some(existing.clone());
        }
        self
    }

    /// State the plausibility rules in the prompt
    pub fn with_bounds(mut self, bounds: &PlausibilityBounds) -> Self {
        self.bounds = Some(bounds.clone());
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Instructions
        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 2. Field list with type, unit and local terms
        prompt.push_str("Fields to extract:\n");
        for field in &self.fields {
            let (hint, terms) = describe(*field);
            prompt.push_str(&format!(
                "- {} ({}): {}. Terms: {}\n",
                field,
                field.kind(),
                hint,
                terms
            ));
        }
        prompt.push('\n');

        // 3. Worked examples
        prompt.push_str(EXAMPLES);
        prompt.push_str("\n\n");

        // 4. Values to verify
        if let Some(existing) = &self.existing {
            prompt.push_str(
                "Values found by other extractors. Verify each against the page; \
                 correct it if the page says otherwise, keep it if it agrees:\n",
            );
            let json = serde_json::to_string_pretty(existing).unwrap_or_default();
            prompt.push_str(&json);
            prompt.push_str("\n\n");
        }

        // 5. Plausibility rules
        if let Some(bounds) = &self.bounds {
            let rules = self.rules(bounds);
            if !rules.is_empty() {
                prompt.push_str("Validation rules (use null when no value satisfies them):\n");
                prompt.push_str(&rules);
                prompt.push('\n');
            }
        }

        // 6. The page
        prompt.push_str("Listing page:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.text);
        prompt.push_str("\n---\n\n");

        // 7. Output format reminder
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }

    fn rules(&self, bounds: &PlausibilityBounds) -> String {
        let mut rules = String::new();
        for field in &self.fields {
            match bounds.get(*field) {
                Some(Bound::Range { min, max }) => {
                    rules.push_str(&format!("- {}: between {} and {}\n", field, min, max));
                }
                Some(Bound::OneOf { allowed }) => {
                    rules.push_str(&format!("- {}: one of {}\n", field, allowed.join(", ")));
                }
                None => {}
            }
        }
        rules
    }
}

/// What a field means and the German words that announce it
fn describe(field: FieldName) -> (&'static str, &'static str) {
    match field {
        FieldName::Title => ("listing headline", "Titel, Überschrift"),
        FieldName::Price => ("purchase price in EUR", "Kaufpreis, Preis"),
        FieldName::SizeSqm => ("living area in m²", "Wohnfläche, Nutzfläche, Fläche"),
        FieldName::Rooms => ("room count, halves allowed", "Zimmer, Zi., Räume"),
        FieldName::Bedrooms => ("bedroom count", "Schlafzimmer"),
        FieldName::Bathrooms => ("bathroom count", "Badezimmer, Bad, Bäder"),
        FieldName::Floor => (
            "floor number; ground floor is 0, basement -1",
            "Stock, Etage, OG, Erdgeschoss (EG), Souterrain",
        ),
        FieldName::YearBuilt => ("construction year", "Baujahr, erbaut"),
        FieldName::Condition => ("state of the unit", "Zustand, Erstbezug, saniert"),
        FieldName::BuildingType => ("building era or style", "Altbau, Neubau, Bauart"),
        FieldName::EnergyRating => ("energy class letter", "Energieklasse, HWB-Klasse"),
        FieldName::HwbValue => ("heating demand in kWh/m²a", "HWB, Heizwärmebedarf"),
        FieldName::FgeeValue => ("overall energy efficiency factor", "fGEE"),
        FieldName::HeatingType => ("heating system", "Heizung, Fernwärme, Gas"),
        FieldName::MonthlyRecurringCost => (
            "monthly operating costs in EUR",
            "Betriebskosten, Nebenkosten, BK, NK",
        ),
        FieldName::RepairFundContribution => (
            "monthly repair fund contribution in EUR",
            "Reparaturrücklage, Reparaturfonds",
        ),
        FieldName::CommissionPercent => ("agent commission in percent", "Provision, Maklerprovision"),
        FieldName::Elevator => ("has an elevator", "Aufzug, Lift"),
        FieldName::Balcony => ("has a balcony", "Balkon"),
        FieldName::Terrace => ("has a terrace", "Terrasse"),
        FieldName::Loggia => ("has a loggia", "Loggia"),
        FieldName::Garden => ("has a garden", "Garten, Eigengarten"),
        FieldName::Parking => ("parking option", "Tiefgarage, Garage, Stellplatz"),
        FieldName::Cellar => ("has a cellar", "Keller, Kellerabteil"),
        FieldName::Storage => ("has a storage room", "Abstellraum"),
        FieldName::Furnished => ("is furnished", "möbliert"),
        FieldName::BarrierFree => ("is barrier free", "barrierefrei"),
        FieldName::CommissionFree => ("no agent commission", "provisionsfrei"),
        FieldName::Address => ("street and number", "Adresse, Lage"),
        FieldName::PostalCode => ("postal code", "PLZ"),
        FieldName::City => ("city or district", "Ort, Stadt, Bezirk"),
        FieldName::DescriptionSummary => ("one-sentence summary of the description", "Beschreibung"),
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You extract facts from an Austrian real-estate listing page.
The page is German. Numbers use German notation: "." separates thousands and
"," is the decimal mark, so "250.000,50" is 250000.5.

Rules:
- Return exactly one JSON object whose keys are the field names listed below
- Use null for anything the page does not state; never guess
- Numbers are plain JSON numbers without units or currency symbols
- For a range such as "40-140" use the lower number
- Monthly costs are per month; convert yearly amounts only if the page says they are yearly
- Placeholder amounts such as "€ 1" or "auf Anfrage" are not values; use null
- Booleans are true only when the page says the feature exists"#;

const EXAMPLES: &str = r#"Examples:

Input: "Kaufpreis: € 289.000 | Wohnfläche ca. 68,5 m² | 3 Zimmer | Betriebskosten: € 185,40 | Lift"
Output: {"price": 289000, "size_sqm": 68.5, "rooms": 3, "monthly_recurring_cost": 185.4, "elevator": true}

Input: "Erdgeschoss, Baujahr 1975, BK € 1 (siehe Exposé), Fernwärme"
Output: {"floor": 0, "year_built": 1975, "monthly_recurring_cost": null, "heating_type": "fernwarme"}"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (one JSON object, no additional text):
{"field_name": value, ...}

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

#[cfg(test)]
mod tests {
    use super::*;
    use immolens_domain::FieldValue;

    #[test]
    fn test_prompt_includes_text_and_instructions() {
        let prompt = PromptBuilder::new("Kaufpreis € 199.000").build();
        assert!(prompt.contains("Kaufpreis € 199.000"));
        assert!(prompt.contains("German notation"));
        assert!(prompt.contains("Return ONLY valid JSON"));
    }

    #[test]
    fn test_prompt_lists_requested_fields_with_terms() {
        let prompt = PromptBuilder::new("text")
            .with_fields(&[FieldName::MonthlyRecurringCost, FieldName::Floor])
            .build();
        assert!(prompt.contains("- monthly_recurring_cost (number)"));
        assert!(prompt.contains("Betriebskosten, Nebenkosten"));
        assert!(prompt.contains("- floor (integer)"));
        assert!(!prompt.contains("- price ("));
    }

    #[test]
    fn test_prompt_includes_existing_values() {
        let mut existing = FieldSet::new();
        existing.set(FieldName::Price, FieldValue::number(250000.0));
        let prompt = PromptBuilder::new("text").with_existing(&existing).build();
        assert!(prompt.contains("Verify each"));
        assert!(prompt.contains("\"price\": 250000.0"));
    }

    #[test]
    fn test_empty_existing_values_are_omitted() {
        let prompt = PromptBuilder::new("text")
            .with_existing(&FieldSet::new())
            .build();
        assert!(!prompt.contains("Verify each"));
    }

    #[test]
    fn test_prompt_includes_bounds() {
        let prompt = PromptBuilder::new("text")
            .with_fields(&[FieldName::MonthlyRecurringCost, FieldName::EnergyRating])
            .with_bounds(&PlausibilityBounds::default())
            .build();
        assert!(prompt.contains("- monthly_recurring_cost: between 10 and 2000"));
        assert!(prompt.contains("- energy_rating: one of A++, A+, A, B"));
    }

    #[test]
    fn test_every_field_is_described() {
        for field in FieldName::ALL {
            let (hint, terms) = describe(field);
            assert!(!hint.is_empty() && !terms.is_empty(), "{}", field);
        }
    }
}
