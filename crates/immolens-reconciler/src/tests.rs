//! Merge scenarios

#[cfg(test)]
mod tests {
    use crate::{MergeInputs, ReconcilerConfig, ReconciliationEngine, SuspicionRules};
    use immolens_domain::{
        DecisionKind, ExtractionResult, FieldName, FieldSet, FieldValue, PlausibilityBounds,
        Rejection, RejectionReason, Source,
    };
    use proptest::prelude::*;

    fn result(source: Source, values: &[(FieldName, FieldValue)]) -> ExtractionResult {
        ExtractionResult::new(source, values.iter().cloned().collect(), Vec::new())
    }

    fn num(v: f64) -> FieldValue {
        FieldValue::number(v)
    }

    struct Sources {
        structured: ExtractionResult,
        pattern: ExtractionResult,
        dom: ExtractionResult,
        llm: Option<ExtractionResult>,
    }

    impl Sources {
        fn empty() -> Self {
            Self {
                structured: ExtractionResult::empty(Source::StructuredData),
                pattern: ExtractionResult::empty(Source::Pattern),
                dom: ExtractionResult::empty(Source::DomHeuristic),
                llm: None,
            }
        }

        fn inputs(&self) -> MergeInputs<'_> {
            MergeInputs {
                structured: &self.structured,
                pattern: &self.pattern,
                dom: &self.dom,
                llm: self.llm.as_ref(),
            }
        }
    }

    fn merge(sources: &Sources) -> (immolens_domain::ReconciledRecord, immolens_domain::DecisionLog) {
        ReconciliationEngine::default().merge("test", sources.inputs())
    }

    #[test]
    fn test_structured_wins_price() {
        let mut s = Sources::empty();
        s.structured = result(Source::StructuredData, &[(FieldName::Price, num(289000.0))]);
        s.pattern = result(Source::Pattern, &[(FieldName::Price, num(1450.0))]);

        let (record, log) = merge(&s);
        assert_eq!(record.get(FieldName::Price), Some(&num(289000.0)));
        assert_eq!(record.source_of(FieldName::Price), Some(Source::StructuredData));
        assert_eq!(log.count(DecisionKind::Superseded), 1);
    }

    #[test]
    fn test_pattern_wins_recurring_cost() {
        let mut s = Sources::empty();
        s.structured = result(Source::StructuredData, &[(FieldName::MonthlyRecurringCost, num(99.0))]);
        s.pattern = result(Source::Pattern, &[(FieldName::MonthlyRecurringCost, num(145.0))]);
        s.dom = result(Source::DomHeuristic, &[(FieldName::MonthlyRecurringCost, num(150.0))]);

        let (record, log) = merge(&s);
        assert_eq!(record.get(FieldName::MonthlyRecurringCost), Some(&num(145.0)));
        assert_eq!(record.source_of(FieldName::MonthlyRecurringCost), Some(Source::Pattern));
        assert_eq!(
            log.for_field(FieldName::MonthlyRecurringCost)
                .filter(|d| d.kind == DecisionKind::Superseded)
                .count(),
            2
        );
    }

    #[test]
    fn test_dom_fills_but_never_overrides_pattern() {
        let mut s = Sources::empty();
        s.pattern = result(Source::Pattern, &[(FieldName::Rooms, num(3.0))]);
        s.dom = result(
            Source::DomHeuristic,
            &[(FieldName::Rooms, num(4.0)), (FieldName::SizeSqm, num(81.0))],
        );

        let (record, _) = merge(&s);
        assert_eq!(record.get(FieldName::Rooms), Some(&num(3.0)));
        assert_eq!(record.get(FieldName::SizeSqm), Some(&num(81.0)));
        assert_eq!(record.source_of(FieldName::SizeSqm), Some(Source::DomHeuristic));
    }

    #[test]
    fn test_llm_fills_missing_fields() {
        let mut s = Sources::empty();
        s.llm = Some(result(Source::Llm, &[(FieldName::YearBuilt, FieldValue::Integer(1965))]));

        let (record, log) = merge(&s);
        assert_eq!(record.get(FieldName::YearBuilt), Some(&FieldValue::Integer(1965)));
        let decision = &log.entries()[0];
        assert_eq!(decision.kind, DecisionKind::Accepted);
        assert_eq!(decision.before, None);
        assert_eq!(decision.predicate, "filled_missing");
    }

    #[test]
    fn test_llm_overwrites_suspicious_cost() {
        let mut s = Sources::empty();
        s.pattern = result(Source::Pattern, &[(FieldName::MonthlyRecurringCost, num(12.0))]);
        s.llm = Some(result(Source::Llm, &[(FieldName::MonthlyRecurringCost, num(145.0))]));

        let (record, log) = merge(&s);
        assert_eq!(record.get(FieldName::MonthlyRecurringCost), Some(&num(145.0)));
        assert_eq!(record.source_of(FieldName::MonthlyRecurringCost), Some(Source::Llm));

        let overwrite = log
            .entries()
            .iter()
            .find(|d| d.kind == DecisionKind::Overwritten)
            .unwrap();
        assert_eq!(overwrite.before, Some(num(12.0)));
        assert_eq!(overwrite.after, Some(num(145.0)));
        assert_eq!(overwrite.predicate, "cost_below_floor");
    }

    #[test]
    fn test_llm_needs_margin_to_overwrite_cost() {
        let mut s = Sources::empty();
        s.pattern = result(Source::Pattern, &[(FieldName::MonthlyRecurringCost, num(20.0))]);
        s.llm = Some(result(Source::Llm, &[(FieldName::MonthlyRecurringCost, num(35.0))]));

        let (record, log) = merge(&s);
        assert_eq!(record.get(FieldName::MonthlyRecurringCost), Some(&num(20.0)));
        assert_eq!(log.count(DecisionKind::Retained), 1);
        assert_eq!(log.count(DecisionKind::Overwritten), 0);
    }

    #[test]
    fn test_llm_cannot_clobber_good_value() {
        let mut s = Sources::empty();
        s.pattern = result(Source::Pattern, &[(FieldName::MonthlyRecurringCost, num(145.0))]);
        s.llm = Some(result(Source::Llm, &[(FieldName::MonthlyRecurringCost, num(400.0))]));

        let (record, log) = merge(&s);
        assert_eq!(record.get(FieldName::MonthlyRecurringCost), Some(&num(145.0)));
        let retained = log.entries().last().unwrap();
        assert_eq!(retained.kind, DecisionKind::Retained);
        assert!(retained.predicate.starts_with("existing_not_suspicious"));
    }

    #[test]
    fn test_llm_fixes_zero_bedrooms() {
        let mut s = Sources::empty();
        s.pattern = result(
            Source::Pattern,
            &[(FieldName::Rooms, num(3.0)), (FieldName::Bedrooms, FieldValue::Integer(0))],
        );
        s.llm = Some(result(Source::Llm, &[(FieldName::Bedrooms, FieldValue::Integer(2))]));

        let (record, log) = merge(&s);
        assert_eq!(record.get(FieldName::Bedrooms), Some(&FieldValue::Integer(2)));
        assert_eq!(log.count(DecisionKind::Overwritten), 1);
    }

    #[test]
    fn test_llm_candidate_that_is_also_suspicious_is_retained() {
        let mut s = Sources::empty();
        s.structured = result(Source::StructuredData, &[(FieldName::YearBuilt, FieldValue::Integer(1750))]);
        s.llm = Some(result(Source::Llm, &[(FieldName::YearBuilt, FieldValue::Integer(1780))]));

        let (record, _) = merge(&s);
        assert_eq!(record.get(FieldName::YearBuilt), Some(&FieldValue::Integer(1750)));
    }

    #[test]
    fn test_agreeing_llm_value_is_logged() {
        let mut s = Sources::empty();
        s.pattern = result(Source::Pattern, &[(FieldName::SizeSqm, num(70.0))]);
        s.llm = Some(result(Source::Llm, &[(FieldName::SizeSqm, num(70.0))]));

        let (record, log) = merge(&s);
        assert_eq!(record.source_of(FieldName::SizeSqm), Some(Source::Pattern));
        assert_eq!(log.entries().last().unwrap().predicate, "confirmed");
    }

    #[test]
    fn test_extractor_rejections_are_logged() {
        let mut s = Sources::empty();
        s.pattern = ExtractionResult::new(
            Source::Pattern,
            FieldSet::new(),
            vec![Rejection::new(
                FieldName::MonthlyRecurringCost,
                Source::Pattern,
                "1".to_string(),
                RejectionReason::OutOfRange {
                    value: 1.0,
                    min: 10.0,
                    max: 2000.0,
                },
            )],
        );

        let (record, log) = merge(&s);
        assert_eq!(record.get(FieldName::MonthlyRecurringCost), None);
        assert_eq!(log.count(DecisionKind::Rejected), 1);
        assert_eq!(log.entries()[0].source, Source::Pattern);
    }

    #[test]
    fn test_out_of_bounds_input_never_reaches_record() {
        let mut s = Sources::empty();
        // built by hand, bypassing the extractors' own checks
        s.structured = result(Source::StructuredData, &[(FieldName::Price, num(3.0))]);
        s.pattern = result(Source::Pattern, &[(FieldName::Price, num(310000.0))]);

        let (record, log) = merge(&s);
        assert_eq!(record.get(FieldName::Price), Some(&num(310000.0)));
        assert_eq!(log.count(DecisionKind::Rejected), 1);
    }

    #[test]
    fn test_custom_rules() {
        let config = ReconcilerConfig {
            suspicion: SuspicionRules {
                recurring_cost_floor: 200.0,
                ..SuspicionRules::default()
            },
        };
        let engine = ReconciliationEngine::new(config, PlausibilityBounds::default()).unwrap();
        let mut s = Sources::empty();
        s.pattern = result(Source::Pattern, &[(FieldName::MonthlyRecurringCost, num(145.0))]);
        s.llm = Some(result(Source::Llm, &[(FieldName::MonthlyRecurringCost, num(310.0))]));

        let (record, _) = engine.merge("x", s.inputs());
        assert_eq!(record.get(FieldName::MonthlyRecurringCost), Some(&num(310.0)));
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let mut config = ReconcilerConfig::default();
        config.suspicion.cost_override_margin = 0.0;
        assert!(ReconciliationEngine::new(config, PlausibilityBounds::default()).is_err());
    }

    fn arb_cost_result(source: Source) -> impl Strategy<Value = ExtractionResult> {
        (
            proptest::option::of(1.0f64..3000.0),
            proptest::option::of(1.0f64..3000.0),
            proptest::option::of(0u8..4),
        )
            .prop_map(move |(cost, size, rooms)| {
                let mut fields = FieldSet::new();
                if let Some(c) = cost {
                    fields.set(FieldName::MonthlyRecurringCost, FieldValue::number(c));
                }
                if let Some(s) = size {
                    fields.set(FieldName::SizeSqm, FieldValue::number(s));
                }
                if let Some(r) = rooms {
                    fields.set(FieldName::Bedrooms, FieldValue::Integer(r as i64));
                }
                ExtractionResult::new(source, fields, Vec::new())
            })
    }

    proptest! {
        #[test]
        fn prop_merge_is_deterministic_and_bounded(
            structured in arb_cost_result(Source::StructuredData),
            pattern in arb_cost_result(Source::Pattern),
            dom in arb_cost_result(Source::DomHeuristic),
            llm in arb_cost_result(Source::Llm),
        ) {
            let sources = Sources { structured, pattern, dom, llm: Some(llm) };
            let (first, first_log) = merge(&sources);
            let (second, second_log) = merge(&sources);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&first_log, &second_log);

            let bounds = PlausibilityBounds::default();
            for (field, value) in first.fields().iter() {
                prop_assert!(bounds.admits(field, value));
            }
        }

        #[test]
        fn prop_present_values_never_disappear(
            pattern in arb_cost_result(Source::Pattern),
            llm in arb_cost_result(Source::Llm),
        ) {
            let mut baseline = Sources::empty();
            baseline.pattern = pattern;
            let (before, _) = merge(&baseline);

            let mut with_llm = Sources::empty();
            with_llm.pattern = baseline.pattern.clone();
            with_llm.llm = Some(llm);
            let (after, _) = merge(&with_llm);

            for (field, _) in before.fields().iter() {
                prop_assert!(after.get(field).is_some());
            }
        }
    }
}
