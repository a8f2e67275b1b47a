#[cfg(test)]
mod tests {
    use crate::reconciliation::*;
    use crate::transactions::{AcquisitionAction, DispositionAction, TransactionCategory};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn context(calculated: Decimal, actual: Decimal, price: Decimal) -> InterpolationContext {
        InterpolationContext {
            symbol: "MSFT".to_string(),
            calculated: CalculatedHoldings {
                quantity: calculated,
                ..CalculatedHoldings::default()
            },
            actual: SnapshotPosition {
                symbol: "MSFT".to_string(),
                quantity: actual,
                market_value: actual * price,
                price,
            },
        }
    }

    #[test]
    fn test_positive_gap_proposes_buy() {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let proposal = InterpolationSynthesizer::new()
            .synthesize_at(&GapEstimate::default(), &context(dec!(100), dec!(105), dec!(20)), now)
            .expect("proposal");

        assert_eq!(
            proposal.category,
            TransactionCategory::Acquisition(AcquisitionAction::Buy)
        );
        assert_eq!(proposal.quantity, dec!(5));
        assert_eq!(proposal.price, dec!(20));
        assert_eq!(proposal.amount, dec!(100));
        assert_eq!(proposal.date, now);
        assert_eq!(proposal.confidence, InterpolationConfidence::Low);
        assert!(proposal.is_interpolated);
        assert!(!proposal.persisted);
        assert!(proposal.id.starts_with("INTERP-"));
    }

    #[test]
    fn test_negative_gap_proposes_sell_of_absolute_quantity() {
        let proposal = InterpolationSynthesizer::new()
            .synthesize(&GapEstimate::default(), &context(dec!(50), dec!(42.5), dec!(10)))
            .expect("proposal");

        assert_eq!(
            proposal.category,
            TransactionCategory::Disposition(DispositionAction::Sell)
        );
        assert_eq!(proposal.quantity, dec!(7.5));
        assert_eq!(proposal.amount, dec!(75.0));
    }

    #[test]
    fn test_gap_estimate_overrides_defaults() {
        let estimated = Utc.with_ymd_and_hms(2023, 3, 15, 0, 0, 0).unwrap();
        let gap = GapEstimate {
            estimated_date: Some(estimated),
            confidence: Some(InterpolationConfidence::High),
        };
        let proposal = InterpolationSynthesizer::new()
            .synthesize(&gap, &context(dec!(0), dec!(10), dec!(3)))
            .unwrap();

        assert_eq!(proposal.date, estimated);
        assert_eq!(proposal.confidence, InterpolationConfidence::High);
    }

    #[test]
    fn test_no_proposal_within_epsilon() {
        let synthesizer = InterpolationSynthesizer::new();
        assert!(synthesizer
            .synthesize(&GapEstimate::default(), &context(dec!(10), dec!(10), dec!(5)))
            .is_none());
        assert!(synthesizer
            .synthesize(&GapEstimate::default(), &context(dec!(10), dec!(10.0008), dec!(5)))
            .is_none());
    }

    #[test]
    fn test_confirm_produces_matching_transaction() {
        let proposal = InterpolationSynthesizer::new()
            .synthesize(&GapEstimate::default(), &context(dec!(10), dec!(12), dec!(50)))
            .unwrap();
        let id = proposal.id.clone();
        let date = proposal.date;

        let transaction = proposal.confirm();
        assert_eq!(transaction.id, id);
        assert_eq!(transaction.date, Some(date));
        assert_eq!(transaction.symbol, "MSFT");
        assert_eq!(transaction.quantity, dec!(2));
        assert_eq!(transaction.amount, dec!(100));
        assert!(transaction.lot_ids.is_empty());
    }

    #[test]
    fn test_proposal_serializes_interpolation_flags() {
        let proposal = InterpolationSynthesizer::new()
            .synthesize(&GapEstimate::default(), &context(dec!(1), dec!(3), dec!(1)))
            .unwrap();
        let json = serde_json::to_value(&proposal).unwrap();

        assert_eq!(json["isInterpolated"], true);
        assert_eq!(json["persisted"], false);
        assert_eq!(json["category"], "ACQUISITION");
        assert_eq!(json["action"], "BUY");
        assert_eq!(json["confidence"], "LOW");
    }
}
