#[cfg(test)]
mod tests {
    use crate::holdings::*;
    use crate::transactions::{
        AcquisitionAction, CorporateActionKind, DispositionAction, Transaction,
        TransactionCategory,
    };
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(
        id: &str,
        on: DateTime<Utc>,
        category: TransactionCategory,
        quantity: Decimal,
        amount: Decimal,
    ) -> Transaction {
        Transaction::new(id, on, "VTI", category, quantity, Decimal::ZERO, amount)
    }

    fn buy(id: &str, on: DateTime<Utc>, quantity: Decimal, amount: Decimal) -> Transaction {
        tx(
            id,
            on,
            TransactionCategory::Acquisition(AcquisitionAction::Buy),
            quantity,
            amount,
        )
    }

    fn sell(id: &str, on: DateTime<Utc>, quantity: Decimal) -> Transaction {
        tx(
            id,
            on,
            TransactionCategory::Disposition(DispositionAction::Sell),
            quantity,
            quantity * dec!(25),
        )
    }

    fn corporate(id: &str, on: DateTime<Utc>, kind: CorporateActionKind, post: Decimal) -> Transaction {
        tx(
            id,
            on,
            TransactionCategory::CorporateAction(kind),
            post,
            Decimal::ZERO,
        )
    }

    fn history() -> Vec<Transaction> {
        vec![
            sell("s1", at(2024, 3, 1), dec!(5)),
            buy("b2", at(2024, 2, 1), dec!(10), dec!(200)),
            buy("b1", at(2024, 1, 1), dec!(10), dec!(100)),
        ]
    }

    #[test]
    fn test_target_before_first_transaction_is_empty() {
        let result = HoldingsCalculator::new().calculate("VTI", &history(), day(2023, 12, 31));

        assert_eq!(result.holdings.quantity, Decimal::ZERO);
        assert_eq!(result.holdings.total_cost_basis, Decimal::ZERO);
        assert_eq!(result.holdings.average_cost_per_share, Decimal::ZERO);
        assert!(result.holdings.earliest_acquisition_date.is_none());
        assert!(result.applied_transactions.is_empty());
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_sale_relieves_cost_proportionally() {
        let result = HoldingsCalculator::new().calculate("VTI", &history(), day(2024, 12, 31));
        let holdings = &result.holdings;

        assert_eq!(holdings.quantity, dec!(15));
        assert_eq!(holdings.total_cost_basis, dec!(225));
        assert_eq!(holdings.average_cost_per_share, dec!(15));
        assert_eq!(holdings.earliest_acquisition_date, Some(at(2024, 1, 1)));
        let applied: Vec<&str> = result
            .applied_transactions
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(applied, vec!["b1", "b2", "s1"]);
    }

    #[test]
    fn test_later_transactions_are_excluded_without_warning() {
        let result = HoldingsCalculator::new().calculate("VTI", &history(), day(2024, 2, 15));

        assert_eq!(result.holdings.quantity, dec!(20));
        assert_eq!(result.holdings.total_cost_basis, dec!(300));
        assert_eq!(result.holdings.as_of, day(2024, 2, 15));
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_target_date_is_inclusive() {
        let afternoon = Utc.with_ymd_and_hms(2024, 1, 1, 15, 30, 0).unwrap();
        let transactions = vec![buy("b1", afternoon, dec!(2), dec!(50))];
        let result = HoldingsCalculator::new().calculate("VTI", &transactions, day(2024, 1, 1));
        assert_eq!(result.holdings.quantity, dec!(2));
    }

    #[test]
    fn test_oversold_position_keeps_cost_basis() {
        let transactions = vec![
            buy("b1", at(2024, 1, 1), dec!(10), dec!(100)),
            sell("s1", at(2024, 2, 1), dec!(12)),
        ];
        let result = HoldingsCalculator::new().calculate("VTI", &transactions, day(2024, 12, 31));

        assert_eq!(result.holdings.quantity, dec!(-2));
        assert_eq!(result.holdings.total_cost_basis, dec!(100));
        assert_eq!(result.holdings.average_cost_per_share, Decimal::ZERO);
        assert_eq!(result.applied_transactions.len(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].transaction_id, "s1");
    }

    #[test]
    fn test_forward_split_rescales_quantity_only() {
        let transactions = vec![
            buy("b1", at(2024, 1, 1), dec!(10), dec!(1000)),
            corporate("sp", at(2024, 6, 1), CorporateActionKind::StockSplit, dec!(20)),
        ];
        let result = HoldingsCalculator::new().calculate("VTI", &transactions, day(2024, 12, 31));

        assert_eq!(result.holdings.quantity, dec!(20));
        assert_eq!(result.holdings.total_cost_basis, dec!(1000));
        assert_eq!(result.holdings.average_cost_per_share, dec!(50));
    }

    #[test]
    fn test_reverse_split_divides_quantity() {
        let transactions = vec![
            buy("b1", at(2024, 1, 1), dec!(100), dec!(500)),
            corporate("rs", at(2024, 6, 1), CorporateActionKind::ReverseSplit, dec!(10)),
        ];
        let result = HoldingsCalculator::new().calculate("VTI", &transactions, day(2024, 12, 31));

        assert_eq!(result.holdings.quantity, dec!(10));
        assert_eq!(result.holdings.average_cost_per_share, dec!(50));
    }

    #[test]
    fn test_split_without_holdings_is_skipped() {
        let transactions = vec![
            corporate("sp", at(2024, 1, 1), CorporateActionKind::StockSplit, dec!(20)),
            buy("b1", at(2024, 2, 1), dec!(5), dec!(50)),
        ];
        let result = HoldingsCalculator::new().calculate("VTI", &transactions, day(2024, 12, 31));

        assert_eq!(result.holdings.quantity, dec!(5));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].transaction_id, "sp");
        assert!(result.warnings[0].message.starts_with("Skipped"));
        assert_eq!(result.applied_transactions.len(), 1);
    }

    #[test]
    fn test_malformed_rows_warn_and_other_symbols_are_ignored() {
        let mut undated = buy("u1", at(2024, 1, 1), dec!(1), dec!(10));
        undated.date = None;
        let mut blank = buy("x1", at(2024, 1, 1), dec!(1), dec!(10));
        blank.symbol = "  ".to_string();
        let mut other = buy("o1", at(2024, 1, 1), dec!(1), dec!(10));
        other.symbol = "BND".to_string();
        let negative = buy("n1", at(2024, 1, 2), dec!(-3), dec!(30));

        let transactions = vec![undated, blank, other, negative, buy("b1", at(2024, 1, 3), dec!(4), dec!(40))];
        let result = HoldingsCalculator::new().calculate("vti", &transactions, day(2024, 12, 31));

        assert_eq!(result.holdings.quantity, dec!(4));
        let warned: Vec<&str> = result
            .warnings
            .iter()
            .map(|w| w.transaction_id.as_str())
            .collect();
        assert_eq!(warned, vec!["x1", "n1", "u1"]);
        assert!(result.warnings[2].date.is_none());
    }

    #[test]
    fn test_undated_row_for_other_symbol_does_not_warn() {
        let mut undated = buy("o1", at(2024, 1, 1), dec!(2), dec!(20));
        undated.date = None;
        undated.symbol = "BND".to_string();
        let transactions = vec![undated, buy("b1", at(2024, 1, 3), dec!(4), dec!(40))];

        let result = HoldingsCalculator::new().calculate("VTI", &transactions, day(2024, 12, 31));
        assert!(!result.has_warnings());
        assert_eq!(result.holdings.quantity, dec!(4));
    }

    #[test]
    fn test_acquisition_cost_uses_absolute_amount() {
        let transactions = vec![buy("b1", at(2024, 1, 1), dec!(4), dec!(-80))];
        let result = HoldingsCalculator::new().calculate("VTI", &transactions, day(2024, 12, 31));
        assert_eq!(result.holdings.total_cost_basis, dec!(80));
        assert_eq!(result.holdings.average_cost_per_share, dec!(20));
    }

    #[test]
    fn test_calculation_is_idempotent_and_order_independent() {
        let calculator = HoldingsCalculator::new();
        let transactions = history();
        let mut reversed = transactions.clone();
        reversed.reverse();

        let first = calculator.calculate("VTI", &transactions, day(2024, 12, 31));
        let second = calculator.calculate("VTI", &transactions, day(2024, 12, 31));
        let shuffled = calculator.calculate("VTI", &reversed, day(2024, 12, 31));

        assert_eq!(first, second);
        assert_eq!(first.holdings, shuffled.holdings);
        assert_eq!(first.holdings.to_calculated().quantity, dec!(15));
    }
}
