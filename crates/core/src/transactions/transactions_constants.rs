/// Transaction action labels
///
/// Canonical labels for each action sub-variant. Imported data may use any of
/// the aliases listed alongside; matching ignores case, underscores and dashes.

/// Purchase of shares. Increases quantity and cost basis.
pub const ACTION_LABEL_BUY: &str = "Buy";

/// Dividend or distribution reinvested into additional shares.
pub const ACTION_LABEL_REINVESTMENT: &str = "Reinvestment";

/// Shares moved into the account with their cost basis.
pub const ACTION_LABEL_TRANSFER_IN: &str = "Transfer In";

/// Sale of shares. Decreases quantity and relieves cost basis.
pub const ACTION_LABEL_SELL: &str = "Sell";

/// Shares moved out of the account with their cost basis.
pub const ACTION_LABEL_TRANSFER_OUT: &str = "Transfer Out";

/// Forward split. Quantity on the transaction is the post-split share total.
pub const ACTION_LABEL_STOCK_SPLIT: &str = "Stock Split";

/// Reverse split (consolidation). Quantity is the post-split share total.
pub const ACTION_LABEL_REVERSE_SPLIT: &str = "Reverse Split";

pub const BUY_ALIASES: [&str; 4] = ["BUY", "BOUGHT", "PURCHASE", "MARKET BUY"];

pub const REINVESTMENT_ALIASES: [&str; 5] = [
    "REINVESTMENT",
    "REINVEST",
    "REINVEST DIVIDEND",
    "DIVIDEND REINVESTMENT",
    "DRIP",
];

pub const TRANSFER_IN_ALIASES: [&str; 3] = ["TRANSFER IN", "TRANSFERIN", "SHARES IN"];

pub const SELL_ALIASES: [&str; 3] = ["SELL", "SOLD", "MARKET SELL"];

pub const TRANSFER_OUT_ALIASES: [&str; 3] = ["TRANSFER OUT", "TRANSFEROUT", "SHARES OUT"];

pub const STOCK_SPLIT_ALIASES: [&str; 3] = ["STOCK SPLIT", "SPLIT", "FORWARD SPLIT"];

pub const REVERSE_SPLIT_ALIASES: [&str; 3] =
    ["REVERSE SPLIT", "REVERSE STOCK SPLIT", "CONSOLIDATION"];

/// Uppercases a raw label and folds `_`, `-` and repeated whitespace into single spaces.
pub fn normalize_action_label(raw: &str) -> String {
    raw.replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
