// 📊 Aggregation View - totals over both ledgers + money display helpers
//
// Pure functions over snapshots, recomputed on every read.
// Totals are i128 so summing many valid i64 amounts can't overflow.

use crate::employees::Employee;
use crate::expenses::Expense;
use serde::{Deserialize, Serialize};

// ============================================================================
// TOTALS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Contributions with status Paid
    pub total_collected: i128,
    /// Contributions with any other status
    pub total_pending: i128,
    pub total_expenses: i128,
    /// collected - expenses, can go negative
    pub balance: i128,
}

impl Totals {
    pub fn compute(employees: &[Employee], expenses: &[Expense]) -> Self {
        let (total_collected, total_pending) =
            employees.iter().fold((0i128, 0i128), |(paid, pending), e| {
                let amount = i128::from(e.contribution_amount);
                if e.status.is_paid() {
                    (paid + amount, pending)
                } else {
                    (paid, pending + amount)
                }
            });

        let total_expenses = expenses.iter().map(|e| i128::from(e.amount)).sum();

        Totals {
            total_collected,
            total_pending,
            total_expenses,
            balance: total_collected - total_expenses,
        }
    }
}

// ============================================================================
// CURRENCY DISPLAY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: &'static str,
    /// Space between symbol and digits
    pub spaced: bool,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl CurrencyFormat {
    /// Brazilian real, pt-BR grouping: `R$ 1.234,56`
    pub const fn brl() -> Self {
        CurrencyFormat {
            symbol: "R$",
            spaced: true,
            thousands_separator: '.',
            decimal_separator: ',',
        }
    }

    /// US dollar, en-US grouping: `$1,234.56`
    pub const fn usd() -> Self {
        CurrencyFormat {
            symbol: "$",
            spaced: false,
            thousands_separator: ',',
            decimal_separator: '.',
        }
    }

    /// Render integer cents as currency text
    pub fn format(&self, cents: impl Into<i128>) -> String {
        let cents: i128 = cents.into();
        let abs = cents.unsigned_abs();
        let whole = (abs / 100).to_string();
        let fraction = abs % 100;

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(digit);
        }

        format!(
            "{}{}{}{}{}{:02}",
            if cents < 0 { "-" } else { "" },
            self.symbol,
            if self.spaced { " " } else { "" },
            grouped,
            self.decimal_separator,
            fraction
        )
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::brl()
    }
}

/// Parse a typed amount (`100`, `100.5`, `100,50`) into cents.
///
/// Returns `None` for anything that isn't a plain decimal with at most two
/// fractional digits. Sign is kept so the ledger can reject it with a proper
/// validation message.
pub fn parse_cents(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let (whole, fraction) = match digits.find(|c| c == '.' || c == ',') {
        Some(pos) => (&digits[..pos], &digits[pos + 1..]),
        None => (digits, ""),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty())
        || !all_digits(whole)
        || !all_digits(fraction)
        || fraction.len() > 2
    {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    let cents = whole.checked_mul(100)?.checked_add(fraction)?;
    Some(if negative { -cents } else { cents })
}

/// Cents back into an editable decimal string (`10050` -> `100.50`)
pub fn cents_to_input(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

// ============================================================================
// SHAREABLE STATUS REPORT
// ============================================================================

/// Plain-text status card meant to be pasted into a group chat
pub fn share_report(employees: &[Employee], totals: &Totals, currency: &CurrencyFormat) -> String {
    let mut lines = vec![
        "FINANCIAL STATUS".to_string(),
        format!("PAID: {}", currency.format(totals.total_collected)),
        format!("PENDING: {}", currency.format(totals.total_pending)),
        "-".repeat(32),
    ];

    let width = employees
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0);

    for employee in employees {
        lines.push(format!(
            "{:<width$}  {}",
            employee.name,
            employee.status.label().to_uppercase(),
            width = width
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::employees::ContributionStatus;
    use chrono::Utc;

    fn employee(id: i64, name: &str, amount: i64, status: ContributionStatus) -> Employee {
        let now = Utc::now();
        Employee {
            id,
            name: name.to_string(),
            contribution_amount: amount,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn expense(id: i64, amount: i64) -> Expense {
        let now = Utc::now();
        Expense {
            id,
            description: format!("item {}", id),
            amount,
            purchase_date: "2024-12-01".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_totals() {
        let employees = vec![
            employee(1, "Ana", 500, ContributionStatus::Paid),
            employee(2, "Bruno", 300, ContributionStatus::Pending),
        ];
        let expenses = vec![expense(1, 200)];

        let totals = Totals::compute(&employees, &expenses);

        assert_eq!(totals.total_collected, 500);
        assert_eq!(totals.total_pending, 300);
        assert_eq!(totals.total_expenses, 200);
        assert_eq!(totals.balance, 300);
    }

    #[test]
    fn test_awaiting_permit_counts_as_pending() {
        let employees = vec![
            employee(1, "Ana", 100, ContributionStatus::AwaitingPermit),
            employee(2, "Bruno", 50, ContributionStatus::Pending),
        ];

        let totals = Totals::compute(&employees, &[expense(1, 400)]);

        assert_eq!(totals.total_collected, 0);
        assert_eq!(totals.total_pending, 150);
        assert_eq!(totals.balance, -400);
    }

    #[test]
    fn test_totals_past_i64_range() {
        let employees = vec![
            employee(1, "Ana", i64::MAX, ContributionStatus::Paid),
            employee(2, "Bruno", i64::MAX, ContributionStatus::Paid),
            employee(3, "Carla", i64::MAX, ContributionStatus::Pending),
            employee(4, "Davi", i64::MAX, ContributionStatus::Pending),
        ];
        let expenses = vec![expense(1, i64::MAX), expense(2, i64::MAX), expense(3, 1)];

        let totals = Totals::compute(&employees, &expenses);

        let max = i128::from(i64::MAX);
        assert_eq!(totals.total_collected, 2 * max);
        assert_eq!(totals.total_pending, 2 * max);
        assert_eq!(totals.total_expenses, 2 * max + 1);
        assert_eq!(totals.balance, -1);

        // 2 * i64::MAX cents
        assert_eq!(
            CurrencyFormat::usd().format(totals.total_collected),
            "$184,467,440,737,095,516.14"
        );
    }

    #[test]
    fn test_empty_snapshots() {
        assert_eq!(Totals::compute(&[], &[]), Totals::default());
    }

    #[test]
    fn test_format_brl() {
        let brl = CurrencyFormat::brl();
        assert_eq!(brl.format(0), "R$ 0,00");
        assert_eq!(brl.format(5), "R$ 0,05");
        assert_eq!(brl.format(10_000), "R$ 100,00");
        assert_eq!(brl.format(123_456), "R$ 1.234,56");
        assert_eq!(brl.format(123_456_789), "R$ 1.234.567,89");
        assert_eq!(brl.format(-30_000), "-R$ 300,00");
    }

    #[test]
    fn test_format_usd() {
        let usd = CurrencyFormat::usd();
        assert_eq!(usd.format(99_999), "$999.99");
        assert_eq!(usd.format(100_000), "$1,000.00");
        assert_eq!(usd.format(-1), "-$0.01");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("100"), Some(10_000));
        assert_eq!(parse_cents(" 100.5 "), Some(10_050));
        assert_eq!(parse_cents("100,50"), Some(10_050));
        assert_eq!(parse_cents(".75"), Some(75));
        assert_eq!(parse_cents("-3"), Some(-300));
        assert_eq!(parse_cents("0"), Some(0));

        assert_eq!(parse_cents(""), None);
        assert_eq!(parse_cents("abc"), None);
        assert_eq!(parse_cents("1.234,56"), None);
        assert_eq!(parse_cents("1.005"), None);
        assert_eq!(parse_cents("."), None);
    }

    #[test]
    fn test_cents_to_input_round_trips_through_parser() {
        assert_eq!(cents_to_input(10_050), "100.50");
        assert_eq!(cents_to_input(7), "0.07");
        assert_eq!(parse_cents(&cents_to_input(123_456)), Some(123_456));
    }

    #[test]
    fn test_share_report() {
        let employees = vec![
            employee(1, "Ana", 500, ContributionStatus::Paid),
            employee(2, "Bruno", 300, ContributionStatus::AwaitingPermit),
        ];
        let totals = Totals::compute(&employees, &[]);

        let report = share_report(&employees, &totals, &CurrencyFormat::brl());
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "FINANCIAL STATUS");
        assert_eq!(lines[1], "PAID: R$ 5,00");
        assert_eq!(lines[2], "PENDING: R$ 3,00");
        assert_eq!(lines[4], "Ana    PAID");
        assert_eq!(lines[5], "Bruno  AWAITING PERMIT");
    }
}
